//! SQLite backend, behind the `sqlite` feature.
//!
//! Everything lands in `<dir>/output.db`: one `segments` row per pipe segment
//! per snapshot, indexed on `(link, step)` for profile lookups, and one
//! `pipe_metadata` row per pipe.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{OutputResult, PipeMetadataRow, SegmentRow};

/// Writes segment output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open `dir/output.db`, creating the tables if they do not exist yet.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS segments (
                 link      INTEGER NOT NULL,
                 step      INTEGER,
                 time_s    REAL,
                 seg_id    INTEGER NOT NULL,
                 x_start_m REAL    NOT NULL,
                 x_end_m   REAL    NOT NULL,
                 x_mid_m   REAL    NOT NULL,
                 length_m  REAL    NOT NULL,
                 conc      REAL    NOT NULL,
                 n_parcels INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS pipe_metadata (
                 link          INTEGER PRIMARY KEY,
                 pipe_length_m REAL    NOT NULL,
                 seg_length_m  REAL    NOT NULL,
                 n_segs        INTEGER NOT NULL,
                 last_seg_m    REAL    NOT NULL
             );
             CREATE INDEX IF NOT EXISTS segments_link_step ON segments (link, step);",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_segments(&mut self, rows: &[SegmentRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO segments \
                 (link, step, time_s, seg_id, x_start_m, x_end_m, x_mid_m, length_m, conc, n_parcels) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.link,
                    row.step.map(|s| s as i64),
                    row.time_s,
                    row.seg_id,
                    row.x_start_m,
                    row.x_end_m,
                    row.x_mid_m,
                    row.length_m,
                    row.conc,
                    row.n_parcels,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_metadata(&mut self, rows: &[PipeMetadataRow]) -> OutputResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO pipe_metadata \
                 (link, pipe_length_m, seg_length_m, n_segs, last_seg_m) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.link,
                    row.pipe_length_m,
                    row.seg_length_m,
                    row.n_segs,
                    row.last_seg_m,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
