//! Unit tests for wq-output.

use tempfile::TempDir;
use wq_chemistry::{IdealMixing, SolutionRecord};
use wq_core::{InputSolutions, LinkId, QualityConfig};
use wq_network::{HydraulicSnapshot, NetworkBuilder, pipe_volume};
use wq_sim::{ParcelConc, Simulation, SimulationBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn parcel(x0: f64, x1: f64, conc: f64) -> ParcelConc {
    ParcelConc { x0, x1, conc }
}

/// A 10 m pipe holding 10 m³ after a pump, filled with background water.
///
/// ```text
///   R0 ──U0──▶ J1 ──P1 (10 m)──▶ J2
/// ```
fn pumped_pipe() -> (Simulation<IdealMixing>, InputSolutions, HydraulicSnapshot) {
    let mut engine = IdealMixing::new();
    let background = engine.add_solution(SolutionRecord::new(7.0, 100.0, 15.0));
    let source = engine.add_solution(SolutionRecord::new(7.0, 500.0, 15.0).with_total("Ca", 2.0));

    let mut b = NetworkBuilder::new();
    let r = b.add_reservoir();
    let j1 = b.add_junction();
    let j2 = b.add_junction();
    b.add_pump(r, j1);
    let diameter_mm = 1000.0 * (10.0 / pipe_volume(10.0, 1000.0)).sqrt();
    b.add_pipe(j1, j2, 10.0, diameter_mm);
    let network = b.build().unwrap();

    let config = QualityConfig { timestep_secs: 1.0, total_steps: 2, ..QualityConfig::default() };
    let mut sim = SimulationBuilder::new(network, engine).config(config).build().unwrap();

    let inputs = InputSolutions::new().with_background(background).with_source(r, source);
    let mut snap = HydraulicSnapshot::new(&sim.network);
    snap.set_flow(LinkId(0), 3.0).unwrap();
    snap.set_flow(LinkId(1), 3.0).unwrap();
    sim.fill_network(&snap, &inputs, false).unwrap();
    (sim, inputs, snap)
}

// ── Binning ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod binning {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{OutputError, PipeSegmentation};

    #[test]
    fn rejects_bad_segment_length() {
        for s in [0.0, -1.0, f64::NAN] {
            assert!(matches!(PipeSegmentation::new(s), Err(OutputError::InvalidSegmentLength(_))));
        }
    }

    #[test]
    fn uniform_pipe_last_segment_shorter() {
        let seg = PipeSegmentation::new(6.0).unwrap();
        let out = seg.segment_profile(10.0, &[parcel(0.0, 1.0, 3.5)]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].seg_id, 1);
        assert_eq!(out[0].length_m, 6.0);
        assert_eq!(out[1].length_m, 4.0);
        assert_eq!(out[1].x_mid_m, 8.0);
        for s in &out {
            assert_relative_eq!(s.conc, 3.5, epsilon = 1e-12);
            assert_eq!(s.n_parcels, 1);
        }
    }

    #[test]
    fn overlap_weighting() {
        // 0–3 m at 1.0, 3–10 m at 0.0; a 5 m grid.
        let seg = PipeSegmentation::new(5.0).unwrap();
        let out = seg.segment_profile(10.0, &[parcel(0.0, 0.3, 1.0), parcel(0.3, 1.0, 0.0)]);
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].conc, 0.6, epsilon = 1e-12);
        assert_eq!(out[0].n_parcels, 2);
        assert_relative_eq!(out[1].conc, 0.0);
        assert_eq!(out[1].n_parcels, 1);
    }

    #[test]
    fn nothing_to_bin() {
        let seg = PipeSegmentation::new(5.0).unwrap();
        assert!(seg.segment_profile(0.0, &[parcel(0.0, 1.0, 1.0)]).is_empty());
        assert!(seg.segment_profile(10.0, &[]).is_empty());
        assert_eq!(seg.segment_count(-3.0), 0);
    }

    #[test]
    fn metadata_skips_pumps() {
        let (sim, _, _) = pumped_pipe();
        let seg = PipeSegmentation::new(4.0).unwrap();
        let meta = seg.pipe_metadata(&sim.network);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].link, 1);
        assert_eq!(meta[0].n_segs, 3);
        assert_relative_eq!(meta[0].last_seg_m, 2.0);
    }
}

// ── Segmentation against a live simulation ────────────────────────────────────

#[cfg(test)]
mod live {
    use approx::assert_relative_eq;

    use super::*;
    use crate::PipeSegmentation;

    #[test]
    fn segments_follow_the_front() {
        let (mut sim, inputs, snap) = pumped_pipe();
        sim.step(&snap, 1.0, &inputs).unwrap();

        // 3 m³ of source water now fills the first 3 m of the pipe.
        let seg = PipeSegmentation::new(5.0).unwrap();
        let mut q = sim.quality();
        let out = seg.segment_pipe(&mut q, LinkId(1), "Ca", "mmol").unwrap();
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].conc, 1.2, epsilon = 1e-9);
        assert_relative_eq!(out[1].conc, 0.0, epsilon = 1e-9);

        assert!(seg.segment_pipe(&mut q, LinkId(0), "Ca", "mmol").unwrap().is_empty());
    }

    #[test]
    fn record_step_appends_without_clearing() {
        let (mut sim, inputs, snap) = pumped_pipe();
        let mut seg = PipeSegmentation::new(5.0).unwrap();

        for _ in 0..2 {
            sim.step(&snap, 1.0, &inputs).unwrap();
            let step = sim.clock.current_step;
            let time = sim.clock.elapsed_secs;
            let added = seg.record_step(&mut sim.quality(), "Ca", "mmol", Some(step), Some(time)).unwrap();
            assert_eq!(added, 2);
        }

        assert_eq!(seg.records().len(), 4);
        assert_eq!(seg.records()[3].step, Some(2));
        assert_eq!(seg.records()[3].time_s, Some(2.0));
        assert_eq!(seg.records()[0].link, 1);

        seg.reset();
        assert!(seg.records().is_empty());
    }

    #[test]
    fn unknown_link_is_an_error() {
        let (mut sim, _, _) = pumped_pipe();
        let seg = PipeSegmentation::new(5.0).unwrap();
        assert!(seg.segment_pipe(&mut sim.quality(), LinkId(9), "Ca", "mmol").is_err());
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;
    use crate::csv::{METADATA_HEADERS, SEGMENT_HEADERS};
    use crate::{CsvWriter, OutputWriter, PipeMetadataRow, PipeSegmentation, SegmentObserver, SegmentRow};

    fn row(seg_id: u32, step: Option<u64>) -> SegmentRow {
        SegmentRow {
            link: 4,
            step,
            time_s: step.map(|s| s as f64 * 60.0),
            seg_id,
            x_start_m: 0.0,
            x_end_m: 6.0,
            x_mid_m: 3.0,
            length_m: 6.0,
            conc: 1.5,
            n_parcels: 2,
        }
    }

    fn read(path: std::path::PathBuf) -> (Vec<String>, Vec<csv::StringRecord>) {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        let rows = rdr.records().map(|r| r.unwrap()).collect();
        (headers, rows)
    }

    #[test]
    fn headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let (h, rows) = read(dir.path().join("segments.csv"));
        assert_eq!(h, SEGMENT_HEADERS);
        assert!(rows.is_empty());
        let (h, _) = read(dir.path().join("pipe_metadata.csv"));
        assert_eq!(h, METADATA_HEADERS);
    }

    #[test]
    fn optional_fields_written_empty() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_segments(&[row(1, Some(3)), row(2, None)]).unwrap();
        w.write_metadata(&[PipeMetadataRow {
            link: 4,
            pipe_length_m: 10.0,
            seg_length_m: 6.0,
            n_segs: 2,
            last_seg_m: 4.0,
        }])
        .unwrap();
        w.finish().unwrap();
        w.finish().unwrap();

        let (_, rows) = read(dir.path().join("segments.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "3");
        assert_eq!(&rows[0][2], "180");
        assert_eq!(&rows[1][1], "");
        assert_eq!(&rows[1][3], "2");
        let (_, meta) = read(dir.path().join("pipe_metadata.csv"));
        assert_eq!(&meta[0][3], "2");
    }

    #[test]
    fn observer_writes_each_snapshot() {
        let (mut sim, inputs, snap) = pumped_pipe();
        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SegmentObserver::new(writer, PipeSegmentation::new(5.0).unwrap(), "Ca", "mmol");

        sim.run(&[snap.clone(), snap], &inputs, &mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let (_, rows) = read(dir.path().join("segments.csv"));
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][1], "1");
        assert_eq!(&rows[2][1], "2");
        let (_, meta) = read(dir.path().join("pipe_metadata.csv"));
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn observer_keeps_query_errors() {
        let (mut sim, inputs, snap) = pumped_pipe();
        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SegmentObserver::new(writer, PipeSegmentation::new(5.0).unwrap(), "Ca", "mg/L");
        sim.run(&[snap], &inputs, &mut obs).unwrap();
        assert!(obs.take_error().is_some());
        assert!(obs.take_error().is_none());
    }
}

// ── SQLite ────────────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use rusqlite::Connection;

    use super::*;
    use crate::{OutputWriter, SegmentRow, SqliteWriter};

    #[test]
    fn segments_round_trip() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        let row = SegmentRow {
            link: 1,
            step: None,
            time_s: Some(30.0),
            seg_id: 1,
            x_start_m: 0.0,
            x_end_m: 5.0,
            x_mid_m: 2.5,
            length_m: 5.0,
            conc: 0.25,
            n_parcels: 1,
        };
        w.write_segments(&[row, SegmentRow { seg_id: 2, ..row }]).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();

        let conn = Connection::open(dir.path().join("output.db")).unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM segments", [], |r| r.get(0)).unwrap();
        assert_eq!(n, 2);
        let step: Option<i64> = conn
            .query_row("SELECT step FROM segments WHERE seg_id = 2", [], |r| r.get(0))
            .unwrap();
        assert_eq!(step, None);
    }
}
