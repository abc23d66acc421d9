//! CSV hydraulic snapshot loader.
//!
//! # CSV format
//!
//! One row per element value.  Rows may appear in any order; values for the
//! same step are collected into one [`HydraulicSnapshot`].
//!
//! ```csv
//! step,kind,id,value
//! 0,flow,0,0.05
//! 0,flow,1,-0.01
//! 0,demand,2,0.004
//! 0,tank_volume,3,120.0
//! 1,flow,0,0.04
//! ```
//!
//! **`kind`** field:
//!
//! | Value         | `id` refers to | Meaning                       |
//! |---------------|----------------|-------------------------------|
//! | `flow`        | `LinkId`       | signed flow, m³/s             |
//! | `demand`      | `NodeId`       | consumer demand, m³/s         |
//! | `tank_volume` | `NodeId`       | current stored volume, m³     |
//!
//! Elements without a row default to zero flow / demand and no tank volume.
//! Steps are returned in ascending order; gaps in step numbering are closed
//! up (the result holds only steps that appear in the file).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use wq_core::{LinkId, NodeId, WqError, WqResult};

use crate::{HydraulicSnapshot, Network};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SnapshotRecord {
    step:  u64,
    kind:  String,
    id:    u32,
    value: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a snapshot series for `network` from a CSV file.
pub fn load_snapshots_csv(path: &Path, network: &Network) -> WqResult<Vec<HydraulicSnapshot>> {
    let file = std::fs::File::open(path)?;
    load_snapshots_reader(file, network)
}

/// Like [`load_snapshots_csv`] but accepts any `Read` source.
pub fn load_snapshots_reader<R: Read>(
    reader:  R,
    network: &Network,
) -> WqResult<Vec<HydraulicSnapshot>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut by_step: BTreeMap<u64, HydraulicSnapshot> = BTreeMap::new();

    for result in csv_reader.deserialize::<SnapshotRecord>() {
        let row = result.map_err(|e| WqError::Parse(e.to_string()))?;
        let snapshot = by_step
            .entry(row.step)
            .or_insert_with(|| HydraulicSnapshot::new(network));
        apply_record(snapshot, &row)?;
    }

    Ok(by_step.into_values().collect())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn apply_record(snapshot: &mut HydraulicSnapshot, row: &SnapshotRecord) -> WqResult<()> {
    if !row.value.is_finite() {
        return Err(WqError::Parse(format!(
            "step {}: non-finite {} value for id {}",
            row.step, row.kind, row.id
        )));
    }
    match row.kind.trim() {
        "flow"        => snapshot.set_flow(LinkId(row.id), row.value),
        "demand"      => snapshot.set_demand(NodeId(row.id), row.value),
        "tank_volume" => snapshot.set_tank_volume(NodeId(row.id), row.value),
        other => Err(WqError::Parse(format!(
            "invalid kind {other:?}: expected \"flow\", \"demand\", or \"tank_volume\""
        ))),
    }
}
