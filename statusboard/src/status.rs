//! Status file parsing and aggregation
//!
//! The status file is written by the monitored system in cycles: a
//! system marker line (`NSS ... HH:MM:SS UTC ...`), one line per
//! component (`chan1x ...`, `dx1001 ...`, `tscope ...`), and a boundary
//! line of `=` characters. `RecordStore` turns that stream into an ordered
//! list of key/value records plus per-category counters, and freezes a
//! `Snapshot` for display at every boundary.

pub mod category;
mod record;
mod store;

pub use category::{Category, LineKind, SubState};
pub use record::{normalize, Record, Records};
pub use store::{page_count, CycleState, FrequencyRange, RecordStore, Snapshot, Tally};
