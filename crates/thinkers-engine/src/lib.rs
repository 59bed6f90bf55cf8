//! Statnum-bucketed thinker scheduler.
//!
//! [`ThinkerTable`] owns every thinker of a level, filed into 129
//! priority buckets (statnums `0..=127` plus a catch-all). Each bucket
//! is a live list and a fresh list; objects created or re-filed during
//! a frame wait on the fresh list until the next merge point, so a
//! frame's tick order never depends on what that frame spawned.
//!
//! # Frame structure
//!
//! ```text
//! run_all_buckets()
//! ├── merge: fresh[s] → live[s] for every s (only merge point)
//! ├── sweep: s = first_thinking ..= CATCH_ALL
//! │   └── per node: free if marked, else post_begin_play? + tick
//! └── reap: free everything still marked for destruction
//! ```
//!
//! Destruction is a mark; physical unlinking only happens inside the
//! sweep and reap steps, through a table-held cursor that is advanced
//! before its node is unlinked.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod level;
pub mod mark;
pub mod metrics;
mod persist;
mod run;
pub mod table;

pub use config::{ConfigError, SchedulerConfig};
pub use error::SpawnError;
pub use level::Level;
pub use mark::MarkSet;
pub use metrics::{ClassProfile, RunMetrics};
pub use table::ThinkerTable;

/// Re-exported so downstream crates log through the same facade.
pub use log;
