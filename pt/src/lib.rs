//! progresstrack - mergeable progress reports for multi-step batch jobs
//!
//! Each worker of a batch job keeps its own [`Progress`]: per-step counts of
//! total/succeeded/failed units plus a bounded window of recently seen ids
//! and errors. When the workers are done, their reports are merged into one.
//!
//! # Structure
//!
//! ```text
//! Progress
//! └── steps: {name → Step}
//!     ├── completion: Completion        (authoritative counters)
//!     └── transient_data: TransientData (last 100 ids / errors)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use progresstrack::{ErrorDetail, Progress};
//!
//! let mut shard1 = Progress::new("nightly import");
//! shard1.step("rows").set_total(Some(200)).track_success("row-1");
//!
//! let mut shard2 = Progress::new("nightly import");
//! shard2.step("rows").track_failure("row-2", Some(ErrorDetail::new("bad row", 422)));
//!
//! let merged = shard1.merge(&[&shard2]);
//! let json = merged.to_json()?;
//! let restored = Progress::from_json(&json)?;
//! ```

pub mod config;
pub mod error;
mod schema;

mod completion;
mod id;
mod ordered;
mod progress;
mod step;
mod transient;

pub use completion::Completion;
pub use config::Config;
pub use error::{FieldError, ProgressError, Result, ValidationError};
pub use id::ItemId;
pub use ordered::OrderedMap;
pub use progress::Progress;
pub use step::Step;
pub use transient::{ErrorDetail, TransientData};
