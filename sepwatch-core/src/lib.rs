//! sepwatch-core: Pure conflict detection + alert synthesis library.
//!
//! No async, no network I/O, just geometry and per-tick algorithms. This
//! crate is the shared core used by `sepwatch-server` (tick engine, web API
//! and CLI).

pub mod alert;
pub mod config;
pub mod conflict;
pub mod geo;
pub mod history;
pub mod stability;
pub mod stream;
pub mod types;

// Re-export commonly used types at crate root
pub use alert::{Alert, AlertDetail, AlertKind, AlertSynthesizer, AlertThresholds, Severity};
pub use conflict::{Conflict, ConflictDetector};
pub use history::{TrackHistory, Trail, TrailPoint};
pub use stream::{AlertFilter, AlertStream, Selection};
pub use types::*;
