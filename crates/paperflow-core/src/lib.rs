//! PaperFlow Core - local cache and workflows over the shared tables
//!
//! This crate provides:
//! - `AppState`: the cached tables, selection and filters, with workflow transitions
//! - `Effect`/`Completion`: remote writes requested by transitions and their outcomes
//! - `Workspace`: executes effects against a `DataStore` and feeds completions back
//! - Derived views (section filter, badges, stats, acknowledgment tallies)
//! - Push fan-out tracking and repair

pub mod effect;
pub mod error;
pub mod recipients;
pub mod reconcile;
pub mod state;
pub mod views;
pub mod workspace;

pub use effect::{Completion, Effect, execute};
pub use error::{Skip, WorkflowError, WorkflowResult};
pub use recipients::parse_recipients;
pub use reconcile::{FanoutGap, FanoutState, fanout_gaps, missing_recipients};
pub use state::{AppState, LoadedTables, Notice};
pub use views::{AckTally, SectionBadges, SectionFilter, Stats};
pub use workspace::{DEFAULT_AUTHOR, Workspace};
