//! Composition root: one instance of every component, wired together.
//!
//! - `types`: shared live state and the read-only views handed to renderers.
//! - `controller_handler`: the [`Controller`] itself.

pub mod controller_handler;
pub mod types;


pub use controller_handler::Controller;
pub use types::{AlertFeed, DashboardSummary, LiveState, TableRow, TableView, ViewState};
