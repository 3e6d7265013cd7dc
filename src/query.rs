//! Read-side projections over live tables.
//!
//! Buffers store raw merged records; every render re-derives the visible
//! rows from them through [`query_engine::apply`].
//!
//! Components:
//! - `types`: filter, sort and page specifications.
//! - `query_engine`: the pure filter/sort/paginate pass.

pub mod query_engine;
pub mod types;

pub use query_engine::{apply, QueryPage};
pub use types::{FilterSpec, PageSpec, SortDirection, SortSpec};
