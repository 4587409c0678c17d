// ── List model ──
//
// State owned by the presentation layer (pagination, filters) and the
// normalized page shape every controller hands back to it.

pub mod filter;
pub mod list_state;
pub mod page;

pub use filter::{FilterState, FilterValue};
pub use list_state::{ListState, SortDirection, SortSpec};
pub use page::ListPage;
