//! Movie catalog: descriptors, the TMDB fetcher and per-row load state.
//!
//! - `types` - [`CategoryDescriptor`], [`ListItem`], the default home rows
//! - `fetcher` - [`CategoryFetcher`], one GET per call against TMDB v3
//! - `row` - [`CategoryRow`], the Loading/Success/Failure lifecycle of one row

mod fetcher;
mod row;
mod types;

pub use fetcher::{parse_results, CategoryFetcher, FetchError};
pub use row::{CategoryRow, RowPhase, RowState};
pub use types::{default_rows, poster_url, CategoryDescriptor, ListItem};
