//! Catalog resolution and track retrieval
//!
//! The [`CatalogFetcher`] trait is the seam between the fetch orchestrator and
//! the external downloader. [`GamdlFetcher`] is the production implementation;
//! tests substitute fakes.
//!
//! A fetcher works in two steps:
//!
//! 1. [`CatalogFetcher::resolve`] turns a catalog URL into an ordered
//!    [`ResolvedCollection`]
//! 2. [`CatalogFetcher::fetch_track`] places one resolved track into the
//!    collection folder under its final name

mod gamdl;
mod output;
mod traits;

pub use gamdl::GamdlFetcher;
pub use traits::{CatalogFetcher, ResolvedCollection, ResolvedTrack};
