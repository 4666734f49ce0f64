pub mod fetch;
pub mod pipeline;
pub mod worker;

pub use fetch::{CatalogCommand, FetchResult};
pub use pipeline::{CatalogEngine, CatalogLoad};
pub use worker::{CatalogWorker, FetchOutcome};
