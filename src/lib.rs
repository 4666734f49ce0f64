pub mod catalog;
pub mod config;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod render;
pub mod session;

pub use config::Config;
pub use error::{CatalogError, CatalogResult};
pub use session::{Session, Status};
