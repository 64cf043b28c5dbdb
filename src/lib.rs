//! GraphQL CRUD layer over users, profiles, posts, member types and subscriptions.
//!
//! Relationship fields are resolved through per-request [`Loader`]s that coalesce the lookups of
//! one execution frame into a single bulk fetch, which removes the N+1 query pattern.

mod batch_function;
mod cache;
mod config;
mod error;
mod handler;
mod loader;
mod loader_op;
mod loader_worker;
pub mod model;
pub mod registry;
pub mod schema;
pub mod store;
#[cfg(feature = "stats")]
mod worker_stats;

pub use batch_function::{group_by, index_by, BatchFunction};
pub use config::{LoaderConfig, SchemaConfig};
pub use error::{KeyError, LoadError, StoreError, StoreResult};
pub use handler::RequestHandler;
pub use loader::Loader;
pub use registry::Loaders;
