pub mod bundle;
pub mod dependencies;
pub mod error;
pub mod filter;
pub mod resource;
pub mod resource_kind;

#[cfg(test)]
mod tests;

pub use dependencies::{CascadeDependencies, SharedUuids};
pub use error::{CoreError, Result as CoreResult};
pub use filter::{Filter, FilterValue, Predicate};
pub use resource_kind::ResourceKind;
