//! Flat walks over the catalog: what a resource provides, what it needs, and what
//! needs it.

pub mod budget;
pub mod closure;
pub mod dependents;
pub mod provides;

pub use budget::{Budget, Limits};
pub use closure::{resolve_closure, Closure};
pub use dependents::{all_dependents, direct_dependents};
pub use provides::{provided_resources, ProvidedResources};
