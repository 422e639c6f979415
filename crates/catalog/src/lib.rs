//! View catalog: where view documents come from and how they become a
//! validated [`formats::ViewConfig`].

pub mod error;
pub mod provider;
pub mod resolve;

pub use error::ConfigFetchError;
pub use provider::{BoxFuture, HttpViewProvider, InMemoryViewProvider, ViewProvider};
pub use resolve::{ResolvedView, resolve_view};
