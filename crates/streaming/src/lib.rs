//! Data fetching: provider abstraction, column metadata cache, and the
//! sequential fetch orchestration behind layers and charts.

pub mod cache;
pub mod http;
pub mod memory;
pub mod orchestrator;
pub mod provider;
pub mod request;

pub use cache::*;
pub use http::*;
pub use memory::*;
pub use orchestrator::*;
pub use provider::*;
pub use request::*;
