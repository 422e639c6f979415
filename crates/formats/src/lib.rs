pub mod columns;
pub mod error;
pub mod features;
pub mod filter;
pub mod properties;
pub mod view;

pub use columns::*;
pub use error::*;
pub use features::*;
pub use filter::*;
pub use view::*;
