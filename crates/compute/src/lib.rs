pub mod aggregate;
pub mod chart;
pub mod statistics;

pub use aggregate::*;
pub use chart::*;
pub use statistics::*;
