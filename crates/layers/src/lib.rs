pub mod choropleth;
pub mod layer;
pub mod primitives;
pub mod symbology;

pub use layer::*;
pub use primitives::*;
pub use symbology::*;
