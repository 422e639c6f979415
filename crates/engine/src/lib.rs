//! Dynamic view engine: resolves a view document, keeps per-layer and
//! per-chart runtime state, drives fetches and refresh, and hands complete
//! frames to a renderer.
//!
//! [`ViewEngine`] is the synchronous state machine; [`spawn`] runs it as a
//! tokio task fed by [`EngineHandle`] commands.

pub mod driver;
pub mod error;
pub mod registry;
pub mod settings;
pub mod store;
pub mod view;

pub use driver::{Command, EngineHandle, spawn};
pub use error::EngineError;
pub use settings::EngineSettings;
pub use store::{LayerRuntimeState, RuntimeStore, VisualizationState};
pub use view::{
    ChartDispatch, EngineSnapshot, Installed, LayerDispatch, ViewEngine, ViewStatus,
};
