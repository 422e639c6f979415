use std::sync::Arc;

use foundation::geo::Viewport;
use foundation::ids::ViewId;
use formats::ViewConfig;
use tracing::{info, warn};

use crate::error::ConfigFetchError;
use crate::provider::ViewProvider;

/// A validated view plus the camera it opens with.
#[derive(Debug, Clone)]
pub struct ResolvedView {
    pub config: Arc<ViewConfig>,
    pub viewport: Viewport,
}

/// Fetches and validates view `id`.
///
/// Every call produces a fresh [`ViewConfig`]; nothing is cached or merged
/// with earlier resolutions.
pub async fn resolve_view(
    provider: &dyn ViewProvider,
    id: &ViewId,
) -> Result<ResolvedView, ConfigFetchError> {
    let doc = provider.get_view(id).await?;
    let config = ViewConfig::from_document(doc)?;

    let skipped = config.unsupported_components();
    if skipped > 0 {
        warn!(view = %id, skipped, "view has components the engine does not drive");
    }

    let viewport = Viewport::from_settings(config.settings.center, config.settings.default_zoom);
    info!(
        view = %id,
        layers = config.layers().count(),
        visualizations = config.visualizations().count(),
        "view resolved"
    );
    Ok(ResolvedView {
        config: Arc::new(config),
        viewport,
    })
}
