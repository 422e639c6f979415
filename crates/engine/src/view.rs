use std::sync::Arc;
use std::time::Duration;

use catalog::{ConfigFetchError, ResolvedView};
use compute::VisualizationData;
use foundation::geo::Viewport;
use foundation::ids::{Epoch, LayerId, ViewId, VisualizationId};
use foundation::time::refresh_interval_or;
use formats::{FeatureCollection, FilterDefinition};
use render::{ChartPanel, PointerEvent, RenderFrame, RenderLayer};
use runtime::{Event, EventBus, Metrics, MetricsSnapshot, SchedulerState};
use serde_json::json;
use streaming::{ChartQuery, ColumnCache, FetchError, FetchTicket, LayerQuery};
use tracing::{debug, info, warn};

use crate::registry;
use crate::settings::EngineSettings;
use crate::store::{LayerRuntimeState, RuntimeStore, VisualizationState};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    Idle,
    Resolving(ViewId),
    Ready(ViewId),
    Failed { view: ViewId, error: String },
}

/// A layer fetch ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDispatch {
    pub ticket: FetchTicket,
    pub query: LayerQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartDispatch {
    pub ticket: FetchTicket,
    pub query: ChartQuery,
}

/// Work produced by a successful resolution.
#[derive(Debug)]
pub struct Installed {
    pub epoch: Epoch,
    /// Visible, known layers in config order; fetched one at a time.
    pub layers: Vec<LayerDispatch>,
    pub charts: Vec<ChartDispatch>,
    pub refresh: Duration,
    pub columns: Arc<ColumnCache>,
}

/// Read-only view of the engine, cheap to take: runtime state is shared by
/// `Arc` and never mutated in place.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub epoch: Epoch,
    pub status: ViewStatus,
    pub viewport: Option<Viewport>,
    pub layers: Vec<Arc<LayerRuntimeState>>,
    pub visualizations: Vec<Arc<VisualizationState>>,
    pub hovered: Option<PointerEvent>,
    pub refresh: SchedulerState,
    pub active_timers: usize,
    pub metrics: MetricsSnapshot,
    pub events: Vec<Event>,
    /// Events evicted from the bounded log so far.
    pub events_dropped: u64,
}

impl EngineSnapshot {
    pub fn layer(&self, id: &str) -> Option<&Arc<LayerRuntimeState>> {
        self.layers.iter().find(|l| l.id().as_str() == id)
    }

    pub fn visualization(&self, id: &str) -> Option<&Arc<VisualizationState>> {
        self.visualizations.iter().find(|v| v.id().as_str() == id)
    }

    pub fn events_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.kind == kind)
    }
}

struct ActiveView {
    id: ViewId,
    viewport: Viewport,
    store: RuntimeStore,
}

/// Synchronous core of the engine.
///
/// Owns all runtime state and decides what to fetch; performs no I/O. Every
/// completion is checked against the current epoch and the slot's last
/// applied sequence before it may touch state.
pub struct ViewEngine {
    settings: EngineSettings,
    epoch: Epoch,
    status: ViewStatus,
    active: Option<ActiveView>,
    next_seq: u64,
    events: EventBus,
    metrics: Metrics,
}

impl ViewEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            events: EventBus::with_capacity(settings.event_capacity),
            settings,
            epoch: Epoch::default(),
            status: ViewStatus::Idle,
            active: None,
            next_seq: 0,
            metrics: Metrics::new(),
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn metrics_mut(&mut self) -> &mut Metrics {
        &mut self.metrics
    }

    /// Starts selecting `id`. All state of the previous view, and any view
    /// that was still resolving, is discarded.
    pub fn begin_resolution(&mut self, id: ViewId) -> Epoch {
        self.epoch = self.epoch.next();
        self.active = None;
        self.events.emit(self.epoch, "view.select", id.to_string());
        info!(view = %id, epoch = %self.epoch, "selecting view");
        self.status = ViewStatus::Resolving(id);
        self.epoch
    }

    /// Installs a resolved view and returns its initial fetches.
    ///
    /// `None` when `epoch` is no longer current.
    pub fn install(&mut self, epoch: Epoch, resolved: ResolvedView) -> Option<Installed> {
        if epoch != self.epoch {
            self.discard_stale(epoch, "view resolution");
            return None;
        }
        let config = resolved.config;
        let store = RuntimeStore::new(config.layers(), config.visualizations());
        let refresh = refresh_interval_or(config.settings.refresh_rate, self.settings.default_refresh);
        let columns = store.column_cache().clone();
        let id = config.id.clone();

        self.active = Some(ActiveView {
            id: id.clone(),
            viewport: resolved.viewport,
            store,
        });
        self.status = ViewStatus::Ready(id.clone());
        self.metrics.incr("view.resolved");
        self.events.emit(epoch, "view.ready", id.to_string());

        let layers = self
            .fetchable_layers()
            .iter()
            .filter_map(|id| self.dispatch_layer(id))
            .collect();
        let charts = self.dispatch_charts();

        Some(Installed {
            epoch,
            layers,
            charts,
            refresh,
            columns,
        })
    }

    /// Records a failed resolution; the view stays unresolved.
    pub fn fail(&mut self, epoch: Epoch, error: &ConfigFetchError) {
        if epoch != self.epoch {
            self.discard_stale(epoch, "view resolution");
            return;
        }
        let view = match &self.status {
            ViewStatus::Resolving(id) => id.clone(),
            _ => return,
        };
        warn!(view = %view, error = %error, "view resolution failed");
        self.metrics.incr("view.failed");
        self.events.emit(epoch, "view.failed", error.to_string());
        self.status = ViewStatus::Failed {
            view,
            error: error.to_string(),
        };
    }

    /// Applies a toggle; returns the fetch to run when the layer just became
    /// visible.
    pub fn set_visibility(&mut self, layer: &LayerId, visible: bool) -> Option<LayerDispatch> {
        let epoch = self.epoch;
        let store = &mut self.active.as_mut()?.store;
        let was_visible = store.layer(layer)?.visible;
        store.update_layer(layer, |l| l.visible = visible);
        self.events
            .emit(epoch, "layer.visibility", format!("{layer}={visible}"));
        if visible && !was_visible {
            self.dispatch_layer(layer)
        } else {
            None
        }
    }

    /// Replaces the layer's filters; visible layers are re-fetched.
    pub fn set_filters(
        &mut self,
        layer: &LayerId,
        filters: Vec<FilterDefinition>,
    ) -> Option<LayerDispatch> {
        let epoch = self.epoch;
        let store = &mut self.active.as_mut()?.store;
        let count = filters.len();
        if !store.update_layer(layer, |l| l.filters = filters) {
            return None;
        }
        self.events
            .emit(epoch, "layer.filters", format!("{layer}:{count}"));
        self.dispatch_layer(layer)
    }

    /// Clears every layer's filters; visible layers that had any are
    /// re-fetched.
    pub fn reset_filters(&mut self) -> Vec<LayerDispatch> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        let filtered: Vec<LayerId> = active
            .store
            .layers()
            .iter()
            .filter(|l| !l.filters.is_empty())
            .map(|l| l.id().clone())
            .collect();
        for id in &filtered {
            active.store.update_layer(id, |l| l.filters.clear());
        }
        self.events
            .emit(self.epoch, "layer.filters", format!("reset:{}", filtered.len()));
        filtered
            .iter()
            .filter_map(|id| self.dispatch_layer(id))
            .collect()
    }

    /// Records the hovered feature reported by the renderer. Events for
    /// layers outside the current view are ignored.
    pub fn pointer(&mut self, event: Option<PointerEvent>) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if let Some(e) = &event
            && active.store.layer(&e.layer_id).is_none()
        {
            debug!(layer = %e.layer_id, "pointer event for unknown layer");
            return false;
        }
        active.store.set_hovered(event);
        true
    }

    /// Writes a layer fetch result if `ticket` still owns the slot.
    ///
    /// Returns whether state changed.
    pub fn apply_layer(
        &mut self,
        ticket: FetchTicket,
        layer: &LayerId,
        result: Result<FeatureCollection, FetchError>,
    ) -> bool {
        let applied = match self.active_store().and_then(|s| s.layer(layer)) {
            Some(l) => l.applied_seq,
            None => {
                self.discard_stale(ticket.epoch, "layer fetch");
                return false;
            }
        };
        if !ticket.supersedes(self.epoch, applied) {
            self.discard_stale(ticket.epoch, "layer fetch");
            return false;
        }
        let epoch = self.epoch;
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        match result {
            Ok(data) => {
                let count = data.len();
                active.store.update_layer(layer, |l| {
                    l.primitives = Arc::new(registry::primitives(l.spec.as_ref(), Some(&data)));
                    l.data = Some(Arc::new(data));
                    l.applied_seq = Some(ticket.seq);
                    l.last_error = None;
                });
                self.metrics.incr("fetch.layer.ok");
                self.events
                    .emit(epoch, "fetch.applied", format!("layer {layer}: {count} features"));
            }
            Err(err) => {
                warn!(layer = %layer, error = %err, "layer fetch failed");
                let message = err.to_string();
                active.store.update_layer(layer, |l| {
                    l.applied_seq = Some(ticket.seq);
                    l.last_error = Some(message.clone());
                });
                self.metrics.incr("fetch.layer.err");
                self.events
                    .emit(epoch, "fetch.failed", format!("layer {layer}: {message}"));
            }
        }
        true
    }

    pub fn apply_visualization(
        &mut self,
        ticket: FetchTicket,
        visualization: &VisualizationId,
        result: Result<VisualizationData, FetchError>,
    ) -> bool {
        let applied = match self
            .active_store()
            .and_then(|s| s.visualization(visualization))
        {
            Some(v) => v.applied_seq,
            None => {
                self.discard_stale(ticket.epoch, "visualization fetch");
                return false;
            }
        };
        if !ticket.supersedes(self.epoch, applied) {
            self.discard_stale(ticket.epoch, "visualization fetch");
            return false;
        }
        let epoch = self.epoch;
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        match result {
            Ok(data) => {
                active.store.update_visualization(visualization, |v| {
                    v.data = Some(Arc::new(data));
                    v.applied_seq = Some(ticket.seq);
                    v.last_error = None;
                });
                self.metrics.incr("fetch.chart.ok");
                self.events
                    .emit(epoch, "fetch.applied", format!("visualization {visualization}"));
            }
            Err(err) => {
                warn!(visualization = %visualization, error = %err, "visualization fetch failed");
                let message = err.to_string();
                active.store.update_visualization(visualization, |v| {
                    v.applied_seq = Some(ticket.seq);
                    v.last_error = Some(message.clone());
                });
                self.metrics.incr("fetch.chart.err");
                self.events.emit(
                    epoch,
                    "fetch.failed",
                    format!("visualization {visualization}: {message}"),
                );
            }
        }
        true
    }

    /// Refresh tick: re-fetches every known visualization. Ticks from an
    /// earlier epoch yield nothing.
    pub fn tick(&mut self, epoch: Epoch) -> Vec<ChartDispatch> {
        if epoch != self.epoch || self.active.is_none() {
            self.discard_stale(epoch, "refresh tick");
            return Vec::new();
        }
        self.metrics.incr("refresh.ticks");
        self.events.emit(epoch, "refresh.tick", "");
        self.dispatch_charts()
    }

    /// Drops the current view. In-flight completions become stale.
    pub fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            info!(view = %active.id, "view torn down");
        }
        self.epoch = self.epoch.next();
        self.status = ViewStatus::Idle;
        self.events.emit(self.epoch, "view.teardown", "");
    }

    pub fn frame(&self) -> Option<RenderFrame> {
        let active = self.active.as_ref()?;
        let layers = active
            .store
            .layers()
            .iter()
            .map(|l| RenderLayer {
                id: l.id().clone(),
                name: l.config.display_name().to_string(),
                kind: l.spec.as_ref().map(|s| s.kind()),
                visible: l.visible,
                primitives: l.primitives.clone(),
            })
            .collect();
        let charts = active
            .store
            .visualizations()
            .iter()
            .map(|v| ChartPanel {
                id: v.id().clone(),
                title: v.config.title.clone(),
                kind: v.spec.as_ref().map(|s| s.kind()),
                data: v.data.clone(),
            })
            .collect();
        Some(RenderFrame {
            epoch: self.epoch,
            view_id: active.id.clone(),
            viewport: active.viewport,
            layers,
            charts,
            hovered: active.store.hovered().cloned(),
        })
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let (layers, visualizations, hovered, viewport) = match &self.active {
            Some(a) => (
                a.store.layers().to_vec(),
                a.store.visualizations().to_vec(),
                a.store.hovered().cloned(),
                Some(a.viewport),
            ),
            None => (Vec::new(), Vec::new(), None, None),
        };
        EngineSnapshot {
            epoch: self.epoch,
            status: self.status.clone(),
            viewport,
            layers,
            visualizations,
            hovered,
            refresh: SchedulerState::Inactive,
            active_timers: 0,
            metrics: self.metrics.snapshot(),
            events: self.events.events().cloned().collect(),
            events_dropped: self.events.dropped(),
        }
    }

    /// Layers a batch may still fetch, in config order: visible ones with a
    /// known type.
    pub fn fetchable_layers(&self) -> Vec<LayerId> {
        self.active_layers()
            .filter(|l| l.fetchable())
            .map(|l| l.id().clone())
            .collect()
    }

    fn active_store(&self) -> Option<&RuntimeStore> {
        self.active.as_ref().map(|a| &a.store)
    }

    fn active_layers(&self) -> impl Iterator<Item = &Arc<LayerRuntimeState>> {
        self.active_store()
            .map(|s| s.layers())
            .unwrap_or(&[])
            .iter()
    }

    fn ticket(&mut self) -> FetchTicket {
        self.next_seq += 1;
        FetchTicket::new(self.epoch, self.next_seq)
    }

    fn dispatch_layer(&mut self, id: &LayerId) -> Option<LayerDispatch> {
        let layer = self.active_store()?.layer(id)?.clone();
        if !layer.fetchable() {
            return None;
        }
        let ticket = self.ticket();
        debug!(layer = %id, seq = ticket.seq, "dispatching layer fetch");
        self.events
            .emit(ticket.epoch, "fetch.dispatch", format!("layer {id}"));
        Some(LayerDispatch {
            ticket,
            query: LayerQuery {
                layer: id.clone(),
                source: layer.config.data_source.clone(),
                filters: layer.filters.clone(),
                layer_config: Some(json!({
                    "type": layer.config.kind,
                    "properties": layer.config.properties,
                })),
            },
        })
    }

    fn dispatch_charts(&mut self) -> Vec<ChartDispatch> {
        let Some(store) = self.active_store() else {
            return Vec::new();
        };
        let pending: Vec<(VisualizationId, ChartQuery)> = store
            .visualizations()
            .iter()
            .filter_map(|v| {
                let spec = v.spec.clone()?;
                Some((
                    v.id().clone(),
                    ChartQuery {
                        visualization: v.id().clone(),
                        source: v.config.data_source.clone(),
                        spec,
                    },
                ))
            })
            .collect();
        pending
            .into_iter()
            .map(|(id, query)| {
                let ticket = self.ticket();
                self.events
                    .emit(ticket.epoch, "fetch.dispatch", format!("visualization {id}"));
                ChartDispatch { ticket, query }
            })
            .collect()
    }

    fn discard_stale(&mut self, epoch: Epoch, what: &str) {
        debug!(epoch = %epoch, current = %self.epoch, what, "discarding stale completion");
        self.metrics.incr("fetch.stale");
        self.events.emit(epoch, "fetch.stale", what.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewEngine, ViewStatus};
    use crate::settings::EngineSettings;
    use catalog::{ConfigFetchError, ResolvedView};
    use compute::VisualizationData;
    use foundation::geo::Viewport;
    use foundation::ids::{Epoch, LayerId, ViewId, VisualizationId};
    use foundation::time::MAX_REFRESH;
    use formats::{FeatureCollection, FilterDefinition, FilterOperator, ViewConfig};
    use layers::Primitives;
    use render::PointerEvent;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use streaming::{DataError, FetchError};

    fn resolved(id: &str) -> ResolvedView {
        resolved_with(id, json!({"refresh_rate": 5}))
    }

    fn resolved_with(id: &str, settings: Value) -> ResolvedView {
        let text = json!({
            "id": id,
            "config": {
                "name": id,
                "components": [
                    {"type": "map", "layers": [
                        {"id": "flow", "type": "line", "data_source": "roads"},
                        {"id": "heat", "type": "heatmap", "data_source": "roads", "visible": false},
                        {"id": "odd", "type": "mystery", "data_source": "roads"}
                    ]},
                    {"type": "grid", "visualizations": [
                        {"id": "share", "type": "pie", "data_source": "stats"},
                        {"id": "radar", "type": "radar", "data_source": "stats"}
                    ]}
                ],
                "settings": settings
            }
        })
        .to_string();
        let config = ViewConfig::from_json(&text).unwrap();
        ResolvedView {
            viewport: Viewport::from_settings(config.settings.center, config.settings.default_zoom),
            config: Arc::new(config),
        }
    }

    fn segments(n: usize) -> FeatureCollection {
        let items: Vec<_> = (0..n)
            .map(|i| json!({"start_point": [i, 0], "end_point": [i, 1]}))
            .collect();
        FeatureCollection::from_value(json!(items)).unwrap()
    }

    fn failure() -> FetchError {
        FetchError::Provider(DataError::Unreachable("down".into()))
    }

    fn ready(id: &str) -> (ViewEngine, super::Installed) {
        let mut engine = ViewEngine::new(EngineSettings::default());
        let epoch = engine.begin_resolution(ViewId::from(id));
        let installed = engine.install(epoch, resolved(id)).unwrap();
        (engine, installed)
    }

    #[test]
    fn install_dispatches_visible_known_entries_only() {
        let (engine, installed) = ready("x");
        let layers: Vec<_> = installed.layers.iter().map(|d| d.query.layer.as_str()).collect();
        assert_eq!(layers, vec!["flow"]);
        let charts: Vec<_> = installed
            .charts
            .iter()
            .map(|d| d.query.visualization.as_str())
            .collect();
        assert_eq!(charts, vec!["share"]);
        assert_eq!(installed.refresh.as_secs(), 5);
        assert_eq!(engine.status(), &ViewStatus::Ready(ViewId::from("x")));
    }

    #[test]
    fn huge_refresh_rates_are_clamped_on_install() {
        let mut engine = ViewEngine::new(EngineSettings::default());
        let epoch = engine.begin_resolution(ViewId::from("x"));
        let view = resolved_with("x", json!({"refresh_rate": 1e20}));
        let installed = engine.install(epoch, view).unwrap();
        assert_eq!(installed.refresh, MAX_REFRESH);
    }

    #[test]
    fn three_component_centers_set_the_viewport() {
        let view = resolved_with("x", json!({"center": [2.35, 48.85, 35.0], "default_zoom": 9}));
        assert_eq!((view.viewport.longitude, view.viewport.latitude), (2.35, 48.85));
        assert_eq!(view.viewport.zoom, 9.0);

        let view = resolved_with("x", json!({"center": "paris"}));
        assert_eq!(view.viewport, Viewport::DEFAULT);
    }

    #[test]
    fn resolving_twice_yields_unaliased_state() {
        let mut engine = ViewEngine::new(EngineSettings::default());
        let e1 = engine.begin_resolution(ViewId::from("x"));
        engine.install(e1, resolved("x")).unwrap();
        let first = engine.snapshot().layer("flow").unwrap().clone();

        let e2 = engine.begin_resolution(ViewId::from("x"));
        engine.install(e2, resolved("x")).unwrap();
        engine.set_visibility(&LayerId::from("flow"), false);
        let second = engine.snapshot().layer("flow").unwrap().clone();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(first.visible);
        assert!(!second.visible);
    }

    #[test]
    fn visibility_is_last_write_wins() {
        let (mut engine, installed) = ready("x");
        let heat = LayerId::from("heat");
        let flow = LayerId::from("flow");

        let on = engine.set_visibility(&heat, true).unwrap();
        assert!(engine.set_visibility(&heat, true).is_none());
        engine.set_visibility(&heat, false);
        engine.set_visibility(&flow, false);
        // Completions land after the toggles.
        assert!(engine.apply_layer(on.ticket, &heat, Ok(segments(1))));
        let initial = installed.layers[0].ticket;
        assert!(engine.apply_layer(initial, &flow, Ok(segments(2))));
        engine.set_visibility(&flow, true);

        let snap = engine.snapshot();
        assert!(!snap.layer("heat").unwrap().visible);
        assert!(snap.layer("flow").unwrap().visible);
        assert_eq!(snap.layer("flow").unwrap().data.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn late_responses_for_a_previous_view_are_discarded() {
        let (mut engine, installed) = ready("x");
        let stale = installed.layers[0].ticket;

        let e = engine.begin_resolution(ViewId::from("y"));
        engine.install(e, resolved("y")).unwrap();
        assert!(!engine.apply_layer(stale, &LayerId::from("flow"), Ok(segments(3))));

        let snap = engine.snapshot();
        assert!(snap.layer("flow").unwrap().data.is_none());
        assert_eq!(snap.metrics.counter("fetch.stale"), 1);
        assert_eq!(snap.events_of("fetch.stale").next().unwrap().epoch, stale.epoch);
    }

    #[test]
    fn slower_earlier_fetch_never_overwrites_a_later_one() {
        let (mut engine, _) = ready("x");
        let flow = LayerId::from("flow");
        let filter = FilterDefinition::new("level", FilterOperator::Equals, json!("High"));
        let first = engine.set_filters(&flow, vec![filter]).unwrap();
        let second = engine.set_filters(&flow, Vec::new()).unwrap();
        assert!(second.ticket.seq > first.ticket.seq);
        assert!(second.query.filters.is_empty());

        assert!(engine.apply_layer(second.ticket, &flow, Ok(segments(4))));
        assert!(!engine.apply_layer(first.ticket, &flow, Ok(segments(1))));
        let snap = engine.snapshot();
        assert_eq!(snap.layer("flow").unwrap().data.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn failures_keep_the_last_good_value() {
        let (mut engine, installed) = ready("x");
        let flow = LayerId::from("flow");
        engine.apply_layer(installed.layers[0].ticket, &flow, Ok(segments(2)));
        let retry = engine.set_filters(&flow, Vec::new()).unwrap();
        assert!(engine.apply_layer(retry.ticket, &flow, Err(failure())));

        let layer = engine.snapshot().layer("flow").unwrap().clone();
        assert_eq!(layer.data.as_ref().unwrap().len(), 2);
        assert!(layer.last_error.as_deref().unwrap().contains("down"));
        let frame = engine.frame().unwrap();
        assert_eq!(frame.layer("flow").unwrap().primitives.len(), 2);
    }

    #[test]
    fn unknown_layers_are_inert() {
        let (mut engine, _) = ready("x");
        let odd = LayerId::from("odd");
        assert!(engine.set_visibility(&odd, false).is_none());
        assert!(engine.set_visibility(&odd, true).is_none());
        assert!(engine.set_filters(&odd, Vec::new()).is_none());
        let frame = engine.frame().unwrap();
        let layer = frame.layer("odd").unwrap();
        assert_eq!(layer.kind, None);
        assert_eq!(*layer.primitives, Primitives::Empty);
    }

    #[test]
    fn ticks_refresh_known_charts_for_the_current_epoch_only() {
        let (mut engine, installed) = ready("x");
        assert!(engine.tick(Epoch(installed.epoch.0 + 7)).is_empty());
        let charts = engine.tick(installed.epoch);
        assert_eq!(charts.len(), 1);

        let data = VisualizationData::Pie {
            labels: vec![json!("A")],
            values: vec![1.0],
        };
        let share = VisualizationId::from("share");
        assert!(engine.apply_visualization(charts[0].ticket, &share, Ok(data.clone())));
        assert!(!engine.apply_visualization(installed.charts[0].ticket, &share, Err(failure())));
        let frame = engine.frame().unwrap();
        assert_eq!(frame.chart("share").unwrap().data.as_deref(), Some(&data));
        assert!(frame.chart("radar").unwrap().data.is_none());
    }

    #[test]
    fn reset_filters_refetches_filtered_visible_layers() {
        let (mut engine, _) = ready("x");
        let filter = FilterDefinition::new("level", FilterOperator::Equals, json!("High"));
        engine.set_filters(&LayerId::from("flow"), vec![filter.clone()]);
        engine.set_filters(&LayerId::from("heat"), vec![filter]);

        let again = engine.reset_filters();
        let ids: Vec<_> = again.iter().map(|d| d.query.layer.as_str()).collect();
        assert_eq!(ids, vec!["flow"]);
        assert!(engine.snapshot().layers.iter().all(|l| l.filters.is_empty()));
    }

    #[test]
    fn failed_resolution_leaves_view_unresolved() {
        let mut engine = ViewEngine::new(EngineSettings::default());
        let e = engine.begin_resolution(ViewId::from("gone"));
        engine.fail(e, &ConfigFetchError::NotFound(ViewId::from("gone")));
        assert!(matches!(engine.status(), ViewStatus::Failed { .. }));
        assert!(engine.frame().is_none());
        assert!(engine.tick(e).is_empty());
    }

    #[test]
    fn pointer_events_are_recorded_for_known_layers() {
        let (mut engine, _) = ready("x");
        let hover = PointerEvent {
            layer_id: LayerId::from("flow"),
            feature: json!({"road": "Market St"}),
        };
        assert!(engine.pointer(Some(hover.clone())));
        assert!(!engine.pointer(Some(PointerEvent {
            layer_id: LayerId::from("nope"),
            feature: json!(null),
        })));
        assert_eq!(engine.frame().unwrap().hovered, Some(hover));
        assert!(engine.pointer(None));
        assert_eq!(engine.snapshot().hovered, None);
    }

    #[test]
    fn teardown_invalidates_in_flight_work() {
        let (mut engine, installed) = ready("x");
        engine.teardown();
        assert_eq!(engine.status(), &ViewStatus::Idle);
        let ticket = installed.layers[0].ticket;
        assert!(!engine.apply_layer(ticket, &LayerId::from("flow"), Ok(segments(1))));
        assert!(engine.snapshot().layers.is_empty());
    }
}
