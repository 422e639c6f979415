use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use catalog::{ConfigFetchError, ResolvedView, ViewProvider, resolve_view};
use compute::VisualizationData;
use foundation::ids::{Epoch, LayerId, ViewId, VisualizationId};
use formats::{FeatureCollection, FilterDefinition};
use render::{PointerEvent, RenderSink};
use runtime::RefreshScheduler;
use streaming::{DataProvider, FetchError, FetchTicket, Orchestrator};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::settings::EngineSettings;
use crate::view::{ChartDispatch, EngineSnapshot, Installed, LayerDispatch, ViewEngine};

/// Requests accepted by the engine task.
#[derive(Debug)]
pub enum Command {
    SelectView(ViewId),
    SetVisibility { layer: LayerId, visible: bool },
    SetFilters {
        layer: LayerId,
        filters: Vec<FilterDefinition>,
    },
    ResetFilters,
    Pointer(Option<PointerEvent>),
    Snapshot(oneshot::Sender<EngineSnapshot>),
    Teardown,
}

/// Messages the engine task sends itself from fetch tasks and the timer.
enum Internal {
    Resolved {
        epoch: Epoch,
        started: Instant,
        result: Result<ResolvedView, ConfigFetchError>,
    },
    Layer {
        ticket: FetchTicket,
        layer: LayerId,
        result: Result<FeatureCollection, FetchError>,
    },
    Chart {
        ticket: FetchTicket,
        visualization: VisualizationId,
        result: Result<VisualizationData, FetchError>,
    },
    Tick(Epoch),
    /// A chart batch of `epoch` finished.
    ChartsDone(Epoch),
}

/// Cloneable handle to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
}

impl EngineHandle {
    pub async fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands.send(command).await?;
        Ok(())
    }

    pub async fn select_view(&self, id: impl Into<ViewId>) -> Result<(), EngineError> {
        self.send(Command::SelectView(id.into())).await
    }

    pub async fn set_visibility(
        &self,
        layer: impl Into<LayerId>,
        visible: bool,
    ) -> Result<(), EngineError> {
        self.send(Command::SetVisibility {
            layer: layer.into(),
            visible,
        })
        .await
    }

    pub async fn set_filters(
        &self,
        layer: impl Into<LayerId>,
        filters: Vec<FilterDefinition>,
    ) -> Result<(), EngineError> {
        self.send(Command::SetFilters {
            layer: layer.into(),
            filters,
        })
        .await
    }

    pub async fn reset_filters(&self) -> Result<(), EngineError> {
        self.send(Command::ResetFilters).await
    }

    pub async fn pointer(&self, event: Option<PointerEvent>) -> Result<(), EngineError> {
        self.send(Command::Pointer(event)).await
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        Ok(rx.await?)
    }

    pub async fn teardown(&self) -> Result<(), EngineError> {
        self.send(Command::Teardown).await
    }
}

/// Starts the engine task. It runs until every [`EngineHandle`] is dropped.
pub fn spawn(
    views: Arc<dyn ViewProvider>,
    data: Arc<dyn DataProvider>,
    sink: Box<dyn RenderSink>,
    settings: EngineSettings,
) -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(settings.command_capacity.max(1));
    let (internal_tx, internal_rx) = mpsc::unbounded_channel();
    let (visible, _) = watch::channel(HashSet::new());
    let driver = Driver {
        engine: ViewEngine::new(settings),
        views,
        data,
        sink,
        orchestrator: None,
        scheduler: RefreshScheduler::new(),
        tasks: JoinSet::new(),
        internal: internal_tx,
        visible,
        charts_in_flight: None,
    };
    let task = tokio::spawn(driver.run(rx, internal_rx));
    (EngineHandle { commands: tx }, task)
}

struct Driver {
    engine: ViewEngine,
    views: Arc<dyn ViewProvider>,
    data: Arc<dyn DataProvider>,
    sink: Box<dyn RenderSink>,
    orchestrator: Option<Orchestrator>,
    scheduler: RefreshScheduler,
    /// Resolution and fetch tasks of the current view.
    tasks: JoinSet<()>,
    internal: mpsc::UnboundedSender<Internal>,
    /// Layers of the current view that may still be fetched. Read by layer
    /// batches before each request.
    visible: watch::Sender<HashSet<LayerId>>,
    /// Epoch of the chart batch currently running, if any.
    charts_in_flight: Option<Epoch>,
}

impl Driver {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut internal: mpsc::UnboundedReceiver<Internal>,
    ) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.on_command(cmd),
                    None => break,
                },
                Some(msg) = internal.recv() => self.on_internal(msg),
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(err) = joined
                        && err.is_panic()
                    {
                        warn!(error = %err, "fetch task panicked");
                    }
                }
            }
        }
        self.stop_view();
        info!("engine stopped");
    }

    fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::SelectView(id) => self.select(id),
            Command::SetVisibility { layer, visible } => {
                let dispatch = self.engine.set_visibility(&layer, visible);
                self.publish_visible();
                if let Some(d) = dispatch {
                    self.spawn_layer(d);
                }
                self.present();
            }
            Command::SetFilters { layer, filters } => {
                if let Some(d) = self.engine.set_filters(&layer, filters) {
                    self.spawn_layer(d);
                }
                self.present();
            }
            Command::ResetFilters => {
                for d in self.engine.reset_filters() {
                    self.spawn_layer(d);
                }
                self.present();
            }
            Command::Pointer(event) => {
                if self.engine.pointer(event) {
                    self.present();
                }
            }
            Command::Snapshot(reply) => {
                self.update_gauges();
                let mut snap = self.engine.snapshot();
                snap.refresh = self.scheduler.state();
                snap.active_timers = self.scheduler.active_timers();
                let _ = reply.send(snap);
            }
            Command::Teardown => {
                self.stop_view();
                self.engine.teardown();
            }
        }
    }

    fn on_internal(&mut self, msg: Internal) {
        match msg {
            Internal::Resolved {
                epoch,
                started,
                result,
            } => {
                self.engine
                    .metrics_mut()
                    .record_timing("view.resolve", started.elapsed());
                match result {
                    Ok(resolved) => {
                        if let Some(installed) = self.engine.install(epoch, resolved) {
                            self.start_view(installed);
                            self.present();
                        }
                    }
                    Err(err) => {
                        self.scheduler.deactivate();
                        self.engine.fail(epoch, &err);
                    }
                }
            }
            Internal::Layer {
                ticket,
                layer,
                result,
            } => {
                if self.engine.apply_layer(ticket, &layer, result) {
                    self.present();
                }
            }
            Internal::Chart {
                ticket,
                visualization,
                result,
            } => {
                if self.engine.apply_visualization(ticket, &visualization, result) {
                    self.present();
                }
            }
            Internal::Tick(epoch) => {
                if let Some(running) = self.charts_in_flight {
                    debug!(epoch = %epoch, running = %running, "chart batch still running, tick skipped");
                    self.engine.metrics_mut().incr("refresh.skipped");
                    return;
                }
                let charts = self.engine.tick(epoch);
                self.spawn_charts(charts);
            }
            Internal::ChartsDone(epoch) => {
                if self.charts_in_flight == Some(epoch) {
                    self.charts_in_flight = None;
                }
            }
        }
    }

    /// Cancels the refresh timer and every in-flight task of the current
    /// view.
    fn stop_view(&mut self) {
        self.scheduler.deactivate();
        self.tasks.abort_all();
        self.orchestrator = None;
        self.charts_in_flight = None;
        self.publish_visible();
    }

    /// Publishes which layers in-flight batches may still fetch.
    fn publish_visible(&mut self) {
        let layers = match self.orchestrator {
            Some(_) => self.engine.fetchable_layers().into_iter().collect(),
            None => HashSet::new(),
        };
        self.visible.send_replace(layers);
    }

    fn update_gauges(&mut self) {
        let timers = self.scheduler.active_timers() as i64;
        let tasks = self.tasks.len() as i64;
        let metrics = self.engine.metrics_mut();
        metrics.set_gauge("refresh.timers", timers);
        metrics.set_gauge("fetch.tasks", tasks);
    }

    fn select(&mut self, id: ViewId) {
        self.stop_view();
        let epoch = self.engine.begin_resolution(id.clone());
        let views = self.views.clone();
        let tx = self.internal.clone();
        self.tasks.spawn(async move {
            let started = Instant::now();
            let result = resolve_view(views.as_ref(), &id).await;
            let _ = tx.send(Internal::Resolved {
                epoch,
                started,
                result,
            });
        });
    }

    fn start_view(&mut self, installed: Installed) {
        let Installed {
            epoch,
            layers,
            charts,
            refresh,
            columns,
        } = installed;
        self.orchestrator = Some(Orchestrator::new(self.data.clone(), columns));
        self.publish_visible();

        let tx = self.internal.clone();
        self.scheduler
            .activate(epoch, refresh, move |e| tx.send(Internal::Tick(e)).is_ok());

        self.spawn_layer_batch(layers);
        self.spawn_charts(charts);
    }

    /// Initial layer load: one task walks the layers in order, skipping any
    /// hidden since the batch was dispatched.
    fn spawn_layer_batch(&mut self, batch: Vec<LayerDispatch>) {
        let Some(orchestrator) = self.orchestrator.clone() else {
            return;
        };
        if batch.is_empty() {
            return;
        }
        let tx = self.internal.clone();
        let visible = self.visible.subscribe();
        self.tasks.spawn(async move {
            let tickets: HashMap<LayerId, FetchTicket> = batch
                .iter()
                .map(|d| (d.query.layer.clone(), d.ticket))
                .collect();
            let queries: Vec<_> = batch.into_iter().map(|d| d.query).collect();
            orchestrator
                .fetch_all_visible(
                    &queries,
                    |q| visible.borrow().contains(&q.layer),
                    |q, result| {
                        if let Some(&ticket) = tickets.get(&q.layer) {
                            let _ = tx.send(Internal::Layer {
                                ticket,
                                layer: q.layer.clone(),
                                result,
                            });
                        }
                    },
                )
                .await;
        });
    }

    fn spawn_layer(&mut self, dispatch: LayerDispatch) {
        let Some(orchestrator) = self.orchestrator.clone() else {
            return;
        };
        let tx = self.internal.clone();
        self.tasks.spawn(async move {
            let LayerDispatch { ticket, query } = dispatch;
            let result = orchestrator.fetch_layer(&query).await;
            let _ = tx.send(Internal::Layer {
                ticket,
                layer: query.layer,
                result,
            });
        });
    }

    /// Charts are fetched one at a time, in config order. At most one batch
    /// runs at a time; ticks arriving meanwhile are skipped.
    fn spawn_charts(&mut self, charts: Vec<ChartDispatch>) {
        let Some(orchestrator) = self.orchestrator.clone() else {
            return;
        };
        let Some(epoch) = charts.first().map(|d| d.ticket.epoch) else {
            return;
        };
        debug!(count = charts.len(), "dispatching visualization refresh");
        self.charts_in_flight = Some(epoch);
        let tx = self.internal.clone();
        self.tasks.spawn(async move {
            let tickets: HashMap<VisualizationId, FetchTicket> = charts
                .iter()
                .map(|d| (d.query.visualization.clone(), d.ticket))
                .collect();
            let queries: Vec<_> = charts.into_iter().map(|d| d.query).collect();
            orchestrator
                .fetch_all_visualizations(&queries, |q, result| {
                    if let Some(&ticket) = tickets.get(&q.visualization) {
                        let _ = tx.send(Internal::Chart {
                            ticket,
                            visualization: q.visualization.clone(),
                            result,
                        });
                    }
                })
                .await;
            let _ = tx.send(Internal::ChartsDone(epoch));
        });
    }

    fn present(&mut self) {
        if let Some(frame) = self.engine.frame() {
            self.sink.present(&frame);
        }
    }
}
