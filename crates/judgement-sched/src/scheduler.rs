//! The update scheduler: immediate path, frame path, phase sync.
//!
//! One tokio task owns the event queue, the backpressure control, and the
//! rhythm tracker; producers only hold a [`SchedulerHandle`] and send
//! events over channels. That makes the queue single-writer by
//! construction - no lock is shared with producers.
//!
//! # Dispatch paths
//!
//! - **Immediate**: events at or above the immediate-priority threshold
//!   travel a dedicated channel drained with `biased` priority, so an
//!   urgent event preempts frame work at the next await point rather
//!   than waiting for a tick. All urgent backlog is drained before any
//!   frame batch in the same scheduling pass.
//! - **Frame**: everything else is admitted into the bounded priority
//!   queue and drained in bounded batches on each base tick of the
//!   [`ControlFrameTimer`], after a backpressure monitoring pass.
//!
//! Per-layer rhythms fire on the same base tick via the
//! [`RhythmTracker`](crate::rhythm::RhythmTracker); see the rhythm module
//! for the phase math.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use judgement_core::clock::Clock;
use judgement_core::layer::{LayerId, LayerManager};

use crate::backpressure::{BackpressureControl, PressureSignal};
use crate::config::SchedConfig;
use crate::error::{SchedError, SchedResult};
use crate::event::{UpdateEvent, UrgencyClass};
use crate::queue::{EventQueue, PushOutcome};
use crate::rhythm::{LayerRhythmConfig, RhythmTracker};

/// Delivers a dequeued event to its destination.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Deliver one event.
    async fn dispatch(&self, event: UpdateEvent) -> SchedResult<()>;
}

/// Dispatcher delivering learning signals to layers in a [`LayerManager`].
pub struct LayerDispatcher {
    manager: Arc<RwLock<LayerManager>>,
}

impl LayerDispatcher {
    /// Create a dispatcher over a shared layer manager.
    pub fn new(manager: Arc<RwLock<LayerManager>>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Dispatcher for LayerDispatcher {
    async fn dispatch(&self, event: UpdateEvent) -> SchedResult<()> {
        // Clone the layer handle inside a short read guard; the update
        // itself runs without holding the lock.
        let layer = {
            let manager = self.manager.read();
            manager.layer(&event.target)
        };
        let layer = layer.ok_or_else(|| {
            SchedError::Core(judgement_core::CoreError::UnknownLayer {
                id: event.target.to_string(),
            })
        })?;
        layer.update_predictive_model(event.signal).await?;
        Ok(())
    }
}

/// Receiver of per-layer rhythm ticks.
pub trait TickHandler: Send + Sync {
    /// Called when a layer's cycle boundary is crossed.
    fn on_layer_tick(&self, layer: &LayerId);
}

/// Periodic base timer driving the frame path.
///
/// The first tick lands one full period after construction. Missed ticks
/// are skipped rather than bursted, so a stall does not replay a backlog
/// of frames.
pub struct ControlFrameTimer {
    interval: Interval,
}

impl ControlFrameTimer {
    /// Create a timer with the given base tick period.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Wait for the next base tick.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Snapshot of scheduler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Events dispatched on the immediate path.
    pub immediate_dispatched: u64,
    /// Events dispatched on the frame path.
    pub frame_dispatched: u64,
    /// Events rejected by the full queue.
    pub rejected: u64,
    /// Events dropped by backpressure.
    pub dropped: u64,
    /// Events degraded by backpressure.
    pub degraded: u64,
    /// Dispatches that returned an error.
    pub dispatch_failures: u64,
}

#[derive(Debug, Default)]
struct SchedulerStatsInternal {
    immediate_dispatched: AtomicU64,
    frame_dispatched: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
    degraded: AtomicU64,
    dispatch_failures: AtomicU64,
}

impl SchedulerStatsInternal {
    fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            immediate_dispatched: self.immediate_dispatched.load(Ordering::Relaxed),
            frame_dispatched: self.frame_dispatched.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
        }
    }
}

/// Producer-side handle to a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    urgent_tx: mpsc::Sender<UpdateEvent>,
    frame_tx: mpsc::Sender<UpdateEvent>,
    shutdown: Arc<Notify>,
    is_running: Arc<AtomicBool>,
    immediate_threshold: f32,
    stats: Arc<SchedulerStatsInternal>,
    pressure_rx: watch::Receiver<PressureSignal>,
}

impl SchedulerHandle {
    /// Submit an event, routing by its urgency class.
    pub async fn submit(&self, event: UpdateEvent) -> SchedResult<()> {
        if !self.is_running.load(Ordering::Relaxed) {
            return Err(SchedError::SchedulerStopped);
        }
        let tx = match event.urgency(self.immediate_threshold) {
            UrgencyClass::Immediate => &self.urgent_tx,
            UrgencyClass::Frame => &self.frame_tx,
        };
        tx.send(event)
            .await
            .map_err(|_| SchedError::SchedulerStopped)
    }

    /// Current pressure signal; producers should throttle while active.
    pub fn pressure(&self) -> PressureSignal {
        *self.pressure_rx.borrow()
    }

    /// Watch-channel receiver for pressure changes.
    pub fn pressure_watch(&self) -> watch::Receiver<PressureSignal> {
        self.pressure_rx.clone()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> SchedulerStats {
        self.stats.snapshot()
    }

    /// Whether the scheduler task is still running.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Ask the scheduler task to stop after flushing urgent work.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// Builder for the scheduler task.
pub struct UpdateScheduler {
    config: SchedConfig,
    dispatcher: Arc<dyn Dispatcher>,
    clock: Arc<dyn Clock>,
    tick_handler: Option<Arc<dyn TickHandler>>,
    rhythms: Vec<(LayerId, LayerRhythmConfig)>,
}

impl UpdateScheduler {
    /// Create a scheduler builder, validating the configuration.
    pub fn new(
        config: SchedConfig,
        dispatcher: Arc<dyn Dispatcher>,
        clock: Arc<dyn Clock>,
    ) -> SchedResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dispatcher,
            clock,
            tick_handler: None,
            rhythms: Vec::new(),
        })
    }

    /// Attach a rhythm tick handler.
    pub fn with_tick_handler(mut self, handler: Arc<dyn TickHandler>) -> Self {
        self.tick_handler = Some(handler);
        self
    }

    /// Register a per-layer rhythm.
    pub fn with_rhythm(mut self, layer: LayerId, rhythm: LayerRhythmConfig) -> Self {
        self.rhythms.push((layer, rhythm));
        self
    }

    /// Spawn the scheduler task and return the producer handle.
    pub fn spawn(self) -> SchedulerHandle {
        let (urgent_tx, urgent_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let (frame_tx, frame_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let shutdown = Arc::new(Notify::new());
        let is_running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(SchedulerStatsInternal::default());

        let mut backpressure = BackpressureControl::with_thresholds(
            self.config.backpressure_threshold,
            self.config.drop_below,
            self.config.degrade_below,
        );
        let pressure_rx = backpressure.subscribe();

        let handle = SchedulerHandle {
            urgent_tx,
            frame_tx,
            shutdown: shutdown.clone(),
            is_running: is_running.clone(),
            immediate_threshold: self.config.immediate_threshold,
            stats: stats.clone(),
            pressure_rx,
        };

        let mut rhythm = RhythmTracker::new(self.clock.now_ms());
        for (layer, config) in self.rhythms {
            rhythm.set_rhythm(layer, config);
        }

        tokio::spawn(scheduler_loop(
            self.config,
            self.dispatcher,
            self.clock,
            self.tick_handler,
            backpressure,
            rhythm,
            urgent_rx,
            frame_rx,
            shutdown,
            is_running,
            stats,
        ));

        handle
    }
}

#[allow(clippy::too_many_arguments)]
async fn scheduler_loop(
    config: SchedConfig,
    dispatcher: Arc<dyn Dispatcher>,
    clock: Arc<dyn Clock>,
    tick_handler: Option<Arc<dyn TickHandler>>,
    mut backpressure: BackpressureControl,
    mut rhythm: RhythmTracker,
    mut urgent_rx: mpsc::Receiver<UpdateEvent>,
    mut frame_rx: mpsc::Receiver<UpdateEvent>,
    shutdown: Arc<Notify>,
    is_running: Arc<AtomicBool>,
    stats: Arc<SchedulerStatsInternal>,
) {
    let mut queue = EventQueue::with_capacity(config.queue_capacity);
    let mut timer = ControlFrameTimer::new(config.base_tick);
    let mut urgent_closed = false;
    let mut frame_closed = false;

    info!(
        queue_capacity = config.queue_capacity,
        base_tick_ms = config.base_tick.as_millis() as u64,
        frame_batch = config.frame_batch,
        "update scheduler started"
    );

    loop {
        tokio::select! {
            biased;

            _ = shutdown.notified() => {
                // Flush urgent backlog before exiting
                while let Ok(event) = urgent_rx.try_recv() {
                    dispatch_one(&dispatcher, event, &stats.immediate_dispatched, &stats).await;
                }
                break;
            }

            maybe_event = urgent_rx.recv(), if !urgent_closed => {
                match maybe_event {
                    Some(event) => {
                        debug!(id = %event.id, priority = event.priority, "immediate dispatch");
                        dispatch_one(&dispatcher, event, &stats.immediate_dispatched, &stats).await;
                    }
                    None => urgent_closed = true,
                }
            }

            maybe_event = frame_rx.recv(), if !frame_closed => {
                match maybe_event {
                    Some(event) => {
                        if queue.push(event) == PushOutcome::Rejected {
                            stats.rejected.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    None => frame_closed = true,
                }
            }

            _ = timer.tick() => {
                // Urgent backlog drains fully before any frame batch
                while let Ok(event) = urgent_rx.try_recv() {
                    dispatch_one(&dispatcher, event, &stats.immediate_dispatched, &stats).await;
                }

                let report = backpressure.monitor(&mut queue);
                if report.dropped > 0 {
                    stats.dropped.fetch_add(report.dropped as u64, Ordering::Relaxed);
                }
                if report.degraded > 0 {
                    stats.degraded.fetch_add(report.degraded as u64, Ordering::Relaxed);
                }

                for _ in 0..config.frame_batch {
                    match queue.pull() {
                        Some(event) => {
                            dispatch_one(&dispatcher, event, &stats.frame_dispatched, &stats).await;
                        }
                        None => break,
                    }
                }

                if let Some(handler) = &tick_handler {
                    for layer in rhythm.due_layers(clock.now_ms()) {
                        handler.on_layer_tick(&layer);
                    }
                }

                // All producers gone and nothing queued: stop ticking
                if urgent_closed && frame_closed && queue.is_empty() {
                    debug!("all producer handles dropped, stopping");
                    break;
                }
            }
        }
    }

    is_running.store(false, Ordering::Relaxed);
    info!("update scheduler stopped");
}

async fn dispatch_one(
    dispatcher: &Arc<dyn Dispatcher>,
    event: UpdateEvent,
    counter: &AtomicU64,
    stats: &SchedulerStatsInternal,
) {
    let id = event.id;
    match dispatcher.dispatch(event).await {
        Ok(()) => {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        Err(err) => {
            stats.dispatch_failures.fetch_add(1, Ordering::Relaxed);
            warn!(event = %id, error = %err, "dispatch failed");
        }
    }
}
