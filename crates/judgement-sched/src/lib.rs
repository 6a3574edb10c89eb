//! Adaptive update scheduling for judgement signals.
//!
//! The `judgement-core` crate decides *whether* and *how much* a
//! downstream model should be corrected; this crate decides *when* that
//! work runs:
//!
//! - [`event`] - units of pending update work with `[0, 1]` priorities
//! - [`queue`] - bounded, stable priority queue owned by the scheduler
//! - [`backpressure`] - admission control that drops or degrades
//!   low-priority work under load and signals producers to throttle
//! - [`rhythm`] - per-layer cycles with phase offsets over a shared timer
//! - [`scheduler`] - the single task driving the immediate and frame
//!   dispatch paths
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use judgement_core::clock::SystemClock;
//! use judgement_sched::config::SchedConfig;
//! use judgement_sched::scheduler::{Dispatcher, UpdateScheduler};
//! # use judgement_sched::error::SchedResult;
//! # use judgement_sched::event::UpdateEvent;
//! # struct Nop;
//! # #[async_trait::async_trait]
//! # impl Dispatcher for Nop {
//! #     async fn dispatch(&self, _event: UpdateEvent) -> SchedResult<()> { Ok(()) }
//! # }
//!
//! # async fn run() -> SchedResult<()> {
//! let scheduler = UpdateScheduler::new(
//!     SchedConfig::default(),
//!     Arc::new(Nop),
//!     Arc::new(SystemClock::new()),
//! )?;
//! let handle = scheduler.spawn();
//! // producers call handle.submit(event).await
//! handle.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod backpressure;
pub mod config;
pub mod error;
pub mod event;
pub mod queue;
pub mod rhythm;
pub mod scheduler;

// Re-exports for convenience
pub use backpressure::{BackpressureControl, BackpressureReport, DegradeAction, PressureSignal};
pub use config::SchedConfig;
pub use error::{SchedError, SchedResult};
pub use event::{UpdateEvent, UrgencyClass};
pub use queue::{EventQueue, PushOutcome};
pub use rhythm::{LayerRhythmConfig, RhythmTracker};
pub use scheduler::{
    ControlFrameTimer, Dispatcher, LayerDispatcher, SchedulerHandle, SchedulerStats, TickHandler,
    UpdateScheduler,
};
