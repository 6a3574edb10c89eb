//! Relative-judgement core.
//!
//! A hierarchy of independent layers each predicts an expected pattern and
//! observes an actual one. This crate quantifies how far the two diverge
//! and decides how urgently and how extensively the downstream model
//! should be corrected:
//!
//! - [`metrics`] - pluggable distance metrics (L2, cosine, KL, EMD)
//! - [`policy`] - the skip / learning-rate / update-scope strategy triad
//! - [`sensitivity`] - time-decaying novelty bursts amplifying learning rates
//! - [`link`] - per-layer-pair judgement orchestration with bounded history
//! - [`layer`] - the layer boundary trait and the manager wiring it together
//!
//! Scheduling of the resulting update work lives in the `judgement-sched`
//! crate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use judgement_core::metrics::CosineDistance;
//! use judgement_core::link::JudgementLink;
//! use judgement_core::layer::LayerId;
//! use judgement_core::pattern::Pattern;
//! use judgement_core::policy::{
//!     ProportionalRatePolicy, SimpleSkipStrategy, ThresholdScopePolicy,
//! };
//!
//! let mut link = JudgementLink::new(
//!     LayerId::new("pattern"),
//!     LayerId::new("sensory"),
//!     Arc::new(CosineDistance),
//!     Arc::new(SimpleSkipStrategy::new(0.01, 0.5)?),
//!     Arc::new(ProportionalRatePolicy::default()),
//!     Arc::new(ThresholdScopePolicy::default()),
//! );
//!
//! let outcome = link.perform_comprehensive_judgement(
//!     &Pattern::new(vec![1.0, 0.0, 0.0]),
//!     &Pattern::new(vec![0.0, 1.0, 0.0]),
//! )?;
//! assert!(outcome.should_process);
//! # Ok::<(), judgement_core::error::CoreError>(())
//! ```

pub mod clock;
pub mod config;
pub mod difference;
pub mod error;
pub mod layer;
pub mod link;
pub mod metrics;
pub mod pattern;
pub mod policy;
pub mod sensitivity;
pub mod signal;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use difference::RelativeDifference;
pub use error::{CoreError, CoreResult};
pub use layer::{JudgedSignal, Layer, LayerId, LayerManager, LinkRole};
pub use link::{JudgementLink, JudgementOutcome, LinkId, LinkStatistics};
pub use metrics::{DistanceMetric, MetricKind, MetricRegistry};
pub use pattern::{Pattern, PatternContext};
pub use policy::{
    AdaptiveLearningRate, LearningRatePolicy, SkipDecision, SkipPolicy, UpdateScope,
    UpdateScopePolicy,
};
pub use sensitivity::{LearningRateModulator, LrBurst, SensitivityEventBus};
pub use signal::LearningSignal;
