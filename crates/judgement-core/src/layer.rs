//! Layer boundary and the manager wiring layers together.
//!
//! Layers themselves (their prediction models) live outside this crate.
//! They appear here only through the [`Layer`] trait: an id, a hook called
//! when a link attaches, and the `update_predictive_model` entry point that
//! consumes a [`LearningSignal`].
//!
//! [`LayerManager`] owns the link registry and is the single place where
//! the pieces meet: metric registry, policy triad, sensitivity modulator,
//! and per-pair judgement links.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::link::{JudgementLink, JudgementOutcome, LinkId};
use crate::metrics::{MetricKind, MetricRegistry};
use crate::pattern::Pattern;
use crate::policy::{LearningRatePolicy, SkipPolicy, UpdateScopePolicy};
use crate::sensitivity::{LearningRateModulator, SensitivityEventBus};
use crate::signal::LearningSignal;

/// Identifier of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(String);

impl LayerId {
    /// Create a layer id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Which end of a link a layer sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkRole {
    /// The predicting (upper) layer.
    Upstream,
    /// The observed (lower) layer.
    Downstream,
}

/// Contract an externally-owned layer object must satisfy.
#[async_trait]
pub trait Layer: Send + Sync {
    /// Stable id of this layer.
    fn layer_id(&self) -> &LayerId;

    /// Notification that a link was attached to this layer.
    fn on_link_attached(&self, _role: LinkRole, _link: LinkId) {}

    /// Apply a learning signal to this layer's predictive model.
    async fn update_predictive_model(&self, signal: LearningSignal) -> CoreResult<()>;
}

/// Outcome of a managed judgement: the raw link outcome plus the signal
/// to dispatch, if any. The signal's rate already includes the burst
/// amplification factor for the difference's tags.
#[derive(Debug, Clone)]
pub struct JudgedSignal {
    /// The link-level outcome.
    pub outcome: JudgementOutcome,
    /// Signal for the lower layer; `None` when the judgement was skipped.
    pub signal: Option<LearningSignal>,
}

/// Registry of layers and the judgement links between them.
pub struct LayerManager {
    layers: HashMap<LayerId, Arc<dyn Layer>>,
    links: HashMap<LinkId, JudgementLink>,
    metrics: MetricRegistry,
    bus: Arc<SensitivityEventBus>,
    modulator: Arc<LearningRateModulator>,
}

impl LayerManager {
    /// Create a manager; wires the learning-rate modulator onto a fresh
    /// sensitivity bus so published bursts are picked up immediately.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let bus = Arc::new(SensitivityEventBus::new());
        let modulator = Arc::new(LearningRateModulator::new(clock));
        bus.subscribe(modulator.clone());
        Self {
            layers: HashMap::new(),
            links: HashMap::new(),
            metrics: MetricRegistry::with_builtins(),
            bus,
            modulator,
        }
    }

    /// The sensitivity bus; external novelty detection publishes here.
    pub fn sensitivity_bus(&self) -> Arc<SensitivityEventBus> {
        self.bus.clone()
    }

    /// The learning-rate modulator fed by the bus.
    pub fn modulator(&self) -> Arc<LearningRateModulator> {
        self.modulator.clone()
    }

    /// Register a layer object.
    pub fn register_layer(&mut self, layer: Arc<dyn Layer>) {
        let id = layer.layer_id().clone();
        info!(layer = %id, "layer registered");
        self.layers.insert(id, layer);
    }

    /// Look up a registered layer.
    pub fn layer(&self, id: &LayerId) -> Option<Arc<dyn Layer>> {
        self.layers.get(id).cloned()
    }

    /// Create a judgement link between two registered layers.
    ///
    /// Both layers are notified of the attachment. Fails with
    /// [`CoreError::UnknownLayer`] if either id is unregistered.
    pub fn link_layers(
        &mut self,
        upper_id: &LayerId,
        lower_id: &LayerId,
        metric: MetricKind,
        rate_policy: Arc<dyn LearningRatePolicy>,
        scope_policy: Arc<dyn UpdateScopePolicy>,
        skip_policy: Arc<dyn SkipPolicy>,
    ) -> CoreResult<LinkId> {
        let upper = self
            .layers
            .get(upper_id)
            .ok_or_else(|| CoreError::UnknownLayer {
                id: upper_id.to_string(),
            })?
            .clone();
        let lower = self
            .layers
            .get(lower_id)
            .ok_or_else(|| CoreError::UnknownLayer {
                id: lower_id.to_string(),
            })?
            .clone();

        let link = JudgementLink::new(
            upper_id.clone(),
            lower_id.clone(),
            self.metrics.resolve(metric)?,
            skip_policy,
            rate_policy,
            scope_policy,
        );
        let link_id = link.id();

        upper.on_link_attached(LinkRole::Upstream, link_id);
        lower.on_link_attached(LinkRole::Downstream, link_id);

        info!(upper = %upper_id, lower = %lower_id, link = %link_id, "layers linked");
        self.links.insert(link_id, link);
        Ok(link_id)
    }

    /// Access a link by id.
    pub fn link(&self, id: &LinkId) -> CoreResult<&JudgementLink> {
        self.links.get(id).ok_or_else(|| CoreError::UnknownLink {
            id: id.to_string(),
        })
    }

    /// Mutable access to a link (for policy replacement).
    pub fn link_mut(&mut self, id: &LinkId) -> CoreResult<&mut JudgementLink> {
        self.links.get_mut(id).ok_or_else(|| CoreError::UnknownLink {
            id: id.to_string(),
        })
    }

    /// Run a comprehensive judgement on a link and, when it warrants
    /// processing, build the learning signal with the burst amplification
    /// factor folded into the rate.
    pub fn judge(
        &mut self,
        link_id: &LinkId,
        expected: &Pattern,
        actual: &Pattern,
    ) -> CoreResult<JudgedSignal> {
        let modulator = self.modulator.clone();
        let link = self.link_mut(link_id)?;

        let outcome = link.perform_comprehensive_judgement(expected, actual)?;

        let signal = if outcome.should_process {
            let factor = modulator.amplification_factor(&outcome.difference.context().tags);
            Some(LearningSignal::new(
                outcome.learning_rate.amplified(factor),
                outcome.difference.clone(),
                outcome.update_scope.clone(),
            ))
        } else {
            None
        };

        Ok(JudgedSignal { outcome, signal })
    }

    /// Deliver a learning signal to its target layer.
    pub async fn apply_signal(&self, target: &LayerId, signal: LearningSignal) -> CoreResult<()> {
        let layer = self.layer(target).ok_or_else(|| CoreError::UnknownLayer {
            id: target.to_string(),
        })?;
        layer.update_predictive_model(signal).await
    }
}

impl std::fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerManager")
            .field("layers", &self.layers.keys().collect::<Vec<_>>())
            .field("links", &self.links.len())
            .finish()
    }
}
