//! End-to-end judgement pipeline tests.

use std::sync::Arc;
use std::time::Duration;

use judgement_core::clock::{Clock, ManualClock};
use judgement_core::layer::{Layer, LayerId, LayerManager};
use judgement_core::metrics::MetricKind;
use judgement_core::pattern::Pattern;
use judgement_core::policy::{
    ProportionalRatePolicy, SimpleSkipStrategy, SkipDecision, ThresholdScopePolicy,
};
use judgement_core::sensitivity::LrBurst;
use judgement_core::signal::LearningSignal;
use judgement_core::CoreResult;

use async_trait::async_trait;
use parking_lot::Mutex;

struct StubLayer {
    id: LayerId,
    received: Mutex<Vec<LearningSignal>>,
}

impl StubLayer {
    fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: LayerId::new(id),
            received: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Layer for StubLayer {
    fn layer_id(&self) -> &LayerId {
        &self.id
    }

    async fn update_predictive_model(&self, signal: LearningSignal) -> CoreResult<()> {
        self.received.lock().push(signal);
        Ok(())
    }
}

fn build_manager(clock: &ManualClock) -> (LayerManager, judgement_core::LinkId, Arc<StubLayer>) {
    let mut manager = LayerManager::new(Arc::new(clock.clone()));
    let upper = StubLayer::new("pattern");
    let lower = StubLayer::new("sensory");
    manager.register_layer(upper);
    manager.register_layer(lower.clone());

    let link_id = manager
        .link_layers(
            &LayerId::new("pattern"),
            &LayerId::new("sensory"),
            MetricKind::Cosine,
            Arc::new(ProportionalRatePolicy::new(0.01, 0.5).unwrap()),
            Arc::new(ThresholdScopePolicy::default()),
            Arc::new(SimpleSkipStrategy::new(0.01, 0.5).unwrap()),
        )
        .unwrap();

    (manager, link_id, lower)
}

#[tokio::test]
async fn orthogonal_patterns_trigger_focused_update() {
    let clock = ManualClock::new();
    let (mut manager, link_id, lower) = build_manager(&clock);

    let judged = manager
        .judge(
            &link_id,
            &Pattern::new(vec![1.0, 0.0, 0.0]),
            &Pattern::new(vec![0.0, 1.0, 0.0]),
        )
        .unwrap();

    // Cosine distance of orthogonal vectors is exactly 1
    assert!((judged.outcome.difference.magnitude() - 1.0).abs() < 1e-6);
    assert_eq!(
        judged.outcome.skip_decision,
        SkipDecision::FocusedCalculation
    );
    assert!(judged.outcome.should_process);

    let signal = judged.signal.unwrap();
    assert!(signal.rate.value > 0.0);
    assert!(!signal.scope.is_empty());

    manager
        .apply_signal(&LayerId::new("sensory"), signal)
        .await
        .unwrap();
    assert_eq!(lower.received.lock().len(), 1);
}

#[test]
fn identical_patterns_are_fully_skipped_but_recorded() {
    let clock = ManualClock::new();
    let (mut manager, link_id, _lower) = build_manager(&clock);

    let same = Pattern::new(vec![0.3, 0.7]);
    let judged = manager.judge(&link_id, &same, &same).unwrap();

    assert_eq!(judged.outcome.skip_decision, SkipDecision::FullSkip);
    assert!(judged.signal.is_none());

    let stats = manager.link(&link_id).unwrap().statistics();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.full_skips, 1);
}

#[test]
fn burst_amplification_decays_across_judgements() {
    let clock = ManualClock::new();
    let (mut manager, link_id, _lower) = build_manager(&clock);

    let expected = Pattern::new(vec![1.0, 0.0]).with_tag("novel");
    let actual = Pattern::new(vec![0.0, 1.0]).with_tag("novel");

    let baseline = manager
        .judge(&link_id, &expected, &actual)
        .unwrap()
        .signal
        .unwrap()
        .rate
        .value;

    manager
        .sensitivity_bus()
        .publish(&LrBurst::new(["novel"], 2.0, Duration::from_secs(30), clock.now_ms()).unwrap());

    let at_peak = manager
        .judge(&link_id, &expected, &actual)
        .unwrap()
        .signal
        .unwrap()
        .rate
        .value;
    assert!((at_peak - baseline * 2.0).abs() < 1e-6);

    // One half-life later the amplification has decayed to 1.5x
    clock.advance(30_000);
    let after_half_life = manager
        .judge(&link_id, &expected, &actual)
        .unwrap()
        .signal
        .unwrap()
        .rate
        .value;
    assert!((after_half_life - baseline * 1.5).abs() < 1e-4);
}

#[test]
fn dimension_mismatch_propagates_as_error() {
    let clock = ManualClock::new();
    let (mut manager, link_id, _lower) = build_manager(&clock);

    let err = manager
        .judge(
            &link_id,
            &Pattern::new(vec![1.0, 2.0]),
            &Pattern::new(vec![1.0, 2.0, 3.0]),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        judgement_core::CoreError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
}
