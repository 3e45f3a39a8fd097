//! Explicit event bus the [`crate::orchestrator::Orchestrator`] owns and
//! injects into itself for publishing per-tick artifacts to observers
//! (REDESIGN FLAGS: replaces the source's module-level singleton bus).
//!
//! Subscribers register by topic; publish is synchronous fan-out with
//! per-subscriber isolation — a panicking subscriber is caught and logged,
//! never allowed to propagate into the pipeline (SPEC_FULL.md §5).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Features,
    Oad,
    Vad,
    Stress,
    Regime,
    Candidate,
    Decision,
    Plan,
    Tick,
}

/// Anything that can receive a published event. `T` is an `Arc`-wrapped
/// artifact so fan-out to many subscribers is cheap.
pub trait Subscriber<T>: Send + Sync {
    fn on_event(&self, event: &T);
}

impl<F, T> Subscriber<T> for F
where
    F: Fn(&T) + Send + Sync,
{
    fn on_event(&self, event: &T) {
        self(event)
    }
}

/// Type-erased per-topic fan-out. Each topic carries its own payload type,
/// so the bus stores one registry per topic rather than a single
/// `HashMap<Topic, Vec<dyn Any>>` — callers publish through the typed
/// `publish` method matching the topic's payload.
#[derive(Default)]
pub struct EventBus {
    feature_subs: RwLock<Vec<Arc<dyn Subscriber<crate::features::FeatureVector>>>>,
    oad_subs: RwLock<Vec<Arc<dyn Subscriber<crate::oad::OadReport>>>>,
    vad_subs: RwLock<Vec<Arc<dyn Subscriber<crate::vad::VadReport>>>>,
    stress_subs: RwLock<Vec<Arc<dyn Subscriber<crate::stress::StressIndex>>>>,
    regime_subs: RwLock<Vec<Arc<dyn Subscriber<crate::regime::RegimeState>>>>,
    candidate_subs: RwLock<Vec<Arc<dyn Subscriber<Option<crate::candidate::TradeCandidate>>>>>,
    decision_subs: RwLock<Vec<Arc<dyn Subscriber<crate::risk_guardian::RiskDecision>>>>,
    plan_subs: RwLock<Vec<Arc<dyn Subscriber<crate::execution::ExecutionPlan>>>>,
    tick_subs: RwLock<Vec<Arc<dyn Subscriber<u64>>>>,
}

macro_rules! bus_channel {
    ($sub_fn:ident, $pub_fn:ident, $field:ident, $ty:ty) => {
        pub fn $sub_fn(&self, sub: Arc<dyn Subscriber<$ty>>) {
            self.$field.write().push(sub);
        }

        pub fn $pub_fn(&self, event: &$ty) {
            for sub in self.$field.read().iter() {
                let sub = sub.clone();
                if catch_unwind(AssertUnwindSafe(|| sub.on_event(event))).is_err() {
                    tracing::error!("event bus subscriber panicked, isolating");
                }
            }
        }
    };
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    bus_channel!(
        subscribe_features,
        publish_features,
        feature_subs,
        crate::features::FeatureVector
    );
    bus_channel!(subscribe_oad, publish_oad, oad_subs, crate::oad::OadReport);
    bus_channel!(subscribe_vad, publish_vad, vad_subs, crate::vad::VadReport);
    bus_channel!(
        subscribe_stress,
        publish_stress,
        stress_subs,
        crate::stress::StressIndex
    );
    bus_channel!(
        subscribe_regime,
        publish_regime,
        regime_subs,
        crate::regime::RegimeState
    );
    bus_channel!(
        subscribe_candidate,
        publish_candidate,
        candidate_subs,
        Option<crate::candidate::TradeCandidate>
    );
    bus_channel!(
        subscribe_decision,
        publish_decision,
        decision_subs,
        crate::risk_guardian::RiskDecision
    );
    bus_channel!(
        subscribe_plan,
        publish_plan,
        plan_subs,
        crate::execution::ExecutionPlan
    );
    bus_channel!(subscribe_tick, publish_tick, tick_subs, u64);
}
