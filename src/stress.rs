//! Fuses OAD and VAD into a single three-level stress index
//! (SPEC_FULL.md §4.7). Pure function of its inputs — no internal state.

use crate::level::AlertLevel;
use crate::oad::OadReport;
use crate::time::Timestamp;
use crate::vad::VadReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressIndex {
    pub timestamp: Timestamp,
    pub level: AlertLevel,
    pub score: f64,
    pub components: HashMap<String, f64>,
}

pub struct StressAggregator;

impl StressAggregator {
    pub fn aggregate(oad: &OadReport, vad: &VadReport) -> StressIndex {
        let score = 0.5 * oad.score + 0.3 * vad.score + 5.0 * vad.toxic;
        let level = oad.level.max(vad.level);

        let mut components = HashMap::new();
        components.insert("oad_score".to_string(), oad.score);
        components.insert("vad_score".to_string(), vad.score);
        components.insert("toxic".to_string(), vad.toxic);

        StressIndex {
            timestamp: oad.timestamp,
            level,
            score,
            components,
        }
    }
}
