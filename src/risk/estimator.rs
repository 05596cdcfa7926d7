use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RiskConfig;

/// Source of the current liquidation-risk ratio
pub trait RiskEstimator: Send {
    /// Current estimated liquidation proximity as a ratio (0..1)
    fn estimate(&mut self) -> f64;
}

impl<T: RiskEstimator + ?Sized> RiskEstimator for Box<T> {
    fn estimate(&mut self) -> f64 {
        (**self).estimate()
    }
}

/// Pick the estimator the risk settings ask for
///
/// A configured `fixed_risk` wins; otherwise the ratio is simulated.
pub fn estimator_from_config(config: &RiskConfig) -> Box<dyn RiskEstimator> {
    match config.fixed_risk {
        Some(risk) => Box::new(FixedRiskEstimator::new(risk)),
        None => Box::new(SimulatedRiskEstimator::new(
            config.simulated_min,
            config.simulated_max,
            config.simulated_seed,
        )),
    }
}

/// Always reports the same ratio
#[derive(Debug, Clone, Copy)]
pub struct FixedRiskEstimator {
    risk: f64,
}

impl FixedRiskEstimator {
    pub fn new(risk: f64) -> Self {
        Self { risk }
    }
}

impl RiskEstimator for FixedRiskEstimator {
    fn estimate(&mut self) -> f64 {
        self.risk
    }
}

/// Draws the ratio uniformly from `[min, max)`
///
/// Stand-in for a real exposure model; seed it for reproducible runs.
pub struct SimulatedRiskEstimator {
    rng: StdRng,
    min: f64,
    max: f64,
}

impl SimulatedRiskEstimator {
    pub fn new(min: f64, max: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, min, max }
    }
}

impl RiskEstimator for SimulatedRiskEstimator {
    fn estimate(&mut self) -> f64 {
        self.rng.gen_range(self.min..self.max)
    }
}

/// Replays a fixed sequence, repeating the last value once exhausted
pub struct ScriptedRiskEstimator {
    values: Vec<f64>,
    next: usize,
}

impl ScriptedRiskEstimator {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, next: 0 }
    }
}

impl RiskEstimator for ScriptedRiskEstimator {
    fn estimate(&mut self) -> f64 {
        let value = self
            .values
            .get(self.next)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(0.0);
        self.next += 1;
        value
    }
}
