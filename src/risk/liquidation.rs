use serde::{Deserialize, Serialize};

use super::ledger::{AccountState, ProfitLedger};
use crate::config::RiskConfig;
use crate::error::MonitorError;

/// Trims recorded profit when liquidation risk runs above the limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationRiskController {
    pub max_liquidation_risk: f64,
    /// When false, trimmed symbols are only reported and the ledger is left as is
    pub deduct_from_ledger: bool,
}

impl Default for LiquidationRiskController {
    fn default() -> Self {
        Self {
            max_liquidation_risk: 0.07, // 7%
            deduct_from_ledger: false,
        }
    }
}

/// Outcome of one risk-trim pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAdjustment {
    pub risk: f64,
    /// Ratio of equity that had to be freed (`risk - max_liquidation_risk`)
    pub excess: f64,
    pub reduced_symbols: Vec<String>,
    pub reduced_total: f64,
    /// False when the ledger ran out before the excess was covered
    pub fully_covered: bool,
}

impl LiquidationRiskController {
    pub fn new(max_liquidation_risk: f64, deduct_from_ledger: bool) -> Self {
        Self {
            max_liquidation_risk,
            deduct_from_ledger,
        }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config.max_liquidation_risk, config.deduct_from_ledger)
    }

    /// Compare `risk` against the limit and trim winners if it is exceeded
    ///
    /// Returns `Ok(None)` when risk is within the limit. Winners are taken
    /// largest first until the trimmed profit, as a share of equity, exceeds
    /// the excess risk. Running out of entries is accepted as partial relief.
    pub fn apply(
        &self,
        risk: f64,
        ledger: &mut ProfitLedger,
        account: &AccountState,
    ) -> Result<Option<RiskAdjustment>, MonitorError> {
        if !risk.is_finite() {
            return Err(MonitorError::InvalidRiskMetric(risk));
        }
        if risk <= self.max_liquidation_risk {
            tracing::debug!(
                "Liquidation risk {:.4} within limit {:.4}",
                risk,
                self.max_liquidation_risk
            );
            return Ok(None);
        }
        if !(account.total_equity > 0.0) {
            return Err(MonitorError::InvalidEquity(account.total_equity));
        }

        let excess = risk - self.max_liquidation_risk;
        let mut reduced_total = 0.0;
        let mut reduced: Vec<(String, f64)> = Vec::new();
        let mut fully_covered = false;

        for entry in ledger.ranked() {
            tracing::info!(
                symbol = %entry.symbol,
                profit = entry.profit,
                "Reducing profit to relieve liquidation risk"
            );
            reduced_total += entry.profit;
            reduced.push((entry.symbol.clone(), entry.profit));

            if reduced_total / account.total_equity > excess {
                fully_covered = true;
                break;
            }
        }

        if self.deduct_from_ledger {
            for (symbol, profit) in &reduced {
                ledger.deduct(symbol, *profit);
            }
        }

        if !fully_covered {
            tracing::warn!(
                "Ledger exhausted: trimmed ${:.2} covers {:.4} of {:.4} excess risk",
                reduced_total,
                reduced_total / account.total_equity,
                excess
            );
        }

        tracing::info!(
            "Risk {:.4} adjusted with ${:.2} of profit reductions",
            risk,
            reduced_total
        );

        Ok(Some(RiskAdjustment {
            risk,
            excess,
            reduced_symbols: reduced.into_iter().map(|(symbol, _)| symbol).collect(),
            reduced_total,
            fully_covered,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_ledger() -> ProfitLedger {
        ProfitLedger::from_entries([("ETH", 6.0), ("BNB", 4.0)])
    }

    #[test]
    fn test_within_limit_takes_no_action() {
        let controller = LiquidationRiskController::default();
        let mut ledger = reference_ledger();

        let result = controller
            .apply(0.07, &mut ledger, &AccountState::new(100.0))
            .unwrap();

        assert!(result.is_none());
        assert_eq!(ledger, reference_ledger());
    }

    #[test]
    fn test_stops_after_first_sufficient_winner() {
        let controller = LiquidationRiskController::default();
        let mut ledger = reference_ledger();

        let adjustment = controller
            .apply(0.095, &mut ledger, &AccountState::new(100.0))
            .unwrap()
            .unwrap();

        assert_eq!(adjustment.reduced_total, 6.0);
        assert_eq!(adjustment.reduced_symbols, vec!["ETH".to_string()]);
        assert!((adjustment.excess - 0.025).abs() < 1e-12);
        assert!(adjustment.fully_covered);
    }

    #[test]
    fn test_ledger_untouched_by_default() {
        let controller = LiquidationRiskController::default();
        let mut ledger = reference_ledger();

        controller
            .apply(0.095, &mut ledger, &AccountState::new(100.0))
            .unwrap();

        assert_eq!(ledger.get("ETH"), Some(6.0));
        assert_eq!(ledger.get("BNB"), Some(4.0));
    }

    #[test]
    fn test_deducts_when_enabled() {
        let controller = LiquidationRiskController::new(0.07, true);
        let mut ledger = reference_ledger();

        controller
            .apply(0.095, &mut ledger, &AccountState::new(100.0))
            .unwrap();

        assert_eq!(ledger.get("ETH"), Some(0.0));
        assert_eq!(ledger.get("BNB"), Some(4.0));
    }

    #[test]
    fn test_exhausted_ledger_is_partial_relief() {
        let controller = LiquidationRiskController::default();
        let mut ledger = reference_ledger();

        // Excess 0.13 needs more than $13; only $10 recorded
        let adjustment = controller
            .apply(0.20, &mut ledger, &AccountState::new(100.0))
            .unwrap()
            .unwrap();

        assert_eq!(adjustment.reduced_total, 10.0);
        assert_eq!(adjustment.reduced_symbols, vec!["ETH", "BNB"]);
        assert!(!adjustment.fully_covered);
    }

    #[test]
    fn test_empty_ledger() {
        let controller = LiquidationRiskController::default();
        let mut ledger = ProfitLedger::new();

        let adjustment = controller
            .apply(0.09, &mut ledger, &AccountState::new(100.0))
            .unwrap()
            .unwrap();

        assert_eq!(adjustment.reduced_total, 0.0);
        assert!(adjustment.reduced_symbols.is_empty());
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let controller = LiquidationRiskController::default();
        let mut ledger = reference_ledger();

        let result = controller.apply(f64::NAN, &mut ledger, &AccountState::new(100.0));
        assert!(matches!(result, Err(MonitorError::InvalidRiskMetric(_))));

        let result = controller.apply(0.09, &mut ledger, &AccountState::new(0.0));
        assert_eq!(result, Err(MonitorError::InvalidEquity(0.0)));
    }
}
