// Risk management module
pub mod estimator;
pub mod ledger;
pub mod liquidation;

pub use estimator::{
    estimator_from_config, FixedRiskEstimator, RiskEstimator, ScriptedRiskEstimator,
    SimulatedRiskEstimator,
};
pub use ledger::{AccountState, LedgerEntry, ProfitLedger};
pub use liquidation::{LiquidationRiskController, RiskAdjustment};
