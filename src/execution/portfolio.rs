use std::collections::HashMap;

use crate::config::Settings;
use crate::execution::PositionManager;
use crate::risk::{AccountState, ProfitLedger};

/// Positions, recorded profit and account state shared by one evaluation pass
///
/// Passed by `&mut` into the monitor so every component sees the same tables.
#[derive(Debug, Clone)]
pub struct PortfolioStore {
    pub positions: PositionManager,
    pub ledger: ProfitLedger,
    pub account: AccountState,
}

impl PortfolioStore {
    pub fn new(positions: PositionManager, ledger: ProfitLedger, account: AccountState) -> Self {
        Self {
            positions,
            ledger,
            account,
        }
    }

    /// Build the start-up portfolio from settings
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let positions = PositionManager::with_seeds(
            settings.signals.scale_in_factor,
            settings.signals.partial_exit_retain,
            &settings.positions,
        )?;
        let ledger = ProfitLedger::from_entries(
            settings
                .ledger
                .iter()
                .map(|seed| (seed.symbol.clone(), seed.profit)),
        );

        Ok(Self::new(
            positions,
            ledger,
            AccountState::new(settings.account.total_equity),
        ))
    }

    /// Log a summary of open positions at the given prices
    pub fn log_summary(&self, prices: &HashMap<String, f64>) {
        let open_positions = self.positions.open_positions();

        tracing::info!("📊 Portfolio Summary:");
        tracing::info!("  Equity: ${:.2}", self.account.total_equity);
        tracing::info!(
            "  Recorded profit: ${:.2} across {} symbols",
            self.ledger.total(),
            self.ledger.len()
        );
        tracing::info!(
            "  Unrealized P&L: ${:.2}",
            self.positions.unrealized_pnl(prices)
        );
        tracing::info!("  Open Positions: {}", open_positions.len());

        for position in open_positions {
            match prices.get(&position.symbol) {
                Some(&current_price) => {
                    tracing::info!(
                        "    {} {:?} x{} | {:?} | Qty: {:.4} | Entry: ${:.4} | Current: ${:.4} | P&L: ${:.2}",
                        position.symbol,
                        position.direction,
                        position.leverage,
                        position.state(),
                        position.quantity(),
                        position.entry_price(),
                        current_price,
                        position.unrealized_pnl(current_price)
                    );
                }
                None => {
                    tracing::info!(
                        "    {} {:?} x{} | {:?} | Qty: {:.4} | Entry: ${:.4} | no price",
                        position.symbol,
                        position.direction,
                        position.leverage,
                        position.state(),
                        position.quantity(),
                        position.entry_price()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reference_settings() {
        let store = PortfolioStore::from_settings(&Settings::reference()).unwrap();

        assert_eq!(store.positions.open_symbols(), vec!["SOLUSDT".to_string()]);
        assert_eq!(store.ledger.get("ETHUSDT"), Some(6.0));
        assert_eq!(store.ledger.get("BNBUSDT"), Some(4.0));
        assert_eq!(store.account.total_equity, 100.0);
    }

    #[test]
    fn test_duplicate_seed_rejected() {
        let mut settings = Settings::reference();
        let seed = settings.positions[0].clone();
        settings.positions.push(seed);

        assert!(PortfolioStore::from_settings(&settings).is_err());
    }
}
