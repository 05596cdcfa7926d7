use serde::{Deserialize, Serialize};

/// Recorded profit per symbol (USD), kept in insertion order
///
/// Entries never go negative. Insertion order is what breaks ties when the
/// liquidation controller ranks winners.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfitLedger {
    entries: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub symbol: String,
    pub profit: f64,
}

impl ProfitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from `(symbol, profit)` pairs, in order
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut ledger = Self::new();
        for (symbol, profit) in entries {
            ledger.credit(&symbol.into(), profit);
        }
        ledger
    }

    /// Add profit to a symbol's entry, creating it at the end if missing
    ///
    /// Non-positive or non-finite amounts are ignored.
    pub fn credit(&mut self, symbol: &str, amount: f64) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }

        match self.entries.iter_mut().find(|e| e.symbol == symbol) {
            Some(entry) => entry.profit += amount,
            None => self.entries.push(LedgerEntry {
                symbol: symbol.to_string(),
                profit: amount,
            }),
        }
    }

    /// Reduce a symbol's entry, clamping at zero
    ///
    /// Returns the amount actually deducted.
    pub fn deduct(&mut self, symbol: &str, amount: f64) -> f64 {
        match self.entries.iter_mut().find(|e| e.symbol == symbol) {
            Some(entry) if amount > 0.0 => {
                let deducted = amount.min(entry.profit);
                entry.profit -= deducted;
                deducted
            }
            _ => 0.0,
        }
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.profit)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Entries ranked by profit, largest first; equal profits keep insertion order
    pub fn ranked(&self) -> Vec<&LedgerEntry> {
        let mut ranked: Vec<&LedgerEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.profit.total_cmp(&a.profit));
        ranked
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.profit).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Account-level figures read by the risk controller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AccountState {
    pub total_equity: f64,
}

impl AccountState {
    pub fn new(total_equity: f64) -> Self {
        Self { total_equity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_accumulates() {
        let mut ledger = ProfitLedger::new();
        ledger.credit("ETHUSDT", 6.0);
        ledger.credit("ETHUSDT", 1.5);
        ledger.credit("BNBUSDT", 4.0);

        assert_eq!(ledger.get("ETHUSDT"), Some(7.5));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.total(), 11.5);
    }

    #[test]
    fn test_credit_ignores_losses() {
        let mut ledger = ProfitLedger::new();
        ledger.credit("SOLUSDT", -3.0);
        ledger.credit("SOLUSDT", 0.0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_deduct_clamps_at_zero() {
        let mut ledger = ProfitLedger::from_entries([("ETHUSDT", 6.0)]);

        assert_eq!(ledger.deduct("ETHUSDT", 10.0), 6.0);
        assert_eq!(ledger.get("ETHUSDT"), Some(0.0));
        assert_eq!(ledger.deduct("MISSING", 1.0), 0.0);
    }

    #[test]
    fn test_ranked_is_stable() {
        let ledger =
            ProfitLedger::from_entries([("AAA", 2.0), ("BBB", 5.0), ("CCC", 2.0), ("DDD", 5.0)]);

        let order: Vec<&str> = ledger.ranked().iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(order, vec!["BBB", "DDD", "AAA", "CCC"]);
    }
}
