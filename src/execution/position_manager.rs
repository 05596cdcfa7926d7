use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::PositionSeed;
use crate::error::MonitorError;
use crate::models::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Lifecycle stage of a position
///
/// `OpenBase -> OpenScaled -> Closed`, with `Closed` reachable from either
/// open stage and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    OpenBase,
    OpenScaled,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// SMA(8) < SMA(21) with RSI below the exit level
    TrendReversal,
}

/// Result of a partial profit exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialExit {
    pub price: f64,
    pub previous_entry: f64,
    pub exited_quantity: f64,
    pub remaining_quantity: f64,
    /// Profit on the exited quantity, never negative
    pub realized_profit: f64,
}

/// Transition applied to a position during a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionEvent {
    ScaledIn { from: f64, to: f64 },
    PartialExit(PartialExit),
    Closed { price: f64, reason: ExitReason },
}

/// Leveraged position in one symbol
///
/// Size and entry basis are private: quantity only changes through
/// [`Position::scale_in`] and [`Position::partial_exit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub symbol: String,
    pub leverage: u32,
    pub direction: Direction,
    pub opened_at: DateTime<Utc>,
    entry_price: f64,
    quantity: f64,
    status: PositionStatus,
    scaled_in: bool,
    exit_price: Option<f64>,
    closed_at: Option<DateTime<Utc>>,
    exit_reason: Option<ExitReason>,
}

impl Position {
    pub fn new(
        symbol: impl Into<String>,
        entry_price: f64,
        quantity: f64,
        leverage: u32,
        direction: Direction,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            leverage,
            direction,
            opened_at: Utc::now(),
            entry_price,
            quantity: quantity.max(0.0),
            status: PositionStatus::Open,
            scaled_in: false,
            exit_price: None,
            closed_at: None,
            exit_reason: None,
        }
    }

    pub fn from_seed(seed: &PositionSeed) -> Self {
        Self::new(
            seed.symbol.clone(),
            seed.entry_price,
            seed.quantity,
            seed.leverage,
            seed.direction,
        )
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn status(&self) -> PositionStatus {
        self.status
    }

    pub fn scaled_in(&self) -> bool {
        self.scaled_in
    }

    pub fn exit_price(&self) -> Option<f64> {
        self.exit_price
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit_reason
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    pub fn state(&self) -> PositionState {
        match (self.status, self.scaled_in) {
            (PositionStatus::Closed, _) => PositionState::Closed,
            (PositionStatus::Open, false) => PositionState::OpenBase,
            (PositionStatus::Open, true) => PositionState::OpenScaled,
        }
    }

    /// True when `price` is at or beyond the entry basis in the position's favour
    pub fn in_profit_at(&self, price: f64) -> bool {
        match self.direction {
            Direction::Buy => price >= self.entry_price,
            Direction::Sell => price <= self.entry_price,
        }
    }

    /// Unrealized P&L at `price` (leverage is not applied)
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Buy => (price - self.entry_price) * self.quantity,
            Direction::Sell => (self.entry_price - price) * self.quantity,
        }
    }

    /// Apply the 3x scale-in: keep the 1x stake and add 3x more
    ///
    /// No-op on a closed or already scaled position.
    pub fn scale_in(&mut self, factor: f64) -> Option<PositionEvent> {
        if !self.is_open() || self.scaled_in {
            return None;
        }

        let from = self.quantity;
        self.quantity *= factor;
        self.scaled_in = true;

        Some(PositionEvent::ScaledIn {
            from,
            to: self.quantity,
        })
    }

    /// Take profit on all but `retain` of the position and move the entry
    /// basis to `price`
    ///
    /// Requires an open, scaled position that is in profit at `price`. There
    /// is no once-only guard: every qualifying call shrinks the remainder again.
    pub fn partial_exit(&mut self, price: f64, retain: f64) -> Option<PartialExit> {
        if !self.is_open() || !self.scaled_in || !self.in_profit_at(price) {
            return None;
        }

        let previous_entry = self.entry_price;
        let remaining_quantity = self.quantity * retain;
        let exited_quantity = self.quantity - remaining_quantity;
        let per_unit = match self.direction {
            Direction::Buy => price - previous_entry,
            Direction::Sell => previous_entry - price,
        };

        self.quantity = remaining_quantity;
        self.entry_price = price;

        Some(PartialExit {
            price,
            previous_entry,
            exited_quantity,
            remaining_quantity,
            realized_profit: (per_unit * exited_quantity).max(0.0),
        })
    }

    /// Close the position; closing twice is a no-op
    pub fn close(&mut self, price: f64, reason: ExitReason) -> Option<PositionEvent> {
        if !self.is_open() {
            return None;
        }

        self.status = PositionStatus::Closed;
        self.exit_price = Some(price);
        self.closed_at = Some(Utc::now());
        self.exit_reason = Some(reason);

        Some(PositionEvent::Closed { price, reason })
    }
}

/// Owns the position table and applies the scale-in, partial-exit and close
/// transitions by symbol
#[derive(Debug, Clone)]
pub struct PositionManager {
    positions: Vec<Position>,
    scale_in_factor: f64,
    partial_exit_retain: f64,
}

impl Default for PositionManager {
    fn default() -> Self {
        Self::new(4.0, 0.2)
    }
}

impl PositionManager {
    pub fn new(scale_in_factor: f64, partial_exit_retain: f64) -> Self {
        Self {
            positions: Vec::new(),
            scale_in_factor,
            partial_exit_retain,
        }
    }

    /// Create PositionManager from start-up seeds
    pub fn with_seeds(
        scale_in_factor: f64,
        partial_exit_retain: f64,
        seeds: &[PositionSeed],
    ) -> anyhow::Result<Self> {
        let mut manager = Self::new(scale_in_factor, partial_exit_retain);
        for seed in seeds {
            manager.open_position(Position::from_seed(seed))?;
        }

        tracing::info!("Loaded {} positions", manager.positions.len());
        Ok(manager)
    }

    /// Add a position; a symbol can hold only one open position
    pub fn open_position(&mut self, position: Position) -> anyhow::Result<Uuid> {
        if self.has_open_position(&position.symbol) {
            anyhow::bail!("Already have open position for {}", position.symbol);
        }

        let id = position.id;
        self.positions.push(position);
        Ok(id)
    }

    pub fn all_positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn has_open_position(&self, symbol: &str) -> bool {
        self.positions
            .iter()
            .any(|p| p.symbol == symbol && p.is_open())
    }

    pub fn get_open_position(&self, symbol: &str) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.symbol == symbol && p.is_open())
    }

    /// Most recent position for a symbol, open or closed
    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.iter().rev().find(|p| p.symbol == symbol)
    }

    fn position_mut(&mut self, symbol: &str) -> Result<&mut Position, MonitorError> {
        self.positions
            .iter_mut()
            .rev()
            .find(|p| p.symbol == symbol)
            .ok_or_else(|| MonitorError::UnknownPosition(symbol.to_string()))
    }

    /// Symbols with an open position, in table order
    pub fn open_symbols(&self) -> Vec<String> {
        self.positions
            .iter()
            .filter(|p| p.is_open())
            .map(|p| p.symbol.clone())
            .collect()
    }

    pub fn open_positions(&self) -> Vec<&Position> {
        self.positions.iter().filter(|p| p.is_open()).collect()
    }

    pub fn scale_in(&mut self, symbol: &str) -> Result<Option<PositionEvent>, MonitorError> {
        let factor = self.scale_in_factor;
        let position = self.position_mut(symbol)?;
        let event = position.scale_in(factor);

        match &event {
            Some(PositionEvent::ScaledIn { to, .. }) => {
                tracing::info!("3x technique applied to {}. Quantity now: {:.2}", symbol, to);
            }
            _ => {
                tracing::debug!("Scale-in skipped for {} ({:?})", symbol, position.state());
            }
        }

        Ok(event)
    }

    pub fn partial_exit(
        &mut self,
        symbol: &str,
        current_price: f64,
    ) -> Result<Option<PartialExit>, MonitorError> {
        let retain = self.partial_exit_retain;
        let position = self.position_mut(symbol)?;
        let exit = position.partial_exit(current_price, retain);

        if let Some(exit) = &exit {
            tracing::info!(
                "Reversal on {}: exiting {:.0}% with profit ({:.4} @ ${:.4}, entry was ${:.4})",
                symbol,
                (1.0 - retain) * 100.0,
                exit.exited_quantity,
                exit.price,
                exit.previous_entry
            );
        }

        Ok(exit)
    }

    pub fn close_position(
        &mut self,
        symbol: &str,
        price: f64,
        reason: ExitReason,
    ) -> Result<Option<PositionEvent>, MonitorError> {
        let position = self.position_mut(symbol)?;
        let event = position.close(price, reason);

        if event.is_some() {
            tracing::info!("Closed {} @ ${:.4} ({:?})", symbol, price, reason);
        }

        Ok(event)
    }

    /// Unrealized P&L across open positions with a known price
    pub fn unrealized_pnl(&self, prices: &HashMap<String, f64>) -> f64 {
        self.positions
            .iter()
            .filter(|p| p.is_open())
            .filter_map(|p| prices.get(&p.symbol).map(|&price| p.unrealized_pnl(price)))
            .sum()
    }
}
