use serde::Serialize;
use std::collections::HashMap;

use crate::config::Settings;
use crate::error::MonitorError;
use crate::execution::{
    ExitReason, LogSink, MarketDataSource, PartialExit, PortfolioStore, PositionEvent,
};
use crate::indicators::calculate_rsi;
use crate::models::{IndicatorReading, SignalContext, Timeframe};
use crate::risk::{LiquidationRiskController, RiskAdjustment, RiskEstimator};
use crate::strategy::SignalDetector;

/// What happened to one symbol during a pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub price: Option<f64>,
    pub events: Vec<PositionEvent>,
    /// Set when evaluation stopped early; events applied before that are kept
    pub skipped: Option<String>,
}

impl SymbolReport {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: None,
            events: Vec::new(),
            skipped: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassReport {
    pub symbols: Vec<SymbolReport>,
    pub risk_adjustment: Option<RiskAdjustment>,
}

impl PassReport {
    /// Current prices observed during the pass
    pub fn prices(&self) -> HashMap<String, f64> {
        self.symbols
            .iter()
            .filter_map(|s| s.price.map(|price| (s.symbol.clone(), price)))
            .collect()
    }

    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }
}

/// Runs one evaluation pass over every open position, then the liquidation
/// risk check
pub struct Monitor<R, L> {
    detector: SignalDetector,
    risk_controller: LiquidationRiskController,
    risk_estimator: R,
    sink: L,
    partial_exit_allocation_usdt: f64,
}

impl<R: RiskEstimator, L: LogSink> Monitor<R, L> {
    pub fn new(
        detector: SignalDetector,
        risk_controller: LiquidationRiskController,
        risk_estimator: R,
        sink: L,
    ) -> Self {
        Self {
            detector,
            risk_controller,
            risk_estimator,
            sink,
            partial_exit_allocation_usdt: 8.0,
        }
    }

    pub fn from_settings(settings: &Settings, risk_estimator: R, sink: L) -> Self {
        Self::new(
            SignalDetector::new(settings.signals.clone()),
            LiquidationRiskController::from_config(&settings.risk),
            risk_estimator,
            sink,
        )
        .with_partial_exit_allocation(settings.monitor.partial_exit_allocation_usdt)
    }

    pub fn with_partial_exit_allocation(mut self, allocation_usdt: f64) -> Self {
        self.partial_exit_allocation_usdt = allocation_usdt;
        self
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }

    /// Evaluate every open position once, then manage liquidation risk once
    ///
    /// A symbol that fails (short data, unknown position) is skipped for this
    /// pass; the remaining symbols and the risk step still run.
    pub fn run_pass<S: MarketDataSource + ?Sized>(
        &mut self,
        source: &S,
        store: &mut PortfolioStore,
    ) -> PassReport {
        let mut report = PassReport::default();

        for symbol in store.positions.open_symbols() {
            let mut symbol_report = SymbolReport::new(&symbol);

            if let Err(e) = self.evaluate_symbol(source, store, &symbol, &mut symbol_report) {
                if e.is_data_insufficient() {
                    tracing::warn!("  {} - skipping this tick: {}", symbol, e);
                } else {
                    tracing::error!("  {} - evaluation failed: {}", symbol, e);
                }
                symbol_report.skipped = Some(e.to_string());
            }

            report.symbols.push(symbol_report);
        }

        report.risk_adjustment = self.manage_liquidation_risk(store);
        report
    }

    fn evaluate_symbol<S: MarketDataSource + ?Sized>(
        &mut self,
        source: &S,
        store: &mut PortfolioStore,
        symbol: &str,
        report: &mut SymbolReport,
    ) -> Result<(), MonitorError> {
        let current_price = source
            .last_close(symbol, Timeframe::OneHour)
            .ok_or_else(|| MonitorError::insufficient(symbol, Timeframe::OneHour, 1, 0))?;
        report.price = Some(current_price);

        tracing::info!("  {} @ ${:.4}", symbol, current_price);

        let scaled_in = store
            .positions
            .get_open_position(symbol)
            .ok_or_else(|| MonitorError::UnknownPosition(symbol.to_string()))?
            .scaled_in();

        if !scaled_in
            && self.detector.detect_stabilization(source, symbol)?
            && self.detector.trigger_strength(source, symbol)?
        {
            if let Some(event) = store.positions.scale_in(symbol)? {
                report.events.push(event);
            }
        }

        let scaled_in = store
            .positions
            .get_open_position(symbol)
            .is_some_and(|p| p.scaled_in());

        if scaled_in {
            if let Some(exit) = self.manage_partial_exit(store, symbol, current_price)? {
                report.events.push(PositionEvent::PartialExit(exit));
            }
            if let Some(event) =
                self.exit_if_trend_reverses(source, store, symbol, current_price)?
            {
                report.events.push(event);
            }
        }

        Ok(())
    }

    /// Take profit on a scaled position that is at or past its entry basis
    ///
    /// Realized profit is credited to the ledger and the exit is logged with
    /// the RSI of the current price taken alone, which is always undefined.
    pub fn manage_partial_exit(
        &mut self,
        store: &mut PortfolioStore,
        symbol: &str,
        current_price: f64,
    ) -> Result<Option<PartialExit>, MonitorError> {
        let Some(exit) = store.positions.partial_exit(symbol, current_price)? else {
            return Ok(None);
        };

        store.ledger.credit(symbol, exit.realized_profit);

        let instant_rsi = calculate_rsi(&[current_price], self.detector.config().rsi_period);
        self.sink.record(
            symbol,
            &IndicatorReading::new(instant_rsi),
            &SignalContext {
                allocation_usdt: self.partial_exit_allocation_usdt,
            },
        );

        Ok(Some(exit))
    }

    /// Close the position when the 1h trend has lost strength
    pub fn exit_if_trend_reverses<S: MarketDataSource + ?Sized>(
        &mut self,
        source: &S,
        store: &mut PortfolioStore,
        symbol: &str,
        current_price: f64,
    ) -> Result<Option<PositionEvent>, MonitorError> {
        if store.positions.get_open_position(symbol).is_none() {
            return Ok(None);
        }

        let reading = self.detector.read_trend(source, symbol)?;
        if !reading.signals_exit(self.detector.config().exit_rsi) {
            return Ok(None);
        }

        tracing::info!(
            "Trend lost strength on {} (SMA {:.4} < {:.4}, RSI {:.2}). Closing.",
            symbol,
            reading.sma_fast,
            reading.sma_slow,
            reading.rsi.unwrap_or(f64::NAN)
        );

        store
            .positions
            .close_position(symbol, current_price, ExitReason::TrendReversal)
    }

    /// Sample the risk estimator and trim recorded profit if needed
    pub fn manage_liquidation_risk(
        &mut self,
        store: &mut PortfolioStore,
    ) -> Option<RiskAdjustment> {
        let risk = self.risk_estimator.estimate();

        match self
            .risk_controller
            .apply(risk, &mut store.ledger, &store.account)
        {
            Ok(adjustment) => adjustment,
            Err(e) => {
                tracing::error!("Liquidation risk check failed: {}", e);
                None
            }
        }
    }
}
