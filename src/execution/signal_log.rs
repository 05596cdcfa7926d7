use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::models::{IndicatorReading, SignalContext};

/// Append-only sink for generated signals
pub trait LogSink {
    fn record(&mut self, symbol: &str, indicators: &IndicatorReading, context: &SignalContext);
}

/// Writes signals through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn record(&mut self, symbol: &str, indicators: &IndicatorReading, context: &SignalContext) {
        tracing::info!(
            symbol = %symbol,
            rsi = ?indicators.rsi,
            allocation_usdt = context.allocation_usdt,
            "Signal generated"
        );
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignalRecord {
    pub symbol: String,
    pub indicators: IndicatorReading,
    pub context: SignalContext,
    pub recorded_at: DateTime<Utc>,
}

/// Keeps every record in memory; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    records: Arc<Mutex<Vec<SignalRecord>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SignalRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemoryLogSink {
    fn record(&mut self, symbol: &str, indicators: &IndicatorReading, context: &SignalContext) {
        if let Ok(mut records) = self.records.lock() {
            records.push(SignalRecord {
                symbol: symbol.to_string(),
                indicators: indicators.clone(),
                context: context.clone(),
                recorded_at: Utc::now(),
            });
        }
    }
}

impl<T: LogSink + ?Sized> LogSink for &mut T {
    fn record(&mut self, symbol: &str, indicators: &IndicatorReading, context: &SignalContext) {
        (**self).record(symbol, indicators, context)
    }
}
