// Position lifecycle, market data plumbing and the monitor pass
pub mod candle_buffer;
pub mod market_data;
pub mod monitor;
pub mod portfolio;
pub mod position_manager;
pub mod price_feed;
pub mod signal_log;

pub use candle_buffer::CandleBuffer;
pub use market_data::MarketDataSource;
pub use monitor::{Monitor, PassReport, SymbolReport};
pub use portfolio::PortfolioStore;
pub use position_manager::{
    ExitReason, PartialExit, Position, PositionEvent, PositionManager, PositionState,
    PositionStatus,
};
pub use price_feed::MarketFeed;
pub use signal_log::{LogSink, MemoryLogSink, SignalRecord, TracingLogSink};
