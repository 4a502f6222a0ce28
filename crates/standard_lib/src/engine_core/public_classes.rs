use chrono::Duration;
use chrono_tz::Tz;
use crate::market_data::base_data::Resolution;
use crate::securities::symbols::Symbol;

/// Engine execution mode.
///
/// - [`Live`] – wall clock, real-time data.
/// - [`Backtest`] – simulated clock driven by the host.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Copy)]
pub enum StrategyMode {
    /// Live trading or paper trading against a connected vendor.
    Live,

    /// Historical mode for backtesting or simulation.
    Backtest,
}

impl StrategyMode {
    #[inline]
    pub fn is_live(&self) -> bool { matches!(self, StrategyMode::Live) }
}

/// Data subscription registered for a security.
///
/// Two configs describe the same subscription when symbol and resolution
/// match; the subscription manager dedupes on that pair.
///
/// Fields:
/// - `symbol` – instrument (a canonical chain symbol for chain securities).
/// - `resolution` / `increment` – bar size and its wall-clock span.
/// - `data_time_zone` / `exchange_time_zone` – how raw data is stamped vs. where it trades.
/// - `fill_forward`, `extended_market_hours` – from the universe settings.
/// - `is_internal_feed`, `is_custom_data`, `is_filtered_subscription` – routing flags.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionDataConfig {
    pub symbol: Symbol,
    pub resolution: Resolution,
    pub increment: Option<Duration>,
    pub data_time_zone: Tz,
    pub exchange_time_zone: Tz,
    pub fill_forward: bool,
    pub extended_market_hours: bool,
    pub is_internal_feed: bool,
    pub is_custom_data: bool,
    pub is_filtered_subscription: bool,
}
