use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use chrono_tz::Tz;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use crate::engine_core::public_classes::SubscriptionDataConfig;
use crate::market_data::base_data::Resolution;
use crate::securities::market_hours::MarketHours;
use crate::securities::symbols::{Currency, Exchange, Symbol};
use crate::universes::filter::{identity_filter, ContractFilter};

#[derive(Debug, Clone, PartialEq)]
pub struct PricingSpecs {
    pub tick_size: Decimal,
    pub value_per_tick: Decimal,
    pub lot_size: Decimal,
    pub contract_multiplier: Decimal,
    pub quote_ccy: Currency,
}

/// Static instrument facts (no runtime state).
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolProperties {
    /// Human description (e.g., "Crude Oil WTI")
    pub description: String,
    /// Pricing/tick/multiplier/quote currency
    pub pricing: PricingSpecs,
    /// Venue ticker when it differs from the symbol value
    pub market_ticker: Option<String>,
}

/// Handle that composes facts (props), calendar (hours), the data
/// subscription it was created with, and a little mutable state.
///
/// Securities live in the registry as `Arc<Security>` and are shared, so the
/// state selection touches on a reused instance (tradability, leverage,
/// contract filter) sits behind interior mutability.
pub struct Security {
    pub symbol: Symbol,
    pub exchange: Exchange,

    pub props: Arc<SymbolProperties>,
    pub hours: Arc<MarketHours>,
    pub data_time_zone: Tz,

    /// Data subscription registered for this security at construction.
    pub config: Arc<SubscriptionDataConfig>,

    tradable: AtomicBool,
    leverage: RwLock<Decimal>,
    filter: RwLock<ContractFilter>,
}

impl Security {
    /// New securities start tradable, at 1x leverage, with the identity filter.
    pub fn new(
        symbol: Symbol,
        props: SymbolProperties,
        hours: Arc<MarketHours>,
        data_time_zone: Tz,
        config: Arc<SubscriptionDataConfig>,
    ) -> Self {
        Self {
            exchange: symbol.market,
            symbol,
            props: Arc::new(props),
            hours,
            data_time_zone,
            config,
            tradable: AtomicBool::new(true),
            leverage: RwLock::new(Decimal::ONE),
            filter: RwLock::new(identity_filter()),
        }
    }

    /// Whether orders may target this security directly.
    #[inline] pub fn is_tradable(&self) -> bool { self.tradable.load(Ordering::Acquire) }
    #[inline] pub fn set_tradable(&self, tradable: bool) { self.tradable.store(tradable, Ordering::Release) }

    #[inline] pub fn leverage(&self) -> Decimal { *self.leverage.read() }
    #[inline] pub fn set_leverage(&self, leverage: Decimal) { *self.leverage.write() = leverage }

    /// Contract filter currently attached to this chain.
    #[inline] pub fn filter(&self) -> ContractFilter { self.filter.read().clone() }
    #[inline] pub fn set_filter(&self, filter: ContractFilter) { *self.filter.write() = filter }

    /// Convenience forwarders for frequently used facts
    #[inline] pub fn description(&self) -> &str { &self.props.description }
    #[inline] pub fn pricing(&self) -> &PricingSpecs { &self.props.pricing }
    #[inline] pub fn resolution(&self) -> Resolution { self.config.resolution }
    #[inline] pub fn fill_forward(&self) -> bool { self.config.fill_forward }
    #[inline] pub fn extended_market_hours(&self) -> bool { self.config.extended_market_hours }
}

impl fmt::Debug for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Security")
            .field("symbol", &self.symbol)
            .field("exchange", &self.exchange)
            .field("resolution", &self.config.resolution)
            .field("tradable", &self.is_tradable())
            .field("leverage", &self.leverage())
            .finish_non_exhaustive()
    }
}
