use std::sync::Arc;
use rust_decimal::Decimal;
use thiserror::Error;
use crate::engine_core::public_classes::SubscriptionDataConfig;
use crate::market_data::base_data::Resolution;
use crate::securities::initializer::SecurityInitializer;
use crate::securities::market_hours::MarketHoursEntry;
use crate::securities::security::{Security, SymbolProperties};
use crate::securities::symbols::{Currency, Exchange, SecurityType, Symbol};

/// Lookup failures of the metadata services.
///
/// A chain cannot be built without both exchange hours and symbol
/// properties, so callers treat either miss as fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetadataError {
    #[error("no market hours entry for {symbol} on {market} ({security_type})")]
    UnknownMarketHours { market: Exchange, symbol: Symbol, security_type: SecurityType },
    #[error("no symbol properties for {symbol} on {market} ({security_type})")]
    UnknownSymbolProperties { market: Exchange, symbol: Symbol, security_type: SecurityType },
}

/// ========================================================
/// Metadata services
/// ========================================================
///
/// Static facts needed to construct a security:
/// - **Exchange hours** and the data time zone, keyed by market/symbol/kind.
/// - **Symbol properties** (tick size, multiplier, lot size, quote
///   currency), keyed the same way. The account currency is the fallback
///   quote currency.
pub trait MarketHoursProvider: Send + Sync {
    fn entry(&self, market: Exchange, symbol: &Symbol, security_type: SecurityType) -> Result<MarketHoursEntry, MetadataError>;
}

pub trait SymbolPropertiesProvider: Send + Sync {
    fn symbol_properties(
        &self,
        market: Exchange,
        symbol: &Symbol,
        security_type: SecurityType,
        account_currency: Currency,
    ) -> Result<SymbolProperties, MetadataError>;
}

/// Narrow view of the engine's security registry used by universe
/// selection: identity lookup and insert-if-absent. Nothing here removes
/// or replaces an entry.
pub trait SecurityStore: Send + Sync {
    fn lookup(&self, symbol: &Symbol) -> Option<Arc<Security>>;
    /// Store `security` unless its symbol is present; returns the stored entry.
    fn insert(&self, security: Security) -> Arc<Security>;
}

/// Registry of data subscriptions. Adding an equivalent config returns the
/// one already registered.
pub trait SubscriptionManager: Send + Sync {
    fn add(&self, config: SubscriptionDataConfig) -> Arc<SubscriptionDataConfig>;
    fn configs_for(&self, symbol: &Symbol) -> Vec<Arc<SubscriptionDataConfig>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Everything the construction service needs for one new security.
#[derive(Clone)]
pub struct SecurityRequest {
    pub symbol: Symbol,
    pub hours: MarketHoursEntry,
    pub properties: SymbolProperties,
    pub initializer: Arc<dyn SecurityInitializer>,
    pub resolution: Resolution,
    pub fill_forward: bool,
    /// `None` keeps whatever the initializer chose.
    pub leverage: Option<Decimal>,
    pub extended_market_hours: bool,
    pub is_internal_feed: bool,
    pub is_custom_data: bool,
    pub is_live_mode: bool,
    pub is_filtered_subscription: bool,
}

/// ========================================================
/// SecurityService
/// ========================================================
///
/// Builds a [`Security`] from metadata and settings:
/// 1. register its data subscription with the subscription manager,
/// 2. assemble the security,
/// 3. run the initializer, then apply explicit leverage.
///
/// The service does not touch the registry; callers insert the result.
pub trait SecurityService: Send + Sync {
    fn create_security(
        &self,
        request: SecurityRequest,
        subscriptions: &dyn SubscriptionManager,
    ) -> anyhow::Result<Security>;
}
