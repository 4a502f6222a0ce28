use ahash::AHashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::engine_core::api_traits::{MetadataError, SymbolPropertiesProvider};
use crate::securities::market_hours::MetadataKey;
use crate::securities::security::{PricingSpecs, SymbolProperties};
use crate::securities::symbols::{Currency, Exchange, SecurityType, Symbol};

/// One row of the symbol properties database.
///
/// `quote_ccy = None` means "quoted in the account currency".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPropertiesEntry {
    pub description: String,
    pub quote_ccy: Option<Currency>,
    pub contract_multiplier: Decimal,
    pub tick_size: Decimal,
    pub lot_size: Decimal,
    pub market_ticker: Option<String>,
}

impl SymbolPropertiesEntry {
    fn resolve(&self, account_currency: Currency) -> SymbolProperties {
        SymbolProperties {
            description: self.description.clone(),
            pricing: PricingSpecs {
                tick_size: self.tick_size,
                value_per_tick: (self.tick_size * self.contract_multiplier).normalize(),
                lot_size: self.lot_size,
                contract_multiplier: self.contract_multiplier,
                quote_ccy: self.quote_ccy.unwrap_or(account_currency),
            },
            market_ticker: self.market_ticker.clone(),
        }
    }
}

/// In-memory symbol properties database with the same exact-then-wildcard
/// lookup as [`MarketHoursDatabase`](crate::securities::market_hours::MarketHoursDatabase).
#[derive(Debug, Default, Clone)]
pub struct SymbolPropertiesDatabase {
    entries: AHashMap<MetadataKey, SymbolPropertiesEntry>,
}

impl SymbolPropertiesDatabase {
    pub fn new() -> Self { Self::default() }

    /// Register an entry; `root = None` registers the market-wide wildcard.
    pub fn insert(&mut self, market: Exchange, root: Option<&str>, security_type: SecurityType, entry: SymbolPropertiesEntry) {
        let key = MetadataKey { market, root: root.map(|r| r.to_ascii_uppercase()), security_type };
        self.entries.insert(key, entry);
    }

    pub fn get_entry(&self, market: Exchange, symbol: &Symbol, security_type: SecurityType) -> Option<&SymbolPropertiesEntry> {
        let key = MetadataKey::exact(market, symbol, security_type);
        self.entries.get(&key).or_else(|| self.entries.get(&key.wildcard()))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl SymbolPropertiesProvider for SymbolPropertiesDatabase {
    fn symbol_properties(
        &self,
        market: Exchange,
        symbol: &Symbol,
        security_type: SecurityType,
        account_currency: Currency,
    ) -> Result<SymbolProperties, MetadataError> {
        self.get_entry(market, symbol, security_type)
            .map(|e| e.resolve(account_currency))
            .ok_or_else(|| MetadataError::UnknownSymbolProperties { market, symbol: symbol.clone(), security_type })
    }
}
