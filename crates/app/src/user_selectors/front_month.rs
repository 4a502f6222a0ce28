//! Front-month futures selection for the refresh binary.
//!
//! Keeps a fixed set of chains in the universe and narrows each chain to
//! its nearest listed contract within a window.
//!
//! Wiring:
//!   let model = front_month_model(&cfg.chains, cfg.refresh_interval, 90);
//!   manager.add_model(Box::new(model));

use std::sync::Arc;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal_macros::dec;
use standard_lib::securities::symbol_properties::{SymbolPropertiesDatabase, SymbolPropertiesEntry};
use standard_lib::securities::symbols::{Currency, Exchange, SecurityType, Symbol};
use standard_lib::universes::filter::{ContractFilter, FutureFilterUniverse};
use standard_lib::universes::future_selection::FutureUniverseSelectionModel;

/// Selector returning the same `chains` at every refresh.
pub fn static_chains(chains: &[Symbol]) -> impl Fn(DateTime<Utc>) -> Vec<Symbol> + Send + Sync + 'static {
    let chains = chains.to_vec();
    move |_utc| chains.clone()
}

/// Nearest contract expiring within `max_days`.
pub fn front_month_filter(max_days: i64) -> ContractFilter {
    Arc::new(move |u: FutureFilterUniverse| u.expiration(0, max_days).front_month())
}

pub fn front_month_model(chains: &[Symbol], refresh_interval: Duration, max_days: i64) -> FutureUniverseSelectionModel {
    FutureUniverseSelectionModel::new(refresh_interval, static_chains(chains))
        .with_filter(front_month_filter(max_days))
}

/// The next `count` monthly contracts of `chain` from the month of `from`,
/// dated on the first of each month.
pub fn monthly_listing(chain: &Symbol, from: NaiveDate, count: u32) -> Vec<Symbol> {
    let (mut year, mut month) = (from.year(), from.month());
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if let Some(expiry) = NaiveDate::from_ymd_opt(year, month, 1) {
            out.push(Symbol::future(chain.value(), chain.market, expiry));
        }
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }
    out
}

/// Contract specs for the chains the binary trades.
pub fn contract_specs() -> SymbolPropertiesDatabase {
    let mut db = SymbolPropertiesDatabase::new();
    let spec = |description: &str, multiplier, tick| SymbolPropertiesEntry {
        description: description.to_string(),
        quote_ccy: Some(Currency::USD),
        contract_multiplier: multiplier,
        tick_size: tick,
        lot_size: dec!(1),
        market_ticker: None,
    };
    db.insert(Exchange::NYMEX, Some("CL"), SecurityType::Future, spec("Crude Oil WTI", dec!(1000), dec!(0.01)));
    db.insert(Exchange::NYMEX, Some("NG"), SecurityType::Future, spec("Henry Hub Natural Gas", dec!(10000), dec!(0.001)));
    db.insert(Exchange::NYMEX, Some("RB"), SecurityType::Future, spec("RBOB Gasoline", dec!(42000), dec!(0.0001)));
    db.insert(Exchange::COMEX, Some("GC"), SecurityType::Future, spec("Gold", dec!(100), dec!(0.1)));
    db.insert(Exchange::CME, Some("ES"), SecurityType::Future, spec("E-mini S&P 500", dec!(50), dec!(0.25)));
    db.insert(Exchange::CME, Some("NQ"), SecurityType::Future, spec("E-mini Nasdaq-100", dec!(20), dec!(0.25)));
    db.insert(Exchange::CBOT, Some("ZN"), SecurityType::Future, spec("10-Year T-Note", dec!(1000), dec!(0.015625)));
    db
}
