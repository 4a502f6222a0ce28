//! Contract filter hook for futures chains.
//!
//! A chain security carries one [`ContractFilter`]. When the chain's
//! contract list is refreshed, the filter receives every live contract in a
//! [`FutureFilterUniverse`] and returns a narrowed one of the same shape. The
//! filter never changes which chain it belongs to.
//!
//! ```ignore
//! let filter: ContractFilter = Arc::new(|u: FutureFilterUniverse| u.expiration(0, 90).front_month());
//! model.set_filter(filter);
//! ```

use std::sync::Arc;
use chrono::{Duration, NaiveDate};
use crate::securities::symbols::Symbol;

/// Replaceable chain filter: `(contracts) -> narrowed contracts`.
pub type ContractFilter = Arc<dyn Fn(FutureFilterUniverse) -> FutureFilterUniverse + Send + Sync>;

/// The default filter: selects every contract unchanged.
pub fn identity_filter() -> ContractFilter {
    Arc::new(|universe| universe)
}

/// Candidate contracts of one chain, as seen on an exchange-local date.
///
/// Contracts are kept ordered by expiry (then value), so "front" and "back"
/// are positional.
#[derive(Debug, Clone, PartialEq)]
pub struct FutureFilterUniverse {
    contracts: Vec<Symbol>,
    local_date: NaiveDate,
    only_at_market_open: bool,
}

impl FutureFilterUniverse {
    pub fn new(contracts: impl IntoIterator<Item = Symbol>, local_date: NaiveDate) -> Self {
        let mut contracts: Vec<Symbol> = contracts.into_iter().collect();
        contracts.sort_by(|a, b| a.expiry.cmp(&b.expiry).then_with(|| a.id.cmp(&b.id)));
        contracts.dedup();
        Self { contracts, local_date, only_at_market_open: false }
    }

    #[inline] pub fn local_date(&self) -> NaiveDate { self.local_date }
    #[inline] pub fn symbols(&self) -> &[Symbol] { &self.contracts }
    #[inline] pub fn len(&self) -> usize { self.contracts.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.contracts.is_empty() }
    #[inline] pub fn is_only_at_market_open(&self) -> bool { self.only_at_market_open }

    pub fn into_symbols(self) -> Vec<Symbol> { self.contracts }

    /// Keep contracts expiring between `min_days` and `max_days` (inclusive)
    /// from the local date.
    /// Offsets past the calendar range saturate at the far end.
    pub fn expiration(mut self, min_days: i64, max_days: i64) -> Self {
        let lo = offset_date(self.local_date, min_days);
        let hi = offset_date(self.local_date, max_days);
        self.contracts.retain(|s| matches!(s.expiry, Some(e) if e >= lo && e <= hi));
        self
    }

    /// Keep only the contracts sharing the nearest expiry.
    pub fn front_month(mut self) -> Self {
        if let Some(front) = self.contracts.first().and_then(|s| s.expiry) {
            self.contracts.retain(|s| s.expiry == Some(front));
        }
        self
    }

    /// Drop the contracts sharing the nearest expiry.
    pub fn back_months(mut self) -> Self {
        if let Some(front) = self.contracts.first().and_then(|s| s.expiry) {
            self.contracts.retain(|s| s.expiry != Some(front));
        }
        self
    }

    /// Keep contracts matching `keep`.
    pub fn contracts<F>(mut self, keep: F) -> Self
    where
        F: Fn(&Symbol) -> bool,
    {
        self.contracts.retain(|s| keep(s));
        self
    }

    /// Ask the chain to re-run selection only while the exchange is open;
    /// outside trading hours the previous selection is kept.
    pub fn only_apply_filter_at_market_open(mut self) -> Self {
        self.only_at_market_open = true;
        self
    }
}

fn offset_date(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|d| date.checked_add_signed(d))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}
