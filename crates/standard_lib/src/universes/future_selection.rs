//! Periodic futures-chain universe selection.
//!
//! [`FutureUniverseSelectionModel`] is driven by the host loop. Whenever the
//! host decides a refresh is due (`now >= next_refresh_time_utc()`), it calls
//! [`FutureUniverseSelectionModel::create_universes`], which
//!
//! 1. stamps the next refresh time (`now + interval`) before any other work,
//! 2. asks the selector for the root symbols of interest,
//! 3. lazily resolves one [`FuturesChainUniverse`] per distinct symbol as the
//!    returned iterator is pulled.
//!
//! Chain securities are created once per canonical symbol and reused from
//! the registry on every later refresh. The current contract filter is
//! attached on every resolution and the chain is always left non-tradable.

use std::iter::FusedIterator;
use std::sync::Arc;
use ahash::AHashSet;
use chrono::{DateTime, Duration, Utc};
use crate::engine_core::api_traits::SecurityRequest;
use crate::engine_core::selection_context::SelectionContext;
use crate::securities::initializer::SecurityInitializer;
use crate::securities::symbols::{SecurityType, Symbol};
use crate::universes::errors::SelectionError;
use crate::universes::filter::{identity_filter, ContractFilter};
use crate::universes::futures_chain::FuturesChainUniverse;
use crate::universes::settings::UniverseSettings;

/// Caller-supplied selector: root symbols of interest at a point in time.
pub type SymbolSelector = Box<dyn Fn(DateTime<Utc>) -> Vec<Symbol> + Send + Sync>;

pub struct FutureUniverseSelectionModel {
    refresh_interval: Duration,
    next_refresh_time_utc: DateTime<Utc>,
    selector: SymbolSelector,
    universe_settings: Option<UniverseSettings>,
    security_initializer: Option<Arc<dyn SecurityInitializer>>,
    filter: ContractFilter,
}

impl FutureUniverseSelectionModel {
    /// The first refresh is due immediately.
    pub fn new<F>(refresh_interval: Duration, selector: F) -> Self
    where
        F: Fn(DateTime<Utc>) -> Vec<Symbol> + Send + Sync + 'static,
    {
        Self {
            refresh_interval,
            next_refresh_time_utc: DateTime::<Utc>::MIN_UTC,
            selector: Box::new(selector),
            universe_settings: None,
            security_initializer: None,
            filter: identity_filter(),
        }
    }

    /// Pin the settings instead of following the engine defaults.
    pub fn with_universe_settings(mut self, settings: UniverseSettings) -> Self {
        self.universe_settings = Some(settings);
        self
    }

    /// Pin the initializer instead of following the engine default.
    pub fn with_security_initializer(mut self, initializer: Arc<dyn SecurityInitializer>) -> Self {
        self.security_initializer = Some(initializer);
        self
    }

    pub fn with_filter(mut self, filter: ContractFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the contract filter. Takes effect on the next resolution,
    /// including chains that already exist.
    pub fn set_filter(&mut self, filter: ContractFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> ContractFilter {
        self.filter.clone()
    }

    #[inline] pub fn refresh_interval(&self) -> Duration { self.refresh_interval }

    #[inline] pub fn next_refresh_time_utc(&self) -> DateTime<Utc> { self.next_refresh_time_utc }

    /// Run one refresh at `ctx.utc_time`.
    ///
    /// The schedule advances and the selector runs when this is called.
    /// Chain resolution happens as the iterator is pulled; the first error
    /// ends the iteration.
    pub fn create_universes<'a>(&'a mut self, ctx: &'a SelectionContext) -> CreateUniverses<'a> {
        let now = ctx.utc_time;
        self.next_refresh_time_utc = now
            .checked_add_signed(self.refresh_interval)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let symbols = (self.selector)(now);
        tracing::debug!(utc_time=%now, selected=symbols.len(), next_refresh=%self.next_refresh_time_utc, "refreshing universes");

        CreateUniverses {
            model: self,
            ctx,
            symbols: symbols.into_iter(),
            seen: AHashSet::new(),
            done: false,
        }
    }

    /// Resolve the chain universe for `symbol`, creating the chain security
    /// on first use.
    pub fn create_future_chain(&self, ctx: &SelectionContext, symbol: &Symbol) -> Result<FuturesChainUniverse, SelectionError> {
        ensure_future(symbol)?;

        let canonical = if symbol.is_canonical() { symbol.clone() } else { symbol.to_canonical() };
        let market = canonical.market;
        tracing::debug!(symbol=%symbol, chain=%canonical, market=?market, "creating future chain");

        let settings = self
            .universe_settings
            .clone()
            .unwrap_or_else(|| ctx.defaults.universe_settings.clone());
        let initializer = self
            .security_initializer
            .clone()
            .unwrap_or_else(|| ctx.defaults.security_initializer.clone());

        let security = match ctx.registry.lookup(&canonical) {
            Some(existing) => {
                tracing::debug!(chain=%canonical, "resolved existing future chain security");
                existing
            }
            None => {
                tracing::info!(chain=%canonical, resolution=%settings.resolution, "creating future chain security");
                let hours = ctx.market_hours.entry(market, &canonical, canonical.security_type)?;
                let properties = ctx.symbol_properties.symbol_properties(
                    market,
                    &canonical,
                    canonical.security_type,
                    ctx.account_currency,
                )?;

                let request = SecurityRequest {
                    symbol: canonical.clone(),
                    hours,
                    properties,
                    initializer: initializer.clone(),
                    resolution: settings.resolution,
                    fill_forward: settings.fill_forward,
                    leverage: settings.leverage,
                    extended_market_hours: settings.extended_market_hours,
                    is_internal_feed: false,
                    is_custom_data: false,
                    is_live_mode: ctx.live_mode,
                    is_filtered_subscription: false,
                };
                let created = ctx
                    .security_service
                    .create_security(request, ctx.subscription_manager.as_ref())
                    .map_err(SelectionError::Engine)?;
                ctx.registry.insert(created)
            }
        };

        security.set_filter(self.filter.clone());
        security.set_tradable(false);

        Ok(FuturesChainUniverse::new(security, settings, ctx.subscription_manager.clone(), initializer))
    }
}

fn ensure_future(symbol: &Symbol) -> Result<(), SelectionError> {
    if symbol.security_type != SecurityType::Future {
        return Err(SelectionError::InvalidSymbolKind {
            symbol: symbol.clone(),
            expected: SecurityType::Future,
            actual: symbol.security_type,
        });
    }
    Ok(())
}

/// Lazy, single-pass sequence of chain universes from one refresh.
///
/// Symbols are taken in selector order; an exact repeat is skipped. A symbol
/// of the wrong kind or a failed resolution yields one `Err` and ends the
/// sequence.
pub struct CreateUniverses<'a> {
    model: &'a FutureUniverseSelectionModel,
    ctx: &'a SelectionContext,
    symbols: std::vec::IntoIter<Symbol>,
    seen: AHashSet<Symbol>,
    done: bool,
}

impl Iterator for CreateUniverses<'_> {
    type Item = Result<FuturesChainUniverse, SelectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let symbol = self.symbols.next()?;
            if let Err(e) = ensure_future(&symbol) {
                self.done = true;
                return Some(Err(e));
            }
            if !self.seen.insert(symbol.clone()) {
                tracing::trace!(symbol=%symbol, "duplicate symbol skipped");
                continue;
            }
            let out = self.model.create_future_chain(self.ctx, &symbol);
            if let Err(e) = &out {
                tracing::warn!(symbol=%symbol, error=%e, "futures universe refresh aborted");
                self.done = true;
            }
            return Some(out);
        }
    }
}

impl FusedIterator for CreateUniverses<'_> {}
