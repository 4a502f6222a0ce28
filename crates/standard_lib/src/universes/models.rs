use std::collections::BTreeMap;
use ahash::AHashSet;
use chrono::{DateTime, Utc};
use crate::engine_core::selection_context::SelectionContext;
use crate::securities::symbols::Symbol;
use crate::universes::errors::SelectionError;
use crate::universes::future_selection::FutureUniverseSelectionModel;
use crate::universes::futures_chain::FuturesChainUniverse;

/// A scheduled source of chain universes, driven by the selection manager.
pub trait UniverseSelectionModel: Send + Sync {
    /// Earliest time the next refresh should run.
    fn next_refresh_time_utc(&self) -> DateTime<Utc>;

    /// Run one refresh; the schedule advances even if the sequence fails.
    fn create_universes<'a>(
        &'a mut self,
        ctx: &'a SelectionContext,
    ) -> Box<dyn Iterator<Item = Result<FuturesChainUniverse, SelectionError>> + 'a>;
}

impl UniverseSelectionModel for FutureUniverseSelectionModel {
    fn next_refresh_time_utc(&self) -> DateTime<Utc> {
        FutureUniverseSelectionModel::next_refresh_time_utc(self)
    }

    fn create_universes<'a>(
        &'a mut self,
        ctx: &'a SelectionContext,
    ) -> Box<dyn Iterator<Item = Result<FuturesChainUniverse, SelectionError>> + 'a> {
        Box::new(FutureUniverseSelectionModel::create_universes(self, ctx))
    }
}

/// Contract membership change of one chain between two selections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionDiff {
    pub added: Vec<Symbol>,
    pub removed: Vec<Symbol>,
}

impl SelectionDiff {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

struct UniverseHandle {
    universe: FuturesChainUniverse,
    last: AHashSet<Symbol>,
}

impl UniverseHandle {
    fn run_selection(&mut self, utc_time: DateTime<Utc>, available: &[Symbol]) -> SelectionDiff {
        let Some(selected) = self.universe.select_symbols(utc_time, available) else {
            return SelectionDiff::default();
        };
        let next: AHashSet<Symbol> = selected.into_iter().collect();

        let mut added: Vec<Symbol> = next.difference(&self.last).cloned().collect();
        let mut removed: Vec<Symbol> = self.last.difference(&next).cloned().collect();
        added.sort();
        removed.sort();

        self.last = next;
        SelectionDiff { added, removed }
    }
}

/// Active chain universes keyed by canonical chain symbol.
///
/// Re-emitting a chain replaces its universe (settings may have changed) but
/// keeps the last contract selection, so diffs continue across refreshes.
#[derive(Default)]
pub struct UniverseManager {
    universes: BTreeMap<Symbol, UniverseHandle>,
}

impl UniverseManager {
    pub fn new() -> Self { Self::default() }

    /// Returns `true` when the chain was not active before.
    pub fn add(&mut self, universe: FuturesChainUniverse) -> bool {
        let key = universe.symbol().clone();
        match self.universes.get_mut(&key) {
            Some(handle) => {
                handle.universe = universe;
                false
            }
            None => {
                self.universes.insert(key, UniverseHandle { universe, last: AHashSet::new() });
                true
            }
        }
    }

    pub fn get(&self, chain: &Symbol) -> Option<&FuturesChainUniverse> {
        self.universes.get(chain).map(|h| &h.universe)
    }

    pub fn contains(&self, chain: &Symbol) -> bool {
        self.universes.contains_key(chain)
    }

    /// Active chain symbols in order.
    pub fn chains(&self) -> impl Iterator<Item = &Symbol> {
        self.universes.keys()
    }

    /// Contracts currently selected for `chain`.
    pub fn selected(&self, chain: &Symbol) -> Vec<Symbol> {
        let mut out: Vec<Symbol> = self
            .universes
            .get(chain)
            .map(|h| h.last.iter().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Re-run `chain`'s filter over `available` contracts; `None` if the
    /// chain is not active.
    pub fn run_selection(&mut self, chain: &Symbol, utc_time: DateTime<Utc>, available: &[Symbol]) -> Option<SelectionDiff> {
        self.universes
            .get_mut(chain)
            .map(|h| h.run_selection(utc_time, available))
    }

    pub fn len(&self) -> usize { self.universes.len() }
    pub fn is_empty(&self) -> bool { self.universes.is_empty() }
}
