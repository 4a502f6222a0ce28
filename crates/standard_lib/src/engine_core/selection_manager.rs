use chrono::{DateTime, Utc};
use crate::engine_core::engine_ctx::EngineCtx;
use crate::securities::symbols::Symbol;
use crate::universes::models::{SelectionDiff, UniverseManager, UniverseSelectionModel};

/// Drives universe selection models on the context clock.
///
/// # Responsibilities
/// - **Scheduling:** on each `step()`, every model whose
///   `next_refresh_time_utc` has passed runs one refresh. The model advances
///   its own schedule, so a failing refresh is not retried until its next
///   interval.
/// - **Universe bookkeeping:** emitted chain universes are added to a
///   [`UniverseManager`] keyed by chain symbol.
/// - **Contract selection:** `on_chain_contracts` feeds a chain's current
///   contract list through its filter and reports the membership diff.
///
/// # Typical loop
/// 1) `let mut sm = SelectionManager::new(ctx);`
/// 2) `sm.add_model(Box::new(model));`
/// 3) Drive: `loop { sm.step(); /* advance clock */ }`
pub struct SelectionManager {
    ctx: EngineCtx,
    models: Vec<Box<dyn UniverseSelectionModel>>,
    universes: UniverseManager,
}

impl SelectionManager {
    pub fn new(ctx: EngineCtx) -> Self {
        Self { ctx, models: Vec::new(), universes: UniverseManager::new() }
    }

    pub fn add_model(&mut self, model: Box<dyn UniverseSelectionModel>) {
        self.models.push(model);
    }

    #[inline] pub fn ctx(&self) -> &EngineCtx { &self.ctx }
    #[inline] pub fn universes(&self) -> &UniverseManager { &self.universes }

    /// Returns `true` if a model is due to run at `now`.
    #[inline]
    fn due(model: &dyn UniverseSelectionModel, now: DateTime<Utc>) -> bool {
        now >= model.next_refresh_time_utc()
    }

    /// Run every due model once at the context's current time.
    ///
    /// Returns how many universes were emitted. A failing refresh is logged
    /// and skipped; universes it produced before the failure are kept.
    pub fn step(&mut self) -> usize {
        let now = self.ctx.now();
        let mut emitted = 0;
        for (idx, model) in self.models.iter_mut().enumerate() {
            if !Self::due(model.as_ref(), now) {
                continue;
            }
            let sel = self.ctx.selection_context_at(now);
            let mut failure = None;
            for result in model.create_universes(&sel) {
                match result {
                    Ok(universe) => {
                        let chain = universe.symbol().clone();
                        if self.universes.add(universe) {
                            tracing::info!(model=idx, chain=%chain, "chain universe added");
                        }
                        emitted += 1;
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            if let Some(e) = failure {
                tracing::error!(model=idx, error=%e, next_refresh=%model.next_refresh_time_utc(), "universe refresh failed");
            }
        }
        emitted
    }

    /// Re-run `chain`'s contract filter over its currently listed
    /// `contracts`; `None` if the chain is not active.
    pub fn on_chain_contracts(&mut self, chain: &Symbol, contracts: &[Symbol]) -> Option<SelectionDiff> {
        let now = self.ctx.now();
        let diff = self.universes.run_selection(chain, now, contracts)?;
        if !diff.is_empty() {
            tracing::info!(chain=%chain, added=diff.added.len(), removed=diff.removed.len(), "contract selection changed");
        }
        Some(diff)
    }
}
