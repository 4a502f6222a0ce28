use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use crate::engine_core::api_traits::{MetadataError, SecurityRequest, SecurityService, SubscriptionManager};
use crate::engine_core::engine_ctx::EngineCtx;
use crate::engine_core::security_service::DefaultSecurityService;
use crate::engine_core::selection_context::SelectionContext;
use crate::market_data::base_data::Resolution;
use crate::securities::initializer::initializer_fn;
use crate::securities::market_hours::MarketHoursDatabase;
use crate::securities::security::Security;
use crate::securities::symbol_properties::{SymbolPropertiesDatabase, SymbolPropertiesEntry};
use crate::securities::symbols::{Currency, Exchange, SecurityType, Symbol};
use crate::universes::errors::SelectionError;
use crate::universes::filter::{ContractFilter, FutureFilterUniverse};
use crate::universes::future_selection::FutureUniverseSelectionModel;
use crate::universes::futures_chain::FuturesChainUniverse;
use crate::universes::models::UniverseManager;
use crate::universes::settings::UniverseSettings;

/// Monday 2024-01-08 09:00 CT; NYMEX is open.
fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn cl_chain() -> Symbol {
    Symbol::create_canonical("CL", SecurityType::Future, Exchange::NYMEX)
}

fn es_chain() -> Symbol {
    Symbol::create_canonical("ES", SecurityType::Future, Exchange::CME)
}

fn cl(y: i32, m: u32) -> Symbol {
    Symbol::future("CL", Exchange::NYMEX, ymd(y, m, 1))
}

fn props_db() -> SymbolPropertiesDatabase {
    let mut db = SymbolPropertiesDatabase::new();
    db.insert(Exchange::NYMEX, None, SecurityType::Future, SymbolPropertiesEntry {
        description: "NYMEX future".into(),
        quote_ccy: Some(Currency::USD),
        contract_multiplier: dec!(1000),
        tick_size: dec!(0.01),
        lot_size: dec!(1),
        market_ticker: None,
    });
    db.insert(Exchange::CME, Some("ES"), SecurityType::Future, SymbolPropertiesEntry {
        description: "E-mini S&P 500".into(),
        quote_ccy: None,
        contract_multiplier: dec!(50),
        tick_size: dec!(0.25),
        lot_size: dec!(1),
        market_ticker: None,
    });
    db
}

#[derive(Default)]
struct CountingService {
    inner: DefaultSecurityService,
    calls: AtomicUsize,
}

impl CountingService {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SecurityService for CountingService {
    fn create_security(&self, request: SecurityRequest, subscriptions: &dyn SubscriptionManager) -> anyhow::Result<Security> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_security(request, subscriptions)
    }
}

struct FailingService;

impl SecurityService for FailingService {
    fn create_security(&self, _request: SecurityRequest, _subscriptions: &dyn SubscriptionManager) -> anyhow::Result<Security> {
        Err(anyhow::anyhow!("construction backend unavailable"))
    }
}

struct Fixture {
    engine: EngineCtx,
    service: Arc<CountingService>,
}

fn fixture() -> Fixture {
    let service = Arc::new(CountingService::default());
    let engine = EngineCtx::backtest(MarketHoursDatabase::with_exchange_defaults(), props_db(), Currency::USD, t0())
        .with_security_service(service.clone());
    Fixture { engine, service }
}

fn refresh(model: &mut FutureUniverseSelectionModel, sel: &SelectionContext) -> Result<Vec<FuturesChainUniverse>, SelectionError> {
    model.create_universes(sel).collect()
}

#[test]
fn first_refresh_is_due_immediately() {
    let model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()]);
    assert_eq!(model.next_refresh_time_utc(), DateTime::<Utc>::MIN_UTC);
    assert_eq!(model.refresh_interval(), Duration::days(1));
}

#[test]
fn first_refresh_creates_non_tradable_chain_with_identity_filter() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()]);

    let universes = refresh(&mut model, &fx.engine.selection_context()).unwrap();

    assert_eq!(universes.len(), 1);
    let chain = universes[0].security();
    assert_eq!(chain.symbol, cl_chain());
    assert!(!chain.is_tradable());
    assert!(Arc::ptr_eq(&chain.filter(), &model.filter()));
    assert_eq!(fx.service.calls(), 1);
    assert_eq!(fx.engine.registry.len(), 1);
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::days(1));

    let contracts = FutureFilterUniverse::new(vec![cl(2024, 2), cl(2024, 3)], ymd(2024, 1, 8));
    assert_eq!((chain.filter())(contracts.clone()), contracts);
}

#[test]
fn later_refresh_reuses_the_chain_security() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()]);

    let first = refresh(&mut model, &fx.engine.selection_context()).unwrap();
    fx.engine.sim_clock.advance(Duration::days(1));
    assert!(fx.engine.now() >= model.next_refresh_time_utc());
    let second = refresh(&mut model, &fx.engine.selection_context()).unwrap();

    assert_eq!(second.len(), 1);
    assert!(Arc::ptr_eq(first[0].security(), second[0].security()));
    assert_eq!(fx.service.calls(), 1);
    assert_eq!(fx.engine.registry.len(), 1);
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::days(2));
}

#[test]
fn repeated_symbol_yields_one_universe() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain(), cl_chain(), es_chain(), cl_chain()]);

    let universes = refresh(&mut model, &fx.engine.selection_context()).unwrap();

    let chains: Vec<Symbol> = universes.iter().map(|u| u.symbol().clone()).collect();
    assert_eq!(chains, vec![cl_chain(), es_chain()]);
    assert_eq!(fx.service.calls(), 2);
}

#[test]
fn wrong_kind_fails_before_any_universe() {
    let fx = fixture();
    let equity = Symbol::create_canonical("CL", SecurityType::Equity, Exchange::NYMEX);
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), move |_| vec![equity.clone()]);

    let sel = fx.engine.selection_context();
    let mut it = model.create_universes(&sel);
    match it.next() {
        Some(Err(SelectionError::InvalidSymbolKind { expected, actual, .. })) => {
            assert_eq!(expected, SecurityType::Future);
            assert_eq!(actual, SecurityType::Equity);
        }
        other => panic!("expected InvalidSymbolKind, got {other:?}"),
    }
    assert!(it.next().is_none());
    drop(it);

    assert_eq!(fx.service.calls(), 0);
    assert!(fx.engine.registry.is_empty());
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::days(1));
}

#[test]
fn failure_stops_the_refresh_but_keeps_earlier_universes() {
    let fx = fixture();
    let spy = Symbol::equity("SPY", Exchange::CME);
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), move |_| vec![cl_chain(), spy.clone(), es_chain()]);

    let sel = fx.engine.selection_context();
    let results: Vec<_> = model.create_universes(&sel).collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(SelectionError::InvalidSymbolKind { .. })));
    assert!(fx.engine.registry.get(&cl_chain()).is_some());
    assert!(fx.engine.registry.get(&es_chain()).is_none());
}

#[test]
fn schedule_advances_when_metadata_is_missing() {
    let engine = EngineCtx::backtest(MarketHoursDatabase::new(), props_db(), Currency::USD, t0());
    let mut model = FutureUniverseSelectionModel::new(Duration::hours(6), |_| vec![cl_chain()]);

    let err = refresh(&mut model, &engine.selection_context()).unwrap_err();

    assert!(matches!(err, SelectionError::UnknownMarketMetadata(MetadataError::UnknownMarketHours { .. })));
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::hours(6));
    assert!(engine.registry.is_empty());
}

#[test]
fn missing_symbol_properties_is_fatal() {
    let engine = EngineCtx::backtest(MarketHoursDatabase::with_exchange_defaults(), SymbolPropertiesDatabase::new(), Currency::USD, t0());
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![es_chain()]);

    let err = refresh(&mut model, &engine.selection_context()).unwrap_err();

    match err {
        SelectionError::UnknownMarketMetadata(MetadataError::UnknownSymbolProperties { market, symbol, security_type }) => {
            assert_eq!(market, Exchange::CME);
            assert_eq!(symbol, es_chain());
            assert_eq!(security_type, SecurityType::Future);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn construction_failure_passes_through() {
    let engine = EngineCtx::backtest(MarketHoursDatabase::with_exchange_defaults(), props_db(), Currency::USD, t0())
        .with_security_service(Arc::new(FailingService));
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()]);

    let err = refresh(&mut model, &engine.selection_context()).unwrap_err();

    assert!(matches!(err, SelectionError::Engine(_)));
    assert!(err.to_string().contains("construction backend unavailable"));
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::days(1));
}

#[test]
fn resolution_happens_as_the_sequence_is_pulled() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain(), es_chain()]);

    let sel = fx.engine.selection_context();
    let mut it = model.create_universes(&sel);
    assert_eq!(fx.service.calls(), 0);
    assert!(fx.engine.registry.is_empty());

    let first = it.next().unwrap().unwrap();
    assert_eq!(first.symbol(), &cl_chain());
    assert_eq!(fx.service.calls(), 1);
    drop(it);

    // the abandoned remainder is never resolved
    assert!(fx.engine.registry.get(&es_chain()).is_none());
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::days(1));
}

#[test]
fn contract_input_resolves_to_canonical_chain() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl(2024, 3)]);

    let universes = refresh(&mut model, &fx.engine.selection_context()).unwrap();

    assert_eq!(universes[0].symbol(), &cl_chain());
    assert!(universes[0].symbol().is_canonical());
    assert!(fx.engine.registry.get(&cl_chain()).is_some());
}

#[test]
fn distinct_contracts_of_one_chain_each_emit_a_universe() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl(2024, 2), cl(2024, 3)]);

    let universes = refresh(&mut model, &fx.engine.selection_context()).unwrap();

    assert_eq!(universes.len(), 2);
    assert!(Arc::ptr_eq(universes[0].security(), universes[1].security()));
    assert_eq!(fx.service.calls(), 1);
}

#[test]
fn chain_stays_non_tradable_whatever_the_initializer_does() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()])
        .with_security_initializer(initializer_fn(|s| s.set_tradable(true)))
        .with_filter(Arc::new(|u: FutureFilterUniverse| u.front_month()));

    let universes = refresh(&mut model, &fx.engine.selection_context()).unwrap();
    assert!(!universes[0].security().is_tradable());

    // someone flips it between refreshes
    universes[0].security().set_tradable(true);
    fx.engine.sim_clock.advance(Duration::days(1));
    let again = refresh(&mut model, &fx.engine.selection_context()).unwrap();
    assert!(!again[0].security().is_tradable());
}

#[test]
fn new_filter_is_attached_to_reused_chain() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()]);
    let first = refresh(&mut model, &fx.engine.selection_context()).unwrap();
    let old_filter = first[0].security().filter();

    let front: ContractFilter = Arc::new(|u: FutureFilterUniverse| u.front_month());
    model.set_filter(front.clone());
    fx.engine.sim_clock.advance(Duration::days(1));
    let second = refresh(&mut model, &fx.engine.selection_context()).unwrap();

    let attached = second[0].security().filter();
    assert!(Arc::ptr_eq(&attached, &front));
    assert!(!Arc::ptr_eq(&attached, &old_filter));
    assert_eq!(fx.service.calls(), 1);
}

#[test]
fn engine_defaults_are_read_on_every_refresh() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::hours(1), |_| vec![cl_chain()]);

    let first = refresh(&mut model, &fx.engine.selection_context()).unwrap();
    assert_eq!(first[0].settings().resolution, Resolution::Minutes(1));

    fx.engine.set_default_universe_settings(UniverseSettings { resolution: Resolution::Hours(1), ..Default::default() });
    fx.engine.set_default_security_initializer(initializer_fn(|s| s.set_leverage(dec!(3))));
    fx.engine.sim_clock.advance(Duration::hours(1));
    let second = refresh(&mut model, &fx.engine.selection_context()).unwrap();

    assert_eq!(second[0].settings().resolution, Resolution::Hours(1));
    // the reused chain keeps the subscription it was created with
    assert_eq!(second[0].security().resolution(), Resolution::Minutes(1));

    let es_model_sel = fx.engine.selection_context();
    let mut es_model = FutureUniverseSelectionModel::new(Duration::hours(1), |_| vec![es_chain()]);
    let es = refresh(&mut es_model, &es_model_sel).unwrap();
    assert_eq!(es[0].security().resolution(), Resolution::Hours(1));
    assert_eq!(es[0].security().leverage(), dec!(3));
}

#[test]
fn explicit_settings_override_engine_defaults() {
    let fx = fixture();
    fx.engine.set_default_universe_settings(UniverseSettings { resolution: Resolution::Hours(1), ..Default::default() });
    let pinned = UniverseSettings {
        resolution: Resolution::Seconds(5),
        leverage: Some(dec!(5)),
        extended_market_hours: true,
        ..Default::default()
    };
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()])
        .with_universe_settings(pinned.clone())
        .with_security_initializer(initializer_fn(|s| s.set_leverage(dec!(2))));

    let universes = refresh(&mut model, &fx.engine.selection_context()).unwrap();
    let chain = universes[0].security();

    assert_eq!(universes[0].settings(), &pinned);
    assert_eq!(chain.resolution(), Resolution::Seconds(5));
    assert!(chain.extended_market_hours());
    // explicit leverage wins over the initializer
    assert_eq!(chain.leverage(), dec!(5));
}

#[test]
fn chain_subscription_is_registered_once() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()]);
    refresh(&mut model, &fx.engine.selection_context()).unwrap();
    fx.engine.sim_clock.advance(Duration::days(1));
    refresh(&mut model, &fx.engine.selection_context()).unwrap();

    let configs = fx.engine.subscriptions.configs_for(&cl_chain());
    assert_eq!(configs.len(), 1);
    let config = &configs[0];
    assert_eq!(config.resolution, Resolution::Minutes(1));
    assert_eq!(config.increment, Some(Duration::minutes(1)));
    assert_eq!(config.exchange_time_zone, chrono_tz::US::Central);
    assert!(config.fill_forward);
    assert!(!config.is_internal_feed);
    assert!(!config.is_custom_data);
    assert!(!config.is_filtered_subscription);
    assert!(Arc::ptr_eq(config, &fx.engine.registry.get(&cl_chain()).unwrap().config));
}

#[test]
fn direct_chain_resolution_validates_kind() {
    let fx = fixture();
    let model = FutureUniverseSelectionModel::new(Duration::days(1), |_| Vec::new());
    let sel = fx.engine.selection_context();

    let err = model.create_future_chain(&sel, &Symbol::equity("SPY", Exchange::CME)).unwrap_err();
    assert!(matches!(err, SelectionError::InvalidSymbolKind { .. }));

    let universe = model.create_future_chain(&sel, &cl(2024, 6)).unwrap();
    assert_eq!(universe.symbol(), &cl_chain());
    assert_eq!(universe.security().pricing().value_per_tick, dec!(10));
}

#[test]
fn filter_universe_operations() {
    let local = ymd(2024, 1, 8);
    let all = FutureFilterUniverse::new(vec![cl(2024, 6), cl(2024, 2), cl(2024, 3), cl(2024, 2)], local);
    assert_eq!(all.symbols(), &[cl(2024, 2), cl(2024, 3), cl(2024, 6)]);

    assert_eq!(all.clone().expiration(0, 60).into_symbols(), vec![cl(2024, 2), cl(2024, 3)]);
    assert_eq!(all.clone().front_month().into_symbols(), vec![cl(2024, 2)]);
    assert_eq!(all.clone().back_months().into_symbols(), vec![cl(2024, 3), cl(2024, 6)]);
    assert_eq!(
        all.clone().contracts(|s| s.expiry == Some(ymd(2024, 6, 1))).into_symbols(),
        vec![cl(2024, 6)]
    );
    assert!(!all.is_only_at_market_open());
    assert!(all.only_apply_filter_at_market_open().is_only_at_market_open());

    let empty = FutureFilterUniverse::new(Vec::new(), local);
    assert!(empty.front_month().is_empty());
}

#[test]
fn expiration_window_saturates_at_calendar_bounds() {
    let local = ymd(2024, 1, 8);
    let all = FutureFilterUniverse::new(vec![cl(2023, 12), cl(2024, 2), cl(2030, 3)], local);

    assert_eq!(all.clone().expiration(0, i64::MAX).into_symbols(), vec![cl(2024, 2), cl(2030, 3)]);
    assert_eq!(all.clone().expiration(0, 1_000_000_000).into_symbols(), vec![cl(2024, 2), cl(2030, 3)]);
    assert_eq!(all.clone().expiration(i64::MIN, 0).into_symbols(), vec![cl(2023, 12)]);
    assert!(all.expiration(i64::MAX, i64::MAX).is_empty());
}

#[test]
fn chain_selects_live_contracts_through_its_filter() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()])
        .with_filter(Arc::new(|u: FutureFilterUniverse| u.front_month().only_apply_filter_at_market_open()));
    let universe = refresh(&mut model, &fx.engine.selection_context()).unwrap().remove(0);

    let ng_feb = Symbol::future("NG", Exchange::NYMEX, ymd(2024, 2, 1));
    let listed = vec![cl(2023, 12), cl(2024, 3), cl(2024, 2), ng_feb];

    assert_eq!(universe.select_symbols(t0(), &listed), Some(vec![cl(2024, 2)]));

    // Saturday: exchange closed, previous selection stands
    let saturday = Utc.with_ymd_and_hms(2024, 1, 13, 18, 0, 0).unwrap();
    assert_eq!(universe.select_symbols(saturday, &listed), None);
}

#[test]
fn universe_manager_tracks_selection_diffs() {
    let fx = fixture();
    let mut model = FutureUniverseSelectionModel::new(Duration::days(1), |_| vec![cl_chain()])
        .with_filter(Arc::new(|u: FutureFilterUniverse| u.expiration(0, 45)));
    let universe = refresh(&mut model, &fx.engine.selection_context()).unwrap().remove(0);

    let mut manager = UniverseManager::new();
    assert!(manager.add(universe.clone()));
    assert!(!manager.add(universe));
    assert_eq!(manager.len(), 1);

    let listed = vec![cl(2024, 2), cl(2024, 3)];
    let diff = manager.run_selection(&cl_chain(), t0(), &listed).unwrap();
    assert_eq!(diff.added, vec![cl(2024, 2)]);
    assert!(diff.removed.is_empty());

    // three weeks later February is inside the window with March
    let later = t0() + Duration::days(21);
    let diff = manager.run_selection(&cl_chain(), later, &listed).unwrap();
    assert_eq!(diff.added, vec![cl(2024, 3)]);
    assert!(diff.removed.is_empty());
    assert_eq!(manager.selected(&cl_chain()), vec![cl(2024, 2), cl(2024, 3)]);

    // February has expired by March
    let march = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
    let diff = manager.run_selection(&cl_chain(), march, &listed).unwrap();
    assert!(diff.added.is_empty());
    assert_eq!(diff.removed, vec![cl(2024, 2)]);

    assert!(manager.run_selection(&es_chain(), t0(), &listed).is_none());
}
