use std::sync::Arc;
use ahash::AHashMap;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use crate::engine_core::api_traits::{MarketHoursProvider, MetadataError};
use crate::securities::symbols::{Exchange, SecurityType, Symbol};

/// Session days indexed from Sunday (`days[0]`) to Saturday (`days[6]`).
pub type SessionDays = [bool; 7];

/// Monday to Friday.
pub const WEEKDAYS: SessionDays = [false, true, true, true, true, true, false];
/// Sunday to Thursday: evening opens of overnight sessions that close the next morning.
pub const SUN_THU: SessionDays = [true, true, true, true, true, false, false];

/// One trading window in exchange-local seconds since midnight.
/// `open_ssm > close_ssm` wraps past midnight into the following day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRule { pub days: SessionDays, pub open_ssm: u32, pub close_ssm: u32 }

impl SessionRule {
    pub const fn new(days: SessionDays, open: (u32, u32), close: (u32, u32)) -> Self {
        Self { days, open_ssm: open.0 * 3600 + open.1 * 60, close_ssm: close.0 * 3600 + close.1 * 60 }
    }

    #[inline]
    fn wraps(&self) -> bool { self.open_ssm > self.close_ssm }

    /// `weekday` is days from Sunday of the local date holding `ssm`.
    fn contains(&self, weekday: usize, ssm: u32) -> bool {
        if !self.wraps() {
            return self.days[weekday] && ssm >= self.open_ssm && ssm < self.close_ssm;
        }
        let yesterday = (weekday + 6) % 7;
        (self.days[weekday] && ssm >= self.open_ssm) || (self.days[yesterday] && ssm < self.close_ssm)
    }
}

/// Exchange trading calendar attached to every chain security.
#[derive(Debug, Clone)]
pub struct MarketHours {
    pub exchange: Exchange,
    pub tz: Tz,
    /// Primary/pit ("regular") trading sessions
    pub regular: Vec<SessionRule>,
    /// Electronic/overnight and other non-regular sessions
    pub extended: Vec<SessionRule>,
    pub holidays: Vec<NaiveDate>,
}

/// Which session set to consult when querying hours
#[derive(Debug, Clone, Copy)]
pub enum SessionKind { Regular, Extended, Both }

impl MarketHours {
    fn rules(&self, kind: SessionKind) -> impl Iterator<Item = &SessionRule> {
        let (reg, ext) = match kind {
            SessionKind::Regular => (true, false),
            SessionKind::Extended => (false, true),
            SessionKind::Both => (true, true),
        };
        self.regular.iter().filter(move |_| reg).chain(self.extended.iter().filter(move |_| ext))
    }

    /// True if **any** (regular or extended) session is open at `t`.
    pub fn is_open(&self, t: DateTime<Utc>) -> bool { self.is_open_with(t, SessionKind::Both) }

    /// True if a session of the requested kind is open at `t`.
    pub fn is_open_with(&self, t: DateTime<Utc>, kind: SessionKind) -> bool {
        let local = t.with_timezone(&self.tz);
        if self.holidays.contains(&local.date_naive()) { return false; }
        let weekday = local.weekday().num_days_from_sunday() as usize;
        let ssm = local.num_seconds_from_midnight();
        self.rules(kind).any(|r| r.contains(weekday, ssm))
    }

    pub fn is_open_regular(&self, t: DateTime<Utc>) -> bool { self.is_open_with(t, SessionKind::Regular) }
    pub fn is_open_extended(&self, t: DateTime<Utc>) -> bool { self.is_open_with(t, SessionKind::Extended) }

    /// Exchange-local calendar date of `t`.
    pub fn local_date(&self, t: DateTime<Utc>) -> NaiveDate {
        t.with_timezone(&self.tz).date_naive()
    }
}

fn calendar(exchange: Exchange, tz: Tz, regular: Vec<SessionRule>, extended: Vec<SessionRule>) -> MarketHours {
    MarketHours { exchange, tz, regular, extended, holidays: Vec::new() }
}

/// Default futures trading hours per exchange.
/// NOTE: exchange-level approximations; product-level calendars may differ.
pub fn hours_for_exchange(exch: Exchange) -> MarketHours {
    use chrono_tz::{America, Asia, Europe, US};
    match exch {
        // Globex equity-index profile: day session plus overnight and the 15:30 re-open.
        Exchange::CME | Exchange::GLOBEX | Exchange::CFE => calendar(
            exch,
            US::Central,
            vec![SessionRule::new(WEEKDAYS, (8, 30), (15, 15))],
            vec![
                SessionRule::new(SUN_THU, (17, 0), (8, 30)),
                SessionRule::new(WEEKDAYS, (15, 30), (16, 0)),
            ],
        ),
        // Ags: overnight 19:00–07:45, day 08:30–13:20 CT.
        Exchange::CBOT => calendar(
            exch,
            US::Central,
            vec![SessionRule::new(WEEKDAYS, (8, 30), (13, 20))],
            vec![SessionRule::new(SUN_THU, (19, 0), (7, 45))],
        ),
        // Energy and metals trade 23h with a 16:00–17:00 CT break.
        Exchange::NYMEX | Exchange::COMEX => calendar(
            exch,
            US::Central,
            vec![],
            vec![SessionRule::new(SUN_THU, (17, 0), (16, 0))],
        ),
        Exchange::EUREX => calendar(
            exch,
            Europe::Berlin,
            vec![SessionRule::new(WEEKDAYS, (1, 10), (22, 0))],
            vec![],
        ),
        Exchange::ICEUS => calendar(
            exch,
            America::New_York,
            vec![SessionRule::new(SUN_THU, (20, 0), (18, 0))],
            vec![],
        ),
        Exchange::ICEEU => calendar(
            exch,
            Europe::London,
            vec![SessionRule::new(WEEKDAYS, (1, 0), (23, 0))],
            vec![],
        ),
        // T session 08:15–18:00 SGT, T+1 session 18:40–05:15.
        Exchange::SGX => calendar(
            exch,
            Asia::Singapore,
            vec![SessionRule::new(WEEKDAYS, (8, 15), (18, 0))],
            vec![SessionRule::new(WEEKDAYS, (18, 40), (5, 15))],
        ),
    }
}

/// Exchange hours plus the time zone the raw data is stamped in.
#[derive(Debug, Clone)]
pub struct MarketHoursEntry {
    pub exchange_hours: Arc<MarketHours>,
    pub data_time_zone: Tz,
}

/// `root = None` is the market-wide wildcard entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MetadataKey {
    pub(crate) market: Exchange,
    pub(crate) root: Option<String>,
    pub(crate) security_type: SecurityType,
}

impl MetadataKey {
    pub(crate) fn exact(market: Exchange, symbol: &Symbol, security_type: SecurityType) -> Self {
        Self { market, root: Some(symbol.value().to_ascii_uppercase()), security_type }
    }

    pub(crate) fn wildcard(&self) -> Self {
        Self { root: None, ..self.clone() }
    }
}

/// In-memory market hours database.
///
/// Lookups try the `(market, root, kind)` entry first and fall back to the
/// market-wide wildcard for that kind. A miss on both is an
/// [`MetadataError::UnknownMarketHours`].
#[derive(Debug, Default, Clone)]
pub struct MarketHoursDatabase {
    entries: AHashMap<MetadataKey, MarketHoursEntry>,
}

impl MarketHoursDatabase {
    pub fn new() -> Self { Self::default() }

    /// Wildcard futures entries for every known exchange, using the built-in
    /// calendars with data stamped in exchange time.
    pub fn with_exchange_defaults() -> Self {
        let mut db = Self::new();
        for exch in Exchange::ALL {
            let hours = hours_for_exchange(exch);
            let entry = MarketHoursEntry { data_time_zone: hours.tz, exchange_hours: Arc::new(hours) };
            db.insert(exch, None, SecurityType::Future, entry);
        }
        db
    }

    /// Register an entry; `root = None` registers the market-wide wildcard.
    pub fn insert(&mut self, market: Exchange, root: Option<&str>, security_type: SecurityType, entry: MarketHoursEntry) {
        let key = MetadataKey { market, root: root.map(|r| r.to_ascii_uppercase()), security_type };
        self.entries.insert(key, entry);
    }

    pub fn get_entry(&self, market: Exchange, symbol: &Symbol, security_type: SecurityType) -> Result<&MarketHoursEntry, MetadataError> {
        let key = MetadataKey::exact(market, symbol, security_type);
        self.entries
            .get(&key)
            .or_else(|| self.entries.get(&key.wildcard()))
            .ok_or_else(|| MetadataError::UnknownMarketHours { market, symbol: symbol.clone(), security_type })
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl MarketHoursProvider for MarketHoursDatabase {
    fn entry(&self, market: Exchange, symbol: &Symbol, security_type: SecurityType) -> Result<MarketHoursEntry, MetadataError> {
        self.get_entry(market, symbol, security_type).cloned()
    }
}
