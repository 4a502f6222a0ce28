use chrono::Duration;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Resolution for time- or tick-based aggregation.
///
/// Chain securities carry one of these as their subscription resolution.
///
/// - [`Ticks`] – every trade.
/// - [`Quote`] – Quote updates (BBO snapshots).
/// - [`Seconds(u8)`] – N-second bars (e.g. 1-second, 5-second).
/// - [`Minutes(u8)`] – N-minute bars.
/// - [`Hours(u8)`] – N-hour bars.
/// - [`TickBars(u32)`] – Bars built from a fixed number of ticks.
/// - [`Daily`] – One bar per trading day.
/// - [`Weekly`] – One bar per trading week.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, Copy, Serialize, Deserialize)]
pub enum Resolution {
    Ticks,
    Quote,
    Seconds(u8),
    Minutes(u8),
    Hours(u8),
    TickBars(u32),
    Daily,
    Weekly,
}

impl Resolution {
    /// Wall-clock span of one bar; `None` for tick/quote driven resolutions.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Resolution::Seconds(s) => Some(Duration::seconds(*s as i64)),
            Resolution::Minutes(m) => Some(Duration::minutes(*m as i64)),
            Resolution::Hours(h)   => Some(Duration::hours(*h as i64)),
            Resolution::Daily      => Some(Duration::days(1)),
            Resolution::Weekly     => Some(Duration::weeks(1)),
            Resolution::Ticks | Resolution::Quote | Resolution::TickBars(_) => None,
        }
    }
}
