use std::fmt;
use std::str::FromStr;
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use crate::securities::futures_helpers::{extract_root, month_code, parse_expiry_from_contract_code_as_of};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum SecurityType { Future, Option, Equity, Index, Forex, Crypto }

impl SecurityType {
    /// Derivative kinds are organised in chains (one canonical symbol, many contracts).
    #[inline]
    pub fn is_derivative(&self) -> bool {
        matches!(self, SecurityType::Future | SecurityType::Option)
    }
}

/// Futures venues with a built-in trading calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum Exchange { CME, GLOBEX, CBOT, NYMEX, COMEX, CFE, EUREX, ICEUS, ICEEU, SGX }

impl Exchange {
    pub const ALL: [Exchange; 10] = [
        Exchange::CME, Exchange::GLOBEX, Exchange::CBOT, Exchange::NYMEX, Exchange::COMEX,
        Exchange::CFE, Exchange::EUREX, Exchange::ICEUS, Exchange::ICEEU, Exchange::SGX,
    ];
}

/// Quote/account currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Currency { USD, EUR, GBP, JPY, CHF, CAD, AUD, SGD }

impl Currency {
    pub const ALL: [Currency; 8] = [
        Currency::USD, Currency::EUR, Currency::GBP, Currency::JPY,
        Currency::CHF, Currency::CAD, Currency::AUD, Currency::SGD,
    ];
}

/// A venue or currency code that is not in the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code {code:?}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: String,
}

/// Case-insensitive lookup of `code` by display name.
fn parse_code<T: Copy + fmt::Display>(all: &[T], kind: &'static str, code: &str) -> Result<T, UnknownCode> {
    let wanted = code.trim();
    all.iter()
        .copied()
        .find(|v| v.to_string().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| UnknownCode { kind, code: wanted.to_string() })
}

impl FromStr for Exchange {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_code(&Exchange::ALL, "exchange", s)
    }
}

impl FromStr for Currency {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_code(&Currency::ALL, "currency", s)
    }
}

/// Display value of a symbol, e.g. the root "CL" for every crude oil contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SymbolId(pub String);

/// Engine-wide identity of an instrument.
///
/// Equality and hashing cover every field, so `CL` expiring in December and
/// `CL` expiring in March are distinct symbols that share one canonical
/// chain (`/CL`).
///
/// A symbol is **canonical** when it is a derivative without an expiry: it
/// names the whole chain of contracts rather than one of them, and it is the
/// key chain securities are registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub security_type: SecurityType,
    pub market: Exchange,
    /// Contract expiry; `None` for canonical chains and non-dated instruments.
    pub expiry: Option<NaiveDate>,
}

impl Symbol {
    /// Chain-level symbol for `value` on `market`.
    pub fn create_canonical(value: impl Into<String>, security_type: SecurityType, market: Exchange) -> Self {
        Self { id: SymbolId(value.into()), security_type, market, expiry: None }
    }

    /// A single dated futures contract of the `root` family.
    pub fn future(root: impl Into<String>, market: Exchange, expiry: NaiveDate) -> Self {
        Self { id: SymbolId(root.into()), security_type: SecurityType::Future, market, expiry: Some(expiry) }
    }

    pub fn equity(ticker: impl Into<String>, market: Exchange) -> Self {
        Self { id: SymbolId(ticker.into()), security_type: SecurityType::Equity, market, expiry: None }
    }

    /// Parse a CME-style contract code ("CLZ25", "MNQH6") into a dated future.
    ///
    /// The expiry is the first calendar day of the contract month. Returns
    /// `None` when the code carries no month/year suffix.
    pub fn from_contract_code(code: &str, market: Exchange) -> Option<Self> {
        Self::from_contract_code_as_of(code, market, Utc::now().date_naive())
    }

    /// `today` pins the decade of one digit contract years (`"MNQZ5"`).
    pub fn from_contract_code_as_of(code: &str, market: Exchange, today: NaiveDate) -> Option<Self> {
        let expiry = parse_expiry_from_contract_code_as_of(code, today)?;
        let root = extract_root(code);
        if root.is_empty() {
            return None;
        }
        Some(Self::future(root.to_ascii_uppercase(), market, expiry))
    }

    #[inline] pub fn value(&self) -> &str { &self.id.0 }

    #[inline]
    pub fn is_canonical(&self) -> bool {
        self.security_type.is_derivative() && self.expiry.is_none()
    }

    /// Canonical chain symbol this symbol belongs to.
    pub fn to_canonical(&self) -> Symbol {
        Symbol::create_canonical(self.id.0.clone(), self.security_type, self.market)
    }

    /// Chain alias in the engine's "/ROOT" notation.
    pub fn alias(&self) -> String {
        format!("/{}", self.id.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expiry {
            None if self.is_canonical() => write!(f, "{}", self.alias()),
            None => write!(f, "{}", self.id.0),
            Some(exp) => write!(f, "{}{}{:02}", self.id.0, month_code(exp.month()), exp.year() % 100),
        }
    }
}
