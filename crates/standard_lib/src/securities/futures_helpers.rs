use chrono::{Datelike, NaiveDate, Utc};

/// CME month letters, January first.
const MONTH_CODES: [char; 12] = ['F', 'G', 'H', 'J', 'K', 'M', 'N', 'Q', 'U', 'V', 'X', 'Z'];

pub fn month_code(month: u32) -> char {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_CODES.get(i as usize))
        .copied()
        .unwrap_or('?')
}

#[inline]
pub fn month_from_code(c: char) -> Option<u32> {
    let c = c.to_ascii_uppercase();
    MONTH_CODES.iter().position(|m| *m == c).map(|i| i as u32 + 1)
}

/// "CLZ25" split into root "CL", month 12 and year digits "25".
struct ContractCode {
    root: String,
    month: u32,
    year_digits: String,
}

fn split_contract_code(code: &str) -> Option<ContractCode> {
    let clean: String = code
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let digits = clean.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 2 {
        return None;
    }
    let (head, year_digits) = clean.split_at(clean.len() - digits);
    let month_letter = head.chars().last()?;
    let month = month_from_code(month_letter)?;
    let root = &head[..head.len() - 1];
    if root.is_empty() {
        return None;
    }
    Some(ContractCode { root: root.to_string(), month, year_digits: year_digits.to_string() })
}

/// Full year for a one or two digit contract year. One digit years land in
/// the decade of `this_year`, or the next one if that is more than two years back.
fn contract_year(year_digits: &str, this_year: i32) -> Option<i32> {
    let n: i32 = year_digits.parse().ok()?;
    if year_digits.len() == 2 {
        return Some(if n <= 79 { 2000 + n } else { 1900 + n });
    }
    let mut year = this_year - this_year.rem_euclid(10) + n;
    if year < this_year - 2 {
        year += 10;
    }
    Some(year)
}

/// Futures **root** of a contract code; codes without a month/year suffix
/// are returned whole.
/// - `"ESZ25"` → `"ES"`
/// - `"MNQZ5"` → `"MNQ"`
/// - `"CL"`    → `"CL"`
pub fn extract_root(code: &str) -> String {
    match split_contract_code(code) {
        Some(parsed) => parsed.root,
        None => code.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_ascii_uppercase(),
    }
}

/// First calendar day of the contract month, e.g. `"CLZ25"` → 2025-12-01.
/// One digit years resolve against today's UTC date.
pub fn parse_expiry_from_contract_code(code: &str) -> Option<NaiveDate> {
    parse_expiry_from_contract_code_as_of(code, Utc::now().date_naive())
}

/// As [`parse_expiry_from_contract_code`], resolving one digit years against `today`.
pub fn parse_expiry_from_contract_code_as_of(code: &str, today: NaiveDate) -> Option<NaiveDate> {
    let parsed = split_contract_code(code)?;
    NaiveDate::from_ymd_opt(contract_year(&parsed.year_digits, today.year())?, parsed.month, 1)
}
