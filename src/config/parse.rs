//! Text form of a scanner setting: `[symbology.]option[=value]`
//!
//! Symbology and option names may be abbreviated to any prefix at least as
//! long as the tier they belong to, so `ean1.dis` means `ean13.disable`.
//! `no-` in front of an option negates the value.

use super::{Config, Setting};
use crate::symbol::SymbolType;
use crate::{Error, Result};

/// Symbology names with the shortest prefix each one accepts, in match order.
const SYMBOLOGIES: &[(&str, usize, SymbolType)] = &[
    ("qrcode", 2, SymbolType::QrCode),
    ("db", 2, SymbolType::Databar),
    ("upca", 3, SymbolType::Upca),
    ("upce", 3, SymbolType::Upce),
    ("ean13", 3, SymbolType::Ean13),
    ("ean8", 3, SymbolType::Ean8),
    ("ean5", 3, SymbolType::Ean5),
    ("ean2", 3, SymbolType::Ean2),
    ("composite", 3, SymbolType::Composite),
    ("i25", 3, SymbolType::I25),
    ("scanner", 4, SymbolType::Partial),
    ("isbn13", 4, SymbolType::Isbn13),
    ("isbn10", 4, SymbolType::Isbn10),
    ("db-exp", 4, SymbolType::DatabarExp),
    ("codabar", 4, SymbolType::Codabar),
    ("code93", 6, SymbolType::Code93),
    ("code39", 6, SymbolType::Code39),
    ("pdf417", 6, SymbolType::Pdf417),
    ("sqcode", 6, SymbolType::SqCode),
    ("code128", 7, SymbolType::Code128),
    ("databar", 7, SymbolType::Databar),
    ("databar-exp", 7, SymbolType::DatabarExp),
];

/// Option names, same scheme; the flag marks `disable`.
const OPTIONS: &[(&str, usize, Config, bool)] = &[
    ("y-density", 1, Config::YDensity, false),
    ("x-density", 1, Config::XDensity, false),
    ("enable", 2, Config::Enable, false),
    ("disable", 3, Config::Enable, true),
    ("min-length", 3, Config::MinLen, false),
    ("max-length", 3, Config::MaxLen, false),
    ("ascii", 3, Config::Ascii, false),
    ("binary", 3, Config::Binary, false),
    ("add-check", 3, Config::AddCheck, false),
    ("emit-check", 3, Config::EmitCheck, false),
    ("uncertainty", 3, Config::Uncertainty, false),
    ("position", 3, Config::Position, false),
];

/// Parse one setting.
///
/// ```
/// use zbar_bind::config::{parse, Config, Setting};
/// use zbar_bind::SymbolType;
///
/// assert_eq!(
///     parse("qr.disable").unwrap(),
///     Setting::new(SymbolType::QrCode, Config::Enable, 0)
/// );
/// assert_eq!(
///     parse("x-density=0x2").unwrap(),
///     Setting::new(SymbolType::None, Config::XDensity, 2)
/// );
/// ```
pub fn parse(text: &str) -> Result<Setting> {
    let (symbology, rest) = match text.split_once('.') {
        Some((sym, rest)) => (parse_symbology(sym).ok_or_else(|| bad(text))?, rest),
        None => (SymbolType::None, text),
    };

    let (name, value) = match rest.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    };

    let (mut negate, name) = match name.strip_prefix("no-") {
        Some(stripped) if name.len() > 3 => (true, stripped),
        _ => (false, name),
    };

    let (option, inverted) = lookup(OPTIONS, name, |&(full, min, cfg, inv)| (full, min, (cfg, inv)))
        .ok_or_else(|| bad(text))?;
    negate ^= inverted;

    let mut value = match value {
        Some(v) => parse_int(v).ok_or_else(|| bad(text))?,
        None => 1,
    };
    if negate {
        value = i32::from(value == 0);
    }

    Ok(Setting::new(symbology, option, value))
}

fn parse_symbology(name: &str) -> Option<SymbolType> {
    if name.is_empty() || name == "*" {
        return Some(SymbolType::None);
    }
    lookup(SYMBOLOGIES, name, |&(full, min, sym)| (full, min, sym))
}

/// First entry whose tier admits `name` and whose full name starts with it.
fn lookup<E, T>(
    table: &[E],
    name: &str,
    split: impl Fn(&E) -> (&'static str, usize, T),
) -> Option<T> {
    for entry in table {
        let (full, min, target) = split(entry);
        // tables are ordered by tier; once too short for a tier, nothing later matches
        if name.len() < min {
            return None;
        }
        if full.starts_with(name) {
            return Some(target);
        }
    }
    None
}

/// Integer with C `strtol` base-0 rules: optional sign, then `0x` hex,
/// leading-`0` octal or decimal. The whole text must be consumed.
fn parse_int(text: &str) -> Option<i32> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}

fn bad(text: &str) -> Error {
    Error::ParseConfig(text.to_owned())
}
