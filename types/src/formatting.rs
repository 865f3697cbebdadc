//! Centralized text formatting for published values.
//!
//! Every string an overlay reads goes through this module so the signing of
//! symbols and the number layout stay consistent across sources.

use crate::UnicodeSigning;
use std::fmt::Display;

/// Skull, used for death counters.
pub const SKULL: &str = "\u{2620}";

/// Crossed swords, used for kill counters and the in-combat marker.
pub const SWORDS: &str = "\u{2694}";

/// Attach `symbol` to `value` according to the signing preference.
///
/// # Examples
/// ```
/// use stream_out_types::UnicodeSigning;
/// use stream_out_types::formatting::{sign, SKULL};
/// assert_eq!(sign(3, SKULL, UnicodeSigning::Suffixed), "3\u{2620}");
/// assert_eq!(sign(3, SKULL, UnicodeSigning::Prefixed), "\u{2620}3");
/// assert_eq!(sign(3, SKULL, UnicodeSigning::None), "3");
/// ```
pub fn sign(value: impl Display, symbol: &str, signing: UnicodeSigning) -> String {
    match signing {
        UnicodeSigning::Prefixed => format!("{symbol}{value}"),
        UnicodeSigning::Suffixed => format!("{value}{symbol}"),
        UnicodeSigning::None => value.to_string(),
    }
}

/// Format a number with `,` thousands separators.
///
/// # Examples
/// ```
/// use stream_out_types::formatting::format_thousands;
/// assert_eq!(format_thousands(0), "0");
/// assert_eq!(format_thousands(1_500), "1,500");
/// assert_eq!(format_thousands(-1_500_000), "-1,500,000");
/// ```
pub fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    if n < 0 {
        result.insert(0, '-');
    }
    result
}

/// Format an amount of copper as gold, silver and copper.
///
/// # Examples
/// ```
/// use stream_out_types::formatting::format_coins;
/// assert_eq!(format_coins(10_000_000), "1,000g 0s 0c");
/// assert_eq!(format_coins(12_345), "1g 23s 45c");
/// assert_eq!(format_coins(45), "0g 0s 45c");
/// ```
pub fn format_coins(copper: i64) -> String {
    let negative = copper < 0;
    let copper = copper.unsigned_abs();
    let gold = copper / 10_000;
    let silver = (copper % 10_000) / 100;
    let rest = copper % 100;

    let s = format!("{}g {}s {}c", format_thousands(gold as i64), silver, rest);

    if negative { format!("-{s}") } else { s }
}

/// Roman numeral for a tier index. Zero has no numeral and yields an empty string.
///
/// # Examples
/// ```
/// use stream_out_types::formatting::to_roman;
/// assert_eq!(to_roman(1), "I");
/// assert_eq!(to_roman(4), "IV");
/// assert_eq!(to_roman(14), "XIV");
/// ```
pub fn to_roman(mut n: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut result = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            result.push_str(numeral);
            n -= value;
        }
    }
    result
}

/// Format a percentage rounded to a whole number, ties to even.
///
/// # Examples
/// ```
/// use stream_out_types::formatting::format_pct_whole;
/// assert_eq!(format_pct_whole(57.4), "57%");
/// assert_eq!(format_pct_whole(62.5), "62%");
/// ```
pub fn format_pct_whole(pct: f64) -> String {
    format!("{}%", pct.round_ties_even() as i64)
}
