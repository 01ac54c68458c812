//! Parsing of human duration strings such as `7d`, `24h` or `1w2d12h30m`.
//!
//! The grammar is a signed sequence of `<number><unit>` groups. Numbers may
//! carry a fractional part. Units are `ns`, `us` (`µs`), `ms`, `s`, `m`, `h`,
//! `d` (24 hours) and `w` (7 days). The total must fit in an `i64` count of
//! nanoseconds.

use chrono::Duration;

use crate::error::CheckError;

const NANOSECOND: u128 = 1;
const MICROSECOND: u128 = 1_000 * NANOSECOND;
const MILLISECOND: u128 = 1_000 * MICROSECOND;
const SECOND: u128 = 1_000 * MILLISECOND;
const MINUTE: u128 = 60 * SECOND;
const HOUR: u128 = 60 * MINUTE;
const DAY: u128 = 24 * HOUR;
const WEEK: u128 = 7 * DAY;

/// Parses a duration string into a [`chrono::Duration`].
///
/// # Example
///
/// ```
/// # use is_tls_expiring::duration::parse_duration;
/// let offset = parse_duration("7d")?;
/// assert_eq!(offset, chrono::Duration::hours(168));
/// # Ok::<(), is_tls_expiring::CheckError>(())
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, CheckError> {
    let invalid = |reason: &str| {
        CheckError::invalid_input("in", format!("{} in duration {:?}", reason, input))
    };

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid("empty value"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = leading_digits(rest);
        let whole = &rest[..int_len];
        rest = &rest[int_len..];

        let mut fraction = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = leading_digits(after_dot);
            fraction = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "" => return Err(invalid("missing unit")),
            other => unit_nanos(other)
                .ok_or_else(|| invalid(&format!("unknown unit {:?}", other)))?,
        };
        rest = &rest[unit_len..];

        let group = scale(whole, fraction, unit).ok_or_else(|| invalid("value out of range"))?;
        total = total
            .checked_add(group)
            .filter(|t| *t <= i64::MAX as u128)
            .ok_or_else(|| invalid("value out of range"))?;
    }

    let nanos = total as i64;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        "d" => Some(DAY),
        "w" => Some(WEEK),
        _ => None,
    }
}

/// `whole.fraction` times `unit`, truncated to whole nanoseconds.
fn scale(whole: &str, fraction: &str, unit: u128) -> Option<u128> {
    let mut value: u128 = 0;
    for digit in whole.bytes() {
        value = value.checked_mul(10)?.checked_add(u128::from(digit - b'0'))?;
    }
    let mut nanos = value.checked_mul(unit)?;

    let mut denominator: u128 = 1;
    let mut numerator: u128 = 0;
    for digit in fraction.bytes() {
        // Digits past nanosecond precision of a week cannot change the result.
        if denominator >= 1_000_000_000_000_000_000 {
            break;
        }
        numerator = numerator * 10 + u128::from(digit - b'0');
        denominator *= 10;
    }
    nanos = nanos.checked_add(numerator.checked_mul(unit)? / denominator)?;

    Some(nanos)
}
