//! Unit-suffixed duration text: `300ms`, `1.5s`, `1h30m`.
//!
//! Rendering always produces the canonical form (`1h0m0s`, `2m3.5s`, `1.5ms`,
//! `0s`); parsing accepts any sequence of decimal components with units
//! `ns`, `us`, `µs`, `μs`, `ms`, `s`, `m` and `h`.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", NANOS_PER_SEC),
    ("m", 60 * NANOS_PER_SEC),
    ("h", 3_600 * NANOS_PER_SEC),
];

pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SEC {
        let (unit, scale) = if nanos < 1_000 {
            ("ns", 1)
        } else if nanos < 1_000_000 {
            ("µs", 1_000)
        } else {
            ("ms", 1_000_000)
        };
        return format!("{}{unit}", decimal(nanos, scale));
    }

    let total = d.as_secs();
    let (hours, minutes, secs) = (total / 3_600, total % 3_600 / 60, total % 60);
    let secs = decimal(
        u128::from(secs) * NANOS_PER_SEC + u128::from(d.subsec_nanos()),
        NANOS_PER_SEC,
    );

    if hours > 0 {
        format!("{hours}h{minutes}m{secs}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs}s")
    } else {
        format!("{secs}s")
    }
}

/// `value / scale` as a decimal with trailing fractional zeros trimmed.
fn decimal(value: u128, scale: u128) -> String {
    let (whole, frac) = (value / scale, value % scale);
    if frac == 0 {
        return whole.to_string();
    }
    let width = scale.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = parse_magnitude(rest)?;
    if negative && !magnitude.is_zero() {
        return Err("negative durations are not supported".into());
    }
    Ok(magnitude)
}

fn parse_magnitude(rest: &str) -> Result<Duration, String> {
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err("empty duration".into());
    }

    let mut total: u128 = 0;
    let mut rest = rest;
    while !rest.is_empty() {
        let whole_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (whole, tail) = rest.split_at(whole_len);
        let (frac, tail) = match tail.strip_prefix('.') {
            Some(after) => {
                let frac_len = after
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after.len());
                after.split_at(frac_len)
            }
            None => ("", tail),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err("expected a number".into());
        }

        let unit_len = tail
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err("missing unit".into());
        }
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| format!("unknown unit {unit:?}"))?;

        total = whole_nanos(whole, scale)
            .and_then(|n| n.checked_add(frac_nanos(frac, scale)))
            .and_then(|n| total.checked_add(n))
            .ok_or_else(|| "duration out of range".to_string())?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| "duration out of range")?;
    let nanos = u32::try_from(total % NANOS_PER_SEC).map_err(|_| "duration out of range")?;
    Ok(Duration::new(secs, nanos))
}

fn whole_nanos(digits: &str, scale: u128) -> Option<u128> {
    if digits.is_empty() {
        return Some(0);
    }
    digits.parse::<u128>().ok()?.checked_mul(scale)
}

/// Fractional digits beyond nanosecond precision are truncated.
fn frac_nanos(digits: &str, scale: u128) -> u128 {
    let mut nanos = 0;
    let mut place = scale;
    for digit in digits.chars().filter_map(|c| c.to_digit(10)) {
        place /= 10;
        if place == 0 {
            break;
        }
        nanos += u128::from(digit) * place;
    }
    nanos
}
