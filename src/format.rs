//! Display formatting for derived report figures.
//!
//! The report page shows money as `$1,234,567` in tables and `$1.2M` in
//! headline tiles, percentages with a fixed number of decimals, and tax-rate
//! bars sized relative to the largest rate. These helpers are shared by the
//! CLI summary and by anything rendering a [`ScenarioTree`](crate::analysis::ScenarioTree).

const MAGNITUDES: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Whole-dollar currency with thousands separators: `-$1,234,567`.
///
/// Non-finite values render as `$0`.
pub fn format_currency(value: f64) -> String {
    let value = if value.is_finite() { value.round() } else { 0.0 };
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(value.abs()))
}

/// Compact currency for headline tiles: `$420K`, `$1.2M`, `-$3B`.
///
/// Amounts below one thousand fall back to [`format_currency`].
pub fn format_compact_currency(value: f64) -> String {
    if !value.is_finite() {
        return format_currency(0.0);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    for (i, &(scale, suffix)) in MAGNITUDES.iter().enumerate() {
        if abs < scale {
            continue;
        }
        let scaled = one_decimal(abs / scale);
        // 999_960 rounds to 1000.0K; show it as 1M instead.
        if scaled >= 1000.0 && i > 0 {
            let (bigger_scale, bigger_suffix) = MAGNITUDES[i - 1];
            return format!("{sign}${}{bigger_suffix}", trim_decimal(one_decimal(abs / bigger_scale)));
        }
        return format!("{sign}${}{suffix}", trim_decimal(scaled));
    }
    format_currency(value)
}

/// A fraction rendered as a percentage: `0.185` → `18.5%` with one decimal.
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    let pct = if fraction.is_finite() { fraction * 100.0 } else { 0.0 };
    format!("{pct:.decimals$}%")
}

/// Parse a display amount such as `$1.2M`, `-$20,000`, `+$350K` or
/// `$5 million` back into dollars.
pub fn parse_money(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let (negative, s) = match s.strip_prefix(['-', '−']) {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let s = s.trim_start();
    let s = s.strip_prefix('$').unwrap_or(s).trim_start();

    let split = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, ',' | '.')))
        .map_or(s.len(), |(i, _)| i);
    let (number, suffix) = s.split_at(split);
    let number: String = number.chars().filter(|&c| c != ',').collect();
    if !number.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let amount: f64 = number.parse().ok()?;

    let multiplier = match suffix.trim().to_ascii_lowercase().as_str() {
        "" => 1.0,
        "k" | "thousand" => 1e3,
        "m" | "million" => 1e6,
        "b" | "billion" => 1e9,
        _ => return None,
    };
    let value = amount * multiplier;
    Some(if negative { -value } else { value })
}

/// Width of a horizontal bar as a percentage of the widest one, in `[0, 100]`.
pub fn bar_width(value: f64, max: f64) -> f64 {
    if !value.is_finite() || !max.is_finite() || max <= 0.0 {
        return 0.0;
    }
    (value / max * 100.0).clamp(0.0, 100.0)
}

fn group_thousands(abs: f64) -> String {
    let digits = format!("{abs:.0}");
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn trim_decimal(v: f64) -> String {
    let s = format!("{v:.1}");
    s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(1234.4), "$1,234");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
        assert_eq!(format_currency(-20_000.0), "-$20,000");
        assert_eq!(format_currency(f64::NAN), "$0");
    }

    #[test]
    fn compact_currency_suffixes() {
        assert_eq!(format_compact_currency(420_000.0), "$420K");
        assert_eq!(format_compact_currency(1_200_000.0), "$1.2M");
        assert_eq!(format_compact_currency(-3_000_000_000.0), "-$3B");
        assert_eq!(format_compact_currency(512.0), "$512");
        assert_eq!(format_compact_currency(999_960.0), "$1M");
    }

    #[test]
    fn percent_from_fraction() {
        assert_eq!(format_percent(0.185, 1), "18.5%");
        assert_eq!(format_percent(0.7, 0), "70%");
        assert_eq!(format_percent(-0.04, 0), "-4%");
    }

    #[test]
    fn money_parsing() {
        assert_eq!(parse_money("$1.2M"), Some(1_200_000.0));
        assert_eq!(parse_money("-$20,000"), Some(-20_000.0));
        assert_eq!(parse_money("+$350K"), Some(350_000.0));
        assert_eq!(parse_money("$5 million"), Some(5_000_000.0));
        assert_eq!(parse_money("$0"), Some(0.0));
        assert_eq!(parse_money("1,500"), Some(1500.0));
        assert_eq!(parse_money("n/a"), None);
        assert_eq!(parse_money("$12 apples"), None);
        assert_eq!(parse_money(""), None);
    }

    #[test]
    fn parse_accepts_what_extraction_produces() {
        for shown in ["+$500K", "+$350K", "$0", "+$0", "-$150K", "$1.1M"] {
            assert!(parse_money(shown).is_some(), "{shown}");
        }
    }

    #[test]
    fn bar_widths_are_clamped() {
        assert_eq!(bar_width(37.0, 37.0), 100.0);
        assert_eq!(bar_width(18.5, 37.0), 50.0);
        assert_eq!(bar_width(50.0, 37.0), 100.0);
        assert_eq!(bar_width(-1.0, 37.0), 0.0);
        assert_eq!(bar_width(10.0, 0.0), 0.0);
    }
}
