//! Formatting utilities for consistent display of money values.
//!
//! Colombian locale conventions: `.` as thousands separator, `,` as
//! decimal separator. COP amounts display without decimals (the original
//! records track whole pesos); USD amounts display with two.

use rust_decimal::Decimal;

/// Format a COP amount: "$ 1.234.567"
pub fn format_cop(value: Decimal) -> String {
    format!("$ {}", group_thousands(value, 0))
}

/// Format a USD amount: "US$ 1.234,56"
pub fn format_usd(value: Decimal) -> String {
    format!("US$ {}", group_thousands(value, 2))
}

/// Format a rate as a percentage with two decimals: "0.0095" -> "0,95%"
pub fn format_rate(rate: Decimal) -> String {
    let pct = rate * Decimal::from(100);
    format!("{}%", group_thousands(pct, 2))
}

fn group_thousands(value: Decimal, decimals: u32) -> String {
    let is_negative = value < Decimal::ZERO;
    let rounded = value.abs().round_dp(decimals);

    let formatted = if decimals == 0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1$}", rounded, decimals as usize)
    };
    let mut parts = formatted.splitn(2, '.');
    let integer_part = parts.next().unwrap_or("0");
    let decimal_part = parts.next();

    // Insert '.' every three digits from the right
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec!['.', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    match decimal_part {
        Some(d) => format!("{sign}{with_separators},{d}"),
        None => format!("{sign}{with_separators}"),
    }
}
