//! Display helpers shared by presenters.
//!
//! There is a single fixed display format: Indian rupees with Indian digit grouping,
//! `DD/MM/YYYY` dates, and ordinal due days.

use chrono::NaiveDate;

/// Formats an amount as rupees, e.g. `₹12,34,567.5`.
///
/// At most two fraction digits are shown and trailing zeros are trimmed.
/// Negative amounts render as `₹-350`.
#[must_use]
pub fn format_inr(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut out = String::from("₹");
    if amount < 0.0 && fixed != "0.00" {
        out.push('-');
    }
    out.push_str(&group_indian(whole));
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Groups an integer digit string Indian style: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);

    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// Formats a calendar date as `DD/MM/YYYY`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// English ordinal suffix for a day of month.
#[must_use]
pub const fn day_suffix(day: i32) -> &'static str {
    if day >= 11 && day <= 13 {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Due day label, e.g. `5th of month`.
#[must_use]
pub fn due_day_label(day: i32) -> String {
    format!("{day}{} of month", day_suffix(day))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_format_inr_grouping() {
        assert_eq!(format_inr(0.0), "₹0");
        assert_eq!(format_inr(999.0), "₹999");
        assert_eq!(format_inr(1000.0), "₹1,000");
        assert_eq!(format_inr(100_000.0), "₹1,00,000");
        assert_eq!(format_inr(1_234_567.5), "₹12,34,567.5");
        assert_eq!(format_inr(12_345_678.25), "₹1,23,45,678.25");
    }

    #[test]
    fn test_format_inr_negative_and_rounding() {
        assert_eq!(format_inr(-350.0), "₹-350");
        assert_eq!(format_inr(-0.001), "₹0");
        assert_eq!(format_inr(10.005_1), "₹10.01");
        assert_eq!(format_inr(300.10), "₹300.1");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_date(date), "07/03/2026");
    }

    #[test]
    fn test_day_suffix() {
        assert_eq!(due_day_label(1), "1st of month");
        assert_eq!(due_day_label(2), "2nd of month");
        assert_eq!(due_day_label(3), "3rd of month");
        assert_eq!(due_day_label(4), "4th of month");
        assert_eq!(due_day_label(11), "11th of month");
        assert_eq!(due_day_label(12), "12th of month");
        assert_eq!(due_day_label(13), "13th of month");
        assert_eq!(due_day_label(21), "21st of month");
        assert_eq!(due_day_label(22), "22nd of month");
        assert_eq!(due_day_label(31), "31st of month");
    }
}
