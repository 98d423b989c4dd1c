//! Amounts are stored as whole øre (`i64`). Prices arrive from forms in
//! kroner and are converted once, at the edge.

/// Danish VAT rate (moms)
pub const VAT_RATE: f64 = 0.25;

/// Largest unit price or daily rate accepted from a form, in kroner.
pub const MAX_AMOUNT: f64 = 10_000_000.0;

/// Largest quantity accepted on a service line.
pub const MAX_QUANTITY: f64 = 100_000.0;

/// Convert a kroner amount to øre. Out-of-range values saturate.
pub fn to_minor(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn line_total(unit_minor: i64, quantity: f64) -> i64 {
    (unit_minor as f64 * quantity).round() as i64
}

/// Total of submitted lines given as `(unit price in kroner, quantity)`.
pub fn invoice_total<I>(lines: I) -> i64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    lines
        .into_iter()
        .map(|(amount, quantity)| (amount * quantity * 100.0).round() as i64)
        .fold(0, i64::saturating_add)
}

/// Saturating sum of øre amounts.
pub fn sum<I>(amounts: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    amounts.into_iter().fold(0, i64::saturating_add)
}

pub fn with_vat(minor: i64) -> i64 {
    (minor as f64 * (1.0 + VAT_RATE)).round() as i64
}

/// `123456` becomes `1.234,56 kr.`
pub fn format_currency(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let kroner = (abs / 100).to_string();
    let ore = abs % 100;

    let mut grouped = String::with_capacity(kroner.len() + kroner.len() / 3);
    for (i, digit) in kroner.chars().enumerate() {
        if i > 0 && (kroner.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{sign}{grouped},{ore:02} kr.")
}

/// `123456` becomes `1234.56`
pub fn format_decimal(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_units_round_to_nearest() {
        assert_eq!(to_minor(12.34), 1234);
        assert_eq!(to_minor(0.005), 1);
        assert_eq!(to_minor(0.1 + 0.2), 30);
        assert_eq!(to_minor(250.0), 25000);
    }

    #[test]
    fn invoice_total_rounds_each_line() {
        let total = invoice_total([(100.0, 2.0), (49.5, 1.0), (0.333, 3.0)]);
        assert_eq!(total, 20000 + 4950 + 100);
        assert_eq!(invoice_total(Vec::<(f64, f64)>::new()), 0);
    }

    #[test]
    fn fractional_quantity_line_total() {
        assert_eq!(line_total(35000, 1.5), 52500);
    }

    #[test]
    fn vat_is_a_quarter_on_top() {
        assert_eq!(with_vat(10000), 12500);
        assert_eq!(with_vat(1), 1);
        assert_eq!(with_vat(3), 4);
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        assert_eq!(to_minor(1e300), i64::MAX);
        assert_eq!(invoice_total([(1e300, 1.0), (1e300, 1.0)]), i64::MAX);
        assert_eq!(line_total(i64::MAX, 2.0), i64::MAX);
        assert_eq!(with_vat(i64::MAX), i64::MAX);
        assert_eq!(sum([i64::MAX, 1, 2]), i64::MAX);
        assert_eq!(sum([100, 250]), 350);
    }

    #[test]
    fn danish_currency_format() {
        assert_eq!(format_currency(0), "0,00 kr.");
        assert_eq!(format_currency(5), "0,05 kr.");
        assert_eq!(format_currency(123456), "1.234,56 kr.");
        assert_eq!(format_currency(100000000), "1.000.000,00 kr.");
        assert_eq!(format_currency(-98750), "-987,50 kr.");
    }

    #[test]
    fn decimal_format_for_documents() {
        assert_eq!(format_decimal(123456), "1234.56");
        assert_eq!(format_decimal(7), "0.07");
        assert_eq!(format_decimal(-250), "-2.50");
    }
}
