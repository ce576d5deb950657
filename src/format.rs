use serde::Serializer;

/// `round(part / whole * 1000) / 10`, or 0 when there is nothing to divide by.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Renders an amount held in paise as rupees with thousands separators,
/// e.g. `8_000_00` -> `₹8,000` and `1_234_50` -> `₹1,234.50`.
pub fn format_rupees(paise: i64) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs = paise.unsigned_abs();
    let whole = group_thousands(abs / 100);
    let fraction = abs % 100;

    if fraction == 0 {
        format!("{sign}₹{whole}")
    } else {
        format!("{sign}₹{whole}.{fraction:02}")
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

pub fn paise_to_rupees(paise: i64) -> f64 {
    paise as f64 / 100.0
}

pub fn serialize_rupees<S>(paise: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(paise_to_rupees(*paise))
}
