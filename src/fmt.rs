/// Format an amount the way Spanish bank statements do: 1.234,56
pub fn amount(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative && cents != "0.00" {
        format!("-{grouped},{dec_part}")
    } else {
        format!("{grouped},{dec_part}")
    }
}

/// Amount followed by its currency code, if any.
pub fn amount_with_currency(val: Option<f64>, currency: Option<&str>) -> String {
    match (val, currency) {
        (Some(v), Some(c)) if !c.is_empty() => format!("{} {c}", amount(v)),
        (Some(v), _) => amount(v),
        (None, _) => String::new(),
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_formatting() {
        assert_eq!(amount(1234.56), "1.234,56");
        assert_eq!(amount(-500.00), "-500,00");
        assert_eq!(amount(0.0), "0,00");
        assert_eq!(amount(1000000.99), "1.000.000,99");
        assert_eq!(amount(-0.001), "0,00");
    }

    #[test]
    fn test_amount_with_currency() {
        assert_eq!(amount_with_currency(Some(-12.5), Some("EUR")), "-12,50 EUR");
        assert_eq!(amount_with_currency(Some(3.0), None), "3,00");
        assert_eq!(amount_with_currency(None, Some("EUR")), "");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
