// Number formatting for metric display
// Author: Gabriel Demetrios Lafis

/// Shown in place of a statistic that has no data
pub const NO_DATA: &str = "—";

/// Scale a number into units, thousands or millions with two decimals.
///
/// `format_number(1530.0, "$")` gives `"$ 1.53 thousand"`.
pub fn format_number(value: f64, prefix: &str) -> String {
    if value.is_nan() {
        return NO_DATA.to_string();
    }

    let mut scaled = value;
    for unit in ["", "thousand"] {
        if scaled < 1000.0 {
            return join(prefix, scaled, unit);
        }
        scaled /= 1000.0;
    }
    join(prefix, scaled, "million")
}

fn join(prefix: &str, value: f64, unit: &str) -> String {
    let number = format!("{:.2}", value);
    [prefix, number.as_str(), unit]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// One decimal followed by a unit, or [`NO_DATA`] for the empty-result sentinel
pub fn format_metric(value: f64, unit: &str) -> String {
    if value.is_nan() {
        NO_DATA.to_string()
    } else if unit.is_empty() {
        format!("{:.1}", value)
    } else {
        format!("{:.1} {}", value, unit)
    }
}
