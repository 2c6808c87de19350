//! Display formatting for USD values and token amounts.

const TRILLION: f64 = 1.0e12;
const BILLION: f64 = 1.0e9;
const MILLION: f64 = 1.0e6;

#[derive(Debug, Clone, Copy)]
pub struct CurrencyOptions {
    pub decimals: usize,
    /// Collapse millions and above into `M`/`B`/`T` suffixes.
    pub abbreviate: bool,
}

impl Default for CurrencyOptions {
    fn default() -> Self {
        Self {
            decimals: 2,
            abbreviate: true,
        }
    }
}

/// Inserts `,` between every group of three integer digits.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match fraction {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn fixed_grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    // Rounding can leave "-0.00"; show it unsigned.
    if formatted.starts_with('-') && formatted.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        return group_thousands(&formatted[1..]);
    }
    group_thousands(&formatted)
}

/// `$1,234.56`, `$1.50M`, `$2.00B`, `$3.10T`. `None` and NaN render as `$0.00`.
pub fn format_currency(value: Option<f64>, options: CurrencyOptions) -> String {
    let num = match value {
        Some(v) if !v.is_nan() => v,
        _ => return "$0.00".to_string(),
    };

    if options.abbreviate {
        let abs = num.abs();
        let (scaled, suffix) = if abs >= TRILLION {
            (num / TRILLION, "T")
        } else if abs >= BILLION {
            (num / BILLION, "B")
        } else if abs >= MILLION {
            (num / MILLION, "M")
        } else {
            (num, "")
        };
        return format!("${}{}", fixed_grouped(scaled, options.decimals), suffix);
    }

    format!("${}", fixed_grouped(num, options.decimals))
}

/// Same as [`format_currency`] for a raw text value.
pub fn format_currency_str(value: &str, options: CurrencyOptions) -> String {
    format_currency(value.trim().parse::<f64>().ok(), options)
}

/// Token amount with at most `max_decimals` fraction digits and no trailing zeros.
pub fn format_token_amount(value: Option<f64>, max_decimals: usize) -> String {
    let num = match value {
        Some(v) if v.is_finite() => v,
        _ => return "0".to_string(),
    };

    let formatted = fixed_grouped(num, max_decimals);
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted
    }
}

pub fn format_token_amount_str(value: &str, max_decimals: usize) -> String {
    format_token_amount(value.trim().parse::<f64>().ok(), max_decimals)
}
