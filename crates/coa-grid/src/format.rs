//! Cell text styling and number display modes

use serde::{Deserialize, Serialize};

/// A toggleable text style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFlag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

/// How numeric cell values are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    /// Raw value, untouched
    #[default]
    Default,
    Number,
    Percentage,
    Currency,
}

/// Per-cell formatting overlay entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub number_format: NumberFormat,
}

impl CellFormat {
    pub fn is(&self, flag: FormatFlag) -> bool {
        match flag {
            FormatFlag::Bold => self.bold,
            FormatFlag::Italic => self.italic,
            FormatFlag::Underline => self.underline,
            FormatFlag::Strikethrough => self.strikethrough,
        }
    }

    pub fn toggle(&mut self, flag: FormatFlag) {
        let slot = match flag {
            FormatFlag::Bold => &mut self.bold,
            FormatFlag::Italic => &mut self.italic,
            FormatFlag::Underline => &mut self.underline,
            FormatFlag::Strikethrough => &mut self.strikethrough,
        };
        *slot = !*slot;
    }
}

/// Parse a cell value as a finite number. Blank text is not a number.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Render `raw` in the given number mode; non-numeric values pass through.
pub fn format_value(raw: &str, number_format: NumberFormat) -> String {
    if number_format == NumberFormat::Default {
        return raw.to_string();
    }
    let Some(value) = parse_numeric(raw) else {
        return raw.to_string();
    };

    match number_format {
        NumberFormat::Percentage => format!("{}%", to_fixed(value * 100.0, 2)),
        NumberFormat::Currency => format!("${}", to_fixed(value, 2)),
        NumberFormat::Number => group_thousands(value),
        NumberFormat::Default => raw.to_string(),
    }
}

const MAX_FRACTION_DIGITS: usize = 3;

/// Fixed-point text with `digits` decimals, exact ties rounded away from zero
fn to_fixed(value: f64, digits: usize) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}", fixed_abs(value.abs(), digits))
}

/// `magnitude` must be non-negative and finite.
///
/// `{:.N}` rounds exact ties to even. A tie at `digits` decimals is exactly
/// an odd multiple of `2^-(digits + 1)`, which prints exactly with one more
/// decimal; that text is then rounded up by hand.
fn fixed_abs(magnitude: f64, digits: usize) -> String {
    let scaled = magnitude * 2f64.powi(digits as i32 + 1);
    let is_tie = scaled.fract() == 0.0 && scaled % 2.0 == 1.0;
    if !is_tie {
        return format!("{magnitude:.digits$}");
    }

    let mut text = format!("{:.*}", digits + 1, magnitude);
    text.pop();
    if text.ends_with('.') {
        text.pop();
    }
    increment_decimal(&text)
}

/// Add one unit in the last place of a plain decimal string
fn increment_decimal(text: &str) -> String {
    let mut digits: Vec<u8> = text.bytes().collect();
    for byte in digits.iter_mut().rev() {
        match *byte {
            b'.' => continue,
            b'9' => *byte = b'0',
            _ => {
                *byte += 1;
                return String::from_utf8_lossy(&digits).into_owned();
            }
        }
    }
    format!("1{}", String::from_utf8_lossy(&digits))
}

/// en-US style: comma-grouped integer part, up to three fraction digits
fn group_thousands(value: f64) -> String {
    let fixed = fixed_abs(value.abs(), MAX_FRACTION_DIGITS);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}
