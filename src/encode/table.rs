use std::fmt::Write;

use crate::audio::features::ScaledGrid;

/// A named numeric array inside a Lua table, e.g. `Level1 = { 3, 7, 12 }`.
#[derive(Clone, Debug, PartialEq)]
pub struct LuaSequence {
    pub key: String,
    pub values: Vec<f64>,
}

/// A named Lua table of numeric sequences.
#[derive(Clone, Debug, PartialEq)]
pub struct LuaTable {
    pub name: String,
    pub sequences: Vec<LuaSequence>,
}

impl LuaTable {
    /// One `LevelN` sequence per band, 1-based, in band order.
    pub fn from_scaled(name: &str, grid: &ScaledGrid) -> Self {
        let sequences = grid
            .band_series()
            .into_iter()
            .enumerate()
            .map(|(i, values)| LuaSequence {
                key: format!("Level{}", i + 1),
                values,
            })
            .collect();
        Self {
            name: name.to_string(),
            sequences,
        }
    }

    /// Length of the shortest sequence; 0 for a table without sequences.
    pub fn min_samples(&self) -> usize {
        self.sequences
            .iter()
            .map(|s| s.values.len())
            .min()
            .unwrap_or(0)
    }
}

/// Renders a [`LuaTable`] as a Lua assignment.
///
/// Values are comma separated and a line break follows every
/// `values_per_line`-th value. Trailing commas and spaces at the end of a
/// sequence are dropped; a break that lands on the last value is kept.
#[derive(Clone, Copy, Debug)]
pub struct LuaFormatter {
    pub decimal_places: u32,
    pub values_per_line: usize,
}

impl Default for LuaFormatter {
    fn default() -> Self {
        Self {
            decimal_places: 0,
            values_per_line: 60,
        }
    }
}

impl LuaFormatter {
    pub fn format_table(&self, table: &LuaTable) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} = {{", table.name);
        for seq in &table.sequences {
            let _ = writeln!(out, "\t{} = {{", seq.key);
            self.write_values(&mut out, &seq.values);
            out.push_str("\n\t},\n");
        }
        out.push('}');
        out
    }

    fn write_values(&self, out: &mut String, values: &[f64]) {
        let per_line = self.values_per_line.max(1);
        for (j, &v) in values.iter().enumerate() {
            out.push_str(&self.format_number(v));
            out.push_str(", ");
            if (j + 1) % per_line == 0 {
                out.push('\n');
            }
        }
        let kept = out.trim_end_matches([',', ' ']).len();
        out.truncate(kept);
    }

    /// Round half to even, then print as an integer (0 places) or in the
    /// shortest form Python would print the rounded float.
    pub fn format_number(&self, value: f64) -> String {
        if self.decimal_places == 0 {
            return format!("{}", value.round_ties_even() as i64);
        }
        python_float_repr(round_to_places(value, self.decimal_places))
    }
}

/// Values at or beyond this magnitude are already integral in `f64`.
const EXACT_INTEGER_LIMIT: f64 = 4_503_599_627_370_496.0; // 2^52

/// `x * 10^places`, rounded half to even, divided back. Left untouched when
/// scaling cannot change it or would overflow.
fn round_to_places(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places.min(i32::MAX as u32) as i32);
    let scaled = value * factor;
    if !factor.is_finite() || !scaled.is_finite() || scaled.abs() >= EXACT_INTEGER_LIMIT {
        return value;
    }
    let rounded = scaled.round_ties_even() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Shortest round-trip text with Python's layout: a fractional part is
/// always present, and scientific notation with a signed two-digit exponent
/// is used below 1e-4 and from 1e16 up.
fn python_float_repr(value: f64) -> String {
    let magnitude = value.abs();
    if value.is_finite() && value != 0.0 && (magnitude < 1e-4 || magnitude >= 1e16) {
        let text = format!("{:e}", value);
        if let Some((mantissa, exp)) = text.split_once('e') {
            if let Ok(exp) = exp.parse::<i32>() {
                let sign = if exp < 0 { '-' } else { '+' };
                return format!("{}e{}{:02}", mantissa, sign, exp.abs());
            }
        }
        return text;
    }
    let mut text = format!("{}", value);
    if value.is_finite() && !text.contains('.') {
        text.push_str(".0");
    }
    text
}
