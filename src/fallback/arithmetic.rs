use std::sync::LazyLock;

use regex::Regex;

static PERCENT_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*%\s*of\s+(-?\d+(?:\.\d+)?)").expect("valid percent regex")
});

static BINARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*([-+*/x×÷])\s*(-?\d+(?:\.\d+)?)")
        .expect("valid binary-operation regex")
});

/// Decimal places kept when printing a result, so `0.1 + 0.2` reads `0.3`.
const DISPLAY_PRECISION: f64 = 1e10;

/// Above this magnitude an `f64` has no fractional digits left to round,
/// and scaling by `DISPLAY_PRECISION` could overflow.
const ROUNDING_LIMIT: f64 = 1e15;

/// An expression found in free text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expression {
    PercentOf { percent: f64, base: f64 },
    Binary { lhs: f64, op: char, rhs: f64 },
}

impl Expression {
    /// Find the first expression in `text`. Percentages take precedence.
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(caps) = PERCENT_OF.captures(text) {
            let percent = caps[1].parse().ok()?;
            let base = caps[2].parse().ok()?;
            return Some(Self::PercentOf { percent, base });
        }

        let caps = BINARY.captures(text)?;
        let lhs = caps[1].parse().ok()?;
        let op = caps[2].chars().next()?;
        let rhs = caps[3].parse().ok()?;
        Some(Self::Binary { lhs, op, rhs })
    }

    /// Evaluate with plain `f64` arithmetic. Division by zero gives 0.
    pub fn evaluate(self) -> f64 {
        match self {
            Self::PercentOf { percent, base } => percent * base / 100.0,
            Self::Binary { lhs, op, rhs } => match op {
                '+' => lhs + rhs,
                '-' => lhs - rhs,
                '*' | 'x' | 'X' | '×' => lhs * rhs,
                '/' | '÷' if rhs == 0.0 => 0.0,
                '/' | '÷' => lhs / rhs,
                _ => 0.0,
            },
        }
    }

    /// Sentence reporting the result.
    pub fn answer(self) -> String {
        let result = format_number(self.evaluate());
        match self {
            Self::PercentOf { percent, base } => format!(
                "{}% of {} is {result}.",
                format_number(percent),
                format_number(base)
            ),
            Self::Binary { .. } => format!("The answer is {result}."),
        }
    }
}

pub fn contains_expression(text: &str) -> bool {
    PERCENT_OF.is_match(text) || BINARY.is_match(text)
}

/// `62.0` prints as `62`; long binary fractions are cut at ten places.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() || value.abs() >= ROUNDING_LIMIT {
        return value.to_string();
    }
    let rounded = (value * DISPLAY_PRECISION).round() / DISPLAY_PRECISION;
    // Avoid printing "-0".
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    rounded.to_string()
}
