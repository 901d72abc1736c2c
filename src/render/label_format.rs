//! French number labels for indicator cards and origin bars.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

pub const NO_EVOLUTION_LABEL: &str = "--";
pub const REFERENCE_LABEL: &str = "Référence";

/// One decimal, comma separator. Non-finite input renders as `0,0`.
fn one_decimal(value: f64) -> String {
    let Some(decimal) = Decimal::from_f64(value) else {
        return "0,0".to_owned();
    };
    let rounded = decimal.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.1}").replace('.', ",")
}

/// Compact count: `1,2 M`, `12,5 k`, plain integer below a thousand.
///
/// The fractional part is dropped before scaling.
#[must_use]
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_owned();
    }
    let value = value.trunc();
    if value >= 1_000_000.0 {
        format!("{} M", one_decimal(value / 1_000_000.0))
    } else if value >= 1_000.0 {
        format!("{} k", one_decimal(value / 1_000.0))
    } else {
        format!("{value:.0}")
    }
}

/// Stay durations keep one decimal: `3,4`.
#[must_use]
pub fn format_duration(value: f64) -> String {
    one_decimal(value)
}

#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{}%", one_decimal(value))
}

/// Direction of a year-over-year change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    #[must_use]
    pub fn of(evolution_pct: f64) -> Self {
        if evolution_pct > 0.0 {
            Self::Up
        } else if evolution_pct < 0.0 {
            Self::Down
        } else {
            Self::Flat
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Up => "▲",
            Self::Down => "▼",
            Self::Flat => "=",
        }
    }
}

/// `▲ 12,5%`; the sign lives in the arrow.
#[must_use]
pub fn format_evolution(evolution_pct: Option<f64>) -> String {
    match evolution_pct {
        Some(pct) if pct.is_finite() => {
            format!("{} {}", Trend::of(pct).symbol(), format_percent(pct.abs()))
        }
        _ => NO_EVOLUTION_LABEL.to_owned(),
    }
}
