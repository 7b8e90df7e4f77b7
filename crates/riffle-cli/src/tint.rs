//! Display-only coloring of chances
//!
//! A hand-tuned ramp from "unremarkable" to "extremely unlikely", used only to
//! color report tables. It has no bearing on the scores themselves, which
//! come from [`riffle_stats::significance`].

use crossterm::style::{Color, Stylize as _};

/// Chances at or above this are not colored.
pub const NEUTRAL_ABOVE: f64 = 0.05;
/// Chances at or below this get the strongest color.
pub const SATURATED_BELOW: f64 = 1e-6;

const LEVELS: u8 = 4;

/// Whether an observed count is below or above its expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Low,
    High,
}

impl Direction {
    #[must_use]
    pub fn of(observed: f64, expected: f64) -> Self {
        if observed < expected {
            Self::Low
        } else {
            Self::High
        }
    }
}

/// Severity level `0..=4` of a chance; `0` is neutral.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn severity(chance: f64) -> u8 {
    if chance.is_nan() || chance >= NEUTRAL_ABOVE {
        return 0;
    }
    if chance <= SATURATED_BELOW {
        return LEVELS;
    }
    // Position on a log scale between the two thresholds
    let ramp = (NEUTRAL_ABOVE / chance).ln() / (NEUTRAL_ABOVE / SATURATED_BELOW).ln();
    ((ramp * f64::from(LEVELS)).ceil() as u8).clamp(1, LEVELS)
}

#[must_use]
pub fn color(chance: Option<f64>, direction: Direction) -> Option<Color> {
    let level = severity(chance?);
    if level == 0 {
        return None;
    }
    let fade = 200 - 50 * level;
    Some(match direction {
        Direction::High => Color::Rgb {
            r: 255,
            g: fade,
            b: fade,
        },
        Direction::Low => Color::Rgb {
            r: fade,
            g: fade,
            b: 255,
        },
    })
}

pub fn paint(text: String, color: Option<Color>) -> String {
    match color {
        Some(color) => text.with(color).to_string(),
        None => text,
    }
}
