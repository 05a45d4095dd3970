//! The six damage colors and the color-match rule

use serde::{Deserialize, Serialize};

/// Damage/target color. Three primaries and their three pairwise mixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// Primary: ignites on hit
    Red,
    /// Primary: freezes on hit
    Blue,
    /// Primary: chains lightning on hit
    Yellow,
    /// Red + Blue
    Purple,
    /// Blue + Yellow
    Green,
    /// Red + Yellow
    Orange,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Yellow,
        Color::Purple,
        Color::Green,
        Color::Orange,
    ];

    pub const PRIMARIES: [Color; 3] = [Color::Red, Color::Blue, Color::Yellow];

    #[inline]
    pub fn is_primary(self) -> bool {
        matches!(self, Color::Red | Color::Blue | Color::Yellow)
    }

    /// The two primaries a secondary is mixed from (`None` for primaries)
    pub fn components(self) -> Option<(Color, Color)> {
        match self {
            Color::Purple => Some((Color::Red, Color::Blue)),
            Color::Green => Some((Color::Blue, Color::Yellow)),
            Color::Orange => Some((Color::Red, Color::Yellow)),
            _ => None,
        }
    }

    /// Mix two primaries. Order-independent; equal or non-primary inputs yield `None`.
    pub fn mix(a: Color, b: Color) -> Option<Color> {
        use Color::*;
        match (a, b) {
            (Red, Blue) | (Blue, Red) => Some(Purple),
            (Blue, Yellow) | (Yellow, Blue) => Some(Green),
            (Red, Yellow) | (Yellow, Red) => Some(Orange),
            _ => None,
        }
    }

    /// Whether `self` is one of this color's primary components
    #[inline]
    pub fn contains(self, primary: Color) -> bool {
        self.components()
            .is_some_and(|(a, b)| a == primary || b == primary)
    }

    /// Effective-hit rule: equal colors match, and a secondary also matches
    /// either of its primary components. Void state is handled by the target.
    #[inline]
    pub fn matches(damage: Color, target: Color) -> bool {
        damage == target || damage.contains(target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
            Color::Green => "green",
            Color::Orange => "orange",
        }
    }
}
