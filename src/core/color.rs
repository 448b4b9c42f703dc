//! Color-key value for forcing pixels transparent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An exact RGBA color; pixels equal to it become fully transparent.
///
/// Written as `#rrggbb` (opaque) or `#rrggbbaa` in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyColor(pub [u8; 4]);

impl KeyColor {
    pub const fn rgba(&self) -> [u8; 4] {
        self.0
    }
}

impl FromStr for KeyColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(format!(
                "invalid color `{s}`, expected `#rrggbb` or `#rrggbbaa`"
            ));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| format!("invalid hex digits in color `{s}`"))
        };

        let alpha = if hex.len() == 8 { channel(3)? } else { 255 };
        Ok(Self([channel(0)?, channel(1)?, channel(2)?, alpha]))
    }
}

impl TryFrom<String> for KeyColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyColor> for String {
    fn from(color: KeyColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for KeyColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}
