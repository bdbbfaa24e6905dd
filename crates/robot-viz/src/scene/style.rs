//! Colors and actor styles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// RGB color with components in `[0, 1]`.
///
/// Parses from common color names (`"red"`, `"lightgray"`) or `#rrggbb`, and
/// serializes back to `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 0.5, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const LIGHT_GRAY: Color = Color::rgb(0.827, 0.827, 0.827);

    /// Named colors accepted by [`Color::from_str`].
    const NAMED: &'static [(&'static str, Color)] = &[
        ("black", Color::BLACK),
        ("white", Color::WHITE),
        ("red", Color::RED),
        ("green", Color::GREEN),
        ("lime", Color::rgb(0.0, 1.0, 0.0)),
        ("blue", Color::BLUE),
        ("yellow", Color::YELLOW),
        ("cyan", Color::rgb(0.0, 1.0, 1.0)),
        ("magenta", Color::rgb(1.0, 0.0, 1.0)),
        ("orange", Color::rgb(1.0, 0.647, 0.0)),
        ("purple", Color::rgb(0.502, 0.0, 0.502)),
        ("pink", Color::rgb(1.0, 0.753, 0.796)),
        ("brown", Color::rgb(0.647, 0.165, 0.165)),
        ("gray", Color::rgb(0.502, 0.502, 0.502)),
        ("grey", Color::rgb(0.502, 0.502, 0.502)),
        ("darkgray", Color::rgb(0.663, 0.663, 0.663)),
        ("darkgrey", Color::rgb(0.663, 0.663, 0.663)),
        ("lightgray", Color::LIGHT_GRAY),
        ("lightgrey", Color::LIGHT_GRAY),
    ];

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// RGB part of an RGBA array.
    pub fn from_rgba(rgba: [f32; 4]) -> Self {
        Self::rgb(rgba[0], rgba[1], rgba[2])
    }

    pub fn to_rgba(&self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }

    /// Scale brightness, keeping components in range.
    pub fn shaded(&self, factor: f32) -> Self {
        Self::rgb(
            (self.r * factor).clamp(0.0, 1.0),
            (self.g * factor).clamp(0.0, 1.0),
            (self.b * factor).clamp(0.0, 1.0),
        )
    }

    fn to_u8(c: f32) -> u8 {
        (c.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        [Self::to_u8(self.r), Self::to_u8(self.g), Self::to_u8(self.b)]
    }
}

/// A color string that is neither a known name nor `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown color '{0}'")]
pub struct ColorParseError(pub String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();

        if let Some(hex) = name.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(ColorParseError(s.to_string()));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map(|v| v as f32 / 255.0)
                    .map_err(|_| ColorParseError(s.to_string()))
            };
            return Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?));
        }

        Self::NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
            .ok_or_else(|| ColorParseError(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.to_rgb8();
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// How an actor is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorStyle {
    pub color: Color,
    /// 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f32,
    /// Stroke width in screen points, used by line geometry
    pub line_width: f32,
}

impl Default for ActorStyle {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
            line_width: 1.0,
        }
    }
}

impl ActorStyle {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_line_width(mut self, line_width: f32) -> Self {
        self.line_width = line_width;
        self
    }
}
