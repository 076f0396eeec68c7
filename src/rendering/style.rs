//! Drawing styles.
//!
//! [`Style`] carries vector drawing state where every field is optional:
//! applying a style only changes what it sets. [`TextStyle`] is complete on
//! its own and is passed with each text draw.

use crate::{
    core::constants::{
        DEFAULT_FILL_COLOR, DEFAULT_MITER_LIMIT, DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH,
    },
    MapError, Result,
};
use serde::{Deserialize, Serialize};

/// An sRGB color with straight (non-premultiplied) alpha.
///
/// Serialized as a `#rrggbb` / `#rrggbbaa` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` or a basic color name
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let invalid = || MapError::ParseError(format!("invalid color '{value}'"));

        let Some(hex) = value.strip_prefix('#') else {
            return match value.to_ascii_lowercase().as_str() {
                "black" => Ok(Color::BLACK),
                "white" => Ok(Color::WHITE),
                "transparent" | "none" => Ok(Color::TRANSPARENT),
                "red" => Ok(Color::rgb(255, 0, 0)),
                "green" => Ok(Color::rgb(0, 128, 0)),
                "blue" => Ok(Color::rgb(0, 0, 255)),
                "gray" | "grey" => Ok(Color::rgb(128, 128, 128)),
                _ => Err(invalid()),
            };
        };

        if !hex.is_ascii() {
            return Err(invalid());
        }
        let digits: Vec<u8> = match hex.len() {
            3 | 4 => hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| (d * 17) as u8))
                .collect::<Option<_>>()
                .ok_or_else(invalid)?,
            6 | 8 => (0..hex.len())
                .step_by(2)
                .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
                .collect::<Option<_>>()
                .ok_or_else(invalid)?,
            _ => return Err(invalid()),
        };

        Ok(Color::rgba(
            digits[0],
            digits[1],
            digits[2],
            digits.get(3).copied().unwrap_or(255),
        ))
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl std::str::FromStr for Color {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Vector drawing options; `None` leaves the canvas state untouched.
///
/// Defaults of a fresh canvas: stroke `#3388ff`, fill `#3388ff3f`, width 4,
/// butt caps, miter joins, miter limit 10. Points are drawn with radius 1
/// unless `pointradius` says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    #[serde(rename = "strokecolor", skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Color>,
    #[serde(rename = "fillcolor", skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    #[serde(rename = "strokewidth", skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(rename = "strokelinecap", skip_serializing_if = "Option::is_none")]
    pub line_cap: Option<LineCap>,
    #[serde(rename = "strokelinejoin", skip_serializing_if = "Option::is_none")]
    pub line_join: Option<LineJoin>,
    #[serde(rename = "strokemiterlimit", skip_serializing_if = "Option::is_none")]
    pub miter_limit: Option<f64>,
    #[serde(rename = "pointradius", skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<f64>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stroke_color(mut self, color: Color) -> Self {
        self.stroke_color = Some(color);
        self
    }

    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn line_cap(mut self, cap: LineCap) -> Self {
        self.line_cap = Some(cap);
        self
    }

    pub fn line_join(mut self, join: LineJoin) -> Self {
        self.line_join = Some(join);
        self
    }

    pub fn miter_limit(mut self, limit: f64) -> Self {
        self.miter_limit = Some(limit);
        self
    }

    pub fn point_radius(mut self, radius: f64) -> Self {
        self.point_radius = Some(radius);
        self
    }

    /// Fields set in `other` win over fields set in `self`
    pub fn merged_with(&self, other: &Style) -> Style {
        Style {
            stroke_color: other.stroke_color.or(self.stroke_color),
            fill_color: other.fill_color.or(self.fill_color),
            stroke_width: other.stroke_width.or(self.stroke_width),
            line_cap: other.line_cap.or(self.line_cap),
            line_join: other.line_join.or(self.line_join),
            miter_limit: other.miter_limit.or(self.miter_limit),
            point_radius: other.point_radius.or(self.point_radius),
        }
    }
}

/// The complete stroke and fill state a canvas starts with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub stroke_color: Color,
    pub fill_color: Color,
    pub stroke_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
}

impl DrawState {
    /// Overwrites only the fields `style` sets
    pub fn apply(&mut self, style: &Style) {
        if let Some(color) = style.stroke_color {
            self.stroke_color = color;
        }
        if let Some(color) = style.fill_color {
            self.fill_color = color;
        }
        if let Some(width) = style.stroke_width {
            self.stroke_width = width.max(0.0);
        }
        if let Some(cap) = style.line_cap {
            self.line_cap = cap;
        }
        if let Some(join) = style.line_join {
            self.line_join = join;
        }
        if let Some(limit) = style.miter_limit {
            self.miter_limit = limit;
        }
    }
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            stroke_color: Color::parse(DEFAULT_STROKE_COLOR).unwrap_or(Color::rgb(0x33, 0x88, 0xff)),
            fill_color: Color::parse(DEFAULT_FILL_COLOR)
                .unwrap_or(Color::rgba(0x33, 0x88, 0xff, 0x3f)),
            stroke_width: DEFAULT_STROKE_WIDTH,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: DEFAULT_MITER_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    Overline,
    LineThrough,
}

/// Text drawing options.
///
/// `position` is the left, center or right end of the baseline depending on
/// `align`. `angle` rotates counter-clockwise in degrees around that point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Font family; `None` uses the default sans-serif family
    pub font: Option<String>,
    /// Font size in pixels
    pub size: f64,
    pub color: Color,
    pub align: TextAlign,
    pub decoration: TextDecoration,
    /// Extra space between glyphs, in pixels
    pub kerning: f64,
    /// Extra space added to every space character, in pixels
    pub word_spacing: f64,
    /// Line height multiplier for multi-line text
    pub line_spacing: f64,
    /// Background band painted behind the text
    pub under_color: Option<Color>,
    pub angle: f64,
}

impl TextStyle {
    pub fn line_height(&self) -> f64 {
        self.size * self.line_spacing
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: None,
            size: 12.0,
            color: Color::BLACK,
            align: TextAlign::Left,
            decoration: TextDecoration::None,
            kerning: 0.0,
            word_spacing: 0.0,
            line_spacing: 1.2,
            under_color: None,
            angle: 0.0,
        }
    }
}
