//! RGB colors as used by shape styles and annotation records.
//!
//! Records carry CSS color strings; the host document uses 0–1 float
//! triples. Parsing is built on `winnow` 0.7.

use crate::error::ColorError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, opt, preceded};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

/// An opaque RGB color with integer channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const NOTE_YELLOW: Color = Color::rgb(255, 222, 33);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` or `rgba(r, g, b, a)`.
    /// Alpha is accepted and ignored; opacity lives on the shape style.
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        alt((parse_hex_color, parse_rgb_function))
            .parse(input.trim())
            .map_err(|_| ColorError::Invalid(input.to_string()))
    }

    /// Convert a host 0–1 float triple.
    pub fn from_host(rgb: [f32; 3]) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
    }

    /// Convert to the host 0–1 float triple.
    pub fn to_host(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// CSS functional notation, e.g. `rgb(255, 222, 33)`.
    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::RED
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl std::str::FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn backtrack() -> winnow::error::ErrMode<ContextError> {
    winnow::error::ErrMode::Backtrack(ContextError::new())
}

fn parse_hex_color(input: &mut &str) -> ModalResult<Color> {
    let _ = '#'.parse_next(input)?;
    let digits: &str = take_while(3..=6, |c: char| c.is_ascii_hexdigit()).parse_next(input)?;
    let b = digits.as_bytes();
    let nibble = |i: usize| hex_val(b[i]).ok_or_else(backtrack);
    match b.len() {
        3 => Ok(Color::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
        6 => Ok(Color::rgb(
            nibble(0)? << 4 | nibble(1)?,
            nibble(2)? << 4 | nibble(3)?,
            nibble(4)? << 4 | nibble(5)?,
        )),
        _ => Err(backtrack()),
    }
}

fn parse_number(input: &mut &str) -> ModalResult<f64> {
    let start = *input;
    let _ = take_while(1.., |c: char| c.is_ascii_digit() || c == '.').parse_next(input)?;
    let matched = &start[..start.len() - input.len()];
    matched.parse::<f64>().map_err(|_| backtrack())
}

fn parse_channel(input: &mut &str) -> ModalResult<u8> {
    preceded(multispace0, parse_number)
        .map(|v| v.clamp(0.0, 255.0).round() as u8)
        .parse_next(input)
}

fn parse_comma(input: &mut &str) -> ModalResult<()> {
    (multispace0, ',').void().parse_next(input)
}

fn parse_rgb_function(input: &mut &str) -> ModalResult<Color> {
    let _ = alt(("rgba(", "rgb(")).parse_next(input)?;
    let r = parse_channel.parse_next(input)?;
    parse_comma.parse_next(input)?;
    let g = parse_channel.parse_next(input)?;
    parse_comma.parse_next(input)?;
    let b = parse_channel.parse_next(input)?;
    let _ = opt(preceded(parse_comma, preceded(multispace0, parse_number))).parse_next(input)?;
    let _ = (multispace0, ')').parse_next(input)?;
    Ok(Color::rgb(r, g, b))
}
