//! Colors for rendered graphs.
//!
//! [`Color`] wraps the `DynamicColor` type from the color crate and converts
//! it to the forms the exporters need: hex strings for Graphviz attributes,
//! and an opaque hex string plus separate opacity for SVG.

use std::{fmt, str::FromStr};

use color::{DynamicColor, Srgb};

/// A parsed CSS color.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Color {
    /// Parses CSS color strings such as `"#ff0000"`, `"rgb(255, 0, 0)"` or `"red"`.
    ///
    /// ```
    /// use stangraph_core::color::Color;
    ///
    /// assert!(Color::new("steelblue").is_ok());
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Red, green, blue and alpha channels in sRGB.
    pub fn to_rgba8(self) -> [u8; 4] {
        let rgba = self.color.to_alpha_color::<Srgb>().to_rgba8();
        [rgba.r, rgba.g, rgba.b, rgba.a]
    }

    /// `#rrggbb`, or `#rrggbbaa` for translucent colors.
    ///
    /// ```
    /// use stangraph_core::color::Color;
    ///
    /// assert_eq!(Color::new("red").unwrap().to_hex(), "#ff0000");
    /// ```
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == u8::MAX {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// `#rrggbb`, ignoring alpha.
    pub fn to_rgb_hex(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Opacity between `0.0` and `1.0`.
    pub fn alpha(self) -> f32 {
        f32::from(self.to_rgba8()[3]) / 255.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("black").expect("'black' is a valid CSS color")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}
