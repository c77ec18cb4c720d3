use std::fmt;
use std::str::FromStr;

/// An 8-bit-per-channel color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel; 255 is opaque.
    pub alpha: u8,
}

impl Color {
    /// Opaque white, the neutral tint.
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    /// Builds a color from its channels.
    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Color { red, green, blue, alpha }
    }

    /// Packs the color as `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.alpha, self.red, self.green, self.blue])
    }
}

/// Error returned when a color string is not `#AARRGGBB` or `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color '{0}', expected #AARRGGBB or #RRGGBB")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parses `#AARRGGBB`, `#RRGGBB`, or either form without the leading `#`.
    ///
    /// ```
    /// let red: tiled_ir::Color = "#ff0000".parse()?;
    /// assert_eq!((red.red, red.green, red.alpha), (255, 0, 255));
    /// # Ok::<(), tiled_ir::ParseColorError>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_owned());
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        match hex.len() {
            8 => {
                let [a, r, g, b] = u32::from_str_radix(hex, 16).map_err(|_| err())?.to_be_bytes();
                Ok(Color::rgba(r, g, b, a))
            }
            6 => {
                let [_, r, g, b] = u32::from_str_radix(hex, 16).map_err(|_| err())?.to_be_bytes();
                Ok(Color::rgba(r, g, b, 255))
            }
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.to_argb())
    }
}
