use std::fmt::Display;

/// An opaque sRGB color. Phase backgrounds and their text colors are expressed with it so that any
/// front-end can paint them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLUE: Color = Color::rgb(0x00, 0x00, 0xFF);
    pub const YELLOW: Color = Color::rgb(0xFF, 0xFF, 0x00);
    pub const RED: Color = Color::rgb(0xFF, 0x00, 0x00);
    /// Shown while no phase is active.
    pub const DARK_GRAY: Color = Color::rgb(0x44, 0x44, 0x44);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Relative luminance in `0.0..=1.0`, computed over linearized channels.
    pub fn luminance(&self) -> f64 {
        0.2126 * linearize(self.red) + 0.7152 * linearize(self.green) + 0.0722 * linearize(self.blue)
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl From<Color> for ansi_term::Colour {
    fn from(value: Color) -> Self {
        ansi_term::Colour::RGB(value.red, value.green, value.blue)
    }
}

fn linearize(channel: u8) -> f64 {
    let c = channel as f64 / 255.;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Picks black or white text, whichever stays readable on top of `background`.
pub fn contrast_text_color(background: Color) -> Color {
    if background.luminance() > 0.5 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}
