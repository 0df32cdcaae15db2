use anyhow::Result;

/// An RGBA color, each channel in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb_f(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb_f(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb_f(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb_f(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb_f(0.0, 0.0, 1.0);

    pub fn rgb(r: usize, g: usize, b: usize) -> Color {
        Color::rgba(r, g, b, 1.0)
    }

    pub const fn rgb_f(r: f32, g: f32, b: f32) -> Color {
        Color { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: usize, g: usize, b: usize, a: f32) -> Color {
        Color {
            r: (r as f32) / 255.0,
            g: (g as f32) / 255.0,
            b: (b as f32) / 255.0,
            a,
        }
    }

    pub const fn grey(f: f32) -> Color {
        Color { r: f, g: f, b: f, a: 1.0 }
    }

    pub fn alpha(&self, a: f32) -> Color {
        Color { a, ..*self }
    }

    /// Parses "#RRGGBB".
    pub fn hex(raw: &str) -> Result<Color> {
        if raw.len() != 7 || !raw.starts_with('#') {
            anyhow::bail!("bad hex color {}", raw);
        }
        let r = usize::from_str_radix(&raw[1..3], 16)?;
        let g = usize::from_str_radix(&raw[3..5], 16)?;
        let b = usize::from_str_radix(&raw[5..7], 16)?;
        Ok(Color::rgb(r, g, b))
    }

    pub fn to_hex(&self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}",
            (self.r * 255.0) as usize,
            (self.g * 255.0) as usize,
            (self.b * 255.0) as usize
        )
    }
}
