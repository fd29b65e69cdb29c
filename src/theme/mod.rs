//! Artwork theme derivation
//!
//! One representative pixel of the cover art decides the background; the
//! foreground stays white. Bright pixels are darkened and dark pixels
//! lightened so lyric text keeps contrast. The thresholds are tunable via
//! config, not fixed rules.

use anyhow::Context;
use image::imageops::FilterType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceived luminance in 0.0..=1.0 (BT.601 weights).
    pub fn luminance(self) -> f32 {
        (0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32) / 255.0
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub background: Rgb,
    pub foreground: Rgb,
}

/// Fixed colors used while no artwork theme applies.
pub const NEUTRAL: ThemeColors = ThemeColors {
    background: Rgb::new(0x22, 0x22, 0x22),
    foreground: Rgb::new(0xFF, 0xFF, 0xFF),
};

#[derive(Debug, Clone, Copy)]
pub struct ThemeParams {
    /// Luminance above which the pixel is considered bright.
    pub luminance_threshold: f32,
    /// Darken factor for bright pixels, in percent (Qt convention:
    /// 160 divides each channel by 1.6).
    pub darken_percent: u32,
    /// Lighten factor for dark pixels, in percent (130 multiplies by 1.3).
    pub lighten_percent: u32,
}

impl Default for ThemeParams {
    fn default() -> Self {
        Self {
            luminance_threshold: 0.55,
            darken_percent: 160,
            lighten_percent: 130,
        }
    }
}

/// Derive the per-track theme from one artwork pixel.
pub fn derive(pixel: Rgb, params: &ThemeParams) -> ThemeColors {
    let background = if pixel.luminance() > params.luminance_threshold {
        scale(pixel, 100, params.darken_percent.max(1))
    } else {
        scale(pixel, params.lighten_percent, 100)
    };
    ThemeColors {
        background,
        foreground: Rgb::new(0xFF, 0xFF, 0xFF),
    }
}

fn scale(c: Rgb, num: u32, den: u32) -> Rgb {
    let ch = |v: u8| ((v as u32 * num / den).min(255)) as u8;
    Rgb::new(ch(c.r), ch(c.g), ch(c.b))
}

/// Download the artwork and reduce it to a single representative pixel.
pub async fn fetch_pixel(http: &reqwest::Client, url: &str) -> anyhow::Result<Rgb> {
    let bytes = http
        .get(url)
        .send()
        .await
        .context("send artwork request")?
        .error_for_status()
        .context("artwork http status")?
        .bytes()
        .await
        .context("read artwork bytes")?;

    let img = image::load_from_memory(&bytes).context("decode artwork")?;
    let pixel = img
        .resize_exact(1, 1, FilterType::Lanczos3)
        .to_rgb8()
        .get_pixel(0, 0)
        .0;
    Ok(Rgb::new(pixel[0], pixel[1], pixel[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bright_pixel_is_darkened() {
        let theme = derive(Rgb::new(240, 240, 240), &ThemeParams::default());
        assert!(theme.background.r < 240);
        assert_eq!(theme.background.r, (240u32 * 100 / 160) as u8);
        assert_eq!(theme.foreground, Rgb::new(0xFF, 0xFF, 0xFF));
    }

    #[test]
    fn dark_pixel_is_lightened() {
        let theme = derive(Rgb::new(40, 40, 40), &ThemeParams::default());
        assert_eq!(theme.background.r, (40u32 * 130 / 100) as u8);
        assert!(theme.background.r > 40);
    }

    #[test]
    fn lighten_clamps_at_white() {
        let params = ThemeParams {
            luminance_threshold: 1.1,
            lighten_percent: 300,
            ..ThemeParams::default()
        };
        let theme = derive(Rgb::new(200, 200, 200), &params);
        assert_eq!(theme.background, Rgb::new(255, 255, 255));
    }

    #[test]
    fn luminance_extremes() {
        assert!(Rgb::new(255, 255, 255).luminance() > 0.99);
        assert!(Rgb::new(0, 0, 0).luminance() < 0.01);
    }

    #[test]
    fn hex_display() {
        assert_eq!(Rgb::new(0x22, 0x22, 0x22).to_string(), "#222222");
        assert_eq!(NEUTRAL.foreground.to_string(), "#FFFFFF");
    }
}
