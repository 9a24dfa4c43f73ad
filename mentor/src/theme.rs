//! Color themes for mentor.
//!
//! Two built-ins:
//!
//! - `dark` uses ANSI 16 colors and works on any terminal.
//! - `catppuccin_mocha` uses the Catppuccin Mocha palette in RGB and needs
//!   truecolor.

use mentor_core::types::MasteryBand;
use ratatui::style::Color;
use tracing::warn;

/// Every color the UI draws with.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Tab bar
    pub tab_active: Color,
    pub tab_inactive: Color,

    // Chat transcript
    pub user_message: Color,
    pub assistant_message: Color,
    /// Timestamps, intents, sources, hints.
    pub meta: Color,

    // Notices
    pub success: Color,
    pub error: Color,
    pub warning: Color,

    // Mastery bars
    pub band_high: Color,
    pub band_medium: Color,
    pub band_low: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,

    pub background: Color,
}

impl Theme {
    /// ANSI 16 colors; the fallback for unknown names.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            tab_active: Color::Cyan,
            tab_inactive: Color::Gray,

            user_message: Color::Blue,
            assistant_message: Color::Reset,
            meta: Color::DarkGray,

            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,

            band_high: Color::Green,
            band_medium: Color::Yellow,
            band_low: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,

            background: Color::Reset,
        }
    }

    /// Catppuccin Mocha, <https://github.com/catppuccin/catppuccin>.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let subtext0 = Color::Rgb(166, 173, 200); // #a6adc8
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            tab_active: lavender,
            tab_inactive: subtext0,

            user_message: blue,
            assistant_message: text,
            meta: overlay1,

            success: green,
            error: red,
            warning: peach,

            band_high: green,
            band_medium: yellow,
            band_low: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,

            background: base,
        }
    }

    /// Resolves a config theme name. Unknown names log a warning and fall
    /// back to `dark()`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    pub fn band(&self, band: MasteryBand) -> Color {
        match band {
            MasteryBand::High => self.band_high,
            MasteryBand::Medium => self.band_medium,
            MasteryBand::Low => self.band_low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_falls_back_to_dark() {
        assert_eq!(Theme::from_name("solarized").border_active, Theme::dark().border_active);
        assert_eq!(
            Theme::from_name("catppuccin_mocha").background,
            Theme::catppuccin_mocha().background
        );
    }

    #[test]
    fn bands_map_to_distinct_colors() {
        let t = Theme::dark();
        assert_eq!(t.band(MasteryBand::of(85.0)), Color::Green);
        assert_eq!(t.band(MasteryBand::of(60.0)), Color::Yellow);
        assert_eq!(t.band(MasteryBand::of(59.9)), Color::Red);
    }
}
