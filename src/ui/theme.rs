use std::collections::BTreeMap;

use ratatui::style::{Color, Style};

use crate::core::config::{ColorName, ColorPair, Palette, PaletteRole};

/// Terminal colour for a palette colour name.
pub fn color(name: ColorName) -> Color {
    match name {
        ColorName::Default => Color::Reset,
        ColorName::Black => Color::Black,
        ColorName::DarkRed => Color::Red,
        ColorName::DarkGreen => Color::Green,
        ColorName::Brown => Color::Yellow,
        ColorName::DarkBlue => Color::Blue,
        ColorName::DarkMagenta => Color::Magenta,
        ColorName::DarkCyan => Color::Cyan,
        ColorName::LightGray => Color::Gray,
        ColorName::DarkGray => Color::DarkGray,
        ColorName::LightRed => Color::LightRed,
        ColorName::LightGreen => Color::LightGreen,
        ColorName::Yellow => Color::LightYellow,
        ColorName::LightBlue => Color::LightBlue,
        ColorName::LightMagenta => Color::LightMagenta,
        ColorName::LightCyan => Color::LightCyan,
        ColorName::White => Color::White,
    }
}

fn style(pair: ColorPair) -> Style {
    Style::default().fg(color(pair.fg)).bg(color(pair.bg))
}

/// Resolved styles for every palette role.
#[derive(Debug, Clone)]
pub struct Theme {
    styles: BTreeMap<PaletteRole, Style>,
}

impl Theme {
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            styles: PaletteRole::ALL
                .into_iter()
                .map(|role| (role, style(palette.get(role))))
                .collect(),
        }
    }

    pub fn style(&self, role: PaletteRole) -> Style {
        self.styles.get(&role).copied().unwrap_or_default()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_palette(&Palette::default())
    }
}
