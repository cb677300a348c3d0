use std::fs;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

const BUILTIN_THEMES: [&str; 3] = ["terminal-default", "catppuccin-mocha", "gruvbox-dark"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub muted: String,
    pub timer_idle: String,
    pub timer_ready: String,
    pub timer_running: String,
    pub accent: String,
    pub border: String,
    pub border_focused: String,
    pub header_bg: String,
    pub header_fg: String,
    pub best: String,
    pub worst: String,
    pub error: String,
    pub warning: String,
}

impl Theme {
    /// User themes in `<config>/simplict/themes/<name>.toml` shadow the built-ins.
    pub fn load(name: &str) -> Option<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_theme_path = config_dir
                .join("simplict")
                .join("themes")
                .join(format!("{name}.toml"));
            if let Ok(content) = fs::read_to_string(&user_theme_path)
                && let Ok(theme) = toml::from_str::<Theme>(&content)
            {
                return Some(theme);
            }
        }
        Self::builtin(name)
    }

    pub fn builtin(name: &str) -> Option<Self> {
        let colors = match name {
            "terminal-default" => ThemeColors::terminal(),
            "catppuccin-mocha" => ThemeColors::default(),
            "gruvbox-dark" => ThemeColors::gruvbox(),
            _ => return None,
        };
        Some(Self {
            name: name.to_string(),
            colors,
        })
    }

    pub fn available_themes() -> Vec<String> {
        BUILTIN_THEMES.iter().map(|n| n.to_string()).collect()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "catppuccin-mocha".to_string(),
            colors: ThemeColors::default(),
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#1e1e2e".to_string(),
            fg: "#cdd6f4".to_string(),
            muted: "#585b70".to_string(),
            timer_idle: "#cdd6f4".to_string(),
            timer_ready: "#a6e3a1".to_string(),
            timer_running: "#f9e2af".to_string(),
            accent: "#89b4fa".to_string(),
            border: "#45475a".to_string(),
            border_focused: "#89b4fa".to_string(),
            header_bg: "#313244".to_string(),
            header_fg: "#cdd6f4".to_string(),
            best: "#a6e3a1".to_string(),
            worst: "#f38ba8".to_string(),
            error: "#f38ba8".to_string(),
            warning: "#f9e2af".to_string(),
        }
    }
}

impl ThemeColors {
    fn terminal() -> Self {
        // Named ANSI colors so the terminal palette decides.
        Self {
            bg: "reset".to_string(),
            fg: "reset".to_string(),
            muted: "darkgray".to_string(),
            timer_idle: "reset".to_string(),
            timer_ready: "green".to_string(),
            timer_running: "yellow".to_string(),
            accent: "cyan".to_string(),
            border: "darkgray".to_string(),
            border_focused: "cyan".to_string(),
            header_bg: "reset".to_string(),
            header_fg: "cyan".to_string(),
            best: "green".to_string(),
            worst: "red".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
        }
    }

    fn gruvbox() -> Self {
        Self {
            bg: "#282828".to_string(),
            fg: "#ebdbb2".to_string(),
            muted: "#665c54".to_string(),
            timer_idle: "#ebdbb2".to_string(),
            timer_ready: "#b8bb26".to_string(),
            timer_running: "#fabd2f".to_string(),
            accent: "#83a598".to_string(),
            border: "#504945".to_string(),
            border_focused: "#83a598".to_string(),
            header_bg: "#3c3836".to_string(),
            header_fg: "#ebdbb2".to_string(),
            best: "#b8bb26".to_string(),
            worst: "#fb4934".to_string(),
            error: "#fb4934".to_string(),
            warning: "#fabd2f".to_string(),
        }
    }

    /// `#rrggbb` or a named ANSI color; anything else renders white.
    pub fn parse_color(value: &str) -> Color {
        let hex = value.trim_start_matches('#');
        if value.starts_with('#') && hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Color::Rgb(r, g, b);
            }
        }
        match value.to_ascii_lowercase().as_str() {
            "reset" => Color::Reset,
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "gray" => Color::Gray,
            "darkgray" => Color::DarkGray,
            _ => Color::White,
        }
    }

    pub fn bg(&self) -> Color { Self::parse_color(&self.bg) }
    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn muted(&self) -> Color { Self::parse_color(&self.muted) }
    pub fn timer_idle(&self) -> Color { Self::parse_color(&self.timer_idle) }
    pub fn timer_ready(&self) -> Color { Self::parse_color(&self.timer_ready) }
    pub fn timer_running(&self) -> Color { Self::parse_color(&self.timer_running) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn border(&self) -> Color { Self::parse_color(&self.border) }
    pub fn border_focused(&self) -> Color { Self::parse_color(&self.border_focused) }
    pub fn header_bg(&self) -> Color { Self::parse_color(&self.header_bg) }
    pub fn header_fg(&self) -> Color { Self::parse_color(&self.header_fg) }
    pub fn best(&self) -> Color { Self::parse_color(&self.best) }
    pub fn worst(&self) -> Color { Self::parse_color(&self.worst) }
    pub fn error(&self) -> Color { Self::parse_color(&self.error) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(ThemeColors::parse_color("#ff0080"), Color::Rgb(255, 0, 128));
        assert_eq!(ThemeColors::parse_color("darkgray"), Color::DarkGray);
        assert_eq!(ThemeColors::parse_color("reset"), Color::Reset);
        assert_eq!(ThemeColors::parse_color("#zzzzzz"), Color::White);
    }

    #[test]
    fn test_every_builtin_loads() {
        for name in Theme::available_themes() {
            let theme = Theme::builtin(&name).unwrap();
            assert_eq!(theme.name, name);
        }
        assert!(Theme::builtin("no-such-theme").is_none());
    }

    #[test]
    fn test_theme_toml_roundtrip() {
        let theme = Theme::builtin("gruvbox-dark").unwrap();
        let text = toml::to_string(&theme).unwrap();
        let parsed: Theme = toml::from_str(&text).unwrap();
        assert_eq!(parsed.colors.best, "#b8bb26");
    }
}
