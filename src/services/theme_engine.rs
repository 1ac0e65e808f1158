//! Theme Engine: light/dark presentation toggle and the matching CSS variables.

use std::collections::HashMap;

use crate::types::errors::ThemeError;
use crate::types::settings::ThemeMode;

/// Environment variable consulted when the theme follows the system.
pub const SYSTEM_THEME_ENV: &str = "VAULT_THEME";

/// Trait defining the theme engine interface.
pub trait ThemeEngineTrait {
    fn set_theme(&mut self, mode: ThemeMode);
    fn get_theme(&self) -> &ThemeMode;
    /// Flips between dark and light, resolving `System` first. Returns the new mode.
    fn toggle(&mut self) -> ThemeMode;
    fn detect_system_theme(&self) -> ThemeMode;
    fn get_css_variables(&self) -> HashMap<String, String>;
}

struct Palette {
    background: &'static str,
    surface: &'static str,
    border: &'static str,
    text_primary: &'static str,
    text_secondary: &'static str,
    accent: &'static str,
    danger: &'static str,
}

const DARK: Palette = Palette {
    background: "#030712",
    surface: "rgba(255, 255, 255, 0.05)",
    border: "rgba(255, 255, 255, 0.10)",
    text_primary: "#ffffff",
    text_secondary: "#9ca3af",
    accent: "#60a5fa",
    danger: "#f87171",
};

const LIGHT: Palette = Palette {
    background: "#eff6ff",
    surface: "rgba(255, 255, 255, 0.70)",
    border: "rgba(229, 231, 235, 0.50)",
    text_primary: "#111827",
    text_secondary: "#4b5563",
    accent: "#2563eb",
    danger: "#dc2626",
};

/// Parses a theme name as used by the RPC surface (`"dark"`, `"light"`, `"system"`).
pub fn parse_theme(name: &str) -> Result<ThemeMode, ThemeError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "dark" => Ok(ThemeMode::Dark),
        "light" => Ok(ThemeMode::Light),
        "system" => Ok(ThemeMode::System),
        _ => Err(ThemeError::UnknownTheme(name.to_string())),
    }
}

/// The theme engine implementation.
pub struct ThemeEngine {
    current_theme: ThemeMode,
}

impl ThemeEngine {
    pub fn new(mode: ThemeMode) -> Self {
        Self { current_theme: mode }
    }

    /// Returns the effective theme, resolving `System` to a concrete mode.
    pub fn effective_theme(&self) -> ThemeMode {
        match &self.current_theme {
            ThemeMode::System => self.detect_system_theme(),
            other => other.clone(),
        }
    }
}

impl ThemeEngineTrait for ThemeEngine {
    fn set_theme(&mut self, mode: ThemeMode) {
        self.current_theme = mode;
    }

    fn get_theme(&self) -> &ThemeMode {
        &self.current_theme
    }

    fn toggle(&mut self) -> ThemeMode {
        let next = match self.effective_theme() {
            ThemeMode::Light => ThemeMode::Dark,
            _ => ThemeMode::Light,
        };
        self.current_theme = next.clone();
        next
    }

    fn detect_system_theme(&self) -> ThemeMode {
        match std::env::var(SYSTEM_THEME_ENV) {
            Ok(value) if value.to_lowercase().contains("light") => ThemeMode::Light,
            // Dark is the vault's default look.
            _ => ThemeMode::Dark,
        }
    }

    fn get_css_variables(&self) -> HashMap<String, String> {
        let palette = match self.effective_theme() {
            ThemeMode::Light => &LIGHT,
            _ => &DARK,
        };
        let mut vars = HashMap::new();
        vars.insert("--bg".into(), palette.background.into());
        vars.insert("--surface".into(), palette.surface.into());
        vars.insert("--border-color".into(), palette.border.into());
        vars.insert("--text-primary".into(), palette.text_primary.into());
        vars.insert("--text-secondary".into(), palette.text_secondary.into());
        vars.insert("--accent-color".into(), palette.accent.into());
        vars.insert("--danger-color".into(), palette.danger.into());
        vars.insert("--transition-theme".into(), "500ms".into());
        vars
    }
}
