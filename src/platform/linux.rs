// Vault platform paths for Linux
// Config: ~/.config/vault
// Data:   ~/.local/share/vault

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `$XDG_CONFIG_HOME/vault` if set, otherwise `~/.config/vault`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("vault"),
        _ => home_dir().join(".config").join("vault"),
    }
}

/// `$XDG_DATA_HOME/vault` if set, otherwise `~/.local/share/vault`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("vault"),
        _ => home_dir().join(".local").join("share").join("vault"),
    }
}
