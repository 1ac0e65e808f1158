// Vault platform abstraction
// Resolves where settings and the local bookmark database live on each OS.
//
// Uses `cfg(target_os)` to pick the platform-specific implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Environment variable overriding the data directory on every platform.
pub const DATA_DIR_ENV: &str = "VAULT_DATA_DIR";

/// Returns the platform-specific configuration directory for Vault.
///
/// - **Linux**: `~/.config/vault` (or `$XDG_CONFIG_HOME/vault`)
/// - **macOS**: `~/Library/Application Support/Vault`
/// - **Windows**: `%APPDATA%/Vault`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the directory holding the local bookmark database.
///
/// `$VAULT_DATA_DIR` wins when set; otherwise:
/// - **Linux**: `~/.local/share/vault` (or `$XDG_DATA_HOME/vault`)
/// - **macOS**: `~/Library/Application Support/Vault`
/// - **Windows**: `%APPDATA%/Vault`
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Default path of the local SQLite bookmark database.
pub fn default_database_path() -> PathBuf {
    get_data_dir().join("vault.db")
}
