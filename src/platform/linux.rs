// linkvault paths on Linux
// Config: $XDG_CONFIG_HOME/linkvault or ~/.config/linkvault
// Data:   $XDG_DATA_HOME/linkvault or ~/.local/share/linkvault

use std::env;
use std::path::PathBuf;

fn home() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("linkvault"),
        _ => home().join(".config").join("linkvault"),
    }
}

pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("linkvault"),
        _ => home().join(".local").join("share").join("linkvault"),
    }
}
