//! Configuration loading and management

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::keys::Platform;

/// Default number of identical symbols shown before collapsing
pub const DEFAULT_MAX_SAME_KEY: u32 = 3;

/// Errors in configuration values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Identical consecutive symbols shown before they collapse
    pub max_same_key: u32,

    /// Overlay font size in pixels
    pub font_size: u32,

    /// Size of the repeat marker relative to `font_size`
    pub marker_scale: f32,

    /// Inactivity before the overlay hides and the sequence is cleared
    pub hide_after: Duration,

    /// Selects modifier glyphs and virtual-key decoding
    pub platform: Platform,

    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_same_key: DEFAULT_MAX_SAME_KEY,
            font_size: 32,
            marker_scale: 0.5,
            hide_after: Duration::from_millis(3000),
            platform: Platform::current(),
            socket_path: std::env::temp_dir().join("keypressed.sock"),
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = lookup("KEYPRESSED_MAX_SAME_KEY") {
            config.max_same_key = parse("KEYPRESSED_MAX_SAME_KEY", &value)?;
            if config.max_same_key == 0 {
                return Err(invalid("KEYPRESSED_MAX_SAME_KEY", value, "must be at least 1").into());
            }
        }

        if let Some(value) = lookup("KEYPRESSED_FONT_SIZE") {
            config.font_size = parse("KEYPRESSED_FONT_SIZE", &value)?;
        }

        if let Some(value) = lookup("KEYPRESSED_MARKER_SCALE") {
            let scale: f32 = parse("KEYPRESSED_MARKER_SCALE", &value)?;
            if !(scale > 0.0 && scale <= 1.0) {
                return Err(invalid("KEYPRESSED_MARKER_SCALE", value, "must be in (0, 1]").into());
            }
            config.marker_scale = scale;
        }

        if let Some(value) = lookup("KEYPRESSED_HIDE_AFTER_MS") {
            let millis: u64 = parse("KEYPRESSED_HIDE_AFTER_MS", &value)?;
            config.hide_after = Duration::from_millis(millis);
        }

        if let Some(value) = lookup("KEYPRESSED_PLATFORM") {
            config.platform = value.parse()?;
        }

        config.socket_path = match lookup("KEYPRESSED_SOCKET") {
            Some(path) => PathBuf::from(path),
            None => default_socket_path(&lookup)?,
        };

        Ok(config)
    }

    /// Font size of the collapsed repeat marker, in pixels
    pub fn marker_font_size(&self) -> u32 {
        ((self.font_size as f32 * self.marker_scale).round() as u32).max(1)
    }
}

fn default_socket_path<F>(lookup: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(runtime_dir) = lookup("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join("keypressed.sock"));
    }

    let home = lookup("HOME").context("neither XDG_RUNTIME_DIR nor HOME is set")?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("keypressed")
        .join("daemon.sock"))
}

fn parse<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(var, value.to_string(), "not a number"))
}

fn invalid(var: &'static str, value: String, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { var, value, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("HOME", "/home/someone")]).unwrap();
        assert_eq!(config.max_same_key, 3);
        assert_eq!(config.hide_after, Duration::from_millis(3000));
        assert_eq!(config.marker_font_size(), 16);
        assert_eq!(
            config.socket_path,
            PathBuf::from("/home/someone/.local/share/keypressed/daemon.sock")
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("XDG_RUNTIME_DIR", "/run/user/1000"),
            ("KEYPRESSED_MAX_SAME_KEY", "5"),
            ("KEYPRESSED_FONT_SIZE", "40"),
            ("KEYPRESSED_MARKER_SCALE", "0.25"),
            ("KEYPRESSED_HIDE_AFTER_MS", "1500"),
            ("KEYPRESSED_PLATFORM", "windows"),
        ])
        .unwrap();
        assert_eq!(config.max_same_key, 5);
        assert_eq!(config.marker_font_size(), 10);
        assert_eq!(config.hide_after, Duration::from_millis(1500));
        assert_eq!(config.platform, Platform::Windows);
        assert_eq!(config.socket_path, PathBuf::from("/run/user/1000/keypressed.sock"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(load(&[("HOME", "/h"), ("KEYPRESSED_MAX_SAME_KEY", "0")]).is_err());
        assert!(load(&[("HOME", "/h"), ("KEYPRESSED_MAX_SAME_KEY", "lots")]).is_err());
        assert!(load(&[("HOME", "/h"), ("KEYPRESSED_MARKER_SCALE", "1.5")]).is_err());
        assert!(load(&[("HOME", "/h"), ("KEYPRESSED_PLATFORM", "amiga")]).is_err());
    }

    #[test]
    fn test_explicit_socket_needs_no_home() {
        let config = load(&[("KEYPRESSED_SOCKET", "/tmp/kp.sock")]).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/kp.sock"));
        assert!(load(&[]).is_err());
    }
}
