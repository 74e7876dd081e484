//! Application-level configuration loading: scoring limits, autosave timing,
//! local store location and the player colors palette.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{
    game::PlayerColor,
    ledger::{DEFAULT_MAX_STROKES, DEFAULT_MIN_STROKES, ScoreRange},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MINI_GOLF_CONFIG_PATH";
const DEFAULT_MAX_PLAYERS: usize = 10;
const DEFAULT_HOLES: u32 = 18;
const DEFAULT_MAX_HOLES: u32 = 36;
const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 3_000;
const DEFAULT_LOCAL_STORE_PATH: &str = "data/games.json";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    score_range: ScoreRange,
    max_players: usize,
    default_holes: u32,
    max_holes: u32,
    autosave_debounce: Duration,
    local_store_path: Option<PathBuf>,
    /// Color token to display value (hex), in offering order.
    colors: IndexMap<String, String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        colors = app_config.colors.len(),
                        max_players = app_config.max_players,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    pub fn score_range(&self) -> ScoreRange {
        self.score_range
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn default_holes(&self) -> u32 {
        self.default_holes
    }

    pub fn max_holes(&self) -> u32 {
        self.max_holes
    }

    /// Delay between the last mutation and the autosave; zero saves immediately.
    pub fn autosave_debounce(&self) -> Duration {
        self.autosave_debounce
    }

    /// File backing the local store, `None` for a memory-only store.
    pub fn local_store_path(&self) -> Option<&PathBuf> {
        self.local_store_path.as_ref()
    }

    /// Display value of a known color token.
    pub fn color_value(&self, token: &str) -> Option<&str> {
        self.colors.get(token).map(String::as_str)
    }

    /// Return the first palette color that is not already listed in `used`.
    ///
    /// `None` once every palette entry is taken.
    pub fn first_unused_color(&self, used: &[PlayerColor]) -> Option<PlayerColor> {
        self.colors
            .keys()
            .find(|candidate| used.iter().all(|existing| existing.as_str() != candidate.as_str()))
            .map(PlayerColor::new)
    }

    /// Same configuration with another debounce interval.
    pub fn with_autosave_debounce(mut self, debounce: Duration) -> Self {
        self.autosave_debounce = debounce;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    min_strokes: u8,
    max_strokes: u8,
    max_players: usize,
    default_holes: u32,
    max_holes: u32,
    autosave_debounce_ms: u64,
    local_store_path: Option<PathBuf>,
    colors: Vec<RawColor>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            min_strokes: DEFAULT_MIN_STROKES,
            max_strokes: DEFAULT_MAX_STROKES,
            max_players: DEFAULT_MAX_PLAYERS,
            default_holes: DEFAULT_HOLES,
            max_holes: DEFAULT_MAX_HOLES,
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            local_store_path: Some(PathBuf::from(DEFAULT_LOCAL_STORE_PATH)),
            colors: default_colors(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let max_holes = value.max_holes.max(1);
        let colors = value
            .colors
            .into_iter()
            .map(|color| (color.token, color.hex))
            .collect::<IndexMap<_, _>>();
        Self {
            score_range: ScoreRange::new(value.min_strokes, value.max_strokes),
            max_players: value.max_players.max(1),
            default_holes: value.default_holes.clamp(1, max_holes),
            max_holes,
            autosave_debounce: Duration::from_millis(value.autosave_debounce_ms),
            local_store_path: value.local_store_path,
            colors,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single palette entry inside the configuration file.
struct RawColor {
    token: String,
    hex: String,
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in palette shipped with the binary, one entry per allowed player.
fn default_colors() -> Vec<RawColor> {
    [
        ("red", "#e53935"),
        ("blue", "#1e88e5"),
        ("green", "#43a047"),
        ("yellow", "#fdd835"),
        ("purple", "#8e24aa"),
        ("orange", "#fb8c00"),
        ("pink", "#d81b60"),
        ("teal", "#00897b"),
        ("brown", "#6d4c41"),
        ("gray", "#757575"),
    ]
    .into_iter()
    .map(|(token, hex)| RawColor {
        token: token.into(),
        hex: hex.into(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_player_slot() {
        let config = AppConfig::default();
        assert_eq!(config.max_players(), 10);
        assert_eq!(config.score_range(), ScoreRange::new(1, 15));
        assert_eq!(config.autosave_debounce(), Duration::from_secs(3));

        let mut used = Vec::new();
        for _ in 0..config.max_players() {
            used.push(config.first_unused_color(&used).unwrap());
        }
        assert_eq!(config.first_unused_color(&used), None);
    }

    #[test]
    fn first_unused_color_skips_taken_tokens() {
        let config = AppConfig::default();
        let used = vec![PlayerColor::new("red"), PlayerColor::new("green")];
        assert_eq!(config.first_unused_color(&used), Some(PlayerColor::new("blue")));
    }

    #[test]
    fn partial_files_keep_defaults_for_missing_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "max_strokes": 8, "local_store_path": null }"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.score_range(), ScoreRange::new(1, 8));
        assert_eq!(config.local_store_path(), None);
        assert_eq!(config.default_holes(), 18);
        assert_eq!(config.color_value("teal"), Some("#00897b"));
    }

    #[test]
    fn default_holes_never_exceed_the_cap() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "default_holes": 18, "max_holes": 9 }"#).unwrap();
        assert_eq!(AppConfig::from(raw).default_holes(), 9);
    }
}
