//! Quiz configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::model::Operator;

/// Top-level mathquiz configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Time allowed per question in milliseconds.
    #[serde(default = "default_time_limit")]
    pub time_limit_ms: u64,
    /// Countdown display granularity in milliseconds.
    #[serde(default = "default_tick")]
    pub tick_ms: u64,
    /// Lives at the start of a game.
    #[serde(default = "default_lives")]
    pub starting_lives: u32,
    /// Points awarded per correct answer.
    #[serde(default = "default_points")]
    pub points_per_correct: u32,
    /// Mode to play when none is given on the command line.
    #[serde(default)]
    pub default_mode: Option<Operator>,
}

fn default_time_limit() -> u64 {
    10_000
}
fn default_tick() -> u64 {
    1_000
}
fn default_lives() -> u32 {
    3
}
fn default_points() -> u32 {
    10
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: default_time_limit(),
            tick_ms: default_tick(),
            starting_lives: default_lives(),
            points_per_correct: default_points(),
            default_mode: None,
        }
    }
}

impl QuizConfig {
    /// Check that the values make a playable game.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.time_limit_ms >= 1, "time_limit_ms must be at least 1");
        anyhow::ensure!(self.tick_ms >= 1, "tick_ms must be at least 1");
        anyhow::ensure!(
            self.tick_ms <= self.time_limit_ms,
            "tick_ms ({}) must not exceed time_limit_ms ({})",
            self.tick_ms,
            self.time_limit_ms
        );
        anyhow::ensure!(self.starting_lives >= 1, "starting_lives must be at least 1");
        anyhow::ensure!(
            self.points_per_correct >= 1,
            "points_per_correct must be at least 1"
        );
        Ok(())
    }

    /// Fit the tick inside the time limit, then validate.
    ///
    /// Call once every override has been applied.
    pub fn finalize(mut self) -> Result<Self> {
        self.tick_ms = self.tick_ms.min(self.time_limit_ms);
        self.validate()?;
        Ok(self)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            time_limit: Duration::from_millis(self.time_limit_ms),
            tick: Duration::from_millis(self.tick_ms),
            starting_lives: self.starting_lives,
            points_per_correct: self.points_per_correct,
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `mathquiz.toml` in the current directory
/// 2. `~/.config/mathquiz/config.toml`
///
/// Environment variable overrides: `MATHQUIZ_TIME_LIMIT_MS`, `MATHQUIZ_LIVES`.
///
/// Values are not checked here so later overrides can still fix them; run
/// [`QuizConfig::finalize`] before use.
pub fn load_config() -> Result<QuizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("mathquiz.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            toml::from_str::<QuizConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizConfig::default(),
    };

    // Apply env var overrides
    if let Ok(value) = std::env::var("MATHQUIZ_TIME_LIMIT_MS") {
        config.time_limit_ms = value
            .trim()
            .parse()
            .with_context(|| format!("invalid MATHQUIZ_TIME_LIMIT_MS: '{value}'"))?;
    }
    if let Ok(value) = std::env::var("MATHQUIZ_LIVES") {
        config.starting_lives = value
            .trim()
            .parse()
            .with_context(|| format!("invalid MATHQUIZ_LIVES: '{value}'"))?;
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("mathquiz"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = QuizConfig::default();
        assert_eq!(config.time_limit_ms, 10_000);
        assert_eq!(config.tick_ms, 1_000);
        assert_eq!(config.starting_lives, 3);
        assert_eq!(config.points_per_correct, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
time_limit_ms = 5000
default_mode = "multiply"
"#;
        let config: QuizConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.time_limit_ms, 5_000);
        assert_eq!(config.starting_lives, 3);
        assert_eq!(config.default_mode, Some(Operator::Multiply));

        let engine = config.engine_config();
        assert_eq!(engine.time_limit, Duration::from_secs(5));
        assert_eq!(engine.tick, Duration::from_secs(1));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.toml");
        std::fs::write(&path, "starting_lives = 5\ntick_ms = 500\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.tick_ms, 500);
        // MATHQUIZ_LIVES may be set by the environment running the tests.
        if std::env::var("MATHQUIZ_LIVES").is_err() {
            assert_eq!(config.starting_lives, 5);
        }
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config_from(Some(Path::new("/no/such/mathquiz.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = QuizConfig {
            tick_ms: 20_000,
            ..QuizConfig::default()
        };
        assert!(config.validate().is_err());

        let config = QuizConfig {
            starting_lives: 0,
            ..QuizConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn finalize_fits_tick_to_short_time_limit() {
        let config = QuizConfig {
            time_limit_ms: 500,
            ..QuizConfig::default()
        }
        .finalize()
        .unwrap();
        assert_eq!(config.tick_ms, 500);

        let err = QuizConfig {
            starting_lives: 0,
            ..QuizConfig::default()
        }
        .finalize()
        .unwrap_err();
        assert!(err.to_string().contains("starting_lives must be at least 1"));
    }

    #[test]
    fn loading_leaves_checks_to_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.toml");
        std::fs::write(&path, "time_limit_ms = 500\nstarting_lives = 0\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        if std::env::var("MATHQUIZ_TIME_LIMIT_MS").is_err() {
            assert_eq!(config.time_limit_ms, 500);
            assert_eq!(config.tick_ms, 1_000);
        }
        if std::env::var("MATHQUIZ_LIVES").is_err() {
            assert!(config.finalize().is_err());
        }
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "time_limit_ms = \"soon\"").unwrap();

        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }
}
