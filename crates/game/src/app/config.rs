use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::gameplay::{GRID_COLUMNS, GRID_ROWS, HUD_ROWS};

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read game config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse game config {path} at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("game config {path} failed validation at {field}: {message}")]
    Invalid {
        path: PathBuf,
        field: String,
        message: String,
    },
}

/// Rules loaded from `assets/game.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) player_name: String,
    pub(crate) starting_lives: u32,
    pub(crate) starting_gold: u32,
    pub(crate) tower_cost: u32,
    /// Gold paid out when a wave is cleared.
    pub(crate) wave_bonus: u32,
    pub(crate) tower: TowerRules,
    /// Grid cells `[column, row]`; consecutive cells share a row or column.
    pub(crate) path: Vec<[i32; 2]>,
    pub(crate) waves: Vec<WaveRules>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_name: "PLAYER".to_string(),
            starting_lives: 10,
            starting_gold: 60,
            tower_cost: 25,
            wave_bonus: 15,
            tower: TowerRules::default(),
            path: vec![
                [0, 4],
                [8, 4],
                [8, 12],
                [18, 12],
                [18, 6],
                [26, 6],
                [26, 14],
                [30, 14],
            ],
            waves: vec![
                WaveRules {
                    count: 6,
                    spawn_interval: 1.0,
                    health: 3.0,
                    speed: 40.0,
                    reward: 5,
                },
                WaveRules {
                    count: 10,
                    spawn_interval: 0.8,
                    health: 4.0,
                    speed: 45.0,
                    reward: 5,
                },
                WaveRules {
                    count: 14,
                    spawn_interval: 0.6,
                    health: 6.0,
                    speed: 50.0,
                    reward: 6,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TowerRules {
    pub(crate) range: f32,
    pub(crate) cooldown_seconds: f32,
    pub(crate) damage: f32,
    pub(crate) projectile_speed: f32,
}

impl Default for TowerRules {
    fn default() -> Self {
        Self {
            range: 70.0,
            cooldown_seconds: 0.7,
            damage: 1.0,
            projectile_speed: 240.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WaveRules {
    pub(crate) count: u32,
    pub(crate) spawn_interval: f32,
    pub(crate) health: f32,
    pub(crate) speed: f32,
    pub(crate) reward: u32,
}

impl GameConfig {
    /// Waves past the configured list repeat the last one, harder each time.
    pub(crate) fn wave_rules(&self, number: u32) -> WaveRules {
        let index = number.saturating_sub(1) as usize;
        if let Some(rules) = self.waves.get(index) {
            return *rules;
        }
        let Some(last) = self.waves.last().copied() else {
            return WaveRules {
                count: 1,
                spawn_interval: 1.0,
                health: 1.0,
                speed: 40.0,
                reward: 1,
            };
        };
        let extra = (index + 1 - self.waves.len()) as u32;
        WaveRules {
            count: last.count + 2 * extra,
            spawn_interval: (last.spawn_interval * 0.95f32.powi(extra as i32)).max(0.2),
            health: last.health * 1.25f32.powi(extra as i32),
            speed: last.speed + 2.0 * extra as f32,
            reward: last.reward,
        }
    }

    fn validate(&self) -> Result<(), (String, String)> {
        if self.starting_lives == 0 {
            return Err(expected_actual("starting_lives", "at least 1", 0));
        }
        if self.path.len() < 2 {
            return Err(expected_actual(
                "path",
                "at least 2 cells",
                self.path.len(),
            ));
        }
        for (index, [column, row]) in self.path.iter().copied().enumerate() {
            if !(0..GRID_COLUMNS).contains(&column) || !(HUD_ROWS..GRID_ROWS).contains(&row) {
                return Err(expected_actual(
                    &format!("path[{index}]"),
                    format!("cell inside columns 0..{GRID_COLUMNS}, rows {HUD_ROWS}..{GRID_ROWS}"),
                    format!("[{column}, {row}]"),
                ));
            }
        }
        for (index, pair) in self.path.windows(2).enumerate() {
            let ([c0, r0], [c1, r1]) = (pair[0], pair[1]);
            if (c0 == c1) == (r0 == r1) {
                return Err((
                    format!("path[{}]", index + 1),
                    "must differ from the previous cell along exactly one axis".to_string(),
                ));
            }
        }

        let tower = &self.tower;
        for (field, value) in [
            ("tower.range", tower.range),
            ("tower.cooldown_seconds", tower.cooldown_seconds),
            ("tower.damage", tower.damage),
            ("tower.projectile_speed", tower.projectile_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(expected_actual(field, "positive number", value));
            }
        }

        if self.waves.is_empty() {
            return Err(("waves".to_string(), "at least one wave is required".to_string()));
        }
        for (index, wave) in self.waves.iter().enumerate() {
            if wave.count == 0 {
                return Err(expected_actual(&format!("waves[{index}].count"), "at least 1", 0));
            }
            if !wave.spawn_interval.is_finite() || wave.spawn_interval < 0.0 {
                return Err(expected_actual(
                    &format!("waves[{index}].spawn_interval"),
                    "non-negative number",
                    wave.spawn_interval,
                ));
            }
            for (name, value) in [("health", wave.health), ("speed", wave.speed)] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(expected_actual(
                        &format!("waves[{index}].{name}"),
                        "positive number",
                        value,
                    ));
                }
            }
        }
        Ok(())
    }
}

fn expected_actual(
    field: &str,
    expected: impl std::fmt::Display,
    actual: impl std::fmt::Display,
) -> (String, String) {
    (field.to_string(), format!("expected {expected}, got {actual}"))
}

/// A missing file means defaults; anything else must parse and validate.
pub(crate) fn load_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "game_config_default");
            return Ok(GameConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let config = parse_config(&raw, path)?;
    info!(
        path = %path.display(),
        waves = config.waves.len(),
        path_cells = config.path.len(),
        "game_config_loaded"
    );
    Ok(config)
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: GameConfig =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let field = match error.path().to_string() {
                field if field.is_empty() || field == "." => "<root>".to_string(),
                field => field,
            };
            ConfigError::Parse {
                path: path.to_path_buf(),
                field,
                source: error.into_inner(),
            }
        })?;
    config
        .validate()
        .map_err(|(field, message)| ConfigError::Invalid {
            path: path.to_path_buf(),
            field,
            message,
        })?;
    Ok(config)
}
