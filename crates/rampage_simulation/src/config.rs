//! Tuning constants и runtime config
//!
//! Все размерные величины проходят через один масштаб `WORLD_SCALE`
//! (метры симуляции → единицы мира хоста). Дефолты конфигов = константы ниже.
//!
//! Config грузится из TOML один раз при старте, отсутствующие поля берутся
//! из `Default`:
//!
//! ```toml
//! seed = 7
//!
//! [building]
//! collapse_speed = 0.75
//!
//! [tank]
//! top_speed = 1.0
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::math::complex_from_angle;

/// Единый масштаб для всех размерных констант
pub const WORLD_SCALE: f32 = 1.0;

/// Применить `WORLD_SCALE` к размерной величине
pub const fn scaled(value: f32) -> f32 {
    value * WORLD_SCALE
}

/// Частота fixed timestep (64Hz: шаг 1/64 точно представим во float)
pub const FIXED_HZ: f64 = 64.0;

pub const DEFAULT_SEED: u64 = 42;

// --- Building ---

/// Сколько секунд трясётся здание после не-летального урона
pub const SHAKE_TIME: f32 = 0.5;
pub const SHAKE_AMPLITUDE: f32 = scaled(0.03);
/// Скорость погружения рушащегося здания (единиц/сек)
pub const COLLAPSE_SPEED: f32 = scaled(0.5);
pub const SEGMENT_HEIGHT: f32 = scaled(1.0);
/// HP на один этаж (tier)
pub const BUILDING_HEALTH: i32 = 2;

// --- Tank ---

pub const TANK_SPEED: f32 = scaled(0.5);
pub const TANK_ACCEL: f32 = scaled(0.5);
/// Максимальный поворот за один simulation step (радианы)
pub const TANK_TURN_STEP: f32 = 1.0 / 30.0;
pub const TANK_FIRE_COOLDOWN: f32 = 1.0;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    pub shake_time: f32,
    pub shake_amplitude: f32,
    pub collapse_speed: f32,
    pub segment_height: f32,
    pub health_per_tier: i32,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            shake_time: SHAKE_TIME,
            shake_amplitude: SHAKE_AMPLITUDE,
            collapse_speed: COLLAPSE_SPEED,
            segment_height: SEGMENT_HEIGHT,
            health_per_tier: BUILDING_HEALTH,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankConfig {
    pub top_speed: f32,
    pub acceleration: f32,
    /// Радианы за step, не умножается на dt (шаг симуляции фиксирован)
    pub max_turn_step: f32,
    pub fire_cooldown: f32,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            top_speed: TANK_SPEED,
            acceleration: TANK_ACCEL,
            max_turn_step: TANK_TURN_STEP,
            fire_cooldown: TANK_FIRE_COOLDOWN,
        }
    }
}

impl TankConfig {
    /// Max turn step как единичное комплексное число (cos, sin)
    pub fn turn_step(&self) -> Vec2 {
        complex_from_angle(self.max_turn_step)
    }
}

/// Корневой config симуляции
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampageConfig {
    pub seed: u64,
    pub fixed_hz: f64,
    pub building: BuildingConfig,
    pub tank: TankConfig,
}

impl Default for RampageConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            fixed_hz: FIXED_HZ,
            building: BuildingConfig::default(),
            tank: TankConfig::default(),
        }
    }
}

impl RampageConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверка значений, на которых ломаются инварианты симуляции
    ///
    /// Ноль/минус в `fixed_hz` роняет fixed timestep, неположительная
    /// `collapse_speed` не даёт зданию уйти под землю.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.fixed_hz.is_finite() && self.fixed_hz > 0.0, "fixed_hz", "must be positive")?;

        let building = &self.building;
        ensure(building.collapse_speed > 0.0, "building.collapse_speed", "must be positive")?;
        ensure(building.shake_time > 0.0, "building.shake_time", "must be positive")?;
        ensure(building.health_per_tier > 0, "building.health_per_tier", "must be positive")?;

        let tank = &self.tank;
        ensure(tank.acceleration >= 0.0, "tank.acceleration", "must not be negative")?;
        ensure(tank.top_speed >= 0.0, "tank.top_speed", "must not be negative")?;
        ensure(tank.max_turn_step > 0.0, "tank.max_turn_step", "must be positive")?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

fn ensure(condition: bool, field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = RampageConfig::default();
        assert_eq!(config.building.shake_time, SHAKE_TIME);
        assert_eq!(config.building.collapse_speed, COLLAPSE_SPEED);
        assert_eq!(config.building.health_per_tier, 2);
        assert_eq!(config.tank.max_turn_step, 1.0 / 30.0);
        assert_eq!(config.fixed_hz, 64.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RampageConfig::from_toml_str(
            r#"
            seed = 7

            [building]
            collapse_speed = 0.75
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.building.collapse_speed, 0.75);
        assert_eq!(config.building.shake_time, SHAKE_TIME);
        assert_eq!(config.tank, TankConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result = RampageConfig::from_toml_str("seed = \"not a number\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = RampageConfig::load("/definitely/not/here/rampage.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_turn_step_is_unit_complex() {
        let step = TankConfig::default().turn_step();
        assert!((step.length() - 1.0).abs() < 1e-6);
        assert!((step.y.atan2(step.x) - TANK_TURN_STEP).abs() < 1e-6);
    }

    fn rejected_field(source: &str) -> &'static str {
        match RampageConfig::from_toml_str(source) {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected Invalid for {:?}, got {:?}", source, other),
        }
    }

    #[test]
    fn test_zero_fixed_hz_is_rejected() {
        assert_eq!(rejected_field("fixed_hz = 0.0"), "fixed_hz");
        assert_eq!(rejected_field("fixed_hz = -64.0"), "fixed_hz");
    }

    #[test]
    fn test_non_positive_collapse_speed_is_rejected() {
        assert_eq!(rejected_field("[building]\ncollapse_speed = 0.0"), "building.collapse_speed");
        assert_eq!(rejected_field("[building]\ncollapse_speed = -0.5"), "building.collapse_speed");
    }

    #[test]
    fn test_non_positive_shake_time_is_rejected() {
        assert_eq!(rejected_field("[building]\nshake_time = 0.0"), "building.shake_time");
    }

    #[test]
    fn test_non_positive_health_is_rejected() {
        assert_eq!(rejected_field("[building]\nhealth_per_tier = 0"), "building.health_per_tier");
    }

    #[test]
    fn test_negative_tank_motion_is_rejected() {
        assert_eq!(rejected_field("[tank]\nacceleration = -1.0"), "tank.acceleration");
        assert_eq!(rejected_field("[tank]\ntop_speed = -0.1"), "tank.top_speed");
        assert_eq!(rejected_field("[tank]\nmax_turn_step = 0.0"), "tank.max_turn_step");
    }

    #[test]
    fn test_defaults_pass_validation() {
        assert!(RampageConfig::default().validate().is_ok());
        // Стоящий танк допустим
        assert!(RampageConfig::from_toml_str("[tank]\ntop_speed = 0.0").is_ok());
    }
}
