//! Rampage Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: разрушаемые здания и танки в общей
//! collision scene. Рендер, звук, ввод и снаряды живут у хоста.
//!
//! Порядок кадра (FixedUpdate, chained):
//! 1. танки: cooldown таймеры, pursuit steering
//! 2. collision scene: интеграция + resolve
//! 3. damage dispatch (HealthBook → `Damageable::take_damage`)
//! 4. здания: shake, обрушение, разрушение, деспавн
//!
//! PostUpdate: render instances → `RenderQueue`.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod building;
pub mod collision;
pub mod config;
pub mod entity_id;
pub mod error;
pub mod health;
pub mod logger;
pub mod math;
pub mod render;
pub mod tank;

// Re-export для удобства хоста
pub use building::{spawn_building, spawn_building_with_tier, Building, BuildingDestroyed, BuildingState, BuildingTier};
pub use collision::{BodyScene, CollisionScene, DynamicBody};
pub use config::{BuildingConfig, RampageConfig, TankConfig};
pub use entity_id::{EntityId, EntityIdAllocator};
pub use error::{ConfigError, RegistryError};
pub use health::{DamageDealt, DamageEvent, DamageOutcome, Damageable, EntityDied, HealthBook, HealthRegistry};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};
pub use render::{MeshKind, RenderAdapter, RenderInstance, RenderQueue};
pub use tank::{despawn_tank, spawn_tank, Tank};

/// Главный plugin симуляции
#[derive(Default)]
pub struct RampagePlugin {
    pub config: RampageConfig,
}

impl RampagePlugin {
    pub fn with_config(config: RampageConfig) -> Self {
        Self { config }
    }
}

impl Plugin for RampagePlugin {
    fn build(&self, app: &mut App) {
        let config = &self.config;

        app.insert_resource(Time::<Fixed>::from_hz(config.fixed_hz))
            .insert_resource(DeterministicRng::new(config.seed))
            .insert_resource(config.building.clone())
            .insert_resource(config.tank.clone())
            // Решётка этажей: один раз, дальше только чтение
            .insert_resource(building::SegmentLattice::from_config(&config.building))
            .init_resource::<BodyScene>()
            .init_resource::<HealthBook>()
            .init_resource::<EntityIdAllocator>()
            .init_resource::<RenderQueue>()
            .add_event::<DamageEvent>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<BuildingDestroyed>()
            // Деспавн хостом в обход destroy не оставляет висячих регистраций
            .add_observer(building::release_removed_building)
            .add_observer(collision::release_removed_body)
            .add_systems(
                FixedUpdate,
                (
                    tank::tick_tank_fire_timers,
                    tank::steer_tanks,
                    collision::step_collision_scene,
                    health::dispatch_damage::<Building>,
                    building::update_buildings,
                    building::despawn_destroyed_buildings,
                    collision::sync_body_transforms,
                )
                    .chain(),
            )
            .add_systems(
                PostUpdate,
                (
                    render::clear_render_queue,
                    building::submit_building_render,
                    tank::submit_tank_render,
                )
                    .chain(),
            );

        log_info(&format!(
            "RampagePlugin: seed {}, fixed step {} Hz",
            config.seed, config.fixed_hz
        ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается вручную: каждый `app.update()` = ровно один fixed step
/// (кроме самого первого, где fixed schedule ещё не накопил шаг).
pub fn create_headless_app(seed: u64) -> App {
    create_headless_app_with_config(RampageConfig {
        seed,
        ..RampageConfig::default()
    })
}

pub fn create_headless_app_with_config(config: RampageConfig) -> App {
    let mut app = App::new();
    init_logger();

    let step = Duration::from_secs_f64(1.0 / config.fixed_hz);
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(step))
        .add_plugins(RampagePlugin::with_config(config));

    app
}

/// Snapshot мира для сравнения детерминизма
///
/// Сортировка по `EntityId` (не по Bevy `Entity`): id стабилен между прогонами.
pub fn world_snapshot<T>(world: &mut World) -> Vec<u8>
where
    T: Component + std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(&DynamicBody, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(body, _)| body.entity_id);

    // Сериализуем через Debug (простейший способ)
    for (body, component) in entities {
        snapshot.extend_from_slice(&body.entity_id.raw().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
