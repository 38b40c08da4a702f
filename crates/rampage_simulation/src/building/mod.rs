//! Destructible building
//!
//! State machine:
//! - Intact (hp > 0), опционально Shaking поверх (shake_timer > 0)
//! - Collapsing (hp ≤ 0): здание уходит под землю
//! - Destroyed (terminal): снято с collision scene и health registry
//!
//! Мутации только двумя путями: damage handler (`Damageable::take_damage`)
//! и собственный `update`. Destroyed → больше никаких изменений.

use bevy::prelude::*;
use rand::Rng;

pub mod render;
pub mod systems;


pub use render::{submit_building, SegmentLattice};
pub use systems::{
    despawn_destroyed_buildings, release_removed_building, spawn_building, spawn_building_with_tier, submit_building_render, update_buildings,
    BuildingDestroyed,
};

use crate::collision::{BoxCollider, CollisionScene, DynamicBody, BUILDING_COLLISION_GROUP, COLLISION_LAYER_TANGIBLE};
use crate::config::{scaled, BuildingConfig};
use crate::entity_id::EntityIdAllocator;
use crate::error::RegistryError;
use crate::health::{DamageOutcome, DamageTarget, Damageable, DamageableKind, HealthRegistry, HealthState};

/// Размерный класс здания (число этажей)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub enum BuildingTier {
    One,
    Two,
    Three,
    Four,
}

impl BuildingTier {
    pub const ALL: [BuildingTier; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    /// Тир из uniform броска в `[0, 1)`
    ///
    /// Полосы: 12.5% / 62.5% / 20% / 5%.
    pub fn from_roll(roll: f32) -> Self {
        if roll < 0.125 {
            Self::One
        } else if roll < 0.75 {
            Self::Two
        } else if roll < 0.95 {
            Self::Three
        } else {
            Self::Four
        }
    }

    pub fn sample(rng: &mut impl Rng) -> Self {
        Self::from_roll(rng.gen::<f32>())
    }

    /// 1..=4
    pub fn level(self) -> i32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    /// Этажи поверх первого
    pub fn extra_segments(self) -> usize {
        (self.level() - 1) as usize
    }

    pub fn collider(self) -> &'static BoxCollider {
        &BUILDING_COLLIDERS[(self.level() - 1) as usize]
    }
}

const fn building_collider(half_height: f32) -> BoxCollider {
    BoxCollider {
        half_size: Vec3::new(scaled(0.5), scaled(half_height), scaled(0.5)),
        bounce: 0.0,
        friction: 0.5,
    }
}

/// Коллайдеры по тиру: +0.5 half-height на каждый этаж
pub static BUILDING_COLLIDERS: [BoxCollider; 4] = [
    building_collider(0.5),
    building_collider(1.0),
    building_collider(1.5),
    building_collider(2.0),
];

/// Производное состояние (для диагностики и тестов)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum BuildingState {
    Intact,
    Shaking,
    Collapsing,
    Destroyed,
}

/// Разрушаемое здание
///
/// Инварианты:
/// - `tier` не меняется за время жизни
/// - `hp` только уменьшается
/// - после `is_destroyed == true` никаких мутаций
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Building {
    tier: BuildingTier,
    hp: i32,
    shake_timer: f32,
    is_collapsing: bool,
    is_destroyed: bool,
    health: HealthState,
}

impl Building {
    /// Создать здание и зарегистрировать его тело и health
    ///
    /// `owner`: Bevy entity, на которую повесят компоненты (для роутинга урона).
    /// При ошибке регистрации health тело снимается со сцены обратно.
    pub fn spawn(
        owner: Entity,
        position: Vec3,
        tier: BuildingTier,
        ids: &mut EntityIdAllocator,
        scene: &mut impl CollisionScene,
        registry: &mut impl HealthRegistry,
        config: &BuildingConfig,
    ) -> Result<(Building, DynamicBody), RegistryError> {
        let entity_id = ids.next();
        let collider = *tier.collider();

        let mut body = DynamicBody::new(entity_id, collider, COLLISION_LAYER_TANGIBLE, position);
        body.collision_group = BUILDING_COLLISION_GROUP;
        // Основание коллайдера на уровне position
        body.center.y = collider.half_size.y;
        body.is_fixed = true;
        body.update_bounding_box();

        scene.add(&mut body);

        let target = DamageTarget {
            kind: Self::KIND,
            entity: owner,
        };
        if let Err(error) = registry.register(entity_id, target) {
            scene.remove(&mut body);
            return Err(error);
        }

        let building = Building {
            tier,
            hp: tier.level() * config.health_per_tier,
            shake_timer: 0.0,
            is_collapsing: false,
            is_destroyed: false,
            health: HealthState::default(),
        };

        crate::log(&format!("Building {} spawned: {:?} at {:?}", entity_id, tier, position));
        Ok((building, body))
    }

    pub fn tier(&self) -> BuildingTier {
        self.tier
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn shake_timer(&self) -> f32 {
        self.shake_timer
    }

    pub fn is_collapsing(&self) -> bool {
        self.is_collapsing
    }

    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }

    pub fn state(&self) -> BuildingState {
        if self.is_destroyed {
            BuildingState::Destroyed
        } else if self.is_collapsing {
            BuildingState::Collapsing
        } else if self.shake_timer > 0.0 {
            BuildingState::Shaking
        } else {
            BuildingState::Intact
        }
    }

    /// Per-frame update. Возвращает `true`, если здание разрушено этим вызовом.
    pub fn update(
        &mut self,
        body: &mut DynamicBody,
        delta: f32,
        scene: &mut impl CollisionScene,
        registry: &mut impl HealthRegistry,
        config: &BuildingConfig,
    ) -> bool {
        if self.is_destroyed {
            return false;
        }

        if self.shake_timer > 0.0 {
            self.shake_timer = (self.shake_timer - delta).max(0.0);
        }

        if !self.is_collapsing {
            return false;
        }

        body.position.y -= config.collapse_speed * delta;
        body.update_bounding_box();

        if body.bounding_box.max.y < 0.0 {
            return self.destroy(body, scene, registry);
        }
        false
    }

    /// Снять здание с обоих коллабораторов. Идемпотентно.
    ///
    /// Возвращает `true` только для вызова, который реально разрушил здание.
    pub fn destroy(
        &mut self,
        body: &mut DynamicBody,
        scene: &mut impl CollisionScene,
        registry: &mut impl HealthRegistry,
    ) -> bool {
        if self.is_destroyed {
            return false;
        }

        scene.remove(body);
        if let Err(error) = registry.unregister(body.entity_id) {
            crate::log_error(&format!("Building destroy: {}", error));
        }
        self.is_destroyed = true;

        crate::log_info(&format!("Building {} destroyed", body.entity_id));
        true
    }
}

impl Damageable for Building {
    const KIND: DamageableKind = DamageableKind::Building;

    type Tuning = BuildingConfig;

    fn health(&self) -> &HealthState {
        &self.health
    }

    fn take_damage(&mut self, amount: i32, config: &BuildingConfig) -> DamageOutcome {
        // Защита от double-kill
        if self.hp <= 0 {
            return DamageOutcome::Ignored;
        }

        self.hp -= amount;
        // Перезапись, не накопление
        self.shake_timer = config.shake_time;

        if self.hp <= 0 {
            self.health.is_dead = true;
            self.is_collapsing = true;
            return DamageOutcome::Killed;
        }
        DamageOutcome::Wounded
    }
}
