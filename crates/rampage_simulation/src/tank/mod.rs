//! Tank: враждебный юнит с pursuit steering
//!
//! Каждый fixed step танк:
//! 1. считает планарный вектор к цели (Y игнорируется)
//! 2. поворачивает heading к нему не больше чем на `max_turn_step`
//! 3. выровнен → разгоняется к `top_speed` вдоль цели, иначе тормозит
//!
//! Цель выставляет внешний AI driver (`Tank::set_target`).
//! Интеграцию позиции делает collision scene.

use bevy::prelude::*;

pub mod systems;


pub use systems::{despawn_tank, spawn_tank, steer_tanks, submit_tank_render, tick_tank_fire_timers};

use crate::collision::{BoxCollider, CollisionScene, DynamicBody, COLLISION_LAYER_TANGIBLE};
use crate::config::{scaled, TankConfig};
use crate::entity_id::EntityIdAllocator;
use crate::math::{move_towards, normalize_planar, planar, quat_from_planar_rotation, rotate_towards};
use crate::render::{MeshKind, RenderInstance};

pub static TANK_COLLIDER: BoxCollider = BoxCollider {
    half_size: Vec3::new(scaled(1.06136 * 0.5), scaled(0.63024 * 0.5), scaled(1.27636 * 0.5)),
    bounce: 0.0,
    friction: 0.0,
};

/// Слот снаряда танка
///
/// Сам полёт снаряда живёт во внешней подсистеме; танк только помнит,
/// что его снаряд ещё в воздухе.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub struct ProjectileSlot {
    pub in_flight: bool,
}

/// Результат одного шага steering'а
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringOutcome {
    /// Heading совпал с направлением на цель, разгон
    Aligned,
    /// Поворот в процессе, торможение
    Turning,
    /// Стоим на цели, heading не меняется, торможение
    Holding,
}

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Tank {
    pub current_target: Vec3,
    /// Неактивные танки не рулят (cutscene, пауза волны)
    pub is_active: bool,
    /// Cooldown оружия (секунды, уменьшается до 0)
    pub fire_timer: f32,
    pub projectile: ProjectileSlot,
    is_destroyed: bool,
}

impl Tank {
    /// Создать танк и зарегистрировать тело в collision scene
    ///
    /// Стартовая цель = стартовая позиция (танк стоит на месте).
    pub fn spawn(
        start_position: Vec3,
        ids: &mut EntityIdAllocator,
        scene: &mut impl CollisionScene,
    ) -> (Tank, DynamicBody) {
        let entity_id = ids.next();

        let mut body = DynamicBody::new(entity_id, TANK_COLLIDER, COLLISION_LAYER_TANGIBLE, start_position);
        body.center.y = TANK_COLLIDER.half_size.y;
        body.update_bounding_box();

        scene.add(&mut body);

        let tank = Tank {
            current_target: start_position,
            is_active: true,
            fire_timer: 0.0,
            projectile: ProjectileSlot::default(),
            is_destroyed: false,
        };

        crate::log(&format!("Tank {} spawned at {:?}", entity_id, start_position));
        (tank, body)
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.current_target = target;
    }

    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }

    /// Один шаг pursuit steering'а: пишет velocity и heading в тело
    pub fn steer(&self, body: &mut DynamicBody, delta: f32, config: &TankConfig) -> SteeringOutcome {
        let max_delta = config.acceleration * delta;
        let offset = planar(self.current_target - body.position);

        let Some(desired) = normalize_planar(offset) else {
            brake(body, max_delta);
            return SteeringOutcome::Holding;
        };

        let (heading, aligned) = rotate_towards(body.heading(), desired, config.turn_step());
        body.set_heading(heading);

        if aligned {
            let target_velocity = desired * config.top_speed;
            body.velocity.x = move_towards(body.velocity.x, target_velocity.x, max_delta);
            body.velocity.z = move_towards(body.velocity.z, target_velocity.y, max_delta);
            SteeringOutcome::Aligned
        } else {
            brake(body, max_delta);
            SteeringOutcome::Turning
        }
    }

    pub fn can_fire(&self) -> bool {
        self.fire_timer <= 0.0 && !self.projectile.in_flight
    }

    pub fn tick_fire_timer(&mut self, delta: f32) {
        if self.fire_timer > 0.0 {
            self.fire_timer = (self.fire_timer - delta).max(0.0);
        }
    }

    pub fn reset_fire_timer(&mut self, config: &TankConfig) {
        self.fire_timer = config.fire_cooldown;
    }

    /// Занять слот снаряда, если оружие готово
    ///
    /// Возвращает `true`, если выстрел разрешён (таймер сброшен).
    pub fn try_fire(&mut self, config: &TankConfig) -> bool {
        if self.is_destroyed || !self.can_fire() {
            return false;
        }
        self.projectile.in_flight = true;
        self.reset_fire_timer(config);
        true
    }

    /// Снаряд долетел / исчез
    pub fn release_projectile(&mut self) {
        self.projectile.in_flight = false;
    }

    /// Снять тело со сцены. Идемпотентно.
    pub fn destroy(&mut self, body: &mut DynamicBody, scene: &mut impl CollisionScene) -> bool {
        if self.is_destroyed {
            return false;
        }

        scene.remove(body);
        self.is_destroyed = true;
        self.is_active = false;
        body.velocity = Vec3::ZERO;

        crate::log_info(&format!("Tank {} destroyed", body.entity_id));
        true
    }
}

fn brake(body: &mut DynamicBody, max_delta: f32) {
    body.velocity.x = move_towards(body.velocity.x, 0.0, max_delta);
    body.velocity.z = move_towards(body.velocity.z, 0.0, max_delta);
}

/// Render transform танка: позиция тела + поворот вокруг +Y
pub fn tank_instance(body: &DynamicBody) -> RenderInstance {
    RenderInstance {
        owner: body.entity_id,
        mesh: MeshKind::Tank,
        transform: Transform {
            translation: body.position,
            rotation: quat_from_planar_rotation(body.rotation),
            scale: Vec3::ONE,
        },
    }
}
