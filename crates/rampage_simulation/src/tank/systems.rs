//! Tank systems

use bevy::ecs::system::SystemState;
use bevy::prelude::*;

use super::{tank_instance, Tank};
use crate::collision::{BodyScene, DynamicBody};
use crate::config::TankConfig;
use crate::entity_id::EntityIdAllocator;
use crate::render::{RenderAdapter, RenderQueue};

/// Spawn танка: entity с `Tank` + `DynamicBody`, тело уже в `BodyScene`
pub fn spawn_tank(world: &mut World, start_position: Vec3) -> Entity {
    let (tank, body) = {
        let mut state: SystemState<(ResMut<EntityIdAllocator>, ResMut<BodyScene>)> = SystemState::new(world);
        let (mut ids, mut scene) = state.get_mut(world);
        Tank::spawn(start_position, &mut ids, &mut *scene)
    };

    world
        .spawn((tank, body, Transform::from_translation(start_position)))
        .id()
}

/// Снять танк со сцены и деспавнить entity
///
/// `false`, если у entity нет танка.
pub fn despawn_tank(world: &mut World, entity: Entity) -> bool {
    let destroyed = {
        let mut state: SystemState<(Query<(&mut Tank, &mut DynamicBody)>, ResMut<BodyScene>)> =
            SystemState::new(world);
        let (mut tanks, mut scene) = state.get_mut(world);

        match tanks.get_mut(entity) {
            Ok((mut tank, mut body)) => {
                tank.destroy(&mut body, &mut *scene);
                true
            }
            Err(_) => false,
        }
    };

    if destroyed {
        world.despawn(entity);
    }
    destroyed
}

/// Система: weapon cooldown таймеры
pub fn tick_tank_fire_timers(mut tanks: Query<&mut Tank>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut tank in tanks.iter_mut() {
        tank.tick_fire_timer(delta);
    }
}

/// Система: pursuit steering активных танков
pub fn steer_tanks(mut tanks: Query<(&Tank, &mut DynamicBody)>, config: Res<TankConfig>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for (tank, mut body) in tanks.iter_mut() {
        if !tank.is_active {
            continue;
        }
        tank.steer(&mut body, delta, &config);
    }
}

/// Система: render transforms танков
pub fn submit_tank_render(tanks: Query<(&Tank, &DynamicBody)>, mut queue: ResMut<RenderQueue>) {
    let mut ordered: Vec<_> = tanks.iter().filter(|(tank, _)| !tank.is_destroyed()).collect();
    ordered.sort_by_key(|(_, body)| body.entity_id);

    for (_, body) in ordered {
        queue.submit(tank_instance(body));
    }
}
