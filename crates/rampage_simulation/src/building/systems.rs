//! Building systems (ECS wiring поверх `Building`)

use bevy::ecs::system::SystemState;
use bevy::prelude::*;

use super::{submit_building, Building, BuildingTier, SegmentLattice};
use crate::collision::{BodyScene, DynamicBody};
use crate::config::BuildingConfig;
use crate::entity_id::{EntityId, EntityIdAllocator};
use crate::error::RegistryError;
use crate::health::HealthBook;
use crate::render::RenderQueue;
use crate::DeterministicRng;

/// Событие: здание ушло под землю и снято с регистрации
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BuildingDestroyed {
    pub id: EntityId,
    pub tier: BuildingTier,
}

/// Spawn здания со случайным тиром (общий `DeterministicRng`)
pub fn spawn_building(world: &mut World, position: Vec3) -> Result<Entity, RegistryError> {
    let tier = BuildingTier::sample(&mut world.resource_mut::<DeterministicRng>().rng);
    spawn_building_with_tier(world, position, tier)
}

/// Spawn здания с заданным тиром
///
/// Создаёт entity с `Building` + `DynamicBody`, тело уже в `BodyScene`,
/// health уже в `HealthBook`.
pub fn spawn_building_with_tier(world: &mut World, position: Vec3, tier: BuildingTier) -> Result<Entity, RegistryError> {
    let entity = world.spawn_empty().id();

    let spawned = {
        let mut state: SystemState<(
            ResMut<EntityIdAllocator>,
            ResMut<BodyScene>,
            ResMut<HealthBook>,
            Res<BuildingConfig>,
        )> = SystemState::new(world);
        let (mut ids, mut scene, mut book, config) = state.get_mut(world);

        Building::spawn(entity, position, tier, &mut ids, &mut *scene, &mut *book, &config)
    };

    match spawned {
        Ok((building, body)) => {
            world.entity_mut(entity).insert((building, body, Transform::from_translation(position)));
            Ok(entity)
        }
        Err(error) => {
            world.despawn(entity);
            Err(error)
        }
    }
}

/// Система: shake timer, обрушение, разрушение
pub fn update_buildings(
    mut buildings: Query<(&mut Building, &mut DynamicBody)>,
    mut scene: ResMut<BodyScene>,
    mut book: ResMut<HealthBook>,
    config: Res<BuildingConfig>,
    time: Res<Time<Fixed>>,
    mut destroyed_events: EventWriter<BuildingDestroyed>,
) {
    let delta = time.delta_secs();

    for (mut building, mut body) in buildings.iter_mut() {
        if building.update(&mut body, delta, &mut *scene, &mut *book, &config) {
            destroyed_events.write(BuildingDestroyed {
                id: body.entity_id,
                tier: building.tier(),
            });
        }
    }
}

/// Система: деспавн разрушенных зданий
///
/// Коллабораторы к этому моменту уже не держат ссылок на entity.
pub fn despawn_destroyed_buildings(mut commands: Commands, buildings: Query<(Entity, &Building)>) {
    for (entity, building) in buildings.iter() {
        if building.is_destroyed() {
            commands.entity(entity).despawn();
        }
    }
}

/// Observer: `Building` снимается с entity (despawn хостом, remove)
///
/// Снимаем здание с коллабораторов, если это не сделал собственный destroy.
/// `destroy` идемпотентен, поэтому штатный деспавн после обрушения тут no-op.
pub fn release_removed_building(
    trigger: Trigger<OnRemove, Building>,
    mut buildings: Query<(&mut Building, &mut DynamicBody)>,
    mut scene: ResMut<BodyScene>,
    mut book: ResMut<HealthBook>,
) {
    let Ok((mut building, mut body)) = buildings.get_mut(trigger.target()) else {
        return;
    };
    building.destroy(&mut body, &mut *scene, &mut *book);
}

/// Система: отправка этажей в render queue
pub fn submit_building_render(
    buildings: Query<(&Building, &DynamicBody)>,
    lattice: Res<SegmentLattice>,
    config: Res<BuildingConfig>,
    mut rng: ResMut<DeterministicRng>,
    mut queue: ResMut<RenderQueue>,
) {
    let mut ordered: Vec<_> = buildings.iter().collect();
    // Детерминизм RNG: порядок Query не гарантирован
    ordered.sort_by_key(|(_, body)| body.entity_id);

    for (building, body) in ordered {
        submit_building(building, body, &lattice, &config, &mut rng.rng, &mut *queue);
    }
}
