//! Collision module
//!
//! - body: `DynamicBody`, box collider, bounding box, layer/group константы
//! - scene: контракт `CollisionScene` + встроенная `BodyScene` (arena + resolver)

use bevy::prelude::*;

pub mod body;
pub mod scene;

pub use body::{
    BoundingBox, BoxCollider, DynamicBody, BUILDING_COLLISION_GROUP, COLLISION_LAYER_PROJECTILES,
    COLLISION_LAYER_TANGIBLE, NO_COLLISION_GROUP,
};
pub use scene::{BodyHandle, BodyScene, CollisionScene};

/// Система: physics step для всех зарегистрированных тел
///
/// Сортируем по EntityId: порядок Query не гарантирован, а resolver от
/// порядка зависит.
pub fn step_collision_scene(
    scene: Res<BodyScene>,
    mut bodies: Query<&mut DynamicBody>,
    time: Res<Time<Fixed>>,
) {
    let mut registered: Vec<&mut DynamicBody> = bodies
        .iter_mut()
        .map(|body| body.into_inner())
        .filter(|body| scene.contains_body(body))
        .collect();

    registered.sort_by_key(|body| body.entity_id);
    scene.step(&mut registered, time.delta_secs());
}

/// Observer: тело уходит с entity, слот в сцене освобождается
///
/// Покрывает деспавн танка или здания хостом в обход controller destroy.
pub fn release_removed_body(
    trigger: Trigger<OnRemove, DynamicBody>,
    mut bodies: Query<&mut DynamicBody>,
    mut scene: ResMut<BodyScene>,
) {
    let Ok(mut body) = bodies.get_mut(trigger.target()) else {
        return;
    };
    if body.is_registered() {
        crate::log(&format!("BodyScene: {} removed with its entity", body.entity_id));
        scene.remove(&mut body);
    }
}

/// Система: копия позиции/ориентации тела в `Transform` (для хоста)
pub fn sync_body_transforms(mut bodies: Query<(&DynamicBody, &mut Transform), Changed<DynamicBody>>) {
    for (body, mut transform) in bodies.iter_mut() {
        transform.translation = body.position;
        transform.rotation = crate::math::quat_from_planar_rotation(body.rotation);
    }
}
