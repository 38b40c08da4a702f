//! Collision scene: реестр тел + простой resolver
//!
//! Контракт для контроллеров: trait `CollisionScene` (add/remove).
//! `BodyScene`: встроенная реализация: generational arena слотов, так что
//! протухший `BodyHandle` никогда не указывает на новое тело в том же слоте.
//!
//! Resolver намеренно простой (AABB push-out + гашение нормальной скорости);
//! точная shape math: вне симуляционного ядра.

use bevy::prelude::*;

use super::body::{DynamicBody, NO_COLLISION_GROUP};
use crate::entity_id::EntityId;

/// Стабильный handle тела в арене сцены
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

/// Контракт сцены, который потребляют контроллеры
pub trait CollisionScene {
    /// Зарегистрировать тело; handle сохраняется в самом теле
    fn add(&mut self, body: &mut DynamicBody);

    /// Снять тело с регистрации; повторный вызов: no-op
    fn remove(&mut self, body: &mut DynamicBody);
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    occupant: Option<EntityId>,
}

#[derive(Resource, Debug, Default)]
pub struct BodyScene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodyScene {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.entity(handle).is_some()
    }

    /// Чьё тело лежит под handle (`None` для протухшего handle)
    pub fn entity(&self, handle: BodyHandle) -> Option<EntityId> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.occupant)
    }

    pub fn contains_body(&self, body: &DynamicBody) -> bool {
        body.handle.is_some_and(|handle| self.entity(handle) == Some(body.entity_id))
    }

    /// Один physics step для зарегистрированных тел
    ///
    /// 1. Интеграция `position += velocity * dt` (fixed тела не двигаются)
    /// 2. Пересчёт bounding box
    /// 3. Попарное выталкивание пересекающихся тел
    ///
    /// Незарегистрированные тела пропускаются. Порядок `bodies` влияет на
    /// результат resolver'а: вызывающий обязан передавать стабильный порядок.
    pub fn step(&self, bodies: &mut [&mut DynamicBody], delta: f32) {
        for body in bodies.iter_mut() {
            if !self.contains_body(body) {
                continue;
            }
            if !body.is_fixed {
                body.position += body.velocity * delta;
            }
            body.update_bounding_box();
        }

        for i in 0..bodies.len() {
            let (head, tail) = bodies.split_at_mut(i + 1);
            let a = &mut *head[i];
            if !self.contains_body(a) {
                continue;
            }
            for b in tail.iter_mut() {
                if self.contains_body(b) {
                    resolve_pair(a, b);
                }
            }
        }
    }
}

impl CollisionScene for BodyScene {
    fn add(&mut self, body: &mut DynamicBody) {
        if self.contains_body(body) {
            crate::log_warning(&format!("BodyScene: body of {} is already registered", body.entity_id));
            return;
        }

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.occupant = Some(body.entity_id);
        body.handle = Some(BodyHandle {
            index,
            generation: slot.generation,
        });
        body.update_bounding_box();
        self.len += 1;
    }

    fn remove(&mut self, body: &mut DynamicBody) {
        let Some(handle) = body.handle.take() else {
            return;
        };
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return;
        };
        if slot.generation != handle.generation || slot.occupant.is_none() {
            return;
        }

        slot.occupant = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
    }
}

/// Должны ли два тела взаимодействовать
pub fn should_collide(a: &DynamicBody, b: &DynamicBody) -> bool {
    if a.is_fixed && b.is_fixed {
        return false;
    }
    if a.collision_group != NO_COLLISION_GROUP && a.collision_group == b.collision_group {
        return false;
    }
    a.collision_layer & b.collision_layer != 0
}

fn resolve_pair(a: &mut DynamicBody, b: &mut DynamicBody) {
    if !should_collide(a, b) {
        return;
    }
    let Some(push) = a.bounding_box.penetration(&b.bounding_box) else {
        return;
    };

    let bounce = a.collider.bounce.max(b.collider.bounce);
    let friction = a.collider.friction.min(b.collider.friction);
    let normal = push.normalize_or_zero();

    // Fixed тело не сдвигается: весь push достаётся подвижному
    let (push_a, push_b) = match (a.is_fixed, b.is_fixed) {
        (true, _) => (Vec3::ZERO, -push),
        (_, true) => (push, Vec3::ZERO),
        _ => (push * 0.5, -push * 0.5),
    };

    if !a.is_fixed {
        a.position += push_a;
        respond(a, normal, bounce, friction);
        a.update_bounding_box();
    }
    if !b.is_fixed {
        b.position += push_b;
        respond(b, -normal, bounce, friction);
        b.update_bounding_box();
    }
}

/// Гасим скорость, направленную против нормали выталкивания
fn respond(body: &mut DynamicBody, normal: Vec3, bounce: f32, friction: f32) {
    let approach = body.velocity.dot(normal);
    if approach >= 0.0 {
        return;
    }

    body.velocity -= normal * approach * (1.0 + bounce);

    let tangent = body.velocity - normal * body.velocity.dot(normal);
    body.velocity -= tangent * friction.clamp(0.0, 1.0);
}
