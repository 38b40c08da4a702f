//! Render adapter contract
//!
//! Симуляция ничего не рисует сама: контроллеры отправляют `RenderInstance`
//! (mesh + world transform) в `RenderAdapter`. Хост (движок, тесты) забирает
//! инстансы из `RenderQueue` после `PostUpdate`.

use bevy::prelude::*;

use crate::entity_id::EntityId;

/// Какой mesh рисовать
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum MeshKind {
    /// Один этаж здания
    BuildingSegment,
    Tank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstance {
    pub owner: EntityId,
    pub mesh: MeshKind,
    pub transform: Transform,
}

/// Потребитель render transforms
pub trait RenderAdapter {
    fn submit(&mut self, instance: RenderInstance);
}

impl RenderAdapter for Vec<RenderInstance> {
    fn submit(&mut self, instance: RenderInstance) {
        self.push(instance);
    }
}

/// Инстансы текущего кадра
///
/// Очищается в начале `PostUpdate`, заполняется submit-системами.
#[derive(Resource, Debug, Default)]
pub struct RenderQueue {
    instances: Vec<RenderInstance>,
}

impl RenderQueue {
    pub fn instances(&self) -> &[RenderInstance] {
        &self.instances
    }

    /// Инстансы одной сущности (в порядке отправки)
    pub fn instances_of(&self, owner: EntityId) -> impl Iterator<Item = &RenderInstance> {
        self.instances.iter().filter(move |instance| instance.owner == owner)
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl RenderAdapter for RenderQueue {
    fn submit(&mut self, instance: RenderInstance) {
        self.instances.push(instance);
    }
}

pub fn clear_render_queue(mut queue: ResMut<RenderQueue>) {
    queue.clear();
}
