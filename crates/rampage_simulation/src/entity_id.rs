//! Entity identity allocator
//!
//! Монотонный счётчик id. Id никогда не переиспользуются в пределах процесса,
//! поэтому коллабораторы (health registry, collision scene) могут хранить их
//! как ключи без риска перепутать живую сущность с удалённой.

use bevy::prelude::*;
use std::fmt;

/// Gameplay id сущности (не путать с Bevy `Entity`, который переиспользуется)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct EntityId(u32);

impl EntityId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Single-threaded аллокатор (живёт как Resource, доступ только из систем)
#[derive(Resource, Debug)]
pub struct EntityIdAllocator {
    next: u32,
}

impl Default for EntityIdAllocator {
    fn default() -> Self {
        // 0 зарезервирован под "нет сущности"
        Self { next: 1 }
    }
}

impl EntityIdAllocator {
    /// Выдать следующий id
    ///
    /// Исчерпание u32: ошибка программы, не recoverable состояние.
    pub fn next(&mut self) -> EntityId {
        let id = self.next;
        let Some(following) = id.checked_add(1) else {
            panic!("entity id space exhausted at {id}");
        };
        self.next = following;
        EntityId(id)
    }

    /// Сколько id уже выдано
    pub fn issued(&self) -> u32 {
        self.next - 1
    }

    #[cfg(test)]
    fn starting_at(next: u32) -> Self {
        Self { next }
    }
}
