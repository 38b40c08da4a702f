//! Health registry и damage dispatch
//!
//! Архитектура:
//! - Источник урона (снаряд, игрок, скрипт) пишет `DamageEvent { target, amount }`
//! - `HealthBook` знает, какая Bevy entity и какого вида стоит за `EntityId`
//! - `dispatch_damage::<T>` (по одной инстанции на вид) вызывает
//!   `Damageable::take_damage` у компонента цели
//! - Результат: `DamageDealt` (каждый принятый удар), `EntityDied` (переход в мёртвые)
//!
//! Контракт для контроллеров: trait `HealthRegistry` (register/unregister).

use bevy::ecs::component::Mutable;
use bevy::prelude::*;
use std::collections::HashMap;

use crate::entity_id::EntityId;
use crate::error::RegistryError;

/// Виды сущностей, принимающих урон
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum DamageableKind {
    Building,
}

/// Health flag, который выставляет damage handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub struct HealthState {
    pub is_dead: bool,
}

/// Куда роутить урон для зарегистрированного id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageTarget {
    pub kind: DamageableKind,
    pub entity: Entity,
}

/// Результат одного вызова damage handler'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum DamageOutcome {
    /// Цель уже мертва: урон проигнорирован
    Ignored,
    /// Урон принят, цель жива
    Wounded,
    /// Этот удар убил цель
    Killed,
}

/// Сущность, принимающая урон через health registry
pub trait Damageable {
    const KIND: DamageableKind;

    /// Тюнинг, нужный handler'у (живёт как Resource)
    type Tuning: Resource;

    fn health(&self) -> &HealthState;

    /// Damage handler. `amount` неотрицателен (precondition, не проверяется).
    fn take_damage(&mut self, amount: i32, tuning: &Self::Tuning) -> DamageOutcome;
}

/// Контракт health registry для контроллеров
///
/// Инвариант: не больше одной живой регистрации на id.
pub trait HealthRegistry {
    fn register(&mut self, id: EntityId, target: DamageTarget) -> Result<(), RegistryError>;

    fn unregister(&mut self, id: EntityId) -> Result<(), RegistryError>;
}

#[derive(Resource, Debug, Default)]
pub struct HealthBook {
    records: HashMap<EntityId, DamageTarget>,
}

impl HealthBook {
    pub fn target(&self, id: EntityId) -> Option<DamageTarget> {
        self.records.get(&id).copied()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HealthRegistry for HealthBook {
    fn register(&mut self, id: EntityId, target: DamageTarget) -> Result<(), RegistryError> {
        if self.records.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        self.records.insert(id, target);
        Ok(())
    }

    fn unregister(&mut self, id: EntityId) -> Result<(), RegistryError> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(RegistryError::NotRegistered(id))
    }
}

/// Запрос урона от внешнего источника
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub target: EntityId,
    pub amount: i32,
}

/// Событие: урон принят handler'ом
///
/// Используется для UI, звуков, эффектов.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageDealt {
    pub target: EntityId,
    pub amount: i32,
    pub outcome: DamageOutcome,
}

/// Событие: сущность умерла (ровно один раз на сущность)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EntityDied {
    pub id: EntityId,
    pub kind: DamageableKind,
}

/// Система: роутинг `DamageEvent` к компонентам вида `T`
///
/// События для незарегистрированных id отбрасываются с warning.
/// События для других видов пропускаются молча: их обработает своя инстанция.
pub fn dispatch_damage<T>(
    mut damage_events: EventReader<DamageEvent>,
    book: Res<HealthBook>,
    tuning: Res<T::Tuning>,
    mut targets: Query<&mut T>,
    mut damage_dealt: EventWriter<DamageDealt>,
    mut entity_died: EventWriter<EntityDied>,
) where
    T: Component<Mutability = Mutable> + Damageable,
{
    for event in damage_events.read() {
        let Some(target) = book.target(event.target) else {
            crate::log_warning(&format!("DamageEvent: {} has no health registration, dropped", event.target));
            continue;
        };
        if target.kind != T::KIND {
            continue;
        }

        let Ok(mut damageable) = targets.get_mut(target.entity) else {
            crate::log_warning(&format!(
                "DamageEvent: {} registered to {:?} but entity has no {:?} component",
                event.target,
                target.entity,
                T::KIND
            ));
            continue;
        };

        let outcome = damageable.take_damage(event.amount, &tuning);
        if outcome == DamageOutcome::Ignored {
            continue;
        }

        damage_dealt.write(DamageDealt {
            target: event.target,
            amount: event.amount,
            outcome,
        });

        if outcome == DamageOutcome::Killed {
            entity_died.write(EntityDied {
                id: event.target,
                kind: T::KIND,
            });
            crate::log_info(&format!("{:?} {} killed", T::KIND, event.target));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_id::EntityIdAllocator;

    fn building_target() -> DamageTarget {
        DamageTarget {
            kind: DamageableKind::Building,
            entity: Entity::PLACEHOLDER,
        }
    }

    #[test]
    fn test_register_then_lookup() {
        let mut ids = EntityIdAllocator::default();
        let mut book = HealthBook::default();
        let id = ids.next();

        book.register(id, building_target()).unwrap();
        assert!(book.contains(id));
        assert_eq!(book.target(id), Some(building_target()));
    }

    #[test]
    fn test_double_register_is_error() {
        let mut ids = EntityIdAllocator::default();
        let mut book = HealthBook::default();
        let id = ids.next();

        book.register(id, building_target()).unwrap();
        assert_eq!(
            book.register(id, building_target()),
            Err(RegistryError::AlreadyRegistered(id))
        );
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_unregister_unknown_is_error() {
        let mut ids = EntityIdAllocator::default();
        let mut book = HealthBook::default();
        let id = ids.next();

        assert_eq!(book.unregister(id), Err(RegistryError::NotRegistered(id)));

        book.register(id, building_target()).unwrap();
        assert_eq!(book.unregister(id), Ok(()));
        assert!(book.is_empty());
    }
}
