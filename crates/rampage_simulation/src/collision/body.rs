//! Dynamic body: физическое тело, которым владеет контроллер
//!
//! Сцена хранит только `BodyHandle` и `EntityId`; сами данные тела живут
//! в компоненте на entity контроллера.

use bevy::prelude::*;

use super::scene::BodyHandle;
use crate::entity_id::EntityId;
use crate::math::swap_planar;

/// Осязаемые тела: здания, танки, игрок
pub const COLLISION_LAYER_TANGIBLE: u32 = 0b1;

/// Снаряды (внешняя подсистема, только фильтр)
pub const COLLISION_LAYER_PROJECTILES: u32 = 0b10;

/// Группа 0 = тело ни в какой группе не состоит
pub const NO_COLLISION_GROUP: u32 = 0;

/// Здания никогда не толкают друг друга
pub const BUILDING_COLLISION_GROUP: u32 = 1;

/// Box collider + коэффициенты для resolver'а
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct BoxCollider {
    pub half_size: Vec3,
    pub bounce: f32,
    pub friction: f32,
}

/// Axis-aligned bounding box в мировых координатах
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn from_center(center: Vec3, half_size: Vec3) -> Self {
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Минимальный сдвиг `self`, выталкивающий его из `other`
    ///
    /// Сдвиг идёт вдоль оси наименьшего проникновения. `None` если боксы
    /// не пересекаются (касание не считается).
    pub fn penetration(&self, other: &BoundingBox) -> Option<Vec3> {
        let overlap = self.max.min(other.max) - self.min.max(other.min);
        if overlap.x <= 0.0 || overlap.y <= 0.0 || overlap.z <= 0.0 {
            return None;
        }

        let direction = self.center() - other.center();
        let push = if overlap.x <= overlap.y && overlap.x <= overlap.z {
            Vec3::new(overlap.x.copysign(direction.x), 0.0, 0.0)
        } else if overlap.y <= overlap.z {
            Vec3::new(0.0, overlap.y.copysign(direction.y), 0.0)
        } else {
            Vec3::new(0.0, 0.0, overlap.z.copysign(direction.z))
        };

        Some(push)
    }
}

/// Физическое тело контроллера (здание, танк)
///
/// Инвариант: `rotation`: единичное комплексное число `(cos θ, sin θ)`.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct DynamicBody {
    pub entity_id: EntityId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Vec2,
    pub collider: BoxCollider,
    /// Смещение центра коллайдера относительно `position`
    pub center: Vec3,
    pub collision_group: u32,
    pub collision_layer: u32,
    pub is_fixed: bool,
    pub bounding_box: BoundingBox,
    pub(crate) handle: Option<BodyHandle>,
}

impl DynamicBody {
    pub fn new(entity_id: EntityId, collider: BoxCollider, collision_layer: u32, position: Vec3) -> Self {
        let mut body = Self {
            entity_id,
            position,
            velocity: Vec3::ZERO,
            rotation: Vec2::X,
            collider,
            center: Vec3::ZERO,
            collision_group: NO_COLLISION_GROUP,
            collision_layer,
            is_fixed: false,
            bounding_box: BoundingBox::default(),
            handle: None,
        };
        body.update_bounding_box();
        body
    }

    pub fn update_bounding_box(&mut self) {
        self.bounding_box = BoundingBox::from_center(self.position + self.center, self.collider.half_size);
    }

    /// Направление "вперёд" в плоскости XZ
    pub fn heading(&self) -> Vec2 {
        swap_planar(self.rotation)
    }

    pub fn set_heading(&mut self, heading: Vec2) {
        self.rotation = swap_planar(heading);
    }

    pub fn handle(&self) -> Option<BodyHandle> {
        self.handle
    }

    pub fn is_registered(&self) -> bool {
        self.handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_id::EntityIdAllocator;

    fn unit_box() -> BoxCollider {
        BoxCollider {
            half_size: Vec3::splat(0.5),
            bounce: 0.0,
            friction: 0.5,
        }
    }

    #[test]
    fn test_bounding_box_follows_center_offset() {
        let mut ids = EntityIdAllocator::default();
        let mut body = DynamicBody::new(ids.next(), unit_box(), COLLISION_LAYER_TANGIBLE, Vec3::new(1.0, 0.0, 0.0));
        body.center.y = 0.5;
        body.update_bounding_box();

        assert_eq!(body.bounding_box.min, Vec3::new(0.5, 0.0, -0.5));
        assert_eq!(body.bounding_box.max, Vec3::new(1.5, 1.0, 0.5));
    }

    #[test]
    fn test_default_heading_is_forward_z() {
        let mut ids = EntityIdAllocator::default();
        let body = DynamicBody::new(ids.next(), unit_box(), COLLISION_LAYER_TANGIBLE, Vec3::ZERO);
        assert_eq!(body.heading(), Vec2::Y);
        assert!(!body.is_registered());
    }

    #[test]
    fn test_penetration_picks_smallest_axis() {
        let a = BoundingBox::from_center(Vec3::new(0.9, 0.0, 0.0), Vec3::splat(0.5));
        let b = BoundingBox::from_center(Vec3::ZERO, Vec3::splat(0.5));

        let push = a.penetration(&b).unwrap();
        assert!((push - Vec3::new(0.1, 0.0, 0.0)).length() < 1e-5);

        let back = b.penetration(&a).unwrap();
        assert!((back + push).length() < 1e-5);
    }

    #[test]
    fn test_touching_boxes_do_not_penetrate() {
        let a = BoundingBox::from_center(Vec3::new(1.0, 0.0, 0.0), Vec3::splat(0.5));
        let b = BoundingBox::from_center(Vec3::ZERO, Vec3::splat(0.5));
        assert!(a.penetration(&b).is_none());
    }
}
