//! Planar math helpers
//!
//! Планарная ориентация хранится как единичное комплексное число
//! `(cos θ, sin θ)`; поворот = умножение комплексных чисел.
//! Heading (направление "вперёд" в плоскости XZ) = `(sin θ, cos θ)`,
//! т.е. θ = 0 смотрит вдоль +Z.

use bevy::math::{Quat, Vec2, Vec3};
use rand::Rng;

/// Проекция на плоскость XZ (Y игнорируется)
pub fn planar(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// `None` для нулевого (или почти нулевого) вектора
pub fn normalize_planar(v: Vec2) -> Option<Vec2> {
    v.try_normalize()
}

pub fn complex_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

pub fn complex_mul(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x * b.x - a.y * b.y, a.x * b.y + a.y * b.x)
}

pub fn complex_conjugate(a: Vec2) -> Vec2 {
    Vec2::new(a.x, -a.y)
}

/// Повернуть `from` к `towards` не больше чем на `max_step`
///
/// Все три аргумента: единичные комплексные числа. Если угол между `from`
/// и `towards` меньше шага, результат защёлкивается на `towards` и
/// возвращается `true` (выровнены). Иначе поворот ровно на шаг в сторону
/// кратчайшего угла и `false`.
pub fn rotate_towards(from: Vec2, towards: Vec2, max_step: Vec2) -> (Vec2, bool) {
    let relative = complex_mul(complex_conjugate(from), towards);

    if relative.x > max_step.x {
        return (towards, true);
    }

    let step = if relative.y < 0.0 {
        complex_conjugate(max_step)
    } else {
        max_step
    };

    // Ренормализация: иначе норма дрейфует за сотни шагов
    let rotated = complex_mul(from, step);
    (rotated.try_normalize().unwrap_or(from), false)
}

/// Сдвинуть `from` к `to` не больше чем на `max_delta`
pub fn move_towards(from: f32, to: f32, max_delta: f32) -> f32 {
    let delta = to - from;
    if delta.abs() <= max_delta {
        to
    } else {
        from + max_delta.copysign(delta)
    }
}

/// Uniform в `[min, max)`; вырожденный диапазон возвращает `min`
pub fn random_in_range(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if min < max {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Кватернион вокруг +Y из планарной ориентации `(cos θ, sin θ)`
pub fn quat_from_planar_rotation(rotation: Vec2) -> Quat {
    Quat::from_rotation_y(rotation.y.atan2(rotation.x))
}

/// Ориентация `(cos θ, sin θ)` → heading `(sin θ, cos θ)` и обратно
pub fn swap_planar(v: Vec2) -> Vec2 {
    Vec2::new(v.y, v.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_normalize_zero_is_none() {
        assert!(normalize_planar(Vec2::ZERO).is_none());
        let dir = normalize_planar(Vec2::new(3.0, 4.0)).unwrap();
        assert!((dir - Vec2::new(0.6, 0.8)).length() < EPS);
    }

    #[test]
    fn test_rotate_towards_snaps_within_step() {
        let step = complex_from_angle(0.1);
        let from = complex_from_angle(0.0);
        let towards = complex_from_angle(0.05);

        let (result, aligned) = rotate_towards(from, towards, step);
        assert!(aligned);
        assert_eq!(result, towards);
    }

    #[test]
    fn test_rotate_towards_takes_exactly_one_step() {
        let step = complex_from_angle(0.1);

        let (ccw, aligned) = rotate_towards(complex_from_angle(0.0), complex_from_angle(1.0), step);
        assert!(!aligned);
        assert!((ccw.y.atan2(ccw.x) - 0.1).abs() < EPS);

        // Кратчайший путь в другую сторону
        let (cw, aligned) = rotate_towards(complex_from_angle(0.0), complex_from_angle(-1.0), step);
        assert!(!aligned);
        assert!((cw.y.atan2(cw.x) + 0.1).abs() < EPS);
    }

    #[test]
    fn test_rotate_towards_keeps_unit_length() {
        let step = complex_from_angle(1.0 / 30.0);
        let mut heading = complex_from_angle(0.0);
        let target = complex_from_angle(3.0);

        for _ in 0..80 {
            heading = rotate_towards(heading, target, step).0;
        }

        assert!((heading.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_move_towards_clamps() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.0, -1.0, 0.25), -0.25);
        assert_eq!(move_towards(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_towards(0.1, 0.0, 0.25), 0.0);
    }

    #[test]
    fn test_random_in_range_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            let value = random_in_range(&mut rng, -0.5, 0.5);
            assert!((-0.5..0.5).contains(&value));
        }
        assert_eq!(random_in_range(&mut rng, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_quat_matches_heading() {
        // θ = 90° → heading смотрит вдоль +X
        let rotation = complex_from_angle(FRAC_PI_2);
        let forward = quat_from_planar_rotation(rotation) * Vec3::Z;
        let heading = swap_planar(rotation);

        assert!((forward - Vec3::new(heading.x, 0.0, heading.y)).length() < EPS);
        assert!((forward - Vec3::X).length() < EPS);
    }
}
