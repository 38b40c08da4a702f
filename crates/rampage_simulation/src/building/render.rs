//! Визуальное состояние здания → render instances
//!
//! Первый этаж рисуется в позиции тела + jitter. Каждый следующий этаж
//! ставится поверх предыдущего со смещением из решётки 3×3
//! (`SegmentLattice`): при обрушении смещение случайное для каждого этажа
//! каждый кадр, иначе: центральное.

use bevy::prelude::*;
use rand::Rng;

use super::Building;
use crate::collision::DynamicBody;
use crate::config::BuildingConfig;
use crate::math::random_in_range;
use crate::render::{MeshKind, RenderAdapter, RenderInstance};

/// Девять смещений этажа: ±amplitude по X/Z, `segment_height` вверх
///
/// Строится один раз при старте и дальше только читается.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SegmentLattice {
    offsets: [Vec3; 9],
}

impl SegmentLattice {
    /// Индекс центра решётки (x = 0, z = 0)
    pub const CENTER: usize = 4;

    pub fn new(amplitude: f32, segment_height: f32) -> Self {
        let offsets = std::array::from_fn(|i| {
            let x = (i % 3) as f32 - 1.0;
            let z = (i / 3) as f32 - 1.0;
            Vec3::new(x * amplitude, segment_height, z * amplitude)
        });
        Self { offsets }
    }

    pub fn from_config(config: &BuildingConfig) -> Self {
        Self::new(config.shake_amplitude, config.segment_height)
    }

    pub fn offsets(&self) -> &[Vec3; 9] {
        &self.offsets
    }

    pub fn center(&self) -> Vec3 {
        self.offsets[Self::CENTER]
    }

    pub fn random(&self, rng: &mut impl Rng) -> Vec3 {
        self.offsets[rng.gen_range(0..self.offsets.len())]
    }
}

impl Building {
    /// Текущая амплитуда jitter'а (`None`: здание стоит ровно)
    ///
    /// Collapsing: всегда полная амплитуда. Shaking: линейно затухает
    /// от полной (shake_timer = shake_time) до нуля.
    pub fn jitter_amplitude(&self, config: &BuildingConfig) -> Option<f32> {
        if self.is_collapsing() {
            Some(config.shake_amplitude)
        } else if self.shake_timer() > 0.0 {
            Some(config.shake_amplitude / config.shake_time * self.shake_timer())
        } else {
            None
        }
    }
}

/// Отправить все этажи здания в render adapter
///
/// Destroyed здания ничего не отправляют.
pub fn submit_building(
    building: &Building,
    body: &DynamicBody,
    lattice: &SegmentLattice,
    config: &BuildingConfig,
    rng: &mut impl Rng,
    adapter: &mut impl RenderAdapter,
) {
    if building.is_destroyed() {
        return;
    }

    let mut translation = body.position;
    if let Some(amplitude) = building.jitter_amplitude(config) {
        translation.x += random_in_range(rng, -amplitude, amplitude);
        translation.z += random_in_range(rng, -amplitude, amplitude);
    }

    adapter.submit(RenderInstance {
        owner: body.entity_id,
        mesh: MeshKind::BuildingSegment,
        transform: Transform::from_translation(translation),
    });

    for _ in 0..building.tier().extra_segments() {
        translation += if building.is_collapsing() {
            lattice.random(rng)
        } else {
            lattice.center()
        };

        adapter.submit(RenderInstance {
            owner: body.entity_id,
            mesh: MeshKind::BuildingSegment,
            transform: Transform::from_translation(translation),
        });
    }
}
