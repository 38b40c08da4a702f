//! Headless симуляция Rampage
//!
//! Ряд зданий + танк, гоняющийся за движущейся точкой. Периодический урон
//! по зданиям, прогресс в лог.
//!
//! Использование: `rampage_simulation [config.toml]`

use bevy::prelude::*;
use rand::Rng;

use rampage_simulation::{
    create_headless_app_with_config, log_info, spawn_building, spawn_tank, Building, DamageEvent, DeterministicRng,
    DynamicBody, HealthBook, RampageConfig, RenderQueue, Tank,
};

const TICK_COUNT: usize = 2000;
const BUILDING_COUNT: usize = 6;
const BUILDING_SPACING: f32 = 2.0;
const RETARGET_EVERY: usize = 256;
const DAMAGE_EVERY: usize = 48;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => RampageConfig::load(&path)?,
        None => RampageConfig::default(),
    };

    let mut app = create_headless_app_with_config(config.clone());
    log_info(&format!("Starting Rampage headless simulation (seed: {})", config.seed));

    for i in 0..BUILDING_COUNT {
        let x = (i as f32 - BUILDING_COUNT as f32 / 2.0) * BUILDING_SPACING;
        spawn_building(app.world_mut(), Vec3::new(x, 0.0, 0.0))?;
    }
    let tank = spawn_tank(app.world_mut(), Vec3::new(0.0, 0.0, -6.0));

    for tick in 0..TICK_COUNT {
        if tick % RETARGET_EVERY == 0 {
            retarget(app.world_mut(), tank);
        }
        if tick % DAMAGE_EVERY == 0 {
            hit_random_building(app.world_mut());
        }

        app.update();

        if tick % 200 == 0 {
            report(app.world_mut(), tick);
        }
    }

    report(app.world_mut(), TICK_COUNT);
    log_info("Simulation complete!");
    Ok(())
}

/// Новая точка преследования на окружности вокруг центра улицы
fn retarget(world: &mut World, tank: Entity) {
    let angle = world.resource_mut::<DeterministicRng>().rng.gen_range(0.0..std::f32::consts::TAU);
    let target = Vec3::new(angle.cos() * 5.0, 0.0, angle.sin() * 5.0);

    if let Some(mut tank) = world.get_mut::<Tank>(tank) {
        tank.set_target(target);
        log_info(&format!("Tank retarget → {:?}", target));
    }
}

/// Удар по случайному живому зданию
fn hit_random_building(world: &mut World) {
    let mut query = world.query::<(&Building, &DynamicBody)>();
    let mut standing: Vec<_> = query
        .iter(world)
        .filter(|(building, _)| !building.is_collapsing())
        .map(|(_, body)| body.entity_id)
        .collect();
    if standing.is_empty() {
        return;
    }
    standing.sort();

    let index = world.resource_mut::<DeterministicRng>().rng.gen_range(0..standing.len());
    world.send_event(DamageEvent {
        target: standing[index],
        amount: 1,
    });
}

fn report(world: &mut World, tick: usize) {
    let buildings = world.query::<&Building>().iter(world).count();
    let registered = world.resource::<HealthBook>().len();
    let instances = world.resource::<RenderQueue>().len();

    log_info(&format!(
        "Tick {}: {} buildings ({} registered), {} render instances",
        tick, buildings, registered, instances
    ));
}
