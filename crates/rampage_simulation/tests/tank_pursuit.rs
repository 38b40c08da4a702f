//! Tank pursuit через полный App: steering + collision scene

use bevy::prelude::*;
use rampage_simulation::*;

fn tank_body(app: &App, tank: Entity) -> DynamicBody {
    app.world().get::<DynamicBody>(tank).unwrap().clone()
}

#[test]
fn test_tank_drives_to_target() {
    let mut app = create_headless_app(1);
    let tank = spawn_tank(app.world_mut(), Vec3::ZERO);
    app.world_mut()
        .get_mut::<Tank>(tank)
        .unwrap()
        .set_target(Vec3::new(0.0, 0.0, 10.0));

    for _ in 0..640 {
        app.update();
    }

    let body = tank_body(&app, tank);
    // 10 с: ~1 с разгон, дальше 0.5 м/с
    assert!(body.position.z > 3.0, "z = {}", body.position.z);
    assert!(body.position.z < 5.0, "z = {}", body.position.z);
    assert!(body.position.x.abs() < 1e-4);

    // Transform синхронизирован с телом
    let transform = app.world().get::<Transform>(tank).unwrap();
    assert_eq!(transform.translation, body.position);
}

#[test]
fn test_inactive_tank_does_not_move() {
    let mut app = create_headless_app(1);
    let tank = spawn_tank(app.world_mut(), Vec3::ZERO);
    {
        let mut tank = app.world_mut().get_mut::<Tank>(tank).unwrap();
        tank.set_target(Vec3::new(10.0, 0.0, 0.0));
        tank.is_active = false;
    }

    for _ in 0..100 {
        app.update();
    }

    let body = tank_body(&app, tank);
    assert_eq!(body.position, Vec3::ZERO);
    assert_eq!(body.heading(), Vec2::new(0.0, 1.0));
}

#[test]
fn test_building_blocks_tank() {
    let mut app = create_headless_app(1);
    spawn_building_with_tier(app.world_mut(), Vec3::new(0.0, 0.0, 5.0), BuildingTier::Two).unwrap();
    let tank = spawn_tank(app.world_mut(), Vec3::ZERO);
    app.world_mut()
        .get_mut::<Tank>(tank)
        .unwrap()
        .set_target(Vec3::new(0.0, 0.0, 20.0));

    for _ in 0..1500 {
        app.update();
    }

    let body = tank_body(&app, tank);
    // Передний край танка упирается в стену здания (z = 4.5)
    assert!(body.bounding_box.max.z <= 4.5 + 0.01, "tank went through: {:?}", body.bounding_box);
    assert!(body.position.z > 3.0);
}

#[test]
fn test_tank_render_instance_follows_body() {
    let mut app = create_headless_app(1);
    let tank = spawn_tank(app.world_mut(), Vec3::new(2.0, 0.0, 2.0));

    app.update();

    let body = tank_body(&app, tank);
    let queue = app.world().resource::<RenderQueue>();
    let instances: Vec<_> = queue.instances_of(body.entity_id).collect();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].mesh, MeshKind::Tank);
    assert_eq!(instances[0].transform.translation, body.position);
}

#[test]
fn test_despawn_tank_clears_scene() {
    let mut app = create_headless_app(1);
    let tank = spawn_tank(app.world_mut(), Vec3::ZERO);
    assert_eq!(app.world().resource::<BodyScene>().len(), 1);

    assert!(despawn_tank(app.world_mut(), tank));
    assert!(!despawn_tank(app.world_mut(), tank));

    assert!(app.world().resource::<BodyScene>().is_empty());
    app.update();
    assert!(app.world().resource::<RenderQueue>().is_empty());
}

#[test]
fn test_host_despawn_frees_scene_slot() {
    let mut app = create_headless_app(1);
    let tank = spawn_tank(app.world_mut(), Vec3::ZERO);
    assert_eq!(app.world().resource::<BodyScene>().len(), 1);

    app.world_mut().despawn(tank);

    assert!(app.world().resource::<BodyScene>().is_empty());

    // Слот переиспользуется новым танком
    let fresh = spawn_tank(app.world_mut(), Vec3::ZERO);
    app.update();
    assert_eq!(app.world().resource::<BodyScene>().len(), 1);
    assert!(app.world().get::<Tank>(fresh).is_some());
}
