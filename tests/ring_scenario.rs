use glam::Vec3;
use vr_ring::config::{AppConfig, RingConfig};
use vr_ring::effects::{EffectFlags, EffectToggle};
use vr_ring::{build_ring_mesh, ControlGrid, Direction, FlyCamera};

const EPS: f32 = 1e-4;

fn small_ring() -> AppConfig {
    AppConfig {
        ring: RingConfig {
            radius: 2.0,
            height: 1.0,
            span_degrees: 90.0,
            segments_u: 2,
            segments_v: 2,
        },
        ..AppConfig::default()
    }
}

#[test]
fn ring_mesh_from_config() {
    let config = small_ring();
    config.validate().unwrap();
    let mesh = build_ring_mesh(&config);

    assert_eq!(mesh.vertices.len(), 9);
    assert_eq!(mesh.indices.len(), 24);
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));

    // Center of the patch: on the axis, bowed less than the edges.
    let center = Vec3::from(mesh.vertices[4].position);
    let corner = Vec3::from(mesh.vertices[0].position);
    assert!(center.x.abs() < EPS);
    assert!(center.y.abs() < EPS);
    assert!((center.z - 0.1975).abs() < 1e-3);
    assert!((corner - Vec3::new(-2.0 * 45f32.to_radians().sin(), -0.5, 0.5858)).length() < 1e-3);
    assert!(center.z.abs() < corner.z.abs());

    for vertex in &mesh.vertices {
        let n = Vec3::from(vertex.normal);
        assert!((n.length() - 1.0).abs() < EPS);
    }
    // Center normal faces the viewer in front of the screen.
    assert!(Vec3::from(mesh.vertices[4].normal).dot(Vec3::Z) > 0.99);
}

#[test]
fn mesh_matches_direct_surface_evaluation() {
    let config = small_ring();
    let mesh = build_ring_mesh(&config);
    let grid = ControlGrid::ring(2.0, 1.0, 90f32.to_radians());

    let last = Vec3::from(mesh.vertices[8].position);
    assert!((last - grid.evaluate(1.0, 1.0)).length() < EPS);
    assert_eq!(mesh.vertices[8].uv, [1.0, 1.0]);
}

#[test]
fn invalid_segments_rejected_before_tessellation() {
    let mut config = small_ring();
    config.ring.segments_u = 0;
    assert!(config.validate().is_err());
}

#[test]
fn camera_walks_toward_the_screen() {
    let config = AppConfig::default();
    let mut camera = config.camera.build();
    let start = camera.position();

    // One second forward at the configured speed.
    for _ in 0..100 {
        camera.translate(Direction::Forward, config.camera.speed, 0.01);
    }
    let moved = camera.position() - start;
    assert!((moved.length() - config.camera.speed).abs() < 1e-3);
    assert!(moved.z < 0.0);

    // Turning a full circle in small steps lands on the same basis.
    let front = camera.front();
    for _ in 0..3600 {
        camera.rotate(1.0, 0.0, 0.1, true);
    }
    assert!((camera.front() - front).length() < 1e-3);
}

#[test]
fn camera_teleport_keeps_orientation() {
    let mut camera = AppConfig::default().camera.build();
    let front = camera.front();
    camera.set_position(Vec3::new(1.0, 2.0, -3.0));
    assert_eq!(camera.position(), Vec3::new(1.0, 2.0, -3.0));
    assert_eq!(camera.front(), front);

    // Up/Down follow the world up vector, not the pitched camera up.
    let up = camera.world_up();
    camera.translate(Direction::Up, 1.0, 0.5);
    assert!((camera.position() - Vec3::new(1.0, 2.0, -3.0) - up * 0.5).length() < EPS);
}

#[test]
fn camera_limits_hold() {
    let mut camera = FlyCamera::default();
    camera.rotate(0.0, 10_000.0, 0.1, true);
    assert_eq!(camera.pitch(), FlyCamera::PITCH_LIMIT);
    camera.zoom_by(500.0);
    assert_eq!(camera.zoom(), FlyCamera::MIN_ZOOM);
    camera.zoom_by(-500.0);
    assert_eq!(camera.zoom(), FlyCamera::MAX_ZOOM);
}

#[test]
fn effect_sequence() {
    let mut flags = EffectFlags::default();
    flags.apply_all([
        EffectToggle::SetDistortion(true),
        EffectToggle::SetLighting(true),
        EffectToggle::ToggleDualLighting,
    ]);
    assert!(flags.apply_distortion && flags.use_lighting && flags.dual_lighting);

    assert!(flags.apply(EffectToggle::DisableAll));
    assert!(!flags.apply_distortion && !flags.use_lighting);
    assert!(flags.dual_lighting);
    assert!(!flags.apply(EffectToggle::DisableAll));
}
