//! Application configuration
//!
//! Defaults reproduce the classic setup: a 1200x800 window, a 90 degree ring
//! of radius 2 and height 1 tessellated 72x72, and a 1024x768 desktop payload.

use glam::Vec3;

use crate::camera::FlyCamera;
use crate::error::ConfigError;
use crate::mesh::{self, Vertex};

/// Ring patch parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingConfig {
    pub radius: f32,
    pub height: f32,
    /// Angular span in degrees.
    pub span_degrees: f32,
    pub segments_u: u32,
    pub segments_v: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            height: 1.0,
            span_degrees: 90.0,
            segments_u: 72,
            segments_v: 72,
        }
    }
}

/// Initial pose and control tuning of the fly camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub world_up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
    /// Units per second.
    pub speed: f32,
    /// Degrees per mouse pixel.
    pub sensitivity: f32,
    /// Virtual pixels per second at full right-stick deflection.
    pub gamepad_look_rate: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.4, 3.5),
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: -6.0,
            zoom: FlyCamera::DEFAULT_ZOOM,
            speed: 2.5,
            sensitivity: 0.1,
            gamepad_look_rate: 600.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraConfig {
    pub fn build(&self) -> FlyCamera {
        let mut camera = FlyCamera::new(self.position, self.world_up, self.yaw, self.pitch);
        camera.set_zoom(self.zoom);
        camera
    }
}

/// Reference floor under the ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorConfig {
    pub enabled: bool,
    /// Edge length of the square floor.
    pub size: f32,
    /// Height of the floor plane (the ring's lower edge by default).
    pub elevation: f32,
    /// Whether the floor follows the lighting toggle.
    pub lit: bool,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 10.0,
            elevation: -0.5,
            lit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub vsync: bool,
    /// Cull back faces in the scene pass. Off so the ring stays visible from
    /// behind, where dual lighting applies.
    pub cull_back_faces: bool,
    pub ring: RingConfig,
    pub screen_width: u32,
    pub screen_height: u32,
    pub camera: CameraConfig,
    pub floor: FloorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "VR Scene".to_string(),
            window_width: 1200,
            window_height: 800,
            vsync: true,
            cull_back_faces: false,
            ring: RingConfig::default(),
            screen_width: 1024,
            screen_height: 768,
            camera: CameraConfig::default(),
            floor: FloorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ring = &self.ring;
        if ring.segments_u == 0 || ring.segments_v == 0 {
            return Err(ConfigError::ZeroSegments {
                u: ring.segments_u,
                v: ring.segments_v,
            });
        }
        let limits = wgpu::Limits::default();
        let (vertices, indices) = mesh::tessellation_counts(ring.segments_u, ring.segments_v);
        let bytes = vertices
            .saturating_mul(std::mem::size_of::<Vertex>() as u64)
            .max(indices.saturating_mul(std::mem::size_of::<u32>() as u64));
        if vertices > u64::from(u32::MAX) || bytes > limits.max_buffer_size {
            return Err(ConfigError::TooManySegments {
                u: ring.segments_u,
                v: ring.segments_v,
                bytes,
                limit: limits.max_buffer_size,
            });
        }
        for (what, value) in [
            ("radius", ring.radius),
            ("height", ring.height),
            ("span", ring.span_degrees),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::RingShape { what, value });
            }
        }
        for (what, width, height) in [
            ("window", self.window_width, self.window_height),
            ("screen texture", self.screen_width, self.screen_height),
        ] {
            if width == 0 || height == 0 {
                return Err(ConfigError::ZeroSize {
                    what,
                    width,
                    height,
                });
            }
        }
        let max = limits.max_texture_dimension_2d;
        if self.screen_width > max || self.screen_height > max {
            return Err(ConfigError::TooLarge {
                what: "screen texture",
                width: self.screen_width,
                height: self.screen_height,
                max,
            });
        }

        let camera = &self.camera;
        if !camera.world_up.is_finite() || camera.world_up.length_squared() == 0.0 {
            return Err(ConfigError::WorldUp(camera.world_up));
        }
        if !(FlyCamera::MIN_ZOOM..=FlyCamera::MAX_ZOOM).contains(&camera.zoom) {
            return Err(ConfigError::Zoom(camera.zoom));
        }
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(ConfigError::ClipPlanes {
                near: camera.near,
                far: camera.far,
            });
        }
        Ok(())
    }

    pub fn screen_payload_len(&self) -> usize {
        self.screen_width as usize * self.screen_height as usize * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(AppConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_segments_rejected() {
        let mut config = AppConfig::default();
        config.ring.segments_v = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroSegments { u: 72, v: 0 })
        );
    }

    #[test]
    fn degenerate_ring_rejected() {
        let mut config = AppConfig::default();
        config.ring.radius = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RingShape { what: "radius", .. })
        ));
        config.ring.radius = 2.0;
        config.ring.span_degrees = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RingShape { what: "span", .. })
        ));
    }

    #[test]
    fn empty_texture_rejected() {
        let mut config = AppConfig::default();
        config.screen_height = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroSize {
                what: "screen texture",
                ..
            })
        ));
    }

    #[test]
    fn zoom_and_clip_checked() {
        let mut config = AppConfig::default();
        config.camera.zoom = 150.0;
        assert_eq!(config.validate(), Err(ConfigError::Zoom(150.0)));
        config.camera.zoom = 60.0;
        config.camera.far = 0.05;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ClipPlanes { .. })
        ));
    }

    #[test]
    fn segment_counts_bounded_by_buffer_limits() {
        let mut config = AppConfig::default();
        config.ring.segments_u = 2000;
        config.ring.segments_v = 2000;
        assert_eq!(config.validate(), Ok(()));

        config.ring.segments_u = 3000;
        config.ring.segments_v = 3000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManySegments { u: 3000, v: 3000, .. })
        ));

        config.ring.segments_u = 65536;
        config.ring.segments_v = 65536;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManySegments { .. })
        ));
    }

    #[test]
    fn screen_texture_bounded_by_dimension_limit() {
        let mut config = AppConfig::default();
        config.screen_width = 8192;
        assert_eq!(config.validate(), Ok(()));
        config.screen_width = 8193;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooLarge {
                what: "screen texture",
                width: 8193,
                height: 768,
                max: 8192,
            })
        );
    }

    #[test]
    fn zero_world_up_rejected() {
        let mut config = AppConfig::default();
        config.camera.world_up = Vec3::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::WorldUp(Vec3::ZERO)));
        config.camera.world_up = Vec3::new(0.0, f32::NAN, 0.0);
        assert!(matches!(config.validate(), Err(ConfigError::WorldUp(_))));
    }

    #[test]
    fn camera_built_from_config() {
        let config = CameraConfig {
            zoom: 45.0,
            ..CameraConfig::default()
        };
        let camera = config.build();
        assert_eq!(camera.zoom(), 45.0);
        assert_eq!(camera.position(), config.position);
        assert_eq!(camera.pitch(), config.pitch);
    }

    #[test]
    fn payload_length_matches_rgba8() {
        assert_eq!(AppConfig::default().screen_payload_len(), 1024 * 768 * 4);
    }
}
