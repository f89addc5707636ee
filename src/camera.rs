//! Euler-angle fly camera
//!
//! Orientation is stored as yaw/pitch in degrees and the basis is rebuilt from
//! those angles after every change, so no rounding drift accumulates in
//! `front`/`right`/`up`. Position is integrated frame by frame.

use glam::{Mat4, Vec3};

/// Movement directions understood by [`FlyCamera::translate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    /// Along the world up vector, independent of pitch.
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    position: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    zoom: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), Vec3::Y, -90.0, 0.0)
    }
}

impl FlyCamera {
    pub const MIN_ZOOM: f32 = 1.0;
    pub const MAX_ZOOM: f32 = 120.0;
    pub const DEFAULT_ZOOM: f32 = 90.0;
    pub const PITCH_LIMIT: f32 = 89.0;

    /// Creates a camera at `position` looking along the direction given by
    /// `yaw`/`pitch` (degrees). The initial pitch is taken as is.
    pub fn new(position: Vec3, world_up: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            world_up,
            yaw,
            pitch,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: world_up,
            zoom: Self::DEFAULT_ZOOM,
        };
        camera.update_basis();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Vertical field of view in degrees.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    /// Moves `speed * dt` units along `direction`. Orientation is untouched.
    pub fn translate(&mut self, direction: Direction, speed: f32, dt: f32) {
        let velocity = speed * dt;
        let offset = match direction {
            Direction::Forward => self.front,
            Direction::Backward => -self.front,
            Direction::Left => -self.right,
            Direction::Right => self.right,
            Direction::Up => self.world_up,
            Direction::Down => -self.world_up,
        };
        self.position += offset * velocity;
    }

    /// Applies a look delta in pixels. Positive `dy` pitches up.
    pub fn rotate(&mut self, dx: f32, dy: f32, sensitivity: f32, constrain_pitch: bool) {
        self.yaw += dx * sensitivity;
        self.pitch += dy * sensitivity;

        // Past +-90 degrees the up vector flips.
        if constrain_pitch {
            self.pitch = self.pitch.clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        }

        self.update_basis();
    }

    /// Scrolling forward (positive delta) narrows the field of view.
    pub fn zoom_by(&mut self, delta: f32) {
        self.set_zoom(self.zoom - delta);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(self.zoom.to_radians(), aspect, near, far)
    }

    pub fn view_projection(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        self.projection_matrix(aspect, near, far) * self.view_matrix()
    }

    // Order matters: right and up derive from the new front.
    fn update_basis(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}
