//! Shading model shared by the WGSL shaders and the CPU.
//!
//! The renderer uploads these parameters as uniforms; `scene.wgsl` and
//! `distortion.wgsl` evaluate the same formulas per fragment. The CPU versions
//! below are used to check the math without a GPU.

use glam::{Vec2, Vec3, Vec4};

use crate::effects::EffectFlags;

/// Lens distortion constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionParams {
    /// Mean barrel strength.
    pub amount_base: f32,
    /// Amplitude of the slow oscillation around `amount_base`.
    pub amount_swing: f32,
    /// Angular rate of the oscillation, radians per second.
    pub swing_rate: f32,
    /// Red/blue channel offset relative to the distance from center.
    pub chroma: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            amount_base: 0.25,
            amount_swing: 0.15,
            swing_rate: 0.5,
            chroma: 0.005,
        }
    }
}

/// Result of warping one output UV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensSample {
    /// Where green is read.
    pub warped: Vec2,
    /// Added for red, subtracted for blue.
    pub fringe: Vec2,
}

impl DistortionParams {
    pub const CENTER: Vec2 = Vec2::splat(0.5);

    pub fn amount(&self, time: f32) -> f32 {
        self.amount_swing * (time * self.swing_rate).sin() + self.amount_base
    }

    pub fn warp(&self, uv: Vec2, time: f32) -> LensSample {
        let offset = uv - Self::CENTER;
        let dist = offset.length();
        let dir = offset.normalize_or_zero();
        let scale = 1.0 + self.amount(time) * dist * dist;
        LensSample {
            warped: Self::CENTER + dir * dist * scale,
            fringe: dir * dist * self.chroma,
        }
    }

    /// Output color at `uv` given a texture lookup.
    pub fn sample<F>(&self, uv: Vec2, time: f32, enabled: bool, texture: F) -> Vec4
    where
        F: Fn(Vec2) -> Vec4,
    {
        if !enabled {
            return texture(uv);
        }
        let lens = self.warp(uv, time);
        let r = texture(lens.warped + lens.fringe).x;
        let g = texture(lens.warped).y;
        let b = texture(lens.warped - lens.fringe).z;
        Vec4::new(r, g, b, 1.0)
    }
}

/// Fixed directional light used by the scene pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingParams {
    /// Direction toward the light; normalized on use.
    pub light_dir: Vec3,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            light_dir: Vec3::ONE,
            ambient: 0.2,
            diffuse: 0.8,
            specular: 0.5,
            shininess: 32.0,
        }
    }
}

/// One fragment as the scene shader sees it.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub world_pos: Vec3,
    pub normal: Vec3,
    pub front_facing: bool,
    pub tex_color: Vec4,
}

impl LightingParams {
    pub fn shade(&self, fragment: &Fragment, view_pos: Vec3, flags: &EffectFlags) -> Vec4 {
        if !flags.use_lighting {
            return fragment.tex_color;
        }

        let mut normal = fragment.normal.normalize_or_zero();
        if flags.dual_lighting && !fragment.front_facing {
            normal = -normal;
        }

        let light_dir = self.light_dir.normalize();
        let diffuse = normal.dot(light_dir).max(0.0) * self.diffuse;

        let view_dir = (view_pos - fragment.world_pos).normalize_or_zero();
        let reflect_dir = reflect(-light_dir, normal);
        let specular = view_dir.dot(reflect_dir).max(0.0).powf(self.shininess) * self.specular;

        let intensity = self.ambient + diffuse + specular;
        Vec4::new(intensity, intensity, intensity, 1.0) * fragment.tex_color
    }
}

/// GLSL/WGSL `reflect`.
fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(uv: Vec2) -> Vec4 {
        Vec4::new(uv.x, uv.y, uv.x * uv.y, 0.5)
    }

    #[test]
    fn disabled_distortion_is_identity() {
        let params = DistortionParams::default();
        for &(u, v) in &[(0.0, 0.0), (0.5, 0.5), (0.13, 0.92), (1.0, 0.3)] {
            let uv = Vec2::new(u, v);
            for time in [0.0, 1.7, 42.0] {
                assert_eq!(params.sample(uv, time, false, gradient), gradient(uv));
            }
        }
    }

    #[test]
    fn center_is_fixed_point() {
        let params = DistortionParams::default();
        let lens = params.warp(DistortionParams::CENTER, 3.0);
        assert_eq!(lens.warped, DistortionParams::CENTER);
        assert_eq!(lens.fringe, Vec2::ZERO);
        let color = params.sample(DistortionParams::CENTER, 3.0, true, gradient);
        assert!(color.is_finite());
    }

    #[test]
    fn barrel_pushes_samples_outward() {
        let params = DistortionParams::default();
        let uv = Vec2::new(0.9, 0.5);
        let lens = params.warp(uv, 0.0);
        // amount(0) = 0.25, dist = 0.4 -> scale = 1.04
        assert!((lens.warped.x - (0.5 + 0.4 * 1.04)).abs() < 1e-6);
        assert!((lens.warped.y - 0.5).abs() < 1e-6);
        assert!((lens.fringe.x - 0.4 * 0.005).abs() < 1e-7);
    }

    #[test]
    fn amount_oscillates_between_bounds() {
        let params = DistortionParams::default();
        for step in 0..100 {
            let a = params.amount(step as f32 * 0.37);
            assert!((0.1 - 1e-6..=0.4 + 1e-6).contains(&a));
        }
    }

    #[test]
    fn enabled_distortion_splits_channels() {
        let params = DistortionParams::default();
        let uv = Vec2::new(0.8, 0.5);
        let lens = params.warp(uv, 0.0);
        let color = params.sample(uv, 0.0, true, gradient);
        assert_eq!(color.x, (lens.warped + lens.fringe).x);
        assert_eq!(color.y, lens.warped.y);
        assert_eq!(color.w, 1.0);
    }

    fn fragment(normal: Vec3, front_facing: bool) -> Fragment {
        Fragment {
            world_pos: Vec3::ZERO,
            normal,
            front_facing,
            tex_color: Vec4::new(0.5, 0.25, 1.0, 1.0),
        }
    }

    #[test]
    fn unlit_returns_texture() {
        let lighting = LightingParams::default();
        let frag = fragment(Vec3::Z, true);
        let out = lighting.shade(&frag, Vec3::new(0.0, 0.0, 5.0), &EffectFlags::default());
        assert_eq!(out, frag.tex_color);
    }

    #[test]
    fn facing_away_from_light_gets_ambient_only() {
        let lighting = LightingParams::default();
        let flags = EffectFlags {
            use_lighting: true,
            ..Default::default()
        };
        let frag = fragment(-Vec3::ONE, true);
        let out = lighting.shade(&frag, Vec3::new(0.0, 0.0, 5.0), &flags);
        assert!(out.abs_diff_eq(frag.tex_color * Vec4::new(0.2, 0.2, 0.2, 1.0), 1e-6));
    }

    #[test]
    fn dual_lighting_flips_back_faces() {
        let lighting = LightingParams::default();
        let view_pos = Vec3::new(0.0, 0.0, -5.0);
        let back = fragment(-Vec3::ONE, false);

        let single = EffectFlags {
            use_lighting: true,
            ..Default::default()
        };
        let dual = EffectFlags {
            dual_lighting: true,
            ..single
        };

        let dark = lighting.shade(&back, view_pos, &single);
        let lit = lighting.shade(&back, view_pos, &dual);
        assert!(lit.x > dark.x);

        // Front faces are unaffected by the dual switch.
        let front = fragment(Vec3::Z, true);
        assert_eq!(
            lighting.shade(&front, view_pos, &single),
            lighting.shade(&front, view_pos, &dual)
        );
    }

    #[test]
    fn dual_lighting_needs_lighting_enabled() {
        let lighting = LightingParams::default();
        let flags = EffectFlags {
            dual_lighting: true,
            ..Default::default()
        };
        let frag = fragment(Vec3::Z, false);
        assert_eq!(lighting.shade(&frag, Vec3::Z, &flags), frag.tex_color);
    }
}
