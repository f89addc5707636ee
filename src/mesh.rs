//! Procedural mesh generation
//!
//! Builds the curved ring screen from a bicubic Bézier patch and the flat
//! reference floor. Everything here is pure CPU math; the renderer uploads the
//! resulting buffers once at startup.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Normal used when the two surface tangents are parallel.
pub const DEGENERATE_NORMAL: Vec3 = Vec3::Y;

/// Interleaved vertex as the scene pipeline consumes it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Triangle list with 32-bit indices.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// 4x4 control points of a bicubic Bézier patch.
///
/// `points[i][j]`: `i` walks the U (angular) direction, `j` the V (vertical)
/// direction. [`tessellate`] iterates in the same order, so cross(dS/du, dS/dv)
/// points out of the concave viewing side (+z for [`ControlGrid::ring`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlGrid {
    pub points: [[Vec3; 4]; 4],
}

impl ControlGrid {
    pub fn from_points(points: [[Vec3; 4]; 4]) -> Self {
        Self { points }
    }

    /// Control points of a screen bent around a ring of `radius`.
    ///
    /// U sweeps the angle from `-angular_span / 2` to `+angular_span / 2`
    /// (radians), V sweeps the height from `-height / 2` to `+height / 2`.
    /// The flat wall sits at z = 0 and the edges bow toward +z.
    pub fn ring(radius: f32, height: f32, angular_span: f32) -> Self {
        let mut points = [[Vec3::ZERO; 4]; 4];
        for (i, column) in points.iter_mut().enumerate() {
            let u = i as f32 / 3.0;
            let theta = -angular_span / 2.0 + u * angular_span;
            let x = radius * theta.sin();
            let z = radius * (1.0 - theta.cos());
            for (j, point) in column.iter_mut().enumerate() {
                let v = j as f32 / 3.0;
                let y = -height / 2.0 + v * height;
                *point = Vec3::new(x, y, z);
            }
        }
        Self { points }
    }

    /// Surface position S(u, v).
    pub fn evaluate(&self, u: f32, v: f32) -> Vec3 {
        self.blend(bernstein(u), bernstein(v))
    }

    /// Partial derivatives (dS/du, dS/dv).
    pub fn tangents(&self, u: f32, v: f32) -> (Vec3, Vec3) {
        let (bu, bv) = (bernstein(u), bernstein(v));
        let (du, dv) = (bernstein_derivative(u), bernstein_derivative(v));
        (self.blend(du, bv), self.blend(bu, dv))
    }

    /// Unit normal at (u, v), or [`DEGENERATE_NORMAL`] where the tangents
    /// are parallel.
    pub fn normal(&self, u: f32, v: f32) -> Vec3 {
        let (tangent_u, tangent_v) = self.tangents(u, v);
        tangent_u
            .cross(tangent_v)
            .try_normalize()
            .unwrap_or(DEGENERATE_NORMAL)
    }

    fn blend(&self, weights_u: [f32; 4], weights_v: [f32; 4]) -> Vec3 {
        let mut p = Vec3::ZERO;
        for (i, wu) in weights_u.iter().enumerate() {
            for (j, wv) in weights_v.iter().enumerate() {
                p += wu * wv * self.points[i][j];
            }
        }
        p
    }
}

/// Cubic Bernstein polynomials B0..B3 at `t`.
pub fn bernstein(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

/// Derivatives of [`bernstein`] with respect to `t`.
pub fn bernstein_derivative(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [
        -3.0 * s * s,
        3.0 * s * s - 6.0 * t * s,
        6.0 * t * s - 3.0 * t * t,
        3.0 * t * t,
    ]
}

/// Vertex and index counts [`tessellate`] produces for the given resolution,
/// saturating at `u64::MAX`.
pub fn tessellation_counts(segments_u: u32, segments_v: u32) -> (u64, u64) {
    let (su, sv) = (u64::from(segments_u), u64::from(segments_v));
    (
        (su + 1).saturating_mul(sv + 1),
        su.saturating_mul(sv).saturating_mul(6),
    )
}

/// Samples the patch on a uniform `(segments_u + 1) x (segments_v + 1)` grid.
///
/// Vertices are laid out row-major by U then V. Every cell contributes two
/// counter-clockwise triangles when seen from the normal side.
///
/// # Panics
/// If either segment count is zero, or if the vertex count does not fit a
/// `u32` index. Configuration is validated before meshing, so either case is
/// a programming error.
pub fn tessellate(grid: &ControlGrid, segments_u: u32, segments_v: u32) -> Mesh {
    assert!(
        segments_u >= 1 && segments_v >= 1,
        "tessellation needs at least one segment per axis (got {segments_u}x{segments_v})"
    );

    let (vertex_count, index_count) = tessellation_counts(segments_u, segments_v);
    assert!(
        vertex_count <= u64::from(u32::MAX),
        "tessellation {segments_u}x{segments_v} has {vertex_count} vertices, more than u32 indices can address"
    );

    let row_width = segments_v + 1;
    let mut vertices = Vec::with_capacity(vertex_count as usize);

    for i in 0..=segments_u {
        let u = i as f32 / segments_u as f32;
        for j in 0..=segments_v {
            let v = j as f32 / segments_v as f32;
            vertices.push(Vertex {
                position: grid.evaluate(u, v).to_array(),
                normal: grid.normal(u, v).to_array(),
                uv: [u, v],
            });
        }
    }

    let mut indices = Vec::with_capacity(index_count as usize);
    for i in 0..segments_u {
        for j in 0..segments_v {
            let idx = i * row_width + j;
            indices.extend_from_slice(&[
                idx,
                idx + row_width,
                idx + row_width + 1,
                idx,
                idx + row_width + 1,
                idx + 1,
            ]);
        }
    }

    Mesh { vertices, indices }
}

/// Unit quad in the XZ plane facing +Y, centered on the origin.
pub fn floor_plane() -> Mesh {
    let normal = [0.0, 1.0, 0.0];
    #[rustfmt::skip]
    let vertices = vec![
        Vertex { position: [-0.5, 0.0,  0.5], normal, uv: [0.0, 0.0] },
        Vertex { position: [ 0.5, 0.0,  0.5], normal, uv: [1.0, 0.0] },
        Vertex { position: [ 0.5, 0.0, -0.5], normal, uv: [1.0, 1.0] },
        Vertex { position: [-0.5, 0.0, -0.5], normal, uv: [0.0, 1.0] },
    ];
    Mesh {
        vertices,
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}
