//! Procedural mesh generation for targets, walls and the crosshair.
//!
//! Every mesh in the game is a flat, non-indexed triangle list: each triangle owns
//! three independent [`Vertex`] values and all three carry the same normal. This
//! gives the faceted, flat-shaded look of the targets and keeps the buffers trivially
//! translatable (moving a target only touches positions).
//!
//! - [`sphere`]: a UV-sphere sampled from two angles, `2·N²` triangles
//! - [`cuboid`]: a box anchored at its origin corner, 12 triangles
//! - [`crosshair_lines`]: four 2D points forming a `+` in pixel space
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//!
//! Viewed as floats (see [`as_floats`]) a buffer is `6` floats per vertex,
//! `3` vertices per triangle.

use glam::{Quat, Vec3};

/// Number of `f32` values per packed [`Vertex`].
pub const FLOATS_PER_VERTEX: usize = 6;

/// Number of `f32` values per crosshair vertex (x, y).
pub const FLOATS_PER_OVERLAY_VERTEX: usize = 2;

/// Largest sphere smoothness the command line accepts (about 6.3M vertices).
pub const MAX_SMOOTHNESS: u32 = 1024;

/// A mesh vertex: position plus flat per-triangle normal.
///
/// `#[repr(C)]` with two `[f32; 3]` fields, so a slice of vertices can be viewed
/// as a flat `[f32]` buffer without copying.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Unit normal shared by the three vertices of the owning triangle.
    pub normal: [f32; 3],
}

impl Vertex {
    /// The wgpu vertex buffer layout for [`Vertex`].
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    /// Layout of the 2D overlay vertices produced by [`crosshair_lines`].
    pub const OVERLAY_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: (FLOATS_PER_OVERLAY_VERTEX * std::mem::size_of::<f32>()) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x2,
        }],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// Views a vertex slice as the flat float buffer handed to the renderer backend.
pub fn as_floats(vertices: &[Vertex]) -> &[f32] {
    bytemuck::cast_slice(vertices)
}

/// Flat normal of the triangle `(a, b, c)`: `normalize(cross(b - a, c - a))`.
///
/// Zero-area triangles (the pole caps of a [`sphere`]) yield a zero vector
/// instead of NaN.
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

fn push_triangle(out: &mut Vec<Vertex>, a: Vec3, b: Vec3, c: Vec3) {
    let normal = triangle_normal(a, b, c).to_array();
    out.extend_from_slice(&[
        Vertex::new(a.to_array(), normal),
        Vertex::new(b.to_array(), normal),
        Vertex::new(c.to_array(), normal),
    ]);
}

/// Unit direction reached by rotating +Y about the depth (Z) axis by `vertical`
/// degrees, then about the vertical (Y) axis by `horizontal` degrees.
fn surface_direction(horizontal: f32, vertical: f32) -> Vec3 {
    Quat::from_rotation_y(horizontal.to_radians())
        * Quat::from_rotation_z(vertical.to_radians())
        * Vec3::Y
}

/// Generates a flat-shaded UV-sphere.
///
/// `smoothness` (N) controls both the number of vertical bands and the number of
/// cells per band. Band `i` sits at `180°·i/N` from the top pole; odd bands are
/// shifted by half a cell (`180°/N`) so cells stagger like bricks. Each cell emits
/// two triangles:
///
/// - the base point and the two half-cell neighbours one half-band lower
/// - the base point, the previous cell's base point and the lower-left neighbour
///
/// # Geometry Details
///
/// - **Triangles**: `2 × N²` (N = 0, or an N whose vertex count overflows
///   `usize`, produces an empty buffer)
/// - **Vertices**: `6 × N²`, none shared
/// - **Normals**: one per triangle, duplicated onto its three vertices
///
/// The first band's second triangle and the last band's first triangle collapse
/// onto the poles; they are kept so the triangle count stays `2·N²`, and render
/// as zero-area primitives.
pub fn sphere(center: Vec3, radius: f32, smoothness: u32) -> Vec<Vertex> {
    if smoothness == 0 {
        return Vec::new();
    }
    let cells = smoothness as usize;
    let Some(capacity) = cells.checked_mul(cells).and_then(|n| n.checked_mul(6)) else {
        tracing::warn!(smoothness, "sphere vertex count overflows, generating nothing");
        return Vec::new();
    };
    let mut vertices = Vec::with_capacity(capacity);

    let sides = smoothness as f32;
    let half_cell = 180.0 / sides;
    let full_cell = 360.0 / sides;
    let point = |horizontal: f32, vertical: f32| {
        center + radius * surface_direction(horizontal, vertical)
    };

    for i in 0..smoothness {
        let vertical = 180.0 * i as f32 / sides;
        let offset = if i % 2 == 1 { half_cell } else { 0.0 };

        for j in 0..smoothness {
            let horizontal = 360.0 * j as f32 / sides + offset;

            let base = point(horizontal, vertical);
            let lower_left = point(horizontal - half_cell, vertical + half_cell);
            let lower_right = point(horizontal + half_cell, vertical + half_cell);
            let previous = point(horizontal - full_cell, vertical);

            push_triangle(&mut vertices, base, lower_left, lower_right);
            push_triangle(&mut vertices, base, previous, lower_left);
        }
    }

    vertices
}

// Unit cube centred on the origin, two triangles per face, outward normals.
#[rustfmt::skip]
const UNIT_CUBE: [[f32; 6]; 36] = [
    // Back face (Z-)
    [-0.5, -0.5, -0.5,  0.0,  0.0, -1.0],
    [ 0.5, -0.5, -0.5,  0.0,  0.0, -1.0],
    [ 0.5,  0.5, -0.5,  0.0,  0.0, -1.0],
    [ 0.5,  0.5, -0.5,  0.0,  0.0, -1.0],
    [-0.5,  0.5, -0.5,  0.0,  0.0, -1.0],
    [-0.5, -0.5, -0.5,  0.0,  0.0, -1.0],
    // Front face (Z+)
    [-0.5, -0.5,  0.5,  0.0,  0.0,  1.0],
    [ 0.5, -0.5,  0.5,  0.0,  0.0,  1.0],
    [ 0.5,  0.5,  0.5,  0.0,  0.0,  1.0],
    [ 0.5,  0.5,  0.5,  0.0,  0.0,  1.0],
    [-0.5,  0.5,  0.5,  0.0,  0.0,  1.0],
    [-0.5, -0.5,  0.5,  0.0,  0.0,  1.0],
    // Left face (X-)
    [-0.5,  0.5,  0.5, -1.0,  0.0,  0.0],
    [-0.5,  0.5, -0.5, -1.0,  0.0,  0.0],
    [-0.5, -0.5, -0.5, -1.0,  0.0,  0.0],
    [-0.5, -0.5, -0.5, -1.0,  0.0,  0.0],
    [-0.5, -0.5,  0.5, -1.0,  0.0,  0.0],
    [-0.5,  0.5,  0.5, -1.0,  0.0,  0.0],
    // Right face (X+)
    [ 0.5,  0.5,  0.5,  1.0,  0.0,  0.0],
    [ 0.5,  0.5, -0.5,  1.0,  0.0,  0.0],
    [ 0.5, -0.5, -0.5,  1.0,  0.0,  0.0],
    [ 0.5, -0.5, -0.5,  1.0,  0.0,  0.0],
    [ 0.5, -0.5,  0.5,  1.0,  0.0,  0.0],
    [ 0.5,  0.5,  0.5,  1.0,  0.0,  0.0],
    // Bottom face (Y-)
    [-0.5, -0.5, -0.5,  0.0, -1.0,  0.0],
    [ 0.5, -0.5, -0.5,  0.0, -1.0,  0.0],
    [ 0.5, -0.5,  0.5,  0.0, -1.0,  0.0],
    [ 0.5, -0.5,  0.5,  0.0, -1.0,  0.0],
    [-0.5, -0.5,  0.5,  0.0, -1.0,  0.0],
    [-0.5, -0.5, -0.5,  0.0, -1.0,  0.0],
    // Top face (Y+)
    [-0.5,  0.5, -0.5,  0.0,  1.0,  0.0],
    [ 0.5,  0.5, -0.5,  0.0,  1.0,  0.0],
    [ 0.5,  0.5,  0.5,  0.0,  1.0,  0.0],
    [ 0.5,  0.5,  0.5,  0.0,  1.0,  0.0],
    [-0.5,  0.5,  0.5,  0.0,  1.0,  0.0],
    [-0.5,  0.5, -0.5,  0.0,  1.0,  0.0],
];

/// Generates an axis-aligned box anchored at `origin`.
///
/// The unit-cube template is shifted into `[0, 1]³`; only coordinates above
/// `0.01` are multiplied by the matching entry of `lengths`, then `origin` is
/// added. The box therefore extends from `origin` along the positive axes.
///
/// A negative length does not mirror the box around the origin: the far face
/// moves, the near face stays at the origin.
pub fn cuboid(origin: Vec3, lengths: Vec3) -> Vec<Vertex> {
    UNIT_CUBE
        .iter()
        .map(|v| {
            let mut p = Vec3::new(v[0], v[1], v[2]) + Vec3::splat(0.5);
            for axis in 0..3 {
                if p[axis] > 0.01 {
                    p[axis] *= lengths[axis];
                }
            }
            Vertex::new((p + origin).to_array(), [v[3], v[4], v[5]])
        })
        .collect()
}

/// Four 2D points forming a `+` of `length` pixels centred on the screen.
///
/// Coordinates are in pixels with the origin at the bottom-left corner, laid out
/// as two line segments (horizontal, then vertical).
pub fn crosshair_lines(width: f32, height: f32, length: f32) -> [f32; 8] {
    [
        (width - length) / 2.0,
        height / 2.0,
        (width + length) / 2.0,
        height / 2.0,
        width / 2.0,
        (height - length) / 2.0,
        width / 2.0,
        (height + length) / 2.0,
    ]
}
