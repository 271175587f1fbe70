//! Render submission protocol.
//!
//! The game core never talks to the GPU directly. It drives a [`RenderBackend`]
//! with a small command vocabulary (upload vertex floats, select a program, push
//! named uniforms, draw) and a [`TextRenderer`] for the telemetry overlay.
//!
//! Every lit entity goes through [`render_entity`], which pushes the same nine
//! uniforms in the same order before its draw:
//!
//! | # | name                     | value                  |
//! |---|--------------------------|------------------------|
//! | 1 | `view`                   | camera view matrix     |
//! | 2 | `projection`             | camera projection      |
//! | 3 | `cameraPos`              | camera position        |
//! | 4 | `directLight.direction`  | light direction        |
//! | 5 | `directLight.ambient`    | ambient colour         |
//! | 6 | `directLight.diffuse`    | diffuse colour         |
//! | 7 | `directLight.specular`   | specular colour        |
//! | 8 | `material.shininess`     | Phong exponent         |
//! | 9 | `aColor`                 | surface colour (RGB)   |
//!
//! Vertex buffers live in an arena owned by the backend; entities only keep
//! [`BufferHandle`]s. Dropping the backend releases every buffer.

#[cfg(test)]
pub mod recorder;

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::light::DirectLight;
use crate::mesh::{FLOATS_PER_VERTEX, Vertex, as_floats};

/// Uniform names understood by the shader programs.
pub mod uniforms {
    pub const VIEW: &str = "view";
    pub const PROJECTION: &str = "projection";
    pub const CAMERA_POS: &str = "cameraPos";
    pub const LIGHT_DIRECTION: &str = "directLight.direction";
    pub const LIGHT_AMBIENT: &str = "directLight.ambient";
    pub const LIGHT_DIFFUSE: &str = "directLight.diffuse";
    pub const LIGHT_SPECULAR: &str = "directLight.specular";
    pub const SHININESS: &str = "material.shininess";
    pub const SURFACE_COLOR: &str = "aColor";
    /// Overlay line colour.
    pub const COLOR: &str = "color";

    /// The lit-program uniforms in submission order.
    pub const LIT_ORDER: [&str; 9] = [
        VIEW,
        PROJECTION,
        CAMERA_POS,
        LIGHT_DIRECTION,
        LIGHT_AMBIENT,
        LIGHT_DIFFUSE,
        LIGHT_SPECULAR,
        SHININESS,
        SURFACE_COLOR,
    ];
}

/// Shader programs the game draws with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Program {
    /// Phong-lit world geometry (position + normal vertices).
    Lit,
    /// Flat-coloured screen-space lines (2D position vertices).
    Overlay,
}

impl Program {
    /// Floats per vertex in the buffers this program consumes.
    pub fn vertex_stride(self) -> usize {
        match self {
            Program::Lit => FLOATS_PER_VERTEX,
            Program::Overlay => crate::mesh::FLOATS_PER_OVERLAY_VERTEX,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Lines,
}

/// Index of a vertex buffer in the backend's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) usize);

impl BufferHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named shader parameter value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Uniform {
    Mat4(Mat4),
    Vec3(Vec3),
    Float(f32),
}

/// An RGBA colour with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// From 8-bit channels.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const CYAN: Color = Color::rgb8(0, 255, 255);

    /// Multiply the RGB channels, leaving alpha alone. Values above 1 are kept;
    /// the framebuffer clamps them.
    pub fn scaled(self, factor: f32) -> Self {
        Self::rgba(self.r * factor, self.g * factor, self.b * factor, self.a)
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Per-entity surface parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub shininess: f32,
    pub color: Color,
}

impl Material {
    pub fn new(shininess: f32, color: Color) -> Self {
        Self { shininess, color }
    }
}

/// Per-frame state shared by every lit draw.
#[derive(Clone, Copy, Debug)]
pub struct SceneParams<'a> {
    pub camera: &'a Camera,
    pub light: &'a DirectLight,
}

/// The GPU side of the submission protocol.
///
/// Calls arrive on the event-loop thread, between `begin_frame` and `end_frame`
/// for the drawing calls. Uniforms set before a `draw` apply to that draw.
pub trait RenderBackend {
    /// Whether `program` was built and can be selected.
    fn has_program(&self, program: Program) -> bool;

    /// Upload a flat float buffer and return its arena handle.
    fn create_vertex_buffer(&mut self, floats: &[f32]) -> BufferHandle;

    /// Replace the contents of an existing buffer.
    fn update_vertex_buffer(&mut self, handle: BufferHandle, floats: &[f32]);

    fn use_program(&mut self, program: Program);

    fn set_uniform(&mut self, name: &str, value: Uniform);

    fn draw(&mut self, handle: BufferHandle, primitive: Primitive, vertex_count: u32);

    /// Start a frame, clearing colour and depth.
    fn begin_frame(&mut self, clear: Color);

    /// Submit and present everything drawn since `begin_frame`.
    fn end_frame(&mut self) -> Result<()>;
}

/// Screen text. `x` and `y` are pixels from the bottom-left corner to the
/// baseline start; `scale` multiplies the font's native size.
pub trait TextRenderer {
    fn render_text(&mut self, text: &str, x: f32, y: f32, scale: f32, color: Color);
}

/// Something drawn with the lit program.
pub trait Renderable {
    /// Short name used in diagnostics.
    fn label(&self) -> &str;
    fn material(&self) -> Material;
    fn vertices(&self) -> &[Vertex];
    /// `None` until the vertices have been uploaded.
    fn vertex_buffer(&self) -> Option<BufferHandle>;
}

/// Number of vertices in `floats`, or an error if it cannot be drawn.
pub fn validate_vertex_floats(label: &str, floats: &[f32], stride: usize) -> Result<u32> {
    if floats.is_empty() {
        return Err(Error::EmptyGeometry(label.to_owned()));
    }
    if stride == 0 || floats.len() % stride != 0 {
        return Err(Error::MalformedVertexBuffer {
            len: floats.len(),
            stride,
        });
    }
    Ok((floats.len() / stride) as u32)
}

/// Push the nine lit-program uniforms for one draw.
pub fn submit_material<B: RenderBackend + ?Sized>(
    backend: &mut B,
    scene: &SceneParams<'_>,
    material: &Material,
) {
    let camera = scene.camera;
    let light = scene.light;
    backend.set_uniform(uniforms::VIEW, Uniform::Mat4(camera.view_matrix()));
    backend.set_uniform(uniforms::PROJECTION, Uniform::Mat4(camera.projection_matrix()));
    backend.set_uniform(uniforms::CAMERA_POS, Uniform::Vec3(camera.position()));
    backend.set_uniform(uniforms::LIGHT_DIRECTION, Uniform::Vec3(light.direction));
    backend.set_uniform(uniforms::LIGHT_AMBIENT, Uniform::Vec3(light.ambient));
    backend.set_uniform(uniforms::LIGHT_DIFFUSE, Uniform::Vec3(light.diffuse));
    backend.set_uniform(uniforms::LIGHT_SPECULAR, Uniform::Vec3(light.specular));
    backend.set_uniform(uniforms::SHININESS, Uniform::Float(material.shininess));
    backend.set_uniform(uniforms::SURFACE_COLOR, Uniform::Vec3(material.color.to_vec3()));
}

/// Draw one lit entity: select the program, push its uniforms, issue the draw.
///
/// Entities with no uploaded buffer or with unusable geometry are skipped with a
/// warning. Returns whether a draw was issued.
pub fn render_entity<B, R>(backend: &mut B, scene: &SceneParams<'_>, entity: &R) -> bool
where
    B: RenderBackend + ?Sized,
    R: Renderable + ?Sized,
{
    let Some(handle) = entity.vertex_buffer() else {
        tracing::warn!(entity = entity.label(), "skipping draw: vertices not uploaded");
        return false;
    };

    let floats = as_floats(entity.vertices());
    let vertex_count = match validate_vertex_floats(entity.label(), floats, FLOATS_PER_VERTEX) {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(entity = entity.label(), "skipping draw: {err}");
            return false;
        }
    };

    backend.use_program(Program::Lit);
    submit_material(backend, scene, &entity.material());
    backend.draw(handle, Primitive::Triangles, vertex_count);
    true
}
