//! Sphere targets.
//!
//! A [`Target`] generates its sphere mesh once, at [`Target::init`]. After that it
//! only ever moves rigidly: a hit re-assigns it to a free grid slot and every
//! vertex is translated by the change in centre. The GPU copy is refreshed lazily
//! on the next render.

use glam::Vec3;
use rand::Rng;

use crate::error::Result;
use crate::grid::SlotGrid;
use crate::mesh::{self, Vertex, as_floats};
use crate::picking::Ray;
use crate::render::{
    BufferHandle, Color, Material, RenderBackend, Renderable, SceneParams, render_entity,
};

pub const TARGET_SHININESS: f32 = 8.0;

/// Where a target sits before it is first placed on the grid.
const PLACEHOLDER_CENTER: Vec3 = Vec3::splat(-1.0);

#[derive(Clone, Debug)]
pub struct Target {
    center: Vec3,
    radius: f32,
    color: Color,
    smoothness: u32,
    vertices: Vec<Vertex>,
    slot: Option<usize>,
    buffer: Option<BufferHandle>,
    dirty: bool,
}

impl Target {
    pub fn new(radius: f32, color: Color, smoothness: u32) -> Self {
        Self {
            center: PLACEHOLDER_CENTER,
            radius,
            color,
            smoothness,
            vertices: Vec::new(),
            slot: None,
            buffer: None,
            dirty: false,
        }
    }

    /// Generate the mesh around the current centre and upload it.
    ///
    /// A smoothness of zero yields no geometry; the target then stays
    /// un-uploaded and its draws are skipped.
    pub fn init<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        self.vertices = mesh::sphere(self.center, self.radius, self.smoothness);
        if self.vertices.is_empty() {
            tracing::warn!(smoothness = self.smoothness, "target generated no geometry");
            return;
        }
        self.buffer = Some(backend.create_vertex_buffer(as_floats(&self.vertices)));
        self.dirty = false;
        tracing::debug!(
            triangles = self.vertices.len() / 3,
            "uploaded target mesh"
        );
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// The grid slot currently held, if placed.
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// Whether the vertices changed since the last upload.
    pub fn needs_upload(&self) -> bool {
        self.dirty
    }

    /// Translate the centre and every vertex to `center`. Normals are unchanged.
    pub fn move_to(&mut self, center: Vec3) {
        let delta = center - self.center;
        for vertex in &mut self.vertices {
            vertex.position = (Vec3::from(vertex.position) + delta).to_array();
        }
        self.center = center;
        self.dirty = true;
    }

    /// Move to a random free grid slot, giving up the current one.
    ///
    /// # Errors
    ///
    /// Fails without moving when every slot is taken.
    pub fn assign_grid_slot(&mut self, grid: &mut SlotGrid, rng: &mut impl Rng) -> Result<usize> {
        let slot = grid.reassign(self.slot, rng)?;
        self.slot = Some(slot);
        self.move_to(SlotGrid::slot_position(slot));
        tracing::debug!(slot, center = ?self.center, "target placed");
        Ok(slot)
    }

    /// Move to grid slot `index`, giving up the current one.
    pub fn place_in_slot(&mut self, grid: &mut SlotGrid, index: usize) -> Result<()> {
        grid.claim(self.slot, index)?;
        self.slot = Some(index);
        self.move_to(SlotGrid::slot_position(index));
        Ok(())
    }

    /// Whether the line carrying `ray` passes through this sphere.
    pub fn is_hit_by(&self, ray: &Ray) -> bool {
        ray.hits_sphere(self.center, self.radius)
    }

    /// Refresh the GPU copy if the target moved, then draw it.
    pub fn render<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        scene: &SceneParams<'_>,
    ) -> bool {
        if self.dirty {
            if let Some(handle) = self.buffer {
                backend.update_vertex_buffer(handle, as_floats(&self.vertices));
                self.dirty = false;
            }
        }
        render_entity(backend, scene, self)
    }
}

impl Renderable for Target {
    fn label(&self) -> &str {
        "target"
    }

    fn material(&self) -> Material {
        Material::new(TARGET_SHININESS, self.color)
    }

    fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn vertex_buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }
}
