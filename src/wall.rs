//! Static room geometry.

use glam::Vec3;

use crate::mesh::{self, Vertex, as_floats};
use crate::render::{
    BufferHandle, Color, Material, RenderBackend, Renderable, SceneParams, render_entity,
};

pub const WALL_SHININESS: f32 = 16.0;

/// An axis-aligned box anchored at its minimum corner. Its mesh is built once
/// and never changes.
#[derive(Clone, Debug)]
pub struct Wall {
    name: &'static str,
    color: Color,
    vertices: Vec<Vertex>,
    buffer: Option<BufferHandle>,
}

impl Wall {
    pub fn new(name: &'static str, origin: Vec3, lengths: Vec3, color: Color) -> Self {
        Self {
            name,
            color,
            vertices: mesh::cuboid(origin, lengths),
            buffer: None,
        }
    }

    /// The floor, back, left and right walls of the practice room.
    pub fn room(wall_color: Color) -> Vec<Wall> {
        vec![
            Wall::new("floor", Vec3::ZERO, Vec3::new(40.0, 0.01, 20.0), wall_color.scaled(1.2)),
            Wall::new("back wall", Vec3::ZERO, Vec3::new(40.0, 18.0, 0.01), wall_color),
            Wall::new("left wall", Vec3::ZERO, Vec3::new(0.01, 18.0, 20.0), wall_color),
            Wall::new(
                "right wall",
                Vec3::new(40.0, 0.0, 0.0),
                Vec3::new(0.01, 18.0, 20.0),
                wall_color,
            ),
        ]
    }

    /// Upload the mesh. Calling it again is a no-op.
    pub fn upload<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.buffer.is_none() {
            self.buffer = Some(backend.create_vertex_buffer(as_floats(&self.vertices)));
        }
    }

    pub fn render<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        scene: &SceneParams<'_>,
    ) -> bool {
        render_entity(backend, scene, self)
    }
}

impl Renderable for Wall {
    fn label(&self) -> &str {
        self.name
    }

    fn material(&self) -> Material {
        Material::new(WALL_SHININESS, self.color)
    }

    fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn vertex_buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recorder::RecordingBackend;

    #[test]
    fn room_has_four_boxes_of_36_vertices() {
        let room = Wall::room(Color::rgb8(255, 229, 204));
        assert_eq!(room.len(), 4);
        for wall in &room {
            assert_eq!(wall.vertices().len(), 36);
        }
    }

    #[test]
    fn floor_is_brighter_than_walls() {
        let color = Color::rgb8(255, 229, 204);
        let room = Wall::room(color);
        assert_eq!(room[0].material().color, color.scaled(1.2));
        assert_eq!(room[1].material().color, color);
        assert_eq!(room[1].material().shininess, WALL_SHININESS);
    }

    #[test]
    fn right_wall_sits_at_far_x() {
        let room = Wall::room(Color::WHITE);
        let right = &room[3];
        for vertex in right.vertices() {
            assert!(vertex.position[0] >= 40.0 - 1e-5);
            assert!(vertex.position[0] <= 40.01 + 1e-5);
        }
    }

    #[test]
    fn upload_happens_once() {
        let mut backend = RecordingBackend::new();
        let mut wall = Wall::new("box", Vec3::ZERO, Vec3::ONE, Color::WHITE);
        wall.upload(&mut backend);
        wall.upload(&mut backend);
        assert_eq!(backend.buffer_count(), 1);
        assert_eq!(backend.buffer(wall.vertex_buffer().unwrap()).len(), 36 * 6);
    }
}
