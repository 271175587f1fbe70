//! Screen-centre crosshair drawn with the overlay program.

use glam::Mat4;

use crate::mesh::crosshair_lines;
use crate::render::{
    BufferHandle, Color, Primitive, Program, RenderBackend, Uniform, uniforms,
};

const CROSSHAIR_VERTICES: u32 = 4;

#[derive(Clone, Debug)]
pub struct Crosshair {
    length: f32,
    color: Color,
    width: f32,
    height: f32,
    buffer: Option<BufferHandle>,
}

impl Crosshair {
    pub fn new(length: f32, color: Color, width: f32, height: f32) -> Self {
        Self {
            length,
            color,
            width,
            height,
            buffer: None,
        }
    }

    /// Pixel-space orthographic projection with the origin at the bottom-left.
    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.width, 0.0, self.height, -1.0, 1.0)
    }

    pub fn upload<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        let lines = crosshair_lines(self.width, self.height, self.length);
        match self.buffer {
            Some(handle) => backend.update_vertex_buffer(handle, &lines),
            None => self.buffer = Some(backend.create_vertex_buffer(&lines)),
        }
    }

    /// Recentre for a new screen size.
    pub fn resize<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        if self.buffer.is_some() {
            self.upload(backend);
        }
    }

    pub fn render<B: RenderBackend + ?Sized>(&self, backend: &mut B) -> bool {
        let Some(handle) = self.buffer else {
            tracing::warn!("skipping crosshair: not uploaded");
            return false;
        };
        backend.use_program(Program::Overlay);
        backend.set_uniform(uniforms::PROJECTION, Uniform::Mat4(self.projection()));
        backend.set_uniform(uniforms::COLOR, Uniform::Vec3(self.color.to_vec3()));
        backend.draw(handle, Primitive::Lines, CROSSHAIR_VERTICES);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recorder::{Call, RecordingBackend};
    use glam::Vec3;

    #[test]
    fn draws_four_line_vertices_with_overlay_uniforms() {
        let mut backend = RecordingBackend::new();
        let mut crosshair = Crosshair::new(10.0, Color::RED, 800.0, 600.0);
        crosshair.upload(&mut backend);
        backend.clear_calls();

        assert!(crosshair.render(&mut backend));
        let calls = backend.calls();
        assert_eq!(calls[0], Call::UseProgram(Program::Overlay));
        assert!(matches!(
            &calls[1],
            Call::SetUniform(name, Uniform::Mat4(_)) if name == "projection"
        ));
        assert_eq!(
            calls[2],
            Call::SetUniform("color".into(), Uniform::Vec3(Vec3::new(1.0, 0.0, 0.0)))
        );
        assert!(matches!(
            calls[3],
            Call::Draw { primitive: Primitive::Lines, vertex_count: 4, .. }
        ));
    }

    #[test]
    fn projection_maps_centre_to_ndc_origin() {
        let crosshair = Crosshair::new(10.0, Color::RED, 1920.0, 1080.0);
        let ndc = crosshair.projection().project_point3(Vec3::new(960.0, 540.0, 0.0));
        assert!(ndc.truncate().length() < 1e-5);
    }

    #[test]
    fn resize_reuploads_centred_lines() {
        let mut backend = RecordingBackend::new();
        let mut crosshair = Crosshair::new(10.0, Color::RED, 800.0, 600.0);
        crosshair.upload(&mut backend);
        crosshair.resize(&mut backend, 1000.0, 500.0);

        let floats = backend.buffer(BufferHandle(0));
        assert_eq!(floats, &crosshair_lines(1000.0, 500.0, 10.0));
        assert_eq!(backend.buffer_count(), 1);
    }

    #[test]
    fn render_before_upload_is_skipped() {
        let mut backend = RecordingBackend::new();
        let crosshair = Crosshair::new(10.0, Color::RED, 800.0, 600.0);
        assert!(!crosshair.render(&mut backend));
        assert!(backend.calls().is_empty());
    }
}
