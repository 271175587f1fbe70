//! A [`RenderBackend`] and [`TextRenderer`] that records calls instead of drawing.

use std::collections::HashSet;

use super::{BufferHandle, Color, Primitive, Program, RenderBackend, TextRenderer, Uniform};
use crate::error::Result;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    BeginFrame(Color),
    CreateBuffer { handle: BufferHandle, floats: usize },
    UpdateBuffer { handle: BufferHandle, floats: usize },
    UseProgram(Program),
    SetUniform(String, Uniform),
    Draw {
        handle: BufferHandle,
        primitive: Primitive,
        vertex_count: u32,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        scale: f32,
    },
    EndFrame,
}

pub struct RecordingBackend {
    calls: Vec<Call>,
    buffers: Vec<Vec<f32>>,
    programs: HashSet<Program>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            buffers: Vec::new(),
            programs: [Program::Lit, Program::Overlay].into_iter().collect(),
        }
    }

    pub fn without_program(mut self, program: Program) -> Self {
        self.programs.remove(&program);
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn buffer(&self, handle: BufferHandle) -> &[f32] {
        &self.buffers[handle.0]
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Draw { .. }))
            .count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_uniform(&self, name: &str) -> Option<Uniform> {
        self.calls.iter().rev().find_map(|call| match call {
            Call::SetUniform(n, value) if n == name => Some(*value),
            _ => None,
        })
    }
}

impl RenderBackend for RecordingBackend {
    fn has_program(&self, program: Program) -> bool {
        self.programs.contains(&program)
    }

    fn create_vertex_buffer(&mut self, floats: &[f32]) -> BufferHandle {
        let handle = BufferHandle(self.buffers.len());
        self.buffers.push(floats.to_vec());
        self.calls.push(Call::CreateBuffer {
            handle,
            floats: floats.len(),
        });
        handle
    }

    fn update_vertex_buffer(&mut self, handle: BufferHandle, floats: &[f32]) {
        self.buffers[handle.0] = floats.to_vec();
        self.calls.push(Call::UpdateBuffer {
            handle,
            floats: floats.len(),
        });
    }

    fn use_program(&mut self, program: Program) {
        self.calls.push(Call::UseProgram(program));
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) {
        self.calls.push(Call::SetUniform(name.to_owned(), value));
    }

    fn draw(&mut self, handle: BufferHandle, primitive: Primitive, vertex_count: u32) {
        self.calls.push(Call::Draw {
            handle,
            primitive,
            vertex_count,
        });
    }

    fn begin_frame(&mut self, clear: Color) {
        self.calls.push(Call::BeginFrame(clear));
    }

    fn end_frame(&mut self) -> Result<()> {
        self.calls.push(Call::EndFrame);
        Ok(())
    }
}

impl TextRenderer for RecordingBackend {
    fn render_text(&mut self, text: &str, x: f32, y: f32, scale: f32, _color: Color) {
        self.calls.push(Call::Text {
            text: text.to_owned(),
            x,
            y,
            scale,
        });
    }
}
