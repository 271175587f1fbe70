//! wgpu implementation of [`RenderBackend`] and [`TextRenderer`].
//!
//! Draws are not encoded immediately. Each [`RenderBackend::draw`] snapshots the
//! current uniform block of the active program into a per-program staging area
//! (one slot per draw, aligned for dynamic offsets) and records a command. At
//! [`RenderBackend::end_frame`] the staging areas and queued text are uploaded
//! and everything is replayed in a single render pass:
//!
//! 1. clear colour and depth
//! 2. recorded draws, in submission order
//! 3. telemetry text on top
//!
//! # Programs
//!
//! | Program   | Shader         | Topology  | Vertex layout          |
//! |-----------|----------------|-----------|------------------------|
//! | `Lit`     | `scene.wgsl`   | triangles | position + normal      |
//! | `Overlay` | `overlay.wgsl` | lines     | 2D pixel position      |
//!
//! Both programs are built when the backend is created, so neither can be
//! missing at runtime.

use std::collections::HashSet;
use std::mem::size_of;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::error::Result;
use crate::font::{FontAtlas, GlyphQuad};
use crate::gpu::GpuContext;
use crate::mesh::Vertex;
use crate::render::{
    BufferHandle, Color, Primitive, Program, RenderBackend, TextRenderer, Uniform, uniforms,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform block of `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SceneUniforms {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    camera_pos: [f32; 3],
    shininess: f32,
    light_direction: [f32; 3],
    _pad0: f32,
    light_ambient: [f32; 3],
    _pad1: f32,
    light_diffuse: [f32; 3],
    _pad2: f32,
    light_specular: [f32; 3],
    _pad3: f32,
    color: [f32; 3],
    _pad4: f32,
}

/// Uniform block of `overlay.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct OverlayUniforms {
    projection: [[f32; 4]; 4],
    color: [f32; 3],
    _pad: f32,
}

/// Write a named value into the scene block. Returns false if the name is
/// unknown or the value has the wrong type.
fn apply_scene_uniform(block: &mut SceneUniforms, name: &str, value: Uniform) -> bool {
    match (name, value) {
        (uniforms::VIEW, Uniform::Mat4(m)) => block.view = m.to_cols_array_2d(),
        (uniforms::PROJECTION, Uniform::Mat4(m)) => block.projection = m.to_cols_array_2d(),
        (uniforms::CAMERA_POS, Uniform::Vec3(v)) => block.camera_pos = v.to_array(),
        (uniforms::LIGHT_DIRECTION, Uniform::Vec3(v)) => block.light_direction = v.to_array(),
        (uniforms::LIGHT_AMBIENT, Uniform::Vec3(v)) => block.light_ambient = v.to_array(),
        (uniforms::LIGHT_DIFFUSE, Uniform::Vec3(v)) => block.light_diffuse = v.to_array(),
        (uniforms::LIGHT_SPECULAR, Uniform::Vec3(v)) => block.light_specular = v.to_array(),
        (uniforms::SHININESS, Uniform::Float(f)) => block.shininess = f,
        (uniforms::SURFACE_COLOR, Uniform::Vec3(v)) => block.color = v.to_array(),
        _ => return false,
    }
    true
}

fn apply_overlay_uniform(block: &mut OverlayUniforms, name: &str, value: Uniform) -> bool {
    match (name, value) {
        (uniforms::PROJECTION, Uniform::Mat4(m)) => block.projection = m.to_cols_array_2d(),
        (uniforms::COLOR, Uniform::Vec3(v)) => block.color = v.to_array(),
        _ => return false,
    }
    true
}

fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// A vertex of a glyph quad, already in normalised device coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct TextVertex {
    position: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

impl TextVertex {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: size_of::<TextVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// Two triangles covering `quad`, converted from bottom-left pixel space to NDC.
fn glyph_vertices(quad: &GlyphQuad, width: f32, height: f32, color: Color) -> [TextVertex; 6] {
    let to_ndc = |x: f32, y: f32| [x / width * 2.0 - 1.0, y / height * 2.0 - 1.0];
    let color = color.to_array();
    let vertex = |x: f32, y: f32, u: f32, v: f32| TextVertex {
        position: to_ndc(x, y),
        uv: [u, v],
        color,
    };

    let (min, max) = (quad.min, quad.max);
    let (uv0, uv1) = (quad.uv_min, quad.uv_max);
    let bottom_left = vertex(min.x, min.y, uv0.x, uv1.y);
    let bottom_right = vertex(max.x, min.y, uv1.x, uv1.y);
    let top_left = vertex(min.x, max.y, uv0.x, uv0.y);
    let top_right = vertex(max.x, max.y, uv1.x, uv0.y);

    [bottom_left, bottom_right, top_left, bottom_right, top_right, top_left]
}

/// One uniform block per draw, packed at `stride` for dynamic offsets.
struct UniformRing<T: Pod> {
    current: T,
    staging: Vec<u8>,
    stride: u64,
    buffer: wgpu::Buffer,
    capacity: u64,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    label: &'static str,
}

impl<T: Pod> UniformRing<T> {
    const INITIAL_SLOTS: u64 = 16;

    fn new(device: &wgpu::Device, label: &'static str, alignment: u32) -> Self {
        let stride = align_to(size_of::<T>() as u64, alignment.max(1) as u64);
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(size_of::<T>() as u64),
                },
                count: None,
            }],
        });
        let capacity = stride * Self::INITIAL_SLOTS;
        let buffer = Self::create_buffer(device, label, capacity);
        let bind_group = Self::create_bind_group(device, label, &layout, &buffer);

        Self {
            current: T::zeroed(),
            staging: Vec::with_capacity(capacity as usize),
            stride,
            buffer,
            capacity,
            layout,
            bind_group,
            label,
        }
    }

    fn create_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(size_of::<T>() as u64),
                }),
            }],
        })
    }

    /// Snapshot `current` into the next slot and return its byte offset.
    fn push(&mut self) -> u32 {
        let offset = self.staging.len();
        self.staging.resize(offset + self.stride as usize, 0);
        let bytes = bytemuck::bytes_of(&self.current);
        self.staging[offset..offset + bytes.len()].copy_from_slice(bytes);
        offset as u32
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let needed = self.staging.len() as u64;
        if needed == 0 {
            return;
        }
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::create_buffer(device, self.label, self.capacity);
            self.bind_group =
                Self::create_bind_group(device, self.label, &self.layout, &self.buffer);
            tracing::debug!(label = self.label, bytes = self.capacity, "grew uniform buffer");
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
    }

    fn clear(&mut self) {
        self.staging.clear();
    }
}

struct ArenaBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
}

#[derive(Clone, Copy, Debug)]
struct DrawCommand {
    program: Program,
    buffer: usize,
    vertex_count: u32,
    uniform_offset: u32,
}

struct TextLayer {
    atlas: FontAtlas,
    bind_group: wgpu::BindGroup,
    vertices: Vec<TextVertex>,
    buffer: wgpu::Buffer,
    capacity: u64,
}

pub struct WgpuBackend {
    gpu: GpuContext,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    scene_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    text_pipeline: wgpu::RenderPipeline,
    scene_uniforms: UniformRing<SceneUniforms>,
    overlay_uniforms: UniformRing<OverlayUniforms>,
    buffers: Vec<ArenaBuffer>,
    commands: Vec<DrawCommand>,
    program: Option<Program>,
    clear_color: wgpu::Color,
    text: Option<TextLayer>,
    warned: HashSet<String>,
}

impl WgpuBackend {
    /// Build pipelines and upload the glyph atlas. Without an atlas, text is skipped.
    pub fn new(gpu: GpuContext, atlas: Option<FontAtlas>) -> Self {
        let device = &gpu.device;
        let format = gpu.config.format;
        let alignment = device.limits().min_uniform_buffer_offset_alignment;

        let scene_uniforms = UniformRing::<SceneUniforms>::new(device, "Scene Uniforms", alignment);
        let overlay_uniforms =
            UniformRing::<OverlayUniforms>::new(device, "Overlay Uniforms", alignment);

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });
        let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });
        let text_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Text Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/text.wgsl").into()),
        });

        let scene_pipeline = create_pipeline(
            device,
            "Scene Pipeline",
            &scene_shader,
            &scene_uniforms.layout,
            Vertex::LAYOUT,
            wgpu::PrimitiveTopology::TriangleList,
            format,
            true,
        );
        let overlay_pipeline = create_pipeline(
            device,
            "Overlay Pipeline",
            &overlay_shader,
            &overlay_uniforms.layout,
            Vertex::OVERLAY_LAYOUT,
            wgpu::PrimitiveTopology::LineList,
            format,
            false,
        );

        let text_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Text Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let text_pipeline = create_pipeline(
            device,
            "Text Pipeline",
            &text_shader,
            &text_layout,
            TextVertex::LAYOUT,
            wgpu::PrimitiveTopology::TriangleList,
            format,
            false,
        );

        let text = atlas.map(|atlas| create_text_layer(&gpu, &text_layout, atlas));
        let depth_view = create_depth_view(&gpu);
        let depth_size = (gpu.width(), gpu.height());

        tracing::info!(format = ?format, text = text.is_some(), "renderer ready");

        Self {
            depth_view,
            depth_size,
            scene_pipeline,
            overlay_pipeline,
            text_pipeline,
            scene_uniforms,
            overlay_uniforms,
            buffers: Vec::new(),
            commands: Vec::new(),
            program: None,
            clear_color: wgpu::Color::BLACK,
            text,
            warned: HashSet::new(),
            gpu,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    pub fn width(&self) -> u32 {
        self.gpu.width()
    }

    pub fn height(&self) -> u32 {
        self.gpu.height()
    }

    fn warn_once(&mut self, key: String, message: &str) {
        if self.warned.insert(key.clone()) {
            tracing::warn!(key = %key, "{message}");
        }
    }

    fn ensure_depth_size(&mut self) {
        let size = (self.gpu.width(), self.gpu.height());
        if self.depth_size != size {
            self.depth_view = create_depth_view(&self.gpu);
            self.depth_size = size;
        }
    }

    fn upload_text(&mut self) {
        let Some(text) = &mut self.text else {
            return;
        };
        if text.vertices.is_empty() {
            return;
        }
        let bytes: &[u8] = bytemuck::cast_slice(&text.vertices);
        if bytes.len() as u64 > text.capacity {
            text.capacity = (bytes.len() as u64).next_power_of_two();
            text.buffer =
                create_vertex_buffer(&self.gpu.device, "Text Vertex Buffer", text.capacity);
        }
        self.gpu.queue.write_buffer(&text.buffer, 0, bytes);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: align_to(size.max(4), wgpu::COPY_BUFFER_ALIGNMENT),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    bind_group_layout: &wgpu::BindGroupLayout,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    // Overlay layers ignore depth but must still match the pass's attachment.
    let depth_compare = if depth_write {
        wgpu::CompareFunction::Less
    } else {
        wgpu::CompareFunction::Always
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs"),
            buffers: &[vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_text_layer(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    atlas: FontAtlas,
) -> TextLayer {
    let size = wgpu::Extent3d {
        width: atlas.width(),
        height: atlas.height(),
        depth_or_array_layers: 1,
    };
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Font Atlas"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        atlas.bitmap(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(atlas.width()),
            rows_per_image: Some(atlas.height()),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Font Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Font Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });

    let capacity = (size_of::<TextVertex>() * 6 * 256) as u64;
    TextLayer {
        atlas,
        bind_group,
        vertices: Vec::new(),
        buffer: create_vertex_buffer(&gpu.device, "Text Vertex Buffer", capacity),
        capacity,
    }
}

impl RenderBackend for WgpuBackend {
    fn has_program(&self, _program: Program) -> bool {
        true
    }

    fn create_vertex_buffer(&mut self, floats: &[f32]) -> BufferHandle {
        let bytes: &[u8] = bytemuck::cast_slice(floats);
        let capacity = bytes.len() as u64;
        let buffer = create_vertex_buffer(&self.gpu.device, "Vertex Buffer", capacity);
        if !bytes.is_empty() {
            self.gpu.queue.write_buffer(&buffer, 0, bytes);
        }
        let handle = BufferHandle(self.buffers.len());
        self.buffers.push(ArenaBuffer { buffer, capacity });
        tracing::debug!(handle = handle.index(), bytes = capacity, "created vertex buffer");
        handle
    }

    fn update_vertex_buffer(&mut self, handle: BufferHandle, floats: &[f32]) {
        let bytes: &[u8] = bytemuck::cast_slice(floats);
        let Some(entry) = self.buffers.get_mut(handle.index()) else {
            tracing::warn!(handle = handle.index(), "update of unknown vertex buffer");
            return;
        };
        if bytes.len() as u64 > entry.capacity {
            entry.capacity = bytes.len() as u64;
            entry.buffer = create_vertex_buffer(&self.gpu.device, "Vertex Buffer", entry.capacity);
        }
        if !bytes.is_empty() {
            self.gpu.queue.write_buffer(&entry.buffer, 0, bytes);
        }
    }

    fn use_program(&mut self, program: Program) {
        self.program = Some(program);
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) {
        let applied = match self.program {
            Some(Program::Lit) => {
                apply_scene_uniform(&mut self.scene_uniforms.current, name, value)
            }
            Some(Program::Overlay) => {
                apply_overlay_uniform(&mut self.overlay_uniforms.current, name, value)
            }
            None => false,
        };
        if !applied {
            let key = format!("{:?}/{name}", self.program);
            self.warn_once(key, "ignoring uniform the active program does not declare");
        }
    }

    fn draw(&mut self, handle: BufferHandle, primitive: Primitive, vertex_count: u32) {
        let Some(program) = self.program else {
            self.warn_once("draw/no-program".to_owned(), "draw without a program");
            return;
        };
        let expected = match program {
            Program::Lit => Primitive::Triangles,
            Program::Overlay => Primitive::Lines,
        };
        if primitive != expected {
            self.warn_once(
                format!("draw/{program:?}/{primitive:?}"),
                "primitive does not match the program's topology",
            );
            return;
        }

        let stride = (program.vertex_stride() * size_of::<f32>()) as u64;
        let Some(entry) = self.buffers.get(handle.index()) else {
            self.warn_once(
                format!("draw/buffer/{}", handle.index()),
                "draw of unknown vertex buffer",
            );
            return;
        };
        if vertex_count == 0 || vertex_count as u64 * stride > entry.capacity {
            self.warn_once(
                format!("draw/range/{}", handle.index()),
                "vertex count outside the buffer",
            );
            return;
        }

        let uniform_offset = match program {
            Program::Lit => self.scene_uniforms.push(),
            Program::Overlay => self.overlay_uniforms.push(),
        };
        self.commands.push(DrawCommand {
            program,
            buffer: handle.index(),
            vertex_count,
            uniform_offset,
        });
    }

    fn begin_frame(&mut self, clear: Color) {
        self.commands.clear();
        self.scene_uniforms.clear();
        self.overlay_uniforms.clear();
        if let Some(text) = &mut self.text {
            text.vertices.clear();
        }
        self.program = None;
        self.clear_color = wgpu::Color {
            r: clear.r as f64,
            g: clear.g as f64,
            b: clear.b as f64,
            a: clear.a as f64,
        };
    }

    fn end_frame(&mut self) -> Result<()> {
        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                tracing::debug!("surface {err}; reconfiguring");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface texture timed out; dropping frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        self.ensure_depth_size();
        self.scene_uniforms.upload(&self.gpu.device, &self.gpu.queue);
        self.overlay_uniforms.upload(&self.gpu.device, &self.gpu.queue);
        self.upload_text();

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for command in &self.commands {
                let (pipeline, bind_group) = match command.program {
                    Program::Lit => (&self.scene_pipeline, &self.scene_uniforms.bind_group),
                    Program::Overlay => (&self.overlay_pipeline, &self.overlay_uniforms.bind_group),
                };
                let bytes = command.vertex_count as u64
                    * (command.program.vertex_stride() * size_of::<f32>()) as u64;

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, bind_group, &[command.uniform_offset]);
                pass.set_vertex_buffer(0, self.buffers[command.buffer].buffer.slice(0..bytes));
                pass.draw(0..command.vertex_count, 0..1);
            }

            if let Some(text) = &self.text {
                if !text.vertices.is_empty() {
                    let bytes = (text.vertices.len() * size_of::<TextVertex>()) as u64;
                    pass.set_pipeline(&self.text_pipeline);
                    pass.set_bind_group(0, &text.bind_group, &[]);
                    pass.set_vertex_buffer(0, text.buffer.slice(0..bytes));
                    pass.draw(0..text.vertices.len() as u32, 0..1);
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl TextRenderer for WgpuBackend {
    fn render_text(&mut self, text: &str, x: f32, y: f32, scale: f32, color: Color) {
        let (width, height) = (self.gpu.width() as f32, self.gpu.height() as f32);
        let Some(layer) = &mut self.text else {
            self.warn_once("text/no-font".to_owned(), "no font loaded; skipping text");
            return;
        };
        for quad in layer.atlas.layout(text, x, y, scale) {
            layer
                .vertices
                .extend_from_slice(&glyph_vertices(&quad, width, height, color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec2, Vec3};

    #[test]
    fn uniform_blocks_match_wgsl_layout() {
        assert_eq!(size_of::<SceneUniforms>(), 224);
        assert_eq!(std::mem::offset_of!(SceneUniforms, camera_pos), 128);
        assert_eq!(std::mem::offset_of!(SceneUniforms, shininess), 140);
        assert_eq!(std::mem::offset_of!(SceneUniforms, light_ambient), 160);
        assert_eq!(std::mem::offset_of!(SceneUniforms, color), 208);
        assert_eq!(size_of::<OverlayUniforms>(), 80);
    }

    #[test]
    fn every_lit_uniform_has_a_slot() {
        let mut block = SceneUniforms::zeroed();
        let values = [
            Uniform::Mat4(Mat4::IDENTITY),
            Uniform::Mat4(Mat4::IDENTITY),
            Uniform::Vec3(Vec3::ONE),
            Uniform::Vec3(Vec3::new(-2.0, -3.0, -3.0)),
            Uniform::Vec3(Vec3::splat(0.3)),
            Uniform::Vec3(Vec3::splat(0.4)),
            Uniform::Vec3(Vec3::splat(0.1)),
            Uniform::Float(8.0),
            Uniform::Vec3(Vec3::new(0.0, 1.0, 1.0)),
        ];
        for (name, value) in uniforms::LIT_ORDER.iter().zip(values) {
            assert!(apply_scene_uniform(&mut block, name, value), "{name} rejected");
        }
        assert_eq!(block.shininess, 8.0);
        assert_eq!(block.light_direction, [-2.0, -3.0, -3.0]);
        assert_eq!(block.color, [0.0, 1.0, 1.0]);
        assert_eq!(block.view, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn mismatched_uniforms_are_rejected() {
        let mut scene = SceneUniforms::zeroed();
        assert!(!apply_scene_uniform(&mut scene, uniforms::SHININESS, Uniform::Vec3(Vec3::ONE)));
        assert!(!apply_scene_uniform(&mut scene, "lightPos", Uniform::Vec3(Vec3::ONE)));

        let mut overlay = OverlayUniforms::zeroed();
        assert!(apply_overlay_uniform(&mut overlay, uniforms::COLOR, Uniform::Vec3(Vec3::X)));
        assert!(!apply_overlay_uniform(
            &mut overlay,
            uniforms::SURFACE_COLOR,
            Uniform::Vec3(Vec3::X)
        ));
    }

    #[test]
    fn alignment_rounds_up() {
        assert_eq!(align_to(224, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(80, 1), 80);
    }

    #[test]
    fn glyph_quads_map_to_ndc_with_flipped_v() {
        let quad = GlyphQuad {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(400.0, 300.0),
            uv_min: Vec2::new(0.1, 0.2),
            uv_max: Vec2::new(0.3, 0.4),
        };
        let vertices = glyph_vertices(&quad, 800.0, 600.0, Color::BLACK);

        let bottom_left = vertices[0];
        assert_eq!(bottom_left.position, [-1.0, -1.0]);
        assert_eq!(bottom_left.uv, [0.1, 0.4]);

        let top_right = vertices[4];
        assert_eq!(top_right.position, [0.0, 0.0]);
        assert_eq!(top_right.uv, [0.3, 0.2]);
        assert_eq!(top_right.color, [0.0, 0.0, 0.0, 1.0]);
    }
}
