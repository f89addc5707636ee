//! wgpu Renderer module
//!
//! Owns the GPU device and every GPU object of the session. A frame is two
//! passes: the lit scene (ring screen + floor) goes into an offscreen color
//! target, then a full-screen pass samples that target through the lens
//! distortion shader onto the swapchain. The egui HUD is drawn last.
//!
//! All buffers, textures and bind groups are created in [`Renderer::new`];
//! per frame only uniform buffers and the screen texture contents are written.
//! The offscreen target is rebuilt on resize.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use egui_wgpu::wgpu;
use glam::{Mat4, Vec3};
use log::{info, warn};
use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, Queue, RenderPipeline, Surface};
use winit::window::Window;

use crate::camera::FlyCamera;
use crate::config::AppConfig;
use crate::effects::EffectFlags;
use crate::error::RenderError;
use crate::mesh::{self, Mesh, Vertex};
use crate::shading::{DistortionParams, LightingParams};

const SCENE_CLEAR: wgpu::Color = wgpu::Color { r: 0.05, g: 0.05, b: 0.1, a: 1.0 };
const POST_CLEAR: wgpu::Color = wgpu::Color { r: 0.1, g: 0.1, b: 0.1, a: 1.0 };
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
const SCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const FLOOR_GRAY: [u8; 4] = [200, 200, 200, 255];

// Scene-wide uniforms
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    view_pos: [f32; 4],
    light_dir: [f32; 4],
    light_terms: [f32; 4], // ambient, diffuse, specular, shininess
}

impl SceneUniforms {
    fn new(camera: &FlyCamera, aspect: f32, near: f32, far: f32, lighting: &LightingParams) -> Self {
        Self {
            view_proj: camera.view_projection(aspect, near, far).to_cols_array_2d(),
            view_pos: camera.position().extend(1.0).to_array(),
            light_dir: lighting.light_dir.extend(0.0).to_array(),
            light_terms: [
                lighting.ambient,
                lighting.diffuse,
                lighting.specular,
                lighting.shininess,
            ],
        }
    }
}

// Per-draw uniforms
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    flags: [u32; 4], // use_lighting, dual_lighting
}

impl ObjectUniforms {
    fn new(model: Mat4, use_lighting: bool, dual_lighting: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            flags: [use_lighting as u32, dual_lighting as u32, 0, 0],
        }
    }
}

// Distortion uniforms
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DistortionUniforms {
    time: f32,
    enabled: u32,
    amount_base: f32,
    amount_swing: f32,
    swing_rate: f32,
    chroma: f32,
    padding: [f32; 2],
}

impl DistortionUniforms {
    fn new(params: &DistortionParams, time: f32, enabled: bool) -> Self {
        Self {
            time,
            enabled: enabled as u32,
            amount_base: params.amount_base,
            amount_swing: params.amount_swing,
            swing_rate: params.swing_rate,
            chroma: params.chroma,
            padding: [0.0; 2],
        }
    }
}

/// Static geometry with its own uniforms and texture binding.
struct DrawObject {
    bind_group: BindGroup,
    uniform_buffer: Buffer,
    index_buffer: Buffer,
    vertex_buffer: Buffer,
    index_count: u32,
    model: Mat4,
}

impl DrawObject {
    fn new(
        device: &Device,
        label: &str,
        mesh: &Mesh,
        model: Mat4,
        layout: &BindGroupLayout,
        texture_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: mesh.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Uniform Buffer")),
            contents: bytemuck::bytes_of(&ObjectUniforms::new(model, false, false)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Bind Group")),
            layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: uniform_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(texture_view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        Self {
            bind_group,
            uniform_buffer,
            index_buffer,
            vertex_buffer,
            index_count: mesh.index_count(),
            model,
        }
    }

    fn write_uniforms(&self, queue: &Queue, use_lighting: bool, dual_lighting: bool) {
        let uniforms = ObjectUniforms::new(self.model, use_lighting, dual_lighting);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Color + depth/stencil attachments of the scene pass.
struct OffscreenTarget {
    depth_view: wgpu::TextureView,
    color_view: wgpu::TextureView,
    #[allow(dead_code)]
    depth_texture: wgpu::Texture,
    #[allow(dead_code)]
    color_texture: wgpu::Texture,
}

impl OffscreenTarget {
    /// Creates both attachments inside a validation scope and reports any
    /// failure as an incomplete target.
    fn new(
        device: &Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Depth/Stencil"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::OffscreenIncomplete {
                width,
                height,
                message: error.to_string(),
            });
        }

        Ok(Self { depth_view, color_view, depth_texture, color_texture })
    }
}

/// Fields drop top to bottom: the newest GPU objects go first, the device,
/// surface and window last.
pub struct Renderer {
    // UI Renderer
    egui_renderer: egui_wgpu::Renderer,

    // Post Processing (Distortion)
    distortion_bind_group: BindGroup,
    distortion_buffer: Buffer,
    distortion_pipeline: RenderPipeline,
    distortion_bind_group_layout: BindGroupLayout,
    offscreen: OffscreenTarget,
    offscreen_sampler: wgpu::Sampler,

    // Scene geometry
    floor: Option<DrawObject>,
    ring: DrawObject,
    #[allow(dead_code)]
    floor_texture: wgpu::Texture,
    screen_texture: wgpu::Texture,
    screen_size: (u32, u32),
    screen_payload_len: usize,

    // Main Scene
    scene_bind_group: BindGroup,
    scene_buffer: Buffer,
    scene_pipeline: RenderPipeline,

    lighting: LightingParams,
    distortion: DistortionParams,
    floor_lit: bool,
    near: f32,
    far: f32,
    size: (u32, u32),

    config: wgpu::SurfaceConfiguration,
    queue: Queue,
    device: Device,
    surface: Surface<'static>,
    #[allow(dead_code)]
    window: Arc<Window>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, app: &AppConfig, ring_mesh: &Mesh) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("VR Ring Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if app.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // --- Shaders and pipelines ---
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });
        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::Shader { label: "scene", message: error.to_string() });
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let distortion_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Distortion Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/distortion.wgsl").into()),
        });
        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::Shader { label: "distortion", message: error.to_string() });
        }

        let scene_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let object_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let distortion_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Distortion Bind Group Layout"),
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
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let scene_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &object_bind_group_layout],
            push_constant_ranges: &[],
        });

        let distortion_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Distortion Pipeline Layout"),
            bind_group_layouts: &[&distortion_bind_group_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let scene_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&scene_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: app.cull_back_faces.then_some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::Shader { label: "scene", message: error.to_string() });
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let distortion_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Distortion Pipeline"),
            layout: Some(&distortion_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &distortion_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &distortion_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::Shader { label: "distortion", message: error.to_string() });
        }

        // --- Scene uniforms ---
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        // --- Screen and floor textures ---
        let surface_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let screen_size = (app.screen_width, app.screen_height);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let screen_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Screen Texture"),
            size: wgpu::Extent3d {
                width: screen_size.0,
                height: screen_size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SCREEN_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let screen_view = screen_texture.create_view(&wgpu::TextureViewDescriptor::default());
        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::Resource { label: "screen texture", message: error.to_string() });
        }

        let floor_texture = device.create_texture_with_data(
            &queue,
            &wgpu::TextureDescriptor {
                label: Some("Floor Texture"),
                size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: SCREEN_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &FLOOR_GRAY,
        );
        let floor_view = floor_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // --- Geometry ---
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let ring = DrawObject::new(
            &device,
            "Ring",
            ring_mesh,
            Mat4::IDENTITY,
            &object_bind_group_layout,
            &screen_view,
            &surface_sampler,
        );

        let floor = app.floor.enabled.then(|| {
            let model = Mat4::from_translation(Vec3::new(0.0, app.floor.elevation, 0.0))
                * Mat4::from_scale(Vec3::new(app.floor.size, 1.0, app.floor.size));
            DrawObject::new(
                &device,
                "Floor",
                &mesh::floor_plane(),
                model,
                &object_bind_group_layout,
                &floor_view,
                &surface_sampler,
            )
        });
        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::Resource { label: "scene geometry", message: error.to_string() });
        }

        // --- Distortion Pipeline Setup ---
        let offscreen = OffscreenTarget::new(&device, surface_format, config.width, config.height)?;

        let offscreen_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let distortion_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Distortion Buffer"),
            size: std::mem::size_of::<DistortionUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let distortion_bind_group = Self::create_distortion_bind_group(
            &device,
            &distortion_bind_group_layout,
            &offscreen.color_view,
            &offscreen_sampler,
            &distortion_buffer,
        );

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        info!(
            "Renderer ready: {}x{} {:?}, ring {} triangles, screen {}x{}",
            config.width,
            config.height,
            surface_format,
            ring_mesh.index_count() / 3,
            screen_size.0,
            screen_size.1
        );

        Ok(Self {
            egui_renderer,
            distortion_bind_group,
            distortion_buffer,
            distortion_pipeline,
            distortion_bind_group_layout,
            offscreen,
            offscreen_sampler,
            floor,
            ring,
            floor_texture,
            screen_texture,
            screen_size,
            screen_payload_len: app.screen_payload_len(),
            scene_bind_group,
            scene_buffer,
            scene_pipeline,
            lighting: LightingParams::default(),
            distortion: DistortionParams::default(),
            floor_lit: app.floor.lit,
            near: app.camera.near,
            far: app.camera.far,
            size: (config.width, config.height),
            config,
            queue,
            device,
            surface,
            window,
        })
    }

    fn create_distortion_bind_group(
        device: &Device,
        layout: &BindGroupLayout,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        buffer: &Buffer,
    ) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Distortion Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: buffer.as_entire_binding() },
            ],
        })
    }

    pub fn aspect(&self) -> f32 {
        self.size.0 as f32 / self.size.1.max(1) as f32
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }

        self.size = (width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.offscreen = OffscreenTarget::new(&self.device, self.config.format, width, height)?;
        self.distortion_bind_group = Self::create_distortion_bind_group(
            &self.device,
            &self.distortion_bind_group_layout,
            &self.offscreen.color_view,
            &self.offscreen_sampler,
            &self.distortion_buffer,
        );
        Ok(())
    }

    /// Uploads one RGBA8 frame of the desktop payload into the ring texture.
    pub fn upload_screen_texture(&self, pixels: &[u8]) -> Result<(), RenderError> {
        let (width, height) = self.screen_size;
        if pixels.len() != self.screen_payload_len {
            return Err(RenderError::PayloadSize {
                expected: self.screen_payload_len,
                actual: pixels.len(),
                width,
                height,
            });
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.screen_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        Ok(())
    }

    /// Renders one frame: scene pass, distortion pass, optional HUD.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render(
        &mut self,
        camera: &FlyCamera,
        flags: &EffectFlags,
        elapsed: f32,
        ui_data: Option<(&egui::Context, egui::FullOutput)>,
    ) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => {
                warn!("Skipping frame: {e}");
                return Ok(());
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Uniform uploads for this frame
        let scene = SceneUniforms::new(camera, self.aspect(), self.near, self.far, &self.lighting);
        self.queue.write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&scene));
        self.ring.write_uniforms(&self.queue, flags.use_lighting, flags.dual_lighting);
        if let Some(floor) = &self.floor {
            // Own buffer: the floor's lighting state never leaks into the ring draw.
            let lit = self.floor_lit && flags.use_lighting;
            floor.write_uniforms(&self.queue, lit, flags.dual_lighting);
        }
        let distortion = DistortionUniforms::new(&self.distortion, elapsed, flags.apply_distortion);
        self.queue.write_buffer(&self.distortion_buffer, 0, bytemuck::bytes_of(&distortion));

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        // 1. Scene into the offscreen target
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.offscreen.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SCENE_CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.offscreen.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.scene_pipeline);
            pass.set_bind_group(0, &self.scene_bind_group, &[]);
            self.ring.draw(&mut pass);
            if let Some(floor) = &self.floor {
                floor.draw(&mut pass);
            }
        }

        // 2. Distortion Pass
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Distortion Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(POST_CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            pass.set_pipeline(&self.distortion_pipeline);
            pass.set_bind_group(0, &self.distortion_bind_group, &[]);
            pass.draw(0..6, 0..1);
        }

        // 3. UI Overlay
        let mut freed_textures = Vec::new();
        if let Some((ctx, full_output)) = ui_data {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: full_output.pixels_per_point,
            };

            let paint_jobs = ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

            for (id, delta) in &full_output.textures_delta.set {
                self.egui_renderer.update_texture(&self.device, &self.queue, *id, delta);
            }

            self.egui_renderer.update_buffers(
                &self.device,
                &self.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );

            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("UI Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                self.egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }

            freed_textures = full_output.textures_delta.free;
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for id in &freed_textures {
            self.egui_renderer.free_texture(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl_layouts() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 112);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 144);
        assert_eq!(std::mem::size_of::<DistortionUniforms>(), 32);
    }

    #[test]
    fn object_uniforms_carry_normal_matrix_and_flags() {
        let model = Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0))
            * Mat4::from_scale(Vec3::new(10.0, 1.0, 10.0));
        let uniforms = ObjectUniforms::new(model, true, false);
        assert_eq!(uniforms.flags, [1, 0, 0, 0]);

        let normal_matrix = Mat4::from_cols_array_2d(&uniforms.normal_matrix);
        let n = normal_matrix.transform_vector3(Vec3::Y).normalize();
        assert!((n - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn scene_uniforms_from_camera() {
        let camera = FlyCamera::default();
        let lighting = LightingParams::default();
        let uniforms = SceneUniforms::new(&camera, 1.5, 0.1, 100.0, &lighting);
        assert_eq!(uniforms.view_pos, [0.0, 0.0, 3.0, 1.0]);
        assert_eq!(uniforms.light_terms, [0.2, 0.8, 0.5, 32.0]);
        assert_eq!(
            Mat4::from_cols_array_2d(&uniforms.view_proj),
            camera.view_projection(1.5, 0.1, 100.0)
        );
    }

    #[test]
    fn distortion_uniforms_follow_params() {
        let uniforms = DistortionUniforms::new(&DistortionParams::default(), 2.0, true);
        assert_eq!(uniforms.enabled, 1);
        assert_eq!(uniforms.time, 2.0);
        assert_eq!(uniforms.amount_base, 0.25);
        assert_eq!(uniforms.chroma, 0.005);
    }
}
