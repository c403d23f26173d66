//! [`RenderDevice`] implementation backed by a headless wgpu context.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use wgpu::util::{DeviceExt, TextureDataOrder};

use toypass::{
    AddressMode, FilterMode, PassError, ProgramHandle, RenderDevice, SamplerDesc, SamplerHandle,
    TextureHandle, TextureShape, TextureUpload, UniformValue, CHANNEL_COUNT,
    CHANNEL_SAMPLER_SUFFIX, CHANNEL_UNIFORM_PREFIX, INPUT_FRAME, INPUT_FRAME_RATE, INPUT_MOUSE,
    INPUT_RESOLUTION, INPUT_TIME, INPUT_TIME_DELTA,
};

use crate::compile::{compile_fragment_shader, compile_vertex_shader};
use crate::context::OffscreenContext;

/// CPU mirror of the `PassInputs` uniform block declared in `compile.rs`.
/// Field order and padding must match the std140 layout exactly.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
struct PassUniforms {
    resolution: [f32; 3],
    time: f32,
    time_delta: f32,
    frame_rate: f32,
    /// The unit counts frames as `i64`; GLSL `int` is 32-bit, so the value
    /// is clamped on upload.
    frame: i32,
    _padding0: f32,
    mouse: [f32; 4],
}

unsafe impl Zeroable for PassUniforms {}
unsafe impl Pod for PassUniforms {}

impl PassUniforms {
    fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32, 1.0],
            time: 0.0,
            time_delta: 0.0,
            frame_rate: 60.0,
            frame: 0,
            _padding0: 0.0,
            mouse: [0.0; 4],
        }
    }
}

#[derive(Clone, Copy, Default)]
struct ChannelSlot {
    texture: Option<TextureHandle>,
    sampler: Option<SamplerHandle>,
}

struct ProgramEntry {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: PassUniforms,
    uniforms_dirty: bool,
    channel_layout: wgpu::BindGroupLayout,
    channel_shapes: [TextureShape; CHANNEL_COUNT],
    channel_slots: [ChannelSlot; CHANNEL_COUNT],
    /// Rebuilt lazily before the next draw whenever a slot changes.
    channel_bind_group: Option<wgpu::BindGroup>,
}

struct TextureEntry {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    shape: TextureShape,
}

/// Offscreen wgpu renderer for a shader unit. Owns the GPU context, all
/// program/texture/sampler resources, and the placeholder bindings used for
/// empty channel slots.
pub struct WgpuDevice {
    context: OffscreenContext,
    vertex_module: wgpu::ShaderModule,
    uniform_layout: wgpu::BindGroupLayout,
    placeholder_2d: wgpu::TextureView,
    placeholder_cube: wgpu::TextureView,
    placeholder_sampler: wgpu::Sampler,
    programs: HashMap<u64, ProgramEntry>,
    textures: HashMap<u64, TextureEntry>,
    samplers: HashMap<u64, wgpu::Sampler>,
    next_id: u64,
}

impl WgpuDevice {
    pub fn new(width: u32, height: u32) -> anyhow::Result<Self> {
        let context = OffscreenContext::new(width, height)?;
        let vertex_module = compile_vertex_shader(&context.device);

        let uniform_layout =
            context
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("pass uniform layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let placeholder_2d = create_placeholder_view(
            &context,
            TextureShape::Texture2d,
            "placeholder channel texture",
        );
        let placeholder_cube = create_placeholder_view(
            &context,
            TextureShape::Cube,
            "placeholder channel cubemap",
        );
        let placeholder_sampler = context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("placeholder channel sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            context,
            vertex_module,
            uniform_layout,
            placeholder_2d,
            placeholder_cube,
            placeholder_sampler,
            programs: HashMap::new(),
            textures: HashMap::new(),
            samplers: HashMap::new(),
            next_id: 1,
        })
    }

    /// Render target dimensions in pixels.
    pub fn target_size(&self) -> (u32, u32) {
        self.context.size
    }

    /// Copies the offscreen color target back to the CPU as tightly packed
    /// RGBA8 rows.
    pub fn read_target(&self) -> anyhow::Result<Vec<u8>> {
        self.context.read_target()
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn build_channel_bind_group(&self, entry: &ProgramEntry) -> wgpu::BindGroup {
        let mut bindings = Vec::with_capacity(CHANNEL_COUNT * 2);
        for (index, slot) in entry.channel_slots.iter().enumerate() {
            let expected = entry.channel_shapes[index];
            let view = slot
                .texture
                .and_then(|handle| self.textures.get(&handle.0))
                .filter(|texture| texture.shape == expected)
                .map(|texture| &texture.view)
                .unwrap_or(match expected {
                    TextureShape::Texture2d => &self.placeholder_2d,
                    TextureShape::Cube => &self.placeholder_cube,
                });
            let sampler = slot
                .sampler
                .and_then(|handle| self.samplers.get(&handle.0))
                .unwrap_or(&self.placeholder_sampler);
            bindings.push(wgpu::BindGroupEntry {
                binding: (index as u32) * 2,
                resource: wgpu::BindingResource::TextureView(view),
            });
            bindings.push(wgpu::BindGroupEntry {
                binding: (index as u32) * 2 + 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }
        self.context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("channel bind group"),
                layout: &entry.channel_layout,
                entries: &bindings,
            })
    }
}

impl RenderDevice for WgpuDevice {
    fn compile_program(
        &mut self,
        fragment: &Path,
        channel_shapes: &[TextureShape; CHANNEL_COUNT],
    ) -> Result<ProgramHandle, PassError> {
        let source = fs::read_to_string(fragment).map_err(|err| {
            PassError::CompileFailure(format!("failed to read {}: {err}", fragment.display()))
        })?;

        let device = &self.context.device;
        // naga surfaces GLSL frontend errors through the validation scope.
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let fragment_module = compile_fragment_shader(device, &source, channel_shapes);
        let channel_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("channel layout"),
            entries: &build_channel_layout_entries(channel_shapes),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pass pipeline layout"),
            bind_group_layouts: &[&self.uniform_layout, &channel_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("pass pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some("main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.context.target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(PassError::CompileFailure(error.to_string()));
        }

        let uniforms = PassUniforms::new(self.context.size.0, self.context.size.1);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pass uniform buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pass uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let id = self.alloc_id();
        self.programs.insert(
            id,
            ProgramEntry {
                pipeline,
                uniform_buffer,
                uniform_bind_group,
                uniforms,
                uniforms_dirty: false,
                channel_layout,
                channel_shapes: *channel_shapes,
                channel_slots: [ChannelSlot::default(); CHANNEL_COUNT],
                channel_bind_group: None,
            },
        );
        Ok(ProgramHandle(id))
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program.0).is_none() {
            tracing::warn!(program = program.0, "destroying unknown program");
        }
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureHandle, PassError> {
        let layers: u32 = match upload.shape {
            TextureShape::Texture2d => 1,
            TextureShape::Cube => 6,
        };
        let expected = upload.width as usize * upload.height as usize * 4 * layers as usize;
        if upload.pixels.len() != expected {
            return Err(PassError::FormatMismatch(format!(
                "texture payload is {} bytes, expected {expected}",
                upload.pixels.len()
            )));
        }

        let format = if upload.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        // Mip chains are computed on the CPU; cubemaps stay single-level.
        let generate_mips =
            upload.generate_mips && matches!(upload.shape, TextureShape::Texture2d);
        let (mip_level_count, pixels) = if generate_mips {
            let chain = build_mip_chain(upload.width, upload.height, upload.pixels)?;
            (chain.level_count, Cow::Owned(chain.bytes))
        } else {
            (1, Cow::Borrowed(upload.pixels))
        };

        let texture = self.context.device.create_texture_with_data(
            &self.context.queue,
            &wgpu::TextureDescriptor {
                label: Some("channel texture"),
                size: wgpu::Extent3d {
                    width: upload.width,
                    height: upload.height,
                    depth_or_array_layers: layers,
                },
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &pixels,
        );

        let view = match upload.shape {
            TextureShape::Texture2d => {
                texture.create_view(&wgpu::TextureViewDescriptor::default())
            }
            TextureShape::Cube => texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("channel cubemap view"),
                dimension: Some(wgpu::TextureViewDimension::Cube),
                array_layer_count: Some(6),
                ..Default::default()
            }),
        };

        let id = self.alloc_id();
        self.textures.insert(
            id,
            TextureEntry {
                _texture: texture,
                view,
                shape: upload.shape,
            },
        );
        Ok(TextureHandle(id))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture.0).is_none() {
            tracing::warn!(texture = texture.0, "destroying unknown texture");
            return;
        }
        for entry in self.programs.values_mut() {
            for slot in &mut entry.channel_slots {
                if slot.texture == Some(texture) {
                    slot.texture = None;
                    entry.channel_bind_group = None;
                }
            }
        }
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> SamplerHandle {
        let address = map_address_mode(desc.address);
        let sampler = self.context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("channel sampler"),
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: address,
            mag_filter: map_filter_mode(desc.mag_filter),
            min_filter: map_filter_mode(desc.min_filter),
            mipmap_filter: map_filter_mode(desc.mip_filter),
            ..Default::default()
        });
        let id = self.alloc_id();
        self.samplers.insert(id, sampler);
        SamplerHandle(id)
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        if self.samplers.remove(&sampler.0).is_none() {
            tracing::warn!(sampler = sampler.0, "destroying unknown sampler");
            return;
        }
        for entry in self.programs.values_mut() {
            for slot in &mut entry.channel_slots {
                if slot.sampler == Some(sampler) {
                    slot.sampler = None;
                    entry.channel_bind_group = None;
                }
            }
        }
    }

    fn has_uniform(&self, program: ProgramHandle, name: &str) -> bool {
        if !self.programs.contains_key(&program.0) {
            return false;
        }
        // The injected prelude declares the fixed input block and all four
        // channel texture/sampler pairs for every program.
        matches!(
            name,
            INPUT_RESOLUTION | INPUT_TIME | INPUT_TIME_DELTA | INPUT_FRAME_RATE | INPUT_FRAME
                | INPUT_MOUSE
        ) || parse_channel_name(name).is_some()
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        let Some(entry) = self.programs.get_mut(&program.0) else {
            tracing::warn!(program = program.0, "uniform set on unknown program");
            return;
        };
        match (name, value) {
            (INPUT_RESOLUTION, UniformValue::Vec3(v)) => entry.uniforms.resolution = v,
            (INPUT_TIME, UniformValue::Float(v)) => entry.uniforms.time = v,
            (INPUT_TIME_DELTA, UniformValue::Float(v)) => entry.uniforms.time_delta = v,
            (INPUT_FRAME_RATE, UniformValue::Float(v)) => entry.uniforms.frame_rate = v,
            (INPUT_FRAME, UniformValue::Int(v)) => {
                entry.uniforms.frame = v.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
            }
            (INPUT_MOUSE, UniformValue::Vec4(v)) => entry.uniforms.mouse = v,
            _ => {
                tracing::debug!(name, ?value, "ignoring unrecognized uniform");
                return;
            }
        }
        entry.uniforms_dirty = true;
    }

    fn bind_texture(&mut self, program: ProgramHandle, name: &str, texture: TextureHandle) {
        let Some((index, false)) = parse_channel_name(name) else {
            tracing::warn!(name, "texture bound to a non-channel uniform");
            return;
        };
        let shape = self.textures.get(&texture.0).map(|entry| entry.shape);
        let Some(entry) = self.programs.get_mut(&program.0) else {
            tracing::warn!(program = program.0, "texture bound to unknown program");
            return;
        };
        match shape {
            Some(shape) if shape == entry.channel_shapes[index] => {
                entry.channel_slots[index].texture = Some(texture);
            }
            Some(_) => {
                tracing::warn!(
                    channel = index,
                    "texture shape differs from the compiled channel binding; using placeholder"
                );
                entry.channel_slots[index].texture = None;
            }
            None => {
                tracing::warn!(texture = texture.0, "binding unknown texture");
                entry.channel_slots[index].texture = None;
            }
        }
        entry.channel_bind_group = None;
    }

    fn bind_sampler(&mut self, program: ProgramHandle, name: &str, sampler: SamplerHandle) {
        let Some((index, true)) = parse_channel_name(name) else {
            tracing::warn!(name, "sampler bound to a non-channel uniform");
            return;
        };
        let Some(entry) = self.programs.get_mut(&program.0) else {
            tracing::warn!(program = program.0, "sampler bound to unknown program");
            return;
        };
        entry.channel_slots[index].sampler = Some(sampler);
        entry.channel_bind_group = None;
    }

    fn clear_target(&mut self, color: [f32; 4], _depth: f32, _stencil: u8) {
        // The offscreen target has no depth-stencil attachment.
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.context.target_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color[0] as f64,
                            g: color[1] as f64,
                            b: color[2] as f64,
                            a: color[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.context.queue.submit(Some(encoder.finish()));
    }

    fn draw_fullscreen(&mut self, program: ProgramHandle) {
        let rebuilt = match self.programs.get(&program.0) {
            Some(entry) if entry.channel_bind_group.is_none() => {
                Some(self.build_channel_bind_group(entry))
            }
            Some(_) => None,
            None => {
                tracing::warn!(program = program.0, "draw requested for unknown program");
                return;
            }
        };

        let Some(entry) = self.programs.get_mut(&program.0) else {
            return;
        };
        if let Some(group) = rebuilt {
            entry.channel_bind_group = Some(group);
        }
        if entry.uniforms_dirty {
            self.context.queue.write_buffer(
                &entry.uniform_buffer,
                0,
                bytemuck::bytes_of(&entry.uniforms),
            );
            entry.uniforms_dirty = false;
        }
        let entry = &*entry;
        let Some(channel_bind_group) = entry.channel_bind_group.as_ref() else {
            return;
        };

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("draw encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("fullscreen pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.context.target_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&entry.pipeline);
            pass.set_bind_group(0, &entry.uniform_bind_group, &[]);
            pass.set_bind_group(1, channel_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.context.queue.submit(Some(encoder.finish()));
    }
}

/// Splits `iChannelN` / `iChannelN_sampler` into the slot index and whether
/// the name refers to the sampler half of the pair.
fn parse_channel_name(name: &str) -> Option<(usize, bool)> {
    let rest = name.strip_prefix(CHANNEL_UNIFORM_PREFIX)?;
    let (digits, is_sampler) = match rest.strip_suffix(CHANNEL_SAMPLER_SUFFIX) {
        Some(digits) => (digits, true),
        None => (rest, false),
    };
    let index: usize = digits.parse().ok()?;
    (index < CHANNEL_COUNT).then_some((index, is_sampler))
}

fn map_filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Point => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn map_address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::Wrap => wgpu::AddressMode::Repeat,
        AddressMode::Clamp => wgpu::AddressMode::ClampToEdge,
    }
}

fn build_channel_layout_entries(
    channel_shapes: &[TextureShape; CHANNEL_COUNT],
) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(CHANNEL_COUNT * 2);
    for (index, shape) in channel_shapes.iter().enumerate() {
        let view_dimension = match shape {
            TextureShape::Texture2d => wgpu::TextureViewDimension::D2,
            TextureShape::Cube => wgpu::TextureViewDimension::Cube,
        };
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: (index as u32) * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: (index as u32) * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}

fn create_placeholder_view(
    context: &OffscreenContext,
    shape: TextureShape,
    label: &str,
) -> wgpu::TextureView {
    let layers: u32 = match shape {
        TextureShape::Texture2d => 1,
        TextureShape::Cube => 6,
    };
    let mut data = Vec::with_capacity(layers as usize * 4);
    for _ in 0..layers {
        data.extend([0u8, 0, 0, 255]);
    }
    let texture = context.device.create_texture_with_data(
        &context.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        &data,
    );
    match shape {
        TextureShape::Texture2d => texture.create_view(&wgpu::TextureViewDescriptor::default()),
        TextureShape::Cube => texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        }),
    }
}

struct MipChain {
    level_count: u32,
    bytes: Vec<u8>,
}

fn build_mip_chain(width: u32, height: u32, pixels: &[u8]) -> Result<MipChain, PassError> {
    let mut current = image::RgbaImage::from_raw(width, height, pixels.to_vec()).ok_or_else(
        || PassError::FormatMismatch("texture payload does not cover its dimensions".to_string()),
    )?;
    let mut bytes = pixels.to_vec();
    let mut level_count = 1;
    let (mut w, mut h) = (width, height);
    while w > 1 || h > 1 {
        w = (w / 2).max(1);
        h = (h / 2).max(1);
        current = image::imageops::resize(&current, w, h, image::imageops::FilterType::Triangle);
        bytes.extend_from_slice(current.as_raw());
        level_count += 1;
    }
    Ok(MipChain { level_count, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_parse_to_slot_and_kind() {
        assert_eq!(parse_channel_name("iChannel0"), Some((0, false)));
        assert_eq!(parse_channel_name("iChannel3_sampler"), Some((3, true)));
        assert_eq!(parse_channel_name("iChannel4"), None);
        assert_eq!(parse_channel_name("iTime"), None);
        assert_eq!(parse_channel_name("iChannel_sampler"), None);
    }

    #[test]
    fn uniform_block_matches_the_declared_std140_layout() {
        assert_eq!(std::mem::size_of::<PassUniforms>(), 48);
        assert_eq!(std::mem::offset_of!(PassUniforms, time), 12);
        assert_eq!(std::mem::offset_of!(PassUniforms, frame), 24);
        assert_eq!(std::mem::offset_of!(PassUniforms, mouse), 32);
    }

    #[test]
    fn mip_chains_halve_down_to_one_pixel() {
        let pixels = vec![255u8; 8 * 4 * 4];
        let chain = build_mip_chain(8, 4, &pixels).unwrap();
        assert_eq!(chain.level_count, 4);
        // 8x4 + 4x2 + 2x1 + 1x1 texels
        assert_eq!(chain.bytes.len(), (32 + 8 + 2 + 1) * 4);
    }
}
