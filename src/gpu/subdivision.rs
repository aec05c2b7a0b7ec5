// ============================================================================
// GPU SUBDIVISION RENDERER — leaf quads through a wgpu render pipeline
// ============================================================================
//
// The CPU side subdivides every patch into `4^depth` leaf quads (already
// sorted by global grid coordinate); this module uploads them as two
// triangles each, plus one `(cols+1)×(rows+1)` color texture whose texels
// are the grid-vertex colors in model space.  The pass renders into an
// offscreen Rgba8Unorm target that is read back to the host's pixel
// buffer — the hosts are CPU canvases, the GPU is an accelerator.
//
// All buffers and textures are created fresh per frame (STATIC_DRAW
// semantics); only the readback staging buffer is recycled.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::mesh::color::{ColorModel, ModelColor};
use crate::raster::subdivision::Leaf;

use super::GpuError;
use super::context::GpuContext;

// ============================================================================
// GPU TYPES
// ============================================================================

/// Per-vertex data for one corner of a leaf quad.  Every vertex carries
/// the whole leaf's UV and screen corners so the vertex stage can run the
/// inverse-distance UV blend.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LeafVertex {
    pub position: [f32; 2],
    pub uv_north: [f32; 2],
    pub uv_east: [f32; 2],
    pub uv_south: [f32; 2],
    pub uv_west: [f32; 2],
    pub corner_nw: [f32; 2],
    pub corner_ne: [f32; 2],
    pub corner_se: [f32; 2],
    pub corner_sw: [f32; 2],
    pub texcoord: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshUniforms {
    pub viewport: [f32; 2],
    pub grid: [f32; 2],
    pub simple_uv: u32,
    pub color_model: u32,
    pub _pad: [f32; 2],
}

fn color_model_index(model: ColorModel) -> u32 {
    match model {
        ColorModel::Rgba => 0,
        ColorModel::Hsla => 1,
        ColorModel::Oklab => 2,
    }
}

// ============================================================================
// RENDERER
// ============================================================================

pub struct SubdivisionRenderer {
    pub ctx: GpuContext,
    pipeline: wgpu::RenderPipeline,
    uniform_bgl: wgpu::BindGroupLayout,
    texture_bgl: wgpu::BindGroupLayout,
    /// Cached staging buffer for readback, grown on demand.
    cached_staging: Option<(wgpu::Buffer, u64)>,
}

impl SubdivisionRenderer {
    /// Build the pipeline.  Shader and pipeline creation run inside wgpu
    /// validation error scopes so failures surface as typed errors
    /// instead of device loss.
    pub fn new(ctx: GpuContext) -> Result<Self, GpuError> {
        let device = &ctx.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::MESH_SHADER.into()),
        });
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::ShaderCompile(e.to_string()));
        }

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_uniform_bgl"),
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

        // Grid color texture is Rgba32Float and fetched with textureLoad,
        // so it binds as non-filterable and needs no sampler.
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_grid_tex_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });

        let vertex_attrs = wgpu::vertex_attr_array![
            0 => Float32x2, 1 => Float32x2, 2 => Float32x2, 3 => Float32x2,
            4 => Float32x2, 5 => Float32x2, 6 => Float32x2, 7 => Float32x2,
            8 => Float32x2, 9 => Float32x2,
        ];

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_mesh",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LeafVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &vertex_attrs,
                }],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None, // overlap resolves by draw order
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_mesh",
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    blend: None, // opaque output, later leaves overwrite
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
        });
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::ShaderLink(e.to_string()));
        }

        Ok(Self {
            ctx,
            pipeline,
            uniform_bgl,
            texture_bgl,
            cached_staging: None,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.ctx.adapter_name
    }

    /// Render sorted leaves into an offscreen target and read back packed
    /// RGBA bytes for the host canvas.
    pub fn render(
        &mut self,
        leaves: &[Leaf],
        grid_colors: &[ModelColor],
        grid_cols: usize,
        grid_rows: usize,
        model: ColorModel,
        simple_uv: bool,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, GpuError> {
        if !self.ctx.supports_size(width, height) {
            return Err(GpuError::BufferAlloc(format!(
                "render target {}x{} exceeds device limit {}",
                width, height, self.ctx.max_texture_dim
            )));
        }

        let device = &self.ctx.device;

        // ---- Geometry upload -------------------------------------------
        let mut vertices = Vec::with_capacity(leaves.len() * 4);
        let mut indices: Vec<u32> = Vec::with_capacity(leaves.len() * 6);
        for leaf in leaves {
            let base = vertices.len() as u32;
            let uv = |i: usize| [leaf.uvs[i].x as f32, leaf.uvs[i].y as f32];
            let corner = |i: usize| [leaf.corners[i].x as f32, leaf.corners[i].y as f32];
            let texcoord = [
                leaf.grid_x as f32 / grid_cols as f32,
                leaf.grid_y as f32 / grid_rows as f32,
            ];
            for i in 0..4 {
                vertices.push(LeafVertex {
                    position: corner(i),
                    uv_north: uv(0),
                    uv_east: uv(1),
                    uv_south: uv(2),
                    uv_west: uv(3),
                    corner_nw: corner(0),
                    corner_ne: corner(1),
                    corner_se: corner(2),
                    corner_sw: corner(3),
                    texcoord,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniforms = MeshUniforms {
            viewport: [width as f32, height as f32],
            grid: [grid_cols as f32, grid_rows as f32],
            simple_uv: simple_uv as u32,
            color_model: color_model_index(model),
            _pad: [0.0; 2],
        };
        let uniform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        // ---- Grid color texture ----------------------------------------
        let tex_w = grid_cols as u32 + 1;
        let tex_h = grid_rows as u32 + 1;
        debug_assert_eq!(grid_colors.len(), (tex_w * tex_h) as usize);
        let grid_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("mesh_grid_colors"),
            size: wgpu::Extent3d { width: tex_w, height: tex_h, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &grid_tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(grid_colors),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(tex_w * 16),
                rows_per_image: Some(tex_h),
            },
            wgpu::Extent3d { width: tex_w, height: tex_h, depth_or_array_layers: 1 },
        );

        // ---- Offscreen target ------------------------------------------
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("mesh_target"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::BufferAlloc(e.to_string()));
        }
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::BufferAlloc(e.to_string()));
        }

        let uniform_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_uniform_bg"),
            layout: &self.uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            }],
        });
        let tex_view = grid_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let tex_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_grid_tex_bg"),
            layout: &self.texture_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&tex_view),
            }],
        });

        // ---- Render pass -----------------------------------------------
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mesh_render"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mesh_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if !leaves.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &uniform_bg, &[]);
                pass.set_bind_group(1, &tex_bg, &[]);
                pass.set_vertex_buffer(0, vertex_buf.slice(..));
                pass.set_index_buffer(index_buf.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..indices.len() as u32, 0, 0..1);
            }
        }
        self.ctx.submit_one(encoder);

        Ok(self.readback(&target, width, height))
    }

    /// Copy the target into a padded staging buffer, map it, and strip
    /// the row alignment padding.
    fn readback(&mut self, texture: &wgpu::Texture, width: u32, height: u32) -> Vec<u8> {
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        let bytes_per_row = aligned_bytes_per_row(width);
        let buffer_size = (bytes_per_row * height) as u64;

        let need_new = match &self.cached_staging {
            Some((_, sz)) if *sz >= buffer_size => false,
            _ => true,
        };
        if need_new {
            let new_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("mesh_readback_staging"),
                size: buffer_size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.cached_staging = Some((new_buf, buffer_size));
        }
        let staging = &self.cached_staging.as_ref().unwrap().0;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mesh_readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                crate::log_err!("readback map error: {:?}", e);
                return vec![];
            }
            Err(e) => {
                crate::log_err!("readback channel error: {:?}", e);
                return vec![];
            }
        }

        let mapped = slice.get_mapped_range();
        let actual_row = width * 4;
        let mut result = Vec::with_capacity((actual_row * height) as usize);
        for y in 0..height {
            let start = (y * bytes_per_row) as usize;
            result.extend_from_slice(&mapped[start..start + actual_row as usize]);
        }
        drop(mapped);
        staging.unmap();

        result
    }
}

fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (unaligned + align - 1) / align * align
}
