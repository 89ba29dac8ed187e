//! wgpu render backend.
//!
//! Every program is a WGSL compute shader that writes one face of one level
//! into an RGBA16F storage texture. Readbacks copy the target into a padded
//! staging buffer and map it asynchronously; [`RenderBackend::frame`] polls
//! the device without blocking and reports a frame as completed once every
//! readback requested up to it has been mapped.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use half::f16;

use super::{FacePass, FrameId, PassTarget, RenderBackend, ShaderProgram, TargetHandle, TextureHandle};
use crate::error::CompileError;
use crate::ibl::irradiance;
use crate::surface::{Surface, WrapMode};

const COMMON_SHADER: &str = include_str!("shaders/common.wgsl");
const EQUIRECT_SHADER: &str = include_str!("shaders/equirect.wgsl");
const CUBE_DOWNSAMPLE_SHADER: &str = include_str!("shaders/cube_downsample.wgsl");
const IRRADIANCE_SHADER: &str = include_str!("shaders/irradiance.wgsl");
const PREFILTER_SHADER: &str = include_str!("shaders/prefilter.wgsl");

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const BYTES_PER_TEXEL: u32 = 8;
const WORKGROUP_SIZE: u32 = 8;

/// Uniforms shared by every face program.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct FaceParams {
    inverse_view_projection: [[f32; 4]; 4],
    size: u32,
    source_lod: f32,
    roughness: f32,
    source_resolution: f32,
}

enum GpuTexture {
    Panorama {
        view: wgpu::TextureView,
    },
    Cube {
        texture: wgpu::Texture,
        size: u32,
        mip_count: u32,
    },
}

struct GpuTarget {
    texture: wgpu::Texture,
    size: u32,
}

struct GpuReadback {
    requested: FrameId,
    staging: wgpu::Buffer,
    receiver: Receiver<Result<(), wgpu::BufferAsyncError>>,
    mapped: bool,
    size: u32,
    padded_bytes_per_row: u32,
}

/// Which source binding a pipeline expects.
#[derive(Clone, Copy)]
enum SourceKind {
    Panorama,
    Cube,
}

struct FacePipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl FacePipeline {
    fn new(device: &wgpu::Device, label: &str, program_source: &str, kind: SourceKind) -> Self {
        let source = format!("{}\n{}", COMMON_SHADER, program_source);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let view_dimension = match kind {
            SourceKind::Panorama => wgpu::TextureViewDimension::D2,
            SourceKind::Cube => wgpu::TextureViewDimension::Cube,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }
}

/// Headless wgpu implementation of [`RenderBackend`].
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    equirect: FacePipeline,
    cube_downsample: FacePipeline,
    irradiance: FacePipeline,
    prefilter: FacePipeline,
    panorama_sampler: wgpu::Sampler,
    cube_sampler: wgpu::Sampler,
    params: wgpu::Buffer,
    textures: HashMap<u32, GpuTexture>,
    targets: HashMap<u32, GpuTarget>,
    readbacks: HashMap<u32, GpuReadback>,
    next_handle: u32,
    frame: FrameId,
}

impl WgpuBackend {
    /// Open the first high-performance adapter without a surface.
    ///
    /// # Errors
    ///
    /// [`CompileError::Device`] when no adapter or device is available.
    pub fn new() -> Result<Self, CompileError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| CompileError::Device(format!("no suitable adapter: {}", e)))?;

        let adapter_name = adapter.get_info().name;
        let required_limits = wgpu::Limits::default().using_resolution(adapter.limits());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("pbrtex device"),
            required_features: wgpu::Features::empty(),
            required_limits,
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
            experimental_features: Default::default(),
        }))
        .map_err(|e| CompileError::Device(format!("failed to open {}: {}", adapter_name, e)))?;

        tracing::info!(adapter = %adapter_name, "Opened GPU device");

        let equirect = FacePipeline::new(&device, "equirect", EQUIRECT_SHADER, SourceKind::Panorama);
        let cube_downsample =
            FacePipeline::new(&device, "cube_downsample", CUBE_DOWNSAMPLE_SHADER, SourceKind::Cube);
        let irradiance = FacePipeline::new(&device, "irradiance", IRRADIANCE_SHADER, SourceKind::Cube);
        let prefilter = FacePipeline::new(&device, "prefilter", PREFILTER_SHADER, SourceKind::Cube);

        let panorama_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("panorama sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let cube_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cube sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("face params"),
            size: std::mem::size_of::<FaceParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            device,
            queue,
            adapter_name,
            equirect,
            cube_downsample,
            irradiance,
            prefilter,
            panorama_sampler,
            cube_sampler,
            params,
            textures: HashMap::new(),
            targets: HashMap::new(),
            readbacks: HashMap::new(),
            next_handle: 1,
            frame: FrameId::default(),
        })
    }

    /// Name of the adapter in use.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn allocate(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn check_dimension(&self, width: u32, height: u32) -> Result<(), CompileError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(CompileError::GpuResource(format!(
                "texture of {}×{} exceeds the device limit of {}",
                width, height, max
            )));
        }
        Ok(())
    }

    fn source_cube(&self, handle: TextureHandle) -> Result<(&wgpu::Texture, u32, u32), CompileError> {
        match self.textures.get(&handle.0) {
            Some(GpuTexture::Cube {
                texture,
                size,
                mip_count,
            }) => Ok((texture, *size, *mip_count)),
            _ => Err(CompileError::GpuResource(format!(
                "texture {} is not a cube map",
                handle.0
            ))),
        }
    }

    /// Sampled view, pipeline and uniforms of a pass.
    fn bind_source(
        &self,
        pass: &FacePass,
    ) -> Result<(wgpu::TextureView, &FacePipeline, &wgpu::Sampler, FaceParams), CompileError> {
        let mut params = FaceParams {
            inverse_view_projection: pass.face.descriptor().view_projection().inverse().to_cols_array_2d(),
            size: pass.size,
            source_lod: 0.0,
            roughness: 0.0,
            source_resolution: 0.0,
        };

        match pass.program {
            ShaderProgram::Equirect => match self.textures.get(&pass.source.0) {
                Some(GpuTexture::Panorama { view }) => {
                    Ok((view.clone(), &self.equirect, &self.panorama_sampler, params))
                }
                _ => Err(CompileError::GpuResource(format!(
                    "texture {} is not a panorama",
                    pass.source.0
                ))),
            },
            ShaderProgram::CubeDownsample { mip } => {
                let (texture, _, mip_count) = self.source_cube(pass.source)?;
                if mip == 0 || mip >= mip_count {
                    return Err(CompileError::GpuResource(format!(
                        "cube downsample of mip {} needs levels 0..{}",
                        mip, mip_count
                    )));
                }
                let view = texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("cube downsample source"),
                    dimension: Some(wgpu::TextureViewDimension::Cube),
                    base_mip_level: mip - 1,
                    mip_level_count: Some(1),
                    base_array_layer: 0,
                    array_layer_count: Some(6),
                    ..Default::default()
                });
                Ok((view, &self.cube_downsample, &self.cube_sampler, params))
            }
            ShaderProgram::Irradiance => {
                let (texture, size, _) = self.source_cube(pass.source)?;
                params.source_lod = irradiance::source_lod(size);
                params.source_resolution = size as f32;
                Ok((cube_view(texture), &self.irradiance, &self.cube_sampler, params))
            }
            ShaderProgram::Prefilter { roughness } => {
                let (texture, size, _) = self.source_cube(pass.source)?;
                params.roughness = roughness;
                params.source_resolution = size as f32;
                Ok((cube_view(texture), &self.prefilter, &self.cube_sampler, params))
            }
        }
    }

    fn output_view(&self, pass: &FacePass) -> Result<wgpu::TextureView, CompileError> {
        match pass.target {
            PassTarget::Target(target) => {
                let slot = self.targets.get(&target.0).ok_or_else(|| {
                    CompileError::GpuResource(format!("unknown render target {}", target.0))
                })?;
                if slot.size != pass.size {
                    return Err(CompileError::GpuResource(format!(
                        "viewport {} does not match render target size {}",
                        pass.size, slot.size
                    )));
                }
                Ok(slot.texture.create_view(&wgpu::TextureViewDescriptor::default()))
            }
            PassTarget::CubeLevel { cube, mip } => {
                let (texture, size, mip_count) = self.source_cube(cube)?;
                if mip >= mip_count || (size >> mip).max(1) != pass.size {
                    return Err(CompileError::GpuResource(format!(
                        "viewport {} does not match mip {} of a {}² cube map",
                        pass.size, mip, size
                    )));
                }
                Ok(texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("cube level"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_mip_level: mip,
                    mip_level_count: Some(1),
                    base_array_layer: pass.face.index() as u32,
                    array_layer_count: Some(1),
                    ..Default::default()
                }))
            }
        }
    }

    fn poll(&self) -> Result<(), CompileError> {
        self.device
            .poll(wgpu::PollType::Poll)
            .map(|_| ())
            .map_err(|e| CompileError::GpuResource(format!("device poll failed: {}", e)))
    }
}

fn cube_view(texture: &wgpu::Texture) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("cube source"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}

/// Round a row up to the copy alignment (256 bytes).
fn align_bytes_per_row(value: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    value.div_ceil(align) * align
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &str {
        "gpu"
    }

    fn upload_panorama(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[f32],
    ) -> Result<TextureHandle, CompileError> {
        self.check_dimension(width, height)?;
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(CompileError::GpuResource(format!(
                "panorama has {} floats, expected {}",
                pixels.len(),
                expected
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("panorama"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let bytes: Vec<u8> = pixels
            .iter()
            .flat_map(|&v| f16::from_f32(v).to_le_bytes())
            .collect();
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * BYTES_PER_TEXEL),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let handle = self.allocate();
        self.textures.insert(handle, GpuTexture::Panorama { view });
        Ok(TextureHandle(handle))
    }

    fn create_cube_texture(
        &mut self,
        size: u32,
        mip_count: u32,
    ) -> Result<TextureHandle, CompileError> {
        self.check_dimension(size, size)?;
        if mip_count == 0 || mip_count > u32::BITS - size.leading_zeros() {
            return Err(CompileError::GpuResource(format!(
                "cannot create a {}² cube map with {} mips",
                size, mip_count
            )));
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("environment cube"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: mip_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::STORAGE_BINDING,
            view_formats: &[],
        });

        let handle = self.allocate();
        self.textures.insert(
            handle,
            GpuTexture::Cube {
                texture,
                size,
                mip_count,
            },
        );
        Ok(TextureHandle(handle))
    }

    fn create_render_target(&mut self, size: u32) -> Result<TargetHandle, CompileError> {
        self.check_dimension(size, size)?;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("face target"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let handle = self.allocate();
        self.targets.insert(handle, GpuTarget { texture, size });
        Ok(TargetHandle(handle))
    }

    fn release_render_target(&mut self, target: TargetHandle) {
        if let Some(slot) = self.targets.remove(&target.0) {
            slot.texture.destroy();
        }
        if let Some(readback) = self.readbacks.remove(&target.0) {
            readback.staging.destroy();
        }
    }

    fn submit(&mut self, pass: &FacePass) -> Result<(), CompileError> {
        let (source_view, pipeline, sampler, params) = self.bind_source(pass)?;
        let output_view = self.output_view(pass)?;

        self.queue
            .write_buffer(&self.params, 0, bytemuck::bytes_of(&params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(pass.program.name()),
            layout: &pipeline.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.params.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(pass.program.name()),
            });
        {
            let mut compute = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(pass.program.name()),
                timestamp_writes: None,
            });
            compute.set_pipeline(&pipeline.pipeline);
            compute.set_bind_group(0, &bind_group, &[]);
            let groups = pass.size.div_ceil(WORKGROUP_SIZE);
            compute.dispatch_workgroups(groups, groups, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        tracing::trace!(
            program = pass.program.name(),
            face = %pass.face,
            size = pass.size,
            "GPU pass submitted"
        );
        Ok(())
    }

    fn request_readback(&mut self, target: TargetHandle) -> Result<FrameId, CompileError> {
        let slot = self
            .targets
            .get(&target.0)
            .ok_or_else(|| CompileError::GpuResource(format!("unknown render target {}", target.0)))?;
        let size = slot.size;
        let padded_bytes_per_row = align_bytes_per_row(size * BYTES_PER_TEXEL);

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback staging"),
            size: padded_bytes_per_row as u64 * size as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &slot.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(size),
                },
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (sender, receiver) = mpsc::channel();
        staging
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = sender.send(result);
            });

        let requested = self.frame.next();
        self.readbacks.insert(
            target.0,
            GpuReadback {
                requested,
                staging,
                receiver,
                mapped: false,
                size,
                padded_bytes_per_row,
            },
        );
        Ok(requested)
    }

    fn frame(&mut self) -> Result<FrameId, CompileError> {
        self.frame = self.frame.next();
        self.poll()?;

        let mut oldest_pending: Option<FrameId> = None;
        for (handle, readback) in self.readbacks.iter_mut() {
            if readback.mapped {
                continue;
            }
            match readback.receiver.try_recv() {
                Ok(Ok(())) => readback.mapped = true,
                Ok(Err(e)) => {
                    return Err(CompileError::GpuResource(format!(
                        "readback of target {} failed: {}",
                        handle, e
                    )))
                }
                Err(TryRecvError::Empty) => {
                    oldest_pending = Some(match oldest_pending {
                        Some(frame) => frame.min(readback.requested),
                        None => readback.requested,
                    });
                }
                Err(TryRecvError::Disconnected) => {
                    return Err(CompileError::GpuResource(format!(
                        "readback of target {} was dropped",
                        handle
                    )))
                }
            }
        }

        Ok(match oldest_pending {
            Some(frame) => FrameId(frame.0.saturating_sub(1).min(self.frame.0)),
            None => self.frame,
        })
    }

    fn take_readback(&mut self, target: TargetHandle) -> Result<Surface, CompileError> {
        match self.readbacks.get(&target.0) {
            Some(readback) if readback.mapped => {}
            Some(readback) => {
                return Err(CompileError::GpuResource(format!(
                    "readback of target {} requested at frame {} is not mapped yet",
                    target.0, readback.requested.0
                )))
            }
            None => {
                return Err(CompileError::GpuResource(format!(
                    "no readback requested for target {}",
                    target.0
                )))
            }
        }
        let readback = self
            .readbacks
            .remove(&target.0)
            .ok_or_else(|| CompileError::GpuResource(format!("readback of target {} vanished", target.0)))?;

        let tight_bytes_per_row = (readback.size * BYTES_PER_TEXEL) as usize;
        let padded = readback.padded_bytes_per_row as usize;
        let mut halves = Vec::with_capacity(readback.size as usize * readback.size as usize * 4);
        {
            let data = readback.staging.slice(..).get_mapped_range();
            for row in data.chunks_exact(padded) {
                halves.extend(
                    row[..tight_bytes_per_row]
                        .chunks_exact(2)
                        .map(|b| f16::from_le_bytes([b[0], b[1]])),
                );
            }
        }
        readback.staging.unmap();
        readback.staging.destroy();

        Ok(Surface::from_rgba_f16(readback.size, readback.size, &halves)?.with_wrap_mode(WrapMode::Clamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_params_layout() {
        assert_eq!(std::mem::size_of::<FaceParams>(), 80);
    }

    #[test]
    fn test_align_bytes_per_row() {
        assert_eq!(align_bytes_per_row(8), 256);
        assert_eq!(align_bytes_per_row(256), 256);
        assert_eq!(align_bytes_per_row(264), 512);
    }
}
