// ============================================================================
// GPU CONTEXT — wgpu Device, Queue, and adapter initialization
// ============================================================================

/// Holds the core wgpu resources shared by the GPU render path.
/// Created once at startup; if creation fails we fall back to CPU rendering.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
}

impl GpuContext {
    /// Attempt to create a GPU context.  Tries hardware first, then falls
    /// back to a software rasterizer (`force_fallback_adapter`) so rendering
    /// still works without a real GPU.
    ///
    /// We use `pollster::block_on` because the hosts are synchronous and we
    /// render headless: the subdivision pass draws into an offscreen target
    /// that is read back to the CPU canvas.
    pub fn new() -> Option<Self> {
        if let Some(ctx) = pollster::block_on(Self::new_async(false)) {
            return Some(ctx);
        }
        crate::log_warn!("hardware adapter unavailable, trying software fallback");
        pollster::block_on(Self::new_async(true))
    }

    async fn new_async(force_fallback: bool) -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None, // headless — offscreen render + readback
                force_fallback_adapter: force_fallback,
            })
            .await?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("GradientFE GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                },
                None,
            )
            .await
            .ok()?;

        Some(Self {
            device,
            queue,
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
        })
    }

    /// Check if a texture of the given dimensions can be created.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width <= self.max_texture_dim && height <= self.max_texture_dim
    }

    /// Submit a single encoder's commands.
    pub fn submit_one(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
