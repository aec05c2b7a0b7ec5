// ============================================================================
// GPU SUBSYSTEM — wgpu context and the subdivision render pipeline
// ============================================================================

pub mod context;
pub mod shaders;
pub mod subdivision;

pub use context::GpuContext;
pub use subdivision::SubdivisionRenderer;

/// GPU failures, split by pipeline stage so callers can report what broke.
/// None of these retry; the frame falls back to the CPU path.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuError {
    ShaderCompile(String),
    ShaderLink(String),
    BufferAlloc(String),
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::ShaderCompile(msg) => write!(f, "shader compilation failed: {}", msg),
            GpuError::ShaderLink(msg) => write!(f, "pipeline creation failed: {}", msg),
            GpuError::BufferAlloc(msg) => write!(f, "buffer/texture allocation failed: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {}
