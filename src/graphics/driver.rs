use crate::foundation::core::Region;
use crate::graphics::blend::BlendMode;
use std::fmt;

/// Number of source image slots available to a single draw.
pub const SHADER_IMAGE_COUNT: usize = 4;

/// Backend handle to an allocated GPU surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(pub u64);

/// Backend handle to a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u64);

/// One draw call, expressed entirely in backend handles.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    /// Surface being drawn into.
    pub target: SurfaceHandle,
    /// Surfaces bound to each source slot.
    pub sources: [Option<SurfaceHandle>; SHADER_IMAGE_COUNT],
    /// Interleaved vertices, see [`crate::VERTEX_FLOAT_COUNT`].
    pub vertices: &'a [f32],
    /// Triangle list indices into `vertices`.
    pub indices: &'a [u32],
    /// Blend equation applied to the target.
    pub blend: BlendMode,
    /// Nominal destination region (scissor).
    pub dst_region: Region,
    /// Addressable region of each source slot.
    pub src_regions: [Option<Region>; SHADER_IMAGE_COUNT],
    /// Program executed for every covered pixel.
    pub program: ProgramHandle,
    /// Raw uniform words passed to the program.
    pub uniforms: &'a [u32],
    /// The draw may write outside `dst_region`.
    pub allow_overflow: bool,
}

/// The narrow backend contract this crate consumes.
///
/// Every call is blocking from the caller's point of view: the effect of `execute_draw` or
/// `write_pixels` must be visible to a following `read_pixels`, even if the implementation
/// batches internally. Freshly allocated surfaces are fully transparent.
pub trait GraphicsDriver {
    /// Opaque description a program is compiled from. Kept by shaders so they can be
    /// recompiled after a context loss.
    type ShaderSource: Clone + fmt::Debug;

    /// Allocate a transparent surface of at least `width x height` pixels.
    fn allocate_surface(&mut self, width: u32, height: u32) -> anyhow::Result<SurfaceHandle>;

    /// Release a surface. Releasing an unknown handle is not an error.
    fn release_surface(&mut self, surface: SurfaceHandle);

    /// Replace the pixels of `region` with tightly packed premultiplied RGBA8 `pixels`.
    fn write_pixels(
        &mut self,
        surface: SurfaceHandle,
        pixels: &[u8],
        region: Region,
    ) -> anyhow::Result<()>;

    /// Read back `region` as tightly packed premultiplied RGBA8.
    fn read_pixels(&mut self, surface: SurfaceHandle, region: Region) -> anyhow::Result<Vec<u8>>;

    /// Execute one draw call.
    fn execute_draw(&mut self, call: &DrawCall<'_>) -> anyhow::Result<()>;

    /// Compile a program.
    fn compile_shader(&mut self, source: &Self::ShaderSource) -> anyhow::Result<ProgramHandle>;

    /// Release a program. Releasing an unknown handle is not an error.
    fn release_shader(&mut self, program: ProgramHandle);

    /// Report whether the context was lost since the previous query.
    ///
    /// After a loss every previously returned surface and program handle is invalid.
    fn is_context_lost(&mut self) -> bool;
}
