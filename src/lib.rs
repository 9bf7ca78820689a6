//! gpu-restore keeps GPU-backed 2D images recoverable across graphics context loss.
//!
//! Callers draw into logical [`ImageId`] handles through an [`ImageStore`]. Every draw executes on
//! the GPU immediately and is also recorded in the destination's command log, on top of a CPU
//! copy of its base pixels. When the driver reports a lost context, the store rebuilds each
//! image by uploading its base pixels and replaying its log, sources before destinations.
//!
//! # Lifecycle
//!
//! 1. **Draw**: [`ImageStore::write_pixels`] and [`ImageStore::draw_triangles`] mutate images
//!    and log the mutation.
//! 2. **Resolve**: [`ImageStore::resolve_stale_images`] reads back every image whose log can no
//!    longer be replayed (a source changed or was disposed, a shader was disposed) and drops
//!    the log. Run it while the context is intact, e.g. once per frame.
//! 3. **Restore**: [`ImageStore::restore_if_needed`] is a no-op unless the context was lost; then
//!    it recompiles shaders and rebuilds images in dependency order.
//!
//! The crate never talks to a GPU API itself; it consumes a [`GraphicsDriver`]. A CPU
//! [`SoftwareDriver`] is included as the reference backend and test double.
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Premultiplied RGBA8** end-to-end.
//! - **No silent data loss**: anything that cannot be rebuilt faithfully is reported as an error.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod graphics;
mod recovery;
mod session;
mod surface;

pub use foundation::core::{BYTES_PER_PIXEL, PremulRgba8, Region};
pub use foundation::error::{RestorableError, RestorableResult};
pub use foundation::ids::{ImageId, ShaderId};
pub use graphics::blend::BlendMode;
pub use graphics::driver::{
    DrawCall, GraphicsDriver, ProgramHandle, SHADER_IMAGE_COUNT, SurfaceHandle,
};
pub use graphics::geometry::{VERTEX_FLOAT_COUNT, quad_indices, quad_vertices};
pub use graphics::software::{SoftwareDriver, SoftwareProgram, SoftwareStats};
pub use recovery::restore::{RestoreOutcome, RestoreStats};
pub use session::opts::{MAX_HISTORY_ENV, StoreOpts};
pub use session::store::ImageStore;
pub use surface::command::DrawTriangles;
pub use surface::image::ImageKind;
