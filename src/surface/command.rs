use crate::foundation::core::Region;
use crate::foundation::ids::{ImageId, ShaderId};
use crate::graphics::blend::BlendMode;
use crate::graphics::driver::SHADER_IMAGE_COUNT;
use crate::graphics::geometry::VERTEX_FLOAT_COUNT;

/// Arguments of [`crate::ImageStore::draw_triangles`].
///
/// Vertex source coordinates address source slot 0; slot `i` is sampled at the same offset
/// relative to the origin of its own source region.
#[derive(Clone, Copy, Debug)]
pub struct DrawTriangles<'a> {
    /// Source images bound to each slot.
    pub sources: [Option<ImageId>; SHADER_IMAGE_COUNT],
    /// Interleaved vertices, see [`crate::VERTEX_FLOAT_COUNT`].
    pub vertices: &'a [f32],
    /// Triangle list indices.
    pub indices: &'a [u32],
    /// Blend equation.
    pub blend: BlendMode,
    /// Destination region the draw is confined to.
    pub dst_region: Region,
    /// Addressable region of each source; `None` means the whole source.
    pub src_regions: [Option<Region>; SHADER_IMAGE_COUNT],
    /// Program to run.
    pub shader: ShaderId,
    /// Raw uniform words.
    pub uniforms: &'a [u32],
    /// The draw may write outside `dst_region`.
    pub allow_overflow: bool,
}

impl<'a> DrawTriangles<'a> {
    /// Draw with no sources, source-over blending and no uniforms.
    pub fn new(shader: ShaderId, vertices: &'a [f32], indices: &'a [u32], dst_region: Region) -> Self {
        Self {
            sources: [None; SHADER_IMAGE_COUNT],
            vertices,
            indices,
            blend: BlendMode::SourceOver,
            dst_region,
            src_regions: [None; SHADER_IMAGE_COUNT],
            shader,
            uniforms: &[],
            allow_overflow: false,
        }
    }

    /// Bind `image` to source `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= SHADER_IMAGE_COUNT`.
    pub fn with_source(mut self, slot: usize, image: ImageId) -> Self {
        self.sources[slot] = Some(image);
        self
    }

    /// Restrict source `slot` to `region`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= SHADER_IMAGE_COUNT`.
    pub fn with_source_region(mut self, slot: usize, region: Region) -> Self {
        self.src_regions[slot] = Some(region);
        self
    }

    /// Use `blend` instead of source-over.
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Pass `uniforms` to the program.
    pub fn with_uniforms(mut self, uniforms: &'a [u32]) -> Self {
        self.uniforms = uniforms;
        self
    }

    /// Allow the draw to touch pixels outside `dst_region`.
    pub fn with_overflow(mut self, allow: bool) -> Self {
        self.allow_overflow = allow;
        self
    }
}

/// Frozen record of one draw applied to an image.
///
/// Sources are held by handle: replay reads each source's state as rebuilt at replay time.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DrawCommand {
    pub(crate) sources: [Option<ImageId>; SHADER_IMAGE_COUNT],
    pub(crate) vertices: Vec<f32>,
    pub(crate) indices: Vec<u32>,
    pub(crate) blend: BlendMode,
    pub(crate) dst_region: Region,
    pub(crate) src_regions: [Option<Region>; SHADER_IMAGE_COUNT],
    pub(crate) shader: ShaderId,
    pub(crate) uniforms: Vec<u32>,
    pub(crate) allow_overflow: bool,
}

impl DrawCommand {
    pub(crate) fn from_args(args: &DrawTriangles<'_>) -> Self {
        Self {
            sources: args.sources,
            vertices: args.vertices.to_vec(),
            indices: args.indices.to_vec(),
            blend: args.blend,
            dst_region: args.dst_region,
            src_regions: args.src_regions,
            shader: args.shader,
            uniforms: args.uniforms.to_vec(),
            allow_overflow: args.allow_overflow,
        }
    }

    pub(crate) fn source_ids(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.sources.iter().flatten().copied()
    }

    pub(crate) fn depends_on_image(&self, image: ImageId) -> bool {
        self.source_ids().any(|s| s == image)
    }

    pub(crate) fn depends_on_shader(&self, shader: ShaderId) -> bool {
        self.shader == shader
    }

    /// Pixels of a `width x height` destination this command may have written.
    pub(crate) fn affected_region(&self, width: u32, height: u32) -> Region {
        let bounds = Region::from_size(width, height);
        if self.allow_overflow {
            return bounds;
        }
        self.dst_region.intersect(bounds).unwrap_or_default()
    }

    /// Whether `args` draws with exactly the same state, so its geometry can be appended here.
    pub(crate) fn can_merge(&self, args: &DrawTriangles<'_>) -> bool {
        let total_vertices = (self.vertices.len() + args.vertices.len()) / VERTEX_FLOAT_COUNT;
        self.sources == args.sources
            && self.shader == args.shader
            && self.blend == args.blend
            && self.dst_region == args.dst_region
            && self.src_regions == args.src_regions
            && self.allow_overflow == args.allow_overflow
            && self.uniforms == args.uniforms
            && u32::try_from(total_vertices).is_ok()
    }

    pub(crate) fn merge(&mut self, args: &DrawTriangles<'_>) {
        let base = (self.vertices.len() / VERTEX_FLOAT_COUNT) as u32;
        self.vertices.extend_from_slice(args.vertices);
        self.indices.extend(args.indices.iter().map(|i| i + base));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/command.rs"]
mod tests;
