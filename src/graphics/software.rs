use crate::foundation::core::{BYTES_PER_PIXEL, PremulRgba8, Region};
use crate::foundation::math::{mul_div255_u8, unit_to_u8};
use crate::graphics::driver::{
    DrawCall, GraphicsDriver, ProgramHandle, SHADER_IMAGE_COUNT, SurfaceHandle,
};
use crate::graphics::geometry::{VERTEX_FLOAT_COUNT, Vertex, vertex_at};
use anyhow::{Context, bail};
use std::collections::HashMap;

/// Programs understood by [`SoftwareDriver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SoftwareProgram {
    /// Every covered pixel receives this premultiplied color.
    Fill(PremulRgba8),
    /// Color taken from the first four uniform words (clamped to 255).
    UniformColor,
    /// Nearest sample of source slot 0 scaled by the vertex color.
    Texture,
    /// Saturating sum of the nearest samples of the first `n` source slots.
    Images(usize),
}

/// Call counters kept by [`SoftwareDriver`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoftwareStats {
    /// Surfaces allocated.
    pub surfaces_allocated: u64,
    /// `read_pixels` calls that succeeded.
    pub pixel_reads: u64,
    /// `write_pixels` calls that succeeded.
    pub pixel_writes: u64,
    /// Draw calls executed.
    pub draws: u64,
    /// Programs compiled.
    pub shaders_compiled: u64,
    /// Simulated context losses.
    pub context_losses: u64,
}

struct SoftSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl SoftSurface {
    fn pixel(&self, x: u32, y: u32) -> PremulRgba8 {
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// CPU implementation of [`GraphicsDriver`].
///
/// Serves as the reference backend and as a test double: a context loss can be simulated with
/// [`SoftwareDriver::lose_context`], which drops every surface and program.
#[derive(Default)]
pub struct SoftwareDriver {
    surfaces: HashMap<u64, SoftSurface>,
    programs: HashMap<u64, SoftwareProgram>,
    next_handle: u64,
    lost: bool,
    fail_reads: bool,
    surface_limit: Option<usize>,
    stats: SoftwareStats,
}

impl SoftwareDriver {
    /// Create a driver with no surfaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all surfaces and programs and latch a context loss.
    pub fn lose_context(&mut self) {
        tracing::debug!(
            surfaces = self.surfaces.len(),
            programs = self.programs.len(),
            "simulating context loss"
        );
        self.surfaces.clear();
        self.programs.clear();
        self.lost = true;
        self.stats.context_losses += 1;
    }

    /// Make every subsequent `read_pixels` fail until reset.
    pub fn fail_read_pixels(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Cap the number of live surfaces; allocations beyond it fail.
    pub fn set_surface_limit(&mut self, limit: Option<usize>) {
        self.surface_limit = limit;
    }

    /// Number of live surfaces.
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Number of live programs.
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Call counters since construction.
    pub fn stats(&self) -> SoftwareStats {
        self.stats
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn surface(&self, handle: SurfaceHandle) -> anyhow::Result<&SoftSurface> {
        self.surfaces
            .get(&handle.0)
            .with_context(|| format!("unknown surface {handle:?}"))
    }
}

impl GraphicsDriver for SoftwareDriver {
    type ShaderSource = SoftwareProgram;

    fn allocate_surface(&mut self, width: u32, height: u32) -> anyhow::Result<SurfaceHandle> {
        if width == 0 || height == 0 {
            bail!("surface size must be non-zero, got {width}x{height}");
        }
        if let Some(limit) = self.surface_limit
            && self.surfaces.len() >= limit
        {
            bail!("surface limit of {limit} reached");
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .with_context(|| format!("surface size {width}x{height} overflows"))?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .with_context(|| format!("cannot reserve {len} bytes for a {width}x{height} surface"))?;
        pixels.resize(len, 0);
        let handle = self.next();
        self.surfaces.insert(
            handle,
            SoftSurface {
                width,
                height,
                pixels,
            },
        );
        self.stats.surfaces_allocated += 1;
        Ok(SurfaceHandle(handle))
    }

    fn release_surface(&mut self, surface: SurfaceHandle) {
        self.surfaces.remove(&surface.0);
    }

    fn write_pixels(
        &mut self,
        surface: SurfaceHandle,
        pixels: &[u8],
        region: Region,
    ) -> anyhow::Result<()> {
        let s = self
            .surfaces
            .get_mut(&surface.0)
            .with_context(|| format!("unknown surface {surface:?}"))?;
        if !Region::from_size(s.width, s.height).contains_region(region) {
            bail!("write region {region:?} outside {}x{}", s.width, s.height);
        }
        if pixels.len() != region.byte_len() {
            bail!(
                "write expects {} bytes, got {}",
                region.byte_len(),
                pixels.len()
            );
        }
        let row = region.width as usize * BYTES_PER_PIXEL;
        for (j, src_row) in pixels.chunks_exact(row.max(1)).enumerate() {
            let y = region.y as usize + j;
            let start = (y * s.width as usize + region.x as usize) * BYTES_PER_PIXEL;
            s.pixels[start..start + row].copy_from_slice(src_row);
        }
        self.stats.pixel_writes += 1;
        Ok(())
    }

    fn read_pixels(&mut self, surface: SurfaceHandle, region: Region) -> anyhow::Result<Vec<u8>> {
        if self.fail_reads {
            bail!("read_pixels failure injected");
        }
        let s = self.surface(surface)?;
        if !Region::from_size(s.width, s.height).contains_region(region) {
            bail!("read region {region:?} outside {}x{}", s.width, s.height);
        }
        let row = region.width as usize * BYTES_PER_PIXEL;
        let mut out = Vec::with_capacity(region.byte_len());
        for y in region.y..region.y + region.height {
            let start = (y as usize * s.width as usize + region.x as usize) * BYTES_PER_PIXEL;
            out.extend_from_slice(&s.pixels[start..start + row]);
        }
        self.stats.pixel_reads += 1;
        Ok(out)
    }

    fn execute_draw(&mut self, call: &DrawCall<'_>) -> anyhow::Result<()> {
        if call.sources.iter().flatten().any(|s| *s == call.target) {
            bail!("target {:?} is also bound as a source", call.target);
        }
        let program = self
            .programs
            .get(&call.program.0)
            .cloned()
            .with_context(|| format!("unknown program {:?}", call.program))?;
        for src in call.sources.iter().flatten() {
            self.surface(*src)?;
        }
        let vertex_count = call.vertices.len() / VERTEX_FLOAT_COUNT;
        if let Some(&bad) = call.indices.iter().find(|&&i| i as usize >= vertex_count) {
            bail!("index {bad} out of range for {vertex_count} vertices");
        }

        let target = self
            .surfaces
            .get_mut(&call.target.0)
            .with_context(|| format!("unknown surface {:?}", call.target))?;
        let (width, height) = (target.width, target.height);
        let mut out = std::mem::take(&mut target.pixels);

        let mut sources: [Option<&SoftSurface>; SHADER_IMAGE_COUNT] = [None; SHADER_IMAGE_COUNT];
        for (slot, handle) in call.sources.iter().enumerate() {
            sources[slot] = handle.and_then(|h| self.surfaces.get(&h.0));
        }
        rasterize(&mut out, width, height, &sources, call, &program);

        if let Some(target) = self.surfaces.get_mut(&call.target.0) {
            target.pixels = out;
        }
        self.stats.draws += 1;
        Ok(())
    }

    fn compile_shader(&mut self, source: &SoftwareProgram) -> anyhow::Result<ProgramHandle> {
        if let SoftwareProgram::Images(n) = source
            && *n > SHADER_IMAGE_COUNT
        {
            bail!("program samples {n} images, at most {SHADER_IMAGE_COUNT} are available");
        }
        let handle = self.next();
        self.programs.insert(handle, source.clone());
        self.stats.shaders_compiled += 1;
        Ok(ProgramHandle(handle))
    }

    fn release_shader(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
    }

    fn is_context_lost(&mut self) -> bool {
        std::mem::take(&mut self.lost)
    }
}

fn orient(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

// Pixels exactly on an edge belong to the triangle whose inward normal points right (or down
// for horizontal edges); the neighbour across a shared edge sees the opposite normal.
fn owns_edge(a: [f32; 2], b: [f32; 2], opposite: [f32; 2]) -> bool {
    let (mut nx, mut ny) = (-(b[1] - a[1]), b[0] - a[0]);
    if nx * (opposite[0] - a[0]) + ny * (opposite[1] - a[1]) < 0.0 {
        nx = -nx;
        ny = -ny;
    }
    nx > 0.0 || (nx == 0.0 && ny > 0.0)
}

fn covers(w: f32, a: [f32; 2], b: [f32; 2], opposite: [f32; 2]) -> bool {
    w > 0.0 || (w == 0.0 && owns_edge(a, b, opposite))
}

fn rasterize(
    out: &mut [u8],
    width: u32,
    height: u32,
    sources: &[Option<&SoftSurface>; SHADER_IMAGE_COUNT],
    call: &DrawCall<'_>,
    program: &SoftwareProgram,
) {
    let bounds = Region::from_size(width, height);
    let scissor = if call.allow_overflow {
        Some(bounds)
    } else {
        call.dst_region.intersect(bounds)
    };
    let Some(scissor) = scissor else {
        return;
    };

    for tri in call.indices.chunks_exact(3) {
        let a = vertex_at(call.vertices, tri[0] as usize);
        let b = vertex_at(call.vertices, tri[1] as usize);
        let c = vertex_at(call.vertices, tri[2] as usize);
        let area = orient(a.dst, b.dst, c.dst);
        if area == 0.0 {
            continue;
        }

        let min_x = a.dst[0].min(b.dst[0]).min(c.dst[0]).floor().max(scissor.x as f32);
        let min_y = a.dst[1].min(b.dst[1]).min(c.dst[1]).floor().max(scissor.y as f32);
        let max_x = a.dst[0].max(b.dst[0]).max(c.dst[0]).ceil().min(scissor.right() as f32);
        let max_y = a.dst[1].max(b.dst[1]).max(c.dst[1]).ceil().min(scissor.bottom() as f32);
        if min_x >= max_x || min_y >= max_y {
            continue;
        }

        for py in min_y as u32..max_y as u32 {
            for px in min_x as u32..max_x as u32 {
                let p = [px as f32 + 0.5, py as f32 + 0.5];
                let wa = orient(b.dst, c.dst, p) / area;
                let wb = orient(c.dst, a.dst, p) / area;
                let wc = orient(a.dst, b.dst, p) / area;
                if !covers(wa, b.dst, c.dst, a.dst)
                    || !covers(wb, c.dst, a.dst, b.dst)
                    || !covers(wc, a.dst, b.dst, c.dst)
                {
                    continue;
                }
                let frag = interpolate(&a, &b, &c, wa, wb, wc);
                let color = shade(program, &frag, sources, call);
                let i = (py as usize * width as usize + px as usize) * BYTES_PER_PIXEL;
                let dst = [out[i], out[i + 1], out[i + 2], out[i + 3]];
                out[i..i + 4].copy_from_slice(&call.blend.apply(dst, color));
            }
        }
    }
}

fn interpolate(a: &Vertex, b: &Vertex, c: &Vertex, wa: f32, wb: f32, wc: f32) -> Vertex {
    let mix = |x: f32, y: f32, z: f32| x * wa + y * wb + z * wc;
    Vertex {
        dst: [
            mix(a.dst[0], b.dst[0], c.dst[0]),
            mix(a.dst[1], b.dst[1], c.dst[1]),
        ],
        src: [
            mix(a.src[0], b.src[0], c.src[0]),
            mix(a.src[1], b.src[1], c.src[1]),
        ],
        color: [
            mix(a.color[0], b.color[0], c.color[0]),
            mix(a.color[1], b.color[1], c.color[1]),
            mix(a.color[2], b.color[2], c.color[2]),
            mix(a.color[3], b.color[3], c.color[3]),
        ],
    }
}

fn shade(
    program: &SoftwareProgram,
    frag: &Vertex,
    sources: &[Option<&SoftSurface>; SHADER_IMAGE_COUNT],
    call: &DrawCall<'_>,
) -> PremulRgba8 {
    match program {
        SoftwareProgram::Fill(color) => *color,
        SoftwareProgram::UniformColor => {
            let mut out = [0u8; 4];
            for (o, u) in out.iter_mut().zip(call.uniforms) {
                *o = (*u).min(255) as u8;
            }
            out
        }
        SoftwareProgram::Texture => {
            let texel = sample(sources, call, 0, frag.src);
            let mut out = [0u8; 4];
            for i in 0..4 {
                let scale = u16::from(unit_to_u8(frag.color[i]));
                out[i] = mul_div255_u8(u16::from(texel[i]), scale);
            }
            out
        }
        SoftwareProgram::Images(n) => {
            let mut out = [0u8; 4];
            for slot in 0..(*n).min(SHADER_IMAGE_COUNT) {
                let texel = sample(sources, call, slot, frag.src);
                for i in 0..4 {
                    out[i] = out[i].saturating_add(texel[i]);
                }
            }
            out
        }
    }
}

fn sample(
    sources: &[Option<&SoftSurface>; SHADER_IMAGE_COUNT],
    call: &DrawCall<'_>,
    slot: usize,
    pos: [f32; 2],
) -> PremulRgba8 {
    let Some(surface) = sources[slot] else {
        return [0; 4];
    };
    let origin = call.src_regions[0].map_or((0.0, 0.0), |r| (r.x as f32, r.y as f32));
    let region = call.src_regions[slot].unwrap_or(Region::from_size(surface.width, surface.height));
    let x = pos[0] - origin.0 + region.x as f32;
    let y = pos[1] - origin.1 + region.y as f32;
    if x < 0.0 || y < 0.0 {
        return [0; 4];
    }
    let (tx, ty) = (x.floor() as u32, y.floor() as u32);
    if !region.contains_pixel(tx, ty) || tx >= surface.width || ty >= surface.height {
        return [0; 4];
    }
    surface.pixel(tx, ty)
}

#[cfg(test)]
#[path = "../../tests/unit/graphics/software.rs"]
mod tests;
