use crate::foundation::arena::Arena;
use crate::foundation::core::Region;
use crate::foundation::error::{RestorableError, RestorableResult};
use crate::foundation::ids::{ImageId, ShaderId};
use crate::graphics::driver::{DrawCall, GraphicsDriver, SHADER_IMAGE_COUNT};
use crate::graphics::geometry::{validate_mesh, validate_source_coords};
use crate::recovery::resolve::resolve_stale_images;
use crate::recovery::restore::{RestoreOutcome, restore_if_needed};
use crate::session::opts::StoreOpts;
use crate::surface::command::DrawTriangles;
use crate::surface::image::{Image, ImageKind, StaleReason};
use crate::surface::shader::Shader;

/// Registry of every live image and shader, and the entry point for resolve and restore.
///
/// All calls are blocking and must be serialized by the caller.
///
/// ```
/// use gpu_restore::{
///     DrawTriangles, ImageKind, ImageStore, Region, RestoreOutcome, SoftwareDriver,
///     SoftwareProgram, StoreOpts, quad_indices, quad_vertices,
/// };
///
/// let mut store = ImageStore::new(SoftwareDriver::new(), StoreOpts::default());
/// let src = store.new_image(1, 1, ImageKind::Regular).unwrap();
/// let dst = store.new_image(1, 1, ImageKind::Regular).unwrap();
/// store.write_pixels(src, &[255, 0, 0, 255], Region::from_size(1, 1)).unwrap();
///
/// let shader = store.new_shader(SoftwareProgram::Texture).unwrap();
/// let unit = Region::from_size(1, 1);
/// let vertices = quad_vertices(unit, unit, [1.0; 4]);
/// let indices = quad_indices();
/// let draw = DrawTriangles::new(shader, &vertices, &indices, unit).with_source(0, src);
/// store.draw_triangles(dst, &draw).unwrap();
///
/// store.driver_mut().lose_context();
/// assert!(matches!(store.restore_if_needed().unwrap(), RestoreOutcome::Restored(_)));
/// assert_eq!(store.read_pixels(dst, unit).unwrap(), vec![255, 0, 0, 255]);
/// ```
pub struct ImageStore<D: GraphicsDriver> {
    driver: D,
    opts: StoreOpts,
    images: Arena<Image>,
    shaders: Arena<Shader<D::ShaderSource>>,
}

impl<D: GraphicsDriver> ImageStore<D> {
    /// Create an empty store on top of `driver`.
    pub fn new(driver: D, opts: StoreOpts) -> Self {
        Self {
            driver,
            opts,
            images: Arena::new(),
            shaders: Arena::new(),
        }
    }

    /// Options this store was created with.
    pub fn opts(&self) -> &StoreOpts {
        &self.opts
    }

    /// Borrow the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutably borrow the driver.
    ///
    /// Calls made directly on the driver bypass the command log.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give back the driver, dropping all bookkeeping.
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Number of live images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Number of live shaders.
    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// Width and height of a live image.
    pub fn image_size(&self, id: ImageId) -> Option<(u32, u32)> {
        self.images.get(id.0).map(|i| (i.width, i.height))
    }

    /// Kind of a live image.
    pub fn image_kind(&self, id: ImageId) -> Option<ImageKind> {
        self.images.get(id.0).map(|i| i.kind)
    }

    /// Whether a live image is stale.
    pub fn is_stale(&self, id: ImageId) -> Option<bool> {
        self.images.get(id.0).map(Image::is_stale)
    }

    /// Commands currently logged for a live image.
    pub fn history_len(&self, id: ImageId) -> Option<usize> {
        self.images.get(id.0).map(|i| i.history.len())
    }

    /// Cached base pixels of a live image, if any were ever written or captured.
    pub fn base_pixels(&self, id: ImageId) -> Option<&[u8]> {
        self.images.get(id.0).and_then(|i| i.base.data())
    }

    /// Allocate a transparent `width x height` image.
    pub fn new_image(
        &mut self,
        width: u32,
        height: u32,
        kind: ImageKind,
    ) -> RestorableResult<ImageId> {
        if width == 0 || height == 0 {
            return Err(RestorableError::bounds(format!(
                "image size must be non-zero, got {width}x{height}"
            )));
        }
        let surface = self
            .driver
            .allocate_surface(width, height)
            .map_err(|source| RestorableError::Allocation {
                width,
                height,
                source,
            })?;
        let id = ImageId(
            self.images
                .insert(Image::new(width, height, kind, surface)),
        );
        tracing::debug!(image = %id, width, height, ?kind, "image created");
        Ok(id)
    }

    /// Replace `region` of `id` with tightly packed premultiplied RGBA8 `pixels`.
    ///
    /// A write covering the whole image resets its log. A partial write is merged into the base
    /// pixels when no logged draw touched the region; otherwise the image goes stale.
    pub fn write_pixels(
        &mut self,
        id: ImageId,
        pixels: &[u8],
        region: Region,
    ) -> RestorableResult<()> {
        let image = self
            .images
            .get(id.0)
            .ok_or(RestorableError::UseAfterDispose(id))?;
        region.ensure_within(image.width, image.height, "write region")?;
        if pixels.len() != region.byte_len() {
            return Err(RestorableError::bounds(format!(
                "write of {region:?} expects {} bytes, got {}",
                region.byte_len(),
                pixels.len()
            )));
        }
        if region.is_empty() {
            return Ok(());
        }
        let surface = image.surface;

        self.make_stale_if_depending_on(id, StaleReason::SourceModified(id));
        self.driver
            .write_pixels(surface, pixels, region)
            .map_err(|e| RestorableError::driver("write_pixels", e))?;
        if let Some(image) = self.images.get_mut(id.0) {
            image.record_write(pixels, region);
        }
        Ok(())
    }

    /// Execute a draw into `dst` and log it for replay.
    pub fn draw_triangles(&mut self, dst: ImageId, args: &DrawTriangles<'_>) -> RestorableResult<()> {
        let target = self
            .images
            .get(dst.0)
            .ok_or(RestorableError::UseAfterDispose(dst))?;
        let program = self
            .shaders
            .get(args.shader.0)
            .map(|s| s.program)
            .ok_or(RestorableError::InvalidShader(args.shader))?;
        validate_mesh(args.vertices, args.indices)?;
        args.dst_region
            .ensure_within(target.width, target.height, "destination region")?;
        let target_surface = target.surface;

        let mut sources = [None; SHADER_IMAGE_COUNT];
        for (slot, src) in args.sources.iter().enumerate() {
            let Some(src) = *src else {
                continue;
            };
            if src == dst {
                return Err(RestorableError::invalid_source(format!(
                    "{dst} cannot be drawn from itself (slot {slot})"
                )));
            }
            let image = self.images.get(src.0).ok_or_else(|| {
                RestorableError::invalid_source(format!("{src} in slot {slot} has been disposed"))
            })?;
            if let Some(reason) = image.stale_reason()
                && !reason.can_capture()
            {
                return Err(RestorableError::invalid_source(format!(
                    "{src} in slot {slot} holds no valid pixels: {reason}"
                )));
            }
            let region = args.src_regions[slot].unwrap_or(image.bounds());
            region.ensure_within(image.width, image.height, "source region")?;
            if slot == 0 {
                validate_source_coords(args.vertices, region)?;
            }
            sources[slot] = Some(image.surface);
        }

        // Images that drew from `dst` go stale before sources are checked; a draw back from one
        // of them never enters the log.
        self.make_stale_if_depending_on(dst, StaleReason::SourceModified(dst));
        let blocker = args.sources.iter().flatten().find_map(|&src| {
            let image = self.images.get(src.0)?;
            if !image.kind.is_restorable() {
                Some(StaleReason::UnrestorableSource(src))
            } else if image.is_stale() {
                Some(StaleReason::StaleSource(src))
            } else {
                None
            }
        });
        let call = DrawCall {
            target: target_surface,
            sources,
            vertices: args.vertices,
            indices: args.indices,
            blend: args.blend,
            dst_region: args.dst_region,
            src_regions: args.src_regions,
            program,
            uniforms: args.uniforms,
            allow_overflow: args.allow_overflow,
        };
        self.driver
            .execute_draw(&call)
            .map_err(|e| RestorableError::driver("execute_draw", e))?;

        if let Some(image) = self.images.get_mut(dst.0) {
            image.record_draw(
                args,
                blocker,
                self.opts.merge_draws,
                self.opts.max_history_len,
            );
        }
        Ok(())
    }

    /// Read `region` of `id` as tightly packed premultiplied RGBA8.
    ///
    /// Served from the base pixels when they are authoritative, otherwise from the GPU. A
    /// whole-image GPU read of a regular image is kept as its new base.
    pub fn read_pixels(&mut self, id: ImageId, region: Region) -> RestorableResult<Vec<u8>> {
        let image = self
            .images
            .get(id.0)
            .ok_or(RestorableError::UseAfterDispose(id))?;
        region.ensure_within(image.width, image.height, "read region")?;
        if region.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(reason) = image.stale_reason()
            && !reason.can_capture()
        {
            return Err(RestorableError::unrecoverable(id, reason.to_string()));
        }
        if image.base.is_authoritative() {
            return Ok(image.base.read_region(region));
        }

        let pixels = self
            .driver
            .read_pixels(image.surface, region)
            .map_err(|e| RestorableError::driver("read_pixels", e))?;
        if region == image.bounds()
            && image.kind.is_restorable()
            && let Some(image) = self.images.get_mut(id.0)
        {
            image.capture(pixels.clone());
        }
        Ok(pixels)
    }

    /// Release `id`. Images whose log draws from it can no longer be replayed and go stale.
    pub fn dispose_image(&mut self, id: ImageId) -> RestorableResult<()> {
        if !self.images.contains(id.0) {
            return Err(RestorableError::UseAfterDispose(id));
        }
        self.make_stale_if_depending_on(id, StaleReason::SourceDisposed(id));
        if let Some(image) = self.images.remove(id.0) {
            self.driver.release_surface(image.surface);
        }
        tracing::debug!(image = %id, "image disposed");
        Ok(())
    }

    /// Compile `source` into a shader usable by [`Self::draw_triangles`].
    pub fn new_shader(&mut self, source: D::ShaderSource) -> RestorableResult<ShaderId> {
        let program = self
            .driver
            .compile_shader(&source)
            .map_err(|e| RestorableError::driver("compile_shader", e))?;
        let id = ShaderId(self.shaders.insert(Shader::new(source, program)));
        tracing::debug!(shader = %id, "shader created");
        Ok(id)
    }

    /// Release `id`. Images whose log uses it go stale; their current pixels stay valid.
    pub fn dispose_shader(&mut self, id: ShaderId) -> RestorableResult<()> {
        let Some(shader) = self.shaders.remove(id.0) else {
            return Err(RestorableError::InvalidShader(id));
        };
        for (_, image) in self.images.iter_mut() {
            if image.depends_on_shader(id) {
                image.make_stale(StaleReason::ShaderDisposed(id));
            }
        }
        self.driver.release_shader(shader.program);
        tracing::debug!(shader = %id, "shader disposed");
        Ok(())
    }

    /// Capture the GPU pixels of every stale image so its log can be dropped.
    ///
    /// Run while the context is intact; a stale image still stale at the next context loss
    /// cannot be restored.
    pub fn resolve_stale_images(&mut self) -> RestorableResult<()> {
        resolve_stale_images(&mut self.driver, &mut self.images).map(|_| ())
    }

    /// Rebuild every shader and image if the driver reports a context loss.
    pub fn restore_if_needed(&mut self) -> RestorableResult<RestoreOutcome> {
        restore_if_needed(
            &mut self.driver,
            &mut self.images,
            &mut self.shaders,
            &self.opts,
        )
    }

    fn make_stale_if_depending_on(&mut self, target: ImageId, reason: StaleReason) {
        for (key, image) in self.images.iter_mut() {
            if key != target.0 && image.depends_on_image(target) {
                image.make_stale(reason.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/store.rs"]
mod tests;
