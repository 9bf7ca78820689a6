use crate::foundation::arena::Arena;
use crate::foundation::error::{RestorableError, RestorableResult};
use crate::foundation::ids::{ImageId, ShaderId};
use crate::graphics::driver::{DrawCall, GraphicsDriver, SHADER_IMAGE_COUNT};
use crate::recovery::scheduler::RestoreScheduler;
use crate::session::opts::StoreOpts;
use crate::surface::image::Image;
use crate::surface::shader::Shader;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// What a call to [`crate::ImageStore::restore_if_needed`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The context was intact; nothing was touched.
    NotNeeded,
    /// The context had been lost and every image was rebuilt.
    Restored(RestoreStats),
}

/// Counters for one restore pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestoreStats {
    /// Shaders recompiled from their sources.
    pub shaders_recompiled: usize,
    /// Images whose surfaces were reallocated and repopulated.
    pub images_restored: usize,
    /// Draw commands re-executed.
    pub commands_replayed: usize,
}

/// Image order in which every source precedes the images drawn from it.
///
/// Returns the topological order plus any images caught in a dependency cycle.
pub(crate) fn dependency_order(images: &Arena<Image>) -> (Vec<ImageId>, Vec<ImageId>) {
    let keys = images.keys();
    let node_of: HashMap<ImageId, u32> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| (ImageId(*k), i as u32))
        .collect();

    let deps: Vec<SmallVec<[u32; 4]>> = keys
        .iter()
        .map(|k| {
            images
                .get(*k)
                .map(|img| {
                    img.dependencies()
                        .iter()
                        .filter_map(|d| node_of.get(d).copied())
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    let (order, cyclic) = RestoreScheduler::new(&deps).into_order();
    let to_ids = |nodes: Vec<u32>| -> Vec<ImageId> {
        nodes
            .into_iter()
            .map(|n| ImageId(keys[n as usize]))
            .collect()
    };
    (to_ids(order), to_ids(cyclic))
}

/// Rebuild every shader and image if the driver reports a context loss.
///
/// Shaders are recompiled first, then images are rebuilt in dependency order: reallocate the
/// surface, upload base pixels, replay the log. An image that cannot be replayed (stale,
/// referencing a disposed shader or source, or drawn from an image that itself failed) gets a
/// cleared surface and keeps its stale flag; the pass continues and the first such failure is
/// returned at the end.
#[tracing::instrument(skip_all)]
pub(crate) fn restore_if_needed<D: GraphicsDriver + ?Sized>(
    driver: &mut D,
    images: &mut Arena<Image>,
    shaders: &mut Arena<Shader<D::ShaderSource>>,
    opts: &StoreOpts,
) -> RestorableResult<RestoreOutcome> {
    if !driver.is_context_lost() {
        return Ok(RestoreOutcome::NotNeeded);
    }
    tracing::debug!(
        images = images.len(),
        shaders = shaders.len(),
        "context lost, restoring"
    );

    let mut stats = RestoreStats::default();
    let mut first_err: Option<RestorableError> = None;

    let mut failed_shaders = HashSet::<ShaderId>::new();
    for (key, shader) in shaders.iter_mut() {
        match driver.compile_shader(&shader.source) {
            Ok(program) => {
                shader.program = program;
                stats.shaders_recompiled += 1;
            }
            Err(err) => {
                tracing::warn!(shader = %ShaderId(key), error = %err, "shader recompile failed");
                failed_shaders.insert(ShaderId(key));
                if first_err.is_none() {
                    first_err = Some(RestorableError::driver("compile_shader", err));
                }
            }
        }
    }

    let (order, cyclic) = dependency_order(images);
    let mut failed = HashSet::<ImageId>::new();
    for (id, in_cycle) in order
        .into_iter()
        .map(|id| (id, false))
        .chain(cyclic.into_iter().map(|id| (id, true)))
    {
        let ctx = ReplayCtx {
            failed_images: &failed,
            failed_shaders: &failed_shaders,
            in_cycle,
            opts,
        };
        match restore_image(driver, images, shaders, id, &ctx) {
            Ok(replayed) => {
                stats.images_restored += 1;
                stats.commands_replayed += replayed;
            }
            Err(err) => {
                tracing::warn!(image = %id, error = %err, "image could not be restored");
                if let Some(image) = images.get_mut(id.0) {
                    image.fail_restore(err.to_string());
                }
                failed.insert(id);
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
    }

    if let Some(err) = first_err {
        return Err(err);
    }
    tracing::debug!(?stats, "restore complete");
    Ok(RestoreOutcome::Restored(stats))
}

struct ReplayCtx<'a> {
    failed_images: &'a HashSet<ImageId>,
    failed_shaders: &'a HashSet<ShaderId>,
    in_cycle: bool,
    opts: &'a StoreOpts,
}

fn restore_image<D: GraphicsDriver + ?Sized>(
    driver: &mut D,
    images: &mut Arena<Image>,
    shaders: &Arena<Shader<D::ShaderSource>>,
    id: ImageId,
    ctx: &ReplayCtx<'_>,
) -> RestorableResult<usize> {
    let image = images.get_mut(id.0).ok_or(RestorableError::UseAfterDispose(id))?;
    let (width, height) = (image.width, image.height);
    let surface = driver
        .allocate_surface(width, height)
        .map_err(|source| RestorableError::Allocation {
            width,
            height,
            source,
        })?;
    image.surface = surface;

    if !image.kind.is_restorable() {
        return Ok(0);
    }
    if let Some(reason) = image.stale_reason() {
        return Err(RestorableError::unrecoverable(id, reason.to_string()));
    }
    if ctx.in_cycle {
        return Err(RestorableError::unrecoverable(id, "cyclic source dependency"));
    }

    let image = images.get(id.0).ok_or(RestorableError::UseAfterDispose(id))?;
    check_replayable(id, image, images, shaders, ctx)?;

    image
        .base
        .upload(driver, surface)
        .map_err(|e| RestorableError::driver("write_pixels", e))?;

    for cmd in &image.history {
        let program = shaders
            .get(cmd.shader.0)
            .map(|s| s.program)
            .ok_or(RestorableError::InvalidShader(cmd.shader))?;
        let mut sources = [None; SHADER_IMAGE_COUNT];
        for (slot, src) in cmd.sources.iter().enumerate() {
            sources[slot] = src.and_then(|s| images.get(s.0)).map(|s| s.surface);
        }
        let call = DrawCall {
            target: surface,
            sources,
            vertices: &cmd.vertices,
            indices: &cmd.indices,
            blend: cmd.blend,
            dst_region: cmd.dst_region,
            src_regions: cmd.src_regions,
            program,
            uniforms: &cmd.uniforms,
            allow_overflow: cmd.allow_overflow,
        };
        driver
            .execute_draw(&call)
            .map_err(|e| RestorableError::driver("execute_draw", e))?;
        tracing::trace!(image = %id, shader = %cmd.shader, "replayed draw");
    }

    let replayed = image.history.len();
    let bounds = image.bounds();
    if ctx.opts.capture_after_replay && replayed > 0 {
        // The surface is already rebuilt; without a read-back the log stays the source of truth.
        match driver.read_pixels(surface, bounds) {
            Ok(pixels) => {
                if let Some(image) = images.get_mut(id.0) {
                    image.capture(pixels);
                }
            }
            Err(err) => {
                tracing::warn!(
                    image = %id,
                    error = %err,
                    "capture after replay failed, keeping log"
                );
            }
        }
    }
    Ok(replayed)
}

// Every command is checked up front so a failing image never receives a partial replay.
fn check_replayable<S>(
    id: ImageId,
    image: &Image,
    images: &Arena<Image>,
    shaders: &Arena<Shader<S>>,
    ctx: &ReplayCtx<'_>,
) -> RestorableResult<()> {
    for cmd in &image.history {
        if !shaders.contains(cmd.shader.0) {
            return Err(RestorableError::unrecoverable(
                id,
                format!("shader {} was disposed", cmd.shader),
            ));
        }
        if ctx.failed_shaders.contains(&cmd.shader) {
            return Err(RestorableError::unrecoverable(
                id,
                format!("shader {} could not be recompiled", cmd.shader),
            ));
        }
        for src in cmd.source_ids() {
            if !images.contains(src.0) {
                return Err(RestorableError::unrecoverable(
                    id,
                    format!("source {src} was disposed"),
                ));
            }
            if ctx.failed_images.contains(&src) {
                return Err(RestorableError::unrecoverable(
                    id,
                    format!("source {src} could not be restored"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/recovery/restore.rs"]
mod tests;
