use crate::foundation::arena::Arena;
use crate::foundation::error::{RestorableError, RestorableResult};
use crate::foundation::ids::ImageId;
use crate::graphics::driver::GraphicsDriver;
use crate::surface::image::Image;

/// Capture the GPU contents of every stale image into its base pixels.
///
/// Draws execute on the GPU as they are issued, so a stale image's surface is authoritative
/// even though its log is not; reading it back and dropping the log makes the cache
/// authoritative again. Nothing is replayed. Images whose read-back fails stay stale and the
/// first failure is returned once every other stale image has been tried.
///
/// Images left stale by a failed restore are skipped: their surfaces hold no valid contents.
#[tracing::instrument(skip_all)]
pub(crate) fn resolve_stale_images<D: GraphicsDriver + ?Sized>(
    driver: &mut D,
    images: &mut Arena<Image>,
) -> RestorableResult<usize> {
    let mut resolved = 0usize;
    let mut first_err = None;

    for (key, image) in images.iter_mut() {
        let Some(reason) = image.stale_reason() else {
            continue;
        };
        if !reason.can_capture() {
            continue;
        }

        match driver.read_pixels(image.surface, image.bounds()) {
            Ok(pixels) => {
                image.capture(pixels);
                resolved += 1;
            }
            Err(err) => {
                tracing::warn!(image = %ImageId(key), error = %err, "stale image read-back failed");
                if first_err.is_none() {
                    first_err = Some(RestorableError::driver("read_pixels", err));
                }
            }
        }
    }

    if let Some(err) = first_err {
        return Err(err);
    }
    if resolved > 0 {
        tracing::debug!(resolved, "resolved stale images");
    }
    Ok(resolved)
}

#[cfg(test)]
#[path = "../../tests/unit/recovery/resolve.rs"]
mod tests;
