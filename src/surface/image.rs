use crate::foundation::core::Region;
use crate::foundation::ids::{ImageId, ShaderId};
use crate::graphics::driver::SurfaceHandle;
use crate::surface::command::{DrawCommand, DrawTriangles};
use crate::surface::pixels::PixelCache;
use smallvec::SmallVec;
use std::fmt;

/// How an image participates in recovery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// Keeps base pixels and a command log; rebuilt by replay after a context loss.
    #[default]
    Regular,
    /// System surface (e.g. the framebuffer); redrawn by its owner, reallocated cleared.
    Screen,
    /// Scratch surface whose contents never need to survive a loss; reallocated cleared.
    Volatile,
}

impl ImageKind {
    /// Whether images of this kind are rebuilt from their history on restore.
    pub fn is_restorable(self) -> bool {
        matches!(self, ImageKind::Regular)
    }
}

/// Why an image's log can no longer be trusted to reproduce its contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StaleReason {
    SourceModified(ImageId),
    SourceDisposed(ImageId),
    ShaderDisposed(ShaderId),
    StaleSource(ImageId),
    UnrestorableSource(ImageId),
    PartialWrite,
    HistoryLimit,
    RestoreFailed(String),
}

impl StaleReason {
    /// Whether the GPU surface still holds the image's true contents, so a read-back may
    /// replace the log.
    pub(crate) fn can_capture(&self) -> bool {
        !matches!(self, StaleReason::RestoreFailed(_))
    }
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::SourceModified(id) => write!(f, "source {id} was modified after use"),
            StaleReason::SourceDisposed(id) => write!(f, "source {id} was disposed"),
            StaleReason::ShaderDisposed(id) => write!(f, "shader {id} was disposed"),
            StaleReason::StaleSource(id) => write!(f, "drawn from stale source {id}"),
            StaleReason::UnrestorableSource(id) => {
                write!(f, "drawn from non-restorable source {id}")
            }
            StaleReason::PartialWrite => f.write_str("partial write over logged draws"),
            StaleReason::HistoryLimit => f.write_str("command log exceeded its limit"),
            StaleReason::RestoreFailed(why) => write!(f, "previous restore failed: {why}"),
        }
    }
}

/// A GPU surface plus everything needed to rebuild it.
///
/// Visible contents = base pixels, then `history` applied in order; a stale image's GPU
/// surface is the only faithful copy until it is captured again.
pub(crate) struct Image {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) kind: ImageKind,
    pub(crate) surface: SurfaceHandle,
    pub(crate) base: PixelCache,
    pub(crate) history: Vec<DrawCommand>,
    stale: Option<StaleReason>,
}

impl Image {
    pub(crate) fn new(width: u32, height: u32, kind: ImageKind, surface: SurfaceHandle) -> Self {
        let mut base = PixelCache::new(width, height);
        if !kind.is_restorable() {
            base.invalidate();
        }
        Self {
            width,
            height,
            kind,
            surface,
            base,
            history: Vec::new(),
            stale: None,
        }
    }

    pub(crate) fn bounds(&self) -> Region {
        Region::from_size(self.width, self.height)
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.stale.is_some()
    }

    pub(crate) fn stale_reason(&self) -> Option<&StaleReason> {
        self.stale.as_ref()
    }

    /// Flag the image for capture (resolve) or mandatory recomputation (restore).
    ///
    /// The first reason wins; cached pixels are kept.
    pub(crate) fn make_stale(&mut self, reason: StaleReason) {
        if !self.kind.is_restorable() || self.stale.is_some() {
            return;
        }
        tracing::debug!(surface = ?self.surface, %reason, "image marked stale");
        self.base.invalidate();
        self.stale = Some(reason);
    }

    /// Record that restore left this image with a cleared surface.
    ///
    /// Overrides any earlier reason: the surface no longer holds anything worth capturing.
    pub(crate) fn fail_restore(&mut self, why: String) {
        if !self.kind.is_restorable() {
            return;
        }
        self.base.invalidate();
        self.stale = Some(StaleReason::RestoreFailed(why));
    }

    /// Adopt read-back `pixels` as the authoritative base and drop the log.
    pub(crate) fn capture(&mut self, pixels: Vec<u8>) {
        if !self.history.is_empty() {
            tracing::debug!(surface = ?self.surface, dropped = self.history.len(), "history captured");
        }
        self.base.replace_all(pixels);
        self.history.clear();
        self.stale = None;
    }

    pub(crate) fn record_write(&mut self, pixels: &[u8], region: Region) {
        if !self.kind.is_restorable() {
            return;
        }
        if region == self.bounds() {
            self.capture(pixels.to_vec());
            return;
        }
        if self.is_stale() {
            return;
        }
        let (w, h) = (self.width, self.height);
        if self
            .history
            .iter()
            .all(|c| !c.affected_region(w, h).intersects(region))
        {
            self.base.write_region(pixels, region);
            return;
        }
        self.make_stale(StaleReason::PartialWrite);
    }

    /// Log a draw that already executed on the GPU.
    ///
    /// `blocker` names a source that makes the draw unreplayable; the image then goes stale
    /// instead of logging.
    pub(crate) fn record_draw(
        &mut self,
        args: &DrawTriangles<'_>,
        blocker: Option<StaleReason>,
        merge: bool,
        max_history_len: usize,
    ) {
        if !self.kind.is_restorable() {
            return;
        }
        if let Some(reason) = blocker {
            self.make_stale(reason);
            return;
        }
        if self.is_stale() {
            return;
        }

        self.base.invalidate();
        match self.history.last_mut() {
            Some(last) if merge && last.can_merge(args) => last.merge(args),
            _ => self.history.push(DrawCommand::from_args(args)),
        }
        if self.history.len() > max_history_len {
            self.make_stale(StaleReason::HistoryLimit);
        }
    }

    pub(crate) fn depends_on_image(&self, image: ImageId) -> bool {
        self.history.iter().any(|c| c.depends_on_image(image))
    }

    pub(crate) fn depends_on_shader(&self, shader: ShaderId) -> bool {
        self.history.iter().any(|c| c.depends_on_shader(shader))
    }

    /// Distinct source images referenced by the log, in first-use order.
    pub(crate) fn dependencies(&self) -> SmallVec<[ImageId; 4]> {
        let mut out = SmallVec::<[ImageId; 4]>::new();
        for id in self.history.iter().flat_map(|c| c.source_ids()) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/image.rs"]
mod tests;
