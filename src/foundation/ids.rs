use std::fmt;

/// Arena slot key: dense index plus a generation that changes every time the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SlotKey {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Opaque handle to an image owned by an [`crate::ImageStore`].
///
/// Handles stay cheap to copy and compare; a handle whose image has been disposed never
/// aliases a later image because the slot generation is part of the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub(crate) SlotKey);

/// Opaque handle to a shader owned by an [`crate::ImageStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub(crate) SlotKey);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}v{}", self.0.index, self.0.generation)
    }
}

impl fmt::Display for ShaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shader#{}v{}", self.0.index, self.0.generation)
    }
}
