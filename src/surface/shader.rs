use crate::graphics::driver::ProgramHandle;

/// A compiled program plus the source it was compiled from.
///
/// Shared by any number of draw commands; never owned by an image.
#[derive(Debug)]
pub(crate) struct Shader<S> {
    pub(crate) source: S,
    pub(crate) program: ProgramHandle,
}

impl<S> Shader<S> {
    pub(crate) fn new(source: S, program: ProgramHandle) -> Self {
        Self { source, program }
    }
}
