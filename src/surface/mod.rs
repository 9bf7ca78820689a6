pub(crate) mod command;
pub(crate) mod image;
pub(crate) mod pixels;
pub(crate) mod shader;
