pub(crate) mod blend;
pub(crate) mod driver;
pub(crate) mod geometry;
pub(crate) mod software;
