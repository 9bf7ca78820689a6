pub(crate) mod resolve;
pub(crate) mod restore;
pub(crate) mod scheduler;
