pub(crate) mod meta;
pub(crate) mod repos;
pub(crate) mod shared;
pub(crate) mod status;
pub(crate) mod sync;
