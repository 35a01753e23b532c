pub(crate) mod cache;
pub(crate) mod generate;
pub(crate) mod pipeline;
pub(crate) mod remote;
pub(crate) mod validate;
