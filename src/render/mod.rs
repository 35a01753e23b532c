pub(crate) mod frame;
pub(crate) mod interpolate;
pub(crate) mod pipeline;
