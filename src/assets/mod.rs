pub(crate) mod decode;
pub(crate) mod preprocess;
pub(crate) mod source;
