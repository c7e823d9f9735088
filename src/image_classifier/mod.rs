pub mod class_labels;
pub mod impl_fake;
#[cfg(feature = "tract")]
pub mod impl_tract_onnx;
pub mod interface;
