#[cfg(test)]
pub mod impl_fake;
pub mod impl_resize;
pub mod interface;
pub mod tensor;
