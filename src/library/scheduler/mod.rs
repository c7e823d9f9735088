#[cfg(test)]
pub mod impl_fake;
pub mod impl_refresh_rate;
pub mod interface;
