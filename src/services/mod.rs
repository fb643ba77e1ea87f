pub mod extension;
pub mod focus_marker;
pub mod host;
pub mod overlay;
pub mod subscriptions;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use extension::Extension;
pub use host::create_host;
