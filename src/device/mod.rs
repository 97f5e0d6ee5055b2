pub mod catalog;

pub use catalog::{DeviceCatalog, DeviceCategory, DeviceDescriptor};
