//! Capture adapters: cpal source plus segment encoders

pub mod cpal_device;
pub mod flac;
pub mod wav;

pub use cpal_device::CpalCapture;
