//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like the microphone, the
//! collector HTTP API, and the local filesystem.

pub mod audio_cue;
pub mod capture;
pub mod collector;
pub mod config;
pub mod store;

// Re-export adapters
pub use audio_cue::{create_audio_cue, NoOpAudioCue, RodioAudioCue};
pub use capture::CpalCapture;
pub use collector::HttpCollector;
pub use config::XdgConfigStore;
pub use store::SessionFileStore;
