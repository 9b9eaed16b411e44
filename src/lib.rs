//! # Waterkit
//!
//! Cross-platform utility kit for building media applications with WaterUI.
//!
//! ## Features
//!
//! Waterkit is modular. Enable only the features you need to keep your
//! dependencies minimal.
//!
//! - `remote`: Lock-screen, headset and media-key remote control session
//!   (Android `MediaSession`, Windows SMTC, Linux MPRIS).
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! waterkit = { version = "0.1", features = ["remote"] }
//! ```
//!
//! ```rust,ignore
//! use waterkit::remote::{RemoteConfig, RemoteControl, Song, StateFlags};
//!
//! let mut remote = RemoteControl::with_platform_host(RemoteConfig::new(), engine);
//! remote.initialize_remote();
//! remote.update_remote(Some(&Song::new("Title")), StateFlags::PLAYING, false);
//! ```

#[cfg(feature = "remote")]
pub use waterkit_remote as remote;
