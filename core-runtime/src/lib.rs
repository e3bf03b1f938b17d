//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the session engine:
//! - Configuration management ([`config`])
//! - Event bus ([`events`])
//! - Logging and tracing setup ([`logging`])
//!
//! ## Overview
//!
//! This crate establishes the configuration, logging, and event-broadcast
//! conventions used throughout the workspace. It holds no pipeline logic of
//! its own; the session and playback crates consume these types.

pub mod config;
pub mod events;
pub mod logging;

pub use config::{CacheConfig, PlayerOptions, SessionConfig, TranscoderConfig};
pub use events::{EventBus, SessionEvent, SessionEventKind};
