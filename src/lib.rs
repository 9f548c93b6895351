//! Floodgate – backpressure primitives for a message broker's event pipeline.
//!
//! This crate exports
//!  * `core`     – watermark-monitored bounded queues and throttled actions
//!  * `selector` – tokenizer for subscription selection expressions
//!  * `config`   – TOML-driven runtime configuration
//!  * `metrics`  – process-wide queue counters
//!
//! Downstream applications embed `MonitoredQueue` between producer and
//! consumer threads and react to its `QueueState` to throttle producers.

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod config;
pub mod core;
pub mod logging;
pub mod metrics;
pub mod selector;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use config::{load_config, Config};
pub use crate::core::error::{PopError, PushError, WatermarkError};
pub use crate::core::queue::{MonitoredQueue, QueueState};
pub use selector::{tokenize, Lexer, Token, TokenKind};
