//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!
//! Consumers:
//!     → stdout (fmt layer)
//! ```
//!
//! # Design Decisions
//! - Logging starts before settings load, at the schema's default level
//! - The configured level is applied once settings are reconciled

pub mod logging;
