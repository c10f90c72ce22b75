//! Diagnostic creation, severity management, and text rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels,
//! codes, and optimization-pass context. The thread-safe [`DiagnosticSink`]
//! accumulates diagnostics during an optimization run, and [`TextRenderer`]
//! formats them one line each for terminal output.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::TextRenderer;
pub use severity::Severity;
pub use sink::DiagnosticSink;
