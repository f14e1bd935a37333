//! Common types and utilities for the tsgen generic type resolution engine.
//!
//! This crate provides foundational types used across all tsgen crates:
//! - String interning (`Atom`, `ShardedInterner`)
//! - Source locations carried from input nodes to diagnostics
//! - Engine limits and thresholds
//! - Diagnostic codes, message templates and the rendered `Diagnostic`
//! - Opt-in tracing subscriber setup

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Position - source locations passed through unchanged
pub mod position;
pub use position::SourceLocation;

// Centralized limits and thresholds
pub mod limits;

// Diagnostic codes and message templates
pub mod diagnostics;
pub use diagnostics::{Diagnostic, diagnostic_codes, diagnostic_messages, format_message};

// Tracing subscriber configuration
pub mod tracing_config;
