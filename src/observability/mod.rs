//! Logging and OpenTelemetry span export.
//!
//! Log events go to stderr through `tracing-subscriber`'s fmt layer. Spans are
//! additionally bridged into OpenTelemetry and written as JSON lines to a
//! rotating file in the data directory:
//!
//! ```text
//! tracing-opentelemetry → OpenTelemetry SDK → FileSpanExporter → gestly-traces.jsonl
//! ```
//!
//! - **Rotation**: at 10 MB, keeping 3 backups (`.1` newest)
//! - **Level**: `RUST_LOG`, then `trace_level` from [`crate::Config`], then `info`
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - `tracer`: Tracer provider and file span exporter
//! - `file_writer`: Rotating line writer

mod file_writer;
pub mod init;
mod tracer;

pub use init::{init_tracing, TRACE_FILE_NAME};
