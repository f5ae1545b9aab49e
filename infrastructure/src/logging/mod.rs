//! Logging infrastructure: machine-readable run event log.
//!
//! Provides [`JsonlEventLog`], a JSONL file writer that implements the
//! [`RunEventSink`](council_application::RunEventSink) port.

mod jsonl_event_log;

pub use jsonl_event_log::JsonlEventLog;
