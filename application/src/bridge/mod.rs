//! Cross-thread tool execution.
//!
//! Tools may only run on the UI-owning thread. Agents run as async tasks on
//! worker threads and reach the tools through a [`MainThreadBridge`], whose
//! single consumer, the [`UiThreadExecutor`], drains a bounded queue on the
//! UI thread.
//!
//! ```text
//! agent task ──submit()──┐
//! agent task ──submit()──┼──▶ mpsc (bounded) ──▶ UiThreadExecutor (UI thread)
//! agent task ──submit()──┘         ▲                  │ one tool at a time
//!      ▲                           │                  ▼
//!      └───────── oneshot reply ───┴──────── ToolRegistry::invoke
//! ```

pub mod main_thread;

pub use main_thread::{MainThreadBridge, UiThreadExecutor};
