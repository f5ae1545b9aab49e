//! OpenAI-compatible chat completions provider
//!
//! Works against any server speaking the `/chat/completions` protocol with
//! function tools (OpenAI, local inference servers, gateways).
//!
//! | File | Role |
//! |------|------|
//! | `types.rs` | Wire types and conversions to/from domain turns |
//! | `session.rs` | [`OpenAiSession`]: history-keeping [`LlmSession`](council_application::LlmSession) |
//! | `gateway.rs` | [`OpenAiGateway`]: shared HTTP client, session factory |

mod gateway;
mod session;
pub mod types;

pub use gateway::{OpenAiGateway, OpenAiSettings};
pub use session::OpenAiSession;
