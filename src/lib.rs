pub mod assembler;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod fallback;
#[cfg(feature = "server")]
pub mod http;
pub mod logging;
pub mod providers;
pub mod service;

pub use config::Settings;
pub use conversation::{AnswerSource, FinalAnswer, Role, Turn};
pub use error::ChorusError;
pub use service::ChatService;
