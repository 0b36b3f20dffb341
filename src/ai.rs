use thiserror::Error;

pub mod commands;
pub mod openai;
pub mod risk;

pub use self::commands::VcCommand;
pub use self::openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI features are disabled: no API key configured")]
    Disabled,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("request to model provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}
