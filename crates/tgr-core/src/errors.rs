/// Error type shared across the workspace.
///
/// Adapter crates map their specific failures into this type so the pipeline
/// and the binary can handle them consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("parse failed: {context}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request timed out: {request}")]
    Timeout { request: String },

    #[error("request failed. code: {code}, msg: {message}, req: {request}")]
    Request {
        code: i64,
        message: String,
        request: String,
    },

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("already listening for {0} events")]
    AlreadySubscribed(String),

    #[error("bot api call {method} failed: {reason}")]
    BotApi { method: String, reason: String },

    #[error("client is closed")]
    Closed,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
