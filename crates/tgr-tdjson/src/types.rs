//! Typed payloads decoded out of endpoint messages.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use tgr_core::{Error, Result};

/// Authorization state, parsed from the `@type` of a
/// `getAuthorizationState` reply (or an authorization update).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    WaitTdlibParameters,
    WaitEncryptionKey,
    WaitPhoneNumber,
    WaitCode,
    WaitPassword,
    Ready,
    LoggingOut,
    Closing,
    Closed,
    Other(String),
}

impl AuthState {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "authorizationStateWaitTdlibParameters" => Self::WaitTdlibParameters,
            "authorizationStateWaitEncryptionKey" => Self::WaitEncryptionKey,
            "authorizationStateWaitPhoneNumber" => Self::WaitPhoneNumber,
            "authorizationStateWaitCode" => Self::WaitCode,
            "authorizationStateWaitPassword" => Self::WaitPassword,
            "authorizationStateReady" => Self::Ready,
            "authorizationStateLoggingOut" => Self::LoggingOut,
            "authorizationStateClosing" => Self::Closing,
            "authorizationStateClosed" => Self::Closed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::WaitTdlibParameters => "authorizationStateWaitTdlibParameters",
            Self::WaitEncryptionKey => "authorizationStateWaitEncryptionKey",
            Self::WaitPhoneNumber => "authorizationStateWaitPhoneNumber",
            Self::WaitCode => "authorizationStateWaitCode",
            Self::WaitPassword => "authorizationStateWaitPassword",
            Self::Ready => "authorizationStateReady",
            Self::LoggingOut => "authorizationStateLoggingOut",
            Self::Closing => "authorizationStateClosing",
            Self::Closed => "authorizationStateClosed",
            Self::Other(raw) => raw,
        }
    }
}

/// Body of an `error` envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Messages {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// One message. `content` stays undecoded; consumers check
/// [`content_type`](Self::content_type) and decode the shape they expect.
#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    #[serde(default)]
    pub sender_user_id: i64,
    #[serde(default)]
    pub is_outgoing: bool,
    #[serde(rename = "content", default)]
    raw_content: Value,
}

impl Message {
    pub fn content_type(&self) -> &str {
        self.raw_content
            .get("@type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn decode_content<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.raw_content).map_err(|e| Error::Parse {
            context: format!("decoding {} content of message {}", self.content_type(), self.id),
            source: e,
        })
    }
}

/// Body of an `updateNewMessage` event.
#[derive(Clone, Debug, Deserialize)]
pub struct NewMessageUpdate {
    pub message: Message,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageText {
    pub text: FormattedText,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FormattedText {
    #[serde(default)]
    pub text: String,
}
