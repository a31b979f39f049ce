//! Client for TDLib's JSON interface.
//!
//! The native endpoint is a blocking, string-in/string-out session object.
//! This crate turns it into a concurrent request/response API: a background
//! loop polls the endpoint and routes every received message either to the
//! caller waiting on its correlation id or to the subscriber registered for
//! its `@type`. The authorization driver on top issues whatever command the
//! current authorization state asks for until the session is ready.

mod api;
mod builder;
mod client;
mod commands;
mod endpoint;
mod event;
#[cfg(feature = "tdjson")]
mod ffi;
mod types;

pub use builder::{ClientBuilder, Socks5Proxy};
pub use client::{Client, DEFAULT_RECEIVE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, EVENT_BUFFER};
pub use commands::{Command, ProxyType, TdlibParameters};
pub use endpoint::NativeEndpoint;
pub use event::{class_types, Event};
#[cfg(feature = "tdjson")]
pub use ffi::TdJsonEndpoint;
pub use types::{
    AuthState, Chat, ErrorPayload, FormattedText, Message, MessageText, Messages,
    NewMessageUpdate, User,
};
