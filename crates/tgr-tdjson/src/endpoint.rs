use std::time::Duration;

/// Blocking native messaging endpoint.
///
/// Implementations must accept concurrent `send` calls from any thread
/// alongside a single `receive` poller (TDLib's documented `td_json_client`
/// contract). [`Client`](crate::Client) upholds the receive side of that
/// contract: only its update loop ever calls `receive`.
pub trait NativeEndpoint: Send + Sync {
    /// Hand one serialized request to the endpoint. Never blocks waiting for
    /// a reply; replies, if any, come back through `receive`.
    fn send(&self, request: &str);

    /// Block up to `timeout` for the next message. `None` means the window
    /// elapsed with nothing to read.
    fn receive(&self, timeout: Duration) -> Option<String>;
}
