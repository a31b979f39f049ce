use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tgr_core::{Error, Result};

use crate::builder::Settings;
use crate::commands::Command;
use crate::endpoint::NativeEndpoint;
use crate::event::Event;
use crate::types::ErrorPayload;

/// Correlation field injected into every correlated request and echoed back
/// verbatim in its reply. Typed commands cannot carry this field themselves.
const EXTRA_FIELD: &str = "@extra";

/// How long `send` waits for a correlated reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// How long one `receive` poll blocks before the loop re-checks the closed
/// flag. This bounds how late a `close` takes effect.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffered events per subscription. The update loop drops events (and logs)
/// on overflow rather than letting one slow consumer stall correlated
/// replies.
pub const EVENT_BUFFER: usize = 128;

/// Handle to one native session.
///
/// `send` is safe under arbitrary concurrent callers; every call owns an
/// independent correlation id and waiter. The endpoint's receive side is
/// owned exclusively by the background update loop.
pub struct Client {
    pub(crate) shared: Arc<Shared>,
    pub(crate) settings: Settings,
    pub(crate) proxy_added: AtomicBool,
    request_timeout: Duration,
    update_loop: Mutex<Option<JoinHandle<()>>>,
}

pub(crate) struct Shared {
    endpoint: Arc<dyn NativeEndpoint>,
    next_id: AtomicU64,
    closed: AtomicBool,
    waiters: Mutex<HashMap<u64, oneshot::Sender<Event>>>,
    subscribers: Mutex<HashMap<String, mpsc::Sender<Event>>>,
}

impl Client {
    pub(crate) fn new(
        endpoint: Arc<dyn NativeEndpoint>,
        settings: Settings,
        request_timeout: Duration,
        receive_timeout: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            endpoint,
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            waiters: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(HashMap::new()),
        });

        let loop_shared = shared.clone();
        let handle =
            tokio::task::spawn_blocking(move || update_loop(loop_shared, receive_timeout));

        Self {
            shared,
            settings,
            proxy_added: AtomicBool::new(false),
            request_timeout,
            update_loop: Mutex::new(Some(handle)),
        }
    }

    /// Send a correlated request and wait for its reply.
    ///
    /// An `error` reply becomes [`Error::Request`]; no reply within the
    /// request timeout becomes [`Error::Timeout`]. Either way the waiter is
    /// removed, so the correlation table never grows over time.
    pub async fn send(&self, command: Command) -> Result<Event> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut payload = serde_json::to_value(&command)?;
        let request_repr = payload.to_string();
        if let Some(object) = payload.as_object_mut() {
            object.insert(EXTRA_FIELD.to_string(), Value::String(id.to_string()));
        }

        // The waiter must exist before the payload leaves, so the update
        // loop can never observe a reply without a registered recipient.
        let receiver = self.register_waiter(id);
        self.shared.endpoint.send(&payload.to_string());

        let outcome = tokio::time::timeout(self.request_timeout, receiver).await;
        self.remove_waiter(id);

        match outcome {
            Ok(Ok(event)) if event.is_error() => Err(request_error(&event, request_repr)),
            Ok(Ok(event)) => Ok(event),
            Ok(Err(_)) => Err(Error::Closed),
            Err(_) => Err(Error::Timeout {
                request: request_repr,
            }),
        }
    }

    /// Transmit a one-way command: no correlation id, no waiter, no blocking.
    pub fn send_and_forget(&self, command: Command) -> Result<()> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        let payload = serde_json::to_value(&command)?;
        self.shared.endpoint.send(&payload.to_string());
        Ok(())
    }

    /// Register the subscriber for one event type. At most one subscription
    /// per type; a duplicate registration is rejected, not overwritten.
    pub fn subscribe(&self, event_type: &str) -> Result<mpsc::Receiver<Event>> {
        let mut subscribers = self.shared.subscribers.lock().unwrap();
        if subscribers.contains_key(event_type) {
            return Err(Error::AlreadySubscribed(event_type.to_string()));
        }
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        subscribers.insert(event_type.to_string(), tx);
        Ok(rx)
    }

    /// Stop the update loop and wait for it to exit. In-flight `send` calls
    /// are not cancelled; they run out their request timeout.
    pub async fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        let handle = self.update_loop.lock().unwrap().take();
        if let Some(handle) = handle {
            // Returns once the current receive window elapses.
            let _ = handle.await;
        }
    }

    fn register_waiter(&self, id: u64) -> oneshot::Receiver<Event> {
        let (tx, rx) = oneshot::channel();
        self.shared.waiters.lock().unwrap().insert(id, tx);
        rx
    }

    fn remove_waiter(&self, id: u64) {
        self.shared.waiters.lock().unwrap().remove(&id);
    }

    #[cfg(test)]
    pub(crate) fn waiter_count(&self) -> usize {
        self.shared.waiters.lock().unwrap().len()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Without this an abandoned client would keep its loop polling until
        // the runtime shuts down.
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

fn request_error(event: &Event, request: String) -> Error {
    match event.decode::<ErrorPayload>() {
        Ok(payload) => Error::Request {
            code: payload.code,
            message: payload.message,
            request,
        },
        Err(parse) => parse,
    }
}

/// Sole reader of the endpoint. Polls until the closed flag is set; a
/// malformed message is logged and skipped, never fatal.
fn update_loop(shared: Arc<Shared>, receive_timeout: Duration) {
    while !shared.closed.load(Ordering::SeqCst) {
        let Some(raw) = shared.endpoint.receive(receive_timeout) else {
            continue;
        };
        match Event::parse(&raw) {
            Ok(event) => dispatch(&shared, event),
            Err(e) => warn!("receive parse failed: {e}"),
        }
    }
    debug!("update loop stopped");
}

fn dispatch(shared: &Shared, event: Event) {
    if event.extra.is_empty() {
        fire_event(shared, event);
        return;
    }

    let id = match event.extra.parse::<u64>() {
        Ok(id) => id,
        Err(_) => {
            warn!(
                "unparsable correlation id {:?} on {} reply",
                event.extra, event.event_type
            );
            return;
        }
    };

    let waiter = shared.waiters.lock().unwrap().remove(&id);
    match waiter {
        // A dead receiver means the reply raced its own timeout; drop it.
        Some(tx) => {
            let _ = tx.send(event);
        }
        None => debug!("no waiter for correlation id {id}, dropping reply"),
    }
}

fn fire_event(shared: &Shared, event: Event) {
    let subscribers = shared.subscribers.lock().unwrap();
    let Some(tx) = subscribers.get(&event.event_type) else {
        return;
    };
    match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!(
                "subscriber for {} events is full, dropping one",
                event.event_type
            );
        }
        Err(TrySendError::Closed(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::testing::ScriptedEndpoint;
    use crate::event::class_types;

    fn test_client(endpoint: Arc<ScriptedEndpoint>) -> Client {
        Client::builder()
            .receive_timeout(Duration::from_millis(5))
            .request_timeout(Duration::from_secs(2))
            .build(endpoint)
    }

    fn echo_chat_responder() -> impl Fn(&Value) -> Vec<String> + Send + Sync {
        |request| {
            let extra = request["@extra"].as_str().unwrap_or_default();
            let chat_id = request["chat_id"].as_i64().unwrap_or_default();
            vec![format!(
                r#"{{"@type":"chat","id":{chat_id},"title":"t","@extra":"{extra}"}}"#
            )]
        }
    }

    #[tokio::test]
    async fn reply_reaches_the_caller() {
        let endpoint = Arc::new(ScriptedEndpoint::with_responder(echo_chat_responder()));
        let client = test_client(endpoint);
        let chat = client.get_chat(99).await.unwrap();
        assert_eq!(chat.id, 99);
        assert_eq!(client.waiter_count(), 0);
        client.close().await;
    }

    #[tokio::test]
    async fn shuffled_replies_route_to_their_own_callers() {
        // Hold replies until all three requests are in, then deliver them in
        // reverse order.
        let pending: Mutex<Vec<(String, i64)>> = Mutex::new(Vec::new());
        let endpoint = Arc::new(ScriptedEndpoint::with_responder(move |request| {
            let extra = request["@extra"].as_str().unwrap_or_default().to_string();
            let chat_id = request["chat_id"].as_i64().unwrap_or_default();
            let mut pending = pending.lock().unwrap();
            pending.push((extra, chat_id));
            if pending.len() < 3 {
                return Vec::new();
            }
            pending
                .drain(..)
                .rev()
                .map(|(extra, id)| {
                    format!(r#"{{"@type":"chat","id":{id},"title":"t","@extra":"{extra}"}}"#)
                })
                .collect()
        }));
        let client = test_client(endpoint);

        let (a, b, c) = tokio::join!(client.get_chat(1), client.get_chat(2), client.get_chat(3));
        assert_eq!(a.unwrap().id, 1);
        assert_eq!(b.unwrap().id, 2);
        assert_eq!(c.unwrap().id, 3);
        assert_eq!(client.waiter_count(), 0);
        client.close().await;
    }

    #[tokio::test]
    async fn error_reply_carries_the_original_request() {
        let endpoint = Arc::new(ScriptedEndpoint::with_responder(|request| {
            let extra = request["@extra"].as_str().unwrap_or_default();
            vec![format!(
                r#"{{"@type":"error","code":404,"message":"chat not found","@extra":"{extra}"}}"#
            )]
        }));
        let client = test_client(endpoint);

        let err = client.get_chat(7).await.unwrap_err();
        match err {
            Error::Request {
                code,
                message,
                request,
            } => {
                assert_eq!(code, 404);
                assert_eq!(message, "chat not found");
                assert!(request.contains("getChat"));
                assert!(request.contains("7"));
            }
            other => panic!("expected Request error, got {other:?}"),
        }
        client.close().await;
    }

    #[tokio::test]
    async fn unanswered_request_times_out_without_leaking_its_waiter() {
        let endpoint = Arc::new(ScriptedEndpoint::new());
        let client = Client::builder()
            .receive_timeout(Duration::from_millis(5))
            .request_timeout(Duration::from_millis(50))
            .build(endpoint);

        let err = client.send(Command::GetMe).await.unwrap_err();
        match err {
            Error::Timeout { request } => assert!(request.contains("getMe")),
            other => panic!("expected Timeout error, got {other:?}"),
        }
        assert_eq!(client.waiter_count(), 0);
        client.close().await;
    }

    #[tokio::test]
    async fn malformed_message_does_not_stop_the_loop() {
        let endpoint = Arc::new(ScriptedEndpoint::with_responder(echo_chat_responder()));
        endpoint.push_reply("not even close to json");

        let client = test_client(endpoint);
        // The loop eats the junk first, then serves the real reply.
        let chat = client.get_chat(5).await.unwrap();
        assert_eq!(chat.id, 5);
        assert_eq!(client.waiter_count(), 0);
        client.close().await;
    }

    #[tokio::test]
    async fn duplicate_subscription_is_rejected() {
        let endpoint = Arc::new(ScriptedEndpoint::new());
        let client = test_client(endpoint);

        let _first = client.subscribe(class_types::UPDATE_NEW_MESSAGE).unwrap();
        let err = client
            .subscribe(class_types::UPDATE_NEW_MESSAGE)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadySubscribed(_)));
        client.close().await;
    }

    #[tokio::test]
    async fn uncorrelated_messages_go_to_the_subscriber() {
        let endpoint = Arc::new(ScriptedEndpoint::new());
        let client = test_client(endpoint.clone());

        let mut events = client.subscribe(class_types::UPDATE_NEW_MESSAGE).unwrap();
        endpoint.push_reply(
            r#"{"@type":"updateNewMessage","message":{"id":1,"chat_id":2,"content":{"@type":"messageText","text":{"text":"hi"}}}}"#,
        );

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type, class_types::UPDATE_NEW_MESSAGE);
        assert!(event.extra.is_empty());
        client.close().await;
    }

    #[tokio::test]
    async fn send_after_close_fails_fast() {
        let endpoint = Arc::new(ScriptedEndpoint::new());
        let client = test_client(endpoint);
        client.close().await;

        assert!(matches!(
            client.send(Command::GetMe).await,
            Err(Error::Closed)
        ));
        assert!(matches!(
            client.send_and_forget(Command::GetMe),
            Err(Error::Closed)
        ));
    }
}
