//! Reconnecting WebSocket client with publish/subscribe dispatch.

use crate::config::RealtimeConfig;
use crate::error::RealtimeError;
use crate::listeners::{EventStream, ListenerId, ListenerRegistry, Subscription};
use crate::protocol::{ClientMessage, Envelope, events};
use crate::transport::{Connector, Frame, FrameSink, FrameStream};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

/// Close code of a normal, intentional closure.
pub const NORMAL_CLOSURE: u16 = 1000;
/// Close code reported when the connection dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Supplies the access token used when (re)connecting.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, if signed in.
    async fn access_token(&self) -> Option<String>;
}

/// A fixed token.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    /// Creates a new static token provider.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// A provider that never has a token.
    #[must_use]
    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and nothing scheduled.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Socket open.
    Open,
    /// Waiting to retry; `attempt` is 1-based.
    Reconnecting { attempt: u32 },
}

/// How a connected session ended.
enum SessionEnd {
    /// Stopped locally by `disconnect`/`shutdown`.
    Stopped,
    /// Closed by the peer with the given code.
    Closed(u16),
    /// Transport failure.
    Failed(RealtimeError),
}

/// A running connection supervisor task.
struct Session {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Session {
    async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await
            && e.is_panic()
        {
            error!("WebSocket session task panicked");
        }
    }
}

struct Inner {
    /// Configuration.
    config: RealtimeConfig,
    /// Opens sockets.
    connector: Arc<dyn Connector>,
    /// Token source for reconnects.
    tokens: Arc<dyn TokenProvider>,
    /// Event listeners.
    listeners: Arc<ListenerRegistry>,
    /// Current state.
    state: RwLock<ConnectionState>,
    /// Consecutive reconnect attempts since the last successful open.
    attempts: AtomicU32,
    /// Outbound queue of the open socket.
    outbound: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    /// Current supervisor task.
    session: AsyncMutex<Option<Session>>,
    /// Set once `shutdown` has been called.
    shut_down: AtomicBool,
}

impl Inner {
    fn state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn set_outbound(&self, tx: Option<mpsc::UnboundedSender<Frame>>) {
        *self.outbound.lock().unwrap_or_else(PoisonError::into_inner) = tx;
    }

    fn outbound(&self) -> Option<mpsc::UnboundedSender<Frame>> {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn emit(&self, event: &str, payload: &Value) {
        self.listeners.emit(event, payload);
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) => {
                debug!(event = %envelope.kind, "WebSocket message received");
                self.emit(&envelope.kind, &envelope.payload);
            }
            Err(e) => warn!(error = %e, "Dropping malformed WebSocket frame"),
        }
    }
}

/// Reconnecting WebSocket client.
///
/// Cheap to clone; clones share one connection and one listener registry.
/// Call [`RealtimeClient::shutdown`] before dropping the last clone so the
/// background task exits.
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

impl RealtimeClient {
    /// Creates a new client. No connection is made until [`RealtimeClient::connect`].
    pub fn new(
        config: RealtimeConfig,
        connector: Arc<dyn Connector>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                connector,
                tokens,
                listeners: Arc::new(ListenerRegistry::new()),
                state: RwLock::new(ConnectionState::Disconnected),
                attempts: AtomicU32::new(0),
                outbound: Mutex::new(None),
                session: AsyncMutex::new(None),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RealtimeConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.state() == ConnectionState::Open
    }

    /// Reconnect attempts made since the last successful open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Opens the connection in the background.
    ///
    /// Does nothing if a connection is already open or being opened. A pending
    /// reconnect is replaced by a fresh attempt. With `token` set to `None`
    /// the token provider is asked.
    ///
    /// # Errors
    /// Returns [`RealtimeError::ShutDown`] after [`RealtimeClient::shutdown`].
    pub async fn connect(&self, token: Option<String>) -> Result<(), RealtimeError> {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return Err(RealtimeError::ShutDown);
        }

        let mut session = self.inner.session.lock().await;
        if matches!(
            self.inner.state(),
            ConnectionState::Open | ConnectionState::Connecting
        ) {
            debug!("WebSocket already connected or connecting");
            return Ok(());
        }

        if let Some(previous) = session.take() {
            previous.stop().await;
        }

        let token = match token {
            Some(token) => Some(token),
            None => self.inner.tokens.access_token().await,
        };

        self.inner.attempts.store(0, Ordering::SeqCst);
        self.inner.set_state(ConnectionState::Connecting);

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(supervise(self.inner.clone(), token, stop_rx));
        *session = Some(Session { stop_tx, handle });
        Ok(())
    }

    /// Closes the connection with a normal close code and cancels any pending reconnect.
    pub async fn disconnect(&self) {
        let session = self.inner.session.lock().await.take();
        if let Some(session) = session {
            session.stop().await;
            info!("WebSocket disconnected");
        }
        self.inner.set_outbound(None);
        self.inner.attempts.store(0, Ordering::SeqCst);
        self.inner.set_state(ConnectionState::Disconnected);
    }

    /// Disconnects and refuses any later [`RealtimeClient::connect`].
    pub async fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        self.disconnect().await;
    }

    /// Sends `{ "type": kind, "payload": payload }`.
    ///
    /// Returns `Ok(false)` without queueing when the socket is not open.
    ///
    /// # Errors
    /// Returns an error if the envelope cannot be serialized.
    pub fn send(&self, kind: &str, payload: Value) -> Result<bool, RealtimeError> {
        self.send_envelope(&Envelope::new(kind, payload))
    }

    /// Sends a typed client message. See [`RealtimeClient::send`].
    ///
    /// # Errors
    /// Returns an error if the envelope cannot be serialized.
    pub fn send_message(&self, message: ClientMessage) -> Result<bool, RealtimeError> {
        self.send_envelope(&message.into_envelope())
    }

    fn send_envelope(&self, envelope: &Envelope) -> Result<bool, RealtimeError> {
        let outbound = match self.inner.outbound() {
            Some(tx) if self.is_connected() => tx,
            _ => {
                warn!(event = %envelope.kind, "WebSocket not connected, message not sent");
                return Ok(false);
            }
        };

        let text = serde_json::to_string(envelope)?;
        if outbound.send(Frame::Text(text)).is_err() {
            warn!(event = %envelope.kind, "WebSocket closed while sending, message not sent");
            return Ok(false);
        }
        debug!(event = %envelope.kind, "WebSocket message queued");
        Ok(true)
    }

    /// Asks the server for live updates about one simulation.
    ///
    /// # Errors
    /// See [`RealtimeClient::send`].
    pub fn subscribe_simulation(&self, simulation_id: &str) -> Result<bool, RealtimeError> {
        self.send_message(ClientMessage::SubscribeSimulation {
            simulation_id: simulation_id.to_string(),
        })
    }

    /// # Errors
    /// See [`RealtimeClient::send`].
    pub fn unsubscribe_simulation(&self, simulation_id: &str) -> Result<bool, RealtimeError> {
        self.send_message(ClientMessage::UnsubscribeSimulation {
            simulation_id: simulation_id.to_string(),
        })
    }

    /// # Errors
    /// See [`RealtimeClient::send`].
    pub fn subscribe_notifications(&self) -> Result<bool, RealtimeError> {
        self.send_message(ClientMessage::SubscribeNotifications)
    }

    /// # Errors
    /// See [`RealtimeClient::send`].
    pub fn unsubscribe_notifications(&self) -> Result<bool, RealtimeError> {
        self.send_message(ClientMessage::UnsubscribeNotifications)
    }

    /// Registers `callback` for every event of type `event`.
    pub fn on<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.inner.listeners.add(event, Arc::new(callback));
        Subscription::new(&self.inner.listeners, event, id)
    }

    /// Registers a listener that receives the payload deserialized as `T`.
    ///
    /// Payloads that do not match `T` are logged and skipped.
    pub fn on_typed<T, F>(&self, event: &str, callback: F) -> Subscription
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        let name = event.to_string();
        self.on(event, move |payload| {
            match serde_json::from_value::<T>(payload.clone()) {
                Ok(value) => callback(value),
                Err(e) => warn!(event = %name, error = %e, "Unexpected event payload"),
            }
        })
    }

    /// Removes a listener by id. Returns whether it was registered.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.inner.listeners.remove(event, id)
    }

    /// Payloads of `event` as an async stream.
    pub fn stream(&self, event: &str) -> EventStream {
        EventStream::register(&self.inner.listeners, event, self.inner.config.event_buffer)
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.listeners.count(event)
    }
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("ws_url", &self.inner.config.ws_url)
            .field("state", &self.inner.state())
            .finish()
    }
}

/// Resolves once a stop has been requested or the client is gone.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// Connects, pumps frames and reconnects with backoff until stopped or out of attempts.
async fn supervise(inner: Arc<Inner>, mut token: Option<String>, mut stop: watch::Receiver<bool>) {
    let policy = inner.config.reconnect_policy();

    loop {
        let url = inner.config.url_with_token(token.as_deref());
        if !matches!(inner.state(), ConnectionState::Reconnecting { .. }) {
            inner.set_state(ConnectionState::Connecting);
        }

        let connecting = timeout(inner.config.connect_timeout, inner.connector.connect(&url));
        let outcome = tokio::select! {
            result = connecting => result.unwrap_or(Err(RealtimeError::Timeout)),
            _ = stop_requested(&mut stop) => {
                inner.set_state(ConnectionState::Disconnected);
                return;
            }
        };

        match outcome {
            Ok((sink, stream)) => {
                // Listeners of `connected` may send right away.
                let (tx, rx) = mpsc::unbounded_channel::<Frame>();
                inner.set_outbound(Some(tx));
                inner.attempts.store(0, Ordering::SeqCst);
                inner.set_state(ConnectionState::Open);
                info!(url = %inner.config.ws_url, "WebSocket connected");
                inner.emit(events::CONNECTED, &json!({}));

                let end = pump(&inner, sink, stream, rx, &mut stop).await;
                inner.set_outbound(None);
                inner.set_state(ConnectionState::Disconnected);

                match end {
                    SessionEnd::Stopped => {
                        inner.emit(events::DISCONNECTED, &json!({ "code": NORMAL_CLOSURE }));
                        return;
                    }
                    SessionEnd::Closed(code) => {
                        info!(code = code, "WebSocket closed");
                        inner.emit(events::DISCONNECTED, &json!({ "code": code }));
                        if code == NORMAL_CLOSURE {
                            return;
                        }
                    }
                    SessionEnd::Failed(e) => {
                        error!(error = %e, "WebSocket error");
                        inner.emit(events::ERROR, &json!({ "message": "WebSocket error" }));
                        inner.emit(
                            events::DISCONNECTED,
                            &json!({ "code": ABNORMAL_CLOSURE }),
                        );
                    }
                }
            }
            Err(e) => {
                error!(error = %e, url = %inner.config.ws_url, "WebSocket connection failed");
                inner.emit(events::ERROR, &json!({ "message": "WebSocket error" }));
                inner.emit(events::DISCONNECTED, &json!({ "code": ABNORMAL_CLOSURE }));
            }
        }

        let made = inner.attempts.load(Ordering::SeqCst);
        if !policy.allows(made) {
            inner.set_state(ConnectionState::Disconnected);
            warn!(attempts = made, "Giving up on WebSocket reconnection");
            inner.emit(events::RECONNECT_FAILED, &json!({ "attempts": made }));
            return;
        }

        let attempt = inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = policy.delay_for(attempt);
        inner.set_state(ConnectionState::Reconnecting { attempt });
        info!(
            attempt = attempt,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Scheduling WebSocket reconnect"
        );

        tokio::select! {
            _ = sleep(delay) => {}
            _ = stop_requested(&mut stop) => {
                inner.set_state(ConnectionState::Disconnected);
                return;
            }
        }

        token = inner.tokens.access_token().await;
    }
}

/// Drives one open connection until it closes, fails or is stopped.
async fn pump(
    inner: &Inner,
    mut sink: FrameSink,
    mut stream: FrameStream,
    mut rx: mpsc::UnboundedReceiver<Frame>,
    stop: &mut watch::Receiver<bool>,
) -> SessionEnd {
    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Frame::Text(text))) => inner.dispatch(&text),
                Some(Ok(Frame::Close(code))) => {
                    return SessionEnd::Closed(code.unwrap_or(ABNORMAL_CLOSURE));
                }
                Some(Err(e)) => return SessionEnd::Failed(e),
                None => return SessionEnd::Closed(ABNORMAL_CLOSURE),
            },
            Some(frame) = rx.recv() => {
                if let Err(e) = sink.send(frame).await {
                    return SessionEnd::Failed(e);
                }
            }
            _ = stop_requested(stop) => {
                let _ = sink.send(Frame::Close(Some(NORMAL_CLOSURE))).await;
                let _ = sink.close().await;
                return SessionEnd::Stopped;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SimulationProgress;
    use crate::transport::mock::{MockConnector, Outcome, ServerSide};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Hands out a different token on every call.
    struct RotatingToken(AtomicUsize);

    #[async_trait]
    impl TokenProvider for RotatingToken {
        async fn access_token(&self) -> Option<String> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Some(format!("fresh{n}"))
        }
    }

    fn client(script: Vec<Outcome>) -> (RealtimeClient, Arc<MockConnector>, mpsc::UnboundedReceiver<ServerSide>) {
        let (connector, accepted) = MockConnector::new(script);
        let client = RealtimeClient::new(
            RealtimeConfig::default(),
            connector.clone(),
            Arc::new(RotatingToken(AtomicUsize::new(0))),
        );
        (client, connector, accepted)
    }

    fn counter(client: &RealtimeClient, event: &str) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let sub = client.on(event, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, sub)
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_schedule_then_gives_up() {
        let (client, connector, mut accepted) = client(vec![Outcome::Accept]);
        let (failed, _sub) = counter(&client, events::RECONNECT_FAILED);

        client.connect(Some("initial".into())).await.unwrap();
        let server = accepted.recv().await.unwrap();
        server.close(ABNORMAL_CLOSURE);

        sleep(Duration::from_secs(120)).await;

        let attempts = connector.attempts();
        assert_eq!(attempts.len(), 6);
        let gaps: Vec<u128> = attempts
            .windows(2)
            .map(|w| (w[1].0 - w[0].0).as_millis())
            .collect();
        assert_eq!(gaps, vec![1000, 2000, 4000, 8000, 16000]);
        assert_eq!(failed.load(Ordering::SeqCst), 1);
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);

        assert!(attempts[0].1.ends_with("/ws?token=initial"));
        assert!(attempts[1].1.ends_with("/ws?token=fresh0"));
        assert!(attempts[2].1.ends_with("/ws?token=fresh1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_resets_attempts() {
        let (client, connector, mut accepted) =
            client(vec![Outcome::Accept, Outcome::Refuse, Outcome::Accept]);
        let (connected, _sub) = counter(&client, events::CONNECTED);

        client.connect(Some("t".into())).await.unwrap();
        accepted.recv().await.unwrap().close(ABNORMAL_CLOSURE);

        let second = accepted.recv().await.unwrap();
        tokio::task::yield_now().await;
        assert!(client.is_connected());
        assert_eq!(client.reconnect_attempts(), 0);
        assert_eq!(connected.load(Ordering::SeqCst), 2);
        assert_eq!(connector.attempts().len(), 3);

        second.close(ABNORMAL_CLOSURE);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(
            client.connection_state(),
            ConnectionState::Reconnecting { attempt: 1 }
        );
        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_normal_close_does_not_reconnect() {
        let (client, connector, mut accepted) = client(vec![Outcome::Accept]);
        let (disconnected, _sub) = counter(&client, events::DISCONNECTED);

        client.connect(Some("t".into())).await.unwrap();
        accepted.recv().await.unwrap().close(NORMAL_CLOSURE);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(disconnected.load(Ordering::SeqCst), 1);
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_reconnect() {
        let (client, connector, mut accepted) = client(vec![Outcome::Accept]);

        client.connect(Some("t".into())).await.unwrap();
        accepted.recv().await.unwrap().close(ABNORMAL_CLOSURE);
        sleep(Duration::from_millis(10)).await;
        assert!(matches!(
            client.connection_state(),
            ConnectionState::Reconnecting { attempt: 1 }
        ));

        client.disconnect().await;
        sleep(Duration::from_secs(60)).await;

        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
        assert_eq!(client.reconnect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_connect_is_noop_while_open() {
        let (client, connector, mut accepted) = client(vec![Outcome::Accept, Outcome::Accept]);
        client.connect(Some("t".into())).await.unwrap();
        let _server = accepted.recv().await.unwrap();
        client.connect(Some("t".into())).await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(connector.attempts().len(), 1);
        client.shutdown().await;
        assert!(matches!(
            client.connect(None).await,
            Err(RealtimeError::ShutDown)
        ));
    }

    #[tokio::test]
    async fn test_progress_frame_reaches_only_matching_listeners() {
        let (client, _connector, mut accepted) = client(vec![Outcome::Accept]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _progress = client.on_typed(events::SIMULATION_PROGRESS, move |p: SimulationProgress| {
            let _ = tx.send(p);
        });
        let (status, _status_sub) = counter(&client, events::SIMULATION_STATUS);

        client.connect(Some("t".into())).await.unwrap();
        let server = accepted.recv().await.unwrap();
        server.send_text("not json");
        server.send_text(
            r#"{"type":"simulation_progress","payload":{"simulation_id":"42","percentage":37.5}}"#,
        );

        let progress = rx.recv().await.unwrap();
        assert_eq!(progress.simulation_id, "42");
        assert_eq!(progress.percentage, 37.5);
        assert_eq!(status.load(Ordering::SeqCst), 0);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_while_closed_returns_false() {
        let (client, _connector, _accepted) = client(vec![]);
        assert!(!client.send("anything", json!({})).unwrap());
        assert!(!client.subscribe_notifications().unwrap());
    }

    #[tokio::test]
    async fn test_send_from_connected_listener_is_delivered() {
        let (client, _connector, mut accepted) = client(vec![Outcome::Accept]);
        let sent = Arc::new(AtomicUsize::new(0));
        let handle = client.clone();
        let s = sent.clone();
        let _sub = client.on(events::CONNECTED, move |_| {
            if handle.subscribe_simulation("42").unwrap() {
                s.fetch_add(1, Ordering::SeqCst);
            }
        });

        client.connect(Some("t".into())).await.unwrap();
        let mut server = accepted.recv().await.unwrap();
        let Some(Frame::Text(text)) = server.from_client.recv().await else {
            panic!("expected a text frame");
        };
        let envelope: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope.kind, "subscribe_simulation");
        assert_eq!(sent.load(Ordering::SeqCst), 1);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscribe_simulation_sends_envelope() {
        let (client, _connector, mut accepted) = client(vec![Outcome::Accept]);
        let mut stream = client.stream(events::CONNECTED);
        client.connect(Some("t".into())).await.unwrap();
        let mut server = accepted.recv().await.unwrap();
        stream.recv().await.unwrap();

        assert!(client.subscribe_simulation("42").unwrap());
        let frame = server.from_client.recv().await.unwrap();
        let Frame::Text(text) = frame else {
            panic!("expected a text frame");
        };
        let envelope: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope.kind, "subscribe_simulation");
        assert_eq!(envelope.payload, json!({ "simulation_id": "42" }));

        client.disconnect().await;
        assert_eq!(
            server.from_client.recv().await,
            Some(Frame::Close(Some(NORMAL_CLOSURE)))
        );
    }
}
