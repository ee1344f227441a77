//! Multiplexed task WebSocket.
//!
//! A single [`ConnectionService`] owns the socket and the subscription registry. Handles talk to
//! it over a command channel, so registry mutation and update dispatch never race.
//!
//! The socket is opened on the first subscription and closed once the last one is gone. While
//! subscriptions remain, a closed or failed socket is reopened after the reconnect interval and
//! every tracked task is subscribed again.

use super::TrackerMetrics;
use crate::{
    constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_RECONNECT_INTERVAL},
    error::TrackerError,
    types::{ClientMessage, ServerMessage, TaskId, TaskStatus},
};
use futures_util::{FutureExt, SinkExt, StreamExt, future::BoxFuture};
use std::{
    collections::HashMap,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    time::{Sleep, sleep},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, error, info, trace, warn};
use url::Url;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An event delivered to a task subscriber.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// The task status changed.
    Update(TaskStatus),
    /// The connection failed or the server reported an error.
    Error(TrackerError),
}

/// Observable state of the task WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No socket, nothing to track.
    Idle,
    /// The socket is being opened.
    Connecting,
    /// The socket is open.
    Connected,
    /// Waiting to reconnect after a close or failure.
    Backoff,
}

/// Task WebSocket settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Maximum time to wait for the socket to open.
    pub connect_timeout: Duration,
    /// Delay before reopening a closed socket.
    pub reconnect_interval: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }
}

/// Messages accepted by the [`ConnectionService`].
#[derive(Debug)]
enum ConnectionCommand {
    Subscribe { task_id: TaskId, id: u64, events_tx: mpsc::UnboundedSender<TaskEvent> },
    Unsubscribe { task_id: TaskId, id: u64 },
}

/// Handle to a spawned [`ConnectionService`].
///
/// Cloning the handle shares the socket.
#[derive(Debug, Clone)]
pub struct TaskTrackingConnection {
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    state_rx: watch::Receiver<ConnectionState>,
    next_id: Arc<AtomicU64>,
}

impl TaskTrackingConnection {
    /// Spawns a connection service for the WebSocket at `url`.
    ///
    /// Must be called from within a tokio runtime. No socket is opened until the first
    /// subscription.
    pub fn spawn(url: Url, settings: ConnectionSettings) -> Self {
        let (service, handle) = ConnectionService::new(url, settings);
        tokio::spawn(service.run());
        handle
    }

    /// Subscribes to updates of `task_id`.
    ///
    /// Dropping the [`Subscription`] unsubscribes.
    pub fn subscribe(&self, task_id: TaskId) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let _ = self.command_tx.send(ConnectionCommand::Subscribe {
            task_id: task_id.clone(),
            id,
            events_tx,
        });

        Subscription {
            task_id,
            id,
            events_rx,
            command_tx: self.command_tx.clone(),
            active: true,
        }
    }

    /// Returns the current socket state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Returns a receiver notified on socket state changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

/// A subscription to the updates of one task.
#[derive(Debug)]
pub struct Subscription {
    task_id: TaskId,
    id: u64,
    events_rx: mpsc::UnboundedReceiver<TaskEvent>,
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    active: bool,
}

impl Subscription {
    /// The subscribed task.
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Receives the next event.
    ///
    /// Returns `None` once the task reached a final state and its last update was received, or
    /// if the connection service is gone.
    pub async fn recv(&mut self) -> Option<TaskEvent> {
        self.events_rx.recv().await
    }

    /// Stops receiving updates. Calling this more than once has no effect.
    pub fn unsubscribe(&mut self) {
        if std::mem::take(&mut self.active) {
            let _ = self
                .command_tx
                .send(ConnectionCommand::Unsubscribe { task_id: self.task_id.clone(), id: self.id });
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

enum SocketState {
    Idle,
    Connecting(BoxFuture<'static, Result<Socket, TrackerError>>),
    Connected(Box<Socket>),
    Backoff(Pin<Box<Sleep>>),
}

impl SocketState {
    const fn as_state(&self) -> ConnectionState {
        match self {
            Self::Idle => ConnectionState::Idle,
            Self::Connecting(_) => ConnectionState::Connecting,
            Self::Connected(_) => ConnectionState::Connected,
            Self::Backoff(_) => ConnectionState::Backoff,
        }
    }
}

enum SocketEvent {
    Opened(Result<Socket, TrackerError>),
    Message(Option<Result<Message, tungstenite::Error>>),
    BackoffElapsed,
}

/// Waits for the next event of `socket`. Never resolves while idle.
async fn next_socket_event(socket: &mut SocketState) -> SocketEvent {
    match socket {
        SocketState::Idle => std::future::pending().await,
        SocketState::Connecting(connect) => SocketEvent::Opened(connect.await),
        SocketState::Connected(socket) => SocketEvent::Message(socket.next().await),
        SocketState::Backoff(delay) => {
            delay.await;
            SocketEvent::BackoffElapsed
        }
    }
}

/// Service owning the task WebSocket.
pub struct ConnectionService {
    url: Url,
    settings: ConnectionSettings,
    /// Incoming messages for the service.
    command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    /// Subscribers per task.
    subscriptions: HashMap<TaskId, HashMap<u64, mpsc::UnboundedSender<TaskEvent>>>,
    socket: SocketState,
    state_tx: watch::Sender<ConnectionState>,
    metrics: TrackerMetrics,
}

impl ConnectionService {
    /// Creates a new [`ConnectionService`].
    pub fn new(url: Url, settings: ConnectionSettings) -> (Self, TaskTrackingConnection) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let this = Self {
            url,
            settings,
            command_rx,
            subscriptions: HashMap::new(),
            socket: SocketState::Idle,
            state_tx,
            metrics: TrackerMetrics::default(),
        };

        (this, TaskTrackingConnection { command_tx, state_rx, next_id: Arc::new(AtomicU64::new(0)) })
    }

    /// Runs the service until every handle and subscription is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    let Some(command) = command else {
                        break // all handles dropped
                    };
                    self.on_command(command).await;
                }
                event = next_socket_event(&mut self.socket) => self.on_socket_event(event).await,
            }
        }

        self.close().await;
    }

    async fn on_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Subscribe { task_id, id, events_tx } => {
                let subscribers = self.subscriptions.entry(task_id.clone()).or_default();
                let first = subscribers.is_empty();
                subscribers.insert(id, events_tx);
                self.update_gauge();

                match self.socket.as_state() {
                    ConnectionState::Idle => self.connect(),
                    ConnectionState::Connected if first => {
                        self.send(ClientMessage::subscribe(task_id)).await
                    }
                    // Subscribed on open.
                    _ => {}
                }
            }
            ConnectionCommand::Unsubscribe { task_id, id } => {
                let Some(subscribers) = self.subscriptions.get_mut(&task_id) else { return };
                if subscribers.remove(&id).is_none() {
                    return;
                }
                if subscribers.is_empty() {
                    self.subscriptions.remove(&task_id);
                    self.send(ClientMessage::unsubscribe(task_id)).await;
                }
                self.update_gauge();
                self.close_if_unused().await;
            }
        }
    }

    async fn on_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Opened(Ok(socket)) => {
                info!(url = %self.url, "Task websocket connected");
                self.metrics.connections_opened.increment(1);
                self.set_socket(SocketState::Connected(Box::new(socket)));

                let task_ids: Vec<_> = self.subscriptions.keys().cloned().collect();
                for task_id in task_ids {
                    self.send(ClientMessage::subscribe(task_id)).await;
                }
                self.close_if_unused().await;
            }
            SocketEvent::Opened(Err(err)) => self.on_failure(err),
            SocketEvent::Message(Some(Ok(message))) => self.on_message(message).await,
            SocketEvent::Message(Some(Err(err))) => self.on_failure(err.into()),
            SocketEvent::Message(None) => {
                warn!(url = %self.url, "Task websocket closed");
                self.reconnect();
            }
            SocketEvent::BackoffElapsed => {
                if self.subscriptions.is_empty() {
                    self.set_socket(SocketState::Idle);
                } else {
                    self.connect();
                }
            }
        }
    }

    async fn on_message(&mut self, message: Message) {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(frame) => {
                warn!(url = %self.url, ?frame, "Task websocket closed by server");
                self.reconnect();
                return;
            }
            // Pings are answered by the socket itself.
            _ => return,
        };

        let message = match serde_json::from_str::<ServerMessage>(text.as_str()) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, payload = %text.as_str(), "Ignoring malformed task websocket message");
                return;
            }
        };

        match message {
            ServerMessage::Update(status) => {
                self.metrics.updates_received.increment(1);
                trace!(task_id = %status.task_id, state = ?status.task_state, "Task update");
                self.dispatch(status).await;
                self.close_if_unused().await;
            }
            ServerMessage::Error(err) => {
                warn!(task_id = ?err.task_id(), reason = err.message(), "Task websocket error");
                let error = TrackerError::Server(err.message().to_string());
                match err.task_id() {
                    Some(task_id) => self.notify(task_id, TaskEvent::Error(error)),
                    None => self.broadcast(error),
                }
            }
        }
    }

    /// Routes `status` to the subscribers of its task.
    ///
    /// Final states end the subscription locally and on the server.
    async fn dispatch(&mut self, status: TaskStatus) {
        let task_id = status.task_id.clone();
        let is_final = status.is_final();
        self.notify(&task_id, TaskEvent::Update(status));

        if is_final && self.subscriptions.remove(&task_id).is_some() {
            debug!(%task_id, "Task reached a final state");
            self.update_gauge();
            self.send(ClientMessage::unsubscribe(task_id)).await;
        }
    }

    fn notify(&self, task_id: &TaskId, event: TaskEvent) {
        let Some(subscribers) = self.subscriptions.get(task_id) else { return };
        for events_tx in subscribers.values() {
            let _ = events_tx.send(event.clone());
        }
    }

    fn broadcast(&self, error: TrackerError) {
        for subscribers in self.subscriptions.values() {
            for events_tx in subscribers.values() {
                let _ = events_tx.send(TaskEvent::Error(error.clone()));
            }
        }
    }

    fn on_failure(&mut self, err: TrackerError) {
        error!(url = %self.url, %err, "Task websocket failed");
        self.broadcast(err);
        self.reconnect();
    }

    async fn send(&mut self, message: ClientMessage) {
        let SocketState::Connected(socket) = &mut self.socket else { return };
        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(err) => {
                error!(%err, "Failed to encode task websocket message");
                return;
            }
        };

        trace!(%text, "Sending task websocket message");
        let result = socket.send(Message::text(text)).await;
        if let Err(err) = result {
            self.on_failure(err.into());
        }
    }

    fn connect(&mut self) {
        debug!(url = %self.url, "Connecting task websocket");
        let url = self.url.clone();
        let timeout = self.settings.connect_timeout;
        let connect = async move {
            match tokio::time::timeout(timeout, connect_async(url.as_str())).await {
                Ok(Ok((socket, _))) => Ok(socket),
                Ok(Err(err)) => Err(err.into()),
                Err(_) => Err(TrackerError::ConnectTimeout(timeout)),
            }
        };
        self.set_socket(SocketState::Connecting(connect.boxed()));
    }

    /// Schedules a reconnect if there is anything left to track.
    fn reconnect(&mut self) {
        if self.subscriptions.is_empty() {
            self.set_socket(SocketState::Idle);
            return;
        }
        self.metrics.reconnects.increment(1);
        self.set_socket(SocketState::Backoff(Box::pin(sleep(self.settings.reconnect_interval))));
    }

    async fn close_if_unused(&mut self) {
        if self.subscriptions.is_empty() {
            self.close().await;
        }
    }

    async fn close(&mut self) {
        if let SocketState::Connected(socket) = &mut self.socket {
            debug!(url = %self.url, "Closing task websocket");
            let _ = (**socket).close(None).await;
        }
        self.set_socket(SocketState::Idle);
    }

    fn set_socket(&mut self, socket: SocketState) {
        self.socket = socket;
        self.state_tx.send_replace(self.socket.as_state());
    }

    fn update_gauge(&self) {
        let count: usize = self.subscriptions.values().map(HashMap::len).sum();
        self.metrics.active_subscriptions.set(count as f64);
    }
}
