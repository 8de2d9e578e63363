use super::Dispatcher;
use super::Hub;
use super::ServerMessage;
use crate::OUTBOUND_BUFFER;
use crate::matchmaker::Matchmaker;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sending half of one live connection, as held by the hub registries.
/// Delivery is best-effort: a full outbound buffer drops the message
/// rather than blocking, so one stuck client never stalls a broadcast.
#[derive(Clone)]
pub struct Connection {
    name: String,
    tx: mpsc::Sender<String>,
}

impl Connection {
    pub fn new(name: &str, tx: mpsc::Sender<String>) -> Self {
        Self {
            name: name.to_string(),
            tx,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Whether two handles point at the same underlying connection.
    /// Distinguishes a stale unregister from a fresh registration
    /// under the same display name.
    pub fn same(&self, other: &Connection) -> bool {
        self.tx.same_channel(&other.tx)
    }
    pub fn send(&self, message: &ServerMessage) {
        self.raw(message.to_json());
    }
    pub fn raw(&self, json: String) {
        match self.tx.try_send(json) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("[session {}] outbound buffer full, dropping message", self.name);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

/// One WebSocket connection's lifetime: bridges the socket to the hub
/// and feeds inbound frames to the protocol dispatcher. The session
/// registers itself on spawn and unregisters when the socket dies.
pub struct Session {
    connection: Connection,
    rx: mpsc::Receiver<String>,
    dispatcher: Dispatcher,
    hub: Hub,
}

impl Session {
    /// Wires up the outbound channel, registers with the hub, and
    /// spawns the bridge loop.
    pub fn spawn(
        name: &str,
        hub: Hub,
        matchmaker: Arc<Matchmaker>,
        ws: actix_ws::Session,
        stream: actix_ws::MessageStream,
    ) {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let connection = Connection::new(name, tx);
        let dispatcher = Dispatcher::new(name, connection.clone(), hub.clone(), matchmaker);
        hub.register(connection.clone());
        let session = Self {
            connection,
            rx,
            dispatcher,
            hub,
        };
        actix_web::rt::spawn(session.run(ws, stream));
    }

    async fn run(mut self, mut ws: actix_ws::Session, mut stream: actix_ws::MessageStream) {
        log::info!("[session {}] connected", self.connection.name());
        'sesh: loop {
            tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    Some(json) => if ws.text(json).await.is_err() { break 'sesh },
                    None => break 'sesh,
                },
                msg = stream.next() => match msg {
                    Some(Ok(actix_ws::Message::Text(text))) => self.dispatcher.dispatch(&text).await,
                    Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                    Some(Err(_)) => break 'sesh,
                    None => break 'sesh,
                    _ => continue 'sesh,
                },
            }
        }
        log::info!("[session {}] closed", self.connection.name());
        self.hub
            .unregister(self.connection.clone(), self.dispatcher.binding().await);
    }
}
