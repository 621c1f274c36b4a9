//! Broker listener, shared broker state, and the [`BrokerHandle`].
//!
//! [`Broker::bind`] opens the MQTT listener; [`Broker::run`] drives the
//! accept loop until [`BrokerHandle::shutdown`] is called, then waits for
//! every session task to close before returning.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use mqttbytes::QoS;
use mqttbytes::v4::{Packet, Publish};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, Semaphore, broadcast, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use super::config::BrokerConfig;
use super::error::BrokerError;
use super::event::{BrokerEvent, PublishedMessage};
use super::session;
use super::topics::{TopicRegistry, is_valid_topic_name};

/// Message queued for a session's connection task.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// Write this packet to the client.
    Packet(Packet),
    /// Close the connection (session taken over by a newer connection).
    Close,
}

#[derive(Debug)]
struct SessionEntry {
    conn_id: u64,
    tx: mpsc::UnboundedSender<Outbound>,
}

/// State shared between the accept loop, session tasks, and handles.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: BrokerConfig,
    sessions: RwLock<HashMap<String, SessionEntry>>,
    pub(crate) topics: RwLock<TopicRegistry>,
    events: broadcast::Sender<BrokerEvent>,
    shutdown: watch::Sender<bool>,
}

impl Shared {
    fn new(config: BrokerConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            topics: RwLock::new(TopicRegistry::new()),
            events,
            shutdown,
        }
    }

    /// Emits a lifecycle event; dropped when nobody listens.
    pub(crate) fn emit(&self, event: BrokerEvent) {
        let _ = self.events.send(event);
    }

    /// Forwards `publish` at QoS 0 to every matching subscriber.
    ///
    /// Returns the number of sessions the message was queued for.
    pub(crate) async fn route(&self, publish: &Publish) -> usize {
        let targets = self.topics.read().await.subscribers(&publish.topic);
        if targets.is_empty() {
            return 0;
        }

        let sessions = self.sessions.read().await;
        let mut delivered = 0;
        for client_id in &targets {
            let Some(entry) = sessions.get(client_id) else {
                continue;
            };
            let outgoing = at_most_once(publish.topic.clone(), publish.payload.clone());
            if entry
                .tx
                .send(Outbound::Packet(Packet::Publish(outgoing)))
                .is_ok()
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// Registers a connection as the live session of `client_id`.
    ///
    /// Any previous connection with the same id is told to close and the
    /// client's old subscriptions are discarded. Returns `true` if a session
    /// was taken over.
    pub(crate) async fn register(
        &self,
        client_id: &str,
        conn_id: u64,
        tx: mpsc::UnboundedSender<Outbound>,
    ) -> bool {
        let previous = self
            .sessions
            .write()
            .await
            .insert(client_id.to_string(), SessionEntry { conn_id, tx });
        self.topics.write().await.remove_client(client_id);

        match previous {
            Some(old) => {
                let _ = old.tx.send(Outbound::Close);
                true
            }
            None => false,
        }
    }

    /// Removes the session of `client_id` if it still belongs to `conn_id`.
    pub(crate) async fn unregister(&self, client_id: &str, conn_id: u64) {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(client_id)
            .is_some_and(|entry| entry.conn_id == conn_id)
        {
            sessions.remove(client_id);
            drop(sessions);
            self.topics.write().await.remove_client(client_id);
        }
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// QoS 0 PUBLISH as delivered to subscribers.
fn at_most_once(topic: String, payload: Bytes) -> Publish {
    Publish {
        dup: false,
        qos: QoS::AtMostOnce,
        retain: false,
        topic,
        pkid: 0,
        payload,
    }
}

/// Resolves once shutdown has been requested (or the broker state is gone).
pub(crate) async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        let stopped = *rx.borrow_and_update();
        if stopped || rx.changed().await.is_err() {
            return;
        }
    }
}

/// Cloneable handle to a running broker.
///
/// Used by the event hub to listen for lifecycle events and publish back
/// into the broker, and by `main` to trigger shutdown.
#[derive(Debug, Clone)]
pub struct BrokerHandle {
    shared: Arc<Shared>,
}

impl BrokerHandle {
    /// Subscribes to lifecycle events emitted from now on.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<BrokerEvent> {
        self.shared.events.subscribe()
    }

    /// Publishes a QoS 0 message into the broker on behalf of the process.
    ///
    /// The resulting [`BrokerEvent::Published`] carries no client. Returns
    /// the number of subscribers the message was queued for.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Closed`] after shutdown and
    /// [`BrokerError::InvalidTopic`] for empty or wildcard topic names.
    pub async fn publish(
        &self,
        topic: &str,
        payload: impl Into<Bytes>,
    ) -> Result<usize, BrokerError> {
        if self.is_shut_down() {
            return Err(BrokerError::Closed);
        }
        if !is_valid_topic_name(topic) {
            return Err(BrokerError::InvalidTopic(topic.to_string()));
        }

        let publish = at_most_once(topic.to_string(), payload.into());
        let delivered = self.shared.route(&publish).await;
        self.shared.emit(BrokerEvent::Published {
            client: None,
            message: PublishedMessage::from(&publish),
        });
        tracing::debug!(topic, delivered, "internal publish routed");
        Ok(delivered)
    }

    /// Requests a graceful shutdown: the accept loop stops and every session
    /// is closed.
    pub fn shutdown(&self) {
        self.shared.shutdown.send_replace(true);
    }

    /// Returns `true` once [`Self::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        *self.shared.shutdown.borrow()
    }

    /// Returns the number of connected MQTT clients.
    pub async fn client_count(&self) -> usize {
        self.shared.sessions.read().await.len()
    }

    /// Returns the number of active subscriptions across all clients.
    pub async fn subscription_count(&self) -> usize {
        self.shared.topics.read().await.subscription_count()
    }
}

/// Embedded MQTT 3.1.1 broker.
#[derive(Debug)]
pub struct Broker {
    listener: TcpListener,
    handle: BrokerHandle,
    next_conn_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl Broker {
    /// Binds the MQTT listener.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Io`] if the address cannot be bound.
    pub async fn bind(config: BrokerConfig) -> Result<Self, BrokerError> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let connection_semaphore =
            (config.max_connections > 0).then(|| Arc::new(Semaphore::new(config.max_connections)));

        Ok(Self {
            listener,
            handle: BrokerHandle {
                shared: Arc::new(Shared::new(config)),
            },
            next_conn_id: AtomicU64::new(1),
            connection_semaphore,
        })
    }

    /// Returns the bound address (useful when binding port 0).
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Io`] if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, BrokerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns a handle to this broker.
    #[must_use]
    pub fn handle(&self) -> BrokerHandle {
        self.handle.clone()
    }

    /// Runs the accept loop until shutdown, then drains session tasks.
    ///
    /// # Errors
    ///
    /// Currently infallible once bound; accept errors are logged and the
    /// loop continues.
    pub async fn run(self) -> Result<(), BrokerError> {
        let mut shutdown = self.handle.shared.shutdown_signal();
        let mut sessions = JoinSet::new();

        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "mqtt broker listening");
        }

        loop {
            tokio::select! {
                () = shutdown_requested(&mut shutdown) => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => self.spawn_session(&mut sessions, socket, peer),
                    Err(e) => tracing::error!(error = %e, "failed to accept mqtt connection"),
                },
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        tracing::warn!(error = %e, "mqtt session task failed");
                    }
                }
            }
        }

        tracing::info!(open_sessions = sessions.len(), "mqtt broker shutting down");
        while let Some(joined) = sessions.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "mqtt session task failed during shutdown");
            }
        }
        tracing::info!("mqtt broker stopped");
        Ok(())
    }

    /// Spawns [`Self::run`] on the tokio runtime.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<Result<(), BrokerError>> {
        tokio::spawn(self.run())
    }

    fn spawn_session(
        &self,
        sessions: &mut JoinSet<()>,
        socket: TcpStream,
        peer: SocketAddr,
    ) {
        let permit = match &self.connection_semaphore {
            Some(sem) => match Arc::clone(sem).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(%peer, "mqtt connection rejected: limit reached");
                    return;
                }
            },
            None => None,
        };

        if let Err(e) = socket.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "failed to set TCP_NODELAY");
        }

        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::clone(&self.handle.shared);
        let shutdown = shared.shutdown_signal();
        tracing::debug!(conn_id, %peer, "mqtt connection accepted");

        sessions.spawn(async move {
            let _permit = permit;
            if let Err(e) = session::run(socket, peer, conn_id, shared, shutdown).await {
                tracing::debug!(conn_id, %peer, error = %e, "mqtt session ended with error");
            }
        });
    }
}
