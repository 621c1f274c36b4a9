//! Per-connection MQTT session task.
//!
//! Handles the CONNECT handshake, then multiplexes inbound packets from the
//! socket, outbound packets queued by the router, the keep-alive deadline,
//! and the shutdown signal.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use mqttbytes::QoS;
use mqttbytes::v4::{
    ConnAck, ConnectReturnCode, Packet, PubAck, PubComp, PubRec, SubAck, SubscribeReasonCode,
    UnsubAck,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use super::codec;
use super::error::BrokerError;
use super::event::{BrokerEvent, ClientInfo, PublishedMessage};
use super::server::{Outbound, Shared, shutdown_requested};
use super::topics::is_valid_topic_name;

/// Everything the packet handlers need about the running session.
struct Session<'a> {
    socket: &'a mut TcpStream,
    client: &'a ClientInfo,
    shared: &'a Shared,
    /// QoS 2 packet ids received but not yet released.
    inflight: HashSet<u16>,
}

/// Runs one MQTT connection to completion.
pub(crate) async fn run(
    mut socket: TcpStream,
    peer: SocketAddr,
    conn_id: u64,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), BrokerError> {
    let max_packet = shared.config.max_packet_size;
    let mut read_buf = BytesMut::with_capacity(4096);

    let handshake = tokio::time::timeout(
        shared.config.connect_timeout,
        read_packet(&mut socket, &mut read_buf, max_packet),
    )
    .await;

    let connect = match handshake {
        Err(_) => {
            return Err(BrokerError::ConnectTimeout(
                shared.config.connect_timeout.as_secs(),
            ));
        }
        Ok(Err(e)) if e.is_unsupported_protocol() => {
            reject(&mut socket, ConnectReturnCode::RefusedProtocolVersion).await?;
            return Err(e);
        }
        Ok(Err(e)) => return Err(e),
        Ok(Ok(None)) => return Ok(()),
        Ok(Ok(Some(Packet::Connect(connect)))) => connect,
        Ok(Ok(Some(other))) => {
            return Err(BrokerError::Protocol(format!(
                "expected CONNECT, got {}",
                codec::name(&other)
            )));
        }
    };

    let client_id = if connect.client_id.is_empty() {
        if !connect.clean_session {
            reject(&mut socket, ConnectReturnCode::BadClientId).await?;
            return Err(BrokerError::Protocol(
                "empty client id requires a clean session".to_string(),
            ));
        }
        format!("auto-{}", uuid::Uuid::new_v4().simple())
    } else {
        connect.client_id
    };
    let client = ClientInfo {
        id: client_id,
        addr: peer,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    if shared.register(&client.id, conn_id, tx).await {
        tracing::info!(client_id = %client.id, conn_id, "mqtt session taken over");
    }
    write_packet(
        &mut socket,
        &Packet::ConnAck(ConnAck::new(ConnectReturnCode::Success, false)),
    )
    .await?;

    tracing::info!(
        client_id = %client.id,
        %peer,
        keep_alive = connect.keep_alive,
        "mqtt client connected"
    );
    shared.emit(BrokerEvent::ClientConnected {
        client: client.clone(),
    });

    let mut session = Session {
        socket: &mut socket,
        client: &client,
        shared: shared.as_ref(),
        inflight: HashSet::new(),
    };
    let result = session
        .serve(
            &mut read_buf,
            &mut rx,
            &mut shutdown,
            max_packet,
            connect.keep_alive,
        )
        .await;
    drop(session);

    shared.unregister(&client.id, conn_id).await;
    tracing::info!(client_id = %client.id, %peer, "mqtt client disconnected");
    shared.emit(BrokerEvent::ClientDisconnected { client });
    result
}

/// Idle time after which a client with the given keep-alive is dropped:
/// one and a half keep-alive periods, or never when keep-alive is 0.
fn idle_limit(keep_alive: u16) -> Option<Duration> {
    (keep_alive > 0).then(|| Duration::from_millis(u64::from(keep_alive) * 1500))
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl Session<'_> {
    async fn serve(
        &mut self,
        read_buf: &mut BytesMut,
        rx: &mut mpsc::UnboundedReceiver<Outbound>,
        shutdown: &mut watch::Receiver<bool>,
        max_packet: usize,
        keep_alive: u16,
    ) -> Result<(), BrokerError> {
        let limit = idle_limit(keep_alive);
        let mut deadline = limit.map(|limit| Instant::now() + limit);

        loop {
            while let Some(packet) = codec::decode(read_buf, max_packet)? {
                if !self.handle(packet).await? {
                    return Ok(());
                }
            }

            tokio::select! {
                read = self.socket.read_buf(read_buf) => {
                    if read? == 0 {
                        return Ok(());
                    }
                    deadline = limit.map(|limit| Instant::now() + limit);
                }
                outbound = rx.recv() => match outbound {
                    Some(Outbound::Packet(packet)) => write_packet(self.socket, &packet).await?,
                    Some(Outbound::Close) | None => return Ok(()),
                },
                () = expired(deadline) => {
                    tracing::info!(client_id = %self.client.id, keep_alive, "mqtt keep-alive expired");
                    return Err(BrokerError::KeepAliveExpired(keep_alive));
                }
                () = shutdown_requested(shutdown) => return Ok(()),
            }
        }
    }

    /// Handles one inbound packet. Returns `false` when the client asked to
    /// disconnect.
    async fn handle(&mut self, packet: Packet) -> Result<bool, BrokerError> {
        tracing::trace!(client_id = %self.client.id, packet = codec::name(&packet), "mqtt packet received");

        match packet {
            Packet::Publish(publish) => {
                if !is_valid_topic_name(&publish.topic) {
                    return Err(BrokerError::InvalidTopic(publish.topic));
                }
                match publish.qos {
                    QoS::AtLeastOnce => {
                        write_packet(self.socket, &Packet::PubAck(PubAck::new(publish.pkid)))
                            .await?;
                    }
                    QoS::ExactlyOnce => {
                        let first_delivery = self.inflight.insert(publish.pkid);
                        write_packet(self.socket, &Packet::PubRec(PubRec::new(publish.pkid)))
                            .await?;
                        if !first_delivery {
                            return Ok(true);
                        }
                    }
                    QoS::AtMostOnce => {}
                }

                let delivered = self.shared.route(&publish).await;
                tracing::debug!(
                    client_id = %self.client.id,
                    topic = %publish.topic,
                    delivered,
                    "mqtt message routed"
                );
                self.shared.emit(BrokerEvent::Published {
                    client: Some(self.client.clone()),
                    message: PublishedMessage::from(&publish),
                });
            }
            Packet::PubRel(release) => {
                self.inflight.remove(&release.pkid);
                write_packet(self.socket, &Packet::PubComp(PubComp::new(release.pkid))).await?;
            }
            // Outbound delivery is QoS 0, so acknowledgments need no state.
            Packet::PubAck(_) | Packet::PubRec(_) | Packet::PubComp(_) => {}
            Packet::Subscribe(subscribe) => {
                let mut return_codes = Vec::with_capacity(subscribe.filters.len());
                let mut granted = Vec::new();
                {
                    let mut topics = self.shared.topics.write().await;
                    for filter in subscribe.filters {
                        if topics.subscribe(&self.client.id, &filter.path) {
                            return_codes.push(SubscribeReasonCode::Success(QoS::AtMostOnce));
                            granted.push(filter.path);
                        } else {
                            return_codes.push(SubscribeReasonCode::Failure);
                        }
                    }
                }
                write_packet(
                    self.socket,
                    &Packet::SubAck(SubAck::new(subscribe.pkid, return_codes)),
                )
                .await?;
                for topic in granted {
                    self.shared.emit(BrokerEvent::Subscribed {
                        client: Some(self.client.clone()),
                        topic,
                    });
                }
            }
            Packet::Unsubscribe(unsubscribe) => {
                {
                    let mut topics = self.shared.topics.write().await;
                    for filter in &unsubscribe.topics {
                        topics.unsubscribe(&self.client.id, filter);
                    }
                }
                write_packet(
                    self.socket,
                    &Packet::UnsubAck(UnsubAck::new(unsubscribe.pkid)),
                )
                .await?;
                for topic in unsubscribe.topics {
                    self.shared.emit(BrokerEvent::Unsubscribed {
                        client: Some(self.client.clone()),
                        topic,
                    });
                }
            }
            Packet::PingReq => write_packet(self.socket, &Packet::PingResp).await?,
            Packet::Disconnect => return Ok(false),
            Packet::Connect(_) => {
                return Err(BrokerError::Protocol("second CONNECT on session".to_string()));
            }
            other @ (Packet::ConnAck(_)
            | Packet::SubAck(_)
            | Packet::UnsubAck(_)
            | Packet::PingResp) => {
                return Err(BrokerError::Protocol(format!(
                    "unexpected {} from client",
                    codec::name(&other)
                )));
            }
        }
        Ok(true)
    }
}

/// Reads until one full packet is buffered. `Ok(None)` means the peer closed
/// the connection cleanly.
async fn read_packet(
    socket: &mut TcpStream,
    buf: &mut BytesMut,
    max_packet: usize,
) -> Result<Option<Packet>, BrokerError> {
    loop {
        if let Some(packet) = codec::decode(buf, max_packet)? {
            return Ok(Some(packet));
        }
        if socket.read_buf(buf).await? == 0 {
            return Ok(None);
        }
    }
}

async fn write_packet(socket: &mut TcpStream, packet: &Packet) -> Result<(), BrokerError> {
    let mut out = BytesMut::new();
    codec::encode(packet, &mut out)?;
    socket.write_all(&out).await?;
    Ok(())
}

async fn reject(socket: &mut TcpStream, code: ConnectReturnCode) -> Result<(), BrokerError> {
    write_packet(socket, &Packet::ConnAck(ConnAck::new(code, false))).await?;
    socket.shutdown().await?;
    Ok(())
}
