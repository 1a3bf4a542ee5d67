//! Connection registry for the active round
//!
//! Every participant connection is represented by an outbound queue that a
//! dedicated writer task drains into the socket. Sending therefore never
//! blocks: a slow peer only backs up its own queue, and a peer whose writer
//! has died shows up as a failed send.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identity of a connection within one round, assigned from 1 upwards
pub type ConnectionId = u32;

/// Send side of one participant connection
#[derive(Debug)]
pub struct Connection {
    /// Peer address, kept for logging
    pub addr: SocketAddr,
    outbox: mpsc::UnboundedSender<String>,
    writer: Option<JoinHandle<()>>,
}

impl Connection {
    /// Wraps an existing outbound queue without a writer task
    pub fn new(addr: SocketAddr, outbox: mpsc::UnboundedSender<String>) -> Self {
        Self {
            addr,
            outbox,
            writer: None,
        }
    }

    /// Spawns a writer task that owns `writer` and drains the queue into it
    ///
    /// The task shuts the stream down once the queue is closed, and exits
    /// early on the first write error.
    pub fn spawn_writer<W>(addr: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let handle = tokio::spawn(write_loop(addr, writer, inbox));
        Self {
            addr,
            outbox,
            writer: Some(handle),
        }
    }

    /// Queues a message; false if the peer is gone
    pub fn send(&self, message: &str) -> bool {
        self.outbox.send(message.to_string()).is_ok()
    }

    /// Closes the queue and waits up to `grace` for queued messages to flush
    ///
    /// Returns false if the writer had to be abandoned.
    pub async fn close(self, grace: Duration) -> bool {
        let Connection { addr, outbox, writer } = self;
        drop(outbox);

        let Some(mut writer) = writer else {
            return true;
        };
        match tokio::time::timeout(grace, &mut writer).await {
            Ok(_) => true,
            Err(_) => {
                warn!("Writer for {} did not flush within {:?}", addr, grace);
                writer.abort();
                false
            }
        }
    }
}

async fn write_loop<W>(addr: SocketAddr, mut writer: W, mut inbox: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = inbox.recv().await {
        if let Err(e) = writer.write_all(message.as_bytes()).await {
            warn!("Failed to send to {}: {}", addr, e);
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of {} failed: {}", addr, e);
    }
}

/// Delivery statistics for one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of connections a send was attempted on
    pub attempted: usize,
    /// Number of sends that were queued successfully
    pub delivered: usize,
    /// Connections dropped because their peer was gone
    pub removed: Vec<ConnectionId>,
}

/// All connections attached to the active round
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    next_id: ConnectionId,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_id: 1,
        }
    }

    /// Adds a connection and returns its identity
    pub fn register(&mut self, connection: Connection) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;

        info!("Player {} joined from {}", id, connection.addr);
        self.connections.insert(id, connection);
        id
    }

    /// Removes a connection; removing an unknown id is a no-op
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.remove(&id);
        if let Some(connection) = &removed {
            info!("Player {} ({}) left", id, connection.addr);
        }
        removed
    }

    /// Sends to a single connection
    pub fn send_to(&self, id: ConnectionId, message: &str) -> bool {
        self.connections
            .get(&id)
            .map(|connection| connection.send(message))
            .unwrap_or(false)
    }

    /// Sends `message` to every registered connection
    ///
    /// A failed send never stops delivery to the others. Connections whose
    /// send failed are removed once the iteration is complete.
    pub fn broadcast(&mut self, message: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for (id, connection) in &self.connections {
            report.attempted += 1;
            if connection.send(message) {
                report.delivered += 1;
            } else {
                report.removed.push(*id);
            }
        }

        for id in &report.removed {
            warn!("Dropping player {} after failed send", id);
            self.connections.remove(id);
        }

        report
    }

    /// Empties the registry, handing every connection back for closing
    pub fn drain(&mut self) -> Vec<(ConnectionId, Connection)> {
        self.connections.drain().collect()
    }

    #[cfg(test)]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Returns the number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio_test::{assert_err, assert_ok};

    fn test_addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    fn queued(port: u16) -> (Connection, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::new(test_addr(port), tx), rx)
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = ConnectionRegistry::new();
        let (a, _rx_a) = queued(1);
        let (b, _rx_b) = queued(2);

        assert_eq!(registry.register(a), 1);
        assert_eq!(registry.register(b), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut registry = ConnectionRegistry::new();
        let (a, _rx) = queued(1);
        let id = registry.register(a);

        assert!(registry.unregister(id).is_some());
        assert!(registry.unregister(id).is_none());
        assert!(registry.unregister(999).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_reaches_everyone_registered() {
        let mut registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for port in 1..=3 {
            let (connection, rx) = queued(port);
            registry.register(connection);
            receivers.push(rx);
        }

        let report = registry.broadcast("hello");
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 3);
        for rx in &mut receivers {
            assert_eq!(assert_ok!(rx.try_recv()), "hello");
        }
    }

    #[test]
    fn test_broadcast_survives_failed_peer() {
        let mut registry = ConnectionRegistry::new();
        let (a, mut rx_a) = queued(1);
        let (b, rx_b) = queued(2);
        let (c, mut rx_c) = queued(3);
        registry.register(a);
        let dead = registry.register(b);
        registry.register(c);
        drop(rx_b);

        let report = registry.broadcast("state");
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.removed, vec![dead]);
        assert_eq!(assert_ok!(rx_a.try_recv()), "state");
        assert_eq!(assert_ok!(rx_c.try_recv()), "state");

        assert!(!registry.contains(dead));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_send_to_single_connection() {
        let mut registry = ConnectionRegistry::new();
        let (a, mut rx_a) = queued(1);
        let (b, mut rx_b) = queued(2);
        let id = registry.register(a);
        registry.register(b);

        assert!(registry.send_to(id, "only you"));
        assert!(!registry.send_to(42, "nobody"));
        assert_eq!(assert_ok!(rx_a.try_recv()), "only you");
        assert_err!(rx_b.try_recv());
    }

    #[test]
    fn test_drain_empties_registry() {
        let mut registry = ConnectionRegistry::new();
        let (a, _rx_a) = queued(1);
        let (b, _rx_b) = queued(2);
        registry.register(a);
        registry.register(b);

        assert_eq!(registry.drain().len(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.broadcast("late").attempted, 0);
    }

    #[tokio::test]
    async fn test_writer_flushes_then_shuts_down() {
        let (local, mut remote) = tokio::io::duplex(256);
        let connection = Connection::spawn_writer(test_addr(1), local);

        assert!(connection.send("first "));
        assert!(connection.send("second"));
        assert!(connection.close(Duration::from_secs(1)).await);

        let mut received = String::new();
        assert_ok!(remote.read_to_string(&mut received).await);
        assert_eq!(received, "first second");
    }

    #[tokio::test]
    async fn test_send_fails_after_peer_dropped() {
        let (local, remote) = tokio::io::duplex(64);
        let connection = Connection::spawn_writer(test_addr(1), local);
        drop(remote);

        // The first write hits the closed pipe and ends the writer task.
        connection.send("lost");
        for _ in 0..50 {
            if !connection.send("probe") {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("send kept succeeding after the peer went away");
    }
}
