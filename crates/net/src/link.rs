//! Peer connection.
//!
//! A [`NetLink`] owns one stream to the opponent. Reading and writing run in
//! background tasks: decoded packets arrive on an unbounded channel that the
//! engine's event multiplexer polls, and outgoing packets are queued through
//! a cloneable [`PeerSender`]. Send order is preserved.

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::protocol::{decode_frame, Packet};

/// How long `close` waits for queued packets to reach the socket.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum NetError {
    #[error("cannot connect to {host}:{port}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("cannot listen on port {port}")]
    Listen {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("accept failed")]
    Accept(#[source] io::Error),
}

/// Cloneable handle for queueing packets to the peer.
#[derive(Debug, Clone)]
pub struct PeerSender {
    tx: mpsc::UnboundedSender<Packet>,
}

impl PeerSender {
    pub fn new(tx: mpsc::UnboundedSender<Packet>) -> Self {
        Self { tx }
    }

    /// A sender whose packets land on the returned receiver. Handy for
    /// driving the engine without a socket.
    pub fn channel() -> (PeerSender, mpsc::UnboundedReceiver<Packet>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Queue a packet. Returns false once the connection is gone.
    pub fn send(&self, packet: Packet) -> bool {
        log::trace!("-> {:?}", packet);
        self.tx.send(packet).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct NetLink {
    peer_host: String,
    sender: PeerSender,
    inbound: Option<mpsc::UnboundedReceiver<Packet>>,
    shutdown: Option<oneshot::Sender<()>>,
    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl NetLink {
    /// Connect to a waiting peer.
    pub async fn connect(host: &str, port: u16) -> Result<Self, NetError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| NetError::Connect {
                host: host.to_string(),
                port,
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            log::warn!("set_nodelay failed: {e}");
        }
        log::info!("connected to {host}:{port}");
        Ok(Self::from_stream(stream, host))
    }

    /// Wait on `port` for exactly one peer.
    pub async fn listen(port: u16) -> Result<Self, NetError> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|source| NetError::Listen { port, source })?;
        log::info!("waiting for a connection on port {port}");
        Self::accept(&listener).await
    }

    /// Accept one peer from an already bound listener.
    pub async fn accept(listener: &TcpListener) -> Result<Self, NetError> {
        let (stream, addr) = listener.accept().await.map_err(NetError::Accept)?;
        if let Err(e) = stream.set_nodelay(true) {
            log::warn!("set_nodelay failed: {e}");
        }
        log::info!("accepted connection from {addr}");
        Ok(Self::from_stream(stream, addr.ip().to_string()))
    }

    /// Wrap any byte stream. Must be called inside a tokio runtime.
    pub fn from_stream<S>(stream: S, peer_host: impl Into<String>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let read_task = tokio::spawn(read_loop(reader, in_tx));
        let write_task = tokio::spawn(write_loop(writer, out_rx, shutdown_rx));

        Self {
            peer_host: peer_host.into(),
            sender: PeerSender::new(out_tx),
            inbound: Some(in_rx),
            shutdown: Some(shutdown_tx),
            read_task,
            write_task,
        }
    }

    pub fn peer_host(&self) -> &str {
        &self.peer_host
    }

    pub fn sender(&self) -> PeerSender {
        self.sender.clone()
    }

    /// Hand the inbound packet stream to the event multiplexer. Only the
    /// first call returns `Some`.
    pub fn take_inbound(&mut self) -> Option<mpsc::UnboundedReceiver<Packet>> {
        self.inbound.take()
    }

    /// Flush what is queued and drop the connection.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        match tokio::time::timeout(FLUSH_TIMEOUT, &mut self.write_task).await {
            Ok(_) => {}
            Err(_) => {
                log::warn!("peer did not drain in time, dropping queued packets");
                self.write_task.abort();
            }
        }
        self.read_task.abort();
        log::debug!("connection to {} closed", self.peer_host);
    }
}

impl Drop for NetLink {
    fn drop(&mut self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}

async fn read_loop<R>(mut reader: R, tx: mpsc::UnboundedSender<Packet>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(1024);
    loop {
        loop {
            match decode_frame(&mut buf) {
                Ok(Some(packet)) => {
                    log::trace!("<- {:?}", packet);
                    if tx.send(packet).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("bad packet from peer: {e}");
                    return;
                }
            }
        }

        match reader.read_buf(&mut buf).await {
            Ok(0) => {
                log::info!("peer closed the connection");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("read from peer failed: {e}");
                return;
            }
        }
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Packet>,
    mut shutdown: oneshot::Receiver<()>,
) where
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(256);
    loop {
        tokio::select! {
            packet = rx.recv() => {
                let Some(packet) = packet else { break };
                buf.clear();
                packet.encode(&mut buf);
                if let Err(e) = writer.write_all(&buf).await {
                    log::warn!("write to peer failed: {e}");
                    return;
                }
            }
            _ = &mut shutdown => {
                buf.clear();
                while let Ok(packet) = rx.try_recv() {
                    packet.encode(&mut buf);
                }
                if let Err(e) = writer.write_all(&buf).await {
                    log::warn!("write to peer failed: {e}");
                    return;
                }
                break;
            }
        }
    }
    let _ = writer.flush().await;
    let _ = writer.shutdown().await;
}
