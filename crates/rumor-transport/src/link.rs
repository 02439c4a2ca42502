//! TCP peer link
//!
//! A link owns one TCP connection. Outgoing messages go through an
//! outbox channel drained by a writer task; inbound frames surface on a
//! shared event channel after passing the resynchronizing decoder. A
//! write or parse failure is logged and the link keeps going; only a
//! failed connect or a closed socket tears the link down.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use rumor_core::{Message, PeerId};
use rumor_wire::{decode_message, encode_message, Packet, StreamDecoder};

/// Read buffer size for a link's socket
const READ_BUFFER: usize = 8 * 1024;

/// Link lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// Outbound connect in flight
    Connecting,
    /// Socket open in both directions
    Connected,
    /// Connect failed or the socket closed
    Closed,
}

/// Events surfaced by links and the listener
#[derive(Debug)]
pub enum LinkEvent {
    /// Outbound connect completed
    Connected { peer: PeerId },
    /// Outbound connect failed
    ConnectFailed { peer: PeerId },
    /// A frame arrived and parsed into a message
    Inbound { peer: PeerId, message: Message },
    /// The socket closed or the read side failed
    Closed { peer: PeerId },
    /// The listener accepted a new inbound connection
    Accepted { stream: TcpStream, addr: String },
}

/// Link event sender channel
pub type LinkEventSender = mpsc::UnboundedSender<LinkEvent>;

/// Link event receiver channel
pub type LinkEventReceiver = mpsc::UnboundedReceiver<LinkEvent>;

/// Create the event channel shared by links and the listener
pub fn link_event_channel() -> (LinkEventSender, LinkEventReceiver) {
    mpsc::unbounded_channel()
}

/// Handle to one TCP peer connection
#[derive(Debug)]
pub struct PeerLink {
    id: PeerId,
    addr: String,
    outbox: mpsc::UnboundedSender<Message>,
    state: Arc<Mutex<LinkState>>,
}

impl PeerLink {
    /// Open an outbound link
    ///
    /// Returns immediately; the connect and all socket IO run on
    /// background tasks reporting through `events`. Frames whose
    /// declared payload exceeds `max_payload` trigger resync.
    pub fn connect(id: PeerId, addr: String, events: LinkEventSender, max_payload: usize) -> Self {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(LinkState::Connecting));

        let io_state = Arc::clone(&state);
        let io_addr = addr.clone();
        tokio::spawn(async move {
            match TcpStream::connect(&io_addr).await {
                Ok(stream) => {
                    *io_state.lock() = LinkState::Connected;
                    let _ = events.send(LinkEvent::Connected { peer: id });
                    run_io(id, stream, outbox_rx, io_state, events, max_payload).await;
                }
                Err(e) => {
                    warn!(peer = %id, addr = %io_addr, error = %e, "connect failed");
                    *io_state.lock() = LinkState::Closed;
                    let _ = events.send(LinkEvent::ConnectFailed { peer: id });
                }
            }
        });

        PeerLink {
            id,
            addr,
            outbox: outbox_tx,
            state,
        }
    }

    /// Adopt a connection accepted by the listener
    pub fn from_stream(
        id: PeerId,
        addr: String,
        stream: TcpStream,
        events: LinkEventSender,
        max_payload: usize,
    ) -> Self {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(LinkState::Connected));

        let io_state = Arc::clone(&state);
        tokio::spawn(async move {
            run_io(id, stream, outbox_rx, io_state, events, max_payload).await;
        });

        PeerLink {
            id,
            addr,
            outbox: outbox_tx,
            state,
        }
    }

    /// Get the peer handle this link serves
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Get the remote address string
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Get the current lifecycle state
    pub fn state(&self) -> LinkState {
        *self.state.lock()
    }

    /// Queue a message for the writer task
    ///
    /// Best effort: a message queued before the connect completes waits
    /// in the outbox, and one queued after close is dropped.
    pub fn send(&self, message: Message) {
        if self.outbox.send(message).is_err() {
            debug!(peer = %self.id, "outbox closed, dropping message");
        }
    }
}

/// Drive both socket directions until the read side ends
async fn run_io(
    id: PeerId,
    stream: TcpStream,
    outbox: mpsc::UnboundedReceiver<Message>,
    state: Arc<Mutex<LinkState>>,
    events: LinkEventSender,
    max_payload: usize,
) {
    let (read_half, write_half) = stream.into_split();
    let writer = tokio::spawn(write_loop(id, write_half, outbox));

    read_loop(id, read_half, &events, max_payload).await;

    *state.lock() = LinkState::Closed;
    writer.abort();
    let _ = events.send(LinkEvent::Closed { peer: id });
}

/// Drain the outbox onto the socket, one frame per message
async fn write_loop(
    id: PeerId,
    mut half: OwnedWriteHalf,
    mut outbox: mpsc::UnboundedReceiver<Message>,
) {
    let mut sequence = 0u32;
    while let Some(message) = outbox.recv().await {
        let packet = Packet::new(encode_message(&message), sequence);
        sequence = sequence.wrapping_add(1);
        if let Err(e) = half.write_all(&packet.encode()).await {
            warn!(peer = %id, error = %e, "write failed");
        }
    }
}

/// Feed socket bytes through the decoder and surface parsed messages
async fn read_loop(id: PeerId, mut half: OwnedReadHalf, events: &LinkEventSender, max_payload: usize) {
    let mut decoder = StreamDecoder::with_max_payload(max_payload);
    let mut buf = vec![0u8; READ_BUFFER];

    loop {
        let n = match half.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!(peer = %id, error = %e, "read failed");
                break;
            }
        };

        decoder.feed(&buf[..n]);
        loop {
            match decoder.next_packet() {
                Ok(Some(packet)) => match decode_message(&packet.payload) {
                    Ok(message) => {
                        if events.send(LinkEvent::Inbound { peer: id, message }).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!(peer = %id, error = %e, "unparseable payload"),
                },
                Ok(None) => break,
                Err(e) => warn!(peer = %id, error = %e, "corrupt frame"),
            }
        }
    }
}
