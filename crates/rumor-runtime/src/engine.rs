//! Dissemination engine
//!
//! A single actor task owns the peer registry, the dedup filter, and
//! the routing table. Links and the public handle talk to it through
//! channels only, so peer-list merges and forwarding decisions are
//! naturally serialized. Incoming traffic is handled in four tiers:
//! acknowledgments terminate, control messages dispatch by verb,
//! duplicates drop, and everything else forwards and acks.

use std::net::SocketAddr;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use rumor_core::{
    Message, PeerId, RumorError, RumorResult, INTERESTS_PREFIX, PEER_LIST_PREFIX, REQUEST_PEERS,
};
use rumor_diffusion::{BloomFilter, FloodPolicy, RoutingTable};
use rumor_wire::encode_message;
use rumor_transport::{
    link_event_channel, spawn_listener, LinkEvent, LinkEventReceiver, LinkEventSender, PeerLink,
};

use crate::config::EngineConfig;
use crate::registry::{PeerEntry, PeerRegistry};

/// Counters kept by the engine, queryable through the handle
#[derive(Clone, Debug, Default)]
pub struct EngineStats {
    /// Messages accepted on the origination path
    pub originated: u64,
    /// New content messages accepted from peers
    pub delivered: u64,
    /// Messages dropped by the dedup filter, both paths
    pub duplicates_dropped: u64,
    /// Per-peer sends made by the forward path
    pub forwarded: u64,
    /// Acknowledgments unicast back to senders
    pub acks_sent: u64,
    /// Acknowledgments received for our messages
    pub acks_received: u64,
    /// Control messages dispatched
    pub control_handled: u64,
    /// Peers registered, outbound and inbound
    pub peers_added: u64,
    /// Outbound connects that failed
    pub connect_failures: u64,
}

/// Notifications the engine emits to its host
#[derive(Clone, Debug)]
pub enum EngineEvent {
    /// A new content message was accepted, forwarded, and acked
    Delivered { peer: PeerId, message: Message },
    /// A peer acknowledged one of our messages
    AckReceived { peer: PeerId },
}

/// Engine event receiver channel
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

enum EngineCommand {
    SendMessage(Message),
    Broadcast(Message),
    Bootstrap(Vec<String>),
    DeclareInterests(Vec<String>),
    Listen(String, oneshot::Sender<RumorResult<SocketAddr>>),
    Stats(oneshot::Sender<EngineStats>),
}

/// Cloneable handle to a running engine
///
/// The engine stops when every handle is dropped.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
    max_payload: usize,
}

impl EngineHandle {
    /// Originate a message; the dedup gate applies
    ///
    /// A message whose envelope cannot fit one frame is rejected here,
    /// since every receiver would discard it during resync anyway.
    pub fn send_message(&self, message: Message) -> RumorResult<()> {
        self.check_size(&message)?;
        self.command(EngineCommand::SendMessage(message))
    }

    /// Send to every peer, each gated by the forward probability
    pub fn broadcast(&self, message: Message) -> RumorResult<()> {
        self.check_size(&message)?;
        self.command(EngineCommand::Broadcast(message))
    }

    /// Connect to seed peers, then request their peer lists
    pub fn bootstrap(&self, seeds: Vec<String>) -> RumorResult<()> {
        self.command(EngineCommand::Bootstrap(seeds))
    }

    /// Announce this node's interest categories to all peers
    pub fn declare_interests(&self, categories: Vec<String>) -> RumorResult<()> {
        self.command(EngineCommand::DeclareInterests(categories))
    }

    /// Accept inbound peers on the given address
    ///
    /// Returns the bound address; bind to port 0 to pick a free one.
    pub async fn listen(&self, addr: impl Into<String>) -> RumorResult<SocketAddr> {
        let (tx, rx) = oneshot::channel();
        self.command(EngineCommand::Listen(addr.into(), tx))?;
        rx.await
            .map_err(|_| RumorError::ChannelClosed("listen reply"))?
    }

    /// Snapshot the engine counters
    pub async fn stats(&self) -> RumorResult<EngineStats> {
        let (tx, rx) = oneshot::channel();
        self.command(EngineCommand::Stats(tx))?;
        rx.await.map_err(|_| RumorError::ChannelClosed("stats reply"))
    }

    fn check_size(&self, message: &Message) -> RumorResult<()> {
        let length = encode_message(message).len();
        if length > self.max_payload {
            return Err(RumorError::PayloadTooLarge {
                length,
                max: self.max_payload,
            });
        }
        Ok(())
    }

    fn command(&self, command: EngineCommand) -> RumorResult<()> {
        self.cmd_tx
            .send(command)
            .map_err(|_| RumorError::ChannelClosed("engine command"))
    }
}

/// The dissemination engine actor
pub struct Engine {
    config: EngineConfig,
    registry: PeerRegistry,
    seen: BloomFilter,
    routing: RoutingTable,
    policy: FloodPolicy,
    rng: StdRng,
    stats: EngineStats,
    // Weak so the actor exits once every handle is gone
    cmd_tx: mpsc::WeakUnboundedSender<EngineCommand>,
    link_tx: LinkEventSender,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
}

impl Engine {
    /// Start an engine actor; returns its handle and event stream
    pub fn spawn(config: EngineConfig) -> (EngineHandle, EngineEventReceiver) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (link_tx, link_rx) = link_event_channel();

        let max_payload = config.max_payload;
        let engine = Engine::new(config, cmd_tx.downgrade(), link_tx, event_tx);
        tokio::spawn(engine.run(cmd_rx, link_rx));

        (EngineHandle { cmd_tx, max_payload }, event_rx)
    }

    fn new(
        config: EngineConfig,
        cmd_tx: mpsc::WeakUnboundedSender<EngineCommand>,
        link_tx: LinkEventSender,
        event_tx: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        let mut config = config;
        if config.estimated_network_size < 2 {
            warn!(
                size = config.estimated_network_size,
                "estimated network size below 2, clamping"
            );
            config.estimated_network_size = 2;
        }

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Engine {
            registry: PeerRegistry::new(),
            seen: BloomFilter::new(config.estimated_network_size, config.bloom_hash_count),
            routing: RoutingTable::new(),
            policy: FloodPolicy::new(config.estimated_network_size, config.forward_budget),
            rng,
            stats: EngineStats::default(),
            config,
            cmd_tx,
            link_tx,
            event_tx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<EngineCommand>,
        mut links: LinkEventReceiver,
    ) {
        let mut refresh = time::interval_at(
            Instant::now() + self.config.refresh_interval,
            self.config.refresh_interval,
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!("all handles dropped, engine stopping");
                        break;
                    }
                },
                event = links.recv() => if let Some(event) = event {
                    self.handle_link_event(event);
                },
                _ = refresh.tick() => self.refresh_peer_list(),
            }
        }
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::SendMessage(message) => self.send_message(message),
            EngineCommand::Broadcast(message) => self.broadcast(&message),
            EngineCommand::Bootstrap(seeds) => self.bootstrap(seeds),
            EngineCommand::DeclareInterests(categories) => {
                let message =
                    Message::control(format!("{INTERESTS_PREFIX} {}", categories.join(",")));
                self.broadcast(&message);
            }
            EngineCommand::Listen(addr, reply) => {
                let result = spawn_listener(&addr, self.link_tx.clone()).await;
                let _ = reply.send(result);
            }
            EngineCommand::Stats(reply) => {
                let _ = reply.send(self.stats.clone());
            }
        }
    }

    fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected { peer } => {
                info!(peer = %peer, "peer connected");
            }
            LinkEvent::ConnectFailed { peer } => {
                self.stats.connect_failures += 1;
                debug!(peer = %peer, "peer unreachable, entry kept");
            }
            LinkEvent::Inbound { peer, message } => self.handle_incoming(peer, message),
            LinkEvent::Closed { peer } => {
                debug!(peer = %peer, "link closed, entry kept");
            }
            LinkEvent::Accepted { stream, addr } => {
                let id = self.registry.allocate();
                let link =
                    PeerLink::from_stream(id, addr.clone(), stream, self.link_tx.clone(), self.config.max_payload);
                self.registry.insert(PeerEntry {
                    link,
                    outbound: false,
                });
                self.stats.peers_added += 1;
                info!(peer = %id, addr = %addr, "inbound peer registered");
            }
        }
    }

    /// Connect to each seed now, ask for their peers after the grace delay
    fn bootstrap(&mut self, seeds: Vec<String>) {
        for addr in seeds {
            self.connect_peer(addr);
        }

        let cmd_tx = self.cmd_tx.clone();
        let grace = self.config.bootstrap_grace;
        tokio::spawn(async move {
            time::sleep(grace).await;
            if let Some(tx) = cmd_tx.upgrade() {
                let _ = tx.send(EngineCommand::Broadcast(Message::control(REQUEST_PEERS)));
            }
        });
    }

    /// Origination path: dedup gate, then forward
    fn send_message(&mut self, message: Message) {
        if self.seen.probably_contains(&message.id) {
            debug!(id = %message.id, "already seen, not forwarding");
            self.stats.duplicates_dropped += 1;
            return;
        }
        self.seen.add(&message.id);
        self.stats.originated += 1;
        self.forward(&message);
    }

    fn handle_incoming(&mut self, from: PeerId, message: Message) {
        if message.is_acknowledgment {
            debug!(peer = %from, "acknowledgment received");
            self.stats.acks_received += 1;
            let _ = self.event_tx.send(EngineEvent::AckReceived { peer: from });
            return;
        }

        if message.id.is_empty() {
            self.handle_control(from, &message);
            return;
        }

        if message.content.is_empty() {
            debug!(id = %message.id, "empty message, ignoring");
            return;
        }

        if self.seen.probably_contains(&message.id) {
            debug!(id = %message.id, "already seen, not processing");
            self.stats.duplicates_dropped += 1;
            return;
        }
        self.seen.add(&message.id);

        debug!(id = %message.id, group = %message.group_id, "processing message");
        self.forward(&message);
        self.acknowledge(&message);
        self.stats.delivered += 1;
        let _ = self.event_tx.send(EngineEvent::Delivered {
            peer: from,
            message,
        });
    }

    fn handle_control(&mut self, from: PeerId, message: &Message) {
        debug!(peer = %from, content = %message.content, "control message");
        self.stats.control_handled += 1;

        if let Some(csv) = message.content.strip_prefix(PEER_LIST_PREFIX) {
            self.update_peer_list(csv.trim());
        } else if message.content == REQUEST_PEERS {
            self.send_peer_list();
        } else if let Some(csv) = message.content.strip_prefix(INTERESTS_PREFIX) {
            self.update_interests(from, csv.trim());
        }
    }

    /// Topic delivery when the group is routed, probabilistic flood otherwise
    fn forward(&mut self, message: &Message) {
        let routed = self.routing.peers_for_category(&message.group_id).to_vec();
        if !routed.is_empty() {
            for id in routed {
                if let Some(entry) = self.registry.get(id) {
                    entry.link.send(message.clone());
                    self.stats.forwarded += 1;
                }
            }
            return;
        }

        let radius = self.policy.flood_radius();
        let targets: Vec<PeerId> = self.registry.ids().take(radius).collect();
        for id in targets {
            if self.policy.should_forward(&mut self.rng) {
                if let Some(entry) = self.registry.get(id) {
                    entry.link.send(message.clone());
                    self.stats.forwarded += 1;
                }
            }
        }
    }

    /// Every peer, each send gated by the forward probability
    fn broadcast(&mut self, message: &Message) {
        for entry in self.registry.iter() {
            if self.policy.should_forward(&mut self.rng) {
                entry.link.send(message.clone());
            }
        }
    }

    /// Unicast an ack to the peer whose address is the sender id
    fn acknowledge(&mut self, message: &Message) {
        if let Some(entry) = self.registry.find_by_addr(&message.sender_id) {
            entry.link.send(Message::acknowledgment());
            self.stats.acks_sent += 1;
            debug!(sender = %message.sender_id, "acknowledgment sent");
        }
    }

    /// Merge a peer-list CSV, dialing addresses we do not already hold
    fn update_peer_list(&mut self, csv: &str) {
        let mut added = 0usize;
        for addr in csv.split(',') {
            if addr.is_empty() || self.registry.contains_addr(addr) {
                continue;
            }
            self.connect_peer(addr.to_string());
            added += 1;
        }
        if added > 0 {
            info!(added, "merged peer list");
        }
    }

    /// Advertise dialable peer addresses as a PeerList control message
    ///
    /// Goes through the origination path, so the dedup filter applies
    /// to the shared empty control id.
    fn send_peer_list(&mut self) {
        let addresses = self.registry.dialable_addresses().join(",");
        let message = Message::control(format!("{PEER_LIST_PREFIX} {addresses}"));
        self.send_message(message);
        debug!("peer list sent");
    }

    /// Full-replace the announcing peer's interest categories
    fn update_interests(&mut self, from: PeerId, csv: &str) {
        let categories: Vec<&str> = csv
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        self.routing.update_peer_interests(from, &categories);
        debug!(peer = %from, ?categories, "peer interests updated");
    }

    fn refresh_peer_list(&mut self) {
        debug!("periodic peer refresh");
        self.broadcast(&Message::control(REQUEST_PEERS));
    }

    fn connect_peer(&mut self, addr: String) {
        let id = self.registry.allocate();
        let link = PeerLink::connect(id, addr.clone(), self.link_tx.clone(), self.config.max_payload);
        self.registry.insert(PeerEntry {
            link,
            outbound: true,
        });
        self.stats.peers_added += 1;
        info!(peer = %id, addr = %addr, "outbound peer registered");
    }
}
