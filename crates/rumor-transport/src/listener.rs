//! Inbound connection listener

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};

use rumor_core::{RumorError, RumorResult};

use crate::link::{LinkEvent, LinkEventSender};

/// Bind a listener and surface accepted connections on the event channel.
///
/// Returns the bound address so callers can bind port 0 and learn the
/// assigned port. The accept loop runs until the event receiver drops.
pub async fn spawn_listener(addr: &str, events: LinkEventSender) -> RumorResult<SocketAddr> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| RumorError::Connection(format!("bind {addr}: {e}")))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| RumorError::Connection(e.to_string()))?;
    info!(%local_addr, "listening for peers");

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, remote)) => {
                    let event = LinkEvent::Accepted {
                        stream,
                        addr: remote.to_string(),
                    };
                    if events.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                }
            }
        }
    });

    Ok(local_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::link_event_channel;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_listener_binds_ephemeral_port() {
        let (tx, _rx) = link_event_channel();
        let addr = spawn_listener("127.0.0.1:0", tx).await.unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_listener_surfaces_accepted_connection() {
        let (tx, mut rx) = link_event_channel();
        let addr = spawn_listener("127.0.0.1:0", tx).await.unwrap();

        let client = TcpStream::connect(addr).await.unwrap();
        let local = client.local_addr().unwrap();

        match rx.recv().await {
            Some(LinkEvent::Accepted { addr, .. }) => assert_eq!(addr, local.to_string()),
            other => panic!("expected accepted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_listener_rejects_bad_address() {
        let (tx, _rx) = link_event_channel();
        let result = spawn_listener("not-an-address", tx).await;
        assert!(matches!(result, Err(RumorError::Connection(_))));
    }
}
