//! TCP server for remote parameter writes.
//!
//! Each connection carries newline-delimited JSON: one
//! [`RemoteRequest`] per line in, one [`RemoteResponse`] per line out.
//! Requests go through [`Hub::handle_remote`], so remote writes take the
//! same lock as the keypad and monitors.
//!
//! # Example Usage
//!
//! ```no_run
//! use homeguard_network::{RemoteServer, RemoteServerConfig};
//! # use homeguard_controller::Hub;
//! # use homeguard_hardware::mock::SimulatedIndicator;
//!
//! # async fn example(hub: Hub<SimulatedIndicator>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = RemoteServerConfig {
//!     bind_addr: "127.0.0.1:4100".parse()?,
//!     max_connections: 8,
//! };
//!
//! let server = RemoteServer::bind(config, hub).await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! There is no authentication or TLS; bind to a trusted interface.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::{SinkExt, StreamExt};
use homeguard_controller::Hub;
use homeguard_hardware::Indicator;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info, warn};

use crate::error::{RemoteError, Result};
use crate::protocol::{RemoteRequest, RemoteResponse};

/// Longest accepted request line, in bytes.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Configuration for the remote server
#[derive(Debug, Clone)]
pub struct RemoteServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Maximum number of simultaneous connections
    pub max_connections: usize,
}

impl Default for RemoteServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 4100)),
            max_connections: 8,
        }
    }
}

/// Remote command server.
pub struct RemoteServer<I> {
    listener: TcpListener,
    hub: Hub<I>,
    config: RemoteServerConfig,
    active: Arc<AtomicUsize>,
}

impl<I: Indicator> RemoteServer<I> {
    /// Bind the server to the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::BindFailed`] if the address is unavailable.
    pub async fn bind(config: RemoteServerConfig, hub: Hub<I>) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|_| RemoteError::BindFailed(config.bind_addr))?;

        info!(
            "Remote server listening on {} (max {} connections)",
            listener.local_addr()?,
            config.max_connections
        );

        Ok(Self {
            listener,
            hub,
            config,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of open connections.
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Accept connections forever, one task per connection.
    ///
    /// # Errors
    ///
    /// Returns an error only if the listening socket fails.
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;

            if self.active.load(Ordering::Acquire) >= self.config.max_connections {
                warn!(
                    addr = %addr,
                    max_connections = self.config.max_connections,
                    "Connection rejected: maximum connections reached"
                );
                drop(stream);
                continue;
            }

            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }

            let hub = self.hub.clone();
            let guard = ConnectionGuard::new(Arc::clone(&self.active));
            tokio::spawn(async move {
                let _guard = guard;
                info!("Remote client connected from {}", addr);
                match serve_connection(stream, &hub).await {
                    Ok(()) => info!("Remote client {} disconnected", addr),
                    Err(e) => error!(addr = %addr, error = %e, "Remote connection failed"),
                }
            });
        }
    }
}

/// Counts a connection for as long as it lives.
struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn serve_connection<I: Indicator>(stream: TcpStream, hub: &Hub<I>) -> Result<()> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    while let Some(line) = framed.next().await {
        let line = line.map_err(|e| RemoteError::Codec(e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(hub, &line).await;
        let encoded = serde_json::to_string(&response)?;
        framed
            .send(encoded)
            .await
            .map_err(|e| RemoteError::Codec(e.to_string()))?;
    }
    Ok(())
}

/// Decode and apply one request line.
pub async fn handle_line<I: Indicator>(hub: &Hub<I>, line: &str) -> RemoteResponse {
    let request: RemoteRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Malformed remote request");
            return RemoteResponse::error(RemoteError::from(e).to_string());
        }
    };

    match hub
        .handle_remote(&request.device, &request.param, request.value)
        .await
    {
        Ok(value) => RemoteResponse::ack(value),
        Err(e) => {
            warn!(device = %request.device, param = %request.param, error = %e, "Remote write rejected");
            RemoteResponse::error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeguard_controller::RecordingSink;
    use homeguard_core::ParamValue;
    use homeguard_hardware::mock::RecordingIndicator;
    use homeguard_storage::MemorySettingsStore;
    use rstest::rstest;

    async fn hub() -> Hub<RecordingIndicator> {
        let sink = RecordingSink::new();
        let (hub, _relay) = Hub::open(
            RecordingIndicator::new(),
            Arc::new(sink.clone()),
            Arc::new(sink),
            MemorySettingsStore::new().into(),
        )
        .await;
        hub
    }

    #[rstest]
    #[case(r#"{"device":"TV","param":"Power","value":true}"#, true, Some(ParamValue::Bool(true)))]
    #[case(r#"{"device":"Fan","param":"Speed","value":2}"#, true, Some(ParamValue::Int(2)))]
    #[case(r#"{"device":"Fan","param":"Speed","value":7}"#, false, None)]
    #[case(r#"{"device":"Home","param":"Fan Status","value":"x"}"#, true, Some(ParamValue::from("x")))]
    #[case(r#"not json"#, false, None)]
    #[case(r#"{"device":"Fan"}"#, false, None)]
    #[tokio::test]
    async fn test_handle_line(
        #[case] line: &str,
        #[case] ok: bool,
        #[case] value: Option<ParamValue>,
    ) {
        let hub = hub().await;
        let response = handle_line(&hub, line).await;
        assert_eq!(response.ok, ok);
        assert_eq!(response.value, value);
        assert_eq!(response.error.is_some(), !ok);
    }

    #[test]
    fn test_connection_guard_counts() {
        let counter = Arc::new(AtomicUsize::new(0));
        let first = ConnectionGuard::new(Arc::clone(&counter));
        let second = ConnectionGuard::new(Arc::clone(&counter));
        assert_eq!(counter.load(Ordering::Acquire), 2);
        drop(first);
        drop(second);
        assert_eq!(counter.load(Ordering::Acquire), 0);
    }
}
