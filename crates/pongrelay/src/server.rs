//! `PongRelayServer` builder and accept loop.
//!
//! This is the entry point for running a relay. It ties the layers
//! together: transport → protocol → session → match, with the
//! leaderboard aggregator on the side.

use std::sync::Arc;

use pongrelay_leaderboard::{JsonFileStore, Leaderboard, LeaderboardHandle};
use pongrelay_match::{MatchConfig, MatchRegistry};
use pongrelay_protocol::{Codec, JsonCodec};
use pongrelay_session::{AlphanumericNames, Authenticator};
use pongrelay_transport::{TcpTransport, Transport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{PongRelayError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry lock is held only to assign or release a slot; rounds go
/// straight to each match's actor.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) registry: Mutex<MatchRegistry>,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) leaderboard: LeaderboardHandle,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a relay.
///
/// # Example
///
/// ```rust,ignore
/// use pongrelay::prelude::*;
///
/// let server = PongRelayServer::builder()
///     .bind("0.0.0.0:7777")
///     .match_config(MatchConfig { win_score: 7, ..MatchConfig::default() })
///     .build(AlphanumericNames)
///     .await?;
/// server.run().await
/// ```
pub struct PongRelayServerBuilder {
    config: ServerConfig,
    match_config: MatchConfig,
    leaderboard: Option<LeaderboardHandle>,
}

impl PongRelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            match_config: MatchConfig::default(),
            leaderboard: None,
        }
    }

    /// Sets the address to bind the server to. Overrides the address in
    /// any previously set [`ServerConfig`].
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the process configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the rules every match runs under.
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Uses an already running leaderboard instead of spawning one over
    /// `config.leaderboard_path`.
    pub fn leaderboard(mut self, handle: LeaderboardHandle) -> Self {
        self.leaderboard = Some(handle);
        self
    }

    /// Binds the listener and builds the server with the given name
    /// check. Messages are JSON.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<PongRelayServer<A, JsonCodec>, PongRelayError> {
        let transport = TcpTransport::bind(&self.config.bind_addr).await?;

        let leaderboard = match self.leaderboard {
            Some(handle) => handle,
            None => Leaderboard::spawn(JsonFileStore::new(
                self.config.leaderboard_path.clone(),
            )),
        };

        let state = Arc::new(ServerState {
            registry: Mutex::new(MatchRegistry::new(self.match_config)),
            auth,
            codec: JsonCodec,
            leaderboard,
            config: self.config,
        });

        Ok(PongRelayServer { transport, state })
    }
}

impl Default for PongRelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PongRelayServer<A: Authenticator, C: Codec> {
    transport: TcpTransport,
    state: Arc<ServerState<A, C>>,
}

impl PongRelayServer<AlphanumericNames, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> PongRelayServerBuilder {
        PongRelayServerBuilder::new()
    }
}

impl<A, C> PongRelayServer<A, C>
where
    A: Authenticator,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The leaderboard this server credits wins to.
    pub fn leaderboard(&self) -> &LeaderboardHandle {
        &self.state.leaderboard
    }

    /// Runs the accept loop.
    ///
    /// Each accepted connection gets its own handler task, which reads the
    /// player's name, takes a slot and plays the match out. Runs until the
    /// task is dropped.
    pub async fn run(mut self) -> Result<(), PongRelayError> {
        tracing::info!(
            addr = %self.state.config.bind_addr,
            "pongrelay server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
