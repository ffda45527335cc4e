use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket, lookup_host};
use tracing::{Instrument, info};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionSettings};
use crate::server::dispatch::Dispatcher;
use crate::static_files::StaticFiles;

/// Pause after a failed accept, so descriptor exhaustion does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Owns the listening socket and feeds accepted connections to workers.
pub struct Server {
    listener: TcpListener,
    files: Arc<StaticFiles>,
    dispatcher: Dispatcher,
    settings: ConnectionSettings,
}

impl Server {
    /// Binds the configured address with a backlog equal to the worker count.
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let files = StaticFiles::new(&cfg.static_files.document_root, &cfg.server.server_name)?;

        let addr = lookup_host(cfg.listen_addr())
            .await
            .with_context(|| format!("failed to resolve {}", cfg.listen_addr()))?
            .next()
            .with_context(|| format!("no address for {}", cfg.listen_addr()))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket
            .bind(addr)
            .with_context(|| format!("failed to bind {}", addr))?;

        let backlog = u32::try_from(cfg.server.workers).unwrap_or(u32::MAX);
        let listener = socket.listen(backlog)?;

        Ok(Self {
            listener,
            files: Arc::new(files),
            dispatcher: Dispatcher::new(cfg.server.dispatch, cfg.server.workers),
            settings: cfg.connection_settings(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the task is dropped.
    pub async fn serve_forever(self) -> anyhow::Result<()> {
        info!(
            addr = %self.local_addr()?,
            root = %self.files.root().display(),
            server = self.files.server_name(),
            workers = ?self.dispatcher.capacity(),
            "Listening"
        );

        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            tracing::debug!(%peer, "Accepted connection");

            let conn = Connection::new(socket, self.files.clone(), self.settings);
            let span = tracing::info_span!("conn", %peer);
            let work = async move {
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error from {}: {:#}", peer, e);
                }
            }
            .instrument(span);

            if let Err(e) = self.dispatcher.dispatch(work) {
                tracing::warn!(%peer, error = %e, "Dropping connection");
            }
        }
    }
}

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    Server::bind(cfg).await?.serve_forever().await
}
