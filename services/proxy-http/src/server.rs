use crate::config::ProxyConfig;
use crate::proxy::handler::ProxyHandler;
use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub struct ProxyServer {
    config: ProxyConfig,
    handler: Arc<ProxyHandler>,
}

impl ProxyServer {
    /// Create a new proxy server
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let handler = Arc::new(ProxyHandler::new(&config)?);

        Ok(Self { config, handler })
    }

    /// Run the accept loop on the calling task until the process exits.
    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, std::future::pending()).await
    }

    /// Bind, then run the accept loop on a spawned task.
    pub async fn start(self) -> Result<RunningServer> {
        let listener = self.bind().await?;
        let local_addr = listener
            .local_addr()
            .context("Listener has no local address")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(self.serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        Ok(RunningServer {
            local_addr,
            shutdown_tx,
            handle,
        })
    }

    async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = self
            .config
            .listen_addr()
            .parse()
            .context("Invalid listen address")?;

        TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind to {}", addr))
    }

    async fn serve<S>(self, listener: TcpListener, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Proxy server listening on {} (downstream: {})",
            listener.local_addr()?,
            self.config.downstream_url
        );

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut shutdown => {
                    info!("Proxy server stopped accepting connections");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
            };

            let handler = Arc::clone(&self.handler);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(handler, stream, peer_addr).await {
                    error!("Connection error from {}: {}", peer_addr, e);
                }
            });
        }
    }
}

/// Serve one HTTP/1 connection. Dropping the connection drops any in-flight
/// request future, which aborts its downstream call and releases its tenant.
async fn handle_connection(
    handler: Arc<ProxyHandler>,
    stream: TcpStream,
    peer_addr: SocketAddr,
) -> Result<()> {
    debug!("Accepted connection from {}", peer_addr);

    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let handler = Arc::clone(&handler);
        async move { Ok::<_, Infallible>(handler.handle_request(req).await) }
    });

    http1::Builder::new()
        .serve_connection(io, service)
        .await
        .context("Failed to serve connection")?;

    Ok(())
}

/// Handle to a server started with [`ProxyServer::start`].
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<Result<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    pub async fn shutdown(self) -> Result<()> {
        info!("Proxy server shutting down gracefully");
        let _ = self.shutdown_tx.send(());
        self.handle.await.context("Proxy server task failed")?
    }
}
