use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::auth::Authenticator;
use crate::client::{ClientRegistry, handle_client};
use crate::config::PortalConfig;
use crate::protocol::responses::{self, format_response};
use crate::service::CatalogService;

pub struct Server {
    client_registry: Arc<Mutex<ClientRegistry>>,
    service: Arc<Mutex<CatalogService>>,
    auth: Arc<dyn Authenticator>,
    listener: TcpListener,
    config: Arc<PortalConfig>,
}

impl Server {
    /// Bind the listener and prepare the uploads root.
    pub async fn bind(
        config: PortalConfig,
        service: CatalogService,
        auth: Arc<dyn Authenticator>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.socket_addr()).await.map_err(|e| {
            error!("Failed to bind to {}: {}", config.socket_addr(), e);
            e
        })?;
        info!("Server bound to {}", listener.local_addr()?);

        if let Err(e) = std::fs::create_dir_all(config.uploads_root()) {
            warn!("Failed to create uploads directory: {}", e);
        } else {
            info!("Uploads directory: {}", config.uploads_root().display());
        }

        Ok(Self {
            client_registry: Arc::new(Mutex::new(ClientRegistry::new(config.max_clients))),
            service: Arc::new(Mutex::new(service)),
            auth,
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        info!(
            "Starting StudyHub portal on {} (max {} clients)",
            self.config.socket_addr(),
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_registry = Arc::clone(&self.client_registry);
                    let service = Arc::clone(&self.service);
                    let auth = Arc::clone(&self.auth);
                    let max_command_length = self.config.max_command_length();

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) = handle_new_client(
                            stream,
                            addr,
                            client_registry,
                            service,
                            auth,
                            max_command_length,
                        )
                        .await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Handles a new client: enforces the connection limit, greets, and runs
/// the session until it ends.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    client_registry: Arc<Mutex<ClientRegistry>>,
    service: Arc<Mutex<CatalogService>>,
    auth: Arc<dyn Authenticator>,
    max_command_length: usize,
) -> std::io::Result<()> {
    {
        let mut clients = client_registry.lock().await;
        if !clients.try_register(client_addr) {
            stream
                .write_all(
                    format_response(
                        responses::TOO_MANY_CLIENTS,
                        "Too many connections. Try again later.",
                    )
                    .as_bytes(),
                )
                .await?;
            return Ok(());
        }
        info!(
            "Accepted client: {} ({}/{} clients)",
            client_addr,
            clients.len(),
            clients.max_clients()
        );
    }

    let mut greeting = String::new();
    if let Some(warning) = service.lock().await.startup_warning() {
        greeting.push_str(&format!("{}-{}\r\n", responses::READY, warning));
    }
    greeting.push_str(&format_response(responses::READY, "Welcome to StudyHub"));
    let greeted = stream.write_all(greeting.as_bytes()).await;

    let result = match greeted {
        Ok(()) => handle_client(stream, client_addr, service, auth, max_command_length).await,
        Err(e) => Err(e),
    };

    let mut clients = client_registry.lock().await;
    clients.remove(&client_addr);
    if clients.is_empty() {
        info!("All clients disconnected");
    }
    result
}
