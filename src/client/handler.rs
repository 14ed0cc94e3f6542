use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::auth::Authenticator;
use crate::client::Session;
use crate::protocol::responses::{self, format_response};
use crate::protocol::{CommandStatus, handle_command, parse_command};
use crate::service::CatalogService;

/// Reply sent before closing a session whose command task died.
fn task_failure_response() -> String {
    format_response(responses::INTERNAL_ERROR, "Internal error, closing")
}

/// Handles one client session using the Tokio async runtime.
///
/// - Uses BufReader to read command lines from the client.
/// - Runs each command on the blocking pool while holding the service lock,
///   so catalog mutations and their saves happen one at a time.
pub async fn handle_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    service: Arc<Mutex<CatalogService>>,
    auth: Arc<dyn Authenticator>,
    max_command_length: usize,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    let mut session = Session::new(client_addr);

    loop {
        line.clear();
        let limit = max_command_length as u64 + 1;
        let n = (&mut reader).take(limit).read_line(&mut line).await?;
        if n == 0 {
            info!("Connection closed by client {}", client_addr);
            break;
        }

        // The rest of an oversized line is still unread, so the stream
        // cannot be resynchronized.
        if line.len() > max_command_length {
            write_half
                .write_all(format_response(responses::UNKNOWN_COMMAND, "Command too long").as_bytes())
                .await?;
            break;
        }

        let command = parse_command(&line);
        info!("Received from {}: {}", client_addr, line.split_whitespace().next().unwrap_or(""));

        let service = Arc::clone(&service);
        let auth = Arc::clone(&auth);
        let outcome = tokio::task::spawn_blocking(move || {
            let mut service = service.blocking_lock();
            let result = handle_command(&mut service, &mut session, auth.as_ref(), &command);
            (session, result)
        })
        .await;

        let result = match outcome {
            Ok((returned, result)) => {
                session = returned;
                result
            }
            Err(e) => {
                error!("Command task for {} failed: {}", client_addr, e);
                write_half.write_all(task_failure_response().as_bytes()).await?;
                break;
            }
        };

        if let Some(msg) = &result.message {
            write_half.write_all(msg.as_bytes()).await?;
        }
        if result.status == CommandStatus::CloseConnection {
            info!("Client {} requested to quit", client_addr);
            break;
        }
    }

    write_half.flush().await?;
    Ok(())
}
