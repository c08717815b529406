//! IPC client for sending commands to the daemon.

use crate::error::{Result, ShortsmithError};
use crate::ipc::protocol::{Command, Response};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Send a command to the daemon via Unix socket.
///
/// # Arguments
/// * `socket_path` - Path to the Unix socket
/// * `command` - Command to send
///
/// # Returns
/// Response from daemon or error
///
/// # Errors
/// Returns `ShortsmithError::IpcConnection` if connection fails
/// Returns `ShortsmithError::IpcProtocol` if serialization/deserialization fails
pub async fn send_command(socket_path: &Path, command: Command) -> Result<Response> {
    // Connect to daemon socket
    let stream =
        UnixStream::connect(socket_path)
            .await
            .map_err(|e| ShortsmithError::IpcConnection {
                message: format!("Failed to connect to daemon: {}", e),
            })?;

    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    // Serialize and send command
    let command_json = command.to_json().map_err(|e| ShortsmithError::IpcProtocol {
        message: format!("Failed to serialize command: {}", e),
    })?;

    writer
        .write_all(command_json.as_bytes())
        .await
        .map_err(|e| ShortsmithError::IpcConnection {
            message: format!("Failed to write command: {}", e),
        })?;

    writer
        .write_all(b"\n")
        .await
        .map_err(|e| ShortsmithError::IpcConnection {
            message: format!("Failed to write newline: {}", e),
        })?;

    writer
        .flush()
        .await
        .map_err(|e| ShortsmithError::IpcConnection {
            message: format!("Failed to flush writer: {}", e),
        })?;

    // Read response
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .await
        .map_err(|e| ShortsmithError::IpcConnection {
            message: format!("Failed to read response: {}", e),
        })?;

    // Deserialize response
    let response =
        Response::from_json(response_line.trim()).map_err(|e| ShortsmithError::IpcProtocol {
            message: format!("Failed to deserialize response: {}", e),
        })?;

    Ok(response)
}
