//! TCP link to a game server: one writer thread draining outgoing requests
//! and one reader thread applying responses to the game.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::{Arc, mpsc};
use std::thread;

use mural_core::protocol::{Request, Response};

use super::Game;

pub enum NetworkCommand {
    Send(Request),
    Shutdown,
}

/// Sending half of a server connection.
#[derive(Clone)]
pub struct ServerLink {
    command_tx: mpsc::Sender<NetworkCommand>,
}

impl ServerLink {
    pub fn new(command_tx: mpsc::Sender<NetworkCommand>) -> Self {
        Self { command_tx }
    }

    /// Queues a request for the writer thread. Returns `false` once the
    /// writer is gone.
    pub fn send(&self, request: Request) -> bool {
        self.command_tx.send(NetworkCommand::Send(request)).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.command_tx.send(NetworkCommand::Shutdown);
    }
}

fn write_loop(mut stream: TcpStream, command_rx: mpsc::Receiver<NetworkCommand>) {
    log::debug!("Server writer started");
    for command in command_rx {
        match command {
            NetworkCommand::Send(request) => {
                let line = match request.to_line() {
                    Ok(line) => line,
                    Err(err) => {
                        log::error!("Failed to encode request: {err}");
                        continue;
                    }
                };
                if let Err(err) = stream.write_all(line.as_bytes()) {
                    log::error!("Send failed: {err}");
                    return;
                }
            }
            NetworkCommand::Shutdown => {
                let _ = stream.shutdown(std::net::Shutdown::Both);
                log::info!("Disconnected from server");
                return;
            }
        }
    }
}

fn read_loop(stream: TcpStream, game: Arc<Game>) {
    log::debug!("Server reader started");
    for line in BufReader::new(stream).lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::error!("Read failed: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match Response::from_line(&line) {
            Ok(response) if response.is_empty() => {
                log::debug!("Ignoring server message without known variants");
            }
            Ok(response) => game.handle_response(response),
            Err(err) => log::error!("Invalid server message: {err}"),
        }
    }
    game.server_lost();
}

/// Connects to `address` (`host:port`) and starts the link threads.
pub fn connect(address: &str, game: Arc<Game>) -> Result<ServerLink, String> {
    let stream =
        TcpStream::connect(address).map_err(|e| format!("Connect to {address} failed: {e}"))?;
    let reader = stream
        .try_clone()
        .map_err(|e| format!("Failed to clone server stream: {e}"))?;
    let (command_tx, command_rx) = mpsc::channel();

    thread::Builder::new()
        .name("server-writer".into())
        .spawn(move || write_loop(stream, command_rx))
        .map_err(|e| format!("Failed to start server writer: {e}"))?;
    thread::Builder::new()
        .name("server-reader".into())
        .spawn(move || read_loop(reader, game))
        .map_err(|e| format!("Failed to start server reader: {e}"))?;

    log::info!("Connected to server {address}");
    Ok(ServerLink::new(command_tx))
}
