//! Line-oriented TCP transport to the opponent.
//!
//! Each wire message travels as one `\n`-terminated line. The reader half
//! decodes lines and queues them into the session; the writer half drains
//! the session's outbound queue.

use caro_engine::{Input, Message, SessionHandle};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Waits for a single peer on `port`.
#[instrument]
pub async fn accept_peer(port: u16) -> std::io::Result<TcpStream> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Waiting for a peer");
    let (stream, peer) = listener.accept().await?;
    info!(%peer, "Peer connected");
    Ok(stream)
}

/// Connects to a hosting peer.
#[instrument]
pub async fn connect_peer(addr: &str) -> std::io::Result<TcpStream> {
    let stream = TcpStream::connect(addr).await?;
    info!(peer = %addr, "Connected to host");
    Ok(stream)
}

/// Feeds decoded lines from `reader` into the session until the peer
/// hangs up, then reports the disconnect.
///
/// Undecodable lines are logged and skipped.
pub async fn read_messages<R>(reader: R, handle: SessionHandle)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match Message::decode(&line) {
                Ok(message) => {
                    if handle.deliver(message).is_err() {
                        debug!("Session gone, stopping reader");
                        return;
                    }
                }
                Err(e) => warn!(error = %e, %line, "Dropping undecodable line"),
            },
            Ok(None) => {
                info!("Peer closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Read from peer failed");
                break;
            }
        }
    }
    let _ = handle.submit(Input::Disconnected);
}

/// Writes every outbound message as one line until the queue closes.
pub async fn write_messages<W>(mut outbound: mpsc::UnboundedReceiver<Message>, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let mut line = message.encode();
        line.push('\n');
        debug!(command = %message.command(), "Sending");
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!(error = %e, "Write to peer failed");
            return;
        }
        if let Err(e) = writer.flush().await {
            warn!(error = %e, "Flush to peer failed");
            return;
        }
    }
    let _ = writer.shutdown().await;
}
