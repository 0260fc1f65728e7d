//! MCP (Model Context Protocol) server implementation.
//!
//! Implements the JSON-RPC 2.0 protocol over stdio, exposing a Zotero
//! library as resources (collections, items, citations) and tools
//! (search, add, update, delete, ...) for AI agent integration.
//!
//! The loop is strictly sequential: one line is read, decoded,
//! dispatched and answered before the next line is read, so responses
//! come out in request order.

pub mod dispatch;
pub mod protocol;
pub mod resources;
pub mod template;
pub mod tools;

#[cfg(test)]
pub(crate) mod mock;

pub use dispatch::{Dispatcher, Method};
pub use protocol::{ContentItem, Request, Response, ResourceDescriptor, ToolDescriptor};
pub use resources::ResourceRegistry;
pub use template::UriTemplate;
pub use tools::{Tool, ToolRegistry};

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Serve requests from `reader` until EOF, writing one line per response.
pub async fn serve<R, W>(dispatcher: &Dispatcher, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(response) = dispatcher.handle_line(line).await {
            let json = serde_json::to_string(&response)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    tracing::info!("input closed, stopping");
    Ok(())
}

/// Run the MCP server over stdin/stdout.
pub async fn run_server(dispatcher: Dispatcher) -> io::Result<()> {
    serve(&dispatcher, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
