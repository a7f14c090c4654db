//! Live reload over WebSocket.
//!
//! Every served HTML page gets a small script that opens a socket back to
//! the listener it came from. After a rebuild, `"reload"` is sent down each
//! open socket and the page refreshes itself.

use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use std::{
    io::{Read, Write},
    sync::Arc,
};
use tiny_http::{Header, ReadWrite, Request, Response, StatusCode};
use tungstenite::{Message, WebSocket, handshake::derive_accept_key, protocol::Role};

/// Message that tells a page to reload.
pub const RELOAD_MESSAGE: &str = "reload";

/// Insert the reload script before the first `</body>`, or append it.
pub fn inject_reload_script(html: &str, host: &str) -> String {
    let script = format!(
        "<script>if (window == window.top) (new WebSocket(\"ws://{host}\")).onmessage = e => \
         {{ if (e.data == \"{RELOAD_MESSAGE}\") location.reload(true) }};</script>\n</body>"
    );
    if html.contains("</body>") {
        html.replacen("</body>", &script, 1)
    } else {
        format!("{html}{script}")
    }
}

// ============================================================================
// Socket Set
// ============================================================================

/// Open reload sockets on one listener.
pub struct LiveSockets<S = Box<dyn ReadWrite + Send>> {
    sockets: Mutex<Vec<WebSocket<S>>>,
}

impl<S> Default for LiveSockets<S> {
    fn default() -> Self {
        Self {
            sockets: Mutex::new(Vec::new()),
        }
    }
}

impl<S: Read + Write> LiveSockets<S> {
    pub fn add(&self, socket: WebSocket<S>) {
        self.sockets.lock().push(socket);
    }

    /// Number of open sockets.
    #[cfg(test)]
    pub fn connected(&self) -> usize {
        self.sockets.lock().len()
    }

    /// Send `message` to every socket, dropping those that fail.
    ///
    /// Returns how many sockets received it.
    pub fn broadcast(&self, message: &str) -> usize {
        self.send_all(|| Message::text(message.to_owned()))
    }

    /// Write an unsolicited pong to every socket and drop the ones whose
    /// peer has gone away. Pages ignore it.
    ///
    /// A closed peer is detected on the second write after it hung up.
    pub fn heartbeat(&self) -> usize {
        self.send_all(|| Message::Pong(Default::default()))
    }

    fn send_all(&self, message: impl Fn() -> Message) -> usize {
        let mut sockets = self.sockets.lock();
        sockets.retain_mut(|socket| socket.send(message()).is_ok());
        sockets.len()
    }
}

impl LiveSockets {
    /// Complete a WebSocket upgrade and keep the socket.
    ///
    /// Requests without a `Sec-WebSocket-Key` get a 400.
    pub fn accept(&self, request: Request) -> Result<()> {
        let Some(key) = header_value(&request, "Sec-WebSocket-Key").map(str::to_owned) else {
            request.respond(Response::empty(StatusCode(400)))?;
            return Ok(());
        };

        let response = Response::empty(StatusCode(101))
            .with_header(header("Upgrade", "websocket")?)
            .with_header(header("Connection", "Upgrade")?)
            .with_header(header("Sec-WebSocket-Accept", &derive_accept_key(key.as_bytes()))?);

        let stream = request.upgrade("websocket", response);
        self.add(WebSocket::from_raw_socket(stream, Role::Server, None));
        Ok(())
    }
}

/// Whether `request` asks to switch to WebSocket.
pub fn is_upgrade(request: &Request) -> bool {
    header_value(request, "Upgrade").is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

pub fn header_value<'a>(request: &'a Request, name: &'static str) -> Option<&'a str> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str())
}

pub fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow!("Invalid header {name}: {value}"))
}

// ============================================================================
// Reloader
// ============================================================================

/// Cloneable handle that reloads every page connected to the server.
#[derive(Clone, Default)]
pub struct Reloader {
    listeners: Vec<Arc<LiveSockets>>,
}

impl Reloader {
    pub(super) fn new(listeners: Vec<Arc<LiveSockets>>) -> Self {
        Self { listeners }
    }

    /// Tell every connected page to reload. Returns how many were told.
    pub fn reload(&self) -> usize {
        self.listeners
            .iter()
            .map(|sockets| sockets.broadcast(RELOAD_MESSAGE))
            .sum()
    }
}
