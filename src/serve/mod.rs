//! Development server with live reload support.
//!
//! Serves the build output over plain HTTP on `localhost` and, when a LAN
//! address can be found, on that address as well. Each listener also
//! accepts WebSocket upgrades for the reload script injected into pages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  ┌──────────────────┐     ┌──────────────────┐
//! │  local listener  │  │ network listener │     │  Watcher Thread  │
//! │ localhost:3000   │  │ 192.168.x.y:3000 │     │  rebuild on save │
//! └────────┬─────────┘  └────────┬─────────┘     └────────┬─────────┘
//!          │ GET / upgrade       │                        │
//!          ▼                     ▼                        ▼
//!     handler::handle      LiveSockets ◄──── Reloader::reload()
//!          │                                    "reload"
//!          ▼
//!   config.build.output
//! ```
//!
//! Each listener loop only dispatches: file responses run on their own
//! thread so a slow client never holds up the next request. Between
//! requests the loop sends a heartbeat down the reload sockets, which is
//! how sockets of closed pages get dropped.
//!
//! The server blocks until [`ShutdownHandle::shutdown`] is called, which
//! `main` wires to Ctrl+C.

mod handler;
mod mime;
mod reload;

pub use reload::Reloader;

use crate::{
    config::ServeConfig,
    log,
    logger::{log_error, log_indented},
};
use anyhow::{Result, bail};
use colored::Colorize;
use handler::{RequestInfo, handle};
use reload::{LiveSockets, header, header_value, is_upgrade};
use std::{
    io,
    net::{IpAddr, Ipv4Addr, UdpSocket},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};
use tiny_http::{Request, Response, StatusCode};

/// Host name of the loopback listener.
const LOCAL_HOST: &str = "localhost";

/// How often reload sockets are checked for closed pages.
const HEARTBEAT: Duration = Duration::from_secs(1);

// ============================================================================
// Server
// ============================================================================

/// One bound listener and the reload sockets opened through it.
struct Binding {
    name: &'static str,
    url: String,
    http: Arc<tiny_http::Server>,
    sockets: Arc<LiveSockets>,
}

/// Bound, not yet serving.
pub struct Server {
    root: PathBuf,
    bindings: Vec<Binding>,
    stopped: Arc<AtomicBool>,
}

/// Stops a running [`Server`] from any thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    servers: Vec<Arc<tiny_http::Server>>,
    stopped: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        for server in &self.servers {
            server.unblock();
        }
    }
}

impl Server {
    /// Bind the local listener and, if enabled and detectable, the network
    /// one. Each starts at the configured port and moves up while taken.
    pub fn start(root: &Path, config: &ServeConfig) -> Result<Self> {
        let mut hosts = vec![("local", LOCAL_HOST.to_owned())];
        if config.network
            && let Some(ip) = network_ipv4()
        {
            hosts.push(("network", ip.to_string()));
        }
        Self::bind(root, &hosts, config.port)
    }

    fn bind(root: &Path, hosts: &[(&'static str, String)], port: u16) -> Result<Self> {
        let bindings: Vec<_> = hosts
            .iter()
            .filter_map(|(name, host)| Binding::bind(*name, host, port))
            .collect();

        if bindings.is_empty() {
            bail!("No listener could be started");
        }

        log!("serve"; "Serving {}", root.display());
        for binding in &bindings {
            log_indented(&format!("{}: {}", binding.name, binding.url.bright_cyan()));
        }

        Ok(Self {
            root: root.to_path_buf(),
            bindings,
            stopped: Arc::default(),
        })
    }

    /// Handle for telling connected pages to reload.
    pub fn reloader(&self) -> Reloader {
        Reloader::new(self.bindings.iter().map(|b| Arc::clone(&b.sockets)).collect())
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            servers: self.bindings.iter().map(|b| Arc::clone(&b.http)).collect(),
            stopped: Arc::clone(&self.stopped),
        }
    }

    /// Address of the first listener.
    #[cfg(test)]
    pub(crate) fn local_url(&self) -> &str {
        &self.bindings[0].url
    }

    /// Open reload sockets across all listeners.
    #[cfg(test)]
    pub(crate) fn connected(&self) -> usize {
        self.bindings.iter().map(|b| b.sockets.connected()).sum()
    }

    /// Serve every listener on its own thread until shut down.
    pub fn run(&self) {
        thread::scope(|scope| {
            for binding in &self.bindings {
                scope.spawn(|| binding.serve(&self.root, &self.stopped));
            }
        });
    }
}

impl Binding {
    /// Bind `host`, trying successive ports while the address is in use.
    /// Any other failure is logged and the listener is skipped.
    fn bind(name: &'static str, host: &str, port: u16) -> Option<Self> {
        let mut port = port;
        loop {
            match tiny_http::Server::http((host, port)) {
                Ok(http) => {
                    let port = http.server_addr().to_ip().map_or(port, |addr| addr.port());
                    return Some(Self {
                        name,
                        url: format!("http://{host}:{port}"),
                        http: Arc::new(http),
                        sockets: Arc::default(),
                    });
                }
                Err(err) if is_addr_in_use(err.as_ref()) && port < u16::MAX => port += 1,
                Err(err) => {
                    log_error(&format!("Unhandled server error on {name} {host}:{port}"), &err);
                    return None;
                }
            }
        }
    }

    /// Request loop; returns once `stopped` is set and the listener is
    /// unblocked.
    fn serve(&self, root: &Path, stopped: &AtomicBool) {
        let mut last_beat = Instant::now();
        while !stopped.load(Ordering::SeqCst) {
            match self.http.recv_timeout(HEARTBEAT) {
                Ok(Some(request)) if is_upgrade(&request) => {
                    if let Err(e) = self.sockets.accept(request) {
                        log!("serve"; "upgrade error: {e}");
                    }
                }
                Ok(Some(request)) => {
                    let root = root.to_path_buf();
                    thread::spawn(move || {
                        if let Err(e) = respond(&root, request) {
                            log!("serve"; "request error: {e}");
                        }
                    });
                }
                Ok(None) => {}
                Err(e) => log!("serve"; "listener error: {e}"),
            }

            if last_beat.elapsed() >= HEARTBEAT {
                self.sockets.heartbeat();
                last_beat = Instant::now();
            }
        }
    }
}

fn respond(root: &Path, request: Request) -> Result<()> {
    let reply = handle(
        root,
        &RequestInfo {
            url: request.url(),
            range: header_value(&request, "Range"),
            host: header_value(&request, "Host"),
        },
    );

    let headers = reply
        .headers
        .iter()
        .map(|(name, value)| header(name, value))
        .collect::<Result<Vec<_>>>()?;
    let (body, len) = reply.body.into_reader()?;

    let response = Response::new(StatusCode(reply.status), headers, body, Some(len), None);
    request.respond(response)?;
    Ok(())
}

fn is_addr_in_use(err: &(dyn std::error::Error + Send + Sync + 'static)) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::AddrInUse)
}

/// The IPv4 address this machine would use to reach the outside world.
///
/// Connecting a UDP socket only picks a route; nothing is sent.
fn network_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}
