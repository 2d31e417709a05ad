use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::Context;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, error, warn};

use crate::config::{AcceptErrorPolicy, Timeouts};
use crate::server::Server;

/// Creates a listening socket with `SO_REUSEADDR` set.
pub fn bind(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    Ok(socket.into())
}

/// Accepts connections forever, one detached thread per connection.
///
/// Only returns on an accept or spawn failure under the fatal policy.
pub fn serve(listener: TcpListener, server: Arc<Server>) -> anyhow::Result<()> {
    let cfg = server.config().clone();
    let live = Arc::new(AtomicUsize::new(0));

    loop {
        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) => {
                on_accept_error(cfg.accept_errors, e, "accept() failed")?;
                continue;
            }
        };
        debug!(%peer, "connection accepted");

        let Some(guard) = ConnectionGuard::acquire(&live, cfg.limits.max_connections) else {
            warn!(%peer, limit = ?cfg.limits.max_connections, "connection limit reached, closing");
            continue;
        };

        if let Err(e) = apply_timeouts(&stream, &cfg.timeouts) {
            warn!(%peer, error = %e, "failed to set socket timeouts");
            continue;
        }

        let server = Arc::clone(&server);
        let spawned = thread::Builder::new()
            .name(format!("conn-{peer}"))
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = server.handle_connection(stream) {
                    warn!(%peer, "connection error: {:#}", e);
                }
            });

        // The JoinHandle is dropped: connection threads are never joined.
        if let Err(e) = spawned {
            on_accept_error(cfg.accept_errors, e, "failed to spawn connection thread")?;
        }
    }
}

fn on_accept_error(
    policy: AcceptErrorPolicy,
    e: io::Error,
    what: &'static str,
) -> anyhow::Result<()> {
    match policy {
        AcceptErrorPolicy::Fatal => {
            error!(error = %e, "{}", what);
            Err(e).context(what)
        }
        AcceptErrorPolicy::Continue => {
            warn!(error = %e, "{}, continuing", what);
            Ok(())
        }
    }
}

fn apply_timeouts(stream: &TcpStream, timeouts: &Timeouts) -> io::Result<()> {
    stream.set_read_timeout(timeouts.read())?;
    stream.set_write_timeout(timeouts.write())?;
    Ok(())
}

/// Counts a live connection for as long as it is held.
struct ConnectionGuard {
    live: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    fn acquire(live: &Arc<AtomicUsize>, limit: Option<usize>) -> Option<Self> {
        let previous = live.fetch_add(1, Ordering::AcqRel);
        if limit.is_some_and(|limit| previous >= limit) {
            live.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(Self {
            live: Arc::clone(live),
        })
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}
