//! X11 Async Event Stream
//!
//! Wakes the async main loop when the X socket becomes readable. A mio
//! poller on a blocking worker watches the file descriptor; queued events
//! are then drained with `poll_for_event` on the loop itself.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{oneshot, Notify};
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

const X11_TOKEN: mio::Token = mio::Token(0);

pub struct X11EventStream {
    conn: Arc<RustConnection>,
    readable: Arc<Notify>,
    /// Dropping this stops the poller
    _alive: oneshot::Receiver<()>,
}

impl X11EventStream {
    pub fn new(conn: Arc<RustConnection>) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let readable = Arc::new(Notify::new());
        let wake = readable.clone();
        let (alive_tx, alive_rx) = oneshot::channel::<()>();

        let mut poll = mio::Poll::new().context("Failed to create mio Poll")?;
        poll.registry()
            .register(&mut mio::unix::SourceFd(&fd), X11_TOKEN, mio::Interest::READABLE)
            .context("Failed to register X11 socket with mio")?;

        tokio::task::spawn_blocking(move || {
            let mut events = mio::Events::with_capacity(1);
            while !alive_tx.is_closed() {
                if let Err(e) = poll.poll(&mut events, Some(Duration::from_millis(100))) {
                    warn!("X11 socket poll failed: {}", e);
                    continue;
                }
                if events.iter().any(|event| event.token() == X11_TOKEN) {
                    wake.notify_one();
                }
            }
            debug!("X11 socket poller stopped");
        });

        Ok(Self {
            conn,
            readable,
            _alive: alive_rx,
        })
    }

    /// Next already-received event, without blocking.
    pub fn poll_next_event(&self) -> Result<Option<Event>> {
        Ok(self.conn.poll_for_event()?)
    }

    pub async fn wait_readable(&self) {
        self.readable.notified().await;
    }

    pub fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}
