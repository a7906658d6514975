//! X11 Async Event Stream
//!
//! Readiness of the X11 socket is detected by mio on a blocking worker and
//! forwarded to the main loop through a `Notify`. Events are read, translated
//! into `WmEvent`s and handled on the main task only.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{Notify, oneshot};
use x11rb::connection::Connection;
use x11rb::rust_connection::RustConnection;

use crate::error::WmResult;
use crate::wm::events::WmEvent;

const X11_TOKEN: mio::Token = mio::Token(0);

/// How often the poller checks whether the stream was dropped
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub struct X11EventStream {
    conn: Arc<RustConnection>,
    readable: Arc<Notify>,
    /// Dropping this stops the poller
    _alive: oneshot::Receiver<()>,
}

/// Body of the poller: wake `readable` whenever the socket has data, until
/// the receiving half of `alive` is dropped.
fn watch_socket(mut poll: mio::Poll, readable: Arc<Notify>, alive: oneshot::Sender<()>) {
    let mut events = mio::Events::with_capacity(1);
    while !alive.is_closed() {
        if let Err(e) = poll.poll(&mut events, Some(POLL_TIMEOUT)) {
            tracing::warn!("X11 socket poll failed: {}", e);
            continue;
        }
        if events.iter().any(|event| event.token() == X11_TOKEN) {
            readable.notify_one();
        }
    }
    tracing::debug!("X11 socket poller stopping");
}

impl X11EventStream {
    /// Start watching the connection's socket.
    pub fn new(conn: Arc<RustConnection>) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let poll = mio::Poll::new().context("Failed to create mio Poll")?;
        poll.registry()
            .register(&mut mio::unix::SourceFd(&fd), X11_TOKEN, mio::Interest::READABLE)
            .context("Failed to register X11 socket with mio")?;

        let readable = Arc::new(Notify::new());
        let (alive_tx, alive_rx) = oneshot::channel::<()>();
        let notifier = readable.clone();
        tokio::task::spawn_blocking(move || watch_socket(poll, notifier, alive_tx));

        Ok(Self {
            conn,
            readable,
            _alive: alive_rx,
        })
    }

    /// Next already-received event the window manager handles, without
    /// blocking. Event kinds it does not handle are skipped.
    pub fn poll_next_event(&self) -> WmResult<Option<WmEvent>> {
        while let Some(event) = self.conn.poll_for_event()? {
            if let Some(event) = WmEvent::from_x11(&event) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    /// Resolves once the socket has data to read.
    pub async fn wait_readable(&self) {
        self.readable.notified().await;
    }

    /// Send all queued requests.
    pub fn flush(&self) -> WmResult<()> {
        self.conn.flush()?;
        Ok(())
    }
}
