//! floatwm: a minimal floating X11 window manager with a taskbar.

mod config;
mod error;
mod logging;
mod shared;
mod shell;
mod wm;
mod x11_async;

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::WmError;
use crate::wm::x11::X11Display;
use crate::wm::{Flow, WindowManager};
use crate::x11_async::X11EventStream;

/// Dispatch every handled event x11rb has already read. Returns `Flow::Quit` as soon
/// as a handler asks for it.
fn drain_events(wm: &mut WindowManager<X11Display>, stream: &X11EventStream) -> Result<Flow> {
    while let Some(event) = stream.poll_next_event()? {
        if wm.dispatch(event)? == Flow::Quit {
            return Ok(Flow::Quit);
        }
    }
    Ok(Flow::Continue)
}

async fn run(mut wm: WindowManager<X11Display>, stream: X11EventStream) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    info!("Starting main event loop");
    loop {
        // Replies read while handling the last batch may have queued events
        // that never show up as socket readiness.
        if drain_events(&mut wm, &stream)? == Flow::Quit {
            info!("Exiting on user request");
            return Ok(());
        }
        if let Err(e) = stream.flush() {
            if e.is_fatal() {
                return Err(e).context("X11 connection lost");
            }
            warn!("Failed to flush X11 requests: {}", e);
        }

        tokio::select! {
            () = stream.wait_readable() => debug!("X11 socket readable"),
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
                return Ok(());
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(Config::config_dir().ok().as_deref())?;
    info!("Starting floatwm");

    let config = Config::load().context("Failed to load configuration")?;

    let display = match X11Display::connect() {
        Ok(display) => display,
        Err(WmError::AccessDenied) => {
            error!("Another window manager is already running on this display");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to open X11 display"),
    };
    let stream = X11EventStream::new(display.connection())?;

    let mut wm = WindowManager::new(display, &config).context("Failed to set up window manager")?;
    wm.adopt_existing_windows().context("Failed to adopt existing windows")?;
    wm.redraw_taskbar()?;

    if let Err(e) = run(wm, stream).await {
        error!("Window manager stopped: {:#}", e);
        return Err(e);
    }
    info!("floatwm exited cleanly");
    Ok(())
}
