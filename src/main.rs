//! helium
//!
//! A minimal X11 window manager. Every client gets a border decoration,
//! Mod4 plus a pointer button moves, resizes or closes it, and tags group
//! windows into virtual desktops.

mod x11_async;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use x11rb::rust_connection::RustConnection;

use helium::config::Config;
use helium::wm::events::WmEvent;
use helium::wm::{WindowManager, X11Transport};
use x11_async::X11EventStream;

type X11WindowManager<'t, 'c> = WindowManager<'t, X11Transport<'c, RustConnection>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "helium=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting helium");

    let config = Config::load().context("Failed to load configuration")?;

    let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
    let conn = Arc::new(conn);
    let transport =
        X11Transport::new(conn.as_ref(), screen_num).context("Failed to set up the screen")?;
    transport
        .become_wm()
        .context("Another window manager is already running")?;

    let mut wm = WindowManager::new(&transport, &config.window_manager);
    let existing = transport
        .existing_windows()
        .context("Failed to query existing windows")?;
    wm.adopt_existing(&existing);

    let events = X11EventStream::new(conn.clone())?;
    let result = run(&mut wm, &events).await;
    if let Err(e) = &result {
        error!("Event loop failed: {:#}", e);
    }

    wm.shutdown();
    if let Err(e) = events.flush() {
        warn!("Failed to flush on shutdown: {}", e);
    }
    result
}

async fn run(wm: &mut X11WindowManager<'_, '_>, events: &X11EventStream) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        // Round trips made while handling may queue more events, so drain
        // until the connection is empty.
        while let Some(event) = events.poll_next_event()? {
            let Some(event) = WmEvent::from_x11(&event) else {
                continue;
            };
            if let Err(e) = wm.handle_event(event) {
                warn!("Failed to handle {:?}: {}", event, e);
            }
        }
        events.flush()?;

        tokio::select! {
            _ = events.wait_readable() => {}
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
