//! Transport Module
//!
//! The requests a [`Client`](crate::wm::client::Client) issues against the
//! windowing system. Requests are fire-and-forget: the transport buffers them
//! in issue order and `flush` hands the batch to the server, so the client
//! and decoration updates of one operation always leave together.

use x11rb::protocol::xproto::Window;

use crate::shared::{Edge, Geometry};
use crate::wm::error::Result;

/// Pointer shape shown while a drag holds the pointer grab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragCursor {
    Move,
    Resize(Edge),
}

pub trait Transport {
    /// Root window decorations are created on
    fn root(&self) -> Window;

    fn configure(&self, window: Window, geometry: Geometry) -> Result<()>;

    fn map(&self, window: Window) -> Result<()>;

    fn unmap(&self, window: Window) -> Result<()>;

    /// Create an unmapped, override-redirect decoration surface.
    fn create_decoration(&self, parent: Window, geometry: Geometry, color: u32) -> Result<Window>;

    /// Restack `window` directly below its sibling `sibling`.
    fn stack_below(&self, window: Window, sibling: Window) -> Result<()>;

    fn raise(&self, window: Window) -> Result<()>;

    fn destroy(&self, window: Window) -> Result<()>;

    /// Repaint a decoration surface in `color`.
    fn set_border_color(&self, decoration: Window, color: u32) -> Result<()>;

    fn set_input_focus(&self, window: Window) -> Result<()>;

    /// Publish `_NET_ACTIVE_WINDOW` on the root. `NONE` clears it.
    fn set_active_window(&self, window: Window) -> Result<()>;

    /// Ask the application to close its window (ICCCM `WM_DELETE_WINDOW`).
    fn request_close(&self, window: Window) -> Result<()>;

    /// Terminate the application owning `window` outright.
    fn kill_client(&self, window: Window) -> Result<()>;

    /// Install the modifier+button grabs the event loop drags windows with.
    fn grab_buttons(&self, window: Window) -> Result<()>;

    /// Take the pointer for a drag, reporting motion and release on the root.
    fn grab_pointer(&self, cursor: DragCursor) -> Result<()>;

    fn ungrab_pointer(&self) -> Result<()>;

    /// Hold off other clients while a window is being taken over.
    fn grab_server(&self) -> Result<()>;

    fn ungrab_server(&self) -> Result<()>;

    fn flush(&self) -> Result<()>;

    // Round-trip queries. Only the manager uses these, never a Client
    // operation.

    fn window_geometry(&self, window: Window) -> Result<Geometry>;

    fn is_override_redirect(&self, window: Window) -> Result<bool>;
}
