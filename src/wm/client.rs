use std::fmt;

use tracing::{debug, info};
use x11rb::protocol::xproto::Window;
use x11rb::NONE;

use crate::shared::{Edge, Geometry};
use crate::wm::client_flags::ClientFlags;
use crate::wm::decorations::DecorationStyle;
use crate::wm::error::Result;
use crate::wm::transport::Transport;

/// Tag value of a client that belongs to no workspace
pub const UNTAGGED: u32 = 0;

/// Geometry captured when a pointer resize starts
#[derive(Debug, Clone, Copy)]
struct ResizeAnchor {
    start_x: i32,
    start_y: i32,
    geometry: Geometry,
}

/// Window manager client state
///
/// One managed top-level window: the application window, the decoration
/// surface wrapping it, its geometry, tag and focus state. Every geometry
/// change is pushed to the client window and its decoration in one batch so
/// the two never disagree on screen.
///
/// The transport is borrowed. The application owns its window; the client
/// only owns the decoration.
pub struct Client<'t, T: ?Sized> {
    window: Window,
    decoration: Option<Window>,
    geometry: Geometry,
    tag: u32,
    flags: ClientFlags,
    style: DecorationStyle,
    anchor: Option<ResizeAnchor>,
    /// Unmaps we caused ourselves and still expect an UnmapNotify for
    pending_unmaps: u32,
    transport: &'t T,
}

impl<'t, T: Transport + ?Sized> Client<'t, T> {
    /// Bind a client to `window`. Nothing is mapped, decorated or moved yet.
    ///
    /// # Panics
    ///
    /// If `window` is the null window.
    pub fn new(window: Window, transport: &'t T) -> Self {
        assert_ne!(window, NONE, "cannot manage the null window");
        Self {
            window,
            decoration: None,
            geometry: Geometry::default(),
            tag: UNTAGGED,
            flags: ClientFlags::default(),
            style: DecorationStyle::default(),
            anchor: None,
            pending_unmaps: 0,
            transport,
        }
    }

    /// Record the geometry the server reports for the window. No request is issued.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_style(mut self, style: DecorationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn decoration(&self) -> Option<Window> {
        self.decoration
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Where the decoration sits, whether or not it exists yet.
    pub fn decoration_geometry(&self) -> Geometry {
        self.style.frame_geometry(self.geometry)
    }

    pub fn style(&self) -> &DecorationStyle {
        &self.style
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn is_tagged(&self) -> bool {
        self.tag != UNTAGGED
    }

    pub fn is_focused(&self) -> bool {
        self.flags.contains(ClientFlags::FOCUSED)
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(ClientFlags::VISIBLE)
    }

    pub fn is_mapped(&self) -> bool {
        self.flags.contains(ClientFlags::MAPPED)
    }

    pub fn is_managed(&self) -> bool {
        self.flags.contains(ClientFlags::MANAGED)
    }

    pub fn close_requested(&self) -> bool {
        self.flags.contains(ClientFlags::CLOSE_REQUESTED)
    }

    pub fn match_id(&self, handle: Window) -> bool {
        handle == self.window
    }

    /// Whether `window` is the client window or its decoration.
    pub fn owns(&self, window: Window) -> bool {
        self.match_id(window) || self.decoration == Some(window)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Stop managing the window and release the decoration.
    ///
    /// The application window is left exactly as it is. Calling this again
    /// does nothing.
    pub fn unmanage(&mut self) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        self.flags.remove(ClientFlags::MANAGED | ClientFlags::FOCUSED);
        self.anchor = None;

        if let Some(decoration) = self.decoration.take() {
            debug!("Destroying decoration 0x{:x} of window 0x{:x}", decoration, self.window);
            self.transport.destroy(decoration)?;
            self.transport.flush()?;
        }
        info!("Unmanaged window 0x{:x}", self.window);
        Ok(())
    }

    /// Ask the application to close. Escalating to [`force_kill`](Self::force_kill)
    /// is up to the caller.
    pub fn kill(&mut self) -> Result<()> {
        self.flags.insert(ClientFlags::CLOSE_REQUESTED);
        debug!("Requesting close of window 0x{:x}", self.window);
        self.transport.request_close(self.window)?;
        self.transport.flush()
    }

    pub fn force_kill(&self) -> Result<()> {
        info!("Force killing window 0x{:x}", self.window);
        self.transport.kill_client(self.window)?;
        self.transport.flush()
    }

    pub fn print(&self, label: &str) {
        info!("{}: {}", label, self);
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    pub fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        self.anchor = None;
        self.geometry.x = self.geometry.x.saturating_add(dx);
        self.geometry.y = self.geometry.y.saturating_add(dy);
        self.snap()
    }

    pub fn move_absolute(&mut self, x: i32, y: i32) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        self.anchor = None;
        self.geometry.x = x;
        self.geometry.y = y;
        self.snap()
    }

    /// Push `edge` out by `delta` pixels (pull it in when negative).
    ///
    /// Returns `false` without touching anything when the result would be
    /// smaller than the style's minimum size.
    pub fn resize_relative(&mut self, edge: Edge, delta: i32) -> Result<bool> {
        if !self.is_managed() {
            return Ok(false);
        }
        let (min_width, min_height) = self.style.min_size();
        let mut geometry = self.geometry;

        if edge.is_horizontal() {
            match grow(geometry.width, delta, min_width) {
                Some(width) => geometry.width = width,
                None => return Ok(false),
            }
            if edge.is_leading() {
                geometry.x = geometry.x.saturating_sub(delta);
            }
        } else {
            match grow(geometry.height, delta, min_height) {
                Some(height) => geometry.height = height,
                None => return Ok(false),
            }
            if edge.is_leading() {
                geometry.y = geometry.y.saturating_sub(delta);
            }
        }

        self.anchor = None;
        self.geometry = geometry;
        self.snap()?;
        Ok(true)
    }

    /// Set the size, raised to the minimum size where needed.
    pub fn resize_to(&mut self, width: u32, height: u32) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        let (min_width, min_height) = self.style.min_size();
        self.anchor = None;
        self.geometry = Geometry { width, height, ..self.geometry }.clamp_size(min_width, min_height);
        self.snap()
    }

    /// Size the window from a pointer drag that started at `(start_x, start_y)`.
    ///
    /// The size at the start of the drag is captured on the first call for a
    /// start point and every call derives the size from it, so repeated
    /// motion events never accumulate error.
    pub fn resize_mouse(&mut self, start_x: i32, start_y: i32, current_x: i32, current_y: i32) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        let anchor = self.anchor_at(start_x, start_y);

        let (min_width, min_height) = self.style.min_size();
        let dx = current_x as i64 - start_x as i64;
        let dy = current_y as i64 - start_y as i64;
        self.geometry.width = offset_size(anchor.geometry.width, dx, min_width);
        self.geometry.height = offset_size(anchor.geometry.height, dy, min_height);
        self.snap()
    }

    /// Drag a single `edge` with the pointer. The opposite edge stays where
    /// it was when the drag started.
    ///
    /// Shares the anchor of [`resize_mouse`](Self::resize_mouse).
    pub fn resize_mouse_edge(
        &mut self,
        edge: Edge,
        start_x: i32,
        start_y: i32,
        current_x: i32,
        current_y: i32,
    ) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        let start = self.anchor_at(start_x, start_y).geometry;

        let (min_width, min_height) = self.style.min_size();
        let dx = current_x as i64 - start_x as i64;
        let dy = current_y as i64 - start_y as i64;
        let mut geometry = start;
        match edge {
            Edge::Right => geometry.width = offset_size(start.width, dx, min_width),
            Edge::Bottom => geometry.height = offset_size(start.height, dy, min_height),
            Edge::Left => {
                geometry.width = offset_size(start.width, -dx, min_width);
                geometry.x = keep_far_side(start.x, start.width, geometry.width);
            }
            Edge::Top => {
                geometry.height = offset_size(start.height, -dy, min_height);
                geometry.y = keep_far_side(start.y, start.height, geometry.height);
            }
        }
        self.geometry = geometry;
        self.snap()
    }

    /// Forget the anchor captured by [`resize_mouse`](Self::resize_mouse).
    pub fn end_mouse_resize(&mut self) {
        self.anchor = None;
    }

    fn anchor_at(&mut self, start_x: i32, start_y: i32) -> ResizeAnchor {
        match self.anchor {
            Some(anchor) if anchor.start_x == start_x && anchor.start_y == start_y => anchor,
            _ => {
                let anchor = ResizeAnchor { start_x, start_y, geometry: self.geometry };
                self.anchor = Some(anchor);
                anchor
            }
        }
    }

    /// Push the current geometry to the client window and its decoration.
    ///
    /// The geometry is first pulled into the range the protocol can carry,
    /// decoration included, so local state matches what the server gets.
    fn snap(&mut self) -> Result<()> {
        self.geometry = self.geometry.fit_wire(self.style.border_width);
        self.transport.configure(self.window, self.geometry)?;
        if let Some(decoration) = self.decoration {
            self.transport.configure(decoration, self.decoration_geometry())?;
        }
        self.transport.flush()
    }

    // ------------------------------------------------------------------
    // Decoration and visibility
    // ------------------------------------------------------------------

    /// Create the decoration around the current geometry. Does nothing if one exists.
    pub fn decorate(&mut self) -> Result<()> {
        if !self.is_managed() || self.decoration.is_some() {
            return Ok(());
        }
        let fitted = self.geometry.fit_wire(self.style.border_width);
        if fitted != self.geometry {
            self.geometry = fitted;
            self.transport.configure(self.window, fitted)?;
        }
        let frame = self.decoration_geometry();
        let color = self.style.color(self.is_focused());
        let decoration = self.transport.create_decoration(self.transport.root(), frame, color)?;
        self.decoration = Some(decoration);
        debug!("Decorated window 0x{:x} with 0x{:x} at {}", self.window, decoration, frame);

        self.transport.stack_below(decoration, self.window)?;
        if self.is_visible() {
            self.transport.map(decoration)?;
        }
        self.transport.flush()
    }

    /// First presentation of the client and its decoration.
    pub fn map(&mut self) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        self.flags.insert(ClientFlags::MAPPED | ClientFlags::VISIBLE);
        if let Some(decoration) = self.decoration {
            self.transport.map(decoration)?;
        }
        self.transport.map(self.window)?;
        self.transport.flush()
    }

    /// Show or hide the client and its decoration together. Hiding keeps
    /// geometry and tag.
    pub fn set_visible(&mut self, visible: bool) -> Result<()> {
        if !self.is_managed() || visible == self.is_visible() {
            return Ok(());
        }
        if visible {
            self.flags.insert(ClientFlags::MAPPED | ClientFlags::VISIBLE);
            if let Some(decoration) = self.decoration {
                self.transport.map(decoration)?;
            }
            self.transport.map(self.window)?;
        } else {
            self.flags.remove(ClientFlags::VISIBLE);
            self.transport.unmap(self.window)?;
            self.pending_unmaps += 1;
            if let Some(decoration) = self.decoration {
                self.transport.unmap(decoration)?;
            }
        }
        self.transport.flush()
    }

    /// Whether an UnmapNotify for this window was caused by `set_visible(false)`.
    ///
    /// Each self-inflicted unmap is reported once.
    pub fn consume_unmap(&mut self) -> bool {
        if self.pending_unmaps > 0 {
            self.pending_unmaps -= 1;
            true
        } else {
            false
        }
    }

    pub fn raise(&self) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        if let Some(decoration) = self.decoration {
            self.transport.raise(decoration)?;
        }
        self.transport.raise(self.window)?;
        self.transport.flush()
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Route input to the window, publish it as the active window and paint
    /// the decoration focused.
    pub fn focus(&mut self) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        self.flags.insert(ClientFlags::FOCUSED);
        self.transport.set_input_focus(self.window)?;
        self.transport.set_active_window(self.window)?;
        self.paint()?;
        self.transport.flush()
    }

    /// Paint the decoration unfocused. Input is not redirected anywhere.
    pub fn unfocus(&mut self) -> Result<()> {
        if !self.is_managed() {
            return Ok(());
        }
        self.flags.remove(ClientFlags::FOCUSED);
        self.paint()?;
        self.transport.flush()
    }

    /// Drop focus bookkeeping without repainting.
    pub fn remove_focus(&mut self) {
        self.flags.remove(ClientFlags::FOCUSED);
    }

    fn paint(&self) -> Result<()> {
        match self.decoration {
            Some(decoration) => self
                .transport
                .set_border_color(decoration, self.style.color(self.is_focused())),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    /// Reassign the tag. Visibility is the caller's business.
    pub fn change_tag(&mut self, tag: u32) {
        debug!("Window 0x{:x}: tag {} -> {}", self.window, self.tag, tag);
        self.tag = tag;
    }

    pub fn remove_tag(&mut self) {
        self.change_tag(UNTAGGED);
    }
}

/// `size + delta` if that stays at or above `min`.
fn grow(size: u32, delta: i32, min: u32) -> Option<u32> {
    let size = size as i64 + delta as i64;
    if size < min as i64 || size > u32::MAX as i64 {
        None
    } else {
        Some(size as u32)
    }
}

fn offset_size(size: u32, offset: i64, min: u32) -> u32 {
    (size as i64 + offset).clamp(min as i64, u32::MAX as i64) as u32
}

// Position that leaves `pos + size` unchanged after resizing to `new_size`
fn keep_far_side(pos: i32, size: u32, new_size: u32) -> i32 {
    (pos as i64 + size as i64 - new_size as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl<T: ?Sized> fmt::Display for Client<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client 0x{:x} decoration=", self.window)?;
        match self.decoration {
            Some(decoration) => write!(f, "0x{:x}", decoration)?,
            None => f.write_str("none")?,
        }
        write!(f, " geometry={} tag=", self.geometry)?;
        if self.tag == UNTAGGED {
            f.write_str("none")?;
        } else {
            write!(f, "{}", self.tag)?;
        }
        write!(
            f,
            " focused={} visible={} managed={}",
            self.flags.contains(ClientFlags::FOCUSED),
            self.flags.contains(ClientFlags::VISIBLE),
            self.flags.contains(ClientFlags::MANAGED),
        )
    }
}

impl<T: ?Sized> fmt::Debug for Client<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("window", &self.window)
            .field("decoration", &self.decoration)
            .field("geometry", &self.geometry)
            .field("tag", &self.tag)
            .field("flags", &self.flags)
            .field("pending_unmaps", &self.pending_unmaps)
            .finish_non_exhaustive()
    }
}
