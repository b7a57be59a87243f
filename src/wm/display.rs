//! Display Module
//!
//! The X11 side of [`Transport`]: one connection, the screen's root window,
//! the atoms close requests and the active-window hint need, and the drag
//! cursors. Every request is buffered by x11rb until `flush`.

use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE};

use crate::shared::window_state::{WIRE_COORD_MAX, WIRE_COORD_MIN, WIRE_EXTENT_MAX};
use crate::shared::{Edge, Geometry};
use crate::wm::error::{Result, TransportError};
use crate::wm::transport::{DragCursor, Transport};

/// Atoms interned once at startup
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub net_active_window: Atom,
}

impl Atoms {
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            wm_protocols: intern("WM_PROTOCOLS")?,
            wm_delete_window: intern("WM_DELETE_WINDOW")?,
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
        })
    }
}

// Glyphs of the standard X cursor font
const XC_FLEUR: u16 = 52;
const XC_LEFT_SIDE: u16 = 70;
const XC_RIGHT_SIDE: u16 = 96;
const XC_TOP_SIDE: u16 = 138;
const XC_BOTTOM_SIDE: u16 = 16;

/// Cursors shown during pointer drags
#[derive(Debug, Clone, Copy)]
pub struct Cursors {
    pub moving: Cursor,
    pub left: Cursor,
    pub right: Cursor,
    pub top: Cursor,
    pub bottom: Cursor,
}

impl Cursors {
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        let font = conn.generate_id()?;
        conn.open_font(font, b"cursor")?;

        let glyph = |shape: u16| -> Result<Cursor> {
            let cursor = conn.generate_id()?;
            conn.create_glyph_cursor(
                cursor, font, font, shape, shape + 1, 0, 0, 0, 0xffff, 0xffff, 0xffff,
            )?;
            Ok(cursor)
        };

        let cursors = Self {
            moving: glyph(XC_FLEUR)?,
            left: glyph(XC_LEFT_SIDE)?,
            right: glyph(XC_RIGHT_SIDE)?,
            top: glyph(XC_TOP_SIDE)?,
            bottom: glyph(XC_BOTTOM_SIDE)?,
        };
        conn.close_font(font)?;
        Ok(cursors)
    }

    pub fn for_drag(&self, drag: DragCursor) -> Cursor {
        match drag {
            DragCursor::Move => self.moving,
            DragCursor::Resize(Edge::Left) => self.left,
            DragCursor::Resize(Edge::Right) => self.right,
            DragCursor::Resize(Edge::Top) => self.top,
            DragCursor::Resize(Edge::Bottom) => self.bottom,
        }
    }
}

/// Pointer events decorations and grabbed clients report
fn drag_mask() -> EventMask {
    EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::BUTTON_MOTION
}

fn clamp_coord(v: i32) -> i16 {
    v.clamp(WIRE_COORD_MIN, WIRE_COORD_MAX) as i16
}

// X rejects zero-sized windows
fn clamp_extent(v: u32) -> u16 {
    v.clamp(1, WIRE_EXTENT_MAX) as u16
}

/// ConfigureWindow values for `geometry`, clamped to what the wire carries.
fn configure_aux(geometry: Geometry) -> ConfigureWindowAux {
    ConfigureWindowAux::new()
        .x(clamp_coord(geometry.x) as i32)
        .y(clamp_coord(geometry.y) as i32)
        .width(clamp_extent(geometry.width) as u32)
        .height(clamp_extent(geometry.height) as u32)
}

pub struct X11Transport<'c, C: Connection> {
    conn: &'c C,
    root: Window,
    atoms: Atoms,
    cursors: Cursors,
}

impl<'c, C: Connection> X11Transport<'c, C> {
    pub fn new(conn: &'c C, screen_num: usize) -> Result<Self> {
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or(TransportError::NoScreen(screen_num))?;
        let root = screen.root;
        info!(
            "Screen {}: root 0x{:x}, {}x{}",
            screen_num, root, screen.width_in_pixels, screen.height_in_pixels
        );

        Ok(Self {
            conn,
            root,
            atoms: Atoms::new(conn)?,
            cursors: Cursors::new(conn)?,
        })
    }

    /// Select substructure redirection on the root window.
    ///
    /// Only one client may hold it, so this fails if another window manager
    /// is already running.
    pub fn become_wm(&self) -> Result<()> {
        let attrs = ChangeWindowAttributesAux::new().event_mask(
            EventMask::SUBSTRUCTURE_REDIRECT
                | EventMask::SUBSTRUCTURE_NOTIFY
                | EventMask::PROPERTY_CHANGE
                | EventMask::FOCUS_CHANGE
                | EventMask::BUTTON_PRESS
                | EventMask::BUTTON_RELEASE
                | EventMask::STRUCTURE_NOTIFY,
        );
        self.conn
            .change_window_attributes(self.root, &attrs)?
            .check()?;
        debug!("Selected substructure redirect on root 0x{:x}", self.root);
        Ok(())
    }

    /// Top-level windows that were already viewable before we started.
    pub fn existing_windows(&self) -> Result<Vec<Window>> {
        let tree = self.conn.query_tree(self.root)?.reply()?;
        let mut windows = Vec::with_capacity(tree.children.len());
        for window in tree.children {
            let attrs = self.conn.get_window_attributes(window)?.reply()?;
            if attrs.map_state == MapState::VIEWABLE && !attrs.override_redirect {
                windows.push(window);
            }
        }
        Ok(windows)
    }
}

impl<C: Connection> Transport for X11Transport<'_, C> {
    fn root(&self) -> Window {
        self.root
    }

    fn configure(&self, window: Window, geometry: Geometry) -> Result<()> {
        self.conn.configure_window(window, &configure_aux(geometry))?;
        Ok(())
    }

    fn map(&self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap(&self, window: Window) -> Result<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn create_decoration(&self, parent: Window, geometry: Geometry, color: u32) -> Result<Window> {
        let id = self.conn.generate_id()?;
        let aux = CreateWindowAux::new()
            .background_pixel(color)
            .override_redirect(1)
            .event_mask(drag_mask());

        self.conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            id,
            parent,
            clamp_coord(geometry.x),
            clamp_coord(geometry.y),
            clamp_extent(geometry.width),
            clamp_extent(geometry.height),
            0,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &aux,
        )?;
        debug!("Created decoration 0x{:x} at {}", id, geometry);
        Ok(id)
    }

    fn stack_below(&self, window: Window, sibling: Window) -> Result<()> {
        let aux = ConfigureWindowAux::new()
            .sibling(sibling)
            .stack_mode(StackMode::BELOW);
        self.conn.configure_window(window, &aux)?;
        Ok(())
    }

    fn raise(&self, window: Window) -> Result<()> {
        let aux = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
        self.conn.configure_window(window, &aux)?;
        Ok(())
    }

    fn destroy(&self, window: Window) -> Result<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn set_border_color(&self, decoration: Window, color: u32) -> Result<()> {
        let aux = ChangeWindowAttributesAux::new().background_pixel(color);
        self.conn.change_window_attributes(decoration, &aux)?;
        self.conn.clear_area(false, decoration, 0, 0, 0, 0)?;
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME)?;
        Ok(())
    }

    fn set_active_window(&self, window: Window) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms.net_active_window,
            AtomEnum::WINDOW,
            &[window],
        )?;
        Ok(())
    }

    fn request_close(&self, window: Window) -> Result<()> {
        let event = ClientMessageEvent::new(
            32,
            window,
            self.atoms.wm_protocols,
            [self.atoms.wm_delete_window, CURRENT_TIME, 0, 0, 0],
        );
        self.conn
            .send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn kill_client(&self, window: Window) -> Result<()> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn grab_buttons(&self, window: Window) -> Result<()> {
        for button in [ButtonIndex::M1, ButtonIndex::M2, ButtonIndex::M3] {
            self.conn.grab_button(
                false,
                window,
                drag_mask(),
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                button,
                ModMask::M4,
            )?;
        }
        Ok(())
    }

    fn grab_pointer(&self, cursor: DragCursor) -> Result<()> {
        self.conn.grab_pointer(
            false,
            self.root,
            EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            NONE,
            self.cursors.for_drag(cursor),
            CURRENT_TIME,
        )?;
        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        Ok(())
    }

    fn grab_server(&self) -> Result<()> {
        self.conn.grab_server()?;
        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        self.conn.ungrab_server()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }

    fn window_geometry(&self, window: Window) -> Result<Geometry> {
        let reply = self.conn.get_geometry(window)?.reply()?;
        Ok(Geometry::new(
            reply.x as i32,
            reply.y as i32,
            reply.width as u32,
            reply.height as u32,
        ))
    }

    fn is_override_redirect(&self, window: Window) -> Result<bool> {
        Ok(self.conn.get_window_attributes(window)?.reply()?.override_redirect)
    }
}
