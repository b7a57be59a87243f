//! Window Manager Module
//!
//! Resolves protocol events to managed clients and drives the client
//! operations: adoption, decoration, focus, drags and close requests.

pub mod client;
pub mod client_flags;
pub mod decorations;
pub mod display;
pub mod error;
pub mod events;
pub mod moveresize;
pub mod registry;
pub mod transport;

use tracing::{debug, info};
use x11rb::protocol::xproto::Window;
use x11rb::NONE;

use crate::config::{WindowBehaviorConfig, WindowManagerConfig};
use crate::shared::Edge;
use crate::wm::client::Client;
use crate::wm::decorations::DecorationStyle;
use crate::wm::error::{log_warn, Result};
use crate::wm::events::{GeometryRequest, WmEvent, BUTTON_CLOSE, BUTTON_MOVE, BUTTON_RESIZE};
use crate::wm::moveresize::{MoveResizeManager, MoveResizeOperation};
use crate::wm::registry::ClientRegistry;
use crate::wm::transport::Transport;

pub use display::X11Transport;

pub struct WindowManager<'t, T: Transport + ?Sized> {
    transport: &'t T,
    registry: ClientRegistry<'t, T>,
    drag: MoveResizeManager,
    style: DecorationStyle,
    behavior: WindowBehaviorConfig,
}

impl<'t, T: Transport + ?Sized> WindowManager<'t, T> {
    pub fn new(transport: &'t T, config: &WindowManagerConfig) -> Self {
        let registry = ClientRegistry::new(config.behavior.tag_count);
        let style = DecorationStyle::from(config);
        info!(
            "Initializing window manager ({} tags, border {}px)",
            registry.tag_count(),
            style.border_width
        );
        Self {
            transport,
            registry,
            drag: MoveResizeManager::new(),
            style,
            behavior: config.behavior.clone(),
        }
    }

    pub fn registry(&self) -> &ClientRegistry<'t, T> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ClientRegistry<'t, T> {
        &mut self.registry
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    /// Manage windows that were mapped before we started. Returns how many
    /// were taken over.
    pub fn adopt_existing(&mut self, windows: &[Window]) -> usize {
        let adopted = windows
            .iter()
            .filter(|&&window| log_warn(self.manage(window), "adopt").unwrap_or(false))
            .count();
        info!("Adopted {} of {} existing windows", adopted, windows.len());
        adopted
    }

    /// Start managing `window`: decorate it on the active tag, map it and
    /// optionally focus it.
    ///
    /// Returns `false` for windows that are already managed, the root, or
    /// override-redirect.
    ///
    /// The server is grabbed meanwhile so the window cannot change or vanish
    /// between the queries and the decoration.
    pub fn manage(&mut self, window: Window) -> Result<bool> {
        if window == self.transport.root() || self.registry.contains(window) {
            return Ok(false);
        }
        self.transport.grab_server()?;
        let managed = self.manage_grabbed(window);
        log_warn(self.transport.ungrab_server(), "ungrab server");
        log_warn(self.transport.flush(), "flush");
        managed
    }

    fn manage_grabbed(&mut self, window: Window) -> Result<bool> {
        if self.transport.is_override_redirect(window)? {
            debug!("Not managing override-redirect window 0x{:x}", window);
            return Ok(false);
        }

        let geometry = self.transport.window_geometry(window)?;
        let mut client = Client::new(window, self.transport)
            .with_geometry(geometry)
            .with_style(self.style);
        client.change_tag(self.registry.active_tag());
        self.registry.insert(client);

        // Registered first so a failure below still gets unmanaged later.
        if let Some(client) = self.registry.get_mut(window) {
            client.decorate()?;
            self.transport.grab_buttons(window)?;
            client.map()?;
            client.print("Managing");
        }

        if self.behavior.focus_new_windows {
            self.registry.focus(window)?;
        }
        Ok(true)
    }

    pub fn handle_event(&mut self, event: WmEvent) -> Result<()> {
        match event {
            WmEvent::MapRequest { window } => self.handle_map_request(window),
            WmEvent::UnmapNotify { window } => self.handle_unmap_notify(window),
            WmEvent::DestroyNotify { window } => self.handle_destroy_notify(window),
            WmEvent::ConfigureRequest { window, request } => {
                self.handle_configure_request(window, request)
            }
            WmEvent::ButtonPress { window, button, root_x, root_y } => {
                self.handle_button_press(window, button, root_x, root_y)
            }
            WmEvent::ButtonRelease { .. } => self.end_drag(),
            WmEvent::Motion { root_x, root_y } => {
                self.drag.handle_motion(&mut self.registry, root_x, root_y)
            }
        }
    }

    /// Release every client, leaving application windows where they are.
    pub fn shutdown(&mut self) {
        if self.drag.finish(&mut self.registry).is_some() {
            log_warn(self.transport.ungrab_pointer(), "ungrab pointer");
        }
        self.registry.release_all();
        log_warn(self.transport.set_active_window(NONE), "clear active window");
        log_warn(self.transport.flush(), "flush");
        info!("Window manager shut down");
    }

    fn handle_map_request(&mut self, window: Window) -> Result<()> {
        let active = self.registry.active_tag();
        if let Some(client) = self.registry.get_mut(window) {
            if client.tag() != active {
                debug!("Map request for 0x{:x} on hidden tag {}", window, client.tag());
            } else if client.is_mapped() {
                client.set_visible(true)?;
            } else {
                client.map()?;
            }
            return Ok(());
        }

        if !self.manage(window)? {
            self.transport.map(window)?;
            self.transport.flush()?;
        }
        Ok(())
    }

    fn handle_unmap_notify(&mut self, window: Window) -> Result<()> {
        let Some(client) = self.registry.get_mut(window) else {
            return Ok(());
        };
        if client.consume_unmap() {
            debug!("Ignoring our own unmap of 0x{:x}", window);
            return Ok(());
        }
        debug!("Window 0x{:x} withdrew itself", window);
        self.forget(window)
    }

    fn handle_destroy_notify(&mut self, window: Window) -> Result<()> {
        if !self.registry.contains(window) {
            return Ok(());
        }
        debug!("Window 0x{:x} destroyed", window);
        self.forget(window)
    }

    fn forget(&mut self, window: Window) -> Result<()> {
        if self.drag.state().is_some_and(|s| s.window == window) {
            self.end_drag()?;
        }
        self.registry.remove(window);
        if self.registry.focused().is_none() && self.registry.focus_fallback()?.is_none() {
            self.transport.set_active_window(NONE)?;
            self.transport.flush()?;
        }
        Ok(())
    }

    fn start_drag(
        &mut self,
        window: Window,
        operation: MoveResizeOperation,
        root_x: i32,
        root_y: i32,
    ) -> Result<()> {
        if self.drag.start(&mut self.registry, window, operation, root_x, root_y) {
            self.transport.grab_pointer(operation.cursor())?;
            self.transport.flush()?;
        }
        Ok(())
    }

    fn end_drag(&mut self) -> Result<()> {
        if self.drag.finish(&mut self.registry).is_some() {
            self.transport.ungrab_pointer()?;
            self.transport.flush()?;
        }
        Ok(())
    }

    fn handle_configure_request(&mut self, window: Window, request: GeometryRequest) -> Result<()> {
        if let Some(client) = self.registry.get_mut(window) {
            let wanted = request.apply_to(client.geometry());
            if request.moves() {
                client.move_absolute(wanted.x, wanted.y)?;
            }
            if request.resizes() {
                client.resize_to(wanted.width, wanted.height)?;
            }
            return Ok(());
        }

        let current = if request.is_complete() {
            Default::default()
        } else {
            self.transport.window_geometry(window)?
        };
        let geometry = request.apply_to(current);
        debug!("Forwarding configure of unmanaged 0x{:x} to {}", window, geometry);
        self.transport.configure(window, geometry)?;
        self.transport.flush()
    }

    fn handle_button_press(&mut self, window: Window, button: u8, root_x: i32, root_y: i32) -> Result<()> {
        let Some(owner) = self.registry.owner_of(window) else {
            return Ok(());
        };

        self.registry.focus(owner)?;
        if self.behavior.raise_on_focus {
            if let Some(client) = self.registry.get(owner) {
                client.raise()?;
            }
        }

        match button {
            BUTTON_MOVE => self.start_drag(owner, MoveResizeOperation::Move, root_x, root_y)?,
            BUTTON_RESIZE => {
                if let Some(client) = self.registry.get(owner) {
                    let edge = Edge::nearest(client.geometry(), root_x, root_y);
                    self.start_drag(owner, MoveResizeOperation::Resize(edge), root_x, root_y)?;
                }
            }
            BUTTON_CLOSE => {
                if let Some(client) = self.registry.get_mut(owner) {
                    if client.close_requested() {
                        client.force_kill()?;
                    } else {
                        client.kill()?;
                    }
                }
            }
            other => debug!("Ignoring button {} on 0x{:x}", other, owner),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Geometry;
    use crate::wm::transport::testing::{RecordingTransport, Request};
    use crate::wm::transport::DragCursor;

    const A: Window = 0x0020_0001;
    const B: Window = 0x0020_0002;
    const STRAY: Window = 0x0020_0099;

    fn transport() -> RecordingTransport {
        let transport = RecordingTransport::new();
        transport.set_geometry(A, Geometry::new(100, 100, 200, 150));
        transport.set_geometry(B, Geometry::new(400, 50, 320, 240));
        transport
    }

    fn decoration_of(wm: &WindowManager<'_, RecordingTransport>, window: Window) -> Window {
        wm.registry().get(window).unwrap().decoration().unwrap()
    }

    #[test]
    fn map_request_manages_and_focuses() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());

        wm.handle_event(WmEvent::MapRequest { window: A }).unwrap();

        let client = wm.registry().get(A).unwrap();
        assert_eq!(client.geometry(), Geometry::new(100, 100, 200, 150));
        assert_eq!(client.tag(), 1);
        assert!(client.is_visible());
        assert!(client.is_focused());
        assert_eq!(wm.registry().focused(), Some(A));

        let issued = transport.issued();
        let grab = issued.iter().position(|r| *r == Request::GrabButtons(A)).unwrap();
        let map = issued.iter().position(|r| *r == Request::Map(A)).unwrap();
        assert_eq!(issued[0], Request::GrabServer);
        assert!(matches!(issued[1], Request::CreateDecoration { .. }));
        assert_eq!(issued.last(), Some(&Request::UngrabServer));
        assert!(grab < map);
        assert!(issued.contains(&Request::SetInputFocus(A)));
        assert!(issued.contains(&Request::SetActiveWindow(A)));
    }

    #[test]
    fn new_windows_stay_unfocused_when_configured() {
        let transport = transport();
        let mut config = WindowManagerConfig::default();
        config.behavior.focus_new_windows = false;
        let mut wm = WindowManager::new(&transport, &config);

        wm.handle_event(WmEvent::MapRequest { window: A }).unwrap();
        assert!(wm.registry().contains(A));
        assert_eq!(wm.registry().focused(), None);
        assert_eq!(transport.count(|r| matches!(r, Request::SetInputFocus(_))), 0);
    }

    #[test]
    fn override_redirect_map_is_passed_through() {
        let transport = transport();
        transport.set_override_redirect(A);
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());

        wm.handle_event(WmEvent::MapRequest { window: A }).unwrap();
        assert!(!wm.registry().contains(A));
        assert_eq!(
            transport.issued(),
            vec![Request::GrabServer, Request::UngrabServer, Request::Map(A)]
        );
    }

    #[test]
    fn vanished_window_is_not_managed() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());

        assert!(wm.handle_event(WmEvent::MapRequest { window: STRAY }).is_err());
        assert!(wm.registry().is_empty());
        // the server is never left grabbed
        assert_eq!(transport.issued(), vec![Request::GrabServer, Request::UngrabServer]);
    }

    #[test]
    fn map_request_for_known_unmapped_client_maps_it() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        let mut client = Client::new(A, &transport).with_geometry(Geometry::new(100, 100, 200, 150));
        client.change_tag(wm.registry().active_tag());
        wm.registry_mut().insert(client);
        transport.clear();

        wm.handle_event(WmEvent::MapRequest { window: A }).unwrap();
        assert!(wm.registry().get(A).unwrap().is_mapped());
        assert_eq!(transport.issued(), vec![Request::Map(A)]);
    }

    #[test]
    fn adopt_skips_failures_and_duplicates() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());

        assert_eq!(wm.adopt_existing(&[A, STRAY, A, B]), 2);
        assert_eq!(wm.registry().len(), 2);
        assert_eq!(wm.registry().focused(), Some(B));
        assert!(!wm.registry().get(A).unwrap().is_focused());
    }

    #[test]
    fn our_own_unmap_keeps_the_client() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();

        wm.registry_mut().switch_tag(2).unwrap();
        assert!(!wm.registry().get(A).unwrap().is_visible());

        wm.handle_event(WmEvent::UnmapNotify { window: A }).unwrap();
        assert!(wm.registry().contains(A));

        // a second unmap was not ours: the client withdrew
        wm.handle_event(WmEvent::UnmapNotify { window: A }).unwrap();
        assert!(!wm.registry().contains(A));
    }

    #[test]
    fn map_request_respects_tags() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        wm.registry_mut().switch_tag(2).unwrap();
        transport.clear();

        wm.handle_event(WmEvent::MapRequest { window: A }).unwrap();
        assert!(!wm.registry().get(A).unwrap().is_visible());
        assert!(transport.requests().is_empty());

        wm.registry_mut().send_to_tag(A, 2).unwrap();
        assert!(wm.registry().get(A).unwrap().is_visible());
    }

    #[test]
    fn destroy_releases_decoration_and_falls_back() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        wm.manage(B).unwrap();
        let decoration = decoration_of(&wm, B);
        assert_eq!(wm.registry().focused(), Some(B));

        wm.handle_event(WmEvent::DestroyNotify { window: B }).unwrap();

        assert!(!wm.registry().contains(B));
        assert!(transport.issued().contains(&Request::Destroy(decoration)));
        assert_eq!(wm.registry().focused(), Some(A));
        assert!(wm.registry().get(A).unwrap().is_focused());
        assert_eq!(
            transport.issued().iter().rev().find(|r| matches!(r, Request::SetActiveWindow(_))),
            Some(&Request::SetActiveWindow(A))
        );
    }

    #[test]
    fn losing_the_last_client_clears_the_active_window() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        transport.clear();

        wm.handle_event(WmEvent::DestroyNotify { window: A }).unwrap();
        assert_eq!(wm.registry().focused(), None);
        assert_eq!(transport.issued().last(), Some(&Request::SetActiveWindow(NONE)));
    }

    #[test]
    fn destroy_of_unknown_window_is_ignored() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        transport.clear();

        wm.handle_event(WmEvent::DestroyNotify { window: STRAY }).unwrap();
        assert!(transport.requests().is_empty());
        assert_eq!(wm.registry().len(), 1);
    }

    #[test]
    fn configure_request_on_managed_client() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        let decoration = decoration_of(&wm, A);

        let request = GeometryRequest { width: Some(300), ..Default::default() };
        wm.handle_event(WmEvent::ConfigureRequest { window: A, request }).unwrap();
        assert_eq!(wm.registry().get(A).unwrap().geometry(), Geometry::new(100, 100, 300, 150));
        assert_eq!(transport.last_configure(decoration), Some(Geometry::new(98, 98, 304, 154)));

        let request = GeometryRequest { x: Some(5), height: Some(1), ..Default::default() };
        wm.handle_event(WmEvent::ConfigureRequest { window: A, request }).unwrap();
        assert_eq!(wm.registry().get(A).unwrap().geometry(), Geometry::new(5, 100, 300, 16));
    }

    #[test]
    fn configure_request_on_unmanaged_window_is_forwarded() {
        let transport = transport();
        transport.set_geometry(STRAY, Geometry::new(1, 2, 30, 40));
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());

        let request = GeometryRequest { y: Some(60), width: Some(90), ..Default::default() };
        wm.handle_event(WmEvent::ConfigureRequest { window: STRAY, request }).unwrap();
        assert_eq!(
            transport.issued(),
            vec![Request::Configure(STRAY, Geometry::new(1, 60, 90, 40))]
        );
    }

    #[test]
    fn decoration_drag_moves_client() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        wm.manage(B).unwrap();
        let decoration = decoration_of(&wm, A);
        transport.clear();

        wm.handle_event(WmEvent::ButtonPress {
            window: decoration,
            button: BUTTON_MOVE,
            root_x: 10,
            root_y: 10,
        })
        .unwrap();
        assert_eq!(wm.registry().focused(), Some(A));
        assert!(transport.issued().contains(&Request::Raise(A)));
        assert!(transport.issued().contains(&Request::GrabPointer(DragCursor::Move)));
        assert!(wm.is_dragging());

        wm.handle_event(WmEvent::Motion { root_x: 20, root_y: 25 }).unwrap();
        assert_eq!(wm.registry().get(A).unwrap().geometry(), Geometry::new(110, 115, 200, 150));

        wm.handle_event(WmEvent::ButtonRelease { button: BUTTON_MOVE }).unwrap();
        assert!(!wm.is_dragging());
        assert_eq!(transport.issued().last(), Some(&Request::UngrabPointer));

        transport.clear();
        wm.handle_event(WmEvent::Motion { root_x: 500, root_y: 500 }).unwrap();
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn resize_drag_moves_the_nearest_edge() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();

        // bottom-right corner: ties go to the right edge
        wm.handle_event(WmEvent::ButtonPress { window: A, button: BUTTON_RESIZE, root_x: 300, root_y: 250 })
            .unwrap();
        assert!(transport.issued().contains(&Request::GrabPointer(DragCursor::Resize(Edge::Right))));
        wm.handle_event(WmEvent::Motion { root_x: 350, root_y: 240 }).unwrap();
        assert_eq!(wm.registry().get(A).unwrap().geometry(), Geometry::new(100, 100, 250, 150));
        wm.handle_event(WmEvent::ButtonRelease { button: BUTTON_RESIZE }).unwrap();
        assert!(!wm.is_dragging());
        assert_eq!(transport.issued().last(), Some(&Request::UngrabPointer));
    }

    #[test]
    fn resize_near_left_edge_keeps_right_edge() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        transport.clear();

        wm.handle_event(WmEvent::ButtonPress { window: A, button: BUTTON_RESIZE, root_x: 101, root_y: 170 })
            .unwrap();
        assert!(transport.issued().contains(&Request::GrabPointer(DragCursor::Resize(Edge::Left))));
        wm.handle_event(WmEvent::Motion { root_x: 81, root_y: 170 }).unwrap();

        let g = wm.registry().get(A).unwrap().geometry();
        assert_eq!(g, Geometry::new(80, 100, 220, 150));
        assert_eq!(g.x + g.width as i32, 300);
    }

    #[test]
    fn close_button_escalates() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        let press = WmEvent::ButtonPress { window: A, button: BUTTON_CLOSE, root_x: 0, root_y: 0 };

        wm.handle_event(press).unwrap();
        assert_eq!(transport.count(|r| *r == Request::RequestClose(A)), 1);
        assert_eq!(transport.count(|r| *r == Request::KillClient(A)), 0);

        wm.handle_event(press).unwrap();
        assert_eq!(transport.count(|r| *r == Request::KillClient(A)), 1);
    }

    #[test]
    fn clicks_outside_clients_are_ignored() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        transport.clear();

        wm.handle_event(WmEvent::ButtonPress { window: STRAY, button: BUTTON_MOVE, root_x: 0, root_y: 0 })
            .unwrap();
        assert!(transport.requests().is_empty());
        assert!(!wm.is_dragging());
    }

    #[test]
    fn withdrawing_dragged_client_ends_drag() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        wm.handle_event(WmEvent::ButtonPress { window: A, button: BUTTON_MOVE, root_x: 0, root_y: 0 })
            .unwrap();

        wm.handle_event(WmEvent::UnmapNotify { window: A }).unwrap();
        assert!(!wm.is_dragging());
        assert!(wm.registry().is_empty());
        assert!(transport.issued().contains(&Request::UngrabPointer));
    }

    #[test]
    fn shutdown_releases_every_decoration() {
        let transport = transport();
        let mut wm = WindowManager::new(&transport, &WindowManagerConfig::default());
        wm.manage(A).unwrap();
        wm.manage(B).unwrap();
        let decorations = [decoration_of(&wm, A), decoration_of(&wm, B)];

        wm.shutdown();
        assert!(wm.registry().is_empty());
        assert_eq!(transport.issued().last(), Some(&Request::SetActiveWindow(NONE)));
        for decoration in decorations {
            assert!(transport.issued().contains(&Request::Destroy(decoration)));
        }
        assert!(!transport.issued().contains(&Request::Destroy(A)));
    }
}
