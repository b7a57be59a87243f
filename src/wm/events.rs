//! Events Module
//!
//! Narrows x11rb protocol events down to the handful the window manager
//! reacts to. Everything else is dropped here.

use x11rb::protocol::xproto::{ConfigWindow, Window};
use x11rb::protocol::Event;

use crate::shared::Geometry;

pub const BUTTON_MOVE: u8 = 1;
pub const BUTTON_CLOSE: u8 = 2;
pub const BUTTON_RESIZE: u8 = 3;

/// Fields of a ConfigureRequest the client actually asked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryRequest {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl GeometryRequest {
    pub fn from_mask(mask: u16, x: i16, y: i16, width: u16, height: u16) -> Self {
        let has = |flag: ConfigWindow| mask & u16::from(flag) != 0;
        Self {
            x: has(ConfigWindow::X).then_some(x as i32),
            y: has(ConfigWindow::Y).then_some(y as i32),
            width: has(ConfigWindow::WIDTH).then_some(width as u32),
            height: has(ConfigWindow::HEIGHT).then_some(height as u32),
        }
    }

    pub fn moves(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    pub fn resizes(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Every geometry field was supplied.
    pub fn is_complete(&self) -> bool {
        self.x.is_some() && self.y.is_some() && self.width.is_some() && self.height.is_some()
    }

    /// `current` with the requested fields replaced.
    pub fn apply_to(&self, current: Geometry) -> Geometry {
        Geometry {
            x: self.x.unwrap_or(current.x),
            y: self.y.unwrap_or(current.y),
            width: self.width.unwrap_or(current.width),
            height: self.height.unwrap_or(current.height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmEvent {
    MapRequest { window: Window },
    UnmapNotify { window: Window },
    DestroyNotify { window: Window },
    ConfigureRequest { window: Window, request: GeometryRequest },
    /// `window` is the window the press was reported on: a decoration, or
    /// a client window through the button grab
    ButtonPress { window: Window, button: u8, root_x: i32, root_y: i32 },
    ButtonRelease { button: u8 },
    Motion { root_x: i32, root_y: i32 },
}

impl WmEvent {
    pub fn from_x11(event: &Event) -> Option<Self> {
        let translated = match event {
            Event::MapRequest(e) => WmEvent::MapRequest { window: e.window },
            Event::UnmapNotify(e) => WmEvent::UnmapNotify { window: e.window },
            Event::DestroyNotify(e) => WmEvent::DestroyNotify { window: e.window },
            Event::ConfigureRequest(e) => WmEvent::ConfigureRequest {
                window: e.window,
                request: GeometryRequest::from_mask(
                    u16::from(e.value_mask),
                    e.x,
                    e.y,
                    e.width,
                    e.height,
                ),
            },
            Event::ButtonPress(e) => WmEvent::ButtonPress {
                window: e.event,
                button: e.detail,
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
            },
            Event::ButtonRelease(e) => WmEvent::ButtonRelease { button: e.detail },
            Event::MotionNotify(e) => WmEvent::Motion {
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
            },
            _ => return None,
        };
        Some(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_masked_fields_are_requested() {
        let mask = u16::from(ConfigWindow::X) | u16::from(ConfigWindow::HEIGHT);
        let request = GeometryRequest::from_mask(mask, -5, 9, 640, 480);
        assert_eq!(
            request,
            GeometryRequest { x: Some(-5), y: None, width: None, height: Some(480) }
        );
        assert!(request.moves());
        assert!(request.resizes());
        assert!(!request.is_complete());
        assert!(GeometryRequest::from_mask(0xf, 0, 0, 1, 1).is_complete());
    }

    #[test]
    fn empty_mask_requests_nothing() {
        let request = GeometryRequest::from_mask(0, 1, 2, 3, 4);
        assert_eq!(request, GeometryRequest::default());
        assert!(!request.moves());
        assert!(!request.resizes());
        let g = Geometry::new(7, 8, 9, 10);
        assert_eq!(request.apply_to(g), g);
    }

    #[test]
    fn apply_fills_missing_fields() {
        let request = GeometryRequest { width: Some(300), y: Some(20), ..Default::default() };
        assert_eq!(
            request.apply_to(Geometry::new(1, 2, 3, 4)),
            Geometry::new(1, 20, 300, 4)
        );
    }
}
