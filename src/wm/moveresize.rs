//! MoveResize Module
//!
//! Interactive pointer moves and resizes. Both are computed from the pointer
//! position and geometry recorded when the drag started, never from the
//! previous motion event.

use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::shared::{Edge, Geometry};
use crate::wm::error::Result;
use crate::wm::registry::ClientRegistry;
use crate::wm::transport::{DragCursor, Transport};

/// Move/resize operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResizeOperation {
    Move,
    /// The edge follows the pointer, the opposite edge stays put
    Resize(Edge),
}

impl MoveResizeOperation {
    pub fn cursor(self) -> DragCursor {
        match self {
            MoveResizeOperation::Move => DragCursor::Move,
            MoveResizeOperation::Resize(edge) => DragCursor::Resize(edge),
        }
    }
}

/// Move/resize operation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResizeState {
    /// Client window being moved/resized
    pub window: Window,
    pub operation: MoveResizeOperation,
    /// Pointer position at start (root coordinates)
    pub start_x: i32,
    pub start_y: i32,
    /// Client geometry at start
    pub start_geometry: Geometry,
}

/// Move/resize manager
#[derive(Debug, Default)]
pub struct MoveResizeManager {
    state: Option<MoveResizeState>,
}

impl MoveResizeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&MoveResizeState> {
        self.state.as_ref()
    }

    /// Start dragging `window`. Returns `false` if it isn't managed.
    ///
    /// A drag still in progress is finished first.
    pub fn start<T: Transport + ?Sized>(
        &mut self,
        registry: &mut ClientRegistry<'_, T>,
        window: Window,
        operation: MoveResizeOperation,
        root_x: i32,
        root_y: i32,
    ) -> bool {
        self.finish(registry);
        let Some(client) = registry.get(window) else {
            return false;
        };
        debug!("Starting {:?} of window 0x{:x} at ({}, {})", operation, window, root_x, root_y);
        self.state = Some(MoveResizeState {
            window,
            operation,
            start_x: root_x,
            start_y: root_y,
            start_geometry: client.geometry(),
        });
        true
    }

    /// Apply a pointer motion to the dragged client.
    pub fn handle_motion<T: Transport + ?Sized>(
        &self,
        registry: &mut ClientRegistry<'_, T>,
        root_x: i32,
        root_y: i32,
    ) -> Result<()> {
        let Some(state) = self.state else {
            return Ok(());
        };
        let Some(client) = registry.get_mut(state.window) else {
            return Ok(());
        };

        match state.operation {
            MoveResizeOperation::Move => {
                let dx = root_x.saturating_sub(state.start_x);
                let dy = root_y.saturating_sub(state.start_y);
                client.move_absolute(
                    state.start_geometry.x.saturating_add(dx),
                    state.start_geometry.y.saturating_add(dy),
                )
            }
            MoveResizeOperation::Resize(edge) => {
                client.resize_mouse_edge(edge, state.start_x, state.start_y, root_x, root_y)
            }
        }
    }

    /// Finish the current drag, if any.
    pub fn finish<T: Transport + ?Sized>(
        &mut self,
        registry: &mut ClientRegistry<'_, T>,
    ) -> Option<MoveResizeState> {
        let state = self.state.take()?;
        if let Some(client) = registry.get_mut(state.window) {
            client.end_mouse_resize();
            debug!("Finished {:?} of {}", state.operation, client);
        }
        Some(state)
    }
}
