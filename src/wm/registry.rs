//! Registry Module
//!
//! Owns the managed clients, the single focus pointer and the active tag.
//! Focus only ever moves through [`ClientRegistry::focus`], which unfocuses
//! the previous holder before focusing the new one, so at most one client
//! is focused at a time.

use tracing::{debug, info, warn};
use x11rb::protocol::xproto::Window;

use crate::wm::client::{Client, UNTAGGED};
use crate::wm::error::{log_warn, Result};
use crate::wm::transport::Transport;

pub struct ClientRegistry<'t, T: ?Sized> {
    /// Clients in the order they were managed
    clients: Vec<Client<'t, T>>,
    focused: Option<Window>,
    active_tag: u32,
    tag_count: u32,
}

impl<'t, T: Transport + ?Sized> ClientRegistry<'t, T> {
    /// Registry with tags `1..=tag_count`, tag 1 active.
    pub fn new(tag_count: u32) -> Self {
        Self {
            clients: Vec::new(),
            focused: None,
            active_tag: 1,
            tag_count: tag_count.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client<'t, T>> {
        self.clients.iter()
    }

    /// Start tracking `client`. A second client for an already managed
    /// window is refused.
    pub fn insert(&mut self, client: Client<'t, T>) -> bool {
        if self.contains(client.window()) {
            warn!("Window 0x{:x} is already managed", client.window());
            return false;
        }
        debug!("Registering {}", client);
        self.clients.push(client);
        true
    }

    pub fn contains(&self, window: Window) -> bool {
        self.clients.iter().any(|c| c.match_id(window))
    }

    pub fn get(&self, window: Window) -> Option<&Client<'t, T>> {
        self.clients.iter().find(|c| c.match_id(window))
    }

    pub fn get_mut(&mut self, window: Window) -> Option<&mut Client<'t, T>> {
        self.clients.iter_mut().find(|c| c.match_id(window))
    }

    /// Client window owning `window`, which may be a decoration.
    pub fn owner_of(&self, window: Window) -> Option<Window> {
        self.clients.iter().find(|c| c.owns(window)).map(|c| c.window())
    }

    /// Stop tracking `window`: focus bookkeeping is dropped without a
    /// repaint and the decoration is released.
    pub fn remove(&mut self, window: Window) -> Option<Client<'t, T>> {
        let index = self.clients.iter().position(|c| c.match_id(window))?;
        let mut client = self.clients.remove(index);
        if self.focused == Some(window) {
            self.focused = None;
        }
        client.remove_focus();
        log_warn(client.unmanage(), "unmanage");
        Some(client)
    }

    /// Unmanage every client, e.g. on shutdown.
    pub fn release_all(&mut self) {
        self.focused = None;
        for mut client in self.clients.drain(..) {
            client.remove_focus();
            log_warn(client.unmanage(), "unmanage");
        }
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    pub fn focused(&self) -> Option<Window> {
        self.focused
    }

    /// Move focus to `window`. Returns `false` for unknown windows.
    pub fn focus(&mut self, window: Window) -> Result<bool> {
        if !self.contains(window) {
            debug!("Not focusing unmanaged window 0x{:x}", window);
            return Ok(false);
        }
        if let Some(previous) = self.focused.filter(|&w| w != window) {
            if let Some(client) = self.get_mut(previous) {
                log_warn(client.unfocus(), "unfocus");
            }
        }
        self.focused = Some(window);
        if let Some(client) = self.get_mut(window) {
            client.focus()?;
        }
        Ok(true)
    }

    /// Unfocus the current holder, leaving nothing focused.
    pub fn unfocus(&mut self) -> Result<()> {
        if let Some(previous) = self.focused.take() {
            if let Some(client) = self.get_mut(previous) {
                client.unfocus()?;
            }
        }
        Ok(())
    }

    /// Focus the most recently managed visible client on the active tag.
    pub fn focus_fallback(&mut self) -> Result<Option<Window>> {
        let active = self.active_tag;
        let candidate = self
            .clients
            .iter()
            .rev()
            .find(|c| c.is_visible() && c.tag() == active)
            .map(|c| c.window());

        match candidate {
            Some(window) => {
                self.focus(window)?;
            }
            None => self.unfocus()?,
        }
        Ok(candidate)
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    pub fn active_tag(&self) -> u32 {
        self.active_tag
    }

    pub fn tag_count(&self) -> u32 {
        self.tag_count
    }

    /// Make `tag` the active one: its clients are shown, every other client
    /// is hidden. Returns `false` if the tag is invalid or already active.
    pub fn switch_tag(&mut self, tag: u32) -> Result<bool> {
        if tag == UNTAGGED || tag > self.tag_count {
            warn!("Invalid tag: {} (max: {})", tag, self.tag_count);
            return Ok(false);
        }
        if tag == self.active_tag {
            debug!("Already on tag {}", tag);
            return Ok(false);
        }

        info!("Switching from tag {} to {}", self.active_tag, tag);
        self.active_tag = tag;

        // Show first so the screen never flashes empty.
        let mut first_error = None;
        for client in self.clients.iter_mut().filter(|c| c.tag() == tag) {
            if let Err(e) = client.set_visible(true) {
                first_error.get_or_insert(e);
            }
        }
        for client in self.clients.iter_mut().filter(|c| c.tag() != tag) {
            if let Err(e) = client.set_visible(false) {
                first_error.get_or_insert(e);
            }
        }
        self.drop_hidden_focus();

        match first_error {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    /// Retag `window` and show or hide it for the active tag.
    pub fn send_to_tag(&mut self, window: Window, tag: u32) -> Result<()> {
        let active = self.active_tag;
        let Some(client) = self.get_mut(window) else {
            warn!("send_to_tag: window 0x{:x} not found", window);
            return Ok(());
        };
        client.change_tag(tag);
        client.set_visible(tag == active)?;
        self.drop_hidden_focus();
        Ok(())
    }

    fn drop_hidden_focus(&mut self) {
        let Some(window) = self.focused else {
            return;
        };
        if let Some(client) = self.clients.iter_mut().find(|c| c.match_id(window)) {
            if !client.is_visible() {
                client.remove_focus();
                self.focused = None;
            }
        }
    }
}
