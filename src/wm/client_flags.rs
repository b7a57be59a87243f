//! Client Flags
//!
//! Bitfield state of a managed client.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClientFlags: u32 {
        /// Still tracked by the manager; cleared by `unmanage`
        const MANAGED         = 1 << 0;
        /// `map` has run at least once
        const MAPPED          = 1 << 1;
        /// Client and decoration are currently shown
        const VISIBLE         = 1 << 2;
        const FOCUSED         = 1 << 3;
        /// A polite close request was sent
        const CLOSE_REQUESTED = 1 << 4;
    }
}

impl Default for ClientFlags {
    fn default() -> Self {
        Self::MANAGED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clients_start_managed_and_hidden() {
        let flags = ClientFlags::default();
        assert!(flags.contains(ClientFlags::MANAGED));
        assert!(!flags.intersects(ClientFlags::MAPPED | ClientFlags::VISIBLE | ClientFlags::FOCUSED));
    }
}
