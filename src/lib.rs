//! helium
//!
//! Core of a small X11 window manager: managed clients with a plain border
//! decoration, tags, focus and pointer-driven move/resize.

pub mod config;
pub mod shared;
pub mod wm;
