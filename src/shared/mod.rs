//! Types shared between the client core and the surrounding layers

pub mod window_state;

pub use window_state::{Edge, Geometry};
