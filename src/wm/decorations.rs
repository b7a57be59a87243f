//! Window decorations for helium
//!
//! A decoration is a plain surface on the root window, stacked directly below
//! its client and inflated by the border width on every side. The visible
//! part is the border ring; its background color tells focused from
//! unfocused windows.

use tracing::warn;

use crate::config::WindowManagerConfig;
use crate::shared::Geometry;

const BORDER_WIDTH: u32 = 2;
const MAX_BORDER_WIDTH: u32 = 255;
const MIN_SIZE: u32 = 16;

const COLOR_FOCUSED: u32 = 0xc1c1c1;
const COLOR_UNFOCUSED: u32 = 0x3f3f3f;

/// How a client's decoration looks and the size floor it enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorationStyle {
    pub border_width: u32,
    pub focused_color: u32,
    pub unfocused_color: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for DecorationStyle {
    fn default() -> Self {
        Self {
            border_width: BORDER_WIDTH,
            focused_color: COLOR_FOCUSED,
            unfocused_color: COLOR_UNFOCUSED,
            min_width: MIN_SIZE,
            min_height: MIN_SIZE,
        }
    }
}

impl DecorationStyle {
    /// Geometry of the decoration wrapping a client at `client`.
    pub fn frame_geometry(&self, client: Geometry) -> Geometry {
        client.inflate(self.border_width)
    }

    pub fn color(&self, focused: bool) -> u32 {
        if focused {
            self.focused_color
        } else {
            self.unfocused_color
        }
    }

    /// Smallest size a client may be given. Never zero.
    pub fn min_size(&self) -> (u32, u32) {
        (self.min_width.max(1), self.min_height.max(1))
    }
}

impl From<&WindowManagerConfig> for DecorationStyle {
    fn from(config: &WindowManagerConfig) -> Self {
        let mut border_width = config.decorations.border_width;
        if border_width > MAX_BORDER_WIDTH {
            warn!("border_width {} too large, using {}", border_width, MAX_BORDER_WIDTH);
            border_width = MAX_BORDER_WIDTH;
        }
        Self {
            border_width,
            focused_color: config.colors.focused,
            unfocused_color: config.colors.unfocused,
            min_width: config.decorations.min_width,
            min_height: config.decorations.min_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_wraps_client_by_border() {
        let style = DecorationStyle { border_width: 3, ..Default::default() };
        assert_eq!(
            style.frame_geometry(Geometry::new(10, 10, 200, 100)),
            Geometry::new(7, 7, 206, 106)
        );
    }

    #[test]
    fn min_size_is_never_zero() {
        let style = DecorationStyle { min_width: 0, min_height: 0, ..Default::default() };
        assert_eq!(style.min_size(), (1, 1));
    }

    #[test]
    fn style_follows_config() {
        let mut config = WindowManagerConfig::default();
        config.decorations.border_width = 5;
        config.colors.focused = 0x112233;
        let style = DecorationStyle::from(&config);
        assert_eq!(style.border_width, 5);
        assert_eq!(style.color(true), 0x112233);
        assert_eq!(style.color(false), config.colors.unfocused);
    }

    #[test]
    fn oversized_border_is_capped() {
        let mut config = WindowManagerConfig::default();
        config.decorations.border_width = u32::MAX;
        assert_eq!(DecorationStyle::from(&config).border_width, MAX_BORDER_WIDTH);
    }
}
