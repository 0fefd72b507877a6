//! Placement Module
//!
//! Initial geometry for a newly framed window. Only the newcomer is placed;
//! frames that already exist are never moved, so from the fourth client on
//! frames overlap.

use crate::shared::Geometry;
use crate::wm::screen::ScreenInfo;

/// Frame geometry for a new client, given how many clients are managed
/// *before* it is added.
///
/// The first client gets the whole screen, the second the right half, and
/// the third the bottom half of the right half. Later clients keep shrinking
/// towards the top of the right half.
pub fn frame_geometry(managed: usize, screen: &ScreenInfo) -> Geometry {
    let (w, h) = (screen.width, screen.height);
    let n = u32::try_from(managed).unwrap_or(u32::MAX);

    let width = if n == 0 { w } else { w / 2 };
    let height = if n == 0 { h } else { h / n };
    let x = if n == 0 { 0 } else { w / 2 };
    let y = if n <= 1 { 0 } else { h / n };

    Geometry::new(x as i32, y as i32, width, height)
}
