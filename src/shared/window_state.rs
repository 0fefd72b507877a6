//! Window geometry as the window manager sees it

/// Position and size of a window, in root coordinates.
///
/// Width and height exclude the X border, matching what `CreateWindow`
/// and `GetGeometry` use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Same size, moved to `(x, y)`.
    pub fn moved_to(self, x: i32, y: i32) -> Self {
        Self { x, y, ..self }
    }
}
