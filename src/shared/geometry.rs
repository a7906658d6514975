//! Window geometry

/// Position and size of a window, in parent coordinates.
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

    /// Grow by `border` on every side, keeping the same origin.
    ///
    /// This is the size a frame needs to enclose a client of this geometry.
    pub fn enclosing(&self, border: u32) -> Self {
        Self {
            x: self.x,
            y: self.y,
            width: self.width + 2 * border,
            height: self.height + 2 * border,
        }
    }

    /// The client rectangle inside a frame of this size: origin at
    /// `(border, border)`, each dimension shrunk by `2 * border`.
    pub fn inset(&self, border: u32) -> Self {
        Self {
            x: border as i32,
            y: border as i32,
            width: self.width.saturating_sub(2 * border),
            height: self.height.saturating_sub(2 * border),
        }
    }

    pub fn same_size(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}
