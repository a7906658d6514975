//! Types shared between the window manager core and the taskbar.

pub mod geometry;

pub use geometry::Geometry;

/// Server-assigned window identifier (client, frame, button or taskbar).
pub type WindowId = u32;
