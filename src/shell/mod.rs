//! Shell UI Module
//!
//! Desktop shell elements drawn by the window manager itself.

pub mod taskbar;

pub use taskbar::Taskbar;
