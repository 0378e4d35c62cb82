// Render module - Scrolling strip layout for displays and terminals

pub mod strip;

pub use strip::{
    DEFAULT_VIEWPORT_WIDTH, NoteCell, StripLayout, TextStrip, copies_for, translate_x,
};
