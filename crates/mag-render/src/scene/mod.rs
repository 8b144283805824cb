//! Retained scene tree, layout engine and text metrics

mod color;
mod layout;
mod node;
mod text;

pub use color::Rgba;
pub use layout::{layout_tree, measure};
pub use node::*;
pub use text::{FontBook, LoadedFont, TextLine, wrap_text};

pub(crate) use text::{glyph_advance, glyph_id};
