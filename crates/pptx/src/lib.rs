//! PPTX (Office Open XML) writer for rebuilt slide decks.
//!
//! Produces a single-master, single-layout package whose slides hold an
//! optional full-bleed picture and absolutely positioned text boxes.

pub mod deck;
pub mod error;
mod templates;
pub mod writer;
mod xml;

pub use deck::{Deck, Picture, Slide, TextBox};
pub use error::{PptxError, Result};
pub use writer::{deck_to_bytes, write_deck};
