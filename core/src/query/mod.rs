//! Media query parsing and evaluation against a virtual viewport.
//!
//! Only the subset that breakpoint states use is understood: media types,
//! `not`/`only`, comma lists and the width/height/orientation features.

mod parse;
mod viewport;

pub use parse::{MediaFeature, MediaQuery, MediaType};
pub use viewport::{Orientation, Viewport};
