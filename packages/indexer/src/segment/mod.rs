//! Segmentation of an aggregate LIDO document into independent units.
//!
//! The root wrapper is discovered from the first bytes of the stream. Each
//! direct child of the root becomes one unit, re-wrapped in a verbatim copy
//! of the root open tag so that every namespace declaration stays in scope.

mod root;
mod stream;

pub use root::RootTag;
pub use stream::{RawUnit, UnitStream};
