//! Content model for page descriptions.
//!
//! A [`Page`] is read from one `content.json`; its content is a sequence of
//! [`ContentBlock`]s, a sum type with one variant per block `type`. Each
//! variant carries only the fields its type allows, so a deserialized page
//! can never hold a field that is meaningless for its block type.

mod block;
mod page;

pub use block::{BlockKind, CodeData, ContentBlock, EquationData, ImageData, TableData, TextData};
pub use page::{Page, Reference, SectionLevel};
