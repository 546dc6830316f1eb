//! Rendering module for converting validated pages to LaTeX fragments.

mod escape;
mod latex;
mod options;
mod result;

pub use escape::escape_text;
pub use latex::{render_fragment, LatexRenderer};
pub use options::{PageSelection, RenderOptions};
pub use result::{Fragment, RenderStats};
