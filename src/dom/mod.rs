//! DOM simplifier and snippet picker.

pub mod simplify;
pub mod snippets;

pub use simplify::simplify;
pub use snippets::snippets;
