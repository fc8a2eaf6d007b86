mod common;
mod precompile;
mod ruby;

pub use common::{descendants, line_text, named_children, node_text, span_of};
pub use precompile::{precompile, PrecompileFormat, DOCUMENT_METHOD};
pub use ruby::RubyParser;
