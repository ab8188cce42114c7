//! Language-aware source editors for `ast-modify` points.

mod scan;
mod typescript;

pub use typescript::TypeScriptEditor;
