//! Built-in document classes
//!
//! Ready-made classes built through the same loading API an external
//! loader would use.

mod c;
mod python;

pub use c::c_class;
pub use python::python_class;

use super::document_class::DocumentClass;

/// Get all built-in document classes
pub fn all_classes() -> Vec<DocumentClass> {
    vec![c_class().class, python_class().class]
}

/// Find a built-in document class by name
pub fn class_by_name(name: &str) -> Option<DocumentClass> {
    match name {
        "C" => Some(c_class().class),
        "Python" => Some(python_class().class),
        _ => None,
    }
}
