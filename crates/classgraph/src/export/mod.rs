//! Export of the class graph to Graphviz DOT.
//!
//! [`RecordOptions`] controls what each node shows and how the three node
//! categories are styled; [`export_dot`] renders a filtered class set into
//! DOT text ready for `dot -Tsvg`.

mod dot;
mod record;

pub use dot::export_dot;
pub use record::{NodeStyle, RecordOptions, StyleSet};
