//! Mod descriptor and metadata document handling.
//!
//! Descriptors are semi-structured documents owned by the loader runtimes;
//! only the fields the assembly pipeline splices are given typed accessors.
//! Everything else rides along untouched: documents are parsed into generic
//! JSON/TOML trees, mutated through helpers, and re-serialized with field
//! order preserved.

pub mod access_widener;
pub mod fmj;
pub mod jarjar;
pub mod nmt;

pub use access_widener::convert_access_widener;
pub use fmj::Fmj;
pub use jarjar::{NestedJarEntry, NestedJarIndex};
pub use nmt::{DependencySide, Nmt};
