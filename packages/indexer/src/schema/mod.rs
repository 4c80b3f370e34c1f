//! Declarative schema mapping of base documents.
//!
//! A schema file lists copy, move, static and suppress tasks. The
//! [`SchemaMapper`] derives the index id and runs the tasks of the resolved
//! [`MappingConfig`] in that fixed order.

mod config;
mod loader;
mod mapper;

pub use config::{FieldPair, MappingConfig, SchemaFile, Task, TaskSet};
pub use loader::{ConfigCache, ConfigLoader, DirectoryLoader, InMemoryLoader, SCHEMA_FILE_SUFFIX};
pub use mapper::{Mapped, MappingWarning, SchemaMapper};
