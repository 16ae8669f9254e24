//! Core implementation: storage, index, xref layer and resource pool

pub mod archive;
pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod index;
pub mod io;
pub mod pool;
pub mod reader;
pub mod validation;
pub mod xref_archive;
pub mod xref_map;
