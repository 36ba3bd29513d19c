//! Assembly of local element systems and global sparse systems.
pub mod boundary;
pub mod global;
pub mod local;
pub mod operators;
