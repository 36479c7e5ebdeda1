//! Gateway logic: name sanitization, key resolution, storage backends and
//! the gateway that composes them.

pub mod backend;
pub mod file_name;
pub mod gateway;
pub mod object_key;
