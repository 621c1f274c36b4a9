//! Data Transfer Objects for JSON responses.

pub mod system_dto;

pub use system_dto::*;
