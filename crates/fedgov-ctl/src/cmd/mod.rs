//! CLI command modules.

pub mod http;
pub mod lease;
pub mod neighbors;
pub mod status;
