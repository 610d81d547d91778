//! Shared wire types for the SochDB Studio crates.
//!
//! This crate provides the tool-bridge envelope types exchanged with the
//! SochDB MCP server: the `tools/call` result shape (`content[]` plus an
//! optional `isError` flag) and its content blocks.

mod envelope;

pub use envelope::{ContentBlock, ToolEnvelope};
