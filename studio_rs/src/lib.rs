//! # soch-studio
//!
//! Terminal studio for SochDB. The database engine is never linked in;
//! every operation goes through an MCP-style **tool bridge** - a spawned
//! server process that answers `tools/call` requests with text envelopes.
//!
//! The crate is built from three tightly coupled pieces:
//!
//! - [`store`] - framework-free observable state containers that propagate
//!   query results, schema, connections and recipes to interested views.
//! - [`toon`] - a tolerant parser that normalizes the bridge's loosely
//!   specified payloads (JSON arrays or the compact "toon" text format)
//!   into key lists, row sets and sentinels. It never fails.
//! - [`console`] - the command interpreter behind the `sochdb>` prompt:
//!   one line in, bridge calls out, exactly one rendered log entry back.
//!
//! ## Quick start (library usage)
//!
//! ```rust,no_run
//! use soch_studio::bridge::{StdioBridge, ToolBridge};
//! use soch_studio::console::Console;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let bridge = StdioBridge::spawn("sochdb-mcp", &["./dev.sochdb".into()]).await?;
//! let mut console = Console::new(bridge);
//! console.execute("list").await;
//! for entry in console.history() {
//!     println!("{}", entry.text);
//! }
//! # Ok(())
//! # }
//! ```

/// Tool bridge: the `ToolBridge` trait, bridge errors, and the JSON-RPC
/// stdio client that spawns the SochDB MCP server as a child process.
pub mod bridge;

/// Config file support (persists the last-used database path).
pub mod config;

/// Console command interpreter and its append-only history log.
pub mod console;

/// Session orchestration: KV explorer and query-workbench flows that tie
/// the bridge, the parser and the shared stores together.
pub mod session;

/// Generic observable store: copy-on-write snapshots plus synchronous
/// subscriber notification.
pub mod store;

/// Concrete shared stores (query, schema, connections, recipes).
pub mod stores;

/// Tolerant parser for tool-bridge response payloads.
pub mod toon;

pub use bridge::{BridgeError, StdioBridge, ToolBridge};
pub use console::{Console, ConsoleEntry, EntryKind};
pub use store::{Store, SubscriptionId};
pub use toon::{RowSet, ScanOutcome};
