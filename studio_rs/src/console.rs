//! Console command interpreter.
//!
//! One line of input maps to bridge effects plus a deterministic, rendered
//! log entry. The history is the only state: an ordered, append-only list
//! of input/output/error entries that `clear` replaces wholesale. Every
//! dispatch appends exactly one input echo before the call and exactly one
//! output or error entry after it (except `clear`); bridge rejections are
//! caught here and never propagate past the interpreter.

use serde_json::{Value, json};
use thiserror::Error;

use crate::bridge::{BridgeError, ToolBridge, tools};
use crate::toon;

/// Classification of a history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Input,
    Output,
    Error,
}

/// One line of the console log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub kind: EntryKind,
    pub text: String,
}

impl ConsoleEntry {
    fn output(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Output,
            text: text.into(),
        }
    }
}

/// Banner shown when the console opens.
pub const WELCOME: &str = "Welcome to SochDB Console. Type 'help' for available commands.";

const PROMPT: &str = "sochdb>";

const HELP_TEXT: &str = "Available commands:
  help              - Show this help
  list              - List all tables
  get <path>        - Get value at path
  put <path> <json> - Store value at path
  delete <path>     - Delete value at path
  describe <table>  - Show table schema
  query <sql>       - Execute a query
  create-sample     - Create sample data
  clear             - Clear console";

const UNKNOWN_COMMAND: &str = "Unknown command. Type \"help\" for available commands.";

/// Everything a dispatch can fail with. Rendered as a single error entry.
#[derive(Debug, Error)]
enum CommandError {
    #[error("{0}")]
    Bridge(#[from] BridgeError),
    #[error("{0}")]
    MalformedJson(#[from] serde_json::Error),
}

/// The interpreter behind the `sochdb>` prompt.
pub struct Console<B> {
    bridge: B,
    history: Vec<ConsoleEntry>,
}

impl<B: ToolBridge> Console<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            history: vec![ConsoleEntry::output(WELCOME)],
        }
    }

    pub fn history(&self) -> &[ConsoleEntry] {
        &self.history
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Give the bridge back, e.g. to shut it down after the loop ends.
    pub fn into_bridge(self) -> B {
        self.bridge
    }

    /// Interpret one line of input. Blank lines are ignored entirely.
    pub async fn execute(&mut self, line: &str) {
        let cmd = line.trim();
        if cmd.is_empty() {
            return;
        }

        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let verb = parts[0].to_lowercase();

        // `clear` replaces the whole log and echoes nothing.
        if verb == "clear" {
            self.history = vec![ConsoleEntry::output("Console cleared.")];
            return;
        }

        self.history.push(ConsoleEntry {
            kind: EntryKind::Input,
            text: format!("{PROMPT} {cmd}"),
        });

        match self.dispatch(&verb, &parts, cmd).await {
            Ok(text) => self.history.push(ConsoleEntry::output(text)),
            Err(err) => self.history.push(ConsoleEntry {
                kind: EntryKind::Error,
                text: format!("Error: {err}"),
            }),
        }
    }

    async fn dispatch(
        &self,
        verb: &str,
        parts: &[&str],
        raw: &str,
    ) -> Result<String, CommandError> {
        match verb {
            "help" => Ok(HELP_TEXT.to_string()),

            "list" => {
                let envelope = self.bridge.invoke(tools::LIST_TABLES, json!({})).await?;
                let names = toon::table_names(envelope.first_text());
                if names.is_empty() {
                    Ok("No tables found. Try: create-sample".to_string())
                } else {
                    let bullets: Vec<String> =
                        names.iter().map(|name| format!("  \u{2022} {name}")).collect();
                    Ok(format!("Tables:\n{}", bullets.join("\n")))
                }
            }

            "get" => match parts.get(1) {
                None => Ok("Usage: get <path>".to_string()),
                Some(path) => {
                    let envelope = self
                        .bridge
                        .invoke(tools::GET, json!({ "path": path }))
                        .await?;
                    Ok(non_empty_or(envelope.first_text(), "Not found"))
                }
            },

            "put" => {
                if parts.len() < 3 {
                    return Ok("Usage: put <path> <json>".to_string());
                }
                let path = parts[1];
                let body = parts[2..].join(" ");
                // Validate before touching the bridge; a malformed body
                // surfaces the parse error and makes zero calls.
                let value: Value = serde_json::from_str(&body)?;
                self.bridge
                    .invoke(tools::PUT, json!({ "path": path, "value": value }))
                    .await?;
                Ok(format!("\u{2713} Stored at {path}"))
            }

            "delete" => match parts.get(1) {
                None => Ok("Usage: delete <path>".to_string()),
                Some(path) => {
                    self.bridge
                        .invoke(tools::DELETE, json!({ "path": path }))
                        .await?;
                    Ok(format!("\u{2713} Deleted {path}"))
                }
            },

            "describe" => match parts.get(1) {
                None => Ok("Usage: describe <table>".to_string()),
                Some(table) => {
                    let envelope = self
                        .bridge
                        .invoke(tools::DESCRIBE, json!({ "table": table }))
                        .await?;
                    Ok(non_empty_or(envelope.first_text(), "Table not found"))
                }
            },

            "query" => {
                if parts.len() < 2 {
                    return Ok("Usage: query <sql>".to_string());
                }
                let sql = parts[1..].join(" ");
                let envelope = self
                    .bridge
                    .invoke(tools::QUERY, json!({ "query": sql }))
                    .await?;
                Ok(non_empty_or(envelope.first_text(), "No results"))
            }

            "create-sample" => {
                // Strictly sequential: each put is awaited to completion, so
                // a failure leaves a deterministic prefix of applied records.
                for (path, value) in sample_records() {
                    self.bridge
                        .invoke(tools::PUT, json!({ "path": path, "value": value }))
                        .await?;
                }
                Ok(
                    "\u{2713} Created sample data: users/1, users/2, users/3, products/1, products/2"
                        .to_string(),
                )
            }

            // Anything unrecognized is tried as a query.
            _ => {
                let envelope = self
                    .bridge
                    .invoke(tools::QUERY, json!({ "query": raw }))
                    .await?;
                Ok(non_empty_or(envelope.first_text(), UNKNOWN_COMMAND))
            }
        }
    }
}

fn non_empty_or(text: &str, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

/// The five fixed records seeded by `create-sample`.
fn sample_records() -> [(&'static str, Value); 5] {
    [
        (
            "users/1",
            json!({ "id": 1, "name": "Alice", "email": "alice@example.com", "role": "admin" }),
        ),
        (
            "users/2",
            json!({ "id": 2, "name": "Bob", "email": "bob@example.com", "role": "user" }),
        ),
        (
            "users/3",
            json!({ "id": 3, "name": "Carol", "email": "carol@example.com", "role": "user" }),
        ),
        (
            "products/1",
            json!({ "id": 1, "name": "Widget", "price": 29.99, "stock": 100 }),
        ),
        (
            "products/2",
            json!({ "id": 2, "name": "Gadget", "price": 49.99, "stock": 50 }),
        ),
    ]
}
