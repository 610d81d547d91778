//! Session orchestration.
//!
//! A [`Session`] bundles the shared stores with a bridge and reproduces the
//! explorer and query-workbench flows: invoke a tool, normalize the payload
//! through [`crate::toon`], push the outcome into a store. This is where
//! the caller-side sentinels live - the parser only ever reports "empty",
//! while a rejected bridge call is rendered here as `Error scanning <t>`.

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::bridge::{ToolBridge, tools};
use crate::stores::{ConnectionStore, QueryHistoryEntry, QueryStore, RecipeStore, SchemaStore};
use crate::toon::{self, ScanOutcome};

/// Records scanned per KV-explorer refresh.
const SCAN_LIMIT: u32 = 50;

pub struct Session<B> {
    bridge: B,
    pub query: QueryStore,
    pub schema: SchemaStore,
    pub connections: ConnectionStore,
    pub recipes: RecipeStore,
}

impl<B: ToolBridge> Session<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            query: QueryStore::default(),
            schema: SchemaStore::default(),
            connections: ConnectionStore::default(),
            recipes: RecipeStore::default(),
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Reload the table list into the schema store. A failure logs and
    /// leaves the store untouched.
    pub async fn refresh_tables(&self) -> Vec<String> {
        match self.bridge.invoke(tools::LIST_TABLES, json!({})).await {
            Ok(envelope) => {
                let names = toon::table_names(envelope.first_text());
                self.schema.set_tables(names.clone());
                names
            }
            Err(err) => {
                warn!("failed to load tables: {err}");
                Vec::new()
            }
        }
    }

    /// Scan a table's keys for the KV explorer. The returned lines are
    /// display-ready: qualified paths, or a single sentinel line for the
    /// zero-record and bridge-failure cases.
    pub async fn scan_table(&self, table: &str) -> Vec<String> {
        if table.is_empty() {
            return Vec::new();
        }
        let arguments = json!({
            "query": format!("SELECT * FROM {table}"),
            "limit": SCAN_LIMIT,
            "format": "json",
        });
        match self.bridge.invoke(tools::QUERY, arguments).await {
            Ok(envelope) => match toon::scan_keys(envelope.first_text(), table) {
                ScanOutcome::Keys(keys) => keys,
                ScanOutcome::Empty => vec![format!("No records in {table}")],
            },
            Err(_) => vec![format!("Error scanning {table}")],
        }
    }

    /// Fetch the value stored at a key. Falls back to the raw envelope when
    /// the first block carries no text, and renders rejections inline.
    pub async fn read_key(&self, path: &str) -> String {
        match self.bridge.invoke(tools::GET, json!({ "path": path })).await {
            Ok(envelope) => {
                let text = envelope.first_text();
                if text.is_empty() {
                    serde_json::to_string_pretty(&envelope).unwrap_or_default()
                } else {
                    text.to_string()
                }
            }
            Err(err) => format!("Error: {err}"),
        }
    }

    /// Execute a query for the workbench: result and error land in the
    /// query store, and both outcomes are recorded in its history.
    pub async fn run_query(&self, text: &str) {
        self.query.set_query(text);
        self.query.set_executing(true);
        self.query.set_error(None);

        match self.bridge.invoke(tools::QUERY, json!({ "query": text })).await {
            Ok(envelope) => {
                let set = toon::row_set(envelope.first_text());
                self.query.push_history(QueryHistoryEntry {
                    query: text.to_string(),
                    timestamp: Utc::now(),
                    row_count: set.row_count(),
                    success: true,
                });
                self.query.set_result(Some(set));
            }
            Err(err) => {
                self.query.set_error(Some(err.to_string()));
                self.query.push_history(QueryHistoryEntry {
                    query: text.to_string(),
                    timestamp: Utc::now(),
                    row_count: 0,
                    success: false,
                });
            }
        }

        self.query.set_executing(false);
    }
}
