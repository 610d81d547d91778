//! Concrete shared stores.
//!
//! Each store is a [`Store`] of one immutable state struct; mutators are
//! inherent methods that rebuild the state copy-on-write, so views can
//! compare snapshots by identity. These hold the studio-wide state: the
//! query workbench, the schema tree, connections, and context recipes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Store;
use crate::toon::RowSet;

/// Most recent entries kept per query history.
const HISTORY_CAP: usize = 50;

// ---------------------------------------------------------------------------
// Query workbench
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryHistoryEntry {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub row_count: usize,
    pub success: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryState {
    pub query: String,
    pub result: Option<RowSet>,
    pub is_executing: bool,
    pub error: Option<String>,
    /// Newest first, capped at [`HISTORY_CAP`].
    pub history: Vec<QueryHistoryEntry>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            query: "SELECT * FROM users LIMIT 100".to_string(),
            result: None,
            is_executing: false,
            error: None,
            history: Vec::new(),
        }
    }
}

pub type QueryStore = Store<QueryState>;

impl Store<QueryState> {
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update(|state| QueryState {
            query: query.clone(),
            ..state.clone()
        });
    }

    pub fn set_result(&self, result: Option<RowSet>) {
        self.update(|state| QueryState {
            result: result.clone(),
            ..state.clone()
        });
    }

    pub fn set_executing(&self, is_executing: bool) {
        self.update(|state| QueryState {
            is_executing,
            ..state.clone()
        });
    }

    pub fn set_error(&self, error: Option<String>) {
        self.update(|state| QueryState {
            error: error.clone(),
            ..state.clone()
        });
    }

    /// Prepend an entry, dropping the oldest beyond the cap.
    pub fn push_history(&self, entry: QueryHistoryEntry) {
        self.update(|state| {
            let mut history = Vec::with_capacity(state.history.len().min(HISTORY_CAP - 1) + 1);
            history.push(entry.clone());
            history.extend(state.history.iter().take(HISTORY_CAP - 1).cloned());
            QueryState {
                history,
                ..state.clone()
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Schema tree
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct SchemaState {
    pub tables: Vec<String>,
    pub selected_table: Option<String>,
    pub expanded_nodes: Vec<String>,
}

impl Default for SchemaState {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            selected_table: None,
            expanded_nodes: vec!["tables".to_string(), "indexes".to_string()],
        }
    }
}

pub type SchemaStore = Store<SchemaState>;

impl Store<SchemaState> {
    pub fn set_tables(&self, tables: Vec<String>) {
        self.update(|state| {
            // Keep the selection when it survives the refresh; otherwise
            // default to the first table.
            let selected_table = state
                .selected_table
                .as_ref()
                .filter(|table| tables.contains(table))
                .cloned()
                .or_else(|| tables.first().cloned());
            SchemaState {
                tables: tables.clone(),
                selected_table,
                ..state.clone()
            }
        });
    }

    pub fn select_table(&self, table: impl Into<String>) {
        let table = table.into();
        self.update(|state| SchemaState {
            selected_table: Some(table.clone()),
            ..state.clone()
        });
    }

    pub fn toggle_node(&self, node: &str) {
        self.update(|state| {
            let mut expanded_nodes = state.expanded_nodes.clone();
            if let Some(pos) = expanded_nodes.iter().position(|n| n == node) {
                expanded_nodes.remove(pos);
            } else {
                expanded_nodes.push(node.to_string());
            }
            SchemaState {
                expanded_nodes,
                ..state.clone()
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Connecting,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub name: String,
    pub path: String,
    pub status: ConnectionStatus,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionsState {
    pub connections: Vec<Connection>,
    pub active_id: Option<String>,
}

impl ConnectionsState {
    pub fn active(&self) -> Option<&Connection> {
        let id = self.active_id.as_ref()?;
        self.connections.iter().find(|conn| &conn.id == id)
    }
}

pub type ConnectionStore = Store<ConnectionsState>;

impl Store<ConnectionsState> {
    pub fn set_active(&self, id: impl Into<String>) {
        let id = id.into();
        self.update(|state| ConnectionsState {
            active_id: Some(id.clone()),
            ..state.clone()
        });
    }

    pub fn add_connection(&self, connection: Connection) {
        self.update(|state| {
            let mut connections = state.connections.clone();
            connections.push(connection.clone());
            ConnectionsState {
                connections,
                ..state.clone()
            }
        });
    }

    /// Remove a connection; if it was active, fall back to the first
    /// remaining one.
    pub fn remove_connection(&self, id: &str) {
        self.update(|state| {
            let connections: Vec<Connection> = state
                .connections
                .iter()
                .filter(|conn| conn.id != id)
                .cloned()
                .collect();
            let active_id = match &state.active_id {
                Some(active) if active == id => connections.first().map(|conn| conn.id.clone()),
                other => other.clone(),
            };
            ConnectionsState {
                connections,
                active_id,
            }
        });
    }

    pub fn set_status(&self, id: &str, status: ConnectionStatus) {
        self.update(|state| {
            let connections = state
                .connections
                .iter()
                .map(|conn| {
                    if conn.id == id {
                        Connection {
                            status,
                            ..conn.clone()
                        }
                    } else {
                        conn.clone()
                    }
                })
                .collect();
            ConnectionsState {
                connections,
                ..state.clone()
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Context recipes
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextRecipe {
    pub id: String,
    pub name: String,
    pub version: String,
    pub tags: Vec<String>,
    pub token_budget: u32,
    pub query_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecipeState {
    pub recipes: Vec<ContextRecipe>,
}

impl RecipeState {
    pub fn get(&self, id: &str) -> Option<&ContextRecipe> {
        self.recipes.iter().find(|recipe| recipe.id == id)
    }
}

pub type RecipeStore = Store<RecipeState>;

impl Store<RecipeState> {
    pub fn add_recipe(&self, recipe: ContextRecipe) {
        self.update(|state| {
            let mut recipes = state.recipes.clone();
            recipes.push(recipe.clone());
            RecipeState { recipes }
        });
    }

    /// Replace the recipe with the same id, bumping `updated_at`.
    pub fn update_recipe(&self, recipe: ContextRecipe) {
        self.update(|state| {
            let recipes = state
                .recipes
                .iter()
                .map(|existing| {
                    if existing.id == recipe.id {
                        ContextRecipe {
                            updated_at: Utc::now(),
                            ..recipe.clone()
                        }
                    } else {
                        existing.clone()
                    }
                })
                .collect();
            RecipeState { recipes }
        });
    }

    pub fn remove_recipe(&self, id: &str) {
        self.update(|state| RecipeState {
            recipes: state
                .recipes
                .iter()
                .filter(|recipe| recipe.id != id)
                .cloned()
                .collect(),
        });
    }
}
