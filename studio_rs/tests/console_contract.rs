//! Contract tests for the console interpreter and the session flows,
//! driven through a scripted in-memory bridge.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{Value, json};

use soch_studio::session::Session;
use soch_studio::{BridgeError, Console, EntryKind, ToolBridge};
use soch_wire::ToolEnvelope;

/// Bridge stub that replays a fixed response script and records every
/// invocation it receives.
#[derive(Default)]
struct ScriptedBridge {
    calls: Mutex<Vec<(String, Value)>>,
    script: Mutex<VecDeque<Result<ToolEnvelope, BridgeError>>>,
}

impl ScriptedBridge {
    fn new(script: Vec<Result<ToolEnvelope, BridgeError>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(script.into()),
        }
    }

    fn replying(text: &str) -> Self {
        Self::new(vec![Ok(ToolEnvelope::text(text))])
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolBridge for ScriptedBridge {
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<ToolEnvelope, BridgeError> {
        self.calls
            .lock()
            .unwrap()
            .push((tool.to_string(), arguments));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ToolEnvelope::text("")))
    }
}

fn texts(console: &Console<ScriptedBridge>) -> Vec<&str> {
    console.history().iter().map(|e| e.text.as_str()).collect()
}

mod console_verbs {
    use super::*;

    #[tokio::test]
    async fn opens_with_welcome_banner() {
        let console = Console::new(ScriptedBridge::default());
        assert_eq!(console.history().len(), 1);
        assert_eq!(
            console.history()[0].text,
            "Welcome to SochDB Console. Type 'help' for available commands."
        );
        assert_eq!(console.history()[0].kind, EntryKind::Output);
    }

    #[tokio::test]
    async fn help_is_answered_locally() {
        let mut console = Console::new(ScriptedBridge::default());
        console.execute("help").await;

        assert!(console.bridge().calls().is_empty());
        let last = console.history().last().unwrap();
        assert_eq!(last.kind, EntryKind::Output);
        assert!(last.text.starts_with("Available commands:"));
        assert!(last.text.contains("put <path> <json>"));
    }

    #[tokio::test]
    async fn input_is_echoed_with_prompt() {
        let mut console = Console::new(ScriptedBridge::replying("users\n"));
        console.execute("  list  ").await;

        let echo = &console.history()[1];
        assert_eq!(echo.kind, EntryKind::Input);
        assert_eq!(echo.text, "sochdb> list");
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let mut console = Console::new(ScriptedBridge::default());
        console.execute("   \t  ").await;

        assert_eq!(console.history().len(), 1);
        assert!(console.bridge().calls().is_empty());
    }

    #[tokio::test]
    async fn list_renders_bullets() {
        let mut console = Console::new(ScriptedBridge::replying("users\nproducts\n"));
        console.execute("list").await;

        let calls = console.bridge().calls();
        assert_eq!(calls, vec![("sochdb_list_tables".to_string(), json!({}))]);
        assert_eq!(
            console.history().last().unwrap().text,
            "Tables:\n  \u{2022} users\n  \u{2022} products"
        );
    }

    #[tokio::test]
    async fn list_with_no_tables_suggests_create_sample() {
        let mut console = Console::new(ScriptedBridge::replying(""));
        console.execute("list").await;

        assert_eq!(
            console.history().last().unwrap().text,
            "No tables found. Try: create-sample"
        );
    }

    #[tokio::test]
    async fn get_without_path_is_usage_not_a_call() {
        let mut console = Console::new(ScriptedBridge::default());
        console.execute("get").await;

        assert!(console.bridge().calls().is_empty());
        let last = console.history().last().unwrap();
        assert_eq!(last.kind, EntryKind::Output);
        assert_eq!(last.text, "Usage: get <path>");
    }

    #[tokio::test]
    async fn get_passes_path_and_renders_payload() {
        let mut console = Console::new(ScriptedBridge::replying(r#"{"name":"Alice"}"#));
        console.execute("get users/1").await;

        assert_eq!(
            console.bridge().calls(),
            vec![("sochdb_get".to_string(), json!({ "path": "users/1" }))]
        );
        assert_eq!(console.history().last().unwrap().text, r#"{"name":"Alice"}"#);
    }

    #[tokio::test]
    async fn get_with_empty_payload_says_not_found() {
        let mut console = Console::new(ScriptedBridge::replying(""));
        console.execute("get users/404").await;

        assert_eq!(console.history().last().unwrap().text, "Not found");
    }

    #[tokio::test]
    async fn put_validates_json_before_any_call() {
        let mut console = Console::new(ScriptedBridge::default());
        console.execute("put a/1 not-json").await;

        assert!(console.bridge().calls().is_empty());
        let last = console.history().last().unwrap();
        assert_eq!(last.kind, EntryKind::Error);
        assert!(last.text.starts_with("Error: "));
    }

    #[tokio::test]
    async fn put_joins_body_and_confirms() {
        let mut console = Console::new(ScriptedBridge::replying("ok"));
        console.execute(r#"put users/9 {"name": "Zed"}"#).await;

        assert_eq!(
            console.bridge().calls(),
            vec![(
                "sochdb_put".to_string(),
                json!({ "path": "users/9", "value": { "name": "Zed" } })
            )]
        );
        assert_eq!(
            console.history().last().unwrap().text,
            "\u{2713} Stored at users/9"
        );
    }

    #[tokio::test]
    async fn put_without_body_is_usage() {
        let mut console = Console::new(ScriptedBridge::default());
        console.execute("put users/9").await;

        assert!(console.bridge().calls().is_empty());
        assert_eq!(
            console.history().last().unwrap().text,
            "Usage: put <path> <json>"
        );
    }

    #[tokio::test]
    async fn delete_confirms_with_path() {
        let mut console = Console::new(ScriptedBridge::replying("ok"));
        console.execute("delete users/9").await;

        assert_eq!(
            console.bridge().calls(),
            vec![("sochdb_delete".to_string(), json!({ "path": "users/9" }))]
        );
        assert_eq!(
            console.history().last().unwrap().text,
            "\u{2713} Deleted users/9"
        );
    }

    #[tokio::test]
    async fn describe_with_empty_payload_says_table_not_found() {
        let mut console = Console::new(ScriptedBridge::replying(""));
        console.execute("describe ghosts").await;

        assert_eq!(
            console.bridge().calls(),
            vec![("sochdb_describe".to_string(), json!({ "table": "ghosts" }))]
        );
        assert_eq!(console.history().last().unwrap().text, "Table not found");
    }

    #[tokio::test]
    async fn query_joins_remaining_words() {
        let mut console = Console::new(ScriptedBridge::replying("results[1]{id}:\n1"));
        console.execute("query SELECT * FROM users").await;

        assert_eq!(
            console.bridge().calls(),
            vec![(
                "sochdb_query".to_string(),
                json!({ "query": "SELECT * FROM users" })
            )]
        );
        assert_eq!(
            console.history().last().unwrap().text,
            "results[1]{id}:\n1"
        );
    }

    #[tokio::test]
    async fn bridge_rejection_becomes_error_entry() {
        let bridge = ScriptedBridge::new(vec![Err(BridgeError::Rejected(
            "table users does not exist".to_string(),
        ))]);
        let mut console = Console::new(bridge);
        console.execute("query SELECT * FROM users").await;

        let last = console.history().last().unwrap();
        assert_eq!(last.kind, EntryKind::Error);
        assert_eq!(last.text, "Error: table users does not exist");
    }

    #[tokio::test]
    async fn unknown_words_are_tried_as_a_query() {
        let mut console = Console::new(ScriptedBridge::replying(""));
        console.execute("frobnicate the database").await;

        assert_eq!(
            console.bridge().calls(),
            vec![(
                "sochdb_query".to_string(),
                json!({ "query": "frobnicate the database" })
            )]
        );
        assert_eq!(
            console.history().last().unwrap().text,
            "Unknown command. Type \"help\" for available commands."
        );
    }

    #[tokio::test]
    async fn clear_replaces_the_whole_log() {
        let mut console = Console::new(ScriptedBridge::replying("users\n"));
        console.execute("list").await;
        assert!(console.history().len() > 1);

        console.execute("clear").await;
        assert_eq!(texts(&console), vec!["Console cleared."]);
        assert_eq!(console.history()[0].kind, EntryKind::Output);
    }

    #[tokio::test]
    async fn create_sample_seeds_five_records_in_order() {
        let script = (0..5).map(|_| Ok(ToolEnvelope::text("ok"))).collect();
        let mut console = Console::new(ScriptedBridge::new(script));
        console.execute("create-sample").await;

        let calls = console.bridge().calls();
        assert_eq!(calls.len(), 5);
        let paths: Vec<&str> = calls
            .iter()
            .map(|(tool, args)| {
                assert_eq!(tool, "sochdb_put");
                args["path"].as_str().unwrap()
            })
            .collect();
        assert_eq!(
            paths,
            vec!["users/1", "users/2", "users/3", "products/1", "products/2"]
        );
        assert_eq!(calls[0].1["value"]["name"], json!("Alice"));
        assert_eq!(calls[3].1["value"]["price"], json!(29.99));
        assert_eq!(
            console.history().last().unwrap().text,
            "\u{2713} Created sample data: users/1, users/2, users/3, products/1, products/2"
        );
    }

    #[tokio::test]
    async fn create_sample_stops_at_first_failure() {
        let script = vec![
            Ok(ToolEnvelope::text("ok")),
            Ok(ToolEnvelope::text("ok")),
            Err(BridgeError::Rejected("disk full".to_string())),
        ];
        let mut console = Console::new(ScriptedBridge::new(script));
        console.execute("create-sample").await;

        // Two applied, one rejected, nothing after the rejection.
        let calls = console.bridge().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].1["path"], json!("users/3"));

        let last = console.history().last().unwrap();
        assert_eq!(last.kind, EntryKind::Error);
        assert_eq!(last.text, "Error: disk full");
    }
}

mod session_flows {
    use super::*;

    #[tokio::test]
    async fn refresh_tables_fills_the_schema_store() {
        let session = Session::new(ScriptedBridge::replying("users\nproducts\n"));
        let names = session.refresh_tables().await;

        assert_eq!(names, vec!["users", "products"]);
        assert_eq!(session.schema.snapshot().tables, vec!["users", "products"]);
        assert_eq!(
            session.schema.snapshot().selected_table.as_deref(),
            Some("users")
        );
    }

    #[tokio::test]
    async fn refresh_tables_swallows_rejections() {
        let session = Session::new(ScriptedBridge::new(vec![Err(BridgeError::Transport(
            "broken pipe".to_string(),
        ))]));
        let names = session.refresh_tables().await;

        assert!(names.is_empty());
        assert!(session.schema.snapshot().tables.is_empty());
    }

    #[tokio::test]
    async fn scan_table_builds_the_limited_query() {
        let session = Session::new(ScriptedBridge::replying(
            "results[2]{id,name}:\n1,Alice\n2,Bob",
        ));
        let keys = session.scan_table("users").await;

        assert_eq!(
            session.bridge().calls(),
            vec![(
                "sochdb_query".to_string(),
                json!({
                    "query": "SELECT * FROM users",
                    "limit": 50,
                    "format": "json",
                })
            )]
        );
        assert_eq!(keys, vec!["/users/1", "/users/2"]);
    }

    #[tokio::test]
    async fn scan_table_sentinels_zero_records() {
        let session = Session::new(ScriptedBridge::replying("results[0]{}:"));
        let keys = session.scan_table("users").await;
        assert_eq!(keys, vec!["No records in users"]);
    }

    #[tokio::test]
    async fn scan_table_sentinels_rejections() {
        let session = Session::new(ScriptedBridge::new(vec![Err(BridgeError::Rejected(
            "nope".to_string(),
        ))]));
        let keys = session.scan_table("users").await;
        assert_eq!(keys, vec!["Error scanning users"]);
    }

    #[tokio::test]
    async fn scan_table_with_empty_name_makes_no_call() {
        let session = Session::new(ScriptedBridge::default());
        let keys = session.scan_table("").await;
        assert!(keys.is_empty());
        assert!(session.bridge().calls().is_empty());
    }

    #[tokio::test]
    async fn run_query_records_success_in_store_and_history() {
        let session = Session::new(ScriptedBridge::replying(
            "results[2]{id,name}:\n1,Alice\n2,Bob",
        ));
        session.run_query("SELECT * FROM users").await;

        let state = session.query.snapshot();
        assert!(!state.is_executing);
        assert!(state.error.is_none());
        let result = state.result.as_ref().unwrap();
        assert_eq!(result.columns, vec!["id", "name"]);
        assert_eq!(result.row_count(), 2);

        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].query, "SELECT * FROM users");
        assert_eq!(state.history[0].row_count, 2);
        assert!(state.history[0].success);
    }

    #[tokio::test]
    async fn run_query_records_failure_without_clobbering_result() {
        let session = Session::new(ScriptedBridge::new(vec![
            Ok(ToolEnvelope::text("results[1]{id}:\n1")),
            Err(BridgeError::Rejected("syntax error near FORM".to_string())),
        ]));
        session.run_query("SELECT * FROM users").await;
        session.run_query("SELECT * FORM users").await;

        let state = session.query.snapshot();
        assert!(!state.is_executing);
        assert_eq!(state.error.as_deref(), Some("syntax error near FORM"));
        // The previous result stays visible under the error banner.
        assert!(state.result.is_some());

        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].query, "SELECT * FORM users");
        assert!(!state.history[0].success);
        assert!(state.history[1].success);
    }

    #[tokio::test]
    async fn read_key_falls_back_to_raw_envelope() {
        let session = Session::new(ScriptedBridge::new(vec![Ok(ToolEnvelope {
            content: vec![],
            is_error: None,
        })]));
        let text = session.read_key("users/1").await;
        assert!(text.contains("\"content\""));
    }

    #[tokio::test]
    async fn read_key_renders_rejections_inline() {
        let session = Session::new(ScriptedBridge::new(vec![Err(BridgeError::Rejected(
            "key not found".to_string(),
        ))]));
        let text = session.read_key("users/404").await;
        assert_eq!(text, "Error: key not found");
    }
}
