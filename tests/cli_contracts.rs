//! CLI output contracts: JSON shapes and exit-code outcomes.

use roster::agent::AgentRegistry;
use roster::tooling::cli::{CliContext, Commands};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn make_unit(root: &Path, id: &str, module: &str) -> PathBuf {
    let dir = root.join(id);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("agent.toml");
    fs::write(&path, module).unwrap();
    path
}

fn context(temp: &TempDir) -> CliContext {
    let registry = AgentRegistry::open(temp.path().join("registry")).unwrap();
    CliContext::with_registry(registry)
}

#[test]
fn list_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    let module = make_unit(temp.path(), "echo", "[factory]\nkind = \"react\"\n");

    cli.execute(&Commands::Register {
        id: "echo".to_string(),
        module_path: module,
        name: Some("Echo".to_string()),
        description: "Echoes input".to_string(),
        agent_type: Some("worker".to_string()),
        version: None,
        tags: vec!["nlp".to_string()],
    })
    .unwrap();

    let output = cli
        .execute(&Commands::List {
            format: "json".to_string(),
            all: false,
            agent_type: None,
            tags: vec![],
        })
        .unwrap();
    assert!(output.success);

    let parsed: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(parsed.get("total").and_then(|v| v.as_u64()), Some(1));
    let agents = parsed.get("agents").and_then(|v| v.as_array()).unwrap();
    let entry = &agents[0];
    assert_eq!(entry.get("id").and_then(|v| v.as_str()), Some("echo"));
    assert_eq!(entry.get("agent_type").and_then(|v| v.as_str()), Some("worker"));
    assert_eq!(
        entry.get("health_status").and_then(|v| v.as_str()),
        Some("unknown")
    );
    assert!(entry.get("enabled").and_then(|v| v.as_bool()).unwrap());
}

#[test]
fn stats_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);

    let output = cli
        .execute(&Commands::Stats {
            format: "json".to_string(),
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    for field in ["total", "enabled", "healthy", "unhealthy", "unknown"] {
        assert!(parsed.get(field).and_then(|v| v.as_u64()).is_some(), "{}", field);
    }
    assert!(parsed.get("by_type").and_then(|v| v.as_object()).is_some());
}

#[test]
fn validate_all_json_contract_and_failure_outcome() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    let good = make_unit(temp.path(), "good", "[factory]\nkind = \"react\"\n");
    let bad = make_unit(temp.path(), "bad", "name = \"nothing\"\n");

    for (id, module) in [("good", good), ("bad", bad)] {
        cli.execute(&Commands::Register {
            id: id.to_string(),
            module_path: module,
            name: None,
            description: String::new(),
            agent_type: None,
            version: None,
            tags: vec![],
        })
        .unwrap();
    }

    let output = cli
        .execute(&Commands::ValidateAll {
            format: "json".to_string(),
        })
        .unwrap();

    // One invalid agent makes the aggregate a failure
    assert!(!output.success);

    let parsed: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(parsed.get("total").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(parsed.get("healthy").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(parsed.get("unhealthy").and_then(|v| v.as_u64()), Some(1));

    let outcomes = parsed.get("outcomes").and_then(|v| v.as_array()).unwrap();
    let bad_outcome = outcomes
        .iter()
        .find(|o| o.get("id").and_then(|v| v.as_str()) == Some("bad"))
        .unwrap();
    assert_eq!(bad_outcome.get("valid").and_then(|v| v.as_bool()), Some(false));
    assert!(bad_outcome.get("reason").and_then(|v| v.as_str()).is_some());
}

#[test]
fn validate_all_with_zero_agents_is_a_failure() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);

    let output = cli
        .execute(&Commands::ValidateAll {
            format: "text".to_string(),
        })
        .unwrap();
    assert!(!output.success);
    assert!(output.text.contains("No agents registered"));
}

#[test]
fn health_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    let module = make_unit(temp.path(), "echo", "[factory]\nkind = \"react\"\n");

    cli.execute(&Commands::Register {
        id: "echo".to_string(),
        module_path: module,
        name: None,
        description: String::new(),
        agent_type: None,
        version: None,
        tags: vec![],
    })
    .unwrap();
    cli.execute(&Commands::Validate {
        id: "echo".to_string(),
    })
    .unwrap();

    let output = cli
        .execute(&Commands::Health {
            format: "json".to_string(),
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(parsed.get("healthy").and_then(|v| v.as_u64()), Some(1));
    let entries = parsed.get("entries").and_then(|v| v.as_array()).unwrap();
    let entry = &entries[0];
    assert_eq!(entry.get("id").and_then(|v| v.as_str()), Some("echo"));
    assert_eq!(
        entry.get("health_status").and_then(|v| v.as_str()),
        Some("healthy")
    );
    assert!(entry.get("enabled").and_then(|v| v.as_bool()).is_some());
}

#[test]
fn show_json_roundtrips_full_metadata() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    let module = make_unit(temp.path(), "echo", "[factory]\nkind = \"react\"\n");

    cli.execute(&Commands::Register {
        id: "echo".to_string(),
        module_path: module,
        name: Some("Echo".to_string()),
        description: "Echoes input".to_string(),
        agent_type: None,
        version: Some("0.2.0".to_string()),
        tags: vec![],
    })
    .unwrap();

    let output = cli
        .execute(&Commands::Show {
            id: "echo".to_string(),
            format: "json".to_string(),
        })
        .unwrap();

    let metadata: roster::AgentMetadata = serde_json::from_str(&output.text).unwrap();
    assert_eq!(metadata.id, "echo");
    assert_eq!(metadata.version, "0.2.0");
    assert_eq!(metadata.invocation_count, 0);
}

#[test]
fn unregister_missing_agent_is_a_failure_outcome() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);

    let output = cli
        .execute(&Commands::Unregister {
            id: "ghost".to_string(),
        })
        .unwrap();
    assert!(!output.success);
}

#[test]
fn discover_and_record_invocation_flow() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    let agents = temp.path().join("agents");
    make_unit(&agents, "scanner", "[factory]\nkind = \"pipeline\"\n");

    let output = cli
        .execute(&Commands::Discover {
            path: Some(agents.clone()),
        })
        .unwrap();
    assert!(output.text.contains("1 agent(s)"));

    cli.execute(&Commands::RecordInvocation {
        id: "scanner".to_string(),
    })
    .unwrap();

    let metadata = cli.registry().get("scanner").unwrap();
    assert_eq!(metadata.invocation_count, 1);
    assert!(metadata.last_invoked.is_some());
}
