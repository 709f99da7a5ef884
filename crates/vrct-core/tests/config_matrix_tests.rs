//! Layered config merges across every structured format, applied for real

use std::fs;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use tempfile::TempDir;

use vrct_core::{Format, VirtualFsSession};

const JSON_DEFAULT: &str = r#"{"semi": true, "indent": 4, "env": {"browser": true}}"#;
const JSON_ESPRIMA: &str = r#"{"indent": 2, "parser": "esprima", "env": {"node": true}}"#;
const JSON_ESPRIMA_OPTIONS: &str = r#"{"ecmaVersion": 6}"#;

const YAML_DEFAULT: &str = "enabled: false\nversion: 1\n";
const YAML_FULL: &str = "enabled: true\nversion: 2\nsources:\n  - main\n";

const TOML_BASE: &str = "baseURL = \"https://example.org\"\ntitle = \"My Site\"\n\n[params]\ndescription = \"docs\"\n";
const TOML_CUSTOMIZED: &str = "title = \"Ignored\"\ntheme = \"ananke\"\n\n[params]\nauthor = \"Jan\"\n";

fn decode(content: &[u8], format: Format) -> Value {
    vrct_content::decode(content, format).unwrap()
}

#[rstest]
#[case::json_defaults_then_override(
    Format::Json,
    "eslint.json",
    vec![
        (JSON_DEFAULT, None, true),
        (JSON_ESPRIMA, Some(JSON_ESPRIMA_OPTIONS), false),
    ],
    json!({
        "semi": true,
        "indent": 2,
        "parser": "esprima",
        "env": {"browser": true, "node": true},
        "ecmaVersion": 6
    })
)]
#[case::yaml_full_overrides_defaults(
    Format::Yaml,
    "extrepo.yaml",
    vec![
        (YAML_DEFAULT, None, true),
        (YAML_FULL, None, false),
    ],
    json!({"enabled": true, "version": 2, "sources": ["main"]})
)]
#[case::toml_customization_fills_gaps(
    Format::Toml,
    "hugo.toml",
    vec![
        (TOML_BASE, None, false),
        (TOML_CUSTOMIZED, None, true),
    ],
    json!({
        "baseURL": "https://example.org",
        "title": "My Site",
        "theme": "ananke",
        "params": {"description": "docs", "author": "Jan"}
    })
)]
fn layered_configs_merge_apply_and_match(
    #[case] format: Format,
    #[case] file_name: &str,
    #[case] layers: Vec<(&str, Option<&str>, bool)>,
    #[case] expected: Value,
) {
    let base = TempDir::new().unwrap();
    let targets = TempDir::new().unwrap();
    let mut session = VirtualFsSession::with_base(base.path().join("runtime")).unwrap();
    let destination = targets.path().join("new_dir").join(file_name);

    for (content, options, is_optional) in layers {
        session
            .create_config(
                &destination,
                content.as_bytes(),
                options.map(str::as_bytes),
                is_optional,
                format,
            )
            .unwrap();
    }

    let simulated = session.read_file(&destination).unwrap();
    assert_eq!(decode(&simulated, format), expected);

    assert_eq!(session.apply(&[], false).unwrap(), None);

    let applied = fs::read(&destination).unwrap();
    assert_eq!(decode(&applied, format), expected);
    assert!(session.compare_configs(&simulated, &applied, format).unwrap());
}

#[rstest]
#[case::json(Format::Json, "app.json", r#"{"port": 1, "user": "keep"}"#, r#"{"port": 9}"#)]
#[case::yaml(Format::Yaml, "app.yaml", "port: 1\nuser: keep\n", "port: 9\n")]
#[case::toml(Format::Toml, "app.toml", "port = 1\nuser = \"keep\"\n", "port = 9\n")]
fn applying_over_an_existing_config_keeps_user_keys_and_reverts_cleanly(
    #[case] format: Format,
    #[case] file_name: &str,
    #[case] original: &str,
    #[case] layer: &str,
) {
    let base = TempDir::new().unwrap();
    let targets = TempDir::new().unwrap();
    let mut session = VirtualFsSession::with_base(base.path().join("runtime")).unwrap();
    let destination = targets.path().join(file_name);
    fs::write(&destination, original).unwrap();

    session
        .create_config(&destination, layer.as_bytes(), None, false, format)
        .unwrap();

    let id = session
        .apply(&["config-rule".to_string()], true)
        .unwrap()
        .unwrap();

    // The user's keys survive the merge, the layered key wins
    let applied = decode(&fs::read(&destination).unwrap(), format);
    assert_eq!(applied, json!({"port": 9, "user": "keep"}));

    session.revert(id, |_| Ok(())).unwrap();
    assert_eq!(fs::read_to_string(&destination).unwrap(), original);
}
