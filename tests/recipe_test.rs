use confspawn::error::Error;
use confspawn::recipe::{plan_targets, run_recipe, RecipeOptions, RecipeSpec};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn spec(value: serde_json::Value) -> RecipeSpec {
    RecipeSpec::from_value(value).unwrap()
}

#[test]
fn test_recipe_requires_config_and_sources() {
    let cases = [
        json!({"sources": [{"source": "a", "target": "b", "env": "dev"}]}),
        json!({"config": "c.toml"}),
        json!({"config": "c.toml", "sources": []}),
        json!({"config": "c.toml", "sources": "a"}),
        json!({"config": "c.toml", "sources": [{"target": "b"}]}),
        json!({"config": "c.toml", "sources": [{"source": "a"}]}),
        json!(["not", "a", "mapping"]),
    ];

    for case in cases {
        let result = RecipeSpec::from_value(case.clone());
        assert!(matches!(result, Err(Error::ValidationError(_))), "{case}");
    }
}

#[test]
fn test_recurse_defaults_to_false() {
    let spec = spec(json!({
        "config": "c.toml",
        "sources": [{"source": "a", "target": "b", "env": "dev"}]
    }));
    assert!(!spec.sources[0].recurse);
    assert_eq!(spec.sources[0].env.as_deref(), Some("dev"));
}

#[test]
fn test_shared_target_with_different_envs_is_rejected() {
    let spec = spec(json!({
        "config": "c.toml",
        "sources": [
            {"source": "shared", "target": "out", "env": "prod"},
            {"source": "extra", "target": "out", "env": "dev"}
        ]
    }));

    assert!(matches!(plan_targets(&spec, None), Err(Error::ValidationError(_))));

    // An override makes both entries agree.
    let jobs = plan_targets(&spec, Some("staging")).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].env, "staging");
    assert_eq!(jobs[0].sources.len(), 2);
}

#[test]
fn test_env_required_without_override() {
    let spec = spec(json!({
        "config": "c.toml",
        "sources": [{"source": "a", "target": "b"}]
    }));
    assert!(matches!(plan_targets(&spec, None), Err(Error::ValidationError(_))));
    assert_eq!(plan_targets(&spec, Some("dev")).unwrap()[0].env, "dev");
}

#[test]
fn test_targets_grouped_in_order() {
    let spec = spec(json!({
        "config": "c.toml",
        "sources": [
            {"source": "a", "target": "one", "env": "dev"},
            {"source": "b", "target": "two", "env": "prod", "recurse": true},
            {"source": "c", "target": "one", "env": "dev"}
        ]
    }));

    let jobs = plan_targets(&spec, None).unwrap();
    let targets: Vec<_> = jobs.iter().map(|job| job.target.clone()).collect();
    assert_eq!(targets, vec![PathBuf::from("one"), PathBuf::from("two")]);
    assert_eq!(jobs[0].sources.len(), 2);
    assert!(jobs[1].sources[0].recurse);
}

#[test]
fn test_mismatched_envs_fail_before_touching_filesystem() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("settings.toml"), "[confspawn_env.prod]\nx = 1\n");
    write(&root.join("shared/confspawn_a.conf"), "a");
    write(&root.join("extra/confspawn_b.conf"), "b");
    write(&root.join("out/previous.txt"), "previous");
    write(
        &root.join("recipe.toml"),
        r#"
config = "settings.toml"

[[sources]]
source = "shared"
target = "out"
env = "prod"

[[sources]]
source = "extra"
target = "out"
env = "dev"
"#,
    );

    let result = run_recipe(root.join("recipe.toml"), &RecipeOptions::default());
    assert!(matches!(result, Err(Error::ValidationError(_))));
    assert_eq!(fs::read_to_string(root.join("out/previous.txt")).unwrap(), "previous");
}

#[test_log::test]
fn test_run_recipe() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        &root.join("settings.toml"),
        r#"
[app]
name = "demo"

[confspawn_env.prod]
db = "prod-db"

[confspawn_env.dev]
db = "dev-db"
"#,
    );
    write(&root.join("shared/confspawn_app.conf"), "name=~spwn~app.name~spwn~\n");
    write(&root.join("shared/nested/logging.conf"), "level=info\n");
    write(&root.join("prod/confspawn_db.conf"), "db=~spwn~confspawn_env.db~spwn~\n");
    write(&root.join("dev/confspawn_db.conf"), "db=~spwn~confspawn_env.db~spwn~\n");
    write(
        &root.join("recipe.toml"),
        r#"
config = "settings.toml"

[[sources]]
source = "shared"
target = "build/prod"
env = "prod"
recurse = true

[[sources]]
source = "prod"
target = "build/prod"
env = "prod"

[[sources]]
source = "dev"
target = "build/dev"
env = "dev"
"#,
    );

    let reports = run_recipe(root.join("recipe.toml"), &RecipeOptions::default()).unwrap();
    assert_eq!(reports.len(), 2);

    let prod = root.join("build/prod");
    assert_eq!(fs::read_to_string(prod.join("app.conf")).unwrap(), "name=demo\n");
    assert_eq!(fs::read_to_string(prod.join("db.conf")).unwrap(), "db=prod-db\n");
    assert_eq!(fs::read_to_string(prod.join("nested/logging.conf")).unwrap(), "level=info\n");
    assert_eq!(fs::read_to_string(root.join("build/dev/db.conf")).unwrap(), "db=dev-db\n");

    let overridden = RecipeOptions { env_override: Some("dev".to_string()), ..RecipeOptions::default() };
    run_recipe(root.join("recipe.toml"), &overridden).unwrap();
    assert_eq!(fs::read_to_string(prod.join("db.conf")).unwrap(), "db=dev-db\n");
}

#[test]
fn test_recipe_file_is_not_copied() {
    let temp_dir = TempDir::new().unwrap();
    let conf = temp_dir.path().join("conf");
    write(&conf.join("settings.toml"), "[app]\nname = \"demo\"\n");
    write(&conf.join("confspawn_app.conf"), "name=~spwn~app.name~spwn~");
    write(&conf.join("notes.txt"), "notes");
    write(
        &conf.join("recipe.toml"),
        "config = \"settings.toml\"\n\n[[sources]]\nsource = \".\"\ntarget = \"../out\"\nenv = \"dev\"\n",
    );

    run_recipe(conf.join("recipe.toml"), &RecipeOptions::default()).unwrap();

    let out = temp_dir.path().join("out");
    assert_eq!(fs::read_to_string(out.join("app.conf")).unwrap(), "name=demo");
    assert!(out.join("notes.txt").exists());
    assert!(!out.join("recipe.toml").exists());
}

#[test]
fn test_recipe_collision_aborts_before_any_target() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("settings.toml"), "x = 1\n");
    write(&root.join("a/file.txt"), "a");
    write(&root.join("b/file.txt"), "b");
    write(&root.join("c/other.txt"), "c");
    write(&root.join("first/keep.txt"), "keep");
    write(
        &root.join("recipe.yaml"),
        "config: settings.toml\nsources:\n  - {source: c, target: first, env: dev}\n  - {source: a, target: second, env: dev}\n  - {source: b, target: second, env: dev}\n",
    );

    let result = run_recipe(root.join("recipe.yaml"), &RecipeOptions::default());
    assert!(matches!(result, Err(Error::CollisionError { .. })));
    assert!(root.join("first/keep.txt").exists());
}

#[test]
fn test_recipe_env_selects_the_rendered_section() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("settings.toml"), "[default.nested]\ncoolenv = \"indeedenv\"\n");
    write(&root.join("templates/confspawn_app.conf"), "value=~spwn~coolenv~spwn~\n");
    write(
        &root.join("recipe.toml"),
        "config = \"settings.toml\"\n\n[[sources]]\nsource = \"templates\"\ntarget = \"out\"\nenv = \"default.nested\"\n",
    );

    run_recipe(root.join("recipe.toml"), &RecipeOptions::default()).unwrap();
    assert_eq!(fs::read_to_string(root.join("out/app.conf")).unwrap(), "value=indeedenv\n");
}

#[test]
fn test_recipe_unknown_view_fails_before_any_target() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("settings.toml"), "[app]\nname = \"demo\"\n");
    write(&root.join("a/file.txt"), "a");
    write(&root.join("first/keep.txt"), "keep");
    write(
        &root.join("recipe.yaml"),
        "config: settings.toml\nsources:\n  - {source: a, target: first, env: dev}\n  - {source: a, target: second, env: dev, view: missing}\n",
    );

    let result = run_recipe(root.join("recipe.yaml"), &RecipeOptions::default());
    assert!(matches!(result, Err(Error::ValidationError(_))));
    assert!(root.join("first/keep.txt").exists());
}

#[test]
fn test_target_of_one_entry_cannot_be_source_of_another() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("settings.toml"), "x = 1\n");
    write(&root.join("a/file.txt"), "a");
    write(&root.join("shared/precious.txt"), "precious");
    write(
        &root.join("recipe.yaml"),
        "config: settings.toml\nsources:\n  - {source: a, target: shared, env: dev}\n  - {source: shared, target: out, env: dev}\n",
    );

    let result = run_recipe(root.join("recipe.yaml"), &RecipeOptions::default());
    assert!(matches!(result, Err(Error::ValidationError(_))));
    assert_eq!(fs::read_to_string(root.join("shared/precious.txt")).unwrap(), "precious");
    assert!(!root.join("out").exists());
}

#[test]
fn test_target_inside_another_recursive_source_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(&root.join("settings.toml"), "x = 1\n");
    write(&root.join("a/file.txt"), "a");
    write(&root.join("tree/file.txt"), "tree");
    write(
        &root.join("recipe.yaml"),
        "config: settings.toml\nsources:\n  - {source: a, target: tree/generated, env: dev}\n  - {source: tree, target: out, env: dev, recurse: true}\n",
    );

    let result = run_recipe(root.join("recipe.yaml"), &RecipeOptions::default());
    assert!(matches!(result, Err(Error::ValidationError(_))));
    assert!(!root.join("tree/generated").exists());
}
