use super::*;
use crate::cli::KeyPolicyArgs;
use crate::config::model::{Config, ConfigDiagnostic, Defaults};
use crate::config::{AppDirectories, LoadedConfig};
use crate::store::{MemoryBackend, StoreData};
use assert_fs::TempDir;
use clap::Parser;
use std::path::Path;
use time::macros::datetime;
use toml::Value;

fn loaded_with(dir: &Path, config: Config) -> LoadedConfig {
    LoadedConfig {
        config,
        merged: Value::Table(toml::map::Map::new()),
        directories: AppDirectories {
            config_dir: dir.to_path_buf(),
        },
        sources: Vec::new(),
        diagnostics: Vec::new(),
    }
}

fn app<'a>(cli: &'a Cli, dir: &Path) -> App<'a, MemoryBackend> {
    App::with_store(cli, loaded_with(dir, Config::default()), ProfileStore::in_memory())
}

fn cli() -> Cli {
    Cli::parse_from(["ccx"])
}

fn create_cmd(name: &str, base_url: Option<&str>) -> CreateCommand {
    CreateCommand {
        name: name.into(),
        base_url: base_url.map(str::to_string),
        ..CreateCommand::default()
    }
}

fn app_error(err: &color_eyre::Report) -> &AppError {
    err.downcast_ref::<AppError>()
        .unwrap_or_else(|| panic!("expected AppError, got {err:?}"))
}

fn stored_profile(name: &str) -> Profile {
    let mut profile = Profile::new(name, "https://api.example.com");
    profile.api_key = Some("sk-secret".into());
    profile.created_at = datetime!(2025-01-01 00:00:00 UTC);
    profile.updated_at = profile.created_at;
    profile
}

#[test]
fn create_then_duplicate_is_conflict() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());

    app.create(&create_cmd("work", Some("https://api.example.com")))?;
    let stored = app.store.profile("work")?.expect("created");
    assert_eq!(stored.provider, "custom");
    assert!(stored.clear_anthropic_key);

    let err = app
        .create(&create_cmd("work", Some("https://other.example.com")))
        .expect_err("duplicate");
    assert!(matches!(app_error(&err), AppError::AlreadyExists { name } if name == "work"));
    assert_eq!(
        app.store.profile("work")?.map(|p| p.base_url),
        Some("https://api.example.com".to_string())
    );
    Ok(())
}

#[test]
fn create_rejects_bad_name_and_missing_url() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());

    let err = app
        .create(&create_cmd("my profile", Some("https://x")))
        .expect_err("space in name");
    assert!(matches!(app_error(&err), AppError::Validation(_)));

    let err = app.create(&create_cmd("work", None)).expect_err("no url");
    assert!(matches!(app_error(&err), AppError::Validation(_)));
    assert!(app.store.profiles()?.is_empty());
    Ok(())
}

#[test]
fn create_from_template_lets_flags_win() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());

    let cmd = CreateCommand {
        name: "ds".into(),
        template: Some("deepseek".into()),
        model: Some("deepseek-reasoner".into()),
        api_key: Some("sk-ds".into()),
        key_policy: KeyPolicyArgs {
            clear_key: false,
            keep_key: true,
        },
        env: vec![("API_TIMEOUT_MS".into(), "600000".into())],
        ..CreateCommand::default()
    };
    app.create(&cmd)?;

    let profile = app.store.profile("ds")?.expect("created");
    assert_eq!(profile.provider, "deepseek");
    assert_eq!(profile.base_url, "https://api.deepseek.com/anthropic");
    assert_eq!(profile.model.as_deref(), Some("deepseek-reasoner"));
    assert_eq!(profile.api_key.as_deref(), Some("sk-ds"));
    assert!(!profile.clear_anthropic_key);
    assert_eq!(profile.extra_env["API_TIMEOUT_MS"], "600000");
    Ok(())
}

#[test]
fn create_with_unknown_template_lists_available() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());

    let cmd = CreateCommand {
        name: "x".into(),
        template: Some("nope".into()),
        ..CreateCommand::default()
    };
    let err = app.create(&cmd).expect_err("unknown template");
    match app_error(&err) {
        AppError::UnknownTemplate { name, available } => {
            assert_eq!(name, "nope");
            assert!(available.contains("openrouter"), "{available}");
        }
        other => panic!("unexpected {other:?}"),
    }
    Ok(())
}

#[test]
fn configured_templates_are_available_to_create() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut config = Config::default();
    config.templates.insert(
        "corp".into(),
        ProviderTemplate {
            name: "corp".into(),
            display_name: "Corp".into(),
            description: String::new(),
            base_url: "https://llm.corp.example".into(),
            default_model: Some("house".into()),
            requires_api_key: false,
            clear_anthropic_key: true,
            setup_instructions: None,
        },
    );
    let mut app = App::with_store(
        &cli,
        loaded_with(temp.path(), config),
        ProfileStore::in_memory(),
    );

    let cmd = CreateCommand {
        name: "corp".into(),
        template: Some("corp".into()),
        ..CreateCommand::default()
    };
    app.create(&cmd)?;
    let profile = app.store.profile("corp")?.expect("created");
    assert_eq!(profile.base_url, "https://llm.corp.example");
    assert_eq!(profile.model.as_deref(), Some("house"));
    Ok(())
}

#[test]
fn edit_requires_a_change_and_keeps_cleared_model() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());
    app.store.save_profile(stored_profile("work"))?;

    let err = app
        .edit(&EditCommand {
            name: "work".into(),
            ..EditCommand::default()
        })
        .expect_err("empty edit");
    assert!(matches!(app_error(&err), AppError::Validation(_)));

    app.edit(&EditCommand {
        name: "work".into(),
        model: Some(String::new()),
        api_key: Some(String::new()),
        env: vec![("FOO".into(), "bar".into())],
        ..EditCommand::default()
    })?;
    let profile = app.store.profile("work")?.expect("kept");
    assert_eq!(profile.model.as_deref(), Some(""));
    assert_eq!(profile.api_key, None);
    assert_eq!(profile.extra_env["FOO"], "bar");
    assert!(profile.updated_at > profile.created_at);
    Ok(())
}

#[test]
fn edit_unknown_profile_is_not_found() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());
    let err = app
        .edit(&EditCommand {
            name: "ghost".into(),
            model: Some("m".into()),
            ..EditCommand::default()
        })
        .expect_err("missing");
    assert!(matches!(app_error(&err), AppError::NotFound { .. }));
    Ok(())
}

#[test]
fn delete_needs_force_and_clears_active() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());
    app.store.save_profile(stored_profile("work"))?;
    app.store.set_active_profile(Some("work"))?;

    app.delete(&DeleteCommand {
        name: "work".into(),
        force: false,
    })?;
    assert!(app.store.exists("work")?);

    app.delete(&DeleteCommand {
        name: "work".into(),
        force: true,
    })?;
    assert!(!app.store.exists("work")?);
    assert_eq!(app.store.active_profile(), None);

    let err = app
        .delete(&DeleteCommand {
            name: "work".into(),
            force: true,
        })
        .expect_err("already gone");
    assert!(matches!(app_error(&err), AppError::NotFound { .. }));
    Ok(())
}

#[test]
fn use_records_active_and_reset_clears_it() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());
    app.store.save_profile(stored_profile("work"))?;

    app.use_profile(&UseCommand {
        name: "work".into(),
        shell: Some(ShellDialect::Fish),
    })?;
    assert_eq!(app.store.active_profile().as_deref(), Some("work"));

    app.reset(&ResetCommand {
        shell: Some(ShellDialect::Bash),
    })?;
    assert_eq!(app.store.active_profile(), None);
    Ok(())
}

#[test]
fn use_unknown_profile_leaves_active_untouched() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());
    app.store.set_active_profile(Some("old"))?;

    let err = app
        .use_profile(&UseCommand {
            name: "ghost".into(),
            shell: None,
        })
        .expect_err("missing");
    assert!(matches!(app_error(&err), AppError::NotFound { .. }));
    assert_eq!(app.store.active_profile().as_deref(), Some("old"));
    Ok(())
}

#[test]
fn import_applies_name_override_and_detects_conflict() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());
    let payload = r#"{"name":"shared","baseUrl":"https://x.example","model":"m","createdAt":"2001-01-01T00:00:00Z"}"#;

    app.import(&ImportCommand {
        payload: Some(payload.into()),
        file: None,
        name: Some("mine".into()),
    })?;
    let imported = app.store.profile("mine")?.expect("imported");
    assert_eq!(imported.base_url, "https://x.example");
    assert!(imported.created_at.year() > 2001);

    let err = app
        .import(&ImportCommand {
            payload: Some(payload.into()),
            file: None,
            name: Some("mine".into()),
        })
        .expect_err("conflict");
    assert!(matches!(app_error(&err), AppError::AlreadyExists { .. }));

    let err = app
        .import(&ImportCommand {
            payload: Some("{oops".into()),
            file: None,
            name: None,
        })
        .expect_err("bad json");
    assert!(matches!(app_error(&err), AppError::Validation(_)));
    Ok(())
}

#[test]
fn import_reads_file() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("profile.json");
    std::fs::write(&path, r#"{"name":"filed","baseUrl":"https://f.example"}"#)?;
    let cli = cli();
    let mut app = app(&cli, temp.path());
    app.import(&ImportCommand {
        payload: None,
        file: Some(path),
        name: None,
    })?;
    assert!(app.store.exists("filed")?);
    Ok(())
}

#[test]
fn dry_run_does_not_touch_active_pointer() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let mut app = app(&cli, temp.path());
    app.store.save_profile(stored_profile("work"))?;
    app.store.set_active_profile(Some("other"))?;

    app.run(&RunCommand {
        name: "work".into(),
        dry_run: true,
        args: vec!["--help".into()],
    })?;
    app.run_default(&RunDefaultCommand {
        dry_run: true,
        args: Vec::new(),
    })?;
    assert_eq!(app.store.active_profile().as_deref(), Some("other"));
    Ok(())
}

#[test]
fn resolve_dialect_prefers_flag_then_config() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let config = Config {
        defaults: Defaults {
            shell: Some(ShellDialect::Fish),
        },
        ..Config::default()
    };
    let app = App::with_store(&cli, loaded_with(temp.path(), config), ProfileStore::in_memory());
    assert_eq!(app.resolve_dialect(Some(ShellDialect::Cmd)), ShellDialect::Cmd);
    assert_eq!(app.resolve_dialect(None), ShellDialect::Fish);
    Ok(())
}

#[test]
fn profile_table_marks_active_and_labels_models() {
    let mut cleared = stored_profile("beta");
    cleared.model = Some(String::new());
    let mut modeled = stored_profile("alpha");
    modeled.model = Some("big".into());
    let profiles = BTreeMap::from([
        ("alpha".to_string(), modeled),
        ("beta".to_string(), cleared),
        ("gamma".to_string(), stored_profile("gamma")),
    ]);

    let table = render_profile_table(&profiles, Some("beta"));
    let lines = table.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "Profiles (3 configured)");
    assert!(lines[3].starts_with("  alpha") && lines[3].contains("big"), "{table}");
    assert!(lines[4].starts_with("* beta") && lines[4].contains("(cleared)"), "{table}");
    assert!(lines[5].contains("(default)"), "{table}");
    assert!(table.ends_with("* active profile\n"), "{table}");
}

#[test]
fn profile_details_never_show_secret() {
    let profile = stored_profile("work");
    let details = render_profile_details(&profile.masked(), true);
    assert!(details.starts_with("Profile: work (active)\n"), "{details}");
    assert!(details.contains(MASK), "{details}");
    assert!(!details.contains("sk-secret"), "{details}");
}

#[test]
fn current_status_masks_credentials() {
    let env = BTreeMap::from([
        (BASE_URL_VAR, "https://api.example.com"),
        (AUTH_TOKEN_VAR, "sk-secret"),
        (AMBIENT_KEY_VAR, "sk-ant"),
        (ACTIVE_PROFILE_VAR, "work"),
    ]);
    let status = CurrentStatus::gather(Some("work".into()), |key| {
        env.get(key).map(ToString::to_string)
    });
    assert_eq!(status.shell_active.as_deref(), Some("work"));
    assert_eq!(status.environment[AUTH_TOKEN_VAR].as_deref(), Some(MASK));
    assert_eq!(status.environment[AMBIENT_KEY_VAR].as_deref(), Some(MASK));
    assert_eq!(status.environment[MODEL_VAR], None);

    let rendered = status.render();
    assert!(rendered.contains("Config active: work"), "{rendered}");
    assert!(rendered.contains("https://api.example.com"), "{rendered}");
    assert!(!rendered.contains("sk-"), "{rendered}");
    assert!(rendered.contains("(not set)"), "{rendered}");
}

#[test]
fn doctor_reports_failures_and_warnings() {
    let temp = TempDir::new().expect("tempdir");
    let mut loaded = loaded_with(temp.path(), Config::default());
    loaded.diagnostics.push(ConfigDiagnostic {
        level: DiagnosticLevel::Warning,
        message: "template 'deepseek' overrides the built-in preset".into(),
    });

    let report = DoctorReport::build(&DoctorInputs {
        loaded: &loaded,
        store: Ok(2),
        launcher: None,
        config_active: Some("home".into()),
        shell_active: Some("work".into()),
        ambient_key_set: true,
    });
    assert_eq!(report.failures(), 1);
    let rendered = report.render();
    assert!(rendered.contains("✘ launcher 'claude' not found"), "{rendered}");
    assert!(rendered.contains("! ANTHROPIC_API_KEY is set"), "{rendered}");
    assert!(rendered.contains("last activated profile is 'home'"), "{rendered}");
    assert!(rendered.contains("(2 profiles)"), "{rendered}");
}

#[test]
fn doctor_passes_with_healthy_inputs() {
    let temp = TempDir::new().expect("tempdir");
    let loaded = loaded_with(temp.path(), Config::default());
    let report = DoctorReport::build(&DoctorInputs {
        loaded: &loaded,
        store: Ok(0),
        launcher: Some("/usr/bin/claude".into()),
        config_active: None,
        shell_active: None,
        ambient_key_set: true,
    });
    assert_eq!(report.failures(), 0);
    assert!(report.checks.iter().all(|check| check.status == CheckStatus::Ok));
}

#[test]
fn memory_store_starts_from_seeded_data() -> Result<()> {
    let temp = TempDir::new()?;
    let cli = cli();
    let data = StoreData {
        profiles: BTreeMap::from([("seed".to_string(), stored_profile("seed"))]),
        active_profile: Some("seed".into()),
    };
    let app = App::with_store(
        &cli,
        loaded_with(temp.path(), Config::default()),
        ProfileStore::new(MemoryBackend::with_data(data)),
    );
    assert!(app.store.exists("seed")?);
    app.show(&ShowCommand { name: "seed".into() })?;
    Ok(())
}
