use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, IsTerminal, Read};

use color_eyre::eyre::{WrapErr, eyre};
use color_eyre::{Result, Section};
use serde::Serialize;
use serde_json::json;
use which::which;

use crate::cli::{
    Cli, ConfigCommand, CreateCommand, DeleteCommand, EditCommand, EnvCommand, ExportCommand,
    ImportCommand, ResetCommand, RunCommand, RunDefaultCommand, ShowCommand, UseCommand,
};
use crate::config::{DiagnosticLevel, LoadedConfig, default_template};
use crate::error::AppError;
use crate::launch::{self, LaunchPlan};
use crate::profile::{self, MASK, Profile, ProfileEdit, ProfileImport};
use crate::shell::{
    ACTIVE_PROFILE_VAR, AMBIENT_KEY_VAR, AUTH_TOKEN_VAR, BASE_URL_VAR, MODEL_VAR, ShellDialect,
    detect_shell, generate_env_vars, generate_reset_script, generate_shell_script,
};
use crate::store::{FileBackend, ProfileStore, StoreBackend};
use crate::templates::{ProviderTemplate, TemplateCatalog};
use crate::util;

pub struct App<'cli, B: StoreBackend = FileBackend> {
    pub cli: &'cli Cli,
    pub loaded: LoadedConfig,
    pub store: ProfileStore<B>,
    templates: TemplateCatalog,
}

impl<'cli> App<'cli> {
    /// Load settings and open the profile store next to them.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration directory cannot be created or a
    /// settings file fails to parse.
    pub fn bootstrap(cli: &'cli Cli) -> Result<Self> {
        let loaded = crate::config::load(cli.config_dir.as_deref())?;
        let store = ProfileStore::open(loaded.directories.store_path());
        Ok(Self::with_store(cli, loaded, store))
    }
}

impl<'cli, B: StoreBackend> App<'cli, B> {
    pub fn with_store(cli: &'cli Cli, loaded: LoadedConfig, store: ProfileStore<B>) -> Self {
        let templates = loaded.template_catalog();
        Self {
            cli,
            loaded,
            store,
            templates,
        }
    }

    fn require(&self, name: &str) -> Result<Profile> {
        self.store.profile(name)?.ok_or_else(|| {
            AppError::NotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// `--shell`, then the configured default, then detection.
    #[must_use]
    pub fn resolve_dialect(&self, flag: Option<ShellDialect>) -> ShellDialect {
        flag.or(self.loaded.config.defaults.shell)
            .unwrap_or_else(detect_shell)
    }

    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub fn list(&self) -> Result<()> {
        let profiles = self.store.profiles()?;
        let active = self.store.active_profile();

        if self.cli.json {
            let masked = profiles
                .iter()
                .map(|(name, profile)| (name.clone(), profile.masked()))
                .collect::<BTreeMap<_, _>>();
            let payload = json!({
                "profiles": masked,
                "activeProfile": active,
                "totalProfiles": profiles.len(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
            return Ok(());
        }

        if profiles.is_empty() {
            println!("No profiles yet. Create one with:");
            println!("  ccx create <name> --template <template>");
            println!("  ccx templates   # list available templates");
            return Ok(());
        }

        print!("{}", render_profile_table(&profiles, active.as_deref()));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown profile.
    pub fn show(&self, cmd: &ShowCommand) -> Result<()> {
        let profile = self.require(&cmd.name)?.masked();
        if self.cli.json {
            println!("{}", serde_json::to_string_pretty(&profile)?);
        } else {
            let active = self.store.active_profile();
            print!(
                "{}",
                render_profile_details(&profile, active.as_deref() == Some(profile.name.as_str()))
            );
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation, conflict, or unknown-template error, or a store
    /// write failure.
    pub fn create(&mut self, cmd: &CreateCommand) -> Result<()> {
        profile::validate_name(&cmd.name)?;
        if self.store.exists(&cmd.name)? {
            return Err(AppError::AlreadyExists {
                name: cmd.name.clone(),
            })
            .with_suggestion(|| format!("use `ccx edit {}` to change it", cmd.name));
        }

        let template = match &cmd.template {
            Some(name) => Some(self.templates.require(name)?.clone()),
            None => None,
        };
        let profile = build_profile(cmd, template.as_ref())?;
        if let Err(err) = profile.validate() {
            return Err(err).with_suggestion(|| {
                "pass --base-url, or --template to start from a provider preset".to_string()
            });
        }

        self.store
            .save_profile(profile.clone())
            .wrap_err("failed to save profile")?;
        tracing::info!(profile = %profile.name, provider = %profile.provider, "created profile");

        println!("Created profile '{}'.", profile.name);
        if let Some(template) = &template
            && template.requires_api_key
            && !profile.has_api_key()
        {
            println!();
            println!("This provider needs an API key.");
            if let Some(instructions) = &template.setup_instructions {
                println!("  {instructions}");
            }
            println!("  ccx edit {} --api-key <KEY>", profile.name);
        }
        println!();
        println!("Activate it with:");
        let hint = format!("ccx use {}", profile.name);
        println!("  {}", self.resolve_dialect(None).eval_hint(&hint));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`], a validation error for an empty or
    /// invalid edit, or a store write failure.
    pub fn edit(&mut self, cmd: &EditCommand) -> Result<()> {
        let mut profile = self.require(&cmd.name)?;
        let edit = ProfileEdit {
            base_url: cmd.base_url.as_ref().map(|url| url.trim().to_string()),
            model: cmd.model.clone(),
            api_key: cmd.api_key.clone(),
            description: cmd.description.clone(),
            clear_anthropic_key: cmd.key_policy.choice(),
            set_env: cmd.env.clone(),
            unset_env: cmd.unset_env.clone(),
        };
        if edit.is_empty() {
            return Err(AppError::validation("nothing to change")).with_suggestion(|| {
                "pass at least one field flag; see `ccx edit --help`".to_string()
            });
        }
        for key in &edit.unset_env {
            if !profile.extra_env.contains_key(key) {
                tracing::warn!(
                    profile = %profile.name,
                    key = %key,
                    "variable was not set on this profile"
                );
            }
        }

        edit.apply(&mut profile, profile::now());
        profile.validate()?;
        self.store
            .save_profile(profile.clone())
            .wrap_err("failed to save profile")?;
        tracing::info!(profile = %profile.name, "updated profile");
        println!("Updated profile '{}'.", profile.name);
        Ok(())
    }

    /// Without `--force` only the confirmation hint is printed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or a store write failure.
    pub fn delete(&mut self, cmd: &DeleteCommand) -> Result<()> {
        if !self.store.exists(&cmd.name)? {
            return Err(AppError::NotFound {
                name: cmd.name.clone(),
            }
            .into());
        }
        if !cmd.force {
            println!("This permanently deletes profile '{}'. To confirm, run:", cmd.name);
            println!("  ccx delete {} --force", cmd.name);
            return Ok(());
        }

        let was_active = self.store.active_profile().as_deref() == Some(cmd.name.as_str());
        self.store.delete_profile(&cmd.name)?;
        tracing::info!(profile = %cmd.name, "deleted profile");
        println!("Deleted profile '{}'.", cmd.name);
        if was_active {
            println!("It was the active profile; run `ccx reset` to clear it from your shell.");
        }
        Ok(())
    }

    /// Print the activation script for `eval` and record the profile as
    /// active.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or a store write failure.
    pub fn use_profile(&mut self, cmd: &UseCommand) -> Result<()> {
        let profile = self.require(&cmd.name)?;
        let dialect = self.resolve_dialect(cmd.shell);
        println!("{}", generate_shell_script(&profile, dialect));
        self.store.set_active_profile(Some(profile.name.as_str()))?;
        tracing::info!(profile = %profile.name, shell = %dialect, "emitted activation script");

        if io::stdout().is_terminal() && !self.cli.quiet {
            eprintln!(
                "# printed only; apply it with: {}",
                dialect.eval_hint(&format!("ccx use {}", profile.name))
            );
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error when the active pointer cannot be cleared.
    pub fn reset(&mut self, cmd: &ResetCommand) -> Result<()> {
        let dialect = self.resolve_dialect(cmd.shell);
        println!("{}", generate_reset_script(dialect));
        self.store.set_active_profile(None)?;
        tracing::info!(shell = %dialect, "emitted reset script");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown profile.
    pub fn env(&self, cmd: &EnvCommand) -> Result<()> {
        let profile = self.require(&cmd.name)?;
        let vars = generate_env_vars(&profile);
        if self.cli.json {
            println!("{}", serde_json::to_string_pretty(&vars)?);
        } else {
            for (key, value) in &vars {
                println!("{key}={value}");
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error when JSON encoding fails.
    pub fn current(&self) -> Result<()> {
        let status = CurrentStatus::gather(self.store.active_profile(), |key| {
            std::env::var(key).ok().filter(|value| !value.is_empty())
        });
        if self.cli.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            print!("{}", status.render());
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error when JSON encoding fails.
    pub fn templates(&self) -> Result<()> {
        if self.cli.json {
            let templates = self.templates.iter().collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&templates)?);
            return Ok(());
        }
        print!("{}", render_templates(self.templates.iter()));
        println!();
        println!("Usage: ccx create <name> --template <template>");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown profile.
    pub fn export(&self, cmd: &ExportCommand) -> Result<()> {
        let profile = self.require(&cmd.name)?.exported();
        println!("{}", serde_json::to_string_pretty(&profile)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation error for malformed JSON or an invalid profile,
    /// [`AppError::AlreadyExists`] on a name clash, or an I/O error reading
    /// the input.
    pub fn import(&mut self, cmd: &ImportCommand) -> Result<()> {
        let raw = read_import_payload(cmd)?;
        let profile =
            ProfileImport::parse(&raw)?.into_profile(cmd.name.as_deref(), profile::now())?;
        if self.store.exists(&profile.name)? {
            return Err(AppError::AlreadyExists {
                name: profile.name.clone(),
            })
            .with_suggestion(|| "pass --name to import under a different name".to_string());
        }

        self.store
            .save_profile(profile.clone())
            .wrap_err("failed to save profile")?;
        tracing::info!(profile = %profile.name, "imported profile");
        println!("Imported profile '{}'.", profile.name);
        if !profile.has_api_key() {
            println!("No API key was imported. Add one with:");
            println!("  ccx edit {} --api-key <KEY>", profile.name);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`], a launch failure, or
    /// [`AppError::ChildExited`] carrying the child's status.
    pub fn run(&mut self, cmd: &RunCommand) -> Result<()> {
        let profile = self.require(&cmd.name)?;
        let plan = launch::plan_for_profile(&profile, &self.loaded.config.launch, &cmd.args);
        if cmd.dry_run {
            return launch::emit_plan(&plan, self.cli.json);
        }

        self.store.set_active_profile(Some(profile.name.as_str()))?;
        let model = profile
            .model
            .as_deref()
            .filter(|model| !model.is_empty())
            .unwrap_or("default");
        let target = format!(
            "profile '{}' ({}, model {model})",
            profile.name, profile.provider
        );
        self.announce(&plan, &target);
        launch::execute(&plan)
    }

    /// # Errors
    ///
    /// Returns a launch failure or [`AppError::ChildExited`].
    pub fn run_default(&mut self, cmd: &RunDefaultCommand) -> Result<()> {
        let plan = launch::plan_for_default(&self.loaded.config.launch, &cmd.args);
        if cmd.dry_run {
            return launch::emit_plan(&plan, self.cli.json);
        }

        self.store.set_active_profile(None)?;
        self.announce(&plan, "default settings");
        launch::execute(&plan)
    }

    fn announce(&self, plan: &LaunchPlan, what: &str) {
        if !self.cli.quiet {
            eprintln!("Launching {} with {what}", plan.display);
        }
    }

    /// # Errors
    ///
    /// Returns an error when the merged settings cannot be rendered, or when
    /// `lint` finds errors.
    pub fn config(&self, cmd: &ConfigCommand) -> Result<()> {
        match cmd {
            ConfigCommand::Where => {
                self.config_where();
                Ok(())
            }
            ConfigCommand::Dump => self.config_dump(),
            ConfigCommand::Lint => self.config_lint(),
            ConfigCommand::Default => {
                print!("{}", default_template());
                Ok(())
            }
        }
    }

    fn config_where(&self) {
        let dirs = &self.loaded.directories;
        println!("Configuration directory: {}", dirs.config_dir.display());
        println!("Profile store: {}", dirs.store_path().display());
        println!("Sources (in load order):");
        for source in &self.loaded.sources {
            println!("  - {} ({})", source.path.display(), source.kind.label());
        }
    }

    fn config_dump(&self) -> Result<()> {
        let toml_text = toml::to_string_pretty(&self.loaded.merged)?;
        println!("{toml_text}");
        Ok(())
    }

    fn config_lint(&self) -> Result<()> {
        if self.loaded.diagnostics.is_empty() {
            println!("Configuration looks good.");
            return Ok(());
        }

        for diag in &self.loaded.diagnostics {
            println!("{}: {}", diag.level.label(), diag.message);
        }

        if self.loaded.has_errors() {
            Err(eyre!("configuration contains errors"))
        } else {
            Ok(())
        }
    }

    /// # Errors
    ///
    /// Returns an error summarizing the failed checks.
    pub fn doctor(&self) -> Result<()> {
        let launcher = which(&self.loaded.config.launch.bin).ok();
        let report = DoctorReport::build(&DoctorInputs {
            loaded: &self.loaded,
            store: self
                .store
                .profiles()
                .map(|profiles| profiles.len())
                .map_err(|err| err.to_string()),
            launcher: launcher.as_ref().map(|path| path.display().to_string()),
            config_active: self.store.active_profile(),
            shell_active: env_non_empty(ACTIVE_PROFILE_VAR),
            ambient_key_set: env_non_empty(AMBIENT_KEY_VAR).is_some(),
        });

        println!("ccx doctor");
        println!("==========");
        print!("{}", report.render());

        let failures = report.failures();
        if failures == 0 {
            Ok(())
        } else {
            Err(eyre!("doctor found {failures} problem(s)"))
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn build_profile(
    cmd: &CreateCommand,
    template: Option<&ProviderTemplate>,
) -> Result<Profile, AppError> {
    let mut profile = match template {
        Some(template) => template.seed_profile(&cmd.name),
        None => Profile::new(cmd.name.clone(), String::new()),
    };
    if let Some(base_url) = &cmd.base_url {
        profile.base_url = base_url.trim().to_string();
    }
    if let Some(model) = cmd.model.as_ref().filter(|model| !model.is_empty()) {
        profile.model = Some(model.clone());
    }
    if let Some(api_key) = cmd.api_key.as_ref().filter(|key| !key.is_empty()) {
        profile.api_key = Some(api_key.clone());
    }
    if let Some(description) = &cmd.description {
        profile.description = Some(description.clone()).filter(|text| !text.is_empty());
    }
    if let Some(clear) = cmd.key_policy.choice() {
        profile.clear_anthropic_key = clear;
    }
    for (key, value) in &cmd.env {
        profile::validate_env_name(key)?;
        profile.extra_env.insert(key.clone(), value.clone());
    }
    Ok(profile)
}

fn read_import_payload(cmd: &ImportCommand) -> Result<String> {
    if let Some(payload) = &cmd.payload {
        return Ok(payload.clone());
    }
    match cmd.file.as_deref() {
        Some(path) if path.as_os_str() == "-" => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .wrap_err("failed to read profile JSON from stdin")?;
            Ok(raw)
        }
        Some(path) => fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display())),
        None => Err(AppError::validation("pass profile JSON or --file <PATH>").into()),
    }
}

pub(crate) fn render_profile_table(
    profiles: &BTreeMap<String, Profile>,
    active: Option<&str>,
) -> String {
    let name_width = profiles.keys().map(|name| name.chars().count()).max().unwrap_or(0).max(4);
    let provider_width = profiles
        .values()
        .map(|profile| profile.provider.chars().count())
        .max()
        .unwrap_or(0)
        .max(8);

    let mut out = String::new();
    let _ = writeln!(out, "Profiles ({} configured)", profiles.len());
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {:<name_width$}  {:<provider_width$}  {:<24}  Base URL",
        "Name", "Provider", "Model"
    );
    for (name, profile) in profiles {
        let marker = if active == Some(name.as_str()) { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {:<name_width$}  {:<provider_width$}  {:<24}  {}",
            name,
            profile.provider,
            util::truncate(model_label(profile), 24),
            profile.base_url,
        );
    }
    if active.is_some_and(|name| profiles.contains_key(name)) {
        let _ = writeln!(out);
        let _ = writeln!(out, "* active profile");
    }
    out
}

fn model_label(profile: &Profile) -> &str {
    match profile.model.as_deref() {
        None => "(default)",
        Some("") => "(cleared)",
        Some(model) => model,
    }
}

pub(crate) fn render_profile_details(profile: &Profile, active: bool) -> String {
    let mut rows = vec![
        ("Provider", profile.provider.clone()),
        ("Base URL", profile.base_url.clone()),
        ("Model", model_label(profile).to_string()),
        (
            "API key",
            if profile.has_api_key() {
                MASK.to_string()
            } else {
                "(not set)".to_string()
            },
        ),
        (
            "Clear ANTHROPIC_API_KEY",
            if profile.clear_anthropic_key { "yes" } else { "no" }.to_string(),
        ),
    ];
    if let Some(description) = &profile.description {
        rows.insert(0, ("Description", description.clone()));
    }
    for (key, value) in &profile.extra_env {
        rows.push(("Env", format!("{key}={value}")));
    }
    rows.push(("Created", util::format_timestamp(profile.created_at)));
    rows.push(("Updated", util::format_timestamp(profile.updated_at)));

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut out = String::new();
    let suffix = if active { " (active)" } else { "" };
    let _ = writeln!(out, "Profile: {}{suffix}", profile.name);
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<width$}  {value}");
    }
    out
}

pub(crate) fn render_templates<'a>(
    templates: impl Iterator<Item = &'a ProviderTemplate>,
) -> String {
    let mut out = String::new();
    for template in templates {
        let _ = writeln!(out, "{} ({})", template.name, template.display_name);
        if !template.description.is_empty() {
            let _ = writeln!(out, "    {}", template.description);
        }
        if !template.base_url.is_empty() {
            let _ = writeln!(out, "    base URL: {}", template.base_url);
        }
        if let Some(model) = &template.default_model {
            let _ = writeln!(out, "    default model: {model}");
        }
    }
    out
}

/// What `ccx current` reports: the stored pointer, the shell marker, and the
/// backend variables visible to this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStatus {
    pub config_active: Option<String>,
    pub shell_active: Option<String>,
    pub environment: BTreeMap<String, Option<String>>,
}

impl CurrentStatus {
    pub fn gather(config_active: Option<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = [BASE_URL_VAR, AUTH_TOKEN_VAR, MODEL_VAR, AMBIENT_KEY_VAR]
            .into_iter()
            .map(|key| {
                let value = lookup(key).map(|value| {
                    if key == AUTH_TOKEN_VAR || key == AMBIENT_KEY_VAR {
                        MASK.to_string()
                    } else {
                        value
                    }
                });
                (key.to_string(), value)
            })
            .collect();
        Self {
            config_active,
            shell_active: lookup(ACTIVE_PROFILE_VAR),
            environment,
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let none = "(none)";
        let _ = writeln!(
            out,
            "Config active: {}",
            self.config_active.as_deref().unwrap_or(none)
        );
        let _ = writeln!(
            out,
            "Shell active:  {}",
            self.shell_active.as_deref().unwrap_or(none)
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Environment:");
        for key in [BASE_URL_VAR, AUTH_TOKEN_VAR, MODEL_VAR, AMBIENT_KEY_VAR] {
            let value = self
                .environment
                .get(key)
                .and_then(Option::as_deref)
                .unwrap_or("(not set)");
            let _ = writeln!(out, "  {key:<22}{value}");
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub(crate) struct Check {
    pub status: CheckStatus,
    pub message: String,
}

pub(crate) struct DoctorInputs<'a> {
    pub loaded: &'a LoadedConfig,
    pub store: std::result::Result<usize, String>,
    pub launcher: Option<String>,
    pub config_active: Option<String>,
    pub shell_active: Option<String>,
    pub ambient_key_set: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DoctorReport {
    pub checks: Vec<Check>,
}

impl DoctorReport {
    pub fn build(inputs: &DoctorInputs<'_>) -> Self {
        let mut report = Self::default();
        let loaded = inputs.loaded;

        report.push(
            CheckStatus::Ok,
            format!("settings loaded from {}", loaded.directories.config_dir.display()),
        );
        for diag in &loaded.diagnostics {
            let status = match diag.level {
                DiagnosticLevel::Warning => CheckStatus::Warn,
                DiagnosticLevel::Error => CheckStatus::Fail,
            };
            report.push(status, format!("config: {}", diag.message));
        }

        let store_path = loaded.directories.store_path();
        match &inputs.store {
            Ok(count) => report.push(
                CheckStatus::Ok,
                format!("profile store {} ({count} profiles)", store_path.display()),
            ),
            Err(err) => report.push(
                CheckStatus::Fail,
                format!("profile store {} unreadable: {err}", store_path.display()),
            ),
        }

        let bin = &loaded.config.launch.bin;
        match &inputs.launcher {
            Some(path) => report.push(CheckStatus::Ok, format!("launcher '{bin}' found at {path}")),
            None => report.push(
                CheckStatus::Fail,
                format!("launcher '{bin}' not found on PATH; set [launch] bin in config.toml"),
            ),
        }

        if let Some(shell) = &inputs.shell_active {
            if inputs.ambient_key_set {
                report.push(
                    CheckStatus::Warn,
                    format!(
                        "{AMBIENT_KEY_VAR} is set while profile '{shell}' is active and may override its token"
                    ),
                );
            }
            if inputs.config_active.as_deref() != Some(shell.as_str()) {
                report.push(
                    CheckStatus::Warn,
                    format!(
                        "this shell has '{shell}' applied but the last activated profile is '{}'",
                        inputs.config_active.as_deref().unwrap_or("(none)")
                    ),
                );
            }
        }

        report
    }

    fn push(&mut self, status: CheckStatus, message: String) {
        self.checks.push(Check { status, message });
    }

    pub fn failures(&self) -> usize {
        self.checks
            .iter()
            .filter(|check| check.status == CheckStatus::Fail)
            .count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for check in &self.checks {
            let symbol = match check.status {
                CheckStatus::Ok => '✔',
                CheckStatus::Warn => '!',
                CheckStatus::Fail => '✘',
            };
            let _ = writeln!(out, "{symbol} {}", check.message);
        }
        out
    }
}

#[cfg(test)]
mod tests;
