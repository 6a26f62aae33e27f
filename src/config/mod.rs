use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, eyre};
use color_eyre::{Result, Section, SectionExt};
use directories::ProjectDirs;
use itertools::Itertools;
use toml::Value;

mod merge;
pub mod model;

pub use model::{Config, ConfigDiagnostic, DiagnosticLevel, LaunchConfig};

use crate::templates::TemplateCatalog;

const MAIN_CONFIG: &str = "config.toml";
const DROPIN_DIR: &str = "conf.d";
const STORE_FILE: &str = "profiles.json";
const APP_NAME: &str = "ccenv";
pub const CONFIG_DIR_ENV: &str = "CCX_CONFIG_DIR";

const DEFAULT_TEMPLATE: &str = include_str!("default.toml");

/// Commented settings file written on first run.
#[must_use]
pub fn default_template() -> &'static str {
    DEFAULT_TEMPLATE
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub merged: Value,
    pub directories: AppDirectories,
    pub sources: Vec<ConfigSource>,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

impl LoadedConfig {
    #[must_use]
    pub fn template_catalog(&self) -> TemplateCatalog {
        TemplateCatalog::with_overrides(self.config.templates.values().cloned())
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.level == DiagnosticLevel::Error)
    }
}

#[derive(Debug, Clone)]
pub struct AppDirectories {
    pub config_dir: PathBuf,
}

impl AppDirectories {
    /// Create the configuration directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn ensure_all(&self) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).with_context(|| {
                format!("failed to create directory {}", self.config_dir.display())
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn main_config(&self) -> PathBuf {
        self.config_dir.join(MAIN_CONFIG)
    }

    #[must_use]
    pub fn dropin_dir(&self) -> PathBuf {
        self.config_dir.join(DROPIN_DIR)
    }

    /// JSON record holding every profile and the active pointer.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.config_dir.join(STORE_FILE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSourceKind {
    Main,
    DropIn,
}

impl ConfigSourceKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ConfigSourceKind::Main => "main",
            ConfigSourceKind::DropIn => "drop-in",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: PathBuf,
}

/// Load and merge settings into a [`LoadedConfig`], writing the commented
/// default `config.toml` when none exists yet.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, or a settings file
/// cannot be read, parsed, or decoded.
pub fn load(dir_override: Option<&Path>) -> Result<LoadedConfig> {
    let dirs = resolve_directories(dir_override)?;
    dirs.ensure_all()?;
    write_default_if_missing(&dirs)?;

    let sources = gather_sources(&dirs.config_dir)?;
    let mut merged_table = toml::map::Map::new();

    for source in &sources {
        let table = read_table(&source.path)?;
        merge::merge_tables(&mut merged_table, table, Some(&source.path))?;
    }

    let merged_value = Value::Table(merged_table);
    let config = Config::from_value(&merged_value).map_err(|err| {
        err.with_section(|| {
            sources
                .iter()
                .map(|source| source.path.display().to_string())
                .join("\n")
                .header("Loaded from")
        })
    })?;
    let diagnostics = config.lint();
    for diag in &diagnostics {
        tracing::debug!(level = diag.level.label(), message = %diag.message, "config diagnostic");
    }

    Ok(LoadedConfig {
        config,
        merged: merged_value,
        directories: dirs,
        sources,
        diagnostics,
    })
}

fn read_table(path: &Path) -> Result<toml::map::Map<String, Value>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(|err| {
            err.with_section(|| {
                format!(
                    "Ensure the file exists and is readable.\nResolved path: {}",
                    path.display()
                )
                .header("Suggested fix")
            })
        })?;
    let value: Value = toml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))
        .map_err(|err| {
            err.with_section(|| {
                format!(
                    "Double-check the TOML syntax or remove the file if it is no longer needed.\nResolved path: {}",
                    path.display()
                )
                .header("Suggested fix")
            })
        })?;
    match value {
        Value::Table(table) => Ok(table),
        _ => Err(eyre!(
            "{} must contain a TOML table at the top level",
            path.display()
        )),
    }
}

fn write_default_if_missing(dirs: &AppDirectories) -> Result<()> {
    let main = dirs.main_config();
    if main.exists() {
        return Ok(());
    }
    fs::write(&main, DEFAULT_TEMPLATE)
        .with_context(|| format!("failed to write {}", main.display()))?;
    tracing::info!(path = %main.display(), "wrote default configuration");
    Ok(())
}

/// Settings directory: explicit override, then `CCX_CONFIG_DIR`, then the
/// platform config directory.
///
/// # Errors
///
/// Returns an error when no override is given and the platform directories
/// cannot be resolved (no home directory).
pub fn resolve_directories(dir_override: Option<&Path>) -> Result<AppDirectories> {
    if let Some(path) = dir_override {
        return Ok(AppDirectories {
            config_dir: path.to_path_buf(),
        });
    }

    if let Some(raw) = env::var(CONFIG_DIR_ENV)
        .ok()
        .filter(|raw| !raw.trim().is_empty())
    {
        return Ok(AppDirectories {
            config_dir: PathBuf::from(raw),
        });
    }

    let project_dirs = ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| eyre!("unable to resolve platform directories for {APP_NAME}"))
        .with_suggestion(|| format!("set {CONFIG_DIR_ENV} or pass --config-dir"))?;
    Ok(AppDirectories {
        config_dir: project_dirs.config_dir().to_path_buf(),
    })
}

fn gather_sources(root: &Path) -> Result<Vec<ConfigSource>> {
    let mut sources = Vec::new();

    let main = root.join(MAIN_CONFIG);
    if main.is_file() {
        sources.push(ConfigSource {
            kind: ConfigSourceKind::Main,
            path: main,
        });
    }

    let conf_d = root.join(DROPIN_DIR);
    if conf_d.is_dir() {
        sources.extend(
            read_toml_files(&conf_d)?
                .into_iter()
                .map(|path| ConfigSource {
                    kind: ConfigSourceKind::DropIn,
                    path,
                }),
        );
    }

    Ok(sources)
}

fn read_toml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
        {
            files.insert(path);
        }
    }
    Ok(files.into_iter().collect_vec())
}
