use color_eyre::Result;
use color_eyre::eyre::eyre;
use indexmap::IndexMap;
use serde::Deserialize;
use toml::Value;

use crate::profile::validate_name;
use crate::shell::ShellDialect;
use crate::templates::{ProviderTemplate, is_builtin};

pub const DEFAULT_LAUNCH_BIN: &str = "claude";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub defaults: Defaults,
    pub launch: LaunchConfig,
    pub templates: IndexMap<String, ProviderTemplate>,
}

#[derive(Debug, Clone, Default)]
pub struct Defaults {
    /// Dialect used when `--shell` is absent; `None` means detect.
    pub shell: Option<ShellDialect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub bin: String,
    pub args: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            bin: DEFAULT_LAUNCH_BIN.to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

impl DiagnosticLevel {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
        }
    }
}

impl Config {
    /// Parse a configuration [`Value`] into a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error when the merged TOML cannot be decoded, for example
    /// an unknown `shell` or a template missing required fields.
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawConfig = value
            .clone()
            .try_into()
            .map_err(|err: toml::de::Error| eyre!("failed to decode configuration: {err}"))?;
        Ok(raw.into_config())
    }

    #[must_use]
    pub fn lint(&self) -> Vec<ConfigDiagnostic> {
        let mut diags = Vec::new();

        if self.launch.bin.trim().is_empty() {
            diags.push(ConfigDiagnostic {
                level: DiagnosticLevel::Error,
                message: "[launch] bin must not be empty".to_string(),
            });
        }

        for template in self.templates.values() {
            if let Err(err) = validate_name(&template.name) {
                diags.push(ConfigDiagnostic {
                    level: DiagnosticLevel::Error,
                    message: format!("template '{}': {err}", template.name),
                });
            }
            if template.base_url.trim().is_empty() {
                diags.push(ConfigDiagnostic {
                    level: DiagnosticLevel::Error,
                    message: format!("template '{}' has an empty base_url", template.name),
                });
            }
            if is_builtin(&template.name) {
                diags.push(ConfigDiagnostic {
                    level: DiagnosticLevel::Warning,
                    message: format!("template '{}' overrides the built-in preset", template.name),
                });
            }
        }

        diags
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawConfig {
    #[serde(default)]
    shell: Option<ShellDialect>,
    #[serde(default)]
    launch: RawLaunch,
    #[serde(default)]
    templates: IndexMap<String, RawTemplate>,
}

impl RawConfig {
    fn into_config(self) -> Config {
        let templates = self
            .templates
            .into_iter()
            .map(|(name, template)| (name.clone(), template.into_template(name)))
            .collect();
        Config {
            defaults: Defaults { shell: self.shell },
            launch: self.launch.into_launch(),
            templates,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawLaunch {
    bin: Option<String>,
    #[serde(default)]
    args: Vec<String>,
}

impl RawLaunch {
    fn into_launch(self) -> LaunchConfig {
        let bin = self
            .bin
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map_or_else(|| DEFAULT_LAUNCH_BIN.to_string(), |raw| expand_home(&raw));
        LaunchConfig {
            bin,
            args: self.args,
        }
    }
}

fn expand_home(raw: &str) -> String {
    shellexpand::tilde(raw).into_owned()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawTemplate {
    display_name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    base_url: String,
    default_model: Option<String>,
    #[serde(default = "default_true")]
    requires_api_key: bool,
    #[serde(default = "default_true")]
    clear_anthropic_key: bool,
    setup_instructions: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RawTemplate {
    fn into_template(self, name: String) -> ProviderTemplate {
        ProviderTemplate {
            display_name: self.display_name.unwrap_or_else(|| name.clone()),
            name,
            description: self.description,
            base_url: self.base_url.trim().to_string(),
            default_model: self.default_model.filter(|model| !model.is_empty()),
            requires_api_key: self.requires_api_key,
            clear_anthropic_key: self.clear_anthropic_key,
            setup_instructions: self.setup_instructions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Config> {
        let value: Value = toml::from_str(raw)?;
        Config::from_value(&value)
    }

    #[test]
    fn empty_config_uses_defaults() -> Result<()> {
        let config = parse("")?;
        assert_eq!(config.defaults.shell, None);
        assert_eq!(config.launch, LaunchConfig::default());
        assert!(config.templates.is_empty());
        assert!(config.lint().is_empty());
        Ok(())
    }

    #[test]
    fn shell_accepts_pwsh_alias() -> Result<()> {
        assert_eq!(
            parse("shell = \"pwsh\"")?.defaults.shell,
            Some(ShellDialect::PowerShell)
        );
        assert_eq!(parse("shell = \"fish\"")?.defaults.shell, Some(ShellDialect::Fish));
        Ok(())
    }

    #[test]
    fn unknown_shell_is_a_decode_error() {
        let err = parse("shell = \"tcsh\"").expect_err("tcsh is not supported");
        assert!(err.to_string().contains("failed to decode configuration"), "{err}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("[launch]\nbinary = \"x\"").is_err());
    }

    #[test]
    fn launch_bin_expands_tilde() -> Result<()> {
        let config = parse("[launch]\nbin = \"~/bin/claude\"\nargs = [\"--verbose\"]")?;
        assert!(!config.launch.bin.starts_with('~'), "{}", config.launch.bin);
        assert!(config.launch.bin.ends_with("bin/claude"));
        assert_eq!(config.launch.args, ["--verbose"]);
        Ok(())
    }

    #[test]
    fn blank_launch_bin_falls_back() -> Result<()> {
        assert_eq!(parse("[launch]\nbin = \"  \"")?.launch.bin, DEFAULT_LAUNCH_BIN);
        Ok(())
    }

    #[test]
    fn templates_decode_with_defaults() -> Result<()> {
        let config = parse(
            r#"
            [templates.corp]
            base_url = "https://llm.corp.example"
            default_model = "house-model"
            "#,
        )?;
        let corp = &config.templates["corp"];
        assert_eq!(corp.name, "corp");
        assert_eq!(corp.display_name, "corp");
        assert_eq!(corp.default_model.as_deref(), Some("house-model"));
        assert!(corp.requires_api_key);
        assert!(corp.clear_anthropic_key);
        assert!(config.lint().is_empty());
        Ok(())
    }

    #[test]
    fn lint_flags_bad_templates() -> Result<()> {
        let config = parse(
            r#"
            [templates."bad name"]
            base_url = "https://x"

            [templates.empty]
            description = "no url"

            [templates.deepseek]
            base_url = "https://proxy.local"
            "#,
        )?;
        let diags = config.lint();
        let errors = diags
            .iter()
            .filter(|diag| diag.level == DiagnosticLevel::Error)
            .map(|diag| diag.message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("bad name"));
        assert!(errors[1].contains("empty base_url"));
        assert!(diags.iter().any(|diag| diag.level == DiagnosticLevel::Warning
            && diag.message.contains("deepseek")));
        Ok(())
    }
}
