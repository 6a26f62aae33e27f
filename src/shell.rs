//! Activation and reset scripts for the supported shell dialects.
//!
//! Output is meant to be evaluated by the calling shell (`eval "$(ccx use work)"`),
//! never executed as a subprocess, because only the caller's own shell can
//! change its environment.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::profile::Profile;

pub const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";
pub const AUTH_TOKEN_VAR: &str = "ANTHROPIC_AUTH_TOKEN";
pub const MODEL_VAR: &str = "ANTHROPIC_MODEL";
/// Pre-existing credential that would otherwise shadow the profile's token.
pub const AMBIENT_KEY_VAR: &str = "ANTHROPIC_API_KEY";
/// Marker recording which profile the current shell has applied.
pub const ACTIVE_PROFILE_VAR: &str = "CCX_ACTIVE_PROFILE";

/// Everything a reset removes, in emission order.
pub const RESET_VARS: [&str; 4] = [BASE_URL_VAR, AUTH_TOKEN_VAR, MODEL_VAR, ACTIVE_PROFILE_VAR];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShellDialect {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell", alias = "pwsh")]
    #[serde(alias = "pwsh")]
    PowerShell,
    Cmd,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shell '{0}' (expected bash, zsh, fish, powershell, or cmd)")]
pub struct UnknownDialect(pub String);

impl ShellDialect {
    pub const ALL: [ShellDialect; 5] = [
        ShellDialect::Bash,
        ShellDialect::Zsh,
        ShellDialect::Fish,
        ShellDialect::PowerShell,
        ShellDialect::Cmd,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ShellDialect::Bash => "bash",
            ShellDialect::Zsh => "zsh",
            ShellDialect::Fish => "fish",
            ShellDialect::PowerShell => "powershell",
            ShellDialect::Cmd => "cmd",
        }
    }

    /// Quote `value` so the dialect reads it back verbatim.
    ///
    /// `cmd` has no quoting that survives every character; see
    /// [`cmd_caret_escape`] for what it can and cannot carry.
    #[must_use]
    pub fn quote(self, value: &str) -> String {
        match self {
            ShellDialect::Bash | ShellDialect::Zsh => posix_single_quote(value),
            ShellDialect::Fish => fish_single_quote(value),
            ShellDialect::PowerShell => powershell_single_quote(value),
            ShellDialect::Cmd => cmd_caret_escape(value),
        }
    }

    #[must_use]
    pub fn set_statement(self, name: &str, value: &str) -> String {
        let quoted = self.quote(value);
        match self {
            ShellDialect::Bash | ShellDialect::Zsh => format!("export {name}={quoted}"),
            ShellDialect::Fish => format!("set -gx {name} {quoted}"),
            ShellDialect::PowerShell => format!("$env:{name} = {quoted}"),
            ShellDialect::Cmd => format!("set {name}={quoted}"),
        }
    }

    #[must_use]
    pub fn unset_statement(self, name: &str) -> String {
        match self {
            ShellDialect::Bash | ShellDialect::Zsh => format!("unset {name}"),
            ShellDialect::Fish => format!("set -e {name}"),
            ShellDialect::PowerShell => {
                format!("Remove-Item Env:{name} -ErrorAction SilentlyContinue")
            }
            ShellDialect::Cmd => format!("set {name}="),
        }
    }

    #[must_use]
    pub fn statement(self, entry: &EnvEntry) -> String {
        match &entry.value {
            EnvValue::Set(value) => self.set_statement(&entry.name, value),
            EnvValue::Unset => self.unset_statement(&entry.name),
        }
    }

    /// How the user evaluates `ccx use` output in this dialect.
    #[must_use]
    pub fn eval_hint(self, invocation: &str) -> String {
        match self {
            ShellDialect::Bash | ShellDialect::Zsh => format!("eval \"$({invocation})\""),
            ShellDialect::Fish => format!("{invocation} | source"),
            ShellDialect::PowerShell => format!("{invocation} | Out-String | Invoke-Expression"),
            ShellDialect::Cmd => format!("for /f \"delims=\" %i in ('{invocation}') do %i"),
        }
    }
}

impl fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShellDialect {
    type Err = UnknownDialect;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bash" => Ok(ShellDialect::Bash),
            "zsh" => Ok(ShellDialect::Zsh),
            "fish" => Ok(ShellDialect::Fish),
            "powershell" | "pwsh" => Ok(ShellDialect::PowerShell),
            "cmd" => Ok(ShellDialect::Cmd),
            _ => Err(UnknownDialect(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Set(String),
    Unset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub name: String,
    pub value: EnvValue,
}

impl EnvEntry {
    fn set(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: EnvValue::Set(value.into()),
        }
    }

    fn unset(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: EnvValue::Unset,
        }
    }
}

/// Ordered variable changes that activate `profile`.
///
/// Order: base URL, auth token, model, ambient-credential removal, then
/// `extra_env` sorted by name. The auth token is always present: without a
/// stored key it is unset so a previous profile's token cannot leak through.
#[must_use]
pub fn environment_mapping(profile: &Profile) -> Vec<EnvEntry> {
    let mut entries = Vec::with_capacity(4 + profile.extra_env.len());
    entries.push(EnvEntry::set(BASE_URL_VAR, profile.base_url.as_str()));

    match profile.api_key.as_deref() {
        Some(key) if !key.is_empty() => entries.push(EnvEntry::set(AUTH_TOKEN_VAR, key)),
        _ => entries.push(EnvEntry::unset(AUTH_TOKEN_VAR)),
    }

    match profile.model.as_deref() {
        Some("") => entries.push(EnvEntry::unset(MODEL_VAR)),
        Some(model) => entries.push(EnvEntry::set(MODEL_VAR, model)),
        None => {}
    }

    if profile.clear_anthropic_key {
        entries.push(EnvEntry::unset(AMBIENT_KEY_VAR));
    }

    for (name, value) in &profile.extra_env {
        entries.push(EnvEntry::set(name, value.as_str()));
    }

    entries
}

/// Script that points the evaluating shell at `profile`'s backend.
#[must_use]
pub fn generate_shell_script(profile: &Profile, dialect: ShellDialect) -> String {
    let mut lines = environment_mapping(profile)
        .iter()
        .map(|entry| dialect.statement(entry))
        .collect::<Vec<_>>();
    lines.push(dialect.set_statement(ACTIVE_PROFILE_VAR, &profile.name));
    lines.join("\n")
}

/// Script that removes every backend variable a profile may have set.
#[must_use]
pub fn generate_reset_script(dialect: ShellDialect) -> String {
    RESET_VARS
        .iter()
        .map(|name| dialect.unset_statement(name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flat name to value mapping. Removals collapse to an empty value, so an
/// extra variable set to `""` looks like a removal here; use
/// [`environment_mapping`] when the difference matters.
#[must_use]
pub fn generate_env_vars(profile: &Profile) -> IndexMap<String, String> {
    environment_mapping(profile)
        .into_iter()
        .map(|entry| match entry.value {
            EnvValue::Set(value) => (entry.name, value),
            EnvValue::Unset => (entry.name, String::new()),
        })
        .collect()
}

/// Inputs for [`detect_shell_from`], split out so detection is testable
/// without touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct ShellHints {
    pub shell: Option<String>,
    pub windows: bool,
    pub ps_module_path: bool,
}

impl ShellHints {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            shell: std::env::var("SHELL").ok(),
            windows: cfg!(windows),
            ps_module_path: std::env::var_os("PSModulePath").is_some(),
        }
    }
}

/// Best-effort guess of the invoking shell; callers can always override it.
#[must_use]
pub fn detect_shell() -> ShellDialect {
    detect_shell_from(&ShellHints::from_env())
}

#[must_use]
pub fn detect_shell_from(hints: &ShellHints) -> ShellDialect {
    if let Some(shell) = hints.shell.as_deref().filter(|raw| !raw.trim().is_empty()) {
        let stem = Path::new(shell.trim())
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match stem.as_str() {
            "fish" => return ShellDialect::Fish,
            "zsh" => return ShellDialect::Zsh,
            "bash" => return ShellDialect::Bash,
            "pwsh" | "powershell" => return ShellDialect::PowerShell,
            other => tracing::debug!(shell = other, "unrecognized $SHELL, using platform default"),
        }
    }

    if hints.windows {
        if hints.ps_module_path {
            ShellDialect::PowerShell
        } else {
            ShellDialect::Cmd
        }
    } else {
        ShellDialect::Bash
    }
}

/// `'...'` with each embedded `'` written as `'"'"'`.
fn posix_single_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\"'\"'");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

/// fish single quotes only recognise `\'` and `\\` as escapes.
fn fish_single_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if matches!(ch, '\'' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

/// PowerShell treats the typographic single quotes as quote characters too,
/// so every one of them is doubled.
fn powershell_single_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if matches!(ch, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            quoted.push(ch);
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

/// Best-effort escaping for `set NAME=value`.
///
/// Known limitation: cmd expands `%VAR%` (and `!VAR!` under delayed
/// expansion) before carets are honoured, and a `set` statement cannot span
/// lines. `%` and `!` pass through untouched; line breaks are replaced with
/// spaces so a value can never start a second command.
fn cmd_caret_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '^' | '&' | '|' | '<' | '>' | '(' | ')' | '"' => {
                escaped.push('^');
                escaped.push(ch);
            }
            '\r' | '\n' => {
                tracing::warn!("cmd cannot represent line breaks; replacing with a space");
                escaped.push(' ');
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
