use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::profile::parse_env_pair;
use crate::shell::ShellDialect;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about,
    long_about = None,
    name = "ccx",
    bin_name = "ccx",
    after_help = "Apply a profile to the current shell with: eval \"$(ccx use <name>)\""
)]
pub struct Cli {
    /// Override the configuration directory.
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
    /// Emit machine-readable output when supported.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub json: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Silence all log output except errors.
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List profiles (the default when no command is given).
    #[command(visible_alias = "ls")]
    List,
    /// Show one profile with its API key masked.
    Show(ShowCommand),
    /// Create a profile from flags or a provider template.
    #[command(visible_alias = "add")]
    Create(CreateCommand),
    /// Change fields of an existing profile.
    Edit(EditCommand),
    /// Delete a profile.
    #[command(visible_alias = "rm")]
    Delete(DeleteCommand),
    /// Print a script that applies a profile to the calling shell.
    Use(UseCommand),
    /// Print a script that removes every backend variable.
    Reset(ResetCommand),
    /// Print the environment a profile applies to a launched process.
    Env(EnvCommand),
    /// Report the active profile and backend variables of this shell.
    Current,
    /// List provider templates.
    Templates,
    /// Print a profile as shareable JSON without its API key.
    Export(ExportCommand),
    /// Create a profile from exported JSON.
    Import(ImportCommand),
    /// Launch the assistant with a profile applied.
    Run(RunCommand),
    /// Launch the assistant with every backend variable removed.
    RunDefault(RunDefaultCommand),
    /// Inspect configuration files.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Check settings, the profile store, and the launcher.
    Doctor,
}

#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Profile name.
    pub name: String,
}

#[derive(Debug, Args, Default)]
pub struct KeyPolicyArgs {
    /// Unset ANTHROPIC_API_KEY when the profile is applied.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "keep_key")]
    pub clear_key: bool,
    /// Leave ANTHROPIC_API_KEY untouched when the profile is applied.
    #[arg(long, action = ArgAction::SetTrue)]
    pub keep_key: bool,
}

impl KeyPolicyArgs {
    /// `Some(true)` to clear, `Some(false)` to keep, `None` when unspecified.
    #[must_use]
    pub fn choice(&self) -> Option<bool> {
        match (self.clear_key, self.keep_key) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Args, Default)]
pub struct CreateCommand {
    /// Profile name (letters, digits, `-`, `_`).
    pub name: String,
    /// Seed the profile from a provider template.
    #[arg(long, short)]
    pub template: Option<String>,
    /// Backend base URL (required unless the template provides one).
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
    /// Model exported as ANTHROPIC_MODEL.
    #[arg(long)]
    pub model: Option<String>,
    /// Key exported as ANTHROPIC_AUTH_TOKEN.
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
    /// Free-form description.
    #[arg(long)]
    pub description: Option<String>,
    #[command(flatten)]
    pub key_policy: KeyPolicyArgs,
    /// Extra variable to export (KEY=VALUE, repeatable).
    #[arg(
        long = "env",
        value_name = "KEY=VALUE",
        value_parser = env_pair,
        action = ArgAction::Append
    )]
    pub env: Vec<(String, String)>,
}

#[derive(Debug, Args, Default)]
pub struct EditCommand {
    /// Profile name.
    pub name: String,
    /// New base URL.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
    /// New model; pass an empty string to unset ANTHROPIC_MODEL on use.
    #[arg(long)]
    pub model: Option<String>,
    /// New API key; pass an empty string to remove it.
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
    /// New description; pass an empty string to remove it.
    #[arg(long)]
    pub description: Option<String>,
    #[command(flatten)]
    pub key_policy: KeyPolicyArgs,
    /// Add or replace an extra variable (KEY=VALUE, repeatable).
    #[arg(
        long = "env",
        value_name = "KEY=VALUE",
        value_parser = env_pair,
        action = ArgAction::Append
    )]
    pub env: Vec<(String, String)>,
    /// Remove an extra variable (repeatable).
    #[arg(long = "unset-env", value_name = "KEY", action = ArgAction::Append)]
    pub unset_env: Vec<String>,
}

#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Profile name.
    pub name: String,
    /// Delete without asking for confirmation.
    #[arg(long, short, action = ArgAction::SetTrue)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct UseCommand {
    /// Profile name.
    pub name: String,
    /// Shell dialect of the emitted script (detected when omitted).
    #[arg(long, value_enum)]
    pub shell: Option<ShellDialect>,
}

#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Shell dialect of the emitted script (detected when omitted).
    #[arg(long, value_enum)]
    pub shell: Option<ShellDialect>,
}

#[derive(Debug, Args)]
pub struct EnvCommand {
    /// Profile name.
    pub name: String,
}

#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Profile name.
    pub name: String,
}

#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Profile JSON (as printed by `ccx export`).
    #[arg(value_name = "JSON", conflicts_with = "file", required_unless_present = "file")]
    pub payload: Option<String>,
    /// Read the profile JSON from a file (`-` for stdin).
    #[arg(long, short, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Store under this name instead of the one in the JSON.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunCommand {
    /// Profile name.
    pub name: String,
    /// Print the command and environment changes without launching.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,
    /// Arguments forwarded to the assistant after `--`.
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RunDefaultCommand {
    /// Print the command and environment changes without launching.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,
    /// Arguments forwarded to the assistant after `--`.
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show configuration search paths and the profile store location.
    Where,
    /// Dump the merged configuration TOML.
    Dump,
    /// Validate settings and templates.
    Lint,
    /// Print the bundled default configuration.
    Default,
}

fn env_pair(raw: &str) -> Result<(String, String), String> {
    parse_env_pair(raw).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_collects_env_pairs() {
        let cli = Cli::parse_from([
            "ccx",
            "create",
            "work",
            "--base-url",
            "https://x",
            "--env",
            "A=1",
            "--env",
            "B=x=y",
            "--keep-key",
        ]);
        let Some(Command::Create(cmd)) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(
            cmd.env,
            [("A".to_string(), "1".to_string()), ("B".to_string(), "x=y".to_string())]
        );
        assert_eq!(cmd.key_policy.choice(), Some(false));
    }

    #[test]
    fn clear_and_keep_conflict() {
        let result = Cli::try_parse_from([
            "ccx",
            "edit",
            "work",
            "--clear-key",
            "--keep-key",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn shell_flag_accepts_pwsh_alias() {
        let cli = Cli::parse_from(["ccx", "use", "work", "--shell", "pwsh"]);
        let Some(Command::Use(cmd)) = cli.command else {
            panic!("expected use");
        };
        assert_eq!(cmd.shell, Some(ShellDialect::PowerShell));
    }

    #[test]
    fn run_forwards_trailing_args() {
        let cli = Cli::parse_from(["ccx", "run", "work", "--", "--resume", "-p", "hi"]);
        let Some(Command::Run(cmd)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(cmd.args, ["--resume", "-p", "hi"]);
        assert!(!cmd.dry_run);
    }

    #[test]
    fn import_requires_json_or_file() {
        assert!(Cli::try_parse_from(["ccx", "import"]).is_err());
        assert!(Cli::try_parse_from(["ccx", "import", "--file", "p.json"]).is_ok());
    }
}
