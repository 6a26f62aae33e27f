//! Spawning the assistant with a profile's environment applied.

use std::borrow::Cow;
use std::io::{self, Write};
use std::process::Command;

use color_eyre::eyre::{WrapErr, eyre};
use color_eyre::{Result, Section};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use shell_escape::unix::escape as shell_escape;
use which::which;

use crate::config::LaunchConfig;
use crate::error::AppError;
use crate::profile::{MASK, Profile};
use crate::shell::{
    ACTIVE_PROFILE_VAR, AUTH_TOKEN_VAR, EnvValue, RESET_VARS, environment_mapping,
};

/// A resolved command line plus the environment edits applied on top of the
/// current process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub program: String,
    pub args: Vec<String>,
    pub set: IndexMap<String, String>,
    pub remove: Vec<String>,
    pub display: String,
}

impl LaunchPlan {
    fn new(
        launch: &LaunchConfig,
        extra_args: &[String],
        set: IndexMap<String, String>,
        remove: Vec<String>,
    ) -> Self {
        let args = launch
            .args
            .iter()
            .chain(extra_args)
            .cloned()
            .collect::<Vec<_>>();
        let display = std::iter::once(launch.bin.as_str())
            .chain(args.iter().map(String::as_str))
            .map(|part| shell_escape(Cow::Borrowed(part)).into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            program: launch.bin.clone(),
            args,
            set,
            remove,
            display,
        }
    }

    /// `set` with secrets replaced by [`MASK`].
    #[must_use]
    pub fn masked_set(&self) -> IndexMap<String, String> {
        self.set
            .iter()
            .map(|(key, value)| {
                let shown = if key == AUTH_TOKEN_VAR {
                    MASK.to_string()
                } else {
                    value.clone()
                };
                (key.clone(), shown)
            })
            .collect()
    }
}

/// Plan for `run`: the same set and unset entries an activation script
/// applies, plus the active-profile marker.
#[must_use]
pub fn plan_for_profile(profile: &Profile, launch: &LaunchConfig, args: &[String]) -> LaunchPlan {
    let mut set = IndexMap::new();
    let mut remove = Vec::new();
    for entry in environment_mapping(profile) {
        match entry.value {
            EnvValue::Set(value) => {
                set.insert(entry.name, value);
            }
            EnvValue::Unset => remove.push(entry.name),
        }
    }
    set.insert(ACTIVE_PROFILE_VAR.to_string(), profile.name.clone());
    LaunchPlan::new(launch, args, set, remove)
}

/// Plan for `run-default`: every backend variable removed so the assistant
/// falls back to its own configuration.
#[must_use]
pub fn plan_for_default(launch: &LaunchConfig, args: &[String]) -> LaunchPlan {
    let remove = RESET_VARS.iter().map(ToString::to_string).collect();
    LaunchPlan::new(launch, args, IndexMap::new(), remove)
}

/// Human-readable dry-run output, secrets masked.
#[must_use]
pub fn render_plan(plan: &LaunchPlan) -> String {
    let mut lines = vec![plan.display.clone()];
    lines.extend(
        plan.masked_set()
            .into_iter()
            .map(|(key, value)| format!("  set {key}={value}")),
    );
    lines.extend(plan.remove.iter().map(|key| format!("  unset {key}")));
    lines.join("\n")
}

/// Print a plan instead of running it.
///
/// # Errors
///
/// Returns an error when stdout cannot be written or JSON encoding fails.
pub fn emit_plan(plan: &LaunchPlan, json: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if json {
        let payload = json!({
            "command": plan.display,
            "program": plan.program,
            "args": plan.args,
            "set": plan.masked_set(),
            "unset": plan.remove,
        });
        writeln!(stdout, "{}", serde_json::to_string_pretty(&payload)?)?;
    } else {
        writeln!(stdout, "{}", render_plan(plan))?;
    }
    stdout.flush()?;
    Ok(())
}

/// Run the plan in the foreground and wait for it.
///
/// # Errors
///
/// Returns an error when the program cannot be found or started, and
/// [`AppError::ChildExited`] when it exits unsuccessfully.
pub fn execute(plan: &LaunchPlan) -> Result<()> {
    let resolved = which(&plan.program)
        .map_err(|err| eyre!("'{}' not found: {err}", plan.program))
        .with_suggestion(|| {
            "install the assistant or point [launch] bin at it in config.toml".to_string()
        })?;
    tracing::debug!(program = %resolved.display(), args = ?plan.args, "launching");

    let mut cmd = Command::new(&resolved);
    cmd.args(&plan.args);
    cmd.envs(plan.set.iter());
    for key in &plan.remove {
        cmd.env_remove(key);
    }

    let status = cmd
        .status()
        .wrap_err_with(|| format!("failed to start {}", resolved.display()))?;
    if status.success() {
        return Ok(());
    }
    Err(AppError::ChildExited {
        program: plan.program.clone(),
        code: status.code().unwrap_or(1),
    }
    .into())
}
