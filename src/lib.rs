pub mod cli;
pub mod config;
pub mod error;
pub mod launch;
pub mod profile;
pub mod shell;
pub mod store;
pub mod templates;

mod app;
#[doc(hidden)]
pub mod test_support;
mod util;

use std::io::Write;

use clap::{CommandFactory, Parser};
use cli::Command;

pub use app::{App, CurrentStatus};
pub use cli::Cli;
pub use error::AppError;
pub use profile::Profile;
pub use shell::{
    ShellDialect, detect_shell, generate_env_vars, generate_reset_script, generate_shell_script,
};
pub use store::{FileBackend, MemoryBackend, ProfileStore, StoreBackend};

/// Run the ccx CLI entrypoint.
///
/// # Errors
///
/// Returns an error when initialization or the chosen command fails to execute.
pub fn run(cli: &Cli) -> color_eyre::Result<()> {
    init_tracing(cli);

    let mut app = App::bootstrap(cli)?;
    for diag in &app.loaded.diagnostics {
        tracing::warn!("config {}: {}", diag.level.label(), diag.message);
    }

    match &cli.command {
        None | Some(Command::List) => app.list(),
        Some(Command::Show(cmd)) => app.show(cmd),
        Some(Command::Create(cmd)) => app.create(cmd),
        Some(Command::Edit(cmd)) => app.edit(cmd),
        Some(Command::Delete(cmd)) => app.delete(cmd),
        Some(Command::Use(cmd)) => app.use_profile(cmd),
        Some(Command::Reset(cmd)) => app.reset(cmd),
        Some(Command::Env(cmd)) => app.env(cmd),
        Some(Command::Current) => app.current(),
        Some(Command::Templates) => app.templates(),
        Some(Command::Export(cmd)) => app.export(cmd),
        Some(Command::Import(cmd)) => app.import(cmd),
        Some(Command::Run(cmd)) => app.run(cmd),
        Some(Command::RunDefault(cmd)) => app.run_default(cmd),
        Some(Command::Config(cmd)) => app.config(cmd),
        Some(Command::Doctor) => app.doctor(),
    }
}

fn init_tracing(cli: &Cli) {
    let level = desired_level(cli);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // stdout carries scripts meant for eval; logs must never land there.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn desired_level(cli: &Cli) -> tracing::level_filters::LevelFilter {
    if cli.quiet {
        return tracing::level_filters::LevelFilter::ERROR;
    }

    match cli.verbose {
        0 => tracing::level_filters::LevelFilter::WARN,
        1 => tracing::level_filters::LevelFilter::INFO,
        2 => tracing::level_filters::LevelFilter::DEBUG,
        _ => tracing::level_filters::LevelFilter::TRACE,
    }
}

#[must_use]
pub fn command() -> clap::Command {
    Cli::command()
}

/// Parse the process arguments; clap exits on `--help` or usage errors.
#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Exit status for a failed run: 2 for user errors, the child's own status
/// when the assistant exited unsuccessfully, 1 otherwise.
#[must_use]
pub fn exit_code_for_error(err: &color_eyre::Report) -> i32 {
    err.downcast_ref::<AppError>().map_or(1, AppError::exit_code)
}

/// Install the `color_eyre` hook without the location and environment
/// sections, so [`write_cli_error`] only adds the suggestions commands attach.
///
/// # Errors
///
/// Returns an error when a hook is already installed.
pub fn install_error_hook() -> color_eyre::Result<()> {
    color_eyre::config::HookBuilder::blank()
        .display_location_section(false)
        .display_env_section(false)
        .theme(color_eyre::config::Theme::new())
        .install()
}

/// Print `ccx: <error>` followed by its causes and any attached sections.
///
/// A child that exited unsuccessfully has already reported to the user, so
/// nothing is written for it.
///
/// # Errors
///
/// Returns an error when `out` cannot be written.
pub fn write_cli_error(err: &color_eyre::Report, out: &mut impl Write) -> std::io::Result<()> {
    if matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::ChildExited { .. })
    ) {
        return Ok(());
    }
    writeln!(out, "ccx: {err}")?;
    for cause in err.chain().skip(1) {
        writeln!(out, "    caused by: {cause}")?;
    }
    if let Some(sections) = report_sections(err) {
        writeln!(out)?;
        writeln!(out, "{sections}")?;
    }
    Ok(())
}

/// Sections and suggestions as the `color_eyre` handler renders them after
/// the numbered error chain. `None` for reports built without that handler.
fn report_sections(err: &color_eyre::Report) -> Option<String> {
    if !err.handler().is::<color_eyre::Handler>() {
        return None;
    }
    let rendered = format!("{err:?}");
    let (start, _) = rendered
        .char_indices()
        .find(|&(idx, ch)| !ch.is_whitespace() && rendered[..idx].ends_with("\n\n"))?;
    let sections = rendered[start..].trim_end();
    (!sections.is_empty()).then(|| sections.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::{WrapErr, eyre};

    #[test]
    fn verbosity_maps_to_levels() {
        use tracing::level_filters::LevelFilter;
        let level = |args: &[&str]| desired_level(&Cli::parse_from(args));
        assert_eq!(level(&["ccx"]), LevelFilter::WARN);
        assert_eq!(level(&["ccx", "-v"]), LevelFilter::INFO);
        assert_eq!(level(&["ccx", "-vv"]), LevelFilter::DEBUG);
        assert_eq!(level(&["ccx", "-vvv"]), LevelFilter::TRACE);
        assert_eq!(level(&["ccx", "-q", "-vv"]), LevelFilter::ERROR);
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let not_found: color_eyre::Report = AppError::NotFound { name: "x".into() }.into();
        assert_eq!(exit_code_for_error(&not_found), 2);

        let child: color_eyre::Report = AppError::ChildExited {
            program: "claude".into(),
            code: 7,
        }
        .into();
        assert_eq!(exit_code_for_error(&child), 7);

        assert_eq!(exit_code_for_error(&eyre!("disk on fire")), 1);
    }

    #[test]
    fn cli_error_lists_causes() {
        let err = Err::<(), _>(eyre!("permission denied"))
            .wrap_err("failed to save profile")
            .expect_err("error");
        let mut out = Vec::new();
        write_cli_error(&err, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "ccx: failed to save profile\n    caused by: permission denied\n"
        );
    }

    #[test]
    fn child_exit_is_silent() {
        let err: color_eyre::Report = AppError::ChildExited {
            program: "claude".into(),
            code: 3,
        }
        .into();
        let mut out = Vec::new();
        write_cli_error(&err, &mut out).expect("write");
        assert!(out.is_empty());
    }
}
