//! In-tree build of `ccx` that integration tests drive through `cargo_bin`.

fn main() -> color_eyre::Result<()> {
    ccenv::install_error_hook()?;
    let cli = ccenv::parse_cli();
    if let Err(err) = ccenv::run(&cli) {
        let exit_code = ccenv::exit_code_for_error(&err);
        ccenv::write_cli_error(&err, &mut std::io::stderr())?;
        std::process::exit(exit_code);
    }
    Ok(())
}
