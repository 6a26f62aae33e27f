fn main() -> color_eyre::Result<()> {
    ccenv::install_error_hook()?;
    let cli = ccenv::parse_cli();
    match ccenv::run(&cli) {
        Ok(()) => Ok(()),
        Err(err) => {
            let exit_code = ccenv::exit_code_for_error(&err);
            ccenv::write_cli_error(&err, &mut std::io::stderr())?;
            std::process::exit(exit_code);
        }
    }
}
