use clap::Parser;
use lintgate::CheckError;
use lintgate::check::EXIT_ERROR;
use lintgate::cli::{Cli, Output};

fn main() {
    let cli = Cli::parse();
    let output = Output::new(cli.verbose > 0, cli.quiet);

    let code = match cli.run() {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<CheckError>() {
                // The pool lost or duplicated a result; not something the user can fix
                Some(err) if !err.is_precondition() => {
                    output.error(&format!("internal error, please report: {e:#}"))
                }
                _ => output.error(&format!("{e:#}")),
            }
            EXIT_ERROR
        }
    };

    std::process::exit(code);
}
