//! memberflow binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match memberflow::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            memberflow::ui::output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
