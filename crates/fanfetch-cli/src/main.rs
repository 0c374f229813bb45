use fanfetch_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    match CliCommand::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("fanfetch error: {:#}", err);
            std::process::ExitCode::FAILURE
        }
    }
}
