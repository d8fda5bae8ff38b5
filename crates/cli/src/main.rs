use std::process::ExitCode;

fn main() -> ExitCode {
    tutur_cli::run()
}
