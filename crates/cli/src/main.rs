use std::process::ExitCode;

fn main() -> ExitCode {
    seafoodtruck_cli::run()
}
