use std::process::ExitCode;

fn main() -> ExitCode {
    eatba_cli::run()
}
