use std::process::ExitCode;

fn main() -> ExitCode {
    esm_cli::run()
}
