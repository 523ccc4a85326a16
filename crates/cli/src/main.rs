use std::process::ExitCode;

fn main() -> ExitCode {
    robo_advisor_cli::run()
}
