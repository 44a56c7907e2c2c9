use std::process::ExitCode;

fn main() -> ExitCode {
    fabagen_lib::run()
}
