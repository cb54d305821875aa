use std::process::ExitCode;

fn main() -> ExitCode {
    ecobuilder::cli::main()
}
