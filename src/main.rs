//! inferjob CLI entry point.

#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use inferjob::constants::EXIT_FAILURE;

fn main() {
    match inferjob::run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}
