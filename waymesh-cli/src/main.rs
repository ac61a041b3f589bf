//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init();
    if let Err(err) = waymesh_cli::run() {
        eprintln!("waymesh: {err}");
        std::process::exit(1);
    }
}
