mod cli;
mod codec;
mod driver;
mod emitter;
mod error;
mod filter;
mod resolver;
mod run;
mod sample;
mod schema;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run::run(cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
