use clap::Parser;
use colored::Colorize;
use wvb_cli::{cli::Cli, commands, logging};

fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::run(cli) {
		eprintln!("{} {err}", "error:".red().bold());
		std::process::exit(1);
	}
}
