mod cli;
mod jq_exec;

use colored::Colorize;

fn main() {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.init_logging();
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
