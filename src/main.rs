use std::process;
use log::error;

use radiokit::cli::build_cli;
use radiokit::commands::{CommandFactory, RadiokitCommandFactory};
use radiokit::utils::logger::Logger;

fn main() {
    let matches = build_cli().get_matches();

    let log_file = "radiokit.log";
    let logger = match Logger::new(log_file) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error initializing logger: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = Logger::init_global_logger("radiokit-global.log") {
        eprintln!("Error setting up global logger: {}", e);
        process::exit(1);
    }
    if !matches.get_flag("verbose") {
        log::set_max_level(log::LevelFilter::Info);
    }

    let factory = RadiokitCommandFactory::new();

    let command_result = factory.create_command(&matches, &logger);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
