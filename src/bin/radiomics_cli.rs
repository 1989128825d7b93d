//! Extractor wrapper called with old-style host arguments
//!
//! Translates `image mask --param file --label N` into the radiomics command
//! line and runs it, or prints the module descriptor for `--xml`.

use std::env;
use std::process::{self, Command};

use log::{debug, error};

use radiokit::adapter::{translate_args, AdaptedCommand, AdapterOptions};
use radiokit::job::DEFAULT_EXTRACTOR;
use radiokit::utils::xml_utils::module_descriptor;

/// Executable run by the wrapper, overridable for other installations
const EXECUTABLE_VAR: &str = "RADIOMICS_EXECUTABLE";

fn flag_enabled(name: &str) -> bool {
    matches!(env::var(name).as_deref(), Ok("1") | Ok("true"))
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = AdapterOptions {
        rename_outdir: flag_enabled("RADIOMICS_RENAME_OUTDIR"),
        posix_paths: cfg!(windows) || flag_enabled("RADIOMICS_POSIX_PATHS"),
    };

    let command = match translate_args(&args, options) {
        Ok(command) => command,
        Err(e) => {
            error!("Invalid arguments: {}", e);
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    match command {
        AdaptedCommand::PrintDescriptor => match module_descriptor() {
            Ok(xml) => println!("{}", xml),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        AdaptedCommand::Run(args) => {
            let program = env::var(EXECUTABLE_VAR).unwrap_or_else(|_| DEFAULT_EXTRACTOR.to_string());
            debug!("Running {} {:?}", program, args);

            match Command::new(&program).args(&args).status() {
                Ok(status) => process::exit(status.code().unwrap_or(1)),
                Err(e) => {
                    eprintln!("Error: failed to run {}: {}", program, e);
                    process::exit(1);
                }
            }
        }
    }
}
