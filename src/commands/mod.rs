//! CLI command implementations
//!
//! This module contains the commands supported by the CLI application using
//! the Command pattern.

pub mod command_traits;
pub mod describe_command;
pub mod extract_command;
pub mod list_features_command;

pub use command_traits::{Command, CommandFactory};
pub use describe_command::DescribeCommand;
pub use extract_command::{BusyFlag, ExtractCommand};
pub use list_features_command::ListFeaturesCommand;

use clap::ArgMatches;
use crate::errors::RadiomicsResult;
use crate::utils::logger::Logger;

/// Factory for creating command instances based on CLI arguments
pub struct RadiokitCommandFactory;

impl RadiokitCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        RadiokitCommandFactory
    }
}

impl Default for RadiokitCommandFactory {
    fn default() -> Self {
        RadiokitCommandFactory::new()
    }
}

impl<'a> CommandFactory<'a> for RadiokitCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> RadiomicsResult<Box<dyn Command + 'a>> {
        if args.get_flag("xml") {
            Ok(Box::new(DescribeCommand::new(logger)))
        } else if args.get_flag("list-features") {
            Ok(Box::new(ListFeaturesCommand::new(logger)))
        } else {
            // Default to extraction
            Ok(Box::new(ExtractCommand::new(args, logger)?))
        }
    }
}
