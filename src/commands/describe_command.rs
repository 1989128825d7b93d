//! Module descriptor command

use crate::commands::command_traits::Command;
use crate::errors::RadiomicsResult;
use crate::utils::logger::Logger;
use crate::utils::xml_utils::module_descriptor;

/// Prints the XML descriptor of the extraction module
pub struct DescribeCommand<'a> {
    logger: &'a Logger,
}

impl<'a> DescribeCommand<'a> {
    pub fn new(logger: &'a Logger) -> Self {
        DescribeCommand { logger }
    }
}

impl<'a> Command for DescribeCommand<'a> {
    fn execute(&self) -> RadiomicsResult<()> {
        self.logger.debug("Printing module descriptor");
        println!("{}", module_descriptor()?);
        Ok(())
    }
}
