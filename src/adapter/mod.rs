//! Command-line adapter for the extractor
//!
//! Hosts call extraction modules with old-style arguments
//! (`image mask --param file --label N`). This module rewrites them into the
//! style the radiomics command line expects and forces the options the batch
//! relies on: CSV output, informational logging and mask correction.

use log::debug;

use crate::errors::{RadiomicsError, RadiomicsResult};

/// Arguments always appended to the extractor command line
pub const FORCED_ARGS: [&str; 3] = ["--format=csv", "--verbosity=4", "--setting=correctMask:True"];

/// Optional rewrites needed by some hosts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Rewrite `--outdir` to `--out-dir`
    pub rename_outdir: bool,
    /// Replace backslashes by forward slashes in every argument
    pub posix_paths: bool,
}

/// What the wrapper has to do with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdaptedCommand {
    /// Print the module descriptor and exit
    PrintDescriptor,
    /// Run the extractor with these arguments
    Run(Vec<String>),
}

/// Translate host arguments into extractor arguments
///
/// # Arguments
/// * `args` - Arguments without the program name
/// * `options` - Optional rewrites
///
/// # Returns
/// The command to carry out, or an error when `--label` has no value
pub fn translate_args(args: &[String], options: AdapterOptions) -> RadiomicsResult<AdaptedCommand> {
    if matches!(args.first().map(String::as_str), Some("--xml") | Some("-x")) {
        return Ok(AdaptedCommand::PrintDescriptor);
    }

    let mut translated: Vec<String> = Vec::with_capacity(args.len() + FORCED_ARGS.len() + 1);
    let mut label: Option<String> = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--label" {
            let value = iter.next().ok_or_else(|| {
                RadiomicsError::ConfigError("Missing value for --label".to_string())
            })?;
            label = Some(value.clone());
        } else if let Some(value) = arg.strip_prefix("--label=") {
            label = Some(value.to_string());
        } else if options.rename_outdir && (arg == "--outdir" || arg.starts_with("--outdir=")) {
            translated.push(arg.replacen("--outdir", "--out-dir", 1));
        } else {
            translated.push(arg.clone());
        }
    }

    if let Some(label) = label {
        translated.push(format!("--setting=label:{}", label));
    }

    if options.posix_paths {
        for arg in translated.iter_mut() {
            if arg.contains('\\') {
                *arg = arg.replace('\\', "/");
            }
        }
    }

    translated.extend(FORCED_ARGS.iter().map(|a| a.to_string()));

    debug!("Translated extractor arguments: {:?}", translated);
    Ok(AdaptedCommand::Run(translated))
}

/// Build the old-style arguments of one extraction
pub fn host_args(image: &str, mask: &str, parameter_file: &str, label: u32) -> Vec<String> {
    vec![
        image.to_string(),
        mask.to_string(),
        "--param".to_string(),
        parameter_file.to_string(),
        "--label".to_string(),
        label.to_string(),
    ]
}
