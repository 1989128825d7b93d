//! Command line definition
//!
//! Shared by the `radiokit` binary and the command tests.

use clap::{Arg, ArgAction, Command as ClapCommand};

/// Build the argument parser of the `radiokit` binary
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("radiokit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract radiomics features for every region of interest of an image")
        .arg(
            Arg::new("input")
                .help("Input image volume")
                .required_unless_present_any(["list-features", "xml"])
                .index(1),
        )
        .arg(
            Arg::new("label")
                .short('l')
                .long("label")
                .help("Label volume, one region per non-zero label")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("segmentation")
                .short('s')
                .long("segmentation")
                .help("Directory of segment volumes, one region per segment")
                .value_name("DIR")
                .required(false),
        )
        .arg(
            Arg::new("param")
                .short('p')
                .long("param")
                .help("Parameter file (JSON or YAML) replacing the manual settings")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("features")
                .short('f')
                .long("features")
                .help("Comma separated feature classes to enable")
                .value_name("CLASSES")
                .conflicts_with("all-features")
                .required(false),
        )
        .arg(
            Arg::new("all-features")
                .long("all-features")
                .help("Enable every feature class")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("bin-width")
                .long("bin-width")
                .help("Width of the intensity bins")
                .value_name("WIDTH")
                .required(false),
        )
        .arg(
            Arg::new("symmetrical-glcm")
                .long("symmetrical-glcm")
                .help("Enforce a symmetrical GLCM (true or false)")
                .value_name("BOOL")
                .required(false),
        )
        .arg(
            Arg::new("resampled-spacing")
                .long("resampled-spacing")
                .help("Resampled voxel size in mm (x,y,z)")
                .value_name("X,Y,Z")
                .required(false),
        )
        .arg(
            Arg::new("log-sigma")
                .long("log-sigma")
                .help("LoG kernel sizes in mm, comma separated")
                .value_name("SIGMAS")
                .required(false),
        )
        .arg(
            Arg::new("wavelet")
                .long("wavelet")
                .help("Also calculate features on wavelet decompositions")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("CSV file receiving the feature table (stdout if omitted)")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("layout")
                .long("layout")
                .help("Table layout: columns (one column per region) or long")
                .value_name("LAYOUT")
                .default_value("columns"),
        )
        .arg(
            Arg::new("sync")
                .long("sync")
                .help("Wait for each extraction instead of polling its status")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("extractor")
                .long("extractor")
                .help("Extractor executable")
                .value_name("PROGRAM")
                .required(false),
        )
        .arg(
            Arg::new("posix-paths")
                .long("posix-paths")
                .help("Pass paths to the extractor with forward slashes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Hide the progress spinner")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-features")
                .long("list-features")
                .help("List the feature classes and image types")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("xml")
                .short('x')
                .long("xml")
                .help("Print the extraction module descriptor")
                .action(ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_not_required_for_listing() {
        assert!(build_cli().try_get_matches_from(["radiokit", "--list-features"]).is_ok());
        assert!(build_cli().try_get_matches_from(["radiokit", "--xml"]).is_ok());
        assert!(build_cli().try_get_matches_from(["radiokit"]).is_err());
    }

    #[test]
    fn test_feature_selection_conflicts() {
        let result = build_cli().try_get_matches_from(["radiokit", "ct.nii", "--features", "glcm", "--all-features"]);
        assert!(result.is_err());
    }
}
