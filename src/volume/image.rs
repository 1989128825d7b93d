//! Image volumes handed to the extractor

use std::path::{Path, PathBuf};

use crate::errors::{RadiomicsError, RadiomicsResult};

/// Derive a display name from a volume file path
///
/// Double extensions such as `.nii.gz` are removed as a whole.
pub fn volume_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    for suffix in [".nii.gz", ".nii", ".seg.nrrd", ".nrrd", ".mha", ".mhd"] {
        if let Some(stripped) = file_name.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }

    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or(file_name)
}

/// Image from which features are extracted
///
/// The voxels are never read here; the extractor opens the file itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageVolume {
    /// Name of the image, used in logs
    pub name: String,
    /// Location of the image file
    pub path: PathBuf,
}

impl ImageVolume {
    /// Open an image, checking it has data on disk
    ///
    /// # Arguments
    /// * `path` - Path to the image file
    ///
    /// # Returns
    /// The image or an error when the file does not exist
    pub fn open(path: &Path) -> RadiomicsResult<Self> {
        if !path.is_file() {
            return Err(RadiomicsError::VolumeError(format!(
                "Image has no data: {} is not a file", path.display()
            )));
        }
        Ok(ImageVolume {
            name: volume_name(path),
            path: path.to_path_buf(),
        })
    }

    /// Create an image reference without touching the file system
    pub fn new(name: &str, path: &Path) -> Self {
        ImageVolume {
            name: name.to_string(),
            path: path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_name_strips_double_extension() {
        assert_eq!(volume_name(Path::new("/data/lung_mask.nii.gz")), "lung_mask");
        assert_eq!(volume_name(Path::new("ct.nrrd")), "ct");
        assert_eq!(volume_name(Path::new("scan.tif")), "scan");
    }

    #[test]
    fn test_open_missing_image_fails() {
        assert!(ImageVolume::open(Path::new("/nonexistent/ct.nii.gz")).is_err());
    }
}
