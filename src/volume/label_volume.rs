//! Multi-label volumes
//!
//! A label volume encodes every region of interest by voxel value. The voxels
//! are only read when the labels are first needed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::errors::{RadiomicsError, RadiomicsResult};
use crate::volume::image::volume_name;

/// Integer encoded label volume
#[derive(Debug, Clone)]
pub struct LabelVolume {
    /// Name of the volume, used to build region identifiers
    pub name: String,
    /// Location of the volume file, handed to the extractor as the mask
    pub path: PathBuf,
    /// Voxel values, loaded on demand
    data: Option<ArrayD<f32>>,
}

impl LabelVolume {
    /// Reference a NIfTI label volume on disk without reading it
    pub fn open(path: &Path) -> Self {
        LabelVolume {
            name: volume_name(path),
            path: path.to_path_buf(),
            data: None,
        }
    }

    /// Create a label volume from voxels already in memory
    pub fn from_array(name: &str, path: &Path, data: ArrayD<f32>) -> Self {
        LabelVolume {
            name: name.to_string(),
            path: path.to_path_buf(),
            data: Some(data),
        }
    }

    /// Read the voxels if they are not loaded yet
    pub fn load(&mut self) -> RadiomicsResult<&ArrayD<f32>> {
        if self.data.is_none() {
            let obj = ReaderOptions::new().read_file(&self.path)?;
            let data = obj.into_volume().into_ndarray::<f32>()?;
            self.data = Some(data);
        }

        self.data
            .as_ref()
            .ok_or_else(|| RadiomicsError::VolumeError(format!("No voxels for {}", self.name)))
    }

    /// Distinct non-zero labels in ascending order
    ///
    /// # Returns
    /// The labels, or an error if the volume cannot be read or holds values
    /// that are not non-negative integers
    pub fn distinct_labels(&mut self) -> RadiomicsResult<Vec<u32>> {
        let name = self.name.clone();
        let data = self.load()?;

        let mut labels = BTreeSet::new();
        for &value in data.iter() {
            if value == 0.0 {
                continue;
            }
            if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f32 {
                return Err(RadiomicsError::VolumeError(format!(
                    "Label volume {} holds a voxel value that is not a label: {}", name, value
                )));
            }
            labels.insert(value as u32);
        }

        Ok(labels.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn volume(values: Vec<f32>) -> LabelVolume {
        let data = ArrayD::from_shape_vec(IxDyn(&[2, 2, values.len() / 4]), values).unwrap();
        LabelVolume::from_array("mask", Path::new("mask.nii.gz"), data)
    }

    #[test]
    fn test_distinct_labels_skip_background() {
        let mut labels = volume(vec![0.0, 3.0, 1.0, 3.0, 0.0, 0.0, 1.0, 7.0]);
        assert_eq!(labels.distinct_labels().unwrap(), vec![1, 3, 7]);
    }

    #[test]
    fn test_background_only_volume_has_no_labels() {
        let mut labels = volume(vec![0.0; 8]);
        assert!(labels.distinct_labels().unwrap().is_empty());
    }

    #[test]
    fn test_fractional_values_are_rejected() {
        let mut labels = volume(vec![0.0, 1.5, 0.0, 0.0]);
        assert!(labels.distinct_labels().is_err());
    }

    #[test]
    fn test_missing_file_fails_to_load() {
        let mut labels = LabelVolume::open(Path::new("/nonexistent/mask.nii.gz"));
        assert_eq!(labels.name, "mask");
        assert!(labels.distinct_labels().is_err());
    }
}
