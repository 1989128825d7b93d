//! Segmentations
//!
//! A segmentation is a named set of segments, each stored as its own volume.
//! Before extraction a segment is converted into a binary labelmap (label 1)
//! written to a scratch file.

use std::fs;
use std::path::{Path, PathBuf};

use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::errors::{RadiomicsError, RadiomicsResult};
use crate::volume::image::volume_name;

/// Label value of the foreground in a converted segment
pub const SEGMENT_LABEL: u32 = 1;

/// One segment of a segmentation
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Segment name, used to build region identifiers
    pub name: String,
    /// Volume holding the segment, non-zero voxels belong to it
    pub source: PathBuf,
}

impl Segment {
    pub fn new(name: &str, source: &Path) -> Self {
        Segment {
            name: name.to_string(),
            source: source.to_path_buf(),
        }
    }
}

/// Named collection of segments
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub name: String,
    pub segments: Vec<Segment>,
}

impl Segmentation {
    pub fn new(name: &str, segments: Vec<Segment>) -> Self {
        Segmentation {
            name: name.to_string(),
            segments,
        }
    }

    /// Load a segmentation from a directory of per-segment NIfTI files
    ///
    /// The directory name becomes the segmentation name and each file stem a
    /// segment name. Segments are ordered by file name.
    ///
    /// # Arguments
    /// * `dir` - Directory holding `.nii` or `.nii.gz` files
    pub fn from_dir(dir: &Path) -> RadiomicsResult<Self> {
        if !dir.is_dir() {
            return Err(RadiomicsError::VolumeError(format!(
                "Segmentation directory not found: {}", dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let name = path.to_string_lossy().to_lowercase();
                path.is_file() && (name.ends_with(".nii") || name.ends_with(".nii.gz"))
            })
            .collect();
        files.sort();

        let segments = files
            .iter()
            .map(|path| Segment::new(&volume_name(path), path))
            .collect();

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "segmentation".to_string());

        Ok(Segmentation::new(&name, segments))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Converts a segment into a binary labelmap file
pub trait SegmentConverter {
    /// Write the binary labelmap of `segment` to `target`
    ///
    /// # Arguments
    /// * `segment` - Segment to convert
    /// * `target` - Scratch file receiving the labelmap, overwritten if present
    ///
    /// # Returns
    /// Result indicating success or why the segment cannot be used
    fn convert(&self, segment: &Segment, target: &Path) -> RadiomicsResult<()>;
}

/// Converter for segments stored as NIfTI volumes
#[derive(Debug, Default, Clone, Copy)]
pub struct NiftiSegmentConverter;

impl SegmentConverter for NiftiSegmentConverter {
    fn convert(&self, segment: &Segment, target: &Path) -> RadiomicsResult<()> {
        let obj = ReaderOptions::new().read_file(&segment.source)?;
        let header = obj.header().clone();
        let voxels = obj.into_volume().into_ndarray::<f32>()?;

        let mask = voxels.mapv(|v| if v != 0.0 { SEGMENT_LABEL as u8 } else { 0u8 });
        if !mask.iter().any(|&v| v != 0) {
            return Err(RadiomicsError::VolumeError(format!(
                "Segment {} has no foreground voxels", segment.name
            )));
        }

        WriterOptions::new(target)
            .reference_header(&header)
            .write_nifti(&mask)?;
        Ok(())
    }
}
