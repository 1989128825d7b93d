//! Region structure for one extraction
//!
//! A region of interest is one label of a label volume or one segment of a
//! segmentation, together with the image its features are extracted from.

use std::path::PathBuf;
use std::rc::Rc;

use crate::volume::ImageVolume;

/// Where a region came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// One label value of a multi-label volume
    LabelVolume,
    /// One segment converted to a scratch labelmap
    Segment,
}

/// Region of interest handed to the extractor
#[derive(Debug, Clone)]
pub struct Region {
    /// Identifier, `<volume>_label_<value>` or `<segmentation>_segment_<name>`
    pub id: String,
    /// Volume defining the region
    pub mask: PathBuf,
    /// Value of the region's voxels in `mask`
    pub label: u32,
    /// Image shared by every region of the batch
    pub image: Rc<ImageVolume>,
    pub source: RegionSource,
}

impl Region {
    /// Create a region for one label of a label volume
    ///
    /// # Arguments
    /// * `volume_name` - Name of the label volume
    /// * `mask` - Path of the label volume
    /// * `label` - Label value of the region
    /// * `image` - Image the region belongs to
    pub fn from_label(volume_name: &str, mask: PathBuf, label: u32, image: Rc<ImageVolume>) -> Self {
        Region {
            id: format!("{}_label_{}", volume_name, label),
            mask,
            label,
            image,
            source: RegionSource::LabelVolume,
        }
    }

    /// Create a region for a converted segment
    ///
    /// # Arguments
    /// * `segmentation_name` - Name of the segmentation
    /// * `segment_name` - Name of the segment
    /// * `mask` - Scratch labelmap holding the segment
    /// * `label` - Foreground value of the scratch labelmap
    /// * `image` - Image the region belongs to
    pub fn from_segment(segmentation_name: &str, segment_name: &str, mask: PathBuf,
                        label: u32, image: Rc<ImageVolume>) -> Self {
        Region {
            id: format!("{}_segment_{}", segmentation_name, segment_name),
            mask,
            label,
            image,
            source: RegionSource::Segment,
        }
    }
}
