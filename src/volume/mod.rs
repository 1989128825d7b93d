//! Volumes taking part in an extraction
//!
//! Images are only referenced by path; label volumes and segmentations are
//! read to find the regions of interest they define.

mod image;
mod label_volume;
mod segmentation;

pub use image::{volume_name, ImageVolume};
pub use label_volume::LabelVolume;
pub use segmentation::{NiftiSegmentConverter, Segment, SegmentConverter, Segmentation, SEGMENT_LABEL};
