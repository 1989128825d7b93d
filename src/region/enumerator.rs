//! Lazy enumeration of the regions of one batch
//!
//! Regions from a label volume and from a segmentation are chained into a
//! single sequence. Nothing is read or converted before the region is pulled,
//! and once the sequence ends it stays ended.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::vec;

use crate::region::roi::Region;
use crate::utils::logger::Logger;
use crate::volume::{ImageVolume, LabelVolume, SegmentConverter, Segmentation, SEGMENT_LABEL};

/// Name of the scratch labelmap reused for every segment
const SEGMENT_SCRATCH_FILE: &str = "segment_labelmap.nii.gz";

/// Regions defined by the labels of a label volume
struct LabelRegions<'a> {
    volume: LabelVolume,
    image: Rc<ImageVolume>,
    labels: Option<vec::IntoIter<u32>>,
    logger: &'a Logger,
}

impl<'a> Iterator for LabelRegions<'a> {
    type Item = Region;

    fn next(&mut self) -> Option<Region> {
        if self.labels.is_none() {
            self.logger.debug(&format!("Reading label volume {}", self.volume.path.display()));
            let labels = match self.volume.distinct_labels() {
                Ok(labels) => labels,
                Err(e) => {
                    self.logger.error(&format!("Failed to read labels of {}: {}", self.volume.name, e));
                    Vec::new()
                }
            };
            self.logger.debug(&format!("Found {} labels in {}", labels.len(), self.volume.name));
            self.labels = Some(labels.into_iter());
        }

        let label = self.labels.as_mut()?.next()?;
        Some(Region::from_label(&self.volume.name, self.volume.path.clone(), label, Rc::clone(&self.image)))
    }
}

/// Regions defined by the segments of a segmentation
///
/// Each segment is converted into the same scratch labelmap right before it
/// is handed out. The scratch file is removed when the segments run out or
/// the sequence is dropped.
struct SegmentRegions<'a> {
    segmentation: Segmentation,
    next_index: usize,
    converter: Rc<dyn SegmentConverter + 'a>,
    scratch: PathBuf,
    image: Rc<ImageVolume>,
    logger: &'a Logger,
}

impl<'a> SegmentRegions<'a> {
    fn remove_scratch(&self) {
        if self.scratch.is_file() {
            if let Err(e) = fs::remove_file(&self.scratch) {
                self.logger.warn(&format!("Failed to remove scratch labelmap {}: {}", self.scratch.display(), e));
            }
        }
    }
}

impl<'a> Iterator for SegmentRegions<'a> {
    type Item = Region;

    fn next(&mut self) -> Option<Region> {
        while let Some(segment) = self.segmentation.segments.get(self.next_index) {
            self.next_index += 1;

            self.logger.debug(&format!("Converting segment {} to {}", segment.name, self.scratch.display()));
            match self.converter.convert(segment, &self.scratch) {
                Ok(()) => {
                    return Some(Region::from_segment(
                        &self.segmentation.name,
                        &segment.name,
                        self.scratch.clone(),
                        SEGMENT_LABEL,
                        Rc::clone(&self.image),
                    ));
                }
                Err(e) => {
                    self.logger.error(&format!("Failed to convert label map for segment {}: {}", segment.name, e));
                }
            }
        }

        self.remove_scratch();
        None
    }
}

impl<'a> Drop for SegmentRegions<'a> {
    fn drop(&mut self) {
        self.remove_scratch();
    }
}

/// Single-pass sequence of all regions of a batch
pub struct RegionEnumerator<'a> {
    inner: Box<dyn Iterator<Item = Region> + 'a>,
    exhausted: bool,
    yielded: usize,
}

impl<'a> RegionEnumerator<'a> {
    /// Chain the regions of a label volume and a segmentation
    ///
    /// Both sources are optional; without any the sequence is empty.
    ///
    /// # Arguments
    /// * `image` - Image shared by every region
    /// * `label_volume` - Optional multi-label volume
    /// * `segmentation` - Optional segmentation
    /// * `converter` - Converter used for segments
    /// * `scratch_dir` - Directory receiving the segment scratch labelmap
    /// * `logger` - Logger for conversion failures
    pub fn new(image: Rc<ImageVolume>,
               label_volume: Option<LabelVolume>,
               segmentation: Option<Segmentation>,
               converter: Rc<dyn SegmentConverter + 'a>,
               scratch_dir: &Path,
               logger: &'a Logger) -> Self {
        let mut inner: Box<dyn Iterator<Item = Region> + 'a> = Box::new(std::iter::empty());

        if let Some(volume) = label_volume {
            inner = Box::new(inner.chain(LabelRegions {
                volume,
                image: Rc::clone(&image),
                labels: None,
                logger,
            }));
        }

        if let Some(segmentation) = segmentation {
            inner = Box::new(inner.chain(SegmentRegions {
                segmentation,
                next_index: 0,
                converter,
                scratch: scratch_dir.join(SEGMENT_SCRATCH_FILE),
                image,
                logger,
            }));
        }

        RegionEnumerator {
            inner,
            exhausted: false,
            yielded: 0,
        }
    }

    /// Whether the end of the sequence has been reached
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of regions handed out so far
    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl<'a> Iterator for RegionEnumerator<'a> {
    type Item = Region;

    fn next(&mut self) -> Option<Region> {
        if self.exhausted {
            return None;
        }

        match self.inner.next() {
            Some(region) => {
                self.yielded += 1;
                Some(region)
            }
            None => {
                self.exhausted = true;
                // Release sources and scratch files as soon as the sequence ends
                self.inner = Box::new(std::iter::empty());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use ndarray::{ArrayD, IxDyn};

    use crate::errors::{RadiomicsError, RadiomicsResult};
    use crate::volume::Segment;

    /// Writes a marker file instead of a labelmap, failing for listed segments
    struct FakeConverter {
        failing: Vec<String>,
        converted: RefCell<Vec<String>>,
    }

    impl SegmentConverter for FakeConverter {
        fn convert(&self, segment: &Segment, target: &Path) -> RadiomicsResult<()> {
            if self.failing.contains(&segment.name) {
                return Err(RadiomicsError::VolumeError("no binary labelmap".to_string()));
            }
            fs::write(target, segment.name.as_bytes())?;
            self.converted.borrow_mut().push(segment.name.clone());
            Ok(())
        }
    }

    fn converter(failing: &[&str]) -> Rc<FakeConverter> {
        Rc::new(FakeConverter {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            converted: RefCell::new(Vec::new()),
        })
    }

    fn image() -> Rc<ImageVolume> {
        Rc::new(ImageVolume::new("ct", Path::new("ct.nii.gz")))
    }

    fn label_volume(values: Vec<f32>) -> LabelVolume {
        let data = ArrayD::from_shape_vec(IxDyn(&[values.len()]), values).unwrap();
        LabelVolume::from_array("mask", Path::new("mask.nii.gz"), data)
    }

    fn segmentation(names: &[&str]) -> Segmentation {
        let segments = names.iter().map(|n| Segment::new(n, Path::new("unused.nii"))).collect();
        Segmentation::new("lesions", segments)
    }

    #[test]
    fn test_no_sources_is_empty() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let mut regions = RegionEnumerator::new(image(), None, None, converter(&[]), dir.path(), &logger);
        assert!(regions.next().is_none());
        assert!(regions.is_exhausted());
    }

    #[test]
    fn test_label_regions_then_segments() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let regions = RegionEnumerator::new(
            image(),
            Some(label_volume(vec![0.0, 2.0, 1.0, 2.0])),
            Some(segmentation(&["tumor", "edema"])),
            converter(&[]),
            dir.path(),
            &logger,
        );

        let ids: Vec<String> = regions.map(|r| r.id).collect();
        assert_eq!(ids, vec!["mask_label_1", "mask_label_2", "lesions_segment_tumor", "lesions_segment_edema"]);
    }

    #[test]
    fn test_segments_are_converted_lazily() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let conv = converter(&[]);
        let mut regions = RegionEnumerator::new(
            image(), None, Some(segmentation(&["a", "b", "c"])), conv.clone(), dir.path(), &logger,
        );

        let first = regions.next().unwrap();
        assert_eq!(first.label, SEGMENT_LABEL);
        assert_eq!(*conv.converted.borrow(), vec!["a".to_string()]);
        assert_eq!(fs::read_to_string(&first.mask).unwrap(), "a");
        assert!(logger.captured().iter().any(|l| l.starts_with("[DEBUG] Converting segment a to ")));
    }

    #[test]
    fn test_failed_conversion_skips_segment() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let regions = RegionEnumerator::new(
            image(), None, Some(segmentation(&["a", "b", "c"])), converter(&["b"]), dir.path(), &logger,
        );

        let ids: Vec<String> = regions.map(|r| r.id).collect();
        assert_eq!(ids, vec!["lesions_segment_a", "lesions_segment_c"]);
        assert_eq!(logger.count_level(log::Level::Error), 1);
    }

    #[test]
    fn test_scratch_labelmap_removed_at_end() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let mut regions = RegionEnumerator::new(
            image(), None, Some(segmentation(&["a"])), converter(&[]), dir.path(), &logger,
        );

        let region = regions.next().unwrap();
        assert!(region.mask.is_file());
        assert!(regions.next().is_none());
        assert!(!region.mask.exists());
    }

    #[test]
    fn test_exhausted_sequence_does_not_restart() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let mut regions = RegionEnumerator::new(
            image(), Some(label_volume(vec![1.0])), None, converter(&[]), dir.path(), &logger,
        );

        assert!(regions.next().is_some());
        assert!(regions.next().is_none());
        assert!(regions.next().is_none());
        assert_eq!(regions.yielded(), 1);
    }

    #[test]
    fn test_unreadable_label_volume_yields_nothing() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let mut regions = RegionEnumerator::new(
            image(),
            Some(LabelVolume::open(Path::new("/nonexistent/mask.nii.gz"))),
            Some(segmentation(&["a"])),
            converter(&[]),
            dir.path(),
            &logger,
        );

        assert_eq!(regions.next().unwrap().id, "lesions_segment_a");
        assert_eq!(logger.count_level(log::Level::Error), 1);
    }
}
