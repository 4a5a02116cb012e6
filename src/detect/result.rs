//! Detection results for one frame.
//!
//! `DetectionSet` owns the post-processing contract: every retained
//! detection clears the confidence threshold, its box lies within the
//! producing frame, ordering is descending confidence with ascending
//! class-id tie-break, and overlapping boxes have been suppressed.

use crate::detect::nms;

/// Axis-aligned box in frame pixel coordinates, `x1 <= x2`, `y1 <= y2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Clamp all coordinates into `[0, width] x [0, height]`.
    fn clamped(self, width: f32, height: f32) -> Self {
        Self {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }

    fn is_degenerate(&self) -> bool {
        !(self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite())
            || self.x2 <= self.x1
            || self.y2 <= self.y1
    }
}

/// One candidate detection as reported by a backend.
#[derive(Clone, Copy, Debug)]
pub struct Detection {
    /// COCO class id, 0..=79.
    pub class_id: u16,
    /// Model-reported probability in [0, 1].
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Post-processed, ordered detections for one frame. Not retained across
/// frames.
#[derive(Clone, Debug, Default)]
pub struct DetectionSet {
    detections: Vec<Detection>,
}

impl DetectionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from raw backend candidates.
    ///
    /// Candidates below `confidence_threshold`, with non-finite confidence,
    /// or with degenerate boxes are dropped; surviving boxes are clamped to
    /// the frame. Suppression is class-agnostic: a lower-ranked box is
    /// removed when its IoU with any kept box exceeds `iou_threshold`,
    /// regardless of class.
    pub fn from_candidates(
        candidates: Vec<Detection>,
        confidence_threshold: f32,
        iou_threshold: f32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let (w, h) = (frame_width as f32, frame_height as f32);
        let mut kept: Vec<Detection> = candidates
            .into_iter()
            .filter(|d| d.confidence.is_finite())
            .filter(|d| d.confidence >= confidence_threshold && d.confidence <= 1.0)
            .map(|mut d| {
                d.bbox = d.bbox.clamped(w, h);
                d
            })
            .filter(|d| !d.bbox.is_degenerate())
            .collect();

        // Stable sort keeps the relative order of fully tied candidates.
        kept.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.class_id.cmp(&b.class_id))
        });

        Self {
            detections: nms::suppress(kept, iou_threshold),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn det(class_id: u16, confidence: f32, bbox: (f32, f32, f32, f32)) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: BoundingBox {
                x1: bbox.0,
                y1: bbox.1,
                x2: bbox.2,
                y2: bbox.3,
            },
        }
    }

    #[test]
    fn orders_by_confidence_then_class_id() {
        // Boxes kept disjoint so suppression does not interfere.
        let set = DetectionSet::from_candidates(
            vec![
                det(15, 0.40, (0.0, 0.0, 10.0, 10.0)),
                det(15, 0.40, (100.0, 100.0, 110.0, 110.0)),
                det(16, 0.90, (200.0, 200.0, 210.0, 210.0)),
            ],
            0.25,
            0.45,
            640,
            480,
        );
        let order: Vec<(u16, f32)> = set.iter().map(|d| (d.class_id, d.confidence)).collect();
        assert_eq!(order, vec![(16, 0.90), (15, 0.40), (15, 0.40)]);
    }

    #[test]
    fn tie_break_prefers_lower_class_id() {
        let set = DetectionSet::from_candidates(
            vec![
                det(16, 0.40, (0.0, 0.0, 10.0, 10.0)),
                det(15, 0.40, (100.0, 100.0, 110.0, 110.0)),
            ],
            0.25,
            0.45,
            640,
            480,
        );
        let classes: Vec<u16> = set.iter().map(|d| d.class_id).collect();
        assert_eq!(classes, vec![15, 16]);
    }

    #[test]
    fn drops_candidates_below_threshold() {
        let set = DetectionSet::from_candidates(
            vec![
                det(0, 0.20, (0.0, 0.0, 10.0, 10.0)),
                det(0, 0.60, (100.0, 100.0, 110.0, 110.0)),
            ],
            0.50,
            0.45,
            640,
            480,
        );
        assert_eq!(set.len(), 1);
        assert!(set.iter().all(|d| d.confidence >= 0.50));
    }

    #[test]
    fn clamps_boxes_to_frame_bounds() {
        let set = DetectionSet::from_candidates(
            vec![det(0, 0.90, (-20.0, -5.0, 700.0, 500.0))],
            0.25,
            0.45,
            640,
            480,
        );
        let d = set.iter().next().unwrap();
        assert_eq!(d.bbox, BoundingBox { x1: 0.0, y1: 0.0, x2: 640.0, y2: 480.0 });
    }

    #[test]
    fn drops_degenerate_and_non_finite_candidates() {
        let set = DetectionSet::from_candidates(
            vec![
                det(0, 0.90, (50.0, 50.0, 50.0, 80.0)),
                det(0, f32::NAN, (0.0, 0.0, 10.0, 10.0)),
                det(0, 0.90, (700.0, 0.0, 720.0, 10.0)),
            ],
            0.25,
            0.45,
            640,
            480,
        );
        assert!(set.is_empty());
    }
}
