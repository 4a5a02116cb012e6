//! IoU-based overlap suppression.

use crate::detect::result::{BoundingBox, Detection};

/// Intersection area over union area of two boxes, in [0, 1].
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = ix * iy;
    let union = a.area() + b.area() - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Greedy suppression over candidates already sorted by descending
/// confidence. A candidate is dropped when its IoU with any already-kept
/// candidate exceeds `iou_threshold`. Class-agnostic.
pub fn suppress(sorted: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut kept: Vec<Detection> = Vec::with_capacity(sorted.len());
    for candidate in sorted {
        let overlaps = kept
            .iter()
            .any(|k| iou(&k.bbox, &candidate.bbox) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox { x1, y1, x2, y2 }
    }

    fn det(class_id: u16, confidence: f32, b: BoundingBox) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: b,
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = bbox(0.0, 0.0, 10.0, 10.0);
        assert!((iou(&b, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        assert_eq!(iou(&bbox(0.0, 0.0, 10.0, 10.0), &bbox(20.0, 20.0, 30.0, 30.0)), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        // 10x10 boxes offset by 5 in x: intersection 50, union 150.
        let v = iou(&bbox(0.0, 0.0, 10.0, 10.0), &bbox(5.0, 0.0, 15.0, 10.0));
        assert!((v - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn suppresses_heavily_overlapping_lower_ranked_box() {
        let kept = suppress(
            vec![
                det(0, 0.9, bbox(0.0, 0.0, 10.0, 10.0)),
                det(0, 0.8, bbox(1.0, 1.0, 11.0, 11.0)),
                det(0, 0.7, bbox(50.0, 50.0, 60.0, 60.0)),
            ],
            0.45,
        );
        let confs: Vec<f32> = kept.iter().map(|d| d.confidence).collect();
        assert_eq!(confs, vec![0.9, 0.7]);
    }

    #[test]
    fn suppression_crosses_class_boundaries() {
        // Same region, different classes: the lower-confidence one loses.
        let kept = suppress(
            vec![
                det(15, 0.9, bbox(0.0, 0.0, 10.0, 10.0)),
                det(16, 0.8, bbox(0.5, 0.5, 10.5, 10.5)),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].class_id, 15);
    }

    #[test]
    fn mild_overlap_below_threshold_survives() {
        let kept = suppress(
            vec![
                det(0, 0.9, bbox(0.0, 0.0, 10.0, 10.0)),
                det(0, 0.8, bbox(8.0, 8.0, 18.0, 18.0)),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 2);
    }
}
