//! Result ranking and line formatting.
//!
//! Turns a post-processed `DetectionSet` into display-ready lines: the top
//! `max_labels` detections, label resolved for the locale, confidence as an
//! integer percentage, text fitted to the target slot's width budget.
//!
//! Truncation policy: the label gives way first (with a trailing `…`), the
//! percentage suffix is never cut. If not even a one-character label fits
//! next to the percentage, the line degrades to a fixed placeholder that is
//! clipped to the budget.

use crate::detect::DetectionSet;
use crate::display::DisplayGeometry;
use crate::labels::{self, Locale};

const TRUNCATION_MARK: char = '…';
const PLACEHOLDER: &str = "----";

/// One fully formatted, width-constrained display row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedLine {
    /// Target display slot, 0 = topmost.
    pub slot: usize,
    pub text: String,
}

/// Select and format the top detections for the target display.
///
/// An empty set yields no lines; the renderer shows its idle state for the
/// detection slots while the frame rate stays visible.
pub fn rank(
    set: &DetectionSet,
    max_labels: usize,
    geometry: &DisplayGeometry,
    locale: Locale,
) -> Vec<RankedLine> {
    let slots = max_labels.min(geometry.label_slots());
    set.iter()
        .take(slots)
        .enumerate()
        .map(|(slot, det)| RankedLine {
            slot,
            text: fit_line(
                labels::resolve(det.class_id, locale),
                confidence_percent(det.confidence),
                slot,
                geometry,
            ),
        })
        .collect()
}

/// Confidence as an integer percentage, round-half-up: 0.953 -> 95,
/// 0.955 -> 96.
pub fn confidence_percent(confidence: f32) -> u8 {
    let clamped = f64::from(confidence).clamp(0.0, 1.0);
    (clamped * 100.0 + 0.5).floor() as u8
}

fn fit_line(label: &str, percent: u8, slot: usize, geometry: &DisplayGeometry) -> String {
    let suffix = format!("{percent}%");

    let full = format!("{label} {suffix}");
    if geometry.line_fits(slot, &full) {
        return full;
    }

    // Shorten the label, keep the percentage intact.
    let mut chars: Vec<char> = label.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        if chars.is_empty() {
            break;
        }
        let shortened: String = chars.iter().collect();
        let candidate = format!("{shortened}{TRUNCATION_MARK} {suffix}");
        if geometry.line_fits(slot, &candidate) {
            return candidate;
        }
    }

    // Fixed placeholder, clipped until it fits.
    let mut placeholder: Vec<char> = PLACEHOLDER.chars().collect();
    while !placeholder.is_empty() {
        let candidate: String = placeholder.iter().collect();
        if geometry.line_fits(slot, &candidate) {
            return candidate;
        }
        placeholder.pop();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, Detection};

    fn char16() -> DisplayGeometry {
        DisplayGeometry::Character { cols: 16, rows: 2 }
    }

    fn set_of(entries: &[(u16, f32)]) -> DetectionSet {
        // Disjoint unit boxes so suppression never interferes.
        let candidates = entries
            .iter()
            .enumerate()
            .map(|(i, &(class_id, confidence))| Detection {
                class_id,
                confidence,
                bbox: BoundingBox {
                    x1: i as f32 * 10.0,
                    y1: 0.0,
                    x2: i as f32 * 10.0 + 5.0,
                    y2: 5.0,
                },
            })
            .collect();
        DetectionSet::from_candidates(candidates, 0.0, 0.45, 640, 480)
    }

    #[test]
    fn keeps_first_max_labels_of_sorted_sequence() {
        let set = set_of(&[(0, 0.9), (16, 0.8), (15, 0.7), (2, 0.6), (5, 0.5)]);
        let lines = rank(&set, 2, &char16(), Locale::En);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], RankedLine { slot: 0, text: "Person 90%".into() });
        assert_eq!(lines[1], RankedLine { slot: 1, text: "Dog 80%".into() });
    }

    #[test]
    fn japanese_person_line_on_character_display() {
        let set = set_of(&[(0, 0.953)]);
        let lines = rank(&set, 2, &char16(), Locale::Ja);
        assert_eq!(lines[0].text, "人 95%");
        assert!(lines[0].text.chars().count() <= 16);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(confidence_percent(0.953), 95);
        assert_eq!(confidence_percent(0.955), 96);
        assert_eq!(confidence_percent(1.0), 100);
        assert_eq!(confidence_percent(0.0), 0);
    }

    #[test]
    fn long_label_is_shortened_but_percentage_survives() {
        let geom = DisplayGeometry::Character { cols: 10, rows: 2 };
        // "Toothbrush 100%" is 15 chars; budget is 10.
        let set = set_of(&[(79, 0.999)]);
        let lines = rank(&set, 1, &geom, Locale::En);
        let text = &lines[0].text;
        assert!(text.chars().count() <= 10, "{text}");
        assert!(text.ends_with("100%"), "{text}");
        assert!(text.contains(TRUNCATION_MARK), "{text}");
        assert_eq!(lines[0].text, "Toot… 100%");
    }

    #[test]
    fn impossible_budget_degrades_to_placeholder() {
        let geom = DisplayGeometry::Character { cols: 3, rows: 2 };
        let set = set_of(&[(79, 0.999)]);
        let lines = rank(&set, 1, &geom, Locale::En);
        assert_eq!(lines[0].text, "---");
    }

    #[test]
    fn empty_set_produces_no_lines() {
        let lines = rank(&DetectionSet::empty(), 3, &char16(), Locale::En);
        assert!(lines.is_empty());
    }

    #[test]
    fn slots_never_exceed_geometry() {
        let set = set_of(&[(0, 0.9), (1, 0.8), (2, 0.7), (3, 0.6)]);
        let lines = rank(&set, 4, &char16(), Locale::En);
        assert_eq!(lines.len(), 2);
    }
}
