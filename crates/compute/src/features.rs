//! Deterministic profile-to-vector encoding.
//!
//! Builds feature vectors from categorical profile data (major, subjects,
//! tags) by hashing each identifier into a stable slot of a sectioned
//! vector layout. The encoding is an in-repo vector producer; callers may
//! substitute an embedding-backed producer without touching the engine.
//!
//! Layout for dimension `d` (d = 100 gives 20/40/40):
//!   [0, d/5)        major
//!   [d/5, 3d/5)     subjects
//!   [3d/5, d)       tags

use serde::Serialize;

use crate::normalize::{norm, normalize};

/// Weight given to the major slot in a user vector.
const USER_MAJOR_WEIGHT: f64 = 0.3;
/// Total weight split across a user's subject slots.
const USER_SUBJECT_WEIGHT: f64 = 0.4;
/// Total weight split across a user's tag slots.
const USER_TAG_WEIGHT: f64 = 0.3;
/// Weight of a conversation's subject slot.
const CONV_SUBJECT_WEIGHT: f64 = 0.5;
/// Total weight split across a conversation's tag slots.
const CONV_TAG_WEIGHT: f64 = 0.5;

/// Which layout section a dimension belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub enum Section {
    Major,
    Subject,
    Tag,
}

/// Debug report for an encoded vector.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VectorExplanation {
    pub dimension: usize,
    pub non_zero_count: usize,
    pub norm: f64,
    /// Strongest dimensions by absolute value, descending.
    pub top_dimensions: Vec<DimensionWeight>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DimensionWeight {
    pub index: usize,
    pub value: f64,
    pub section: Section,
}

/// Stateless encoder over a fixed vector dimension.
#[derive(Debug, Clone)]
pub struct ProfileEncoder {
    dimensions: usize,
}

impl ProfileEncoder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn major_range(&self) -> (usize, usize) {
        (0, self.dimensions / 5)
    }

    fn subject_range(&self) -> (usize, usize) {
        (self.dimensions / 5, 3 * self.dimensions / 5)
    }

    fn tag_range(&self) -> (usize, usize) {
        (3 * self.dimensions / 5, self.dimensions)
    }

    fn section_of(&self, index: usize) -> Section {
        if index < self.major_range().1 {
            Section::Major
        } else if index < self.subject_range().1 {
            Section::Subject
        } else {
            Section::Tag
        }
    }

    /// Hash `id` into a stable slot within `[start, end)`.
    fn slot(&self, id: &str, range: (usize, usize)) -> Option<usize> {
        let width = range.1 - range.0;
        if width == 0 {
            return None;
        }
        Some(range.0 + (fnv1a64(id) as usize % width))
    }

    /// Spread `total_weight` evenly over the slots of `ids`, capped at the
    /// section width. Colliding ids accumulate in the same slot.
    fn spread(&self, vector: &mut [f64], ids: &[String], range: (usize, usize), total_weight: f64) {
        let width = range.1 - range.0;
        let count = ids.len().min(width);
        if count == 0 {
            return;
        }
        let per_id = total_weight / count as f64;
        for id in ids.iter().take(count) {
            if let Some(slot) = self.slot(id, range) {
                vector[slot] += per_id;
            }
        }
    }

    /// Encode a user profile. Unit-normalized unless everything is empty
    /// (then the zero vector).
    pub fn user_vector(
        &self,
        major_id: Option<&str>,
        subject_ids: &[String],
        tag_ids: &[String],
    ) -> Vec<f64> {
        let mut vector = vec![0.0; self.dimensions];

        if let Some(major) = major_id {
            if let Some(slot) = self.slot(major, self.major_range()) {
                vector[slot] = USER_MAJOR_WEIGHT;
            }
        }
        self.spread(&mut vector, subject_ids, self.subject_range(), USER_SUBJECT_WEIGHT);
        self.spread(&mut vector, tag_ids, self.tag_range(), USER_TAG_WEIGHT);

        normalize(&vector)
    }

    /// Encode a conversation (study group) profile.
    pub fn conversation_vector(&self, subject_id: Option<&str>, tag_ids: &[String]) -> Vec<f64> {
        let mut vector = vec![0.0; self.dimensions];

        if let Some(subject) = subject_id {
            if let Some(slot) = self.slot(subject, self.subject_range()) {
                vector[slot] = CONV_SUBJECT_WEIGHT;
            }
        }
        self.spread(&mut vector, tag_ids, self.tag_range(), CONV_TAG_WEIGHT);

        normalize(&vector)
    }

    /// Blend newly observed profile data into an existing vector instead
    /// of recomputing it from scratch: `new = old + lr * delta`,
    /// re-normalized.
    pub fn update_incremental(
        &self,
        old: &[f64],
        major_id: Option<&str>,
        subject_ids: &[String],
        tag_ids: &[String],
        learning_rate: f64,
    ) -> Vec<f64> {
        let delta = self.user_vector(major_id, subject_ids, tag_ids);
        let blended: Vec<f64> = old
            .iter()
            .zip(delta.iter())
            .map(|(o, d)| o + learning_rate * d)
            .collect();
        normalize(&blended)
    }

    /// Summarize a vector for debugging: where its mass sits.
    pub fn explain(&self, vector: &[f64]) -> VectorExplanation {
        let mut indexed: Vec<(usize, f64)> = vector
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| *v != 0.0)
            .collect();
        indexed.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let top_dimensions = indexed
            .iter()
            .take(10)
            .map(|&(index, value)| DimensionWeight {
                index,
                value,
                section: self.section_of(index),
            })
            .collect();

        VectorExplanation {
            dimension: vector.len(),
            non_zero_count: indexed.len(),
            norm: norm(vector),
            top_dimensions,
        }
    }
}

/// FNV-1a over the id string. Stable across runs and platforms, unlike
/// the std hasher.
fn fnv1a64(s: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn user_vector_is_unit_normalized() {
        let encoder = ProfileEncoder::new(100);
        let vector = encoder.user_vector(
            Some("cs-001"),
            &ids(&["ml-001", "ai-002"]),
            &ids(&["python", "deep-learning"]),
        );

        assert_eq!(vector.len(), 100);
        assert!((norm(&vector) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_profile_encodes_to_zero_vector() {
        let encoder = ProfileEncoder::new(100);
        let vector = encoder.user_vector(None, &[], &[]);
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = ProfileEncoder::new(100);
        let a = encoder.user_vector(Some("cs-001"), &ids(&["ml-001"]), &ids(&["python"]));
        let b = encoder.user_vector(Some("cs-001"), &ids(&["ml-001"]), &ids(&["python"]));
        assert_eq!(a, b);
    }

    #[test]
    fn sections_do_not_overlap() {
        let encoder = ProfileEncoder::new(100);

        let major_only = encoder.user_vector(Some("cs-001"), &[], &[]);
        for (i, v) in major_only.iter().enumerate() {
            if *v != 0.0 {
                assert!(i < 20, "major weight landed at dim {i}");
            }
        }

        let tags_only = encoder.user_vector(None, &[], &ids(&["python", "rust"]));
        for (i, v) in tags_only.iter().enumerate() {
            if *v != 0.0 {
                assert!(i >= 60, "tag weight landed at dim {i}");
            }
        }
    }

    #[test]
    fn similar_profiles_score_high() {
        let encoder = ProfileEncoder::new(100);
        let user = encoder.user_vector(None, &ids(&["ml-001"]), &ids(&["python"]));
        let conv_same = encoder.conversation_vector(Some("ml-001"), &ids(&["python"]));
        let conv_other = encoder.conversation_vector(Some("chem-101"), &ids(&["lab-safety"]));

        let same = crate::similarity::score_single(&user, &conv_same);
        let other = crate::similarity::score_single(&user, &conv_other);
        assert!(same > other, "same={same} other={other}");
        assert!(same > 0.5);
    }

    #[test]
    fn incremental_update_shifts_toward_new_interest() {
        let encoder = ProfileEncoder::new(100);
        let old = encoder.user_vector(None, &ids(&["ml-001"]), &[]);
        let updated = encoder.update_incremental(&old, None, &ids(&["chem-101"]), &[], 0.2);

        assert!((norm(&updated) - 1.0).abs() < 1e-9);
        let toward_new = encoder.user_vector(None, &ids(&["chem-101"]), &[]);
        let before = crate::similarity::score_single(&old, &toward_new);
        let after = crate::similarity::score_single(&updated, &toward_new);
        assert!(after > before);
    }

    #[test]
    fn explain_reports_layout_sections() {
        let encoder = ProfileEncoder::new(100);
        let vector = encoder.user_vector(Some("cs-001"), &ids(&["ml-001"]), &ids(&["python"]));
        let explanation = encoder.explain(&vector);

        assert_eq!(explanation.dimension, 100);
        assert_eq!(explanation.non_zero_count, 3);
        assert!((explanation.norm - 1.0).abs() < 1e-9);
        assert_eq!(explanation.top_dimensions.len(), 3);

        let sections: Vec<Section> = explanation
            .top_dimensions
            .iter()
            .map(|d| d.section)
            .collect();
        assert!(sections.contains(&Section::Major));
        assert!(sections.contains(&Section::Subject));
        assert!(sections.contains(&Section::Tag));
    }

    #[test]
    fn subject_cap_limits_slots() {
        let encoder = ProfileEncoder::new(100);
        // 50 subjects but only 40 subject slots: the extra ids are dropped
        // and the weight split uses the capped count.
        let many: Vec<String> = (0..50).map(|i| format!("subject-{i}")).collect();
        let vector = encoder.user_vector(None, &many, &[]);
        let non_zero = vector.iter().filter(|v| **v != 0.0).count();
        assert!(non_zero <= 40);
    }
}
