//! Retention policy evaluation.

use chrono::{DateTime, Duration, Utc};

use crate::{config::RetentionPolicy, registry::RegistryImage};

/// Images selected for deletion by a retention policy.
///
/// Every selected image contributes to exactly one list: all of its tags
/// when it has at least one, otherwise its digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionCandidates {
    /// Tags of selected tagged images, in selection order.
    pub tags: Vec<String>,
    /// Digests of selected untagged images, in selection order.
    pub digests: Vec<String>,
}

impl DeletionCandidates {
    /// Check if no image was selected.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.digests.is_empty()
    }

    fn push(&mut self, image: &RegistryImage) {
        if image.tags.is_empty() {
            self.digests.push(image.digest.clone());
        } else {
            self.tags.extend(image.tags.iter().cloned());
        }
    }
}

impl RetentionPolicy {
    /// Select the images eligible for deletion as of `now`.
    pub fn evaluate(&self, images: &[RegistryImage], now: DateTime<Utc>) -> DeletionCandidates {
        match *self {
            RetentionPolicy::SinceImagePushed { days } => since_image_pushed(images, days, now),
            RetentionPolicy::ImageCountMoreThan { limit } => image_count_more_than(images, limit),
        }
    }
}

/// Images pushed strictly before `now - days`.
///
/// A deadline before the earliest representable time selects nothing.
fn since_image_pushed(images: &[RegistryImage], days: u32, now: DateTime<Utc>) -> DeletionCandidates {
    let mut candidates = DeletionCandidates::default();
    let Some(deadline) =
        Duration::try_days(i64::from(days)).and_then(|age| now.checked_sub_signed(age))
    else {
        return candidates;
    };

    for image in images.iter().filter(|image| image.pushed_at < deadline) {
        candidates.push(image);
    }

    candidates
}

/// Every image except the `limit` most recently pushed.
///
/// Images pushed at the same instant keep their listing order.
fn image_count_more_than(images: &[RegistryImage], limit: u32) -> DeletionCandidates {
    let mut candidates = DeletionCandidates::default();
    let limit = limit as usize;

    if images.len() <= limit {
        return candidates;
    }

    let mut newest_first: Vec<&RegistryImage> = images.iter().collect();
    // `sort_by` is stable, which keeps ties in listing order.
    newest_first.sort_by(|a, b| b.pushed_at.cmp(&a.pushed_at));

    for image in &newest_first[limit..] {
        candidates.push(image);
    }

    candidates
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn image(days_ago: i64, tags: &[&str], digest: &str) -> RegistryImage {
        RegistryImage {
            pushed_at: now() - Duration::days(days_ago),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            digest: digest.to_string(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_since_image_pushed_selects_older_images() {
        let images = vec![
            image(11, &["v1.0.0"], "sha256:aaa"),
            image(9, &["v1.0.1"], "sha256:bbb"),
            image(10, &["v1.0.2", "stable"], "sha256:ccc"),
        ];

        // An image pushed 10 days and 1 second ago is past the deadline.
        let mut images = images;
        images[2].pushed_at -= Duration::seconds(1);

        let result = RetentionPolicy::SinceImagePushed { days: 10 }.evaluate(&images, now());
        assert_eq!(result.tags, strings(&["v1.0.0", "v1.0.2", "stable"]));
        assert!(result.digests.is_empty());
    }

    #[test]
    fn test_since_image_pushed_deadline_is_exclusive() {
        let images = vec![image(10, &["exactly-ten"], "sha256:aaa")];
        let result = RetentionPolicy::SinceImagePushed { days: 10 }.evaluate(&images, now());
        assert!(result.is_empty());
    }

    #[test]
    fn test_since_image_pushed_routes_untagged_to_digests() {
        let images = vec![
            image(30, &[], "sha256:untagged-old"),
            image(30, &["v1"], "sha256:tagged-old"),
            image(1, &[], "sha256:untagged-new"),
        ];

        let result = RetentionPolicy::SinceImagePushed { days: 7 }.evaluate(&images, now());
        assert_eq!(result.tags, strings(&["v1"]));
        assert_eq!(result.digests, strings(&["sha256:untagged-old"]));
    }

    #[test]
    fn test_since_image_pushed_zero_days_selects_everything_in_the_past() {
        let images = vec![image(0, &["now"], "sha256:aaa"), image(1, &["old"], "sha256:bbb")];
        let result = RetentionPolicy::SinceImagePushed { days: 0 }.evaluate(&images, now());
        assert_eq!(result.tags, strings(&["old"]));
    }

    #[test]
    fn test_since_image_pushed_beyond_representable_range_selects_nothing() {
        let images = vec![image(3650, &["ancient"], "sha256:aaa"), image(30, &[], "sha256:bbb")];
        let result =
            RetentionPolicy::SinceImagePushed { days: 100_000_000 }.evaluate(&images, now());
        assert!(result.is_empty());

        let result = RetentionPolicy::SinceImagePushed { days: u32::MAX }.evaluate(&images, now());
        assert!(result.is_empty());
    }

    #[test]
    fn test_image_count_more_than_selects_oldest() {
        let images = vec![
            image(1, &["v1.0.2"], "sha256:aaa"),
            image(3, &["v1.0.0"], "sha256:bbb"),
            image(2, &["v1.0.1"], "sha256:ccc"),
        ];

        let result = RetentionPolicy::ImageCountMoreThan { limit: 2 }.evaluate(&images, now());
        assert_eq!(result.tags, strings(&["v1.0.0"]));
        assert!(result.digests.is_empty());
    }

    #[rstest]
    #[case::below_limit(3)]
    #[case::at_limit(2)]
    fn test_image_count_within_limit_selects_nothing(#[case] limit: u32) {
        let images = vec![image(1, &["a"], "sha256:aaa"), image(2, &["b"], "sha256:bbb")];
        let result = RetentionPolicy::ImageCountMoreThan { limit }.evaluate(&images, now());
        assert!(result.is_empty());
    }

    #[test]
    fn test_image_count_zero_limit_selects_everything() {
        let images = vec![image(1, &["a"], "sha256:aaa"), image(2, &[], "sha256:bbb")];
        let result = RetentionPolicy::ImageCountMoreThan { limit: 0 }.evaluate(&images, now());
        assert_eq!(result.tags, strings(&["a"]));
        assert_eq!(result.digests, strings(&["sha256:bbb"]));
    }

    #[test]
    fn test_image_count_ties_keep_listing_order() {
        let images = vec![
            image(5, &["first"], "sha256:aaa"),
            image(5, &["second"], "sha256:bbb"),
            image(5, &["third"], "sha256:ccc"),
            image(1, &["newest"], "sha256:ddd"),
        ];

        let result = RetentionPolicy::ImageCountMoreThan { limit: 2 }.evaluate(&images, now());
        assert_eq!(result.tags, strings(&["second", "third"]));
    }

    #[test]
    fn test_image_count_does_not_reorder_input() {
        let images = vec![image(1, &["a"], "sha256:aaa"), image(3, &["b"], "sha256:bbb")];
        let before = images.clone();
        let _ = RetentionPolicy::ImageCountMoreThan { limit: 1 }.evaluate(&images, now());
        assert_eq!(images, before);
    }

    #[rstest]
    #[case::since_pushed(RetentionPolicy::SinceImagePushed { days: 2 })]
    #[case::count(RetentionPolicy::ImageCountMoreThan { limit: 1 })]
    fn test_tags_and_digests_are_mutually_exclusive(#[case] policy: RetentionPolicy) {
        let images = vec![
            image(0, &["keep"], "sha256:keep"),
            image(5, &["a", "b"], "sha256:tagged"),
            image(6, &[], "sha256:untagged"),
            image(7, &["c"], "sha256:tagged-2"),
        ];

        let result = policy.evaluate(&images, now());
        for image in &images {
            let tag_hits = image.tags.iter().filter(|t| result.tags.contains(*t)).count();
            let digest_hit = result.digests.contains(&image.digest);
            if image.tags.is_empty() {
                assert_eq!(tag_hits, 0);
            } else {
                assert!(!digest_hit, "tagged image {} contributed its digest", image.digest);
                assert!(tag_hits == 0 || tag_hits == image.tags.len());
            }
        }
        assert_eq!(result.tags, strings(&["a", "b", "c"]));
        assert_eq!(result.digests, strings(&["sha256:untagged"]));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let images = vec![
            image(4, &["a"], "sha256:aaa"),
            image(8, &[], "sha256:bbb"),
            image(2, &["c"], "sha256:ccc"),
        ];
        let policy = RetentionPolicy::ImageCountMoreThan { limit: 1 };
        assert_eq!(policy.evaluate(&images, now()), policy.evaluate(&images, now()));
    }
}
