//! Retention policy configuration.
//!
//! Decides which registry images are old (or surplus) enough to be
//! considered for deletion. Exactly one policy is active per run.
//!
//! # Example
//!
//! ```toml
//! # Delete images pushed more than 30 days ago
//! [lifecycle]
//! type = "sinceImagePushed"
//! number = 30
//! ```
//!
//! ```toml
//! # Keep only the 20 most recently pushed images
//! [lifecycle]
//! type = "imageCountMoreThan"
//! number = 20
//! ```

use serde::{Deserialize, Serialize};

/// Retention policy for registry images.
///
/// The numeric parameter may be written as `number` (shared by both
/// variants) or by its specific name (`days` / `limit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RetentionPolicy {
    /// Images pushed strictly before `now - days` are eligible.
    #[serde(rename = "sinceImagePushed")]
    SinceImagePushed {
        #[serde(alias = "number")]
        days: u32,
    },

    /// All but the `limit` most recently pushed images are eligible.
    #[serde(rename = "imageCountMoreThan")]
    ImageCountMoreThan {
        #[serde(alias = "number")]
        limit: u32,
    },
}

impl RetentionPolicy {
    /// Discriminator as written in the config file.
    pub fn kind(&self) -> &'static str {
        match self {
            RetentionPolicy::SinceImagePushed { .. } => "sinceImagePushed",
            RetentionPolicy::ImageCountMoreThan { .. } => "imageCountMoreThan",
        }
    }

    /// Numeric parameter of the active policy.
    pub fn number(&self) -> u32 {
        match self {
            RetentionPolicy::SinceImagePushed { days } => *days,
            RetentionPolicy::ImageCountMoreThan { limit } => *limit,
        }
    }
}

impl std::fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetentionPolicy::SinceImagePushed { days } => {
                write!(f, "images pushed more than {days} days ago")
            }
            RetentionPolicy::ImageCountMoreThan { limit } => {
                write!(f, "images beyond the {limit} most recent")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        lifecycle: RetentionPolicy,
    }

    fn parse(toml: &str) -> Result<RetentionPolicy, toml::de::Error> {
        toml::from_str::<Wrapper>(toml).map(|w| w.lifecycle)
    }

    #[test]
    fn test_parse_since_image_pushed() {
        let policy = parse(
            r#"
            [lifecycle]
            type = "sinceImagePushed"
            number = 14
        "#,
        )
        .unwrap();
        assert_eq!(policy, RetentionPolicy::SinceImagePushed { days: 14 });
        assert_eq!(policy.kind(), "sinceImagePushed");
        assert_eq!(policy.number(), 14);
    }

    #[test]
    fn test_parse_image_count_more_than() {
        let policy = parse(
            r#"
            [lifecycle]
            type = "imageCountMoreThan"
            number = 5
        "#,
        )
        .unwrap();
        assert_eq!(policy, RetentionPolicy::ImageCountMoreThan { limit: 5 });
        assert_eq!(policy.kind(), "imageCountMoreThan");
        assert_eq!(policy.number(), 5);
    }

    #[test]
    fn test_parse_specific_parameter_names() {
        let policy = parse(
            r#"
            [lifecycle]
            type = "sinceImagePushed"
            days = 3
        "#,
        )
        .unwrap();
        assert_eq!(policy, RetentionPolicy::SinceImagePushed { days: 3 });

        let policy = parse(
            r#"
            [lifecycle]
            type = "imageCountMoreThan"
            limit = 9
        "#,
        )
        .unwrap();
        assert_eq!(policy, RetentionPolicy::ImageCountMoreThan { limit: 9 });
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(
            parse(
                r#"
            [lifecycle]
            type = "everything"
            number = 1
        "#
            )
            .is_err()
        );
    }

    #[test]
    fn test_missing_number_is_rejected() {
        assert!(
            parse(
                r#"
            [lifecycle]
            type = "sinceImagePushed"
        "#
            )
            .is_err()
        );
    }

    #[test]
    fn test_negative_number_is_rejected() {
        assert!(
            parse(
                r#"
            [lifecycle]
            type = "imageCountMoreThan"
            number = -1
        "#
            )
            .is_err()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            RetentionPolicy::SinceImagePushed { days: 30 }.to_string(),
            "images pushed more than 30 days ago"
        );
        assert_eq!(
            RetentionPolicy::ImageCountMoreThan { limit: 2 }.to_string(),
            "images beyond the 2 most recent"
        );
    }
}
