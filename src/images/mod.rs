//! In-use image inventory.
//!
//! Turns the pod specs gathered from every cluster into the set of image
//! references currently in use, and extracts the tags those references pin
//! for a given repository.

use std::collections::HashSet;

use k8s_openapi::api::core::v1::PodSpec;

/// Deduplicate image references, keeping the first occurrence of each.
///
/// Uniqueness is on the full reference string (repository and tag).
pub fn unique_images<'a, I>(images: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for image in images {
        if seen.insert(image) {
            result.push(image.to_string());
        }
    }

    result
}

/// Image strings of every init container and container in a pod spec.
///
/// Containers without an image are skipped.
pub fn pod_spec_images(spec: &PodSpec) -> impl Iterator<Item = &str> {
    spec.init_containers
        .iter()
        .flatten()
        .chain(spec.containers.iter())
        .filter_map(|container| container.image.as_deref())
}

/// Unique image references used by a collection of pod specs, in first-seen order.
pub fn unique_pod_images(specs: &[PodSpec]) -> Vec<String> {
    unique_images(specs.iter().flat_map(pod_spec_images))
}

/// Tags in use for one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InUseTags {
    /// Tags of references that belong to the repository.
    pub tags: Vec<String>,
    /// References that belong to the repository but whose tag could not be
    /// determined (no tag, a digest reference, or a registry port).
    pub unparseable: Vec<String>,
}

/// Extract the tags pinned by every reference containing `repository_uri`.
///
/// Matching is by substring, so a repository whose URI is contained in
/// another repository's URI also picks up that repository's references.
/// A reference counts as tagged only when it splits on `:` into exactly two
/// parts; digest references (`repo@sha256:...`) are never reported as in use.
pub fn in_use_tags(images: &[String], repository_uri: &str) -> InUseTags {
    let mut result = InUseTags::default();

    for image in images {
        if !image.contains(repository_uri) {
            continue;
        }

        // `repo@sha256:<hex>` also splits into two parts on `:`.
        if image.contains('@') {
            result.unparseable.push(image.clone());
            continue;
        }

        let mut parts = image.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(tag), None) => result.tags.push(tag.to_string()),
            _ => result.unparseable.push(image.clone()),
        }
    }

    result
}
