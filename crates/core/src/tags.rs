use crate::catalog::Store;
use crate::domain::{Label, Location, Tag};
use crate::error::Result;

/// Normalize a tag label: trimmed and lower-cased. Empty means "no tag".
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Append `label` to `tags` unless an equal normalized label is already
/// there. New labels are looked up or created in the store, so every photo
/// shares one row per label.
pub fn append_tag(store: &Store<'_>, mut tags: Vec<Tag>, label: &str) -> Result<Vec<Tag>> {
    let label = normalize_label(label);
    if label.is_empty() || tags.iter().any(|t| t.label == label) {
        return Ok(tags);
    }
    tags.push(store.first_or_create_tag(&label)?);
    Ok(tags)
}

/// Classifier labels scoring strictly above `threshold`, in classifier order.
pub fn confident_labels(labels: &[Label], threshold: f32) -> impl Iterator<Item = &str> {
    labels
        .iter()
        .filter(move |l| l.probability > threshold)
        .map(|l| l.name.as_str())
}

/// Build a photo's tag set: confident classifier labels first, then the
/// location's city, county, country, category, name and type.
pub fn aggregate_tags(
    store: &Store<'_>,
    labels: &[Label],
    threshold: f32,
    location: Option<&Location>,
) -> Result<Vec<Tag>> {
    let mut tags = Vec::new();
    for label in confident_labels(labels, threshold) {
        tags = append_tag(store, tags, label)?;
    }
    if let Some(location) = location {
        for label in location.tag_candidates() {
            tags = append_tag(store, tags, label)?;
        }
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn labels_of(tags: &[Tag]) -> Vec<&str> {
        tags.iter().map(|t| t.label.as_str()).collect()
    }

    #[test]
    fn test_case_and_whitespace_dedup() {
        let catalog = Catalog::open_in_memory().unwrap();
        let store = catalog.store();

        let mut tags = Vec::new();
        for label in ["Paris", "paris", "PARIS "] {
            tags = append_tag(&store, tags, label).unwrap();
        }
        assert_eq!(labels_of(&tags), vec!["paris"]);
        assert_eq!(store.stats().unwrap().total_tags, 1);
    }

    #[test]
    fn test_empty_label_is_noop() {
        let catalog = Catalog::open_in_memory().unwrap();
        let store = catalog.store();
        let tags = append_tag(&store, Vec::new(), "").unwrap();
        let tags = append_tag(&store, tags, "   ").unwrap();
        assert!(tags.is_empty());
        assert_eq!(store.stats().unwrap().total_tags, 0);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let catalog = Catalog::open_in_memory().unwrap();
        let store = catalog.store();
        let mut tags = Vec::new();
        for label in ["dog", "Beach", "DOG", "sunset"] {
            tags = append_tag(&store, tags, label).unwrap();
        }
        assert_eq!(labels_of(&tags), vec!["dog", "beach", "sunset"]);
    }

    #[test]
    fn test_tags_shared_across_sets() {
        let catalog = Catalog::open_in_memory().unwrap();
        let store = catalog.store();
        let a = append_tag(&store, Vec::new(), "Lyon").unwrap();
        let b = append_tag(&store, Vec::new(), "lyon").unwrap();
        assert_eq!(a[0].id, b[0].id);
    }

    #[test]
    fn test_confidence_threshold_is_strict() {
        let labels = vec![
            Label::new("at", 0.15),
            Label::new("above", 0.150_000_1),
            Label::new("below", 0.05),
        ];
        let kept: Vec<&str> = confident_labels(&labels, 0.15).collect();
        assert_eq!(kept, vec!["above"]);
    }

    #[test]
    fn test_location_tags_follow_labels_in_fixed_order() {
        let catalog = Catalog::open_in_memory().unwrap();
        let store = catalog.store();
        let labels = vec![Label::new("Cathedral", 0.9), Label::new("noise", 0.1)];
        let location = Location {
            id: "45.762,4.827".to_string(),
            name: "Fourvière".to_string(),
            city: "Lyon".to_string(),
            county: "Rhône".to_string(),
            country: "France".to_string(),
            category: "Cathedral".to_string(),
            loc_type: "church".to_string(),
        };

        let tags = aggregate_tags(&store, &labels, 0.15, Some(&location)).unwrap();
        assert_eq!(
            labels_of(&tags),
            vec!["cathedral", "lyon", "rhône", "france", "fourvière", "church"]
        );
    }

    #[test]
    fn test_no_location_only_labels() {
        let catalog = Catalog::open_in_memory().unwrap();
        let store = catalog.store();
        let tags = aggregate_tags(&store, &[Label::new("cat", 0.5)], 0.15, None).unwrap();
        assert_eq!(labels_of(&tags), vec!["cat"]);
    }
}
