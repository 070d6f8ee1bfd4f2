use chrono::{DateTime, Datelike, Utc};

use crate::domain::{Location, Tag};

/// Fallback title for a photo without one. First match wins:
///
/// 1. `<location name> / <country> / <year>`
/// 2. `<city> / <country> / <year>`
/// 3. `<county> / <country> / <year>`
/// 4. `<First Tag> / <year>`
/// 5. `Unknown / <year>`
pub fn synthesize_title(location: Option<&Location>, tags: &[Tag], taken_at: DateTime<Utc>) -> String {
    let year = taken_at.year();

    if let Some(loc) = location {
        let place = [&loc.name, &loc.city, &loc.county]
            .into_iter()
            .find(|s| !s.is_empty());
        if let Some(place) = place {
            return format!("{} / {} / {}", place, loc.country, year);
        }
    }

    match tags.first() {
        Some(tag) => format!("{} / {}", title_case(&tag.label), year),
        None => format!("Unknown / {}", year),
    }
}

/// Upper-case the first letter of every whitespace-separated word.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
