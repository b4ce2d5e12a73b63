//! Sensitivity tags
//!
//! A validated, normalized tag such as "dairy" or "gluten". Entry creation
//! and the correlator both go through [`Sensitivity::parse`], so "Dairy",
//! " dairy " and "DAIRY" all name the same tag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tags offered by the capture flow. Storage accepts any valid tag.
pub const CURATED_SENSITIVITIES: &[&str] = &[
    "dairy",
    "gluten",
    "wheat",
    "soy",
    "eggs",
    "nuts",
    "peanuts",
    "shellfish",
    "fish",
    "fodmap",
    "nightshades",
    "caffeine",
    "alcohol",
    "spicy",
    "high fat",
    "sugar",
    "artificial sweeteners",
];

const MAX_TAG_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sensitivity(String);

impl Sensitivity {
    /// Normalize a raw tag; `None` when nothing usable remains
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");

        if normalized.is_empty() || normalized.chars().count() > MAX_TAG_LEN {
            return None;
        }
        Some(Self(normalized))
    }

    /// Normalize a list of raw tags, dropping invalid ones and duplicates.
    /// First-seen order is kept.
    pub fn parse_all<I, S>(raw: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<Self> = Vec::new();
        for tag in raw.into_iter().filter_map(|s| Self::parse(s.as_ref())) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_curated(&self) -> bool {
        CURATED_SENSITIVITIES.contains(&self.0.as_str())
    }

    pub fn curated() -> Vec<Self> {
        CURATED_SENSITIVITIES
            .iter()
            .map(|s| Self((*s).to_string()))
            .collect()
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for Sensitivity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("Invalid sensitivity tag: {:?}", value))
    }
}

impl From<Sensitivity> for String {
    fn from(value: Sensitivity) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        assert_eq!(Sensitivity::parse("Dairy").unwrap().as_str(), "dairy");
        assert_eq!(Sensitivity::parse("  High   Fat ").unwrap().as_str(), "high fat");
        assert_eq!(Sensitivity::parse("dairy"), Sensitivity::parse("DAIRY"));
    }

    #[test]
    fn test_parse_rejects_empty_and_oversized() {
        assert!(Sensitivity::parse("").is_none());
        assert!(Sensitivity::parse("   ").is_none());
        assert!(Sensitivity::parse(&"x".repeat(MAX_TAG_LEN + 1)).is_none());
    }

    #[test]
    fn test_parse_all_dedupes_in_order() {
        let tags = Sensitivity::parse_all(["Gluten", "dairy", "gluten", ""]);
        let names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["gluten", "dairy"]);
    }

    #[test]
    fn test_curated() {
        assert!(Sensitivity::parse("Nightshades").unwrap().is_curated());
        assert!(!Sensitivity::parse("mango").unwrap().is_curated());
        assert_eq!(Sensitivity::curated().len(), CURATED_SENSITIVITIES.len());
    }

    #[test]
    fn test_serde_goes_through_parse() {
        let tag: Sensitivity = serde_json::from_str("\"  SOY \"").unwrap();
        assert_eq!(tag.as_str(), "soy");
        assert!(serde_json::from_str::<Sensitivity>("\"  \"").is_err());
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"soy\"");
    }
}
