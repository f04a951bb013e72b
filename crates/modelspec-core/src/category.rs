//! # Key Categories
//!
//! Every registry key belongs to exactly one [`Category`]. GENERAL keys
//! apply to every model; IMAGE_GEN and TEXT_PREDICTION keys apply only when
//! the category resolver picks that category for the file.
//!
//! [`ResolvedCategory`] is the resolver's output. It has no GENERAL
//! variant: a file whose category cannot be determined is `Unknown`, and
//! `Unknown` means "general rules only".

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelSpecError;

/// The category a registry key applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Applies to every model.
    General,
    /// Image generation models (Stable Diffusion family and similar).
    ImageGeneration,
    /// Text prediction models (language models).
    TextPrediction,
}

impl Category {
    /// All categories in registry order.
    pub fn all() -> &'static [Category] {
        &[Self::General, Self::ImageGeneration, Self::TextPrediction]
    }

    /// Returns the snake_case identifier for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::ImageGeneration => "image_generation",
            Self::TextPrediction => "text_prediction",
        }
    }

    /// Whether keys of this category apply to a file resolved as `resolved`.
    ///
    /// GENERAL keys always apply. Category keys apply only on an exact match,
    /// so an `Unknown` file is held to GENERAL keys alone.
    pub fn applies_to(&self, resolved: ResolvedCategory) -> bool {
        match self {
            Self::General => true,
            Self::ImageGeneration => resolved == ResolvedCategory::ImageGeneration,
            Self::TextPrediction => resolved == ResolvedCategory::TextPrediction,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelSpecError;

    /// Accepts the snake_case identifier plus the short forms `image` and `text`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "image_generation" | "image-generation" | "image" => Ok(Self::ImageGeneration),
            "text_prediction" | "text-prediction" | "text" => Ok(Self::TextPrediction),
            _ => Err(ModelSpecError::UnknownCategory(s.to_string())),
        }
    }
}

/// Outcome of category resolution for one metadata map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedCategory {
    /// Image generation rules apply on top of GENERAL.
    ImageGeneration,
    /// Text prediction rules apply on top of GENERAL.
    TextPrediction,
    /// Heuristics were inconclusive; GENERAL rules only.
    Unknown,
}

impl ResolvedCategory {
    /// Returns the snake_case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImageGeneration => "image_generation",
            Self::TextPrediction => "text_prediction",
            Self::Unknown => "unknown",
        }
    }

    /// The key category selected by this resolution, if any.
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::ImageGeneration => Some(Category::ImageGeneration),
            Self::TextPrediction => Some(Category::TextPrediction),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for ResolvedCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_applies_to_every_resolution() {
        for resolved in [
            ResolvedCategory::ImageGeneration,
            ResolvedCategory::TextPrediction,
            ResolvedCategory::Unknown,
        ] {
            assert!(Category::General.applies_to(resolved));
        }
    }

    #[test]
    fn category_keys_apply_only_on_match() {
        assert!(Category::ImageGeneration.applies_to(ResolvedCategory::ImageGeneration));
        assert!(!Category::ImageGeneration.applies_to(ResolvedCategory::TextPrediction));
        assert!(!Category::ImageGeneration.applies_to(ResolvedCategory::Unknown));
        assert!(!Category::TextPrediction.applies_to(ResolvedCategory::Unknown));
    }

    #[test]
    fn category_parse_accepts_short_forms() {
        assert_eq!("image".parse::<Category>().unwrap(), Category::ImageGeneration);
        assert_eq!("text".parse::<Category>().unwrap(), Category::TextPrediction);
        assert_eq!(
            "image_generation".parse::<Category>().unwrap(),
            Category::ImageGeneration
        );
    }

    #[test]
    fn category_parse_rejects_unknown() {
        assert!(matches!(
            "audio".parse::<Category>(),
            Err(ModelSpecError::UnknownCategory(_))
        ));
    }

    #[test]
    fn resolved_category_maps_to_key_category() {
        assert_eq!(
            ResolvedCategory::TextPrediction.category(),
            Some(Category::TextPrediction)
        );
        assert_eq!(ResolvedCategory::Unknown.category(), None);
    }
}
