//! Generation kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of asset a job produces.
///
/// The kind selects the prompt template, the provider behavior, and the
/// pipeline settings (cost, retry budget, concurrency, ceiling). It never
/// changes the orchestrator control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "generation_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    /// A product card image.
    ProductCard,
    /// A short product video.
    ProductVideo,
}

impl GenerationKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductCard => "product_card",
            Self::ProductVideo => "product_video",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
