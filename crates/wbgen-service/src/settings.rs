//! Per-kind settings lookup.

use wbgen_core::config::generation::{GenerationConfig, GenerationSettings};
use wbgen_entity::job::GenerationKind;

/// Resolve the pipeline settings for a generation kind.
pub fn settings_for(config: &GenerationConfig, kind: GenerationKind) -> &GenerationSettings {
    match kind {
        GenerationKind::ProductCard => &config.product_card,
        GenerationKind::ProductVideo => &config.product_video,
    }
}
