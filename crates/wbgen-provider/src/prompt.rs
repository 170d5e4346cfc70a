//! Prompt rendering.
//!
//! Each generation kind owns a template; the job spec fields are
//! substituted in and the card index selects a composition variant so a
//! multi-card job does not produce ten identical images.

use wbgen_entity::job::GenerationKind;

/// Job fields a prompt is rendered from.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub product_name: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    /// Zero-based position of the card within its job.
    pub card_index: i32,
    pub total_count: i32,
}

/// Composition variants rotated across the cards of one job.
const CARD_VARIANTS: &[&str] = &[
    "hero shot on a clean studio background",
    "lifestyle scene with the product in use",
    "close-up highlighting texture and materials",
    "flat lay with complementary props",
    "infographic layout with key feature callouts",
];

/// Render the prompt for one task.
pub fn render(kind: GenerationKind, ctx: &PromptContext) -> String {
    match kind {
        GenerationKind::ProductCard => {
            let variant = CARD_VARIANTS[ctx.card_index as usize % CARD_VARIANTS.len()];
            format!(
                "Create a marketplace product card image for \"{name}\" \
                 (category: {category}). {description} Composition: {variant}. \
                 Card {index} of {total}. Keep the product from the reference \
                 photos recognizable and unaltered.",
                name = ctx.product_name,
                category = ctx.category,
                description = ctx.description,
                variant = variant,
                index = ctx.card_index + 1,
                total = ctx.total_count,
            )
        }
        GenerationKind::ProductVideo => format!(
            "Create a short promotional product video for \"{name}\" \
             (category: {category}). {description} Smooth camera motion, \
             clean background, the product from the reference photos stays \
             recognizable and unaltered.",
            name = ctx.product_name,
            category = ctx.category,
            description = ctx.description,
        ),
    }
}
