//! Request payloads.

use serde::Deserialize;
use validator::Validate;

use wbgen_core::types::id::UserId;
use wbgen_entity::job::{GenerationKind, JobSpec};

/// Payload for `POST /api/jobs`.
///
/// Surface-level shape checks live here; the deeper content rules
/// (character classes, injection fragments, per-kind task limits) are
/// enforced by the job service.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateJobRequest {
    /// What to generate.
    pub kind: GenerationKind,
    /// Product name.
    #[validate(length(min = 1, max = 100))]
    pub product_name: String,
    /// Product category.
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    /// Free-text description / benefits.
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    /// Blob-store paths of previously uploaded source images.
    #[validate(length(min = 1, max = 10))]
    pub source_images: Vec<String>,
    /// Number of assets to generate.
    #[validate(range(min = 1))]
    pub task_count: u32,
}

impl CreateJobRequest {
    /// Builds the service-level spec for the authenticated caller.
    pub fn into_spec(self, user_id: UserId) -> JobSpec {
        JobSpec {
            user_id,
            kind: self.kind,
            product_name: self.product_name,
            category: self.category,
            description: self.description,
            source_images: self.source_images,
            task_count: self.task_count,
        }
    }
}

/// Payload for `POST /api/webhooks/payment`, as delivered by the payment
/// provider after it confirms a purchase.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentWebhookRequest {
    /// Provider-side payment identifier; the idempotency key for credits.
    #[validate(length(min = 1, max = 255))]
    pub payment_id: String,
    /// The purchasing user.
    pub user_id: UserId,
    /// Number of tokens purchased.
    #[validate(range(min = 1))]
    pub amount: i64,
    /// Payment status as reported by the provider.
    pub status: String,
}

impl PaymentWebhookRequest {
    /// Only confirmed payments credit tokens.
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateJobRequest {
        CreateJobRequest {
            kind: GenerationKind::ProductCard,
            product_name: "Thermo Mug 450ml".to_string(),
            category: "Kitchen".to_string(),
            description: String::new(),
            source_images: vec!["u/j/sources/0.jpg".to_string()],
            task_count: 6,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_empty_name_fails() {
        let mut req = request();
        req.product_name = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_too_many_source_images_fails() {
        let mut req = request();
        req.source_images = vec!["p".to_string(); 11];
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_kind_deserializes_from_snake_case() {
        let json = serde_json::json!({
            "kind": "product_card",
            "product_name": "Mug",
            "category": "Kitchen",
            "source_images": ["u/j/sources/0.jpg"],
            "task_count": 1
        });
        let req: CreateJobRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.kind, GenerationKind::ProductCard);
    }
}
