use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{non_negative, nullable};
use crate::models::{CatalogItem, CreateItem, UpdateItem};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Model number is required"))]
    pub model_number: String,

    #[validate(custom(function = "non_negative"))]
    pub list_price: Decimal,

    #[validate(custom(function = "non_negative"))]
    pub special_price: Decimal,

    pub description: Option<String>,
}

impl From<CreateItemRequest> for CreateItem {
    fn from(req: CreateItemRequest) -> Self {
        Self {
            name: req.name,
            model_number: req.model_number,
            list_price: req.list_price,
            special_price: req.special_price,
            description: req.description,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Model number must not be empty"))]
    pub model_number: Option<String>,

    #[validate(custom(function = "non_negative"))]
    pub list_price: Option<Decimal>,

    #[validate(custom(function = "non_negative"))]
    pub special_price: Option<Decimal>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

impl From<UpdateItemRequest> for UpdateItem {
    fn from(req: UpdateItemRequest) -> Self {
        Self {
            name: req.name,
            model_number: req.model_number,
            list_price: req.list_price,
            special_price: req.special_price,
            description: req.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemListResponse {
    pub items: Vec<CatalogItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn negative_price_fails_validation() {
        let req = CreateItemRequest {
            name: "Switch".to_string(),
            model_number: "SW-8".to_string(),
            list_price: Decimal::new(-100, 2),
            special_price: Decimal::ZERO,
            description: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn update_tells_null_description_from_absent() {
        let cleared: UpdateItemRequest =
            serde_json::from_value(serde_json::json!({ "description": null })).unwrap();
        assert_eq!(cleared.description, Some(None));

        let untouched: UpdateItemRequest =
            serde_json::from_value(serde_json::json!({ "name": "Hub" })).unwrap();
        assert_eq!(untouched.description, None);

        let set: UpdateItemRequest =
            serde_json::from_value(serde_json::json!({ "description": "Gigabit" })).unwrap();
        assert_eq!(set.description, Some(Some("Gigabit".to_string())));
    }

    #[test]
    fn partial_update_validates_present_fields_only() {
        let req = UpdateItemRequest {
            name: None,
            model_number: None,
            list_price: None,
            special_price: Some(Decimal::new(4500, 2)),
            description: None,
        };
        assert!(req.validate().is_ok());
    }
}
