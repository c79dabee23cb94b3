use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::model::{price, Category, Product};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    pub category_id: i64,
    pub category_name: Option<String>,
}

impl ProductDto {
    pub fn new(product: Product, category_name: Option<String>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            category_id: product.category_id,
            category_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductDto {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    #[validate(custom(function = "valid_price"))]
    pub price: Decimal,
    pub category_id: i64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductDto {
    pub id: i64,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    #[validate(custom(function = "valid_price"))]
    pub price: Decimal,
    pub category_id: i64,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn valid_price(value: &Decimal) -> Result<(), ValidationError> {
    price::check(*value).map_err(|err| {
        let code = match err {
            price::PriceError::Negative(_) => "negative",
            price::PriceError::OutOfRange(_) => "out_of_range",
            price::PriceError::TooPrecise(_) => "too_precise",
        };
        let mut error = ValidationError::new(code);
        error.message = Some(err.to_string().into());
        error
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn create_category_rejects_long_and_blank_names() {
        let ok = CreateCategoryDto {
            name: "a".repeat(Category::NAME_MAX_CHARS),
            description: None,
        };
        assert!(ok.validate().is_ok());

        let long = CreateCategoryDto {
            name: "a".repeat(Category::NAME_MAX_CHARS + 1),
            description: None,
        };
        assert!(long.validate().unwrap_err().field_errors().contains_key("name"));

        let blank = CreateCategoryDto {
            name: "   ".to_string(),
            description: None,
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        let dto = CreateProductDto {
            name: "é".repeat(Product::NAME_MAX_CHARS),
            description: None,
            price: Decimal::ONE,
            category_id: 1,
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn create_product_rejects_negative_price() {
        let dto = CreateProductDto {
            name: "Hammer".to_string(),
            description: None,
            price: Decimal::from_str("-1.00").unwrap(),
            category_id: 1,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }

    #[test]
    fn product_dto_serializes_price_as_number() {
        let dto = ProductDto {
            id: 1,
            name: "Hammer".to_string(),
            description: None,
            price: Decimal::from_str("12.50").unwrap(),
            category_id: 1,
            category_name: Some("Tools".to_string()),
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json["price"].is_number());
        assert_eq!(json["price"].to_string(), "12.50");
        assert_eq!(json["categoryId"], serde_json::json!(1));
        assert_eq!(json["categoryName"], serde_json::json!("Tools"));
    }

    #[test]
    fn create_product_accepts_numeric_price() {
        let dto: CreateProductDto = serde_json::from_str(
            r#"{"name":"Hammer","price":9.99,"categoryId":1}"#,
        )
        .unwrap();
        assert_eq!(dto.price, Decimal::from_str("9.99").unwrap());
        assert_eq!(dto.description, None);
    }

    #[test]
    fn prices_keep_every_digit_through_json() {
        let dto: CreateProductDto = serde_json::from_str(
            r#"{"name":"Yacht","price":1234567890123456.78,"categoryId":1}"#,
        )
        .unwrap();
        assert_eq!(dto.price, Decimal::from_str("1234567890123456.78").unwrap());
        assert!(dto.validate().is_ok());
    }
}
