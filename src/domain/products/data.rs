//! Products Data

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::domain::products::errors::ProductsServiceError;

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    /// Category name, resolved or created on insert.
    pub category: Option<String>,
    pub inventory: u64,
}

impl NewProduct {
    pub(crate) fn validate(&self) -> Result<(), ProductsServiceError> {
        if self.name.trim().is_empty() {
            return Err(ProductsServiceError::InvalidData(
                "name must not be empty".to_string(),
            ));
        }

        if self.price < Decimal::ZERO {
            return Err(ProductsServiceError::InvalidData(
                "price must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Product Update Data
///
/// Only the fields that are `Some` are changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    /// Category name.
    pub category: Option<String>,
    pub inventory: Option<u64>,
}

impl ProductUpdate {
    /// Builds an update from a raw field map.
    ///
    /// `price` and `inventory` accept a JSON number or a string holding one.
    ///
    /// # Errors
    ///
    /// [`ProductsServiceError::UnknownField`] for any unrecognized name and
    /// [`ProductsServiceError::InvalidData`] for a value of the wrong type.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, ProductsServiceError> {
        let mut update = Self::default();

        for (field, value) in fields {
            match field.as_str() {
                "name" => update.name = Some(string_field(&field, value)?),
                "description" => update.description = Some(string_field(&field, value)?),
                "category" => update.category = Some(string_field(&field, value)?),
                "price" => update.price = Some(price_field(&value)?),
                "inventory" => update.inventory = Some(inventory_field(&value)?),
                _ => return Err(ProductsServiceError::UnknownField(field)),
            }
        }

        if let Some(name) = &update.name
            && name.trim().is_empty()
        {
            return Err(ProductsServiceError::InvalidData(
                "name must not be empty".to_string(),
            ));
        }

        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn string_field(field: &str, value: Value) -> Result<String, ProductsServiceError> {
    match value {
        Value::String(value) => Ok(value),
        other => Err(ProductsServiceError::InvalidData(format!(
            "{field} must be a string, got {other}"
        ))),
    }
}

fn price_field(value: &Value) -> Result<Decimal, ProductsServiceError> {
    let raw = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        other => {
            return Err(ProductsServiceError::InvalidData(format!(
                "price must be a number, got {other}"
            )));
        }
    };

    let price = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|error| ProductsServiceError::InvalidData(format!("price: {error}")))?;

    if price < Decimal::ZERO {
        return Err(ProductsServiceError::InvalidData(
            "price must not be negative".to_string(),
        ));
    }

    Ok(price)
}

fn inventory_field(value: &Value) -> Result<u64, ProductsServiceError> {
    let inventory = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };

    inventory.ok_or_else(|| {
        ProductsServiceError::InvalidData(format!(
            "inventory must be a non-negative integer, got {value}"
        ))
    })
}
