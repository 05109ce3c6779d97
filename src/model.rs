//! Data models for cartonization.
//!
//! This module defines the caller-supplied input data:
//! - `Item`: a product line to ship (dimensions, weight, quantity)
//! - `ShippingBox`: a candidate carton from the box catalog
//!
//! Both are constructed fresh per request; nothing here is persisted.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{ValidationError, validate_dimension, validate_weight};
use crate::types::{Dimensional, Vec3};

/// Coarse fragility classification used for grouping in multi-package splits.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FragilityTier {
    #[default]
    Low,
    Medium,
    High,
}

/// Kind of shipping container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    #[default]
    Box,
    PolyBag,
    Envelope,
    Tube,
    Custom,
}

/// Category assigned to items that carry none.
pub const DEFAULT_CATEGORY: &str = "general";

/// A product line to be shipped.
///
/// # Fields
/// * `id` - Identifier of the item
/// * `length`, `width`, `height` - Dimensions in inches
/// * `weight` - Weight of a single unit in pounds
/// * `quantity` - Number of identical units
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "sku-1", "name": "Mug", "length": 10.0, "width": 8.0, "height": 6.0,
    "weight": 5.0, "quantity": 1, "fragility": "high", "category": "kitchen"
}))]
pub struct Item {
    pub id: String,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub quantity: u32,
    #[serde(default)]
    pub fragility: Option<FragilityTier>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Item {
    /// Creates a new item with validation.
    ///
    /// # Parameters
    /// * `id` - Identifier
    /// * `name` - Display name
    /// * `dims` - Dimensions (length, width, height)
    /// * `weight` - Unit weight in pounds
    /// * `quantity` - Unit count, at least 1
    ///
    /// # Examples
    /// ```
    /// use cartonizer::model::Item;
    ///
    /// let ok = Item::new("a", "Mug", (10.0, 8.0, 6.0), 5.0, 1);
    /// assert!(ok.is_ok());
    ///
    /// let invalid = Item::new("b", "Ghost", (10.0, 0.0, 6.0), 5.0, 1);
    /// assert!(invalid.is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        dims: (f64, f64, f64),
        weight: f64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        let item = Self {
            id: id.into(),
            name: name.into(),
            length: dims.0,
            width: dims.1,
            height: dims.2,
            weight,
            quantity,
            fragility: None,
            category: None,
        };
        item.validate()?;
        Ok(item)
    }

    /// Sets the fragility tier (Builder pattern light).
    pub fn with_fragility(mut self, fragility: FragilityTier) -> Self {
        self.fragility = Some(fragility);
        self
    }

    /// Sets the category (Builder pattern light).
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Re-checks the invariants of a deserialized item.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.length, &format!("Length of item '{}'", self.id))?;
        validate_dimension(self.width, &format!("Width of item '{}'", self.id))?;
        validate_dimension(self.height, &format!("Height of item '{}'", self.id))?;
        validate_weight(self.weight, &format!("Weight of item '{}'", self.id))?;
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity(format!(
                "Quantity of item '{}' must be at least 1",
                self.id
            )));
        }
        Ok(())
    }

    /// Weight of all units of this line.
    pub fn total_weight(&self) -> f64 {
        self.weight * f64::from(self.quantity)
    }

    /// Volume of all units of this line.
    pub fn total_volume(&self) -> f64 {
        self.volume() * f64::from(self.quantity)
    }

    /// Category, falling back to [`DEFAULT_CATEGORY`].
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    /// Fragility tier, falling back to `Low`.
    pub fn fragility_or_default(&self) -> FragilityTier {
        self.fragility.unwrap_or_default()
    }

    /// Copy of this line carrying a different quantity.
    pub(crate) fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

impl Dimensional for Item {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// A candidate shipping container from the box catalog.
///
/// # Fields
/// * `max_weight` - Maximum content weight in pounds
/// * `cost` - Unit cost of the container
/// * `in_stock` - Units available; only boxes with stock are eligible
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "box-s", "name": "Small", "length": 12.0, "width": 10.0, "height": 8.0,
    "max_weight": 50.0, "cost": 1.0, "in_stock": 10, "container_type": "box"
}))]
pub struct ShippingBox {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub max_weight: f64,
    pub cost: f64,
    pub in_stock: u32,
    #[serde(default)]
    pub container_type: ContainerType,
}

impl ShippingBox {
    /// Creates a new box with validation.
    ///
    /// # Parameters
    /// * `dims` - Inner dimensions (length, width, height)
    /// * `max_weight` - Maximum content weight
    /// * `cost` - Unit cost, may be zero
    /// * `in_stock` - Available units
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        dims: (f64, f64, f64),
        max_weight: f64,
        cost: f64,
        in_stock: u32,
    ) -> Result<Self, ValidationError> {
        let shipping_box = Self {
            id: id.into(),
            name: name.into(),
            sku: None,
            length: dims.0,
            width: dims.1,
            height: dims.2,
            max_weight,
            cost,
            in_stock,
            container_type: ContainerType::Box,
        };
        shipping_box.validate()?;
        Ok(shipping_box)
    }

    /// Re-checks the invariants of a deserialized box.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.length, &format!("Length of box '{}'", self.id))?;
        validate_dimension(self.width, &format!("Width of box '{}'", self.id))?;
        validate_dimension(self.height, &format!("Height of box '{}'", self.id))?;
        validate_weight(self.max_weight, &format!("Max weight of box '{}'", self.id))?;
        if self.cost < 0.0 || !self.cost.is_finite() {
            return Err(ValidationError::InvalidCost(format!(
                "Cost of box '{}' must be non-negative, got: {}",
                self.id, self.cost
            )));
        }
        Ok(())
    }

    /// Whether the box may be recommended at all.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.in_stock > 0
    }
}

impl Dimensional for ShippingBox {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// Validates every item of a request.
pub fn validate_items(items: &[Item]) -> Result<(), ValidationError> {
    items.iter().try_for_each(Item::validate)
}

/// Validates every box of a catalog.
pub fn validate_boxes(boxes: &[ShippingBox]) -> Result<(), ValidationError> {
    boxes.iter().try_for_each(ShippingBox::validate)
}

/// Total weight of all units.
pub fn total_weight(items: &[Item]) -> f64 {
    items.iter().map(Item::total_weight).sum()
}

/// Total raw volume of all units.
pub fn total_volume(items: &[Item]) -> f64 {
    items.iter().map(Item::total_volume).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    #[test]
    fn item_rejects_invalid_values() {
        assert!(Item::new("a", "A", (1.0, 1.0, 1.0), 1.0, 1).is_ok());
        assert!(matches!(
            Item::new("a", "A", (1.0, -1.0, 1.0), 1.0, 1),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert!(matches!(
            Item::new("a", "A", (1.0, 1.0, 1.0), 0.0, 1),
            Err(ValidationError::InvalidWeight(_))
        ));
        assert!(matches!(
            Item::new("a", "A", (1.0, 1.0, 1.0), 1.0, 0),
            Err(ValidationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn box_rejects_negative_cost() {
        assert!(ShippingBox::new("b", "B", (10.0, 10.0, 10.0), 20.0, 0.0, 1).is_ok());
        assert!(matches!(
            ShippingBox::new("b", "B", (10.0, 10.0, 10.0), 20.0, -1.0, 1),
            Err(ValidationError::InvalidCost(_))
        ));
    }

    #[test]
    fn totals_respect_quantity() {
        let items = vec![
            Item::new("a", "A", (2.0, 3.0, 4.0), 1.5, 4).unwrap(),
            Item::new("b", "B", (1.0, 1.0, 1.0), 2.0, 1).unwrap(),
        ];
        assert!((total_weight(&items) - 8.0).abs() < EPSILON_GENERAL);
        assert!((total_volume(&items) - 97.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn defaults_for_grouping_keys() {
        let plain = Item::new("a", "A", (1.0, 1.0, 1.0), 1.0, 1).unwrap();
        assert_eq!(plain.category_or_default(), DEFAULT_CATEGORY);
        assert_eq!(plain.fragility_or_default(), FragilityTier::Low);

        let tagged = plain
            .with_category("books")
            .with_fragility(FragilityTier::High);
        assert_eq!(tagged.category_or_default(), "books");
        assert_eq!(tagged.fragility_or_default(), FragilityTier::High);
    }

    #[test]
    fn deserializes_with_optional_fields_missing() {
        let json = r#"{"id":"1","name":"Lamp","length":5.0,"width":4.0,"height":3.0,
            "weight":1.0,"quantity":2}"#;
        let item: Item = serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(item.quantity, 2);
        assert!(item.fragility.is_none());

        let json = r#"{"id":"b","name":"Mailer","length":10.0,"width":8.0,"height":1.0,
            "max_weight":2.0,"cost":0.3,"in_stock":0,"container_type":"poly_bag"}"#;
        let shipping_box: ShippingBox =
            serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(shipping_box.container_type, ContainerType::PolyBag);
        assert!(!shipping_box.is_available());
    }
}
