//! Gear library item and its validation rules.
//!
//! Items belong to one user and can be placed into many categories through
//! `CategoryItem` rows.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ItemId = Uuid;

/// Unit used to display an item's weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    G,
    Kg,
    Oz,
    Lb,
}

impl WeightUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::G => "g",
            Self::Kg => "kg",
            Self::Oz => "oz",
            Self::Lb => "lb",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "g" => Some(Self::G),
            "kg" => Some(Self::Kg),
            "oz" => Some(Self::Oz),
            "lb" => Some(Self::Lb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Owning user.
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    /// Non-negative, finite weight in `weight_unit`.
    pub weight: f64,
    pub weight_unit: WeightUnit,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Item {
    /// Blank items carry no user data and are garbage once unreferenced.
    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.description.is_empty() && self.weight == 0.0
    }
}

/// Input for item creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub weight: f64,
    pub weight_unit: WeightUnit,
}

impl NewItem {
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        validate_weight(self.weight)
    }
}

/// Partial item update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
}

impl ItemPatch {
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        match self.weight {
            Some(weight) => validate_weight(weight),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemValidationError {
    /// Weight is negative, NaN, or infinite.
    InvalidWeight(f64),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWeight(value) => {
                write!(f, "item weight must be a finite value >= 0, got {value}")
            }
        }
    }
}

impl Error for ItemValidationError {}

fn validate_weight(weight: f64) -> Result<(), ItemValidationError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(ItemValidationError::InvalidWeight(weight));
    }
    Ok(())
}
