//! # Choice Store
//!
//! Remembers which alternative the user picked for either/or schemes.
//!
//! Only kind 2 schemes read the store. Entries survive the removal of the
//! product's line, so a product removed and re-added keeps its choice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// The bonus alternative picked for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum SchemeChoice {
    /// Free units of the same product.
    #[default]
    FreeQuantity,
    /// One unit of the offer product per completed set.
    OfferProduct,
    /// Both bonuses. Not grantable under an either/or scheme.
    Both,
}

impl SchemeChoice {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SchemeChoice::FreeQuantity => "freeQuantity",
            SchemeChoice::OfferProduct => "offerProduct",
            SchemeChoice::Both => "both",
        }
    }

    /// Parses the stored/wire form.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "freeQuantity" => Ok(SchemeChoice::FreeQuantity),
            "offerProduct" => Ok(SchemeChoice::OfferProduct),
            "both" => Ok(SchemeChoice::Both),
            _ => Err(ValidationError::NotAllowed {
                field: "choice".to_string(),
                allowed: vec![
                    "freeQuantity".to_string(),
                    "offerProduct".to_string(),
                    "both".to_string(),
                ],
            }),
        }
    }
}

/// Per-product choice record. Absent entries read as the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceStore {
    choices: BTreeMap<String, SchemeChoice>,
}

impl ChoiceStore {
    pub fn new() -> Self {
        ChoiceStore::default()
    }

    /// Rebuilds a store from persisted entries.
    pub fn from_map(choices: BTreeMap<String, SchemeChoice>) -> Self {
        ChoiceStore { choices }
    }

    pub fn get(&self, product_id: &str) -> SchemeChoice {
        self.choices.get(product_id).copied().unwrap_or_default()
    }

    /// Records a choice, returning the previous effective choice.
    pub fn set(&mut self, product_id: impl Into<String>, choice: SchemeChoice) -> SchemeChoice {
        self.choices
            .insert(product_id.into(), choice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SchemeChoice)> {
        self.choices.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn to_map(&self) -> BTreeMap<String, SchemeChoice> {
        self.choices.clone()
    }
}
