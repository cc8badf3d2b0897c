//! # Engine Configuration
//!
//! Limits applied by the order session.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`FIELDORDER_*`)
//! 2. Defaults (this file)

use serde::{Deserialize, Serialize};

use crate::{MAX_ITEM_QUANTITY, MAX_LINE_ITEMS};

/// Order session limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Highest quantity a single regular line may reach.
    pub max_item_quantity: i64,

    /// Most distinct products one order may hold.
    pub max_line_items: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_item_quantity: MAX_ITEM_QUANTITY,
            max_line_items: MAX_LINE_ITEMS,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by environment variables.
    ///
    /// ## Environment Variables
    /// - `FIELDORDER_MAX_ITEM_QUANTITY`
    /// - `FIELDORDER_MAX_LINE_ITEMS`
    ///
    /// Unparseable or non-positive values are ignored.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`], reading variables through `lookup`.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();

        if let Some(qty) = positive::<i64>(lookup("FIELDORDER_MAX_ITEM_QUANTITY")) {
            config.max_item_quantity = qty;
        }

        if let Some(lines) = positive::<usize>(lookup("FIELDORDER_MAX_LINE_ITEMS")) {
            config.max_line_items = lines;
        }

        config
    }

    pub fn max_item_quantity(mut self, max: i64) -> Self {
        self.max_item_quantity = max;
        self
    }

    pub fn max_line_items(mut self, max: usize) -> Self {
        self.max_line_items = max;
        self
    }
}

fn positive<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}
