//! Item types - the single resource served by the API
//!
//! Four shapes travel across the HTTP boundary:
//! - `NewItem`: creation payload (title required)
//! - `ItemPatch`: partial update payload (every field optional)
//! - `Item`: persisted record, including the store-assigned `id`
//! - `DeleteConfirmation`: body returned after a successful delete

use serde::{Deserialize, Deserializer, Serialize};

/// Surrogate primary key assigned by the store.
pub type ItemId = i64;

/// A persisted item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
}

/// Payload for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewItem {
    pub fn new(title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_string),
        }
    }
}

/// Payload for a partial update.
///
/// `description` is tri-state: absent leaves the column untouched,
/// `null` clears it and a string replaces it. `title` is non-null in the
/// table, so an explicit `null` is rejected during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemPatch {
    #[serde(default, deserialize_with = "non_null")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

impl ItemPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = Some(description.map(str::to_string));
        self
    }

    /// True when the patch carries no field at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    /// Apply the supplied fields to an existing item
    pub fn apply(&self, item: &mut Item) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
    }
}

/// Wraps any present value (including `null`) in `Some`, so a missing key
/// and an explicit `null` stay distinguishable.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn non_null<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Some)
}

/// Body returned by `DELETE /items/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub status: String,
    pub message: String,
    pub id: ItemId,
}

impl DeleteConfirmation {
    pub const STATUS: &'static str = "success";
    pub const MESSAGE: &'static str = "Item deletado com sucesso";

    pub fn new(id: ItemId) -> Self {
        Self {
            status: Self::STATUS.to_string(),
            message: Self::MESSAGE.to_string(),
            id,
        }
    }
}
