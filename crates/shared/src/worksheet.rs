//! Per-category worksheet payloads.
//!
//! A record travels as `{"category": "...", "content": {...}}`; the category tag
//! selects exactly one content schema.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Category;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedItem {
    pub name: String,
    pub description: String,
    pub priority: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuesContent {
    pub selected_values: Vec<RankedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestsContent {
    #[serde(default)]
    pub existing: Vec<String>,
    #[serde(default)]
    pub exploring: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeCategory {
    pub name: String,
    #[serde(rename = "subCategories", default)]
    pub sub_categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposeElement {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeCategoriesContent {
    #[serde(default)]
    pub categories: Vec<LifeCategory>,
    #[serde(default)]
    pub purpose_elements: Vec<PurposeElement>,
}

/// No roadmap worksheet exists yet, so its payload is kept as an opaque object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadmapContent(pub serde_json::Map<String, serde_json::Value>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "content", rename_all = "snake_case")]
pub enum WorksheetContent {
    Values(ValuesContent),
    Interests(InterestsContent),
    LifeCategories(LifeCategoriesContent),
    Roadmap(RoadmapContent),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("{category} entry has a blank name")]
    BlankName { category: Category },
    #[error("{category} entry '{name}' appears more than once")]
    Duplicate { category: Category, name: String },
    #[error("value '{name}' has priority {found}, expected {expected}")]
    PriorityOutOfOrder {
        name: String,
        expected: u32,
        found: u32,
    },
    #[error("content for '{found}' cannot be stored as '{expected}'")]
    CategoryMismatch { expected: Category, found: Category },
    #[error("malformed {category} content: {reason}")]
    Malformed { category: Category, reason: String },
}

impl WorksheetContent {
    pub fn category(&self) -> Category {
        match self {
            WorksheetContent::Values(_) => Category::Values,
            WorksheetContent::Interests(_) => Category::Interests,
            WorksheetContent::LifeCategories(_) => Category::LifeCategories,
            WorksheetContent::Roadmap(_) => Category::Roadmap,
        }
    }

    /// Checks the shape rules a stored record must satisfy.
    pub fn validate(&self) -> Result<(), ContentError> {
        match self {
            WorksheetContent::Values(values) => validate_ranked(&values.selected_values),
            WorksheetContent::Interests(interests) => {
                ensure_unique(Category::Interests, interests.existing.iter())?;
                ensure_unique(Category::Interests, interests.exploring.iter())
            }
            WorksheetContent::LifeCategories(content) => {
                ensure_unique(
                    Category::LifeCategories,
                    content.categories.iter().map(|c| &c.name),
                )?;
                if content
                    .purpose_elements
                    .iter()
                    .any(|element| element.name.trim().is_empty())
                {
                    return Err(ContentError::BlankName {
                        category: Category::LifeCategories,
                    });
                }
                Ok(())
            }
            WorksheetContent::Roadmap(_) => Ok(()),
        }
    }

    /// Serialized `content` half of the record, as stored in the database.
    pub fn content_json(&self) -> serde_json::Value {
        let result = match self {
            WorksheetContent::Values(c) => serde_json::to_value(c),
            WorksheetContent::Interests(c) => serde_json::to_value(c),
            WorksheetContent::LifeCategories(c) => serde_json::to_value(c),
            WorksheetContent::Roadmap(c) => serde_json::to_value(c),
        };
        // plain structs of strings and integers always serialize
        result.unwrap_or(serde_json::Value::Null)
    }

    /// Rebuilds typed content from a stored `(category, content)` pair.
    pub fn from_parts(
        category: Category,
        content: serde_json::Value,
    ) -> Result<Self, ContentError> {
        let malformed = |err: serde_json::Error| ContentError::Malformed {
            category,
            reason: err.to_string(),
        };
        Ok(match category {
            Category::Values => {
                WorksheetContent::Values(serde_json::from_value(content).map_err(malformed)?)
            }
            Category::Interests => {
                WorksheetContent::Interests(serde_json::from_value(content).map_err(malformed)?)
            }
            Category::LifeCategories => WorksheetContent::LifeCategories(
                serde_json::from_value(content).map_err(malformed)?,
            ),
            Category::Roadmap => {
                WorksheetContent::Roadmap(serde_json::from_value(content).map_err(malformed)?)
            }
        })
    }

    pub fn into_values(self) -> Result<ValuesContent, ContentError> {
        match self {
            WorksheetContent::Values(content) => Ok(content),
            other => Err(ContentError::CategoryMismatch {
                expected: Category::Values,
                found: other.category(),
            }),
        }
    }

    pub fn into_interests(self) -> Result<InterestsContent, ContentError> {
        match self {
            WorksheetContent::Interests(content) => Ok(content),
            other => Err(ContentError::CategoryMismatch {
                expected: Category::Interests,
                found: other.category(),
            }),
        }
    }

    pub fn into_life_categories(self) -> Result<LifeCategoriesContent, ContentError> {
        match self {
            WorksheetContent::LifeCategories(content) => Ok(content),
            other => Err(ContentError::CategoryMismatch {
                expected: Category::LifeCategories,
                found: other.category(),
            }),
        }
    }
}

fn validate_ranked(items: &[RankedItem]) -> Result<(), ContentError> {
    ensure_unique(Category::Values, items.iter().map(|item| &item.name))?;
    for (index, item) in items.iter().enumerate() {
        let expected = index as u32 + 1;
        if item.priority != expected {
            return Err(ContentError::PriorityOutOfOrder {
                name: item.name.clone(),
                expected,
                found: item.priority,
            });
        }
    }
    Ok(())
}

fn ensure_unique<'a>(
    category: Category,
    names: impl Iterator<Item = &'a String>,
) -> Result<(), ContentError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(ContentError::BlankName { category });
        }
        if !seen.insert(name.as_str()) {
            return Err(ContentError::Duplicate {
                category,
                name: name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/worksheet_tests.rs"]
mod tests;
