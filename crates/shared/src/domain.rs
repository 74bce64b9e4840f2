use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);

/// Which worksheet a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Values,
    Interests,
    LifeCategories,
    Roadmap,
}

impl Category {
    /// Worksheets in the order the workbook walks through them.
    pub const ALL: [Category; 4] = [
        Category::Values,
        Category::Interests,
        Category::LifeCategories,
        Category::Roadmap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Values => "values",
            Category::Interests => "interests",
            Category::LifeCategories => "life_categories",
            Category::Roadmap => "roadmap",
        }
    }

    /// The worksheet whose record must exist before this one may be opened.
    pub fn prerequisite(self) -> Option<Category> {
        match self {
            Category::Values => None,
            Category::Interests => Some(Category::Values),
            Category::LifeCategories => Some(Category::Interests),
            Category::Roadmap => Some(Category::LifeCategories),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown worksheet category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "values" => Ok(Category::Values),
            "interests" => Ok(Category::Interests),
            // route segments use the dashed form
            "life_categories" | "life-categories" => Ok(Category::LifeCategories),
            "roadmap" => Ok(Category::Roadmap),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}
