use serde::{Deserialize, Serialize};

use crate::domain::Category;

/// Dashboard completion flags. `lifeframe` is derived and never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookProgress {
    pub values: bool,
    pub interests: bool,
    pub life_categories: bool,
    pub lifeframe: bool,
    pub roadmap: bool,
}

impl WorkbookProgress {
    pub const TOTAL_STEPS: usize = 5;

    pub fn from_completed<'a>(completed: impl IntoIterator<Item = &'a Category>) -> Self {
        let mut progress = Self::default();
        for category in completed {
            match category {
                Category::Values => progress.values = true,
                Category::Interests => progress.interests = true,
                Category::LifeCategories => progress.life_categories = true,
                Category::Roadmap => progress.roadmap = true,
            }
        }
        progress.lifeframe = progress.values && progress.interests && progress.life_categories;
        progress
    }

    pub fn is_complete(&self, category: Category) -> bool {
        match category {
            Category::Values => self.values,
            Category::Interests => self.interests,
            Category::LifeCategories => self.life_categories,
            Category::Roadmap => self.roadmap,
        }
    }

    pub fn completed_count(&self) -> usize {
        [
            self.values,
            self.interests,
            self.life_categories,
            self.lifeframe,
            self.roadmap,
        ]
        .into_iter()
        .filter(|done| *done)
        .count()
    }

    /// Whole-number percentage shown on the dashboard.
    pub fn percentage(&self) -> u8 {
        let pct = (self.completed_count() * 100) as f64 / Self::TOTAL_STEPS as f64;
        pct.round() as u8
    }

    /// First worksheet in workbook order that has no record yet.
    pub fn next_step(&self) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| !self.is_complete(*category))
    }
}
