use shared::{
    catalog::DEFAULT_LIFE_CATEGORIES,
    worksheet::{LifeCategoriesContent, LifeCategory, PurposeElement},
};

use crate::error::EditorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifeCategoriesEditor {
    categories: Vec<LifeCategory>,
    purpose_elements: Vec<PurposeElement>,
}

impl Default for LifeCategoriesEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LifeCategoriesEditor {
    /// Starts with every default category selected and no sub-categories.
    pub fn new() -> Self {
        Self {
            categories: DEFAULT_LIFE_CATEGORIES
                .iter()
                .map(|name| LifeCategory {
                    name: (*name).to_string(),
                    sub_categories: Vec::new(),
                })
                .collect(),
            purpose_elements: Vec::new(),
        }
    }

    pub fn categories(&self) -> &[LifeCategory] {
        &self.categories
    }

    pub fn purpose_elements(&self) -> &[PurposeElement] {
        &self.purpose_elements
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn is_default(name: &str) -> bool {
        DEFAULT_LIFE_CATEGORIES.contains(&name)
    }

    /// Selects or deselects a category. Deselecting discards its sub-categories.
    pub fn toggle_category(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.categories.remove(index);
                false
            }
            None => {
                self.categories.push(LifeCategory {
                    name: name.to_string(),
                    sub_categories: Vec::new(),
                });
                true
            }
        }
    }

    pub fn add_custom_category(&mut self, name: &str) -> Result<(), EditorError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::BlankName);
        }
        if self.is_selected(name) {
            return Err(EditorError::Duplicate(name.to_string()));
        }
        self.categories.push(LifeCategory {
            name: name.to_string(),
            sub_categories: Vec::new(),
        });
        Ok(())
    }

    /// Adds a trimmed sub-category. Blank input is ignored and returns `Ok(false)`.
    pub fn add_sub_category(&mut self, category: &str, sub: &str) -> Result<bool, EditorError> {
        let index = self
            .position(category)
            .ok_or_else(|| EditorError::UnknownItem(category.to_string()))?;
        let sub = sub.trim();
        if sub.is_empty() {
            return Ok(false);
        }
        self.categories[index].sub_categories.push(sub.to_string());
        Ok(true)
    }

    pub fn remove_sub_category(&mut self, category: &str, sub: &str) -> bool {
        let Some(index) = self.position(category) else {
            return false;
        };
        let subs = &mut self.categories[index].sub_categories;
        let before = subs.len();
        subs.retain(|s| s != sub);
        subs.len() != before
    }

    /// Appends an empty purpose element and returns its index.
    pub fn add_purpose_element(&mut self) -> usize {
        self.purpose_elements.push(PurposeElement::default());
        self.purpose_elements.len() - 1
    }

    pub fn update_purpose_element(&mut self, index: usize, name: &str, description: &str) -> bool {
        match self.purpose_elements.get_mut(index) {
            Some(element) => {
                element.name = name.to_string();
                element.description = description.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove_purpose_element(&mut self, index: usize) -> bool {
        if index < self.purpose_elements.len() {
            self.purpose_elements.remove(index);
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self, saved: LifeCategoriesContent) {
        self.categories = saved.categories;
        self.purpose_elements = saved.purpose_elements;
    }

    /// Purpose elements with a blank name are left out.
    pub fn to_content(&self) -> Result<LifeCategoriesContent, EditorError> {
        let purpose_elements: Vec<PurposeElement> = self
            .purpose_elements
            .iter()
            .filter(|element| !element.name.trim().is_empty())
            .cloned()
            .collect();
        if self.categories.is_empty() && purpose_elements.is_empty() {
            return Err(EditorError::NothingToSave);
        }
        Ok(LifeCategoriesContent {
            categories: self.categories.clone(),
            purpose_elements,
        })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }
}
