use shared::{
    catalog::{Catalog, CatalogItem},
    worksheet::InterestsContent,
};

use crate::selection::SelectionSet;

/// Interests worksheet: what the user already does and what they want to explore.
/// The two lists are independent; an item may sit in both.
#[derive(Debug, Clone)]
pub struct InterestsEditor {
    catalog: Catalog,
    existing: SelectionSet,
    exploring: SelectionSet,
}

impl InterestsEditor {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            existing: SelectionSet::new(),
            exploring: SelectionSet::new(),
        }
    }

    pub fn existing(&self) -> &SelectionSet {
        &self.existing
    }

    pub fn exploring(&self) -> &SelectionSet {
        &self.exploring
    }

    pub fn toggle_existing(&mut self, name: &str) -> bool {
        self.existing.toggle(name)
    }

    pub fn toggle_exploring(&mut self, name: &str) -> bool {
        self.exploring.toggle(name)
    }

    pub fn search(&self, term: &str) -> Vec<(&str, Vec<&CatalogItem>)> {
        self.catalog.search_groups(term)
    }

    pub fn resume(&mut self, saved: InterestsContent) {
        self.existing = SelectionSet::from_names(saved.existing);
        self.exploring = SelectionSet::from_names(saved.exploring);
    }

    pub fn to_content(&self) -> InterestsContent {
        InterestsContent {
            existing: self.existing.to_vec(),
            exploring: self.exploring.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_are_independent() {
        let mut editor = InterestsEditor::new(Catalog::interests());
        editor.toggle_existing("Hiking");
        editor.toggle_exploring("Hiking");
        editor.toggle_exploring("Pottery");
        editor.toggle_existing("Hiking");

        let content = editor.to_content();
        assert!(content.existing.is_empty());
        assert_eq!(content.exploring, vec!["Hiking", "Pottery"]);
    }

    #[test]
    fn search_never_touches_selection() {
        let mut editor = InterestsEditor::new(Catalog::interests());
        editor.toggle_existing("Chess");
        let hits = editor.search("CHESS");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "Games");
        assert_eq!(editor.existing().len(), 1);
    }

    #[test]
    fn resume_restores_both_lists() {
        let mut editor = InterestsEditor::new(Catalog::interests());
        editor.resume(InterestsContent {
            existing: vec!["Baking".into()],
            exploring: vec!["Sailing".into(), "Sailing".into()],
        });
        assert!(editor.existing().contains("Baking"));
        assert_eq!(editor.exploring().len(), 1);
    }
}
