//! Fixed lists the worksheets pick from.
//!
//! Display groups exist for presentation only; selection and ranking treat a
//! catalog as one flat list keyed by item name.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub description: String,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogGroup {
    pub name: String,
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    groups: Vec<CatalogGroup>,
}

const VALUES: &[(&str, &str)] = &[
    ("Authenticity", "Staying true to your values and authentic self."),
    ("Compassion", "Concern for others' misfortunes, tied to empathy, love, and forgiveness."),
    ("Commitment", "Commitment to a cause or purpose."),
    ("Continuous Improvement", "A process of analyzing and improving through curiosity and learning."),
    ("Courage", "The ability to face fears, take risks and act innovatively to achieve a goal."),
    ("Creativity", "The use of imagination or original ideas in accomplishing tasks."),
    ("Dependability", "Being trustworthy and reliable."),
    ("Effort/Hard Work", "Making a vigorous and determined attempt to achieve success."),
    ("Fairness", "Impartial treatment without favoritism or discrimination."),
    ("Generosity", "The virtue of freely helping, giving and being kind to others."),
    ("Gratitude", "Appreciating what you have and expressing thanks."),
    ("Honesty and Integrity", "Being truthful and following strong moral principles."),
    ("Humility", "Valuing others and keeping a modest view of oneself."),
    ("Open Mindedness", "Willingness to consider new ideas without prejudice."),
    ("Perseverance", "Continuing despite difficulty, challenge or delay."),
    ("Positivity / Optimism", "Acting positively in the present and being hopeful about the future."),
    ("Proactivity", "Anticipating and acting to shape outcomes."),
    ("Self-respect", "Caring about yourself and not tolerating disrespect."),
    ("Tolerance", "Accepting opinions or behavior you may not agree with."),
    ("Wisdom", "The quality of having experience, knowledge, and good judgment."),
];

const INTERESTS: &[(&str, &[&str])] = &[
    (
        "Arts & Crafts",
        &[
            "Calligraphy", "Candle-making", "Cosmetics", "Crocheting", "Clothing Design",
            "Clothing Creation", "Drawing", "Glassblowing", "Jewelry making", "Journaling",
            "Knitting", "Movies", "Needlepoint", "Origami", "Painting", "Photography", "Poetry",
            "Pottery", "Quilting", "Reading", "Scrapbooking", "Sports (Watching)", "Soap making",
            "String Art", "Thrifting", "Weaving", "Writing",
        ],
    ),
    (
        "Performing",
        &["Acting", "Comedy", "Dancing", "Playing an instrument", "Podcasting", "Karaoke"],
    ),
    (
        "Food and Drink",
        &[
            "Baking", "Bread making", "Brewing", "Cheese-making", "Cooking", "Mixology",
            "Winemaking", "Wine tasting",
        ],
    ),
    (
        "Historical & Collecting",
        &[
            "Coins", "Art", "Artifacts", "Books", "Genealogy", "Memorabilia",
            "Music (records, CDs, audio)", "Preserving/teaching about historical landmarks",
            "Stamps",
        ],
    ),
    (
        "Games",
        &[
            "Billiards", "Backgammon", "Board games", "Card games", "Chess", "Crossword puzzles",
            "Fantasy sports", "Jigsaw puzzles", "Legos", "Model trains", "Ping Pong", "Trivia",
            "Video games",
        ],
    ),
    (
        "Nature Related",
        &[
            "Animal breeding", "Animal grooming", "Astronomy", "Beekeeping", "Bird watching",
            "Camping", "Farming", "Fishing", "Gardening", "Geocaching", "Metal detecting",
            "Meteorology", "Sailing", "Scuba diving", "Shuffleboard", "Skydiving", "Traveling",
        ],
    ),
    (
        "Technical Hobbies",
        &[
            "App making", "Electronics repair", "Drone operation", "Flying",
            "Furniture restoration", "Hacking", "Home improvement projects", "Metalworking",
            "Taxidermy", "Vehicle restoration", "Video production", "Woodworking",
        ],
    ),
    (
        "Physical Activities",
        &[
            "Archery", "Backpacking", "Basketball", "Bowling", "Bungee jumping", "Car Racing",
            "Canoeing", "Disc golfing", "Golfing", "Gymnastics", "Handball",
            "High Intensity Interval Training (HIIT)", "Hiking", "Hockey", "Horseback riding",
            "Ice skating", "Juggling", "Kayaking", "Kite surfing", "Martial arts", "Paintball",
            "Pickleball", "Running", "Soccer", "Skiing", "Snowboarding", "Surfing", "Swimming",
            "Tennis", "Triathlons", "Water Skiing", "Yoga",
        ],
    ),
];

/// Life categories every user starts with.
pub const DEFAULT_LIFE_CATEGORIES: [&str; 7] = [
    "Health",
    "Relationships",
    "Community",
    "Education",
    "Career",
    "Financial",
    "Spirituality",
];

impl Catalog {
    pub fn new(groups: Vec<CatalogGroup>) -> Self {
        Self { groups }
    }

    /// Single-group catalog, handy for tests and ad-hoc lists.
    pub fn flat(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        Self::new(vec![CatalogGroup {
            name: String::new(),
            items: items.into_iter().collect(),
        }])
    }

    pub fn values() -> Self {
        Self::flat(
            VALUES
                .iter()
                .map(|(name, description)| CatalogItem::new(*name, *description)),
        )
    }

    pub fn interests() -> Self {
        Self::new(
            INTERESTS
                .iter()
                .map(|(group, names)| CatalogGroup {
                    name: (*group).to_string(),
                    items: names.iter().map(|name| CatalogItem::new(*name, "")).collect(),
                })
                .collect(),
        )
    }

    pub fn groups(&self) -> &[CatalogGroup] {
        &self.groups
    }

    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.groups.iter().flat_map(|group| group.items.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Option<&CatalogItem> {
        self.items().find(|item| item.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Description for `name`, empty when the name is not in the catalog.
    pub fn describe(&self, name: &str) -> &str {
        self.get(name)
            .map(|item| item.description.as_str())
            .unwrap_or("")
    }

    /// Case-insensitive substring filter over item names. An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<&CatalogItem> {
        let needle = term.to_lowercase();
        self.items()
            .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Same filter as [`Catalog::search`], keeping display groups. Groups with no hits are dropped.
    pub fn search_groups(&self, term: &str) -> Vec<(&str, Vec<&CatalogItem>)> {
        let needle = term.to_lowercase();
        self.groups
            .iter()
            .filter_map(|group| {
                let hits: Vec<&CatalogItem> = group
                    .items
                    .iter()
                    .filter(|item| {
                        needle.is_empty() || item.name.to_lowercase().contains(&needle)
                    })
                    .collect();
                (!hits.is_empty()).then_some((group.name.as_str(), hits))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_catalog_has_twenty_described_entries() {
        let catalog = Catalog::values();
        assert_eq!(catalog.len(), 20);
        assert!(catalog.items().all(|item| !item.description.is_empty()));
        assert_eq!(
            catalog.describe("Gratitude"),
            "Appreciating what you have and expressing thanks."
        );
        assert_eq!(catalog.describe("Not A Value"), "");
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let catalog = Catalog::interests();
        let hits: Vec<&str> = catalog
            .search("BREAD")
            .into_iter()
            .map(|item| item.name.as_str())
            .collect();
        assert_eq!(hits, vec!["Bread making"]);
        assert_eq!(catalog.search("").len(), catalog.len());
        assert!(catalog.search("zzz").is_empty());
    }

    #[test]
    fn whitespace_term_is_matched_literally() {
        let catalog = Catalog::interests();
        let spaced = catalog.items().filter(|item| item.name.contains(' ')).count();
        assert!(spaced < catalog.len());
        assert_eq!(catalog.search(" ").len(), spaced);
        assert!(catalog.search("   ").is_empty());

        let grouped: usize = catalog
            .search_groups(" ")
            .iter()
            .map(|(_, hits)| hits.len())
            .sum();
        assert_eq!(grouped, spaced);
    }

    #[test]
    fn grouped_search_drops_empty_groups() {
        let catalog = Catalog::interests();
        let groups = catalog.search_groups("board");
        let names: Vec<&str> = groups.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["Games", "Nature Related", "Physical Activities"]);
    }
}
