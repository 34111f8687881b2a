use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the synthetic selector that draws from every real category.
pub const MIXED_KEY: &str = "mixed";

const MIXED_NAME: &str = "Mix It Up!";
const MIXED_EMOJI: &str = "🎲";

/// Which word pool a round draws from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategorySelection {
    #[default]
    Mixed,
    Named(String),
}

impl CategorySelection {
    pub fn named(key: impl Into<String>) -> Self {
        Self::from(key.into())
    }

    pub fn key(&self) -> &str {
        match self {
            CategorySelection::Mixed => MIXED_KEY,
            CategorySelection::Named(key) => key,
        }
    }
}

impl From<String> for CategorySelection {
    fn from(value: String) -> Self {
        if value == MIXED_KEY {
            CategorySelection::Mixed
        } else {
            CategorySelection::Named(value)
        }
    }
}

impl From<CategorySelection> for String {
    fn from(value: CategorySelection) -> Self {
        match value {
            CategorySelection::Mixed => MIXED_KEY.to_string(),
            CategorySelection::Named(key) => key,
        }
    }
}

impl fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub key: String,
    pub name: String,
    pub emoji: String,
    pub words: Vec<String>,
}

impl Category {
    pub fn new(key: &str, name: &str, emoji: &str, words: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// What the setup screen lists: every real category, then the Mixed selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDescriptor {
    pub key: CategorySelection,
    pub name: String,
    pub emoji: String,
    pub word_count: usize,
}

/// Read-only category → word list reference data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCatalog {
    categories: Vec<Category>,
}

impl WordCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Category::new("places", "Places", "🏛️", &PLACES),
            Category::new("food", "Food & Drinks", "🍕", &FOOD),
            Category::new("activities", "Activities", "🎮", &ACTIVITIES),
            Category::new("nature", "Nature", "🌿", &NATURE),
            Category::new("entertainment", "Entertainment", "🎬", &ENTERTAINMENT),
            Category::new("animals", "Animals", "🐾", &ANIMALS),
        ])
    }

    /// Word list of a real category. `None` for keys the catalog does not define,
    /// including the Mixed selector.
    pub fn words_for(&self, key: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.words.as_slice())
    }

    pub fn all_categories(&self) -> Vec<CategoryDescriptor> {
        let mut descriptors: Vec<CategoryDescriptor> = self
            .categories
            .iter()
            .map(|c| CategoryDescriptor {
                key: CategorySelection::Named(c.key.clone()),
                name: c.name.clone(),
                emoji: c.emoji.clone(),
                word_count: c.words.len(),
            })
            .collect();
        descriptors.push(CategoryDescriptor {
            key: CategorySelection::Mixed,
            name: MIXED_NAME.to_string(),
            emoji: MIXED_EMOJI.to_string(),
            word_count: self.categories.iter().map(|c| c.words.len()).sum(),
        });
        descriptors
    }

    pub fn contains(&self, selection: &CategorySelection) -> bool {
        match selection {
            CategorySelection::Mixed => true,
            CategorySelection::Named(key) => self.words_for(key).is_some(),
        }
    }

    /// Name shown next to the word on the results screen.
    pub fn display_name(&self, selection: &CategorySelection) -> String {
        match selection {
            CategorySelection::Mixed => "Mixed".to_string(),
            CategorySelection::Named(key) => self
                .categories
                .iter()
                .find(|c| &c.key == key)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| key.clone()),
        }
    }

    /// Candidate pool for a round. Mixed concatenates every real list and keeps
    /// duplicates that occur across lists.
    pub fn candidate_pool(&self, selection: &CategorySelection) -> Vec<&str> {
        match selection {
            CategorySelection::Mixed => self
                .categories
                .iter()
                .flat_map(|c| c.words.iter().map(String::as_str))
                .collect(),
            CategorySelection::Named(key) => self
                .words_for(key)
                .map(|words| words.iter().map(String::as_str).collect())
                .unwrap_or_default(),
        }
    }
}

impl Default for WordCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

const PLACES: [&str; 20] = [
    "Airport",
    "Beach",
    "Castle",
    "Desert",
    "Forest",
    "Hospital",
    "Library",
    "Museum",
    "Park",
    "Prison",
    "School",
    "Space Station",
    "Stadium",
    "Subway",
    "Zoo",
    "Haunted House",
    "Volcano",
    "Underwater City",
    "Cloud City",
    "Moon Base",
];

const FOOD: [&str; 20] = [
    "Pizza",
    "Sushi",
    "Burger",
    "Ice Cream",
    "Tacos",
    "Pasta",
    "Salad",
    "Chocolate",
    "Coffee",
    "Smoothie",
    "Ramen",
    "Curry",
    "BBQ",
    "Sandwich",
    "Soup",
    "Cake",
    "Steak",
    "Seafood",
    "Fruit Salad",
    "Hot Dog",
];

const ACTIVITIES: [&str; 20] = [
    "Gaming",
    "Swimming",
    "Dancing",
    "Painting",
    "Reading",
    "Cooking",
    "Hiking",
    "Shopping",
    "Sleeping",
    "Working Out",
    "Photography",
    "Gardening",
    "Singing",
    "Writing",
    "Coding",
    "Meditation",
    "Yoga",
    "Skateboarding",
    "Rock Climbing",
    "Bungee Jumping",
];

const NATURE: [&str; 20] = [
    "Ocean",
    "Mountain",
    "Rainforest",
    "Desert",
    "River",
    "Waterfall",
    "Cave",
    "Island",
    "Glacier",
    "Canyon",
    "Volcano",
    "Coral Reef",
    "Savanna",
    "Tundra",
    "Swamp",
    "Prairie",
    "Fjord",
    "Geyser",
    "Aurora",
    "Rainbow",
];

const ENTERTAINMENT: [&str; 20] = [
    "Movie Theater",
    "Concert",
    "Video Game",
    "TV Show",
    "Podcast",
    "Stand-up Comedy",
    "Musical",
    "Opera",
    "Ballet",
    "Magic Show",
    "Circus",
    "Festival",
    "Theme Park",
    "Escape Room",
    "Karaoke",
    "Board Game",
    "Book Club",
    "Art Gallery",
    "Sports Game",
    "Trivia Night",
];

const ANIMALS: [&str; 20] = [
    "Elephant",
    "Penguin",
    "Giraffe",
    "Dolphin",
    "Kangaroo",
    "Octopus",
    "Lion",
    "Panda",
    "Owl",
    "Shark",
    "Camel",
    "Flamingo",
    "Tortoise",
    "Wolf",
    "Koala",
    "Peacock",
    "Crocodile",
    "Hedgehog",
    "Jellyfish",
    "Sloth",
];
