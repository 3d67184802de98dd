//! Expense categories and how they are displayed.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// What an expense was spent on.
///
/// Category names that are not part of the fixed set are kept verbatim in
/// [Category::Unrecognised] so that records written by other versions of the
/// app are never rejected. Build categories with [Category::from] so that
/// known names always map to their named variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Groceries, restaurants, coffee.
    Food,
    /// Buses, trains, fuel, taxis.
    Transport,
    /// Clothes and other purchases.
    Shopping,
    /// Movies, games, concerts.
    Entertainment,
    /// Rent, utilities, subscriptions.
    Bills,
    /// Doctors, pharmacy, gym.
    Health,
    /// Courses, books, tuition.
    Education,
    /// Anything that does not fit elsewhere.
    Other,
    /// A category name outside the fixed set.
    Unrecognised(String),
}

impl Category {
    /// The fixed set of categories offered when recording an expense.
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Transport,
        Category::Shopping,
        Category::Entertainment,
        Category::Bills,
        Category::Health,
        Category::Education,
        Category::Other,
    ];

    /// The name the category is stored and displayed under.
    pub fn name(&self) -> &str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Other => "Other",
            Category::Unrecognised(name) => name,
        }
    }

    /// The icon and colour to display the category with.
    ///
    /// Unrecognised categories use the same style as [Category::Other].
    pub fn style(&self) -> CategoryStyle {
        let (icon, color) = match self {
            Category::Food => ("restaurant", "#FF9800"),
            Category::Transport => ("directions_car", "#2196F3"),
            Category::Shopping => ("shopping_bag", "#9C27B0"),
            Category::Entertainment => ("movie", "#E91E63"),
            Category::Bills => ("receipt", "#F44336"),
            Category::Health => ("local_hospital", "#4CAF50"),
            Category::Education => ("school", "#009688"),
            Category::Other | Category::Unrecognised(_) => ("category", "#9E9E9E"),
        };

        CategoryStyle { icon, color }
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Category::ALL
            .into_iter()
            .find(|category| category.name() == name)
            .unwrap_or_else(|| Category::Unrecognised(name.to_owned()))
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Category::from(name.as_str())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unrecognised(name) => name,
            known => known.name().to_owned(),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Presentation attributes for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    /// A Material icon name, e.g. "restaurant".
    pub icon: &'static str,
    /// A hex RGB colour, e.g. "#FF9800".
    pub color: &'static str,
}
