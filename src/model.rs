use serde::{Deserialize, Serialize};

/// Origin API a recipe was normalized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Spoonacular,
    #[serde(rename = "themealdb")]
    MealDb,
}

/// Per-serving nutrition record. Fields missing from the provider payload
/// are zero, never absent, so downstream display code can add and round
/// without null checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

/// The one internal recipe shape every provider adapter normalizes into.
///
/// `ingredients` and `instructions` are always strings after normalization:
/// `|`-delimited entries for Spoonacular-shaped sources, `", "`-joined slots
/// for TheMealDB. Provider result order is preserved as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub ready_in_minutes: Option<u32>,
    #[serde(default)]
    pub health_score: u32,
    /// Flattened "amount unit name" entries.
    pub ingredients: String,
    /// Flattened steps, HTML-stripped prose, or the fixed fallback literal.
    pub instructions: String,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(default)]
    pub gluten_free: bool,
    #[serde(default)]
    pub dairy_free: bool,
    #[serde(default)]
    pub very_healthy: bool,
    pub source: Source,
    #[serde(default)]
    pub source_url: Option<String>,
}

fn default_servings() -> u32 {
    4
}

impl Recipe {
    /// Resolved image URL: the recipe's own image, or a deterministic
    /// default picked by the recipe's position in its result list.
    pub fn image_or_default(&self, index: usize) -> &str {
        match &self.image {
            Some(url) if !url.is_empty() => url.as_str(),
            _ => crate::normalize::default_image(index),
        }
    }

    /// The flattened ingredient field as display-ready entries, with unit
    /// abbreviations spelled out ("1 tbsp butter" becomes "1 tablespoon
    /// butter").
    pub fn ingredient_list(&self) -> Vec<String> {
        let separator = if self.ingredients.contains('|') { "|" } else { ", " };
        self.ingredients
            .split(separator)
            .filter(|entry| !entry.trim().is_empty())
            .map(crate::normalize::expand_abbreviations)
            .collect()
    }
}

/// One day's generated meal plan: the meals plus the day's nutrient totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub meals: Vec<PlannedMeal>,
    pub nutrients: PlanNutrients,
}

/// A meal slot inside a generated plan. Nutrition is filled in by a
/// separate per-meal fan-out and stays `None` when that fetch fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedMeal {
    pub id: String,
    pub title: String,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub ready_in_minutes: Option<u32>,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
}

/// Day totals reported by the planner endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanNutrients {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_round_trips_through_json() {
        let recipe = Recipe {
            id: "716429".to_string(),
            title: "Pasta with Garlic".to_string(),
            image: Some("https://img.spoonacular.com/recipes/716429.jpg".to_string()),
            servings: 2,
            ready_in_minutes: Some(45),
            health_score: 19,
            ingredients: "1 tbsp butter|2 cloves garlic".to_string(),
            instructions: "Melt butter|Add garlic".to_string(),
            nutrition: Some(Nutrition {
                calories: 543.0,
                ..Default::default()
            }),
            vegetarian: true,
            vegan: false,
            gluten_free: false,
            dairy_free: false,
            very_healthy: false,
            source: Source::Spoonacular,
            source_url: None,
        };

        let json = serde_json::to_string(&recipe).unwrap();
        let back: Recipe = serde_json::from_str(&json).unwrap();
        assert_eq!(back, recipe);
        assert!(json.contains("\"source\":\"spoonacular\""));
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let json = r#"{
            "id": "52772",
            "title": "Teriyaki Chicken",
            "ingredients": "soy sauce, chicken",
            "instructions": "Cook it",
            "source": "themealdb"
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.image, None);
        assert_eq!(recipe.nutrition, None);
        assert!(!recipe.vegetarian);
        assert_eq!(recipe.source, Source::MealDb);
    }

    #[test]
    fn ingredient_list_expands_units_per_entry() {
        let json = r#"{
            "id": "1",
            "title": "Pasta",
            "ingredients": "1 tbsp butter|2 c flour|salt",
            "instructions": "Mix",
            "source": "spoonacular"
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(
            recipe.ingredient_list(),
            vec!["1 tablespoon butter", "2 cup flour", "salt"]
        );
    }

    #[test]
    fn ingredient_list_splits_comma_joined_sources() {
        let json = r#"{
            "id": "52772",
            "title": "Casserole",
            "ingredients": "3/4 cup soy sauce, sesame seeds",
            "instructions": "Bake",
            "source": "themealdb"
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(
            recipe.ingredient_list(),
            vec!["3/4 cup soy sauce", "sesame seeds"]
        );
    }

    #[test]
    fn image_or_default_falls_back_by_index() {
        let json = r#"{"id":"1","title":"x","ingredients":"","instructions":"","source":"spoonacular"}"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        let a = recipe.image_or_default(0);
        let b = recipe.image_or_default(5);
        assert_eq!(a, b);
        assert!(a.starts_with("https://"));
    }
}
