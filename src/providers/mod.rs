mod mealdb;
mod spoonacular;

pub use mealdb::MealDbProvider;
pub use spoonacular::SpoonacularProvider;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::{MealPlan, Nutrition, Recipe};

/// Unified trait for all recipe providers
///
/// Every adapter normalizes its own payload shapes into [`Recipe`], so
/// nothing downstream ever branches on which provider produced a result.
#[async_trait]
pub trait RecipeProvider: Send + Sync {
    /// Get the provider name (e.g., "spoonacular", "themealdb")
    fn provider_name(&self) -> &str;

    /// Search recipes by keyword, in the provider's relevance order
    async fn search(&self, query: &str) -> Result<Vec<Recipe>, FetchError>;

    /// Search recipes by a comma-separated ingredient list
    async fn search_by_ingredients(&self, ingredients: &str) -> Result<Vec<Recipe>, FetchError>;

    /// Fetch one recipe with full information by its source id
    async fn detail(&self, recipe_id: &str) -> Result<Recipe, FetchError>;
}

/// Daily meal-plan generation. Only Spoonacular offers this, so it is a
/// separate seam rather than part of [`RecipeProvider`].
#[async_trait]
pub trait MealPlanner: Send + Sync {
    /// Generate a one-day plan for a calorie target, optionally constrained
    /// by a diet and an exclusion list
    async fn generate_plan(
        &self,
        target_calories: u32,
        diet: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<MealPlan, FetchError>;

    /// Fetch the nutrition summary for one planned meal
    async fn meal_nutrition(&self, meal_id: &str) -> Result<Nutrition, FetchError>;
}

/// Collapse duplicate ids from an aggregated lookup batch.
///
/// Last-seen entry for an id wins; output order is the order in which each
/// distinct id was first encountered.
pub(crate) fn merge_by_id(recipes: Vec<Recipe>) -> Vec<Recipe> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: std::collections::HashMap<String, Recipe> = std::collections::HashMap::new();

    for recipe in recipes {
        if !by_id.contains_key(&recipe.id) {
            order.push(recipe.id.clone());
        }
        by_id.insert(recipe.id.clone(), recipe);
    }

    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}
