use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;

use crate::config::ProviderSettings;
use crate::error::FetchError;
use crate::model::{Recipe, Source};
use crate::normalize::{strip_html_tags, NO_INSTRUCTIONS};
use crate::providers::{merge_by_id, RecipeProvider};

/// TheMealDB publishes ingredients as numbered slots strIngredient1..20.
const MAX_INGREDIENT_SLOTS: usize = 20;

/// TheMealDB adapter: search.php, filter.php and lookup.php. Normalizes the
/// flat numbered-slot payloads into the same [`Recipe`] shape as the
/// primary provider.
pub struct MealDbProvider {
    client: Client,
    base_url: String,
}

impl MealDbProvider {
    pub fn new(settings: &ProviderSettings, timeout: Duration) -> Result<Self, FetchError> {
        Ok(MealDbProvider {
            client: Client::builder().timeout(timeout).build()?,
            base_url: settings.mealdb_url.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String) -> Self {
        MealDbProvider {
            client: Client::new(),
            base_url,
        }
    }

    async fn get_meals(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<Value>, FetchError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // "meals" is null, not an empty array, when nothing matched
        let body: Value = response.json().await?;
        match body.get("meals") {
            Some(Value::Array(meals)) => Ok(meals.clone()),
            _ => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl RecipeProvider for MealDbProvider {
    fn provider_name(&self) -> &str {
        "themealdb"
    }

    async fn search(&self, query: &str) -> Result<Vec<Recipe>, FetchError> {
        debug!("themealdb search for {query:?}");
        let meals = self.get_meals("/search.php", &[("s", query)]).await?;
        Ok(meals.iter().filter_map(normalize_meal).collect())
    }

    async fn search_by_ingredients(&self, ingredients: &str) -> Result<Vec<Recipe>, FetchError> {
        // filter.php returns id/title/thumb only; fan out lookups for the
        // full records and drop the ones that fail
        let meals = self.get_meals("/filter.php", &[("i", ingredients)]).await?;
        let ids: Vec<String> = meals
            .iter()
            .filter_map(|meal| meal["idMeal"].as_str().map(str::to_string))
            .collect();

        let lookups = ids.iter().map(|id| self.detail(id));
        let mut found = Vec::new();
        for (result, id) in join_all(lookups).await.into_iter().zip(&ids) {
            match result {
                Ok(recipe) => found.push(recipe),
                Err(err) => warn!("dropping meal {id} from aggregate: {err}"),
            }
        }

        Ok(merge_by_id(found))
    }

    async fn detail(&self, recipe_id: &str) -> Result<Recipe, FetchError> {
        let meals = self.get_meals("/lookup.php", &[("i", recipe_id)]).await?;
        meals
            .first()
            .and_then(normalize_meal)
            .ok_or(FetchError::Status(404))
    }
}

/// Join the numbered ingredient slots as `"<measure> <ingredient>"`,
/// skipping empty slots, preserving slot order, stopping at slot 20.
fn flatten_slots(meal: &Value) -> String {
    let mut entries = Vec::new();
    for slot in 1..=MAX_INGREDIENT_SLOTS {
        let ingredient = slot_text(meal, "strIngredient", slot);
        if ingredient.is_empty() {
            continue;
        }
        let measure = slot_text(meal, "strMeasure", slot);
        if measure.is_empty() {
            entries.push(ingredient);
        } else {
            entries.push(format!("{measure} {ingredient}"));
        }
    }
    entries.join(", ")
}

fn slot_text(meal: &Value, prefix: &str, slot: usize) -> String {
    meal[&format!("{prefix}{slot}")]
        .as_str()
        .unwrap_or("")
        .trim()
        .to_string()
}

fn normalize_meal(meal: &Value) -> Option<Recipe> {
    let id = meal["idMeal"].as_str()?.to_string();
    let title = meal["strMeal"].as_str()?.to_string();

    let instructions = match meal["strInstructions"].as_str() {
        Some(text) if !text.trim().is_empty() => strip_html_tags(text),
        _ => NO_INSTRUCTIONS.to_string(),
    };

    Some(Recipe {
        id,
        title,
        image: meal["strMealThumb"].as_str().map(str::to_string),
        servings: 4,
        ready_in_minutes: None,
        health_score: 0,
        ingredients: flatten_slots(meal),
        instructions,
        nutrition: None,
        vegetarian: false,
        vegan: false,
        gluten_free: false,
        dairy_free: false,
        very_healthy: false,
        source: Source::MealDb,
        source_url: meal["strSource"].as_str().map(str::to_string),
    })
}
