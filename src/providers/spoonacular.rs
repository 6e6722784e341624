use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ProviderSettings;
use crate::error::FetchError;
use crate::model::{MealPlan, Nutrition, PlanNutrients, PlannedMeal, Recipe, Source};
use crate::normalize::{strip_html_tags, NO_INSTRUCTIONS};
use crate::providers::{merge_by_id, MealPlanner, RecipeProvider};

/// Spoonacular adapter: complexSearch, findByIngredients, per-id
/// information, nutrition widget and meal-plan generation.
pub struct SpoonacularProvider {
    client: Client,
    api_key: String,
    base_url: String,
    search_limit: u32,
    ingredient_limit: u32,
}

impl SpoonacularProvider {
    /// Create a provider from configuration; the API key may come from the
    /// config or the SPOONACULAR_API_KEY environment variable.
    pub fn new(settings: &ProviderSettings, timeout: Duration) -> Result<Self, FetchError> {
        let api_key = settings.resolved_api_key().ok_or(FetchError::MissingApiKey)?;

        Ok(SpoonacularProvider {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: settings.spoonacular_url.clone(),
            search_limit: settings.search_limit,
            ingredient_limit: settings.ingredient_limit,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        SpoonacularProvider {
            client: Client::new(),
            api_key,
            base_url,
            search_limit: 100,
            ingredient_limit: 50,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&[("apiKey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 402 {
            // daily quota exhausted; callers show a dedicated message
            warn!("spoonacular quota exceeded on {path}");
            return Err(FetchError::QuotaExceeded);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RecipeProvider for SpoonacularProvider {
    fn provider_name(&self) -> &str {
        "spoonacular"
    }

    async fn search(&self, query: &str) -> Result<Vec<Recipe>, FetchError> {
        debug!("spoonacular search for {query:?}");
        let response: SearchResponse = self
            .get_json(
                "/recipes/complexSearch",
                &[
                    ("query", query.to_string()),
                    ("number", self.search_limit.to_string()),
                    ("addRecipeInformation", "true".to_string()),
                    ("addRecipeNutrition", "true".to_string()),
                    ("fillIngredients", "true".to_string()),
                    ("instructionsRequired", "true".to_string()),
                ],
            )
            .await?;

        debug!("spoonacular returned {} results", response.results.len());
        Ok(response.results.into_iter().map(Recipe::from).collect())
    }

    async fn search_by_ingredients(&self, ingredients: &str) -> Result<Vec<Recipe>, FetchError> {
        debug!("spoonacular ingredient search for {ingredients:?}");
        let matches: Vec<IngredientMatch> = self
            .get_json(
                "/recipes/findByIngredients",
                &[
                    ("ingredients", ingredients.to_string()),
                    ("number", self.ingredient_limit.to_string()),
                    ("ranking", "1".to_string()),
                    ("ignorePantry", "true".to_string()),
                ],
            )
            .await?;

        // Fan out one information lookup per match; a failed lookup drops
        // that recipe from the aggregate instead of failing the batch.
        let lookups = matches.iter().map(|m| self.detail_by_id(m.id));
        let mut found = Vec::new();
        for (result, m) in join_all(lookups).await.into_iter().zip(&matches) {
            match result {
                Ok(recipe) => found.push(recipe),
                Err(err) => warn!("dropping recipe {} from aggregate: {err}", m.id),
            }
        }

        Ok(merge_by_id(found))
    }

    async fn detail(&self, recipe_id: &str) -> Result<Recipe, FetchError> {
        let raw: RawRecipe = self
            .get_json(
                &format!("/recipes/{recipe_id}/information"),
                &[("includeNutrition", "true".to_string())],
            )
            .await?;
        Ok(Recipe::from(raw))
    }
}

impl SpoonacularProvider {
    async fn detail_by_id(&self, id: i64) -> Result<Recipe, FetchError> {
        self.detail(&id.to_string()).await
    }
}

#[async_trait]
impl MealPlanner for SpoonacularProvider {
    async fn generate_plan(
        &self,
        target_calories: u32,
        diet: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<MealPlan, FetchError> {
        let mut params = vec![
            ("timeFrame", "day".to_string()),
            ("targetCalories", target_calories.to_string()),
        ];
        if let Some(diet) = diet {
            params.push(("diet", diet.to_string()));
        }
        if let Some(exclude) = exclude {
            params.push(("exclude", exclude.to_string()));
        }

        let raw: RawPlan = self.get_json("/mealplanner/generate", &params).await?;
        Ok(MealPlan {
            meals: raw
                .meals
                .into_iter()
                .map(|meal| PlannedMeal {
                    id: meal.id.to_string(),
                    title: meal.title,
                    servings: meal.servings.unwrap_or(4),
                    ready_in_minutes: meal.ready_in_minutes,
                    nutrition: None,
                })
                .collect(),
            nutrients: raw.nutrients,
        })
    }

    async fn meal_nutrition(&self, meal_id: &str) -> Result<Nutrition, FetchError> {
        let widget: Value = self
            .get_json(&format!("/recipes/{meal_id}/nutritionWidget.json"), &[])
            .await?;

        // widget fields arrive either as bare numbers or as "543" / "34g"
        Ok(Nutrition {
            calories: widget_amount(&widget["calories"]),
            protein: widget_amount(&widget["protein"]),
            carbs: widget_amount(&widget["carbs"]),
            fat: widget_amount(&widget["fat"]),
            ..Default::default()
        })
    }
}

fn widget_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|a| a.is_finite()).unwrap_or(0.0).max(0.0),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse::<f64>().unwrap_or(0.0).max(0.0)
        }
        _ => 0.0,
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawRecipe>,
}

#[derive(Debug, Deserialize)]
struct IngredientMatch {
    id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecipe {
    id: i64,
    title: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    servings: Option<u32>,
    #[serde(default)]
    ready_in_minutes: Option<u32>,
    #[serde(default)]
    health_score: Option<f64>,
    #[serde(default)]
    extended_ingredients: Vec<RawIngredient>,
    #[serde(default)]
    analyzed_instructions: Vec<RawInstructionBlock>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    nutrition: Option<RawNutrition>,
    #[serde(default)]
    vegetarian: bool,
    #[serde(default)]
    vegan: bool,
    #[serde(default)]
    gluten_free: bool,
    #[serde(default)]
    dairy_free: bool,
    #[serde(default)]
    very_healthy: bool,
    #[serde(default)]
    source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIngredient {
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    original_name: Option<String>,
    #[serde(default)]
    measures: Option<RawMeasures>,
}

#[derive(Debug, Deserialize)]
struct RawMeasures {
    #[serde(default)]
    metric: Option<RawMeasure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeasure {
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    unit_short: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInstructionBlock {
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    step: String,
}

#[derive(Debug, Deserialize)]
struct RawNutrition {
    #[serde(default)]
    nutrients: Vec<RawNutrient>,
}

#[derive(Debug, Deserialize)]
struct RawNutrient {
    name: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    meals: Vec<RawPlannedMeal>,
    #[serde(default)]
    nutrients: PlanNutrients,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlannedMeal {
    id: i64,
    title: String,
    #[serde(default)]
    servings: Option<u32>,
    #[serde(default)]
    ready_in_minutes: Option<u32>,
}

/// Exact case-sensitive nutrient lookup; a missing nutrient is 0, never an
/// error, and never fails the rest of the normalization.
fn nutrient_amount(nutrients: &[RawNutrient], name: &str) -> f64 {
    nutrients
        .iter()
        .find(|n| n.name == name)
        .map(|n| n.amount)
        .filter(|a| a.is_finite())
        .unwrap_or(0.0)
        .max(0.0)
}

fn flatten_ingredients(ingredients: &[RawIngredient]) -> String {
    ingredients
        .iter()
        .map(|ing| {
            let metric = ing.measures.as_ref().and_then(|m| m.metric.as_ref());
            let amount = metric.and_then(|m| m.amount).or(ing.amount);
            let unit = metric
                .and_then(|m| m.unit_short.clone())
                .or_else(|| ing.unit.clone())
                .unwrap_or_default();
            let name = ing
                .name
                .clone()
                .or_else(|| ing.original_name.clone())
                .unwrap_or_default();

            let mut parts = Vec::new();
            if let Some(amount) = amount {
                parts.push(amount.to_string());
            }
            if !unit.is_empty() {
                parts.push(unit);
            }
            if !name.is_empty() {
                parts.push(name);
            }
            parts.join(" ")
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn flatten_instructions(blocks: &[RawInstructionBlock], raw: Option<&str>) -> String {
    if let Some(block) = blocks.first() {
        if !block.steps.is_empty() {
            return block
                .steps
                .iter()
                .map(|s| s.step.trim().to_string())
                .collect::<Vec<_>>()
                .join("|");
        }
    }

    match raw {
        Some(text) if !text.trim().is_empty() => strip_html_tags(text),
        _ => NO_INSTRUCTIONS.to_string(),
    }
}

impl From<RawRecipe> for Recipe {
    fn from(raw: RawRecipe) -> Self {
        let nutrients = raw
            .nutrition
            .as_ref()
            .map(|n| n.nutrients.as_slice())
            .unwrap_or(&[]);
        let nutrition = Nutrition {
            calories: nutrient_amount(nutrients, "Calories"),
            protein: nutrient_amount(nutrients, "Protein"),
            carbs: nutrient_amount(nutrients, "Carbohydrates"),
            fat: nutrient_amount(nutrients, "Fat"),
            fiber: nutrient_amount(nutrients, "Fiber"),
            sugar: nutrient_amount(nutrients, "Sugar"),
            sodium: nutrient_amount(nutrients, "Sodium"),
        };

        Recipe {
            id: raw.id.to_string(),
            title: raw.title,
            image: raw.image,
            servings: raw.servings.unwrap_or(4),
            ready_in_minutes: raw.ready_in_minutes,
            health_score: raw.health_score.unwrap_or(0.0).max(0.0) as u32,
            ingredients: flatten_ingredients(&raw.extended_ingredients),
            instructions: flatten_instructions(&raw.analyzed_instructions, raw.instructions.as_deref()),
            nutrition: Some(nutrition),
            vegetarian: raw.vegetarian,
            vegan: raw.vegan,
            gluten_free: raw.gluten_free,
            dairy_free: raw.dairy_free,
            very_healthy: raw.very_healthy,
            source: Source::Spoonacular,
            source_url: raw.source_url,
        }
    }
}
