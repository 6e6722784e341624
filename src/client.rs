//! Search orchestration: cache-first provider calls, supersession guarding
//! and the meal-plan nutrition fan-out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};

use crate::cache::{detail_key, search_key, TtlCache};
use crate::error::FetchError;
use crate::model::{MealPlan, Recipe};
use crate::providers::{MealPlanner, RecipeProvider};

/// Outcome of a search request.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Normalized results in provider order.
    Results(Vec<Recipe>),
    /// The provider matched nothing; a neutral empty state, not an error.
    Empty,
    /// A newer search started while this one was in flight; the result was
    /// not committed and should be discarded by the caller too.
    Superseded,
}

/// Orchestrates one provider behind the search/detail caches.
///
/// Construct one per application lifetime and share it by reference; every
/// method takes `&self`. Each new search supersedes any older in-flight one:
/// the late result is still cached (it is valid data for its key) but is
/// reported as [`SearchOutcome::Superseded`] so stale state never overwrites
/// newer results.
pub struct RecipeClient {
    provider: Box<dyn RecipeProvider>,
    search_cache: TtlCache<Vec<Recipe>>,
    detail_cache: TtlCache<Recipe>,
    generation: AtomicU64,
}

impl RecipeClient {
    pub fn new(provider: Box<dyn RecipeProvider>) -> Self {
        Self::with_ttl(provider, crate::cache::DEFAULT_TTL)
    }

    /// Client whose search and detail cache entries expire after `ttl`.
    pub fn with_ttl(provider: Box<dyn RecipeProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            search_cache: TtlCache::with_ttl(ttl),
            detail_cache: TtlCache::with_ttl(ttl),
            generation: AtomicU64::new(0),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Keyword search with an explicit term.
    ///
    /// Terms equal after trimming and lower-casing share one cache entry, so
    /// repeating a search inside the ttl window issues no network call.
    pub async fn search_by_keyword(&self, term: &str) -> Result<SearchOutcome, FetchError> {
        let key = search_key(term);
        if key.is_empty() {
            return Err(FetchError::EmptyQuery);
        }

        // every search claims a generation, cache hits included, so an
        // older in-flight search sees itself superseded either way
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(cached) = self.search_cache.get(&key) {
            debug!("using cached results for {key:?}");
            return Ok(self.outcome(cached));
        }

        let recipes = self.provider.search(term.trim()).await?;
        self.search_cache.set(&key, recipes.clone());

        if self.generation.load(Ordering::SeqCst) != generation {
            warn!("search for {key:?} superseded by a newer one");
            return Ok(SearchOutcome::Superseded);
        }
        Ok(self.outcome(recipes))
    }

    /// Ingredient search with an explicit comma-separated list. Same cache
    /// and supersession behavior as [`Self::search_by_keyword`].
    pub async fn search_by_ingredients(&self, ingredients: &str) -> Result<SearchOutcome, FetchError> {
        let key = search_key(ingredients);
        if key.is_empty() {
            return Err(FetchError::EmptyQuery);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(cached) = self.search_cache.get(&key) {
            debug!("using cached results for {key:?}");
            return Ok(self.outcome(cached));
        }

        let recipes = self.provider.search_by_ingredients(ingredients.trim()).await?;
        self.search_cache.set(&key, recipes.clone());

        if self.generation.load(Ordering::SeqCst) != generation {
            warn!("ingredient search for {key:?} superseded by a newer one");
            return Ok(SearchOutcome::Superseded);
        }
        Ok(self.outcome(recipes))
    }

    /// Full-detail fetch for one recipe, cached under its own key namespace.
    pub async fn recipe_detail(&self, recipe_id: &str) -> Result<Recipe, FetchError> {
        let key = detail_key(recipe_id);
        if let Some(cached) = self.detail_cache.get(&key) {
            return Ok(cached);
        }

        let recipe = self.provider.detail(recipe_id).await?;
        self.detail_cache.set(&key, recipe.clone());
        Ok(recipe)
    }

    /// Drop all cached search and detail results.
    pub fn clear_caches(&self) {
        self.search_cache.clear();
        self.detail_cache.clear();
    }

    fn outcome(&self, recipes: Vec<Recipe>) -> SearchOutcome {
        if recipes.is_empty() {
            SearchOutcome::Empty
        } else {
            SearchOutcome::Results(recipes)
        }
    }
}

/// Generate a one-day meal plan and fill in per-meal nutrition.
///
/// The nutrition sub-fetches fan out concurrently and join before the plan
/// is returned. Best-effort: a failed sub-fetch leaves that meal's nutrition
/// `None` ("unavailable") instead of aborting the plan.
pub async fn plan_day<P: MealPlanner + ?Sized>(
    planner: &P,
    target_calories: u32,
    diet: Option<&str>,
    exclude: Option<&str>,
) -> Result<MealPlan, FetchError> {
    let mut plan = planner.generate_plan(target_calories, diet, exclude).await?;

    let fetches = plan.meals.iter().map(|meal| planner.meal_nutrition(&meal.id));
    let results = join_all(fetches).await;

    for (meal, result) in plan.meals.iter_mut().zip(results) {
        match result {
            Ok(nutrition) => meal.nutrition = Some(nutrition),
            Err(err) => {
                warn!("nutrition unavailable for meal {}: {err}", meal.id);
                meal.nutrition = None;
            }
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Nutrition, PlanNutrients, PlannedMeal, Source};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn recipe(id: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: format!("Recipe {id}"),
            image: None,
            servings: 4,
            ready_in_minutes: None,
            health_score: 0,
            ingredients: String::new(),
            instructions: String::new(),
            nutrition: None,
            vegetarian: false,
            vegan: false,
            gluten_free: false,
            dairy_free: false,
            very_healthy: false,
            source: Source::Spoonacular,
            source_url: None,
        }
    }

    /// Counts calls so tests can assert on cache behavior without a server.
    struct CountingProvider {
        searches: Arc<AtomicUsize>,
        details: Arc<AtomicUsize>,
        empty: bool,
    }

    impl CountingProvider {
        fn new(empty: bool) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let searches = Arc::new(AtomicUsize::new(0));
            let details = Arc::new(AtomicUsize::new(0));
            let provider = Self {
                searches: searches.clone(),
                details: details.clone(),
                empty,
            };
            (provider, searches, details)
        }
    }

    #[async_trait]
    impl RecipeProvider for CountingProvider {
        fn provider_name(&self) -> &str {
            "counting"
        }

        async fn search(&self, _query: &str) -> Result<Vec<Recipe>, FetchError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if self.empty {
                Ok(Vec::new())
            } else {
                Ok(vec![recipe("1"), recipe("2")])
            }
        }

        async fn search_by_ingredients(&self, _i: &str) -> Result<Vec<Recipe>, FetchError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![recipe("9")])
        }

        async fn detail(&self, recipe_id: &str) -> Result<Recipe, FetchError> {
            self.details.fetch_add(1, Ordering::SeqCst);
            Ok(recipe(recipe_id))
        }
    }

    #[tokio::test]
    async fn equivalent_terms_share_one_network_call() {
        let (provider, searches, _) = CountingProvider::new(false);
        let client = RecipeClient::new(Box::new(provider));

        let first = client.search_by_keyword("Chicken Soup").await.unwrap();
        assert!(matches!(first, SearchOutcome::Results(_)));

        // trim + lowercase equal: served from cache
        let second = client.search_by_keyword("  chicken soup ").await.unwrap();
        assert!(matches!(second, SearchOutcome::Results(_)));

        assert_eq!(searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_query_is_rejected_before_any_call() {
        let (provider, searches, _) = CountingProvider::new(false);
        let client = RecipeClient::new(Box::new(provider));
        let err = client.search_by_keyword("   ").await.unwrap_err();
        assert!(matches!(err, FetchError::EmptyQuery));
        assert_eq!(searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_results_are_not_an_error() {
        let (provider, _, _) = CountingProvider::new(true);
        let client = RecipeClient::new(Box::new(provider));
        let outcome = client.search_by_keyword("nothing").await.unwrap();
        assert!(matches!(outcome, SearchOutcome::Empty));
    }

    #[tokio::test]
    async fn detail_fetches_are_cached_by_id() {
        let (provider, _, details) = CountingProvider::new(false);
        let client = RecipeClient::new(Box::new(provider));
        let a = client.recipe_detail("42").await.unwrap();
        let b = client.recipe_detail("42").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(details.load(Ordering::SeqCst), 1);
    }

    /// Provider whose "slow" search parks until the gate opens, letting a
    /// test interleave a newer search ahead of an older in-flight one.
    struct GatedProvider {
        gate: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl RecipeProvider for GatedProvider {
        fn provider_name(&self) -> &str {
            "gated"
        }

        async fn search(&self, query: &str) -> Result<Vec<Recipe>, FetchError> {
            if query == "slow" {
                self.gate.notified().await;
            }
            Ok(vec![recipe(query)])
        }

        async fn search_by_ingredients(&self, _i: &str) -> Result<Vec<Recipe>, FetchError> {
            Ok(Vec::new())
        }

        async fn detail(&self, recipe_id: &str) -> Result<Recipe, FetchError> {
            Ok(recipe(recipe_id))
        }
    }

    #[tokio::test]
    async fn superseded_search_is_reported_not_committed() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let client = RecipeClient::new(Box::new(GatedProvider { gate: gate.clone() }));

        // the slow search starts first; the fast one completes while it is
        // parked, then opens the gate
        let slow = client.search_by_keyword("slow");
        let fast = async {
            let outcome = client.search_by_keyword("fast").await;
            gate.notify_one();
            outcome
        };

        let (slow_outcome, fast_outcome) = tokio::join!(slow, fast);
        assert!(matches!(slow_outcome.unwrap(), SearchOutcome::Superseded));
        assert!(matches!(fast_outcome.unwrap(), SearchOutcome::Results(_)));

        // the late result was still cached for its own key
        assert!(matches!(
            client.search_by_keyword("slow").await.unwrap(),
            SearchOutcome::Results(_)
        ));
    }

    #[tokio::test]
    async fn newer_cache_hit_supersedes_older_in_flight_search() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let client = RecipeClient::new(Box::new(GatedProvider { gate: gate.clone() }));

        // prime the cache so the repeated "fast" search never hits the
        // network, then park an older "slow" search behind the gate
        assert!(matches!(
            client.search_by_keyword("fast").await.unwrap(),
            SearchOutcome::Results(_)
        ));

        let slow = client.search_by_keyword("slow");
        let fast = async {
            let outcome = client.search_by_keyword("fast").await;
            gate.notify_one();
            outcome
        };

        let (slow_outcome, fast_outcome) = tokio::join!(slow, fast);
        // the cache-served search still counts as newer
        assert!(matches!(slow_outcome.unwrap(), SearchOutcome::Superseded));
        assert!(matches!(fast_outcome.unwrap(), SearchOutcome::Results(_)));
    }

    #[tokio::test]
    async fn configured_ttl_reaches_the_search_cache() {
        let (provider, searches, _) = CountingProvider::new(false);
        // zero ttl: every entry is stale the moment it is stored
        let client = RecipeClient::with_ttl(Box::new(provider), Duration::ZERO);

        client.search_by_keyword("pasta").await.unwrap();
        client.search_by_keyword("pasta").await.unwrap();
        assert_eq!(searches.load(Ordering::SeqCst), 2);
    }

    /// Planner stub: meal "2" has no nutrition available.
    struct StubPlanner;

    #[async_trait]
    impl MealPlanner for StubPlanner {
        async fn generate_plan(
            &self,
            _target_calories: u32,
            _diet: Option<&str>,
            _exclude: Option<&str>,
        ) -> Result<MealPlan, FetchError> {
            Ok(MealPlan {
                meals: vec![
                    PlannedMeal {
                        id: "1".to_string(),
                        title: "Pancakes".to_string(),
                        servings: 2,
                        ready_in_minutes: Some(20),
                        nutrition: None,
                    },
                    PlannedMeal {
                        id: "2".to_string(),
                        title: "Soup".to_string(),
                        servings: 4,
                        ready_in_minutes: None,
                        nutrition: None,
                    },
                ],
                nutrients: PlanNutrients::default(),
            })
        }

        async fn meal_nutrition(&self, meal_id: &str) -> Result<Nutrition, FetchError> {
            if meal_id == "2" {
                Err(FetchError::Status(500))
            } else {
                Ok(Nutrition {
                    calories: 400.0,
                    ..Default::default()
                })
            }
        }
    }

    #[tokio::test]
    async fn failed_nutrition_fetch_does_not_abort_the_plan() {
        let plan = plan_day(&StubPlanner, 2000, None, None).await.unwrap();
        assert_eq!(plan.meals.len(), 2);
        assert_eq!(plan.meals[0].nutrition.as_ref().unwrap().calories, 400.0);
        assert!(plan.meals[1].nutrition.is_none());
    }
}
