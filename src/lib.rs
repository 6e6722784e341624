pub mod backend;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod pagination;
pub mod providers;
pub mod session;

pub use backend::{BackendClient, NewSavedRecipe};
pub use cache::TtlCache;
pub use client::{plan_day, RecipeClient, SearchOutcome};
pub use config::AppConfig;
pub use error::FetchError;
pub use model::{MealPlan, Nutrition, Recipe, Source};
pub use pagination::{PageEntry, Paginator};
pub use providers::{MealDbProvider, MealPlanner, RecipeProvider, SpoonacularProvider};
pub use session::{MemoryStore, Recovery, SessionBridge, SessionStore};

use log::debug;

/// Build a [`RecipeClient`] over the configured primary provider, with the
/// configured cache lifetime and request timeout applied.
pub fn client_from_config(config: &AppConfig) -> Result<RecipeClient, FetchError> {
    let provider = SpoonacularProvider::new(&config.provider, config.request_timeout())?;
    let client = RecipeClient::with_ttl(Box::new(provider), config.cache_ttl());
    debug!("using provider {}", client.provider_name());
    Ok(client)
}

/// Search recipes by keyword with a one-off client.
///
/// Library users holding a long-lived [`RecipeClient`] get caching and
/// supersession on top of this.
pub async fn search_recipes(config: &AppConfig, term: &str) -> Result<Vec<Recipe>, FetchError> {
    let client = client_from_config(config)?;
    match client.search_by_keyword(term).await? {
        SearchOutcome::Results(recipes) => Ok(recipes),
        _ => Ok(Vec::new()),
    }
}
