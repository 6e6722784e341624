//! Client for the persistence backend: saved recipes, favorites, meal
//! plans, shopping list and auth. Every authenticated request carries a
//! bearer token header.

use std::time::Duration;

use futures::future::join_all;
use log::debug;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::config::BackendSettings;
use crate::error::FetchError;
use crate::model::{Nutrition, Recipe};

/// Payload for saving a recipe to the backend.
#[derive(Debug, Clone, Serialize)]
pub struct NewSavedRecipe {
    pub title: String,
    pub ingredients: String,
    pub servings: u32,
    pub instructions: String,
    pub image: Option<String>,
    pub nutrition: Option<Nutrition>,
}

impl From<&Recipe> for NewSavedRecipe {
    fn from(recipe: &Recipe) -> Self {
        NewSavedRecipe {
            title: recipe.title.clone(),
            ingredients: recipe.ingredients.clone(),
            servings: recipe.servings,
            instructions: recipe.instructions.clone(),
            image: recipe.image.clone(),
            nutrition: recipe.nutrition.clone(),
        }
    }
}

/// A recipe as persisted by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedRecipe {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
}

/// One favorited recipe reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub recipe_id: String,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, rename = "sourceType")]
    pub source_type: Option<String>,
}

/// One shopping-list row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub ingredient: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub recipe_id: Option<String>,
    #[serde(default)]
    pub checked: bool,
}

/// One meal-plan slot for a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanEntry {
    #[serde(default)]
    pub id: Option<i64>,
    pub date: String,
    pub meal_type: String,
    pub recipe_title: String,
    #[serde(default)]
    pub ingredients: Option<String>,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Auth response: bearer token plus display name.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(default)]
    pub username: String,
}

/// REST client for the backend collaborator. The session bridge and caches
/// are never a source of truth for anything persisted here.
pub struct BackendClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings, timeout: Duration) -> Result<Self, FetchError> {
        Ok(BackendClient {
            client: Client::builder().timeout(timeout).build()?,
            base_url: settings.base_url.clone(),
            token: None,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String) -> Self {
        BackendClient {
            client: Client::new(),
            base_url,
            token: None,
        }
    }

    /// Use an existing bearer token (e.g. restored from disk).
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(FetchError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    // --- auth ---

    pub async fn login(&mut self, username: &str, password: &str) -> Result<AuthSession, FetchError> {
        let response = self
            .request(Method::POST, "/auth/login")
            .json(&Credentials { username, password })
            .send()
            .await?;
        let session: AuthSession = Self::expect_success(response).await?.json().await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, FetchError> {
        let response = self
            .request(Method::POST, "/auth/register")
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;
        let session: AuthSession = Self::expect_success(response).await?.json().await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), FetchError> {
        let response = self
            .request(Method::POST, "/auth/forgot-password")
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), FetchError> {
        let response = self
            .request(Method::POST, "/auth/reset-password")
            .json(&serde_json::json!({ "token": token, "password": new_password }))
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> Result<(), FetchError> {
        let response = self
            .request(Method::GET, &format!("/auth/verify-email?token={token}"))
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    // --- saved recipes ---

    pub async fn saved_recipes(&self) -> Result<Vec<SavedRecipe>, FetchError> {
        let response = self.request(Method::GET, "/recipes").send().await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    /// Save a recipe, rejecting case-insensitive duplicate titles before
    /// hitting the backend.
    pub async fn save_recipe(&self, recipe: &NewSavedRecipe) -> Result<SavedRecipe, FetchError> {
        let existing = self.saved_recipes().await?;
        if existing
            .iter()
            .any(|saved| saved.title.eq_ignore_ascii_case(&recipe.title))
        {
            return Err(FetchError::Backend {
                status: 409,
                message: "This recipe has already been saved".to_string(),
            });
        }

        let response = self
            .request(Method::POST, "/recipes")
            .json(recipe)
            .send()
            .await?;
        debug!("saved recipe {:?}", recipe.title);
        Ok(Self::expect_success(response).await?.json().await?)
    }

    pub async fn delete_recipe(&self, id: i64) -> Result<(), FetchError> {
        let response = self
            .request(Method::DELETE, &format!("/recipes/{id}"))
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    // --- favorites ---

    pub async fn favorites(&self) -> Result<Vec<Favorite>, FetchError> {
        let response = self.request(Method::GET, "/favorites").send().await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    pub async fn add_favorite(&self, favorite: &Favorite) -> Result<(), FetchError> {
        let response = self
            .request(Method::POST, "/favorites")
            .json(favorite)
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    pub async fn remove_favorite(&self, recipe_id: &str) -> Result<(), FetchError> {
        let response = self
            .request(Method::DELETE, &format!("/favorites/{recipe_id}"))
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    // --- meal plans ---

    pub async fn meal_plans(&self, date: &str) -> Result<Vec<MealPlanEntry>, FetchError> {
        let response = self
            .request(Method::GET, &format!("/meal-plans?date={date}"))
            .send()
            .await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    pub async fn save_meal_plan(&self, entry: &MealPlanEntry) -> Result<MealPlanEntry, FetchError> {
        let response = self
            .request(Method::POST, "/meal-plans")
            .json(entry)
            .send()
            .await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    pub async fn delete_meal_plan(&self, id: i64) -> Result<(), FetchError> {
        let response = self
            .request(Method::DELETE, &format!("/meal-plans/{id}"))
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    // --- shopping list ---

    pub async fn shopping_list(&self) -> Result<Vec<ShoppingItem>, FetchError> {
        let response = self.request(Method::GET, "/shopping-list").send().await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    pub async fn add_shopping_item(&self, item: &ShoppingItem) -> Result<ShoppingItem, FetchError> {
        let response = self
            .request(Method::POST, "/shopping-list")
            .json(item)
            .send()
            .await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    /// Add every ingredient of a recipe as its own shopping row. Posts fan
    /// out concurrently; the first failure is reported.
    pub async fn add_items_from_recipe(
        &self,
        recipe_id: &str,
        ingredients: &[String],
    ) -> Result<Vec<ShoppingItem>, FetchError> {
        let posts = ingredients.iter().map(|ingredient| {
            let item = ShoppingItem {
                id: None,
                ingredient: ingredient.clone(),
                quantity: String::new(),
                recipe_id: Some(recipe_id.to_string()),
                checked: false,
            };
            async move { self.add_shopping_item(&item).await }
        });

        join_all(posts).await.into_iter().collect()
    }

    pub async fn remove_shopping_item(&self, id: i64) -> Result<(), FetchError> {
        let response = self
            .request(Method::DELETE, &format!("/shopping-list/{id}"))
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}
