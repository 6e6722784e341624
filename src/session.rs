//! Tab-scoped result handoff between the search view and the detail view.
//!
//! After a successful search the full result list is mirrored into the
//! session store so a detail view reached by navigation can recover the
//! exact clicked recipe without re-querying. The mirror is advisory only:
//! persisted saves always go through the backend, never through here.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use crate::model::Recipe;

/// Store key holding the serialized index → recipe map.
pub const RESULTS_KEY: &str = "searchResults";
/// Store key holding the raw query string the results belong to.
pub const QUERY_KEY: &str = "searchQuery";

/// How long a detail view waits for recoverable state before giving up
/// and redirecting home.
pub const REDIRECT_GRACE: Duration = Duration::from_secs(3);

/// Minimal tab-scoped string key-value storage.
pub trait SessionStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// In-memory `SessionStore`, dropped with the owning session.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    fn remove_item(&self, key: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.remove(key);
        }
    }
}

/// Outcome of trying to recover result state on a detail route.
#[derive(Debug, PartialEq)]
pub enum Recovery {
    /// Results were still live in memory; no storage read happened.
    Live(Vec<Recipe>, String),
    /// Results were rebuilt from the session store.
    Restored(Vec<Recipe>, String),
    /// Nothing recoverable: redirect home after the grace delay.
    Redirect { after: Duration },
}

/// Mirrors search results into a `SessionStore` and recovers them later.
pub struct SessionBridge<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> SessionBridge<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Serialize the full result list as an index-keyed map plus the raw
    /// query string under the two well-known keys.
    pub fn store_results(&self, query: &str, recipes: &[Recipe]) -> Result<(), serde_json::Error> {
        let map: BTreeMap<String, &Recipe> = recipes
            .iter()
            .enumerate()
            .map(|(index, recipe)| (index.to_string(), recipe))
            .collect();

        self.store.set_item(RESULTS_KEY, &serde_json::to_string(&map)?);
        self.store.set_item(QUERY_KEY, query);
        log::debug!("mirrored {} results for {query:?}", recipes.len());
        Ok(())
    }

    /// The stored result list in index order, with the query it belongs to.
    pub fn restore(&self) -> Option<(Vec<Recipe>, String)> {
        let raw = self.store.get_item(RESULTS_KEY)?;
        let map: BTreeMap<String, Recipe> = serde_json::from_str(&raw).ok()?;

        // BTreeMap orders "10" before "2"; sort by numeric index
        let mut entries: Vec<(usize, Recipe)> = map
            .into_iter()
            .filter_map(|(key, recipe)| key.parse::<usize>().ok().map(|i| (i, recipe)))
            .collect();
        entries.sort_by_key(|(index, _)| *index);

        let query = self.store.get_item(QUERY_KEY).unwrap_or_default();
        Some((entries.into_iter().map(|(_, r)| r).collect(), query))
    }

    /// One stored recipe by its stringified index key.
    pub fn recipe_at(&self, index: usize) -> Option<Recipe> {
        let raw = self.store.get_item(RESULTS_KEY)?;
        let mut map: HashMap<String, Recipe> = serde_json::from_str(&raw).ok()?;
        map.remove(&index.to_string())
    }

    /// Detail-route recovery: an in-memory result set wins, otherwise the
    /// store is consulted, otherwise the caller should redirect home after
    /// [`REDIRECT_GRACE`].
    pub fn recover(&self, in_memory: Option<(&[Recipe], &str)>) -> Recovery {
        if let Some((recipes, query)) = in_memory {
            if !recipes.is_empty() {
                return Recovery::Live(recipes.to_vec(), query.to_string());
            }
        }

        match self.restore() {
            Some((recipes, query)) if !recipes.is_empty() => Recovery::Restored(recipes, query),
            _ => Recovery::Redirect {
                after: REDIRECT_GRACE,
            },
        }
    }

    /// Drop the mirrored state (on logout or a cleared search).
    pub fn clear(&self) {
        self.store.remove_item(RESULTS_KEY);
        self.store.remove_item(QUERY_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;

    fn recipe(id: &str, title: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: title.to_string(),
            image: None,
            servings: 4,
            ready_in_minutes: Some(30),
            health_score: 0,
            ingredients: "1 cup rice".to_string(),
            instructions: "Cook the rice".to_string(),
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

    #[test]
    fn round_trip_by_index_survives_reload() {
        let bridge = SessionBridge::new(MemoryStore::new());
        let results = vec![recipe("1", "Soup"), recipe("2", "Stew"), recipe("3", "Pie")];
        bridge.store_results("dinner", &results).unwrap();

        // a fresh bridge over the same store simulates the post-reload view
        let restored = bridge.recipe_at(1).unwrap();
        assert_eq!(restored, results[1]);
    }

    #[test]
    fn restore_returns_results_in_index_order() {
        let bridge = SessionBridge::new(MemoryStore::new());
        let results: Vec<Recipe> = (0..12)
            .map(|i| recipe(&i.to_string(), &format!("Recipe {i}")))
            .collect();
        bridge.store_results("brunch", &results).unwrap();

        let (restored, query) = bridge.restore().unwrap();
        assert_eq!(restored, results);
        assert_eq!(query, "brunch");
    }

    #[test]
    fn live_results_win_over_the_store() {
        let bridge = SessionBridge::new(MemoryStore::new());
        bridge.store_results("old", &[recipe("9", "Stale")]).unwrap();

        let live = [recipe("1", "Fresh")];
        match bridge.recover(Some((&live, "new"))) {
            Recovery::Live(recipes, query) => {
                assert_eq!(recipes[0].title, "Fresh");
                assert_eq!(query, "new");
            }
            other => panic!("expected live recovery, got {other:?}"),
        }
    }

    #[test]
    fn empty_props_fall_through_to_the_store() {
        let bridge = SessionBridge::new(MemoryStore::new());
        bridge.store_results("pasta", &[recipe("1", "Carbonara")]).unwrap();

        match bridge.recover(Some((&[], "pasta"))) {
            Recovery::Restored(recipes, _) => assert_eq!(recipes[0].title, "Carbonara"),
            other => panic!("expected restored recovery, got {other:?}"),
        }
    }

    #[test]
    fn no_state_means_redirect_after_grace() {
        let bridge = SessionBridge::new(MemoryStore::new());
        assert_eq!(
            bridge.recover(None),
            Recovery::Redirect {
                after: REDIRECT_GRACE
            }
        );
    }

    #[test]
    fn clear_removes_both_keys() {
        let store = MemoryStore::new();
        let bridge = SessionBridge::new(store);
        bridge.store_results("q", &[recipe("1", "A")]).unwrap();
        bridge.clear();
        assert!(bridge.restore().is_none());
    }
}
