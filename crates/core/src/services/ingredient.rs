//! Ingredient service.

use foodgram_common::{AppError, AppResult};
use foodgram_db::{entities::ingredient, repositories::IngredientRepository};

/// Ingredient service (read-only catalog).
#[derive(Clone)]
pub struct IngredientService {
    ingredient_repo: IngredientRepository,
}

impl IngredientService {
    /// Create a new ingredient service.
    #[must_use]
    pub const fn new(ingredient_repo: IngredientRepository) -> Self {
        Self { ingredient_repo }
    }

    /// List ingredients, optionally filtered by a case-insensitive name prefix.
    pub async fn search(&self, prefix: Option<&str>) -> AppResult<Vec<ingredient::Model>> {
        self.ingredient_repo.search(prefix).await
    }

    /// Get an ingredient by ID.
    pub async fn get(&self, id: &str) -> AppResult<ingredient::Model> {
        self.ingredient_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ingredient {id}")))
    }
}
