//! Recipe write path: validation and transactional persistence.

use std::collections::HashSet;

use chrono::Utc;
use foodgram_common::{AppError, AppResult, FieldErrors, IdGenerator};
use foodgram_db::{
    entities::{recipe, recipe_ingredient, recipe_tag, user},
    repositories::{IngredientRepository, RecipeFilter, RecipeRepository, TagRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use super::permission::can_mutate_recipe;

const NO_INGREDIENTS: &str = "You have to add at least one ingredient.";
const NO_TAGS: &str = "You have to add at least one tag.";
const DUPLICATE_INGREDIENT: &str = "Ingredients must not repeat.";

/// One `{id, amount}` entry of a recipe's ingredient list.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngredientAmountInput {
    pub id: String,

    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub amount: i32,
}

/// Input for creating a recipe.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipeInput {
    #[validate(nested)]
    #[serde(default)]
    pub ingredients: Vec<IngredientAmountInput>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub image: String,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: String,

    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub cooking_time: i32,
}

/// Input for a partial recipe update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRecipeInput {
    #[validate(nested)]
    pub ingredients: Option<Vec<IngredientAmountInput>>,

    pub tags: Option<Vec<String>>,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub image: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,

    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub cooking_time: Option<i32>,
}

/// Recipe service for business logic.
#[derive(Clone)]
pub struct RecipeService {
    recipe_repo: RecipeRepository,
    tag_repo: TagRepository,
    ingredient_repo: IngredientRepository,
    id_gen: IdGenerator,
}

impl RecipeService {
    /// Create a new recipe service.
    #[must_use]
    pub const fn new(
        recipe_repo: RecipeRepository,
        tag_repo: TagRepository,
        ingredient_repo: IngredientRepository,
    ) -> Self {
        Self {
            recipe_repo,
            tag_repo,
            ingredient_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a recipe by ID.
    pub async fn get(&self, id: &str) -> AppResult<recipe::Model> {
        self.recipe_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recipe {id}")))
    }

    /// One page of recipes matching `filter`, newest first, plus the total count.
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<recipe::Model>, u64)> {
        self.recipe_repo.list(filter, offset, limit).await
    }

    /// Create a recipe authored by `author`.
    pub async fn create(
        &self,
        author: &user::Model,
        input: CreateRecipeInput,
    ) -> AppResult<recipe::Model> {
        let mut fields = collect_field_errors(input.validate());
        check_ingredients(&input.ingredients, &mut fields);
        check_tags(&input.tags, &mut fields);
        if !fields.is_empty() {
            return Err(AppError::Validation(fields));
        }

        let tag_ids = dedup(input.tags);
        self.ensure_tags_exist(&tag_ids).await?;
        self.ensure_ingredients_exist(&input.ingredients).await?;

        let recipe_id = self.id_gen.generate();
        let model = recipe::ActiveModel {
            id: Set(recipe_id.clone()),
            author_id: Set(author.id.clone()),
            name: Set(input.name),
            text: Set(input.text),
            cooking_time: Set(input.cooking_time),
            image: Set(input.image),
            created_at: Set(Utc::now().into()),
        };

        let recipe = self
            .recipe_repo
            .create_with_relations(
                model,
                self.tag_rows(&recipe_id, &tag_ids),
                self.ingredient_rows(&recipe_id, &input.ingredients),
            )
            .await?;

        tracing::info!(recipe_id = %recipe.id, author_id = %author.id, "Recipe created");
        Ok(recipe)
    }

    /// Apply a partial update on behalf of `viewer`.
    pub async fn update(
        &self,
        viewer: Option<&user::Model>,
        id: &str,
        input: UpdateRecipeInput,
    ) -> AppResult<recipe::Model> {
        if viewer.is_none() {
            return Err(AppError::Unauthorized);
        }
        let recipe = self.get(id).await?;
        can_mutate_recipe(viewer, &recipe)?;

        let mut fields = collect_field_errors(input.validate());
        if let Some(ingredients) = &input.ingredients {
            check_ingredients(ingredients, &mut fields);
        }
        if let Some(tags) = &input.tags {
            check_tags(tags, &mut fields);
        }
        if !fields.is_empty() {
            return Err(AppError::Validation(fields));
        }

        let tag_ids = input.tags.map(dedup);
        if let Some(tag_ids) = &tag_ids {
            self.ensure_tags_exist(tag_ids).await?;
        }
        if let Some(ingredients) = &input.ingredients {
            self.ensure_ingredients_exist(ingredients).await?;
        }

        let recipe_id = recipe.id.clone();
        let mut active: recipe::ActiveModel = recipe.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(text) = input.text {
            active.text = Set(text);
        }
        if let Some(cooking_time) = input.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        if let Some(image) = input.image {
            active.image = Set(image);
        }

        let recipe = self
            .recipe_repo
            .update_with_relations(
                active,
                tag_ids.map(|ids| self.tag_rows(&recipe_id, &ids)),
                input
                    .ingredients
                    .map(|items| self.ingredient_rows(&recipe_id, &items)),
            )
            .await?;

        tracing::info!(recipe_id = %recipe.id, "Recipe updated");
        Ok(recipe)
    }

    /// Delete a recipe on behalf of `viewer`.
    pub async fn delete(&self, viewer: Option<&user::Model>, id: &str) -> AppResult<()> {
        if viewer.is_none() {
            return Err(AppError::Unauthorized);
        }
        let recipe = self.get(id).await?;
        can_mutate_recipe(viewer, &recipe)?;

        if !self.recipe_repo.delete(&recipe.id).await? {
            return Err(AppError::NotFound(format!("Recipe {id}")));
        }

        tracing::info!(recipe_id = %id, "Recipe deleted");
        Ok(())
    }

    async fn ensure_tags_exist(&self, tag_ids: &[String]) -> AppResult<()> {
        let found = self.tag_repo.find_by_ids(tag_ids).await?;
        if let Some(missing) = first_missing(tag_ids, found.iter().map(|t| t.id.as_str())) {
            return Err(AppError::NotFound(format!("Tag {missing}")));
        }
        Ok(())
    }

    async fn ensure_ingredients_exist(&self, items: &[IngredientAmountInput]) -> AppResult<()> {
        let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        let found = self.ingredient_repo.find_by_ids(&ids).await?;
        if let Some(missing) = first_missing(&ids, found.iter().map(|i| i.id.as_str())) {
            return Err(AppError::NotFound(format!("Ingredient {missing}")));
        }
        Ok(())
    }

    fn tag_rows(&self, recipe_id: &str, tag_ids: &[String]) -> Vec<recipe_tag::ActiveModel> {
        tag_ids
            .iter()
            .map(|tag_id| recipe_tag::ActiveModel {
                id: Set(self.id_gen.generate()),
                recipe_id: Set(recipe_id.to_string()),
                tag_id: Set(tag_id.clone()),
            })
            .collect()
    }

    fn ingredient_rows(
        &self,
        recipe_id: &str,
        items: &[IngredientAmountInput],
    ) -> Vec<recipe_ingredient::ActiveModel> {
        items
            .iter()
            .map(|item| recipe_ingredient::ActiveModel {
                id: Set(self.id_gen.generate()),
                recipe_id: Set(recipe_id.to_string()),
                ingredient_id: Set(item.id.clone()),
                amount: Set(item.amount),
            })
            .collect()
    }
}

fn collect_field_errors(result: Result<(), ValidationErrors>) -> FieldErrors {
    match result.map_err(AppError::from) {
        Err(AppError::Validation(fields)) => fields,
        _ => FieldErrors::new(),
    }
}

fn check_ingredients(items: &[IngredientAmountInput], fields: &mut FieldErrors) {
    if items.is_empty() {
        fields
            .entry("ingredients".to_string())
            .or_default()
            .push(NO_INGREDIENTS.to_string());
        return;
    }

    let mut seen = HashSet::new();
    if !items.iter().all(|item| seen.insert(item.id.as_str())) {
        fields
            .entry("ingredients".to_string())
            .or_default()
            .push(DUPLICATE_INGREDIENT.to_string());
    }
}

fn check_tags(tags: &[String], fields: &mut FieldErrors) {
    if tags.is_empty() {
        fields
            .entry("tags".to_string())
            .or_default()
            .push(NO_TAGS.to_string());
    }
}

/// Drop repeated ids, keeping first occurrences in order.
fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn first_missing<'a>(
    wanted: &'a [String],
    found: impl Iterator<Item = &'a str>,
) -> Option<&'a str> {
    let found: HashSet<&str> = found.collect();
    wanted
        .iter()
        .map(String::as_str)
        .find(|id| !found.contains(id))
}
