//! Read models: API representations with per-viewer flags.
//!
//! The viewer is always passed explicitly. Anonymous viewers get `false`
//! for every flag and cause no relation lookups.

use std::collections::{HashMap, HashSet};

use foodgram_common::{AppError, AppResult};
use foodgram_db::{
    entities::{recipe, tag, user},
    repositories::{
        FavoriteRepository, IngredientLine, RecipeRepository, ShoppingCartRepository,
        SubscriptionRepository, UserRepository,
    },
};
use serde::Serialize;

/// Public user representation.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// Registration response body.
#[derive(Debug, Clone, Serialize)]
pub struct SignupView {
    pub email: String,
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for SignupView {
    fn from(user: user::Model) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Ingredient with the amount used by a recipe.
#[derive(Debug, Clone, Serialize)]
pub struct IngredientAmountView {
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<IngredientLine> for IngredientAmountView {
    fn from(line: IngredientLine) -> Self {
        Self {
            id: line.ingredient.id,
            name: line.ingredient.name,
            measurement_unit: line.ingredient.measurement_unit,
            amount: line.amount,
        }
    }
}

/// Full recipe representation.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: String,
    pub tags: Vec<tag::Model>,
    pub author: UserView,
    pub ingredients: Vec<IngredientAmountView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact recipe representation used in toggles and subscriptions.
#[derive(Debug, Clone, Serialize)]
pub struct ShortRecipeView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<recipe::Model> for ShortRecipeView {
    fn from(recipe: recipe::Model) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Followed author with a preview of their recipes.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<ShortRecipeView>,
    pub recipes_count: u64,
}

/// Builds read models.
#[derive(Clone)]
pub struct ViewService {
    user_repo: UserRepository,
    recipe_repo: RecipeRepository,
    favorite_repo: FavoriteRepository,
    cart_repo: ShoppingCartRepository,
    subscription_repo: SubscriptionRepository,
}

impl ViewService {
    /// Create a new view service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        recipe_repo: RecipeRepository,
        favorite_repo: FavoriteRepository,
        cart_repo: ShoppingCartRepository,
        subscription_repo: SubscriptionRepository,
    ) -> Self {
        Self {
            user_repo,
            recipe_repo,
            favorite_repo,
            cart_repo,
            subscription_repo,
        }
    }

    /// Represent a single user.
    pub async fn user(&self, viewer: Option<&str>, user: user::Model) -> AppResult<UserView> {
        let mut views = self.users(viewer, vec![user]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("user view missing".to_string()))
    }

    /// Represent users, preserving input order.
    pub async fn users(
        &self,
        viewer: Option<&str>,
        users: Vec<user::Model>,
    ) -> AppResult<Vec<UserView>> {
        let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
        let subscribed = match viewer {
            Some(viewer_id) => self.subscription_repo.targets_among(viewer_id, &ids).await?,
            None => HashSet::new(),
        };

        Ok(users
            .into_iter()
            .map(|user| {
                let is_subscribed = subscribed.contains(&user.id);
                UserView {
                    email: user.email,
                    id: user.id,
                    username: user.username,
                    first_name: user.first_name,
                    last_name: user.last_name,
                    is_subscribed,
                }
            })
            .collect())
    }

    /// Represent a single recipe.
    pub async fn recipe(&self, viewer: Option<&str>, recipe: recipe::Model) -> AppResult<RecipeView> {
        let mut views = self.recipes(viewer, vec![recipe]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("recipe view missing".to_string()))
    }

    /// Represent recipes, preserving input order. Related rows and flags are
    /// loaded with one query per relation for the whole batch.
    pub async fn recipes(
        &self,
        viewer: Option<&str>,
        recipes: Vec<recipe::Model>,
    ) -> AppResult<Vec<RecipeView>> {
        if recipes.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = recipes.iter().map(|r| r.id.clone()).collect();

        let mut tags: HashMap<String, Vec<tag::Model>> = HashMap::new();
        for (recipe_id, tag) in self.recipe_repo.tags_for_recipes(&ids).await? {
            tags.entry(recipe_id).or_default().push(tag);
        }

        let mut ingredients: HashMap<String, Vec<IngredientAmountView>> = HashMap::new();
        for line in self.recipe_repo.ingredient_lines_for_recipes(&ids).await? {
            ingredients
                .entry(line.recipe_id.clone())
                .or_default()
                .push(line.into());
        }

        let mut author_ids: Vec<String> = recipes.iter().map(|r| r.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors = self.user_repo.find_by_ids(&author_ids).await?;
        let authors: HashMap<String, UserView> = self
            .users(viewer, authors)
            .await?
            .into_iter()
            .map(|view| (view.id.clone(), view))
            .collect();

        let (favorited, in_cart) = match viewer {
            Some(viewer_id) => (
                self.favorite_repo.targets_among(viewer_id, &ids).await?,
                self.cart_repo.targets_among(viewer_id, &ids).await?,
            ),
            None => (HashSet::new(), HashSet::new()),
        };

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    AppError::Internal(format!("author {} of recipe {} missing", recipe.author_id, recipe.id))
                })?;
                Ok(RecipeView {
                    tags: tags.remove(&recipe.id).unwrap_or_default(),
                    ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    author,
                    id: recipe.id,
                    name: recipe.name,
                    image: recipe.image,
                    text: recipe.text,
                    cooking_time: recipe.cooking_time,
                })
            })
            .collect()
    }

    /// Represent followed authors with up to `recipes_limit` newest recipes each.
    pub async fn subscriptions(
        &self,
        viewer: Option<&str>,
        authors: Vec<user::Model>,
        recipes_limit: Option<u64>,
    ) -> AppResult<Vec<SubscriptionView>> {
        let ids: Vec<String> = authors.iter().map(|u| u.id.clone()).collect();
        let counts = self.recipe_repo.count_by_authors(&ids).await?;

        let mut views = Vec::with_capacity(authors.len());
        for user in self.users(viewer, authors).await? {
            let recipes = self
                .recipe_repo
                .find_by_author(&user.id, recipes_limit)
                .await?
                .into_iter()
                .map(ShortRecipeView::from)
                .collect();
            views.push(SubscriptionView {
                recipes_count: counts.get(&user.id).copied().unwrap_or(0),
                recipes,
                user,
            });
        }

        Ok(views)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use foodgram_db::entities::{favorite_recipe, ingredient, recipe_ingredient, recipe_tag};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn views(db: &Arc<DatabaseConnection>) -> ViewService {
        ViewService::new(
            UserRepository::new(Arc::clone(db)),
            RecipeRepository::new(Arc::clone(db)),
            FavoriteRepository::new(Arc::clone(db)),
            ShoppingCartRepository::new(Arc::clone(db)),
            SubscriptionRepository::new(Arc::clone(db)),
        )
    }

    fn user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            password: String::new(),
            token: None,
            is_admin: false,
            created_at: Utc::now().into(),
        }
    }

    fn recipe(id: &str, author_id: &str) -> recipe::Model {
        recipe::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            name: "Pancakes".to_string(),
            text: "Mix and fry".to_string(),
            cooking_time: 15,
            image: "data:image/png;base64,AAAA".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn tag_row(recipe_id: &str) -> (recipe_tag::Model, tag::Model) {
        (
            recipe_tag::Model {
                id: "rt1".to_string(),
                recipe_id: recipe_id.to_string(),
                tag_id: "tag1".to_string(),
            },
            tag::Model {
                id: "tag1".to_string(),
                name: "Breakfast".to_string(),
                color: "#FFA500".to_string(),
                slug: "breakfast".to_string(),
            },
        )
    }

    fn ingredient_row(recipe_id: &str) -> (recipe_ingredient::Model, ingredient::Model) {
        (
            recipe_ingredient::Model {
                id: "ri1".to_string(),
                recipe_id: recipe_id.to_string(),
                ingredient_id: "ing1".to_string(),
                amount: 200,
            },
            ingredient::Model {
                id: "ing1".to_string(),
                name: "Milk".to_string(),
                measurement_unit: "ml".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_anonymous_flags_are_false_without_relation_queries() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tag_row("recipe1")]])
                .append_query_results([[ingredient_row("recipe1")]])
                .append_query_results([[user("author1")]])
                .into_connection(),
        );

        let view = views(&db)
            .recipe(None, recipe("recipe1", "author1"))
            .await
            .unwrap();

        assert!(!view.is_favorited);
        assert!(!view.is_in_shopping_cart);
        assert!(!view.author.is_subscribed);
        assert_eq!(view.tags[0].slug, "breakfast");
        assert_eq!(view.ingredients[0].amount, 200);

        let db = Arc::try_unwrap(db).unwrap();
        assert_eq!(db.into_transaction_log().len(), 3);
    }

    #[tokio::test]
    async fn test_viewer_flags() {
        let favorite = favorite_recipe::Model {
            id: "fav1".to_string(),
            user_id: "viewer".to_string(),
            recipe_id: "recipe1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tag_row("recipe1")]])
                .append_query_results([[ingredient_row("recipe1")]])
                .append_query_results([[user("author1")]])
                // subscriptions of the viewer among authors: none
                .append_query_results([Vec::<foodgram_db::entities::subscription::Model>::new()])
                .append_query_results([[favorite]])
                // cart: empty
                .append_query_results([Vec::<foodgram_db::entities::shopping_cart::Model>::new()])
                .into_connection(),
        );

        let view = views(&db)
            .recipe(Some("viewer"), recipe("recipe1", "author1"))
            .await
            .unwrap();

        assert!(view.is_favorited);
        assert!(!view.is_in_shopping_cart);
        assert!(!view.author.is_subscribed);
    }

    #[test]
    fn test_subscription_view_flattens_user() {
        let view = SubscriptionView {
            user: UserView {
                email: "a@example.com".to_string(),
                id: "author1".to_string(),
                username: "author".to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                is_subscribed: true,
            },
            recipes: vec![ShortRecipeView::from(recipe("recipe1", "author1"))],
            recipes_count: 4,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["username"], "author");
        assert_eq!(json["is_subscribed"], true);
        assert_eq!(json["recipes_count"], 4);
        assert_eq!(json["recipes"][0]["cooking_time"], 15);
        assert!(json["recipes"][0].get("text").is_none());
    }
}
