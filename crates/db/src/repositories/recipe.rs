//! Recipe repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::db_err;
use crate::entities::{
    FavoriteRecipe, Ingredient, Recipe, RecipeIngredient, RecipeTag, ShoppingCart, Tag,
    favorite_recipe, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag,
};
use foodgram_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, Query},
};

/// Filters for the recipe list.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Only recipes written by this user.
    pub author_id: Option<String>,
    /// Recipes having any of these tag slugs.
    pub tag_slugs: Vec<String>,
    /// Only recipes this user has favorited.
    pub favorited_by: Option<String>,
    /// Only recipes in this user's shopping cart.
    pub in_cart_of: Option<String>,
}

/// An ingredient association joined with the ingredient itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub recipe_id: String,
    pub ingredient: ingredient::Model,
    pub amount: i32,
}

/// Recipe repository for database operations.
#[derive(Clone)]
pub struct RecipeRepository {
    db: Arc<DatabaseConnection>,
}

impl RecipeRepository {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a recipe by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<recipe::Model>> {
        Recipe::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find recipes by IDs. Order is unspecified.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<recipe::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Recipe::find()
            .filter(recipe::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Insert a recipe together with its tag and ingredient rows in one
    /// transaction.
    pub async fn create_with_relations(
        &self,
        model: recipe::ActiveModel,
        tags: Vec<recipe_tag::ActiveModel>,
        ingredients: Vec<recipe_ingredient::ActiveModel>,
    ) -> AppResult<recipe::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let recipe = model.insert(&txn).await.map_err(db_err)?;
        insert_tags(&txn, tags).await?;
        insert_ingredients(&txn, ingredients).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(recipe)
    }

    /// Apply a partial update in one transaction. `Some` relation lists
    /// replace the stored set entirely; `None` leaves it untouched.
    pub async fn update_with_relations(
        &self,
        model: recipe::ActiveModel,
        tags: Option<Vec<recipe_tag::ActiveModel>>,
        ingredients: Option<Vec<recipe_ingredient::ActiveModel>>,
    ) -> AppResult<recipe::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let recipe = model.update(&txn).await.map_err(db_err)?;

        if let Some(tags) = tags {
            RecipeTag::delete_many()
                .filter(recipe_tag::Column::RecipeId.eq(recipe.id.as_str()))
                .exec(&txn)
                .await
                .map_err(db_err)?;
            insert_tags(&txn, tags).await?;
        }

        if let Some(ingredients) = ingredients {
            RecipeIngredient::delete_many()
                .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id.as_str()))
                .exec(&txn)
                .await
                .map_err(db_err)?;
            insert_ingredients(&txn, ingredients).await?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(recipe)
    }

    /// Delete a recipe and every row referencing it. Returns `false` if the
    /// recipe did not exist.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        RecipeIngredient::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        RecipeTag::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        FavoriteRecipe::delete_many()
            .filter(favorite_recipe::Column::RecipeId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        ShoppingCart::delete_many()
            .filter(shopping_cart::Column::RecipeId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let result = Recipe::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// List recipes newest first, returning one page and the total count.
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<recipe::Model>, u64)> {
        let query = Recipe::find().filter(filter_condition(filter));

        let count = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(db_err)?;

        let recipes = query
            .order_by_desc(recipe::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok((recipes, count))
    }

    /// Newest recipes of an author, optionally limited.
    pub async fn find_by_author(
        &self,
        author_id: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<recipe::Model>> {
        let mut query = Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .order_by_desc(recipe::Column::Id);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query.all(self.db.as_ref()).await.map_err(db_err)
    }

    /// Number of recipes per author. Authors without recipes are absent.
    pub async fn count_by_authors(&self, author_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = Recipe::find()
            .select_only()
            .column(recipe::Column::AuthorId)
            .column_as(Expr::col(recipe::Column::Id).count(), "recipes_count")
            .filter(recipe::Column::AuthorId.is_in(author_ids.to_vec()))
            .group_by(recipe::Column::AuthorId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(author_id, count)| (author_id, u64::try_from(count).unwrap_or_default()))
            .collect())
    }

    /// Tags of the given recipes as `(recipe_id, tag)` pairs.
    pub async fn tags_for_recipes(
        &self,
        recipe_ids: &[String],
    ) -> AppResult<Vec<(String, tag::Model)>> {
        if recipe_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = RecipeTag::find()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .find_also_related(Tag)
            .order_by_asc(recipe_tag::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, tag)| tag.map(|t| (link.recipe_id, t)))
            .collect())
    }

    /// Ingredient lines of the given recipes in insertion order.
    pub async fn ingredient_lines_for_recipes(
        &self,
        recipe_ids: &[String],
    ) -> AppResult<Vec<IngredientLine>> {
        if recipe_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = RecipeIngredient::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .find_also_related(Ingredient)
            .order_by_asc(recipe_ingredient::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, ingredient)| {
                ingredient.map(|ingredient| IngredientLine {
                    recipe_id: link.recipe_id,
                    ingredient,
                    amount: link.amount,
                })
            })
            .collect())
    }
}

async fn insert_tags(
    txn: &DatabaseTransaction,
    tags: Vec<recipe_tag::ActiveModel>,
) -> AppResult<()> {
    if tags.is_empty() {
        return Ok(());
    }
    RecipeTag::insert_many(tags)
        .exec_without_returning(txn)
        .await
        .map_err(db_err)?;
    Ok(())
}

async fn insert_ingredients(
    txn: &DatabaseTransaction,
    ingredients: Vec<recipe_ingredient::ActiveModel>,
) -> AppResult<()> {
    if ingredients.is_empty() {
        return Ok(());
    }
    RecipeIngredient::insert_many(ingredients)
        .exec_without_returning(txn)
        .await
        .map_err(db_err)?;
    Ok(())
}

fn filter_condition(filter: &RecipeFilter) -> Condition {
    let mut cond = Condition::all();

    if let Some(author_id) = &filter.author_id {
        cond = cond.add(recipe::Column::AuthorId.eq(author_id.as_str()));
    }

    if !filter.tag_slugs.is_empty() {
        cond = cond.add(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column((RecipeTag, recipe_tag::Column::RecipeId))
                    .from(RecipeTag)
                    .inner_join(
                        Tag,
                        Expr::col((Tag, tag::Column::Id))
                            .equals((RecipeTag, recipe_tag::Column::TagId)),
                    )
                    .and_where(Expr::col((Tag, tag::Column::Slug)).is_in(filter.tag_slugs.clone()))
                    .to_owned(),
            ),
        );
    }

    if let Some(user_id) = &filter.favorited_by {
        cond = cond.add(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(favorite_recipe::Column::RecipeId)
                    .from(FavoriteRecipe)
                    .and_where(favorite_recipe::Column::UserId.eq(user_id.as_str()))
                    .to_owned(),
            ),
        );
    }

    if let Some(user_id) = &filter.in_cart_of {
        cond = cond.add(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(ShoppingCart)
                    .and_where(shopping_cart::Column::UserId.eq(user_id.as_str()))
                    .to_owned(),
            ),
        );
    }

    cond
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_recipe(id: &str, author_id: &str) -> recipe::Model {
        recipe::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            name: "Pancakes".to_string(),
            text: "Mix and fry".to_string(),
            cooking_time: 20,
            image: "data:image/png;base64,AAAA".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let recipe = create_test_recipe("recipe1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[recipe.clone()]])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let result = repo.find_by_id("recipe1").await.unwrap();

        assert_eq!(result.unwrap().author_id, "user1");
    }

    #[tokio::test]
    async fn test_create_with_relations_runs_in_one_transaction() {
        let recipe = create_test_recipe("recipe1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[recipe.clone()]])
                .append_exec_results([exec_result(1), exec_result(2)])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db.clone());
        let tags = vec![recipe_tag::ActiveModel {
            id: Set("rt1".into()),
            recipe_id: Set("recipe1".into()),
            tag_id: Set("tag1".into()),
        }];
        let ingredients = vec![
            recipe_ingredient::ActiveModel {
                id: Set("ri1".into()),
                recipe_id: Set("recipe1".into()),
                ingredient_id: Set("ing1".into()),
                amount: Set(5),
            },
            recipe_ingredient::ActiveModel {
                id: Set("ri2".into()),
                recipe_id: Set("recipe1".into()),
                ingredient_id: Set("ing2".into()),
                amount: Set(10),
            },
        ];

        let created = repo
            .create_with_relations(recipe.clone().into(), tags, ingredients)
            .await
            .unwrap();
        assert_eq!(created.id, "recipe1");
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1, "all statements belong to one transaction");
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("BEGIN"));
        assert!(sql.contains("recipe_tag"));
        assert!(sql.contains("recipe_ingredient"));
        assert!(sql.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_update_replaces_ingredient_set_in_one_transaction() {
        let recipe = create_test_recipe("recipe1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[recipe.clone()]])
                .append_exec_results([exec_result(3), exec_result(1)])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db.clone());
        let mut active: recipe::ActiveModel = recipe.into();
        active.name = Set("Green borscht".into());
        let ingredients = vec![recipe_ingredient::ActiveModel {
            id: Set("ri9".into()),
            recipe_id: Set("recipe1".into()),
            ingredient_id: Set("sorrel".into()),
            amount: Set(150),
        }];

        repo.update_with_relations(active, None, Some(ingredients))
            .await
            .unwrap();
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1, "update runs in one transaction");
        let sql = format!("{:?}", log[0]);
        let delete = sql.find(r#"DELETE FROM \"recipe_ingredient\""#).unwrap();
        let insert = sql.find(r#"INSERT INTO \"recipe_ingredient\""#).unwrap();
        assert!(delete < insert, "old rows go before the new set is written");
        assert!(!sql.contains(r#"\"recipe_tag\""#), "tags untouched when absent");
        assert!(sql.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_delete_removes_join_rows_first() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    exec_result(2),
                    exec_result(1),
                    exec_result(1),
                    exec_result(1),
                    exec_result(1),
                ])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db.clone());
        assert!(repo.delete("recipe1").await.unwrap());
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = format!("{:?}", log[0]);
        for table in [
            "recipe_ingredient",
            "recipe_tag",
            "favorite_recipe",
            "recipe_in_shopping_cart",
        ] {
            assert!(sql.contains(table), "missing delete for {table}");
        }
    }

    #[tokio::test]
    async fn test_delete_missing_recipe() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    exec_result(0),
                    exec_result(0),
                    exec_result(0),
                    exec_result(0),
                    exec_result(0),
                ])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        assert!(!repo.delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_ingredient_lines_skip_query_for_no_recipes() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = RecipeRepository::new(db);
        assert!(repo.ingredient_lines_for_recipes(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_author_with_limit() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_recipe("recipe2", "user1"),
                    create_test_recipe("recipe1", "user1"),
                ]])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db.clone());
        let recipes = repo.find_by_author("user1", Some(2)).await.unwrap();
        assert_eq!(recipes.len(), 2);
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("LIMIT"));
    }

    #[test]
    fn test_filter_condition_builds_subqueries() {
        use sea_orm::QueryTrait;

        let filter = RecipeFilter {
            author_id: Some("user1".into()),
            tag_slugs: vec!["breakfast".into(), "lunch".into()],
            favorited_by: Some("user2".into()),
            in_cart_of: None,
        };

        let sql = Recipe::find()
            .filter(filter_condition(&filter))
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains("\"author_id\" = 'user1'"));
        assert!(sql.contains("\"slug\" IN ('breakfast', 'lunch')"));
        assert!(sql.contains("FROM \"favorite_recipe\""));
        assert!(!sql.contains("recipe_in_shopping_cart"));
    }
}
