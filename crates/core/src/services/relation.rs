//! Add/remove toggles for favorites, the shopping cart and subscriptions.

use foodgram_common::{AppError, AppResult, IdGenerator};
use foodgram_db::entities::{favorite_recipe, shopping_cart, subscription};
use foodgram_db::repositories::{PairRelation, PairRepository};
use sea_orm::{EntityName, IntoActiveModel};

/// A pair table exposed through add/remove endpoints.
pub trait ToggleRelation: PairRelation {
    /// Error message when adding an existing pair.
    const ALREADY_EXISTS: &'static str;

    /// Error message when removing a missing pair.
    const NOT_FOUND: &'static str;

    /// Extra precondition checked before adding.
    fn check_add(_owner_id: &str, _target_id: &str) -> AppResult<()> {
        Ok(())
    }
}

impl ToggleRelation for favorite_recipe::Entity {
    const ALREADY_EXISTS: &'static str = "This recipe is already your favorite one";
    const NOT_FOUND: &'static str = "This recipe is not in your favorite list";
}

impl ToggleRelation for shopping_cart::Entity {
    const ALREADY_EXISTS: &'static str = "This recipe is already in your shopping cart";
    const NOT_FOUND: &'static str = "This recipe is not in your shopping cart";
}

impl ToggleRelation for subscription::Entity {
    const ALREADY_EXISTS: &'static str = "You've already subscribed to this user";
    const NOT_FOUND: &'static str = "Subscription doesn't exist";

    fn check_add(owner_id: &str, target_id: &str) -> AppResult<()> {
        if owner_id == target_id {
            return Err(AppError::BadRequest(
                "You can't subscribe to yourself".to_string(),
            ));
        }
        Ok(())
    }
}

/// Favorites toggle.
pub type FavoriteService = RelationService<favorite_recipe::Entity>;

/// Shopping cart toggle.
pub type ShoppingCartService = RelationService<shopping_cart::Entity>;

/// Subscription toggle.
pub type SubscriptionService = RelationService<subscription::Entity>;

/// Add/remove logic shared by every [`ToggleRelation`].
///
/// Callers resolve the target first so a missing recipe or author is a 404
/// before any relation check runs.
pub struct RelationService<E> {
    repo: PairRepository<E>,
    id_gen: IdGenerator,
}

impl<E> Clone for RelationService<E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            id_gen: self.id_gen.clone(),
        }
    }
}

impl<E> RelationService<E>
where
    E: ToggleRelation,
    E::Model: IntoActiveModel<E::Row> + Sync,
{
    /// Create a new relation service.
    #[must_use]
    pub const fn new(repo: PairRepository<E>) -> Self {
        Self {
            repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add the pair `(owner, target)`.
    pub async fn add(&self, owner_id: &str, target_id: &str) -> AppResult<()> {
        E::check_add(owner_id, target_id)?;

        if self.repo.exists(owner_id, target_id).await? {
            return Err(AppError::BadRequest(E::ALREADY_EXISTS.to_string()));
        }

        // A concurrent add can still win the race; the unique index decides.
        if !self
            .repo
            .insert(self.id_gen.generate(), owner_id, target_id)
            .await?
        {
            return Err(AppError::BadRequest(E::ALREADY_EXISTS.to_string()));
        }

        tracing::debug!(owner_id, target_id, table = E::default().table_name(), "Relation added");
        Ok(())
    }

    /// Remove the pair `(owner, target)`.
    pub async fn remove(&self, owner_id: &str, target_id: &str) -> AppResult<()> {
        if !self.repo.remove(owner_id, target_id).await? {
            return Err(AppError::BadRequest(E::NOT_FOUND.to_string()));
        }

        tracing::debug!(owner_id, target_id, table = E::default().table_name(), "Relation removed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use foodgram_db::repositories::{
        FavoriteRepository, ShoppingCartRepository, SubscriptionRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn favorite(user_id: &str, recipe_id: &str) -> favorite_recipe::Model {
        favorite_recipe::Model {
            id: "fav1".to_string(),
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_favorite_twice_is_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<favorite_recipe::Model>::new()])
                .append_exec_results([exec_result(1)])
                .append_query_results([[favorite("user1", "recipe1")]])
                .into_connection(),
        );
        let service = FavoriteService::new(FavoriteRepository::new(db));

        service.add("user1", "recipe1").await.unwrap();
        let err = service.add("user1", "recipe1").await.unwrap_err();

        match err {
            AppError::BadRequest(msg) => {
                assert_eq!(msg, "This recipe is already your favorite one");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remove_missing_favorite() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(0)])
                .into_connection(),
        );
        let service = FavoriteService::new(FavoriteRepository::new(db));

        let err = service.remove("user1", "recipe1").await.unwrap_err();
        match err {
            AppError::BadRequest(msg) => {
                assert_eq!(msg, "This recipe is not in your favorite list");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remove_from_cart() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(1)])
                .into_connection(),
        );
        let service = ShoppingCartService::new(ShoppingCartRepository::new(db));

        service.remove("user1", "recipe1").await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_to_self_touches_nothing() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = SubscriptionService::new(SubscriptionRepository::new(db));

        let err = service.add("user1", "user1").await.unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "You can't subscribe to yourself"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
