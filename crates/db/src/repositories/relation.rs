//! Repository for user-owned pair tables (favorites, shopping cart, subscriptions).
//!
//! Each of these tables stores one row per `(owner, target)` pair guarded by a
//! unique index, so a single generic repository serves all three.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::db_err;
use crate::entities::{favorite_recipe, shopping_cart, subscription};
use chrono::Utc;
use foodgram_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

/// A join table keyed by `(owner, target)`.
pub trait PairRelation: EntityTrait {
    /// Insertable row type.
    type Row: ActiveModelTrait<Entity = Self> + Send;

    /// Primary key column; ULIDs so it also orders by insertion.
    fn id_column() -> Self::Column;

    /// Column holding the user that owns the pair.
    fn owner_column() -> Self::Column;

    /// Column holding the recipe or author the pair points at.
    fn target_column() -> Self::Column;

    /// Target id of a stored row.
    fn target_of(model: &Self::Model) -> &str;

    /// Build a new row.
    fn new_row(id: String, owner_id: &str, target_id: &str) -> Self::Row;
}

impl PairRelation for favorite_recipe::Entity {
    type Row = favorite_recipe::ActiveModel;

    fn id_column() -> Self::Column {
        favorite_recipe::Column::Id
    }

    fn owner_column() -> Self::Column {
        favorite_recipe::Column::UserId
    }

    fn target_column() -> Self::Column {
        favorite_recipe::Column::RecipeId
    }

    fn target_of(model: &Self::Model) -> &str {
        &model.recipe_id
    }

    fn new_row(id: String, owner_id: &str, target_id: &str) -> Self::Row {
        favorite_recipe::ActiveModel {
            id: Set(id),
            user_id: Set(owner_id.to_string()),
            recipe_id: Set(target_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }
}

impl PairRelation for shopping_cart::Entity {
    type Row = shopping_cart::ActiveModel;

    fn id_column() -> Self::Column {
        shopping_cart::Column::Id
    }

    fn owner_column() -> Self::Column {
        shopping_cart::Column::UserId
    }

    fn target_column() -> Self::Column {
        shopping_cart::Column::RecipeId
    }

    fn target_of(model: &Self::Model) -> &str {
        &model.recipe_id
    }

    fn new_row(id: String, owner_id: &str, target_id: &str) -> Self::Row {
        shopping_cart::ActiveModel {
            id: Set(id),
            user_id: Set(owner_id.to_string()),
            recipe_id: Set(target_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }
}

impl PairRelation for subscription::Entity {
    type Row = subscription::ActiveModel;

    fn id_column() -> Self::Column {
        subscription::Column::Id
    }

    fn owner_column() -> Self::Column {
        subscription::Column::UserId
    }

    fn target_column() -> Self::Column {
        subscription::Column::AuthorId
    }

    fn target_of(model: &Self::Model) -> &str {
        &model.author_id
    }

    fn new_row(id: String, owner_id: &str, target_id: &str) -> Self::Row {
        subscription::ActiveModel {
            id: Set(id),
            user_id: Set(owner_id.to_string()),
            author_id: Set(target_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }
}

/// Favorite recipes repository.
pub type FavoriteRepository = PairRepository<favorite_recipe::Entity>;

/// Shopping cart repository.
pub type ShoppingCartRepository = PairRepository<shopping_cart::Entity>;

/// Subscription repository.
pub type SubscriptionRepository = PairRepository<subscription::Entity>;

/// Generic repository over a [`PairRelation`] table.
pub struct PairRepository<E> {
    db: Arc<DatabaseConnection>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PairRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            _entity: PhantomData,
        }
    }
}

impl<E> PairRepository<E>
where
    E: PairRelation,
    E::Model: IntoActiveModel<E::Row> + Sync,
{
    /// Create a new pair repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    /// Check whether the pair exists.
    pub async fn exists(&self, owner_id: &str, target_id: &str) -> AppResult<bool> {
        let found = E::find()
            .filter(E::owner_column().eq(owner_id))
            .filter(E::target_column().eq(target_id))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    /// Insert the pair. Returns `false` when the unique index rejects it
    /// because the pair already exists.
    pub async fn insert(&self, id: String, owner_id: &str, target_id: &str) -> AppResult<bool> {
        let row = E::new_row(id, owner_id, target_id);

        match E::insert(row).exec_without_returning(self.db.as_ref()).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(owner_id, target_id, "Pair insert hit unique index");
                Ok(false)
            }
            Err(e) => Err(db_err(e)),
        }
    }

    /// Delete the pair. Returns `false` when no row was deleted.
    pub async fn remove(&self, owner_id: &str, target_id: &str) -> AppResult<bool> {
        let result = E::delete_many()
            .filter(E::owner_column().eq(owner_id))
            .filter(E::target_column().eq(target_id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Subset of `target_ids` the owner is paired with.
    pub async fn targets_among(
        &self,
        owner_id: &str,
        target_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if target_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = E::find()
            .filter(E::owner_column().eq(owner_id))
            .filter(E::target_column().is_in(target_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(rows.iter().map(|m| E::target_of(m).to_string()).collect())
    }

    /// All targets of an owner in insertion order.
    pub async fn targets_for_owner(&self, owner_id: &str) -> AppResult<Vec<String>> {
        let rows = E::find()
            .filter(E::owner_column().eq(owner_id))
            .order_by_asc(E::id_column())
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(rows.iter().map(|m| E::target_of(m).to_string()).collect())
    }

    /// One page of targets of an owner in insertion order.
    pub async fn page_targets_for_owner(
        &self,
        owner_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<String>> {
        let rows = E::find()
            .filter(E::owner_column().eq(owner_id))
            .order_by_asc(E::id_column())
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(rows.iter().map(|m| E::target_of(m).to_string()).collect())
    }

    /// Number of pairs owned by a user.
    pub async fn count_for_owner(&self, owner_id: &str) -> AppResult<u64> {
        E::find()
            .filter(E::owner_column().eq(owner_id))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }
}
