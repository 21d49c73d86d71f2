//! Create shopping cart table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RecipeInShoppingCart::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RecipeInShoppingCart::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(RecipeInShoppingCart::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(RecipeInShoppingCart::RecipeId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(RecipeInShoppingCart::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_in_shopping_cart_user")
                            .from(RecipeInShoppingCart::Table, RecipeInShoppingCart::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_in_shopping_cart_recipe")
                            .from(RecipeInShoppingCart::Table, RecipeInShoppingCart::RecipeId)
                            .to(Recipe::Table, Recipe::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, recipe_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_recipe_in_shopping_cart_user_recipe")
                    .table(RecipeInShoppingCart::Table)
                    .col(RecipeInShoppingCart::UserId)
                    .col(RecipeInShoppingCart::RecipeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recipe_in_shopping_cart_recipe_id")
                    .table(RecipeInShoppingCart::Table)
                    .col(RecipeInShoppingCart::RecipeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecipeInShoppingCart::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RecipeInShoppingCart {
    Table,
    Id,
    UserId,
    RecipeId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Recipe {
    Table,
    Id,
}
