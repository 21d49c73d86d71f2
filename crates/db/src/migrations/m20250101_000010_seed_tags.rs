//! Seed the initial meal tags.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (id, name, color, slug)
const INITIAL_TAGS: [(&str, &str, &str, &str); 3] = [
    ("01gkqs3x9e00000000breakfst", "Завтрак", "#FFA500", "breakfast"),
    ("01gkqs3x9e0000000000lunch0", "Обед", "#008000", "lunch"),
    ("01gkqs3x9e000000000dinner0", "Ужин", "#8B00FF", "dinner"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        let mut insert = Query::insert();
        insert
            .into_table(Tag::Table)
            .columns([Tag::Id, Tag::Name, Tag::Color, Tag::Slug]);
        for (id, name, color, slug) in INITIAL_TAGS {
            insert
                .values([id.into(), name.into(), color.into(), slug.into()])
                .map_err(|e| DbErr::Migration(e.to_string()))?;
        }
        insert.on_conflict(OnConflict::column(Tag::Slug).do_nothing().to_owned());

        db.execute(db.get_database_backend().build(&insert)).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        let delete = Query::delete()
            .from_table(Tag::Table)
            .and_where(Expr::col(Tag::Slug).is_in(INITIAL_TAGS.map(|(_, _, _, slug)| slug)))
            .to_owned();

        db.execute(db.get_database_backend().build(&delete)).await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
    Name,
    Color,
    Slug,
}
