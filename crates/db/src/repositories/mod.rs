//! Repository layer.

mod ingredient;
mod recipe;
mod relation;
mod tag;
mod user;

pub use ingredient::IngredientRepository;
pub use recipe::{IngredientLine, RecipeFilter, RecipeRepository};
pub use relation::{
    FavoriteRepository, PairRelation, PairRepository, ShoppingCartRepository,
    SubscriptionRepository,
};
pub use tag::TagRepository;
pub use user::UserRepository;
