//! Business logic services.

#![allow(missing_docs)]

pub mod ingredient;
pub mod permission;
pub mod recipe;
pub mod relation;
pub mod shopping_list;
pub mod subscription;
pub mod tag;
pub mod user;
pub mod view;

pub use ingredient::IngredientService;
pub use permission::can_mutate_recipe;
pub use recipe::{CreateRecipeInput, IngredientAmountInput, RecipeService, UpdateRecipeInput};
pub use relation::{
    FavoriteService, RelationService, ShoppingCartService, SubscriptionService, ToggleRelation,
};
pub use shopping_list::{ShoppingListLine, ShoppingListService};
pub use subscription::SubscriptionListService;
pub use tag::TagService;
pub use user::{CreateUserInput, LoginInput, UserService};
pub use view::{
    IngredientAmountView, RecipeView, ShortRecipeView, SignupView, SubscriptionView, UserView,
    ViewService,
};
