//! Shopping list: sums the ingredients of every recipe in a user's cart.

use std::collections::HashMap;

use foodgram_common::AppResult;
use foodgram_db::repositories::{IngredientLine, RecipeRepository, ShoppingCartRepository};

/// File name offered to the client.
pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

const TRAILER: &str = "______________________________\nПродуктовый помощник Foodgram";

/// One aggregated shopping list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Sum amounts keyed by `(name, unit)`, keeping first-seen order.
///
/// Two ingredients sharing a name but measured in different units stay on
/// separate lines.
pub fn aggregate<'a>(lines: impl IntoIterator<Item = &'a IngredientLine>) -> Vec<ShoppingListLine> {
    let mut out: Vec<ShoppingListLine> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for line in lines {
        let key = (
            line.ingredient.name.clone(),
            line.ingredient.measurement_unit.clone(),
        );
        if let Some(&pos) = index.get(&key) {
            out[pos].amount += i64::from(line.amount);
        } else {
            index.insert(key, out.len());
            out.push(ShoppingListLine {
                name: line.ingredient.name.clone(),
                measurement_unit: line.ingredient.measurement_unit.clone(),
                amount: i64::from(line.amount),
            });
        }
    }

    out
}

/// Render the plain-text file body.
#[must_use]
pub fn render(lines: &[ShoppingListLine]) -> String {
    let mut body = String::new();
    for line in lines {
        body.push_str(&format!(
            "{} ({}) — {}\n",
            line.name, line.measurement_unit, line.amount
        ));
    }
    body.push_str(TRAILER);
    body
}

/// Builds a user's shopping list.
#[derive(Clone)]
pub struct ShoppingListService {
    cart_repo: ShoppingCartRepository,
    recipe_repo: RecipeRepository,
}

impl ShoppingListService {
    /// Create a new shopping list service.
    #[must_use]
    pub const fn new(cart_repo: ShoppingCartRepository, recipe_repo: RecipeRepository) -> Self {
        Self {
            cart_repo,
            recipe_repo,
        }
    }

    /// Aggregated lines for the user's cart: recipes in the order they were
    /// added, each recipe's ingredients in the order they were stored.
    pub async fn lines_for(&self, user_id: &str) -> AppResult<Vec<ShoppingListLine>> {
        let recipe_ids = self.cart_repo.targets_for_owner(user_id).await?;
        let lines = self
            .recipe_repo
            .ingredient_lines_for_recipes(&recipe_ids)
            .await?;

        let mut by_recipe: HashMap<&str, Vec<&IngredientLine>> = HashMap::new();
        for line in &lines {
            by_recipe.entry(line.recipe_id.as_str()).or_default().push(line);
        }

        let ordered = recipe_ids
            .iter()
            .filter_map(|id| by_recipe.get(id.as_str()))
            .flatten()
            .copied();

        Ok(aggregate(ordered))
    }

    /// Text file body for the user's cart.
    pub async fn render_for(&self, user_id: &str) -> AppResult<String> {
        let lines = self.lines_for(user_id).await?;
        tracing::debug!(user_id, lines = lines.len(), "Rendering shopping list");
        Ok(render(&lines))
    }
}
