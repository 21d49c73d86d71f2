//! Recipe ownership policy.

use foodgram_common::{AppError, AppResult};
use foodgram_db::entities::{recipe, user};

/// Check whether `viewer` may update or delete `recipe`.
///
/// Anonymous requests are rejected with 401, anyone other than the author
/// or an administrator with 403.
pub fn can_mutate_recipe(viewer: Option<&user::Model>, recipe: &recipe::Model) -> AppResult<()> {
    let Some(viewer) = viewer else {
        return Err(AppError::Unauthorized);
    };

    if viewer.is_admin || viewer.id == recipe.author_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ))
    }
}
