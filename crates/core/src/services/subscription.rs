//! Listing of the authors a user follows.

use std::collections::HashMap;

use foodgram_common::AppResult;
use foodgram_db::repositories::{SubscriptionRepository, UserRepository};

use super::view::{SubscriptionView, ViewService};

/// Subscription listing service.
#[derive(Clone)]
pub struct SubscriptionListService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    views: ViewService,
}

impl SubscriptionListService {
    /// Create a new subscription listing service.
    #[must_use]
    pub const fn new(
        subscription_repo: SubscriptionRepository,
        user_repo: UserRepository,
        views: ViewService,
    ) -> Self {
        Self {
            subscription_repo,
            user_repo,
            views,
        }
    }

    /// One page of followed authors in follow order, plus the total count.
    pub async fn list(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
        recipes_limit: Option<u64>,
    ) -> AppResult<(Vec<SubscriptionView>, u64)> {
        let count = self.subscription_repo.count_for_owner(user_id).await?;
        let author_ids = self
            .subscription_repo
            .page_targets_for_owner(user_id, offset, limit)
            .await?;

        let mut by_id: HashMap<String, _> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let authors = author_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        let views = self
            .views
            .subscriptions(Some(user_id), authors, recipes_limit)
            .await?;
        Ok((views, count))
    }
}
