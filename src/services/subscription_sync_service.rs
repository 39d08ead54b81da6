use crate::entities::{SubscriptionTier, user_entity as users};
use crate::error::AppResult;
use crate::external::StripeService;
use crate::services::SessionUpdater;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Reconciles stored subscription tiers with Stripe. This is the session
/// refresh collaborator: tokens re-issued afterwards carry the fresh tier.
#[derive(Clone)]
pub struct SubscriptionSyncService {
    pool: DatabaseConnection,
    stripe_service: StripeService,
}

impl SubscriptionSyncService {
    pub fn new(pool: DatabaseConnection, stripe_service: StripeService) -> Self {
        Self {
            pool,
            stripe_service,
        }
    }

    /// Returns how many users changed tier. Stripe lookups that fail are
    /// logged and skipped so one bad subscription id can't stall the rest.
    pub async fn sync_subscriptions(&self) -> AppResult<usize> {
        let subscribed = users::Entity::find()
            .filter(users::Column::StripeSubscriptionId.is_not_null())
            .all(&self.pool)
            .await?;

        let mut changed = 0;
        for user in subscribed {
            let Some(subscription_id) = user.stripe_subscription_id.as_deref() else {
                continue;
            };
            let subscription = match self
                .stripe_service
                .retrieve_subscription(subscription_id)
                .await
            {
                Ok(s) => s,
                Err(e) => {
                    log::warn!(
                        "Failed to retrieve subscription {subscription_id} for user {}: {e}",
                        user.id
                    );
                    continue;
                }
            };

            let tier = SubscriptionTier::from_stripe_status(subscription.status);
            if tier == user.subscription {
                continue;
            }

            let user_id = user.id;
            users::ActiveModel {
                id: Set(user_id),
                subscription: Set(tier),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            }
            .update(&self.pool)
            .await?;
            log::info!("User {user_id} subscription synced to {tier}");
            changed += 1;
        }

        Ok(changed)
    }
}

#[async_trait]
impl SessionUpdater for SubscriptionSyncService {
    async fn update(&self) -> AppResult<()> {
        let changed = self.sync_subscriptions().await?;
        log::debug!("Subscription sync finished, {changed} user(s) changed tier");
        Ok(())
    }
}
