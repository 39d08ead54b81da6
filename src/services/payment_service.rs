use crate::entities::{SubscriptionTier, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::StripeService;
use crate::models::*;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use stripe::{CheckoutSession, Event, EventObject, EventType, Subscription, SubscriptionStatus};
use uuid::Uuid;

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    stripe_service: StripeService,
}

impl PaymentService {
    pub fn new(pool: DatabaseConnection, stripe_service: StripeService) -> Self {
        Self {
            pool,
            stripe_service,
        }
    }

    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        request: CheckoutRequest,
    ) -> AppResult<CheckoutResponse> {
        let price_id = request
            .price_id
            .filter(|p| !p.is_empty())
            .or_else(|| self.stripe_service.premium_price_id().map(str::to_string))
            .ok_or_else(|| AppError::ValidationError("Invalid price ID".to_string()))?;

        let user = self.find_user(user_id).await?;
        let session = self
            .stripe_service
            .create_checkout_session(&price_id, user.id, &user.email)
            .await?;

        Ok(CheckoutResponse {
            session_id: session.id.to_string(),
            url: session.url,
        })
    }

    pub async fn subscription_status(&self, user_id: Uuid) -> AppResult<SubscriptionStatusResponse> {
        let user = self.find_user(user_id).await?;

        let stripe_subscription = match user.stripe_subscription_id.as_deref() {
            Some(id) => match self.stripe_service.retrieve_subscription(id).await {
                Ok(sub) => Some(StripeSubscriptionInfo {
                    id: sub.id.to_string(),
                    status: sub.status.to_string(),
                    current_period_end: DateTime::<Utc>::from_timestamp(sub.current_period_end, 0),
                }),
                Err(e) => {
                    log::error!("Error retrieving Stripe subscription {id}: {e}");
                    None
                }
            },
            None => None,
        };

        Ok(SubscriptionStatusResponse {
            user_id: user.id,
            email: user.email,
            subscription: user.subscription,
            stripe_subscription_id: user.stripe_subscription_id,
            stripe_subscription,
        })
    }

    /// Applies a verified Stripe webhook event to the user's stored tier.
    pub async fn handle_webhook_event(&self, event: Event) -> AppResult<()> {
        match (event.type_, event.data.object) {
            (EventType::CheckoutSessionCompleted, EventObject::CheckoutSession(session)) => {
                self.handle_checkout_completed(session).await
            }
            (EventType::CustomerSubscriptionUpdated, EventObject::Subscription(sub)) => {
                let tier = SubscriptionTier::from_stripe_status(sub.status);
                self.apply_subscription_change(&sub, tier).await
            }
            (EventType::CustomerSubscriptionDeleted, EventObject::Subscription(sub)) => {
                self.apply_subscription_change(&sub, SubscriptionTier::Free)
                    .await
            }
            (other, _) => {
                log::info!("Unhandled event type: {other}");
                Ok(())
            }
        }
    }

    async fn handle_checkout_completed(&self, session: CheckoutSession) -> AppResult<()> {
        let user_id = session
            .client_reference_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok());
        let subscription_id = session.subscription.as_ref().map(|s| s.id().to_string());

        let (Some(user_id), Some(subscription_id)) = (user_id, subscription_id) else {
            log::warn!("Checkout session {} has no user or subscription", session.id);
            return Ok(());
        };

        let subscription = self
            .stripe_service
            .retrieve_subscription(&subscription_id)
            .await?;
        if subscription.status != SubscriptionStatus::Active {
            log::info!(
                "Checkout {} completed but subscription {subscription_id} is {}",
                session.id,
                subscription.status
            );
            return Ok(());
        }

        let customer_id = session.customer.as_ref().map(|c| c.id().to_string());
        let mut model = users::ActiveModel {
            id: Set(user_id),
            subscription: Set(SubscriptionTier::Paid),
            stripe_subscription_id: Set(Some(subscription_id)),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        if let Some(customer_id) = customer_id {
            model.stripe_customer_id = Set(Some(customer_id));
        }
        model.update(&self.pool).await?;

        log::info!("User {user_id} upgraded to paid subscription");
        Ok(())
    }

    async fn apply_subscription_change(
        &self,
        subscription: &Subscription,
        tier: SubscriptionTier,
    ) -> AppResult<()> {
        let Some(user_id) = subscription
            .metadata
            .get("userId")
            .and_then(|id| Uuid::parse_str(id).ok())
        else {
            log::warn!("Subscription {} has no userId metadata", subscription.id);
            return Ok(());
        };

        users::ActiveModel {
            id: Set(user_id),
            subscription: Set(tier),
            stripe_subscription_id: Set(Some(subscription.id.to_string())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .update(&self.pool)
        .await?;

        log::info!("User {user_id} subscription updated to {tier}");
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
