use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};
use std::collections::HashMap;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionSubscriptionData, Event, Subscription,
    SubscriptionId, Webhook,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct StripeService {
    client: Client,
    config: StripeConfig,
    base_url: String,
}

impl StripeService {
    pub fn new(config: StripeConfig, base_url: &str) -> Self {
        Self {
            client: Client::new(config.secret_key.clone()),
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn premium_price_id(&self) -> Option<&str> {
        self.config.premium_price_id.as_deref()
    }

    /// Subscription-mode checkout for a single price. The user id travels as
    /// `client_reference_id` and as `userId` metadata on the subscription so
    /// webhooks can map events back to the account.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        user_id: Uuid,
        customer_email: &str,
    ) -> AppResult<CheckoutSession> {
        if price_id.is_empty() {
            return Err(AppError::ValidationError("Invalid price ID".to_string()));
        }

        let user_id = user_id.to_string();
        let success_url = format!(
            "{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.base_url
        );
        let cancel_url = format!("{}/payment/canceled", self.base_url);
        let metadata: HashMap<String, String> =
            HashMap::from([("userId".to_string(), user_id.clone())]);

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Subscription);
        params.success_url = Some(&success_url);
        params.cancel_url = Some(&cancel_url);
        params.client_reference_id = Some(&user_id);
        if !customer_email.is_empty() {
            params.customer_email = Some(customer_email);
        }
        params.metadata = Some(metadata.clone());
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]);
        params.subscription_data = Some(CreateCheckoutSessionSubscriptionData {
            metadata: Some(metadata),
            ..Default::default()
        });

        let session = CheckoutSession::create(&self.client, params).await?;
        log::info!("Created checkout session {} for user {user_id}", session.id);
        Ok(session)
    }

    pub async fn retrieve_subscription(&self, subscription_id: &str) -> AppResult<Subscription> {
        let id: SubscriptionId = subscription_id.parse().map_err(|_| {
            AppError::ValidationError(format!("Invalid subscription id: {subscription_id}"))
        })?;
        let subscription = Subscription::retrieve(&self.client, &id, &[]).await?;
        Ok(subscription)
    }

    /// Verifies the `Stripe-Signature` header and parses the event.
    pub fn construct_event(&self, payload: &str, signature: &str) -> AppResult<Event> {
        if self.config.webhook_secret.is_empty() {
            return Err(AppError::ConfigError("Missing webhook secret".to_string()));
        }
        Webhook::construct_event(payload, signature, &self.config.webhook_secret).map_err(|e| {
            AppError::ValidationError(format!("Webhook signature verification failed: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(webhook_secret: &str) -> StripeService {
        let config = StripeConfig {
            secret_key: "sk_test_123".to_string(),
            webhook_secret: webhook_secret.to_string(),
            premium_price_id: Some("price_premium".to_string()),
        };
        StripeService::new(config, "http://localhost:3000/")
    }

    #[test]
    fn test_stripe_service_creation() {
        let service = service("whsec_123");
        assert_eq!(service.premium_price_id(), Some("price_premium"));
        assert_eq!(service.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_bad_signature_is_rejected() {
        let service = service("whsec_123");
        let result = service.construct_event("{}", "t=1,v1=deadbeef");
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_missing_webhook_secret_is_config_error() {
        let service = service("");
        let result = service.construct_event("{}", "t=1,v1=deadbeef");
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
