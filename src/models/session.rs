use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::SubscriptionTier;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RefreshSessionRequest {
    /// Skip the minimum-interval check. An in-flight refresh still wins.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSessionResponse {
    pub success: bool,
    /// Whether this call actually ran the subscription refresh.
    pub refreshed: bool,
    pub subscription: SubscriptionTier,
    pub access_token: String,
}
