use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    #[serde(default)]
    #[schema(example = "ada@example.com")]
    pub email: String,
}
