//! API response model for like toggling.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Resulting like state after a toggle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LikeStatusResponse {
    pub is_liked: bool,
}
