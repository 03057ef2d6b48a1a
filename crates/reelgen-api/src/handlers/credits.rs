//! Credit balance handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use reelgen_store::CreditStore;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Credit balance response.
#[derive(Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub balance: i64,
}

/// GET /api/credits
///
/// The caller's current balance. Open reservations have already been
/// deducted from it.
pub async fn get_balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = state
        .orchestrator
        .context()
        .credits
        .get_balance(&user.uid)
        .await?;

    Ok(Json(BalanceResponse {
        user_id: user.uid,
        balance,
    }))
}
