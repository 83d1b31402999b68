use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use valora_catalog::{DerivedAttributes, FinancialBreakdown};
use valora_order::MAX_RECORD_COUNT;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/orders/{index}/valuation", get(order_valuation))
}

#[derive(Debug, Serialize)]
pub struct OrderValuationResponse {
    pub index: u64,
    pub attributes: DerivedAttributes,
    pub breakdown: FinancialBreakdown,
}

/// Derived attributes and pricing for a single synthetic order
pub async fn order_valuation(
    State(state): State<AppState>,
    Path(index): Path<u64>,
) -> Result<Json<OrderValuationResponse>, AppError> {
    if index == 0 || index > MAX_RECORD_COUNT {
        return Err(AppError::ValidationError(format!(
            "order index must be between 1 and {} (got {})",
            MAX_RECORD_COUNT, index
        )));
    }

    let attributes = DerivedAttributes::from_index(index);
    let breakdown = state.engine.price(&attributes);

    Ok(Json(OrderValuationResponse {
        index,
        attributes,
        breakdown,
    }))
}
