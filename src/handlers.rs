use crate::config::Config;
use crate::errors::AppError;
use crate::models::{
    BatchPriceItem, BatchPriceRequest, BatchPriceResponse, PriceRequest, PriceResponse,
};
use crate::pricing::DynamicPricer;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// The pricing engine, loaded once at startup and read-only thereafter.
    pub pricer: Arc<DynamicPricer>,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "ride-pricing-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/price
///
/// Prices a single ride. Time fields omitted from the payload default to the
/// current clock; an omitted base fare defaults to distance times the
/// vehicle's per-km rate.
pub async fn get_ride_price(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PriceRequest>,
) -> Result<Json<PriceResponse>, AppError> {
    let ride_id = payload
        .ride_id
        .clone()
        .unwrap_or_else(|| "R000001".to_string());
    tracing::info!("POST /api/v1/price - ride_id: {}", ride_id);

    let ride = payload.into_ride();
    let result = state.pricer.price(&ride)?;

    tracing::info!(
        "Priced ride {}: base {:.0} -> optimal {} ({:+.1}%)",
        ride_id,
        result.base_price,
        result.optimal_price,
        result.price_percent_change
    );

    Ok(Json(PriceResponse { ride_id, result }))
}

/// POST /api/v1/price/batch
///
/// Prices rides independently, preserving input order. A ride that fails
/// validation or encoding is reported as a failed item; it never aborts the
/// batch.
pub async fn batch_price_rides(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BatchPriceRequest>,
) -> Result<Json<BatchPriceResponse>, AppError> {
    if payload.rides.is_empty() {
        return Err(AppError::BadRequest(
            "rides cannot be empty".to_string(),
        ));
    }
    tracing::info!("POST /api/v1/price/batch - {} rides", payload.rides.len());

    let mut ride_ids = Vec::with_capacity(payload.rides.len());
    let mut rides = Vec::with_capacity(payload.rides.len());
    for (i, request) in payload.rides.into_iter().enumerate() {
        ride_ids.push(
            request
                .ride_id
                .clone()
                .unwrap_or_else(|| format!("R{:06}", i + 1)),
        );
        rides.push(request.into_ride());
    }

    let outcomes = state.pricer.batch_price(&rides);

    let mut priced = 0;
    let mut failed = 0;
    let results: Vec<BatchPriceItem> = ride_ids
        .into_iter()
        .zip(outcomes)
        .map(|(ride_id, outcome)| match outcome {
            Ok(result) => {
                priced += 1;
                BatchPriceItem {
                    ride_id,
                    success: true,
                    result: Some(result),
                    error: None,
                }
            }
            Err(e) => {
                failed += 1;
                BatchPriceItem {
                    ride_id,
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    tracing::info!("Batch priced: {} ok, {} failed", priced, failed);

    Ok(Json(BatchPriceResponse {
        results,
        priced,
        failed,
    }))
}

/// GET /api/v1/pricing-factors
///
/// Lists the factors that influence the final price, together with the
/// configured price bounds.
pub async fn pricing_factors(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let constraints = &state.config.constraints;
    Json(json!({
        "base_factors": [
            "Distance (km)",
            "Estimated travel time (minutes)",
            "Vehicle type (moto, 4-seat car, 7-seat car, luxury)"
        ],
        "dynamic_factors": [
            "Supply/demand ratio (available drivers vs. area demand)",
            "Time of day (peak hours)",
            "Day of week (weekday/weekend)",
            "Weather conditions (clear, rain, heavy rain)",
            "Traffic congestion level (0-10)",
            "Rider history (number of previous rides)",
            "Rider rating (1-5 stars)"
        ],
        "special_conditions": [
            "5% discount for loyal riders (over 50 rides, rating 4.5 or higher)",
            "2% discount for frequent riders (over 20 rides)",
            "Up to 50% surge in extreme demand conditions",
            "10-20% surcharge in bad weather"
        ],
        "price_bounds": {
            "min_multiplier": constraints.min_multiplier,
            "max_multiplier": constraints.max_multiplier,
            "vehicle_floors": {
                "moto": constraints.min_price_moto,
                "car4": constraints.min_price_car4,
                "car7": constraints.min_price_car7,
                "luxury": constraints.min_price_luxury
            }
        }
    }))
}

/// GET /api/v1/model/importance
///
/// Feature importance of the base-price estimator, descending. Informational:
/// the estimator's prediction is reported per ride but does not drive the
/// final price.
pub async fn model_importance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let importance: Vec<serde_json::Value> = state
        .pricer
        .feature_importance()
        .iter()
        .map(|(feature, score)| json!({ "feature": feature, "importance": score }))
        .collect();

    Ok(Json(json!({ "feature_importance": importance })))
}
