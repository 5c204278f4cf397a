/// Dynamic pricing engine.
///
/// Combines the learned base-price estimate with an ordered set of business
/// rules (supply/demand surge, weather, traffic, peak hours, loyalty
/// discounts), clamps the result to the configured bounds, and explains the
/// outcome with human-readable insights.
use crate::errors::AppError;
use crate::estimator::BasePriceEstimator;
use crate::features::FeatureEncoder;
use crate::models::{PriceConstraints, PricingResult, RideRequest, WeatherCondition};
use std::sync::Arc;

/// Rounds a price to the nearest multiple of 1000, ties to even.
///
/// This is banker's rounding, matching Python's `round(price, -3)` that the
/// pricing rules were originally specified against: 97500 rounds to 98000,
/// 96500 rounds to 96000.
pub fn round_to_thousand(price: f64) -> i64 {
    ((price / 1000.0).round_ties_even() * 1000.0) as i64
}

/// The pricing engine. Immutable after construction and safe to share
/// across request handlers behind an `Arc`.
pub struct DynamicPricer {
    encoder: FeatureEncoder,
    estimator: Arc<dyn BasePriceEstimator>,
    constraints: PriceConstraints,
}

impl DynamicPricer {
    /// Builds the engine from a fitted encoder, a trained estimator and the
    /// price constraints.
    ///
    /// Fails with `NotFitted` if the encoder has not been fitted; this is a
    /// process misconfiguration and is meant to be caught once at startup.
    pub fn new(
        encoder: FeatureEncoder,
        estimator: Arc<dyn BasePriceEstimator>,
        constraints: PriceConstraints,
    ) -> Result<Self, AppError> {
        if !encoder.is_fitted() {
            return Err(AppError::NotFitted(
                "pricing engine requires a fitted feature encoder".to_string(),
            ));
        }
        Ok(Self {
            encoder,
            estimator,
            constraints,
        })
    }

    /// Prices one ride.
    ///
    /// Validates the input, records the estimator's prediction
    /// (`model_price`, informational only), applies the business rules in
    /// order, clamps to bounds, and rounds to the nearest 1000.
    pub fn price(&self, ride: &RideRequest) -> Result<PricingResult, AppError> {
        ride.validate()?;

        let features = self.encoder.transform(ride)?;
        let model_price = self.estimator.predict(&features)?;

        let (adjusted_price, reasons) = self.apply_business_rules(ride);

        if ride.base_price == 0.0 {
            return Err(AppError::DivisionUndefined);
        }
        let price_change = (adjusted_price - ride.base_price) / ride.base_price * 100.0;

        let optimal_price = round_to_thousand(adjusted_price);

        let mut insights = Vec::with_capacity(reasons.len() + 1);
        insights.push(if price_change > 0.0 {
            format!(
                "Price increased {:.1}% over the base fare due to high demand or adverse conditions.",
                price_change.abs()
            )
        } else if price_change < 0.0 {
            format!(
                "Price decreased {:.1}% below the base fare due to rider discounts or low demand.",
                price_change.abs()
            )
        } else {
            "Price matches the base fare under normal conditions.".to_string()
        });
        insights.extend(reasons);

        Ok(PricingResult {
            optimal_price,
            base_price: ride.base_price,
            model_price,
            price_percent_change: price_change,
            insights,
        })
    }

    /// Prices a batch of rides independently, preserving input order.
    ///
    /// A ride that fails validation or encoding yields an `Err` for that
    /// position only; the rest of the batch is still priced.
    pub fn batch_price(&self, rides: &[RideRequest]) -> Vec<Result<PricingResult, AppError>> {
        rides
            .iter()
            .map(|ride| {
                let result = self.price(ride);
                if let Err(e) = &result {
                    tracing::warn!("Failed to price ride: {}", e);
                }
                result
            })
            .collect()
    }

    /// Feature importance of the underlying estimator, descending.
    pub fn feature_importance(&self) -> &[(String, f64)] {
        self.estimator.feature_importance()
    }

    /// Applies the ordered business rules to the base fare and collects one
    /// reason per rule that fired.
    fn apply_business_rules(&self, ride: &RideRequest) -> (f64, Vec<String>) {
        let base_price = ride.base_price;
        let mut price = base_price;
        let mut reasons = Vec::new();

        // 1. Supply/demand surge
        let demand_supply_ratio = ride.area_demand as f64 / ride.available_drivers.max(1) as f64;
        if demand_supply_ratio > 2.0 {
            let surge_multiplier = (1.0 + (demand_supply_ratio - 2.0) * 0.1).min(1.5);
            price *= surge_multiplier;
            reasons.push(format!(
                "High demand ({}) and few available drivers ({}) pushed the price up.",
                ride.area_demand, ride.available_drivers
            ));
        }

        // 2. Weather conditions (mutually exclusive by construction)
        match ride.weather_condition {
            WeatherCondition::Clear => {}
            WeatherCondition::Rain => {
                price *= 1.1;
                reasons.push(
                    "Rainy weather increased the price due to harder travel conditions."
                        .to_string(),
                );
            }
            WeatherCondition::HeavyRain => {
                price *= 1.2;
                reasons.push(
                    "Heavy rain increased the price significantly due to risk and travel difficulty."
                        .to_string(),
                );
            }
        }

        // 3. Traffic congestion
        if ride.traffic_level > 7 {
            price *= 1.0 + (ride.traffic_level - 7) as f64 * 0.03;
            reasons.push(format!(
                "Heavy traffic congestion (level {}/10) increased the price.",
                ride.traffic_level
            ));
        }

        // 4. Peak hours, inclusive bounds
        if (7..=9).contains(&ride.hour) || (17..=19).contains(&ride.hour) {
            price *= 1.15;
            reasons.push(format!(
                "Booking during peak hours ({}:00) increased the price.",
                ride.hour
            ));
        }

        // 5. Loyalty discounts, first match wins
        if ride.user_previous_rides > 50 && ride.user_rating >= 4.5 {
            price *= 0.95;
            reasons.push(
                "5% discount for a loyal rider (over 50 rides, rating 4.5 or higher).".to_string(),
            );
        } else if ride.user_previous_rides > 20 {
            price *= 0.98;
            reasons.push(format!(
                "2% discount for a frequent rider ({} previous rides).",
                ride.user_previous_rides
            ));
        }

        // 6. Bounds, in this exact order: vehicle floor, relative floor, then
        // the relative ceiling. The ceiling is applied last, so when the
        // vehicle floor exceeds base_price * max_multiplier the ceiling wins.
        let vehicle_floor = self.constraints.vehicle_floor(ride.vehicle_type);
        let min_allowed = base_price * self.constraints.min_multiplier;
        let max_allowed = base_price * self.constraints.max_multiplier;

        price = price.max(vehicle_floor);
        price = price.max(min_allowed);
        price = price.min(max_allowed);

        (price, reasons)
    }
}
