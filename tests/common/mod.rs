#![allow(dead_code)]
//! Shared fixtures for integration tests: a stub estimator, a neutral ride,
//! and a pricer fitted on a training set covering every category.

use ride_pricing_api::errors::AppError;
use ride_pricing_api::estimator::BasePriceEstimator;
use ride_pricing_api::features::FeatureEncoder;
use ride_pricing_api::models::{PriceConstraints, RideRequest, VehicleType, WeatherCondition};
use ride_pricing_api::pricing::DynamicPricer;
use std::sync::Arc;

/// Estimator stub returning a fixed prediction, standing in for the trained
/// model. The engine treats the estimator as opaque, so a constant is enough.
pub struct FixedEstimator {
    prediction: f64,
    importance: Vec<(String, f64)>,
}

impl FixedEstimator {
    pub fn new(prediction: f64) -> Self {
        Self {
            prediction,
            importance: vec![("distance_km".to_string(), 1.0)],
        }
    }
}

impl BasePriceEstimator for FixedEstimator {
    fn predict(&self, _features: &[f64]) -> Result<f64, AppError> {
        Ok(self.prediction)
    }

    fn feature_importance(&self) -> &[(String, f64)] {
        &self.importance
    }
}

/// A ride that triggers no business rule: ratio 1, clear weather, light
/// traffic, off-peak, few previous rides.
pub fn neutral_ride() -> RideRequest {
    RideRequest {
        distance_km: 5.0,
        duration_min: 15.0,
        hour: 12,
        day_of_week: 2,
        month: 6,
        weather_condition: WeatherCondition::Clear,
        traffic_level: 3,
        available_drivers: 10,
        area_demand: 10,
        vehicle_type: VehicleType::Car4,
        user_rating: 4.0,
        user_previous_rides: 5,
        base_price: 75_000.0,
    }
}

/// Training set covering every weather condition, vehicle type and both
/// weekend values, so `transform` accepts any valid ride.
pub fn training_rides() -> Vec<RideRequest> {
    let mut rides = Vec::new();
    for (i, vehicle) in VehicleType::ALL.iter().enumerate() {
        for (j, weather) in WeatherCondition::ALL.iter().enumerate() {
            let mut ride = neutral_ride();
            ride.vehicle_type = *vehicle;
            ride.weather_condition = *weather;
            ride.day_of_week = if (i + j) % 2 == 0 { 2 } else { 5 };
            ride.distance_km = 2.0 + i as f64 + j as f64;
            ride.duration_min = 10.0 + 3.0 * j as f64;
            ride.base_price = ride.distance_km * vehicle.rate_per_km();
            rides.push(ride);
        }
    }
    rides
}

pub fn fitted_encoder() -> FeatureEncoder {
    let mut encoder = FeatureEncoder::new();
    encoder.fit(&training_rides()).unwrap();
    encoder
}

/// Pricer with default constraints and an arbitrary fixed model prediction.
pub fn pricer() -> DynamicPricer {
    pricer_with_model(88_000.0)
}

pub fn pricer_with_model(prediction: f64) -> DynamicPricer {
    DynamicPricer::new(
        fitted_encoder(),
        Arc::new(FixedEstimator::new(prediction)),
        PriceConstraints::default(),
    )
    .unwrap()
}
