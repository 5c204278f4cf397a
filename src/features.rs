/// Feature encoding for the base-price estimator.
///
/// Mirrors the training-time preprocessing contract: numeric features are
/// standardized with frozen per-feature mean/std, categorical features are
/// one-hot encoded with a drop-first policy (the first observed category is
/// the reference and gets no column). Categories never seen during `fit`
/// are rejected rather than silently zero-filled.
use crate::errors::AppError;
use crate::models::{RideRequest, VehicleType, WeatherCondition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Numeric features, in column order.
pub const NUMERIC_FEATURES: [&str; 9] = [
    "distance_km",
    "duration_min",
    "hour",
    "day_of_week",
    "traffic_level",
    "available_drivers",
    "area_demand",
    "user_rating",
    "user_previous_rides",
];

/// Categorical features, in column order. `is_weekend` is derived from
/// `day_of_week` (Saturday/Sunday).
pub const CATEGORICAL_FEATURES: [&str; 3] = ["weather_condition", "vehicle_type", "is_weekend"];

fn numeric_values(ride: &RideRequest) -> [f64; 9] {
    [
        ride.distance_km,
        ride.duration_min,
        ride.hour as f64,
        ride.day_of_week as f64,
        ride.traffic_level as f64,
        ride.available_drivers as f64,
        ride.area_demand as f64,
        ride.user_rating,
        ride.user_previous_rides as f64,
    ]
}

fn categorical_codes(ride: &RideRequest) -> [u8; 3] {
    [
        ride.weather_condition.code(),
        ride.vehicle_type.code(),
        ride.is_weekend() as u8,
    ]
}

/// Human-readable label for a category code, used in encoded feature names
/// and in unknown-category errors.
fn category_label(feature_idx: usize, code: u8) -> String {
    match feature_idx {
        0 => WeatherCondition::ALL
            .iter()
            .find(|w| w.code() == code)
            .map(|w| w.label().to_string())
            .unwrap_or_else(|| code.to_string()),
        1 => VehicleType::ALL
            .iter()
            .find(|v| v.code() == code)
            .map(|v| v.label().to_string())
            .unwrap_or_else(|| code.to_string()),
        _ => (code == 1).to_string(),
    }
}

/// State frozen by `fit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedState {
    /// Per-numeric-feature mean.
    means: Vec<f64>,
    /// Per-numeric-feature population standard deviation. Zero-variance
    /// features keep a scale of 1.0 so standardization is a no-op for them.
    stds: Vec<f64>,
    /// Per-categorical-feature distinct category codes observed, ascending.
    /// The first entry of each set is the dropped reference category.
    categories: Vec<Vec<u8>>,
    /// Encoded column names: numeric features first, then one column per
    /// non-reference category as `{feature}_{label}`.
    feature_names: Vec<String>,
}

/// Deterministic, stateless-after-fit transformer from raw ride records to
/// the fixed-length numeric vectors the estimator consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureEncoder {
    fitted: Option<FittedState>,
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `fit` has been called.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Computes and freezes the standardization and encoding state from a
    /// training set. Refitting replaces the previous state wholesale.
    pub fn fit(&mut self, rides: &[RideRequest]) -> Result<(), AppError> {
        if rides.is_empty() {
            return Err(AppError::Validation(
                "cannot fit the feature encoder on an empty training set".to_string(),
            ));
        }

        let n = rides.len() as f64;
        let mut means = vec![0.0; NUMERIC_FEATURES.len()];
        for ride in rides {
            for (i, v) in numeric_values(ride).iter().enumerate() {
                means[i] += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stds = vec![0.0; NUMERIC_FEATURES.len()];
        for ride in rides {
            for (i, v) in numeric_values(ride).iter().enumerate() {
                let d = v - means[i];
                stds[i] += d * d;
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
            if *s < 1e-12 {
                *s = 1.0;
            }
        }

        let mut observed: Vec<BTreeSet<u8>> = vec![BTreeSet::new(); CATEGORICAL_FEATURES.len()];
        for ride in rides {
            for (i, code) in categorical_codes(ride).iter().enumerate() {
                observed[i].insert(*code);
            }
        }
        let categories: Vec<Vec<u8>> = observed
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect();

        let mut feature_names: Vec<String> =
            NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect();
        for (i, cats) in categories.iter().enumerate() {
            // Drop-first policy: the lowest observed code is the reference.
            for code in cats.iter().skip(1) {
                feature_names.push(format!(
                    "{}_{}",
                    CATEGORICAL_FEATURES[i],
                    category_label(i, *code)
                ));
            }
        }

        self.fitted = Some(FittedState {
            means,
            stds,
            categories,
            feature_names,
        });

        tracing::debug!(
            "Feature encoder fitted on {} rides, {} encoded features",
            rides.len(),
            self.dim()?
        );

        Ok(())
    }

    /// Applies the frozen standardization and encoding to one ride.
    ///
    /// Fails with `NotFitted` before `fit`, and with `UnknownCategory` if a
    /// categorical value was never observed during fitting.
    pub fn transform(&self, ride: &RideRequest) -> Result<Vec<f64>, AppError> {
        let state = self.state()?;

        let mut out = Vec::with_capacity(state.feature_names.len());
        for (i, v) in numeric_values(ride).iter().enumerate() {
            out.push((v - state.means[i]) / state.stds[i]);
        }

        for (i, code) in categorical_codes(ride).iter().enumerate() {
            if !state.categories[i].contains(code) {
                return Err(AppError::UnknownCategory {
                    feature: CATEGORICAL_FEATURES[i].to_string(),
                    value: category_label(i, *code),
                });
            }
            for cat in state.categories[i].iter().skip(1) {
                out.push(if code == cat { 1.0 } else { 0.0 });
            }
        }

        Ok(out)
    }

    /// Ordered encoded column names, for feature-importance reporting.
    pub fn feature_names(&self) -> Result<&[String], AppError> {
        Ok(&self.state()?.feature_names)
    }

    /// Length of the encoded vector.
    pub fn dim(&self) -> Result<usize, AppError> {
        Ok(self.state()?.feature_names.len())
    }

    fn state(&self) -> Result<&FittedState, AppError> {
        self.fitted.as_ref().ok_or_else(|| {
            AppError::NotFitted("feature encoder used before fit() or artifact load".to_string())
        })
    }
}
