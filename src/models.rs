use crate::errors::AppError;
use chrono::{Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};

// ============ Domain Models ============

/// Weather condition at booking time.
///
/// Closed enumeration: every pricing rule that inspects weather matches
/// exhaustively, so adding a variant forces all rule sites to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    /// Clear weather, no adjustment.
    Clear,
    /// Rain, 10% surcharge.
    Rain,
    /// Heavy rain, 20% surcharge.
    HeavyRain,
}

impl WeatherCondition {
    /// All conditions in encoding order.
    pub const ALL: [WeatherCondition; 3] = [
        WeatherCondition::Clear,
        WeatherCondition::Rain,
        WeatherCondition::HeavyRain,
    ];

    /// Stable numeric code used by the feature encoder.
    pub fn code(&self) -> u8 {
        match self {
            WeatherCondition::Clear => 0,
            WeatherCondition::Rain => 1,
            WeatherCondition::HeavyRain => 2,
        }
    }

    /// Human-readable label, used in encoded feature names.
    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::Rain => "rain",
            WeatherCondition::HeavyRain => "heavy_rain",
        }
    }
}

/// Vehicle category of the ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    /// Motorbike.
    Moto,
    /// 4-seat car.
    Car4,
    /// 7-seat car.
    Car7,
    /// Luxury car.
    Luxury,
}

impl VehicleType {
    /// All vehicle types in encoding order.
    pub const ALL: [VehicleType; 4] = [
        VehicleType::Moto,
        VehicleType::Car4,
        VehicleType::Car7,
        VehicleType::Luxury,
    ];

    /// Stable numeric code used by the feature encoder.
    pub fn code(&self) -> u8 {
        match self {
            VehicleType::Moto => 0,
            VehicleType::Car4 => 1,
            VehicleType::Car7 => 2,
            VehicleType::Luxury => 3,
        }
    }

    /// Human-readable label, used in encoded feature names.
    pub fn label(&self) -> &'static str {
        match self {
            VehicleType::Moto => "moto",
            VehicleType::Car4 => "car4",
            VehicleType::Car7 => "car7",
            VehicleType::Luxury => "luxury",
        }
    }

    /// Standard fare per kilometer for this vehicle type, used when a request
    /// does not carry a precomputed base fare.
    pub fn rate_per_km(&self) -> f64 {
        match self {
            VehicleType::Moto => 8_000.0,
            VehicleType::Car4 => 15_000.0,
            VehicleType::Car7 => 20_000.0,
            VehicleType::Luxury => 35_000.0,
        }
    }
}

/// Immutable price bounds applied by the pricing engine.
///
/// Constructed once at startup (see `Config`) and passed explicitly into
/// `DynamicPricer` — never a process-global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConstraints {
    /// The final price never drops below `base_price * min_multiplier`.
    pub min_multiplier: f64,
    /// The final price never exceeds `base_price * max_multiplier`.
    pub max_multiplier: f64,
    /// Absolute floor for motorbike rides.
    pub min_price_moto: f64,
    /// Absolute floor for 4-seat car rides.
    pub min_price_car4: f64,
    /// Absolute floor for 7-seat car rides.
    pub min_price_car7: f64,
    /// Absolute floor for luxury car rides.
    pub min_price_luxury: f64,
}

impl Default for PriceConstraints {
    fn default() -> Self {
        Self {
            min_multiplier: 0.8,
            max_multiplier: 2.0,
            min_price_moto: 10_000.0,
            min_price_car4: 20_000.0,
            min_price_car7: 30_000.0,
            min_price_luxury: 50_000.0,
        }
    }
}

impl PriceConstraints {
    /// Absolute minimum price for the given vehicle type.
    pub fn vehicle_floor(&self, vehicle: VehicleType) -> f64 {
        match vehicle {
            VehicleType::Moto => self.min_price_moto,
            VehicleType::Car4 => self.min_price_car4,
            VehicleType::Car7 => self.min_price_car7,
            VehicleType::Luxury => self.min_price_luxury,
        }
    }
}

/// Immutable input for one pricing computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    /// Ride distance in kilometers, must be positive.
    pub distance_km: f64,
    /// Estimated ride duration in minutes, must be positive.
    pub duration_min: f64,
    /// Hour of the booking, 0-23.
    pub hour: u8,
    /// Day of week, 0 = Monday .. 6 = Sunday.
    pub day_of_week: u8,
    /// Month of the booking, 1-12.
    pub month: u8,
    /// Weather condition at booking time.
    pub weather_condition: WeatherCondition,
    /// Traffic congestion level, 0-10.
    pub traffic_level: u8,
    /// Drivers currently available in the area.
    pub available_drivers: u32,
    /// Open ride requests in the area.
    pub area_demand: u32,
    /// Vehicle category requested.
    pub vehicle_type: VehicleType,
    /// Rider's average rating, 1.0-5.0.
    pub user_rating: f64,
    /// Number of rides the user has completed before this one.
    pub user_previous_rides: u32,
    /// Base fare (distance x per-km rate for the vehicle type), must be
    /// positive. Computed upstream; the engine only transforms it.
    pub base_price: f64,
}

impl RideRequest {
    /// Whether the booking falls on a weekend (Saturday or Sunday).
    pub fn is_weekend(&self) -> bool {
        self.day_of_week >= 5
    }

    /// Rejects malformed or out-of-range fields before any pricing work.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.distance_km.is_finite() || self.distance_km <= 0.0 {
            return Err(AppError::Validation(format!(
                "distance_km must be positive, got {}",
                self.distance_km
            )));
        }
        if !self.duration_min.is_finite() || self.duration_min <= 0.0 {
            return Err(AppError::Validation(format!(
                "duration_min must be positive, got {}",
                self.duration_min
            )));
        }
        if self.hour > 23 {
            return Err(AppError::Validation(format!(
                "hour must be 0-23, got {}",
                self.hour
            )));
        }
        if self.day_of_week > 6 {
            return Err(AppError::Validation(format!(
                "day_of_week must be 0-6, got {}",
                self.day_of_week
            )));
        }
        if self.month < 1 || self.month > 12 {
            return Err(AppError::Validation(format!(
                "month must be 1-12, got {}",
                self.month
            )));
        }
        if self.traffic_level > 10 {
            return Err(AppError::Validation(format!(
                "traffic_level must be 0-10, got {}",
                self.traffic_level
            )));
        }
        if !self.user_rating.is_finite() || self.user_rating < 1.0 || self.user_rating > 5.0 {
            return Err(AppError::Validation(format!(
                "user_rating must be 1.0-5.0, got {}",
                self.user_rating
            )));
        }
        if !self.base_price.is_finite() || self.base_price <= 0.0 {
            return Err(AppError::Validation(format!(
                "base_price must be positive, got {}",
                self.base_price
            )));
        }
        Ok(())
    }
}

/// Output of one pricing computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResult {
    /// Final price, rounded to the nearest 1000 (ties to even).
    pub optimal_price: i64,
    /// Base fare echoed from the request.
    pub base_price: f64,
    /// Raw estimator output. Informational only; it does not feed into
    /// `optimal_price`.
    pub model_price: f64,
    /// Percent change of the (pre-rounding) adjusted price relative to the
    /// base fare.
    pub price_percent_change: f64,
    /// Summary insight first, then one reason per business rule that fired,
    /// in rule order.
    pub insights: Vec<String>,
}

// ============ API Request/Response Models ============

fn default_weather() -> WeatherCondition {
    WeatherCondition::Clear
}

fn default_traffic() -> u8 {
    3
}

fn default_drivers() -> u32 {
    10
}

fn default_demand() -> u32 {
    50
}

fn default_vehicle() -> VehicleType {
    VehicleType::Car4
}

fn default_rating() -> f64 {
    4.5
}

fn default_previous_rides() -> u32 {
    5
}

/// Request payload for pricing a single ride.
///
/// Time fields and the base fare are optional: when omitted they default to
/// the current clock and to `distance_km x rate_per_km(vehicle_type)`.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRequest {
    /// Optional caller-supplied ride identifier, echoed back in responses.
    pub ride_id: Option<String>,
    /// Ride distance in kilometers.
    pub distance_km: f64,
    /// Estimated ride duration in minutes.
    pub duration_min: f64,
    /// Hour of the booking; defaults to the current hour.
    pub hour: Option<u8>,
    /// Day of week (0 = Monday); defaults to today.
    pub day_of_week: Option<u8>,
    /// Month of the booking; defaults to the current month.
    pub month: Option<u8>,
    #[serde(default = "default_weather")]
    pub weather_condition: WeatherCondition,
    #[serde(default = "default_traffic")]
    pub traffic_level: u8,
    #[serde(default = "default_drivers")]
    pub available_drivers: u32,
    #[serde(default = "default_demand")]
    pub area_demand: u32,
    #[serde(default = "default_vehicle")]
    pub vehicle_type: VehicleType,
    #[serde(default = "default_rating")]
    pub user_rating: f64,
    #[serde(default = "default_previous_rides")]
    pub user_previous_rides: u32,
    /// Base fare; defaults to distance times the vehicle's per-km rate.
    pub base_price: Option<f64>,
}

impl PriceRequest {
    /// Fills clock-based defaults and converts into the immutable
    /// `RideRequest` consumed by the pricing engine.
    pub fn into_ride(self) -> RideRequest {
        let now = Local::now();
        RideRequest {
            distance_km: self.distance_km,
            duration_min: self.duration_min,
            hour: self.hour.unwrap_or(now.hour() as u8),
            day_of_week: self
                .day_of_week
                .unwrap_or(now.weekday().num_days_from_monday() as u8),
            month: self.month.unwrap_or(now.month() as u8),
            weather_condition: self.weather_condition,
            traffic_level: self.traffic_level,
            available_drivers: self.available_drivers,
            area_demand: self.area_demand,
            vehicle_type: self.vehicle_type,
            user_rating: self.user_rating,
            user_previous_rides: self.user_previous_rides,
            base_price: self
                .base_price
                .unwrap_or(self.distance_km * self.vehicle_type.rate_per_km()),
        }
    }
}

/// Response payload for a single priced ride.
#[derive(Debug, Serialize)]
pub struct PriceResponse {
    /// Ride identifier (caller-supplied or generated).
    pub ride_id: String,
    /// The pricing result.
    #[serde(flatten)]
    pub result: PricingResult,
}

/// Request payload for batch pricing.
#[derive(Debug, Deserialize)]
pub struct BatchPriceRequest {
    /// Rides to price, in order.
    pub rides: Vec<PriceRequest>,
}

/// One item of a batch pricing response. Exactly one of `result` / `error`
/// is set; a failed ride never aborts the rest of the batch.
#[derive(Debug, Serialize)]
pub struct BatchPriceItem {
    /// Ride identifier (caller-supplied or positional).
    pub ride_id: String,
    /// Whether this ride was priced successfully.
    pub success: bool,
    /// Pricing result, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PricingResult>,
    /// Error message, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response payload for batch pricing, preserving input order.
#[derive(Debug, Serialize)]
pub struct BatchPriceResponse {
    /// Per-ride outcomes in input order.
    pub results: Vec<BatchPriceItem>,
    /// Number of rides priced successfully.
    pub priced: usize,
    /// Number of rides rejected.
    pub failed: usize,
}
