//! Integration tests for the dynamic pricing engine: business rules, clamp
//! precedence, insight generation, validation and batch behavior.
mod common;

use common::*;
use ride_pricing_api::errors::AppError;
use ride_pricing_api::models::{PriceConstraints, VehicleType, WeatherCondition};
use ride_pricing_api::pricing::DynamicPricer;
use std::sync::Arc;

#[cfg(test)]
mod surge_rules {
    use super::*;

    #[test]
    fn surge_applies_when_demand_exceeds_twice_drivers() {
        // demand/drivers = 5 -> multiplier min(1.5, 1.3) = 1.3
        let mut ride = neutral_ride();
        ride.area_demand = 50;
        ride.available_drivers = 10;

        let result = pricer().price(&ride).unwrap();
        assert_eq!(result.optimal_price, 98_000); // 97500 rounds up, ties to even
        assert!((result.price_percent_change - 30.0).abs() < 1e-9);
        assert_eq!(result.insights.len(), 2); // summary + surge reason
        assert!(result.insights[1].contains("High demand (50)"));
        assert!(result.insights[1].contains("drivers (10)"));
    }

    #[test]
    fn surge_multiplier_caps_at_fifty_percent() {
        let mut ride = neutral_ride();
        ride.area_demand = 100;
        ride.available_drivers = 1;

        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change - 50.0).abs() < 1e-9);
        assert_eq!(result.optimal_price, 112_000); // 112500, ties to even
    }

    #[test]
    fn zero_drivers_counted_as_one() {
        let mut ride = neutral_ride();
        ride.area_demand = 10;
        ride.available_drivers = 0;

        // ratio = 10/1, capped at 1.5
        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change - 50.0).abs() < 1e-9);
    }

    #[test]
    fn no_surge_at_ratio_exactly_two() {
        let mut ride = neutral_ride();
        ride.area_demand = 20;
        ride.available_drivers = 10;

        let result = pricer().price(&ride).unwrap();
        assert_eq!(result.price_percent_change, 0.0);
        assert_eq!(result.insights.len(), 1);
        assert!(result.insights[0].contains("matches the base fare"));
    }
}

#[cfg(test)]
mod weather_rules {
    use super::*;

    #[test]
    fn rain_adds_ten_percent() {
        let mut ride = neutral_ride();
        ride.weather_condition = WeatherCondition::Rain;

        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change - 10.0).abs() < 1e-9);
        assert_eq!(result.optimal_price, 82_000); // 82500, ties to even
    }

    #[test]
    fn heavy_rain_adds_twenty_percent() {
        let mut ride = neutral_ride();
        ride.weather_condition = WeatherCondition::HeavyRain;

        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change - 20.0).abs() < 1e-9);
        assert_eq!(result.optimal_price, 90_000);
    }

    #[test]
    fn weather_adjustments_are_mutually_exclusive() {
        let engine = pricer();
        for weather in WeatherCondition::ALL {
            let mut ride = neutral_ride();
            ride.weather_condition = weather;
            let result = engine.price(&ride).unwrap();

            let weather_reasons = result
                .insights
                .iter()
                .skip(1)
                .filter(|i| i.contains("rain") || i.contains("Rain"))
                .count();
            match weather {
                WeatherCondition::Clear => assert_eq!(weather_reasons, 0),
                _ => assert_eq!(weather_reasons, 1),
            }
        }
    }
}

#[cfg(test)]
mod traffic_rules {
    use super::*;

    #[test]
    fn traffic_level_nine_adds_six_percent() {
        let mut ride = neutral_ride();
        ride.traffic_level = 9;
        ride.base_price = 50_000.0;

        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change - 6.0).abs() < 1e-9);
        assert_eq!(result.optimal_price, 53_000);
        assert!(result.insights[1].contains("level 9/10"));
    }

    #[test]
    fn traffic_at_threshold_is_free() {
        let mut ride = neutral_ride();
        ride.traffic_level = 7;

        let result = pricer().price(&ride).unwrap();
        assert_eq!(result.price_percent_change, 0.0);
    }
}

#[cfg(test)]
mod peak_hour_rules {
    use super::*;

    #[test]
    fn morning_peak_adds_fifteen_percent() {
        let mut ride = neutral_ride();
        ride.hour = 8;
        ride.base_price = 40_000.0;

        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change - 15.0).abs() < 1e-9);
        assert_eq!(result.optimal_price, 46_000);
    }

    #[test]
    fn peak_windows_are_inclusive() {
        let engine = pricer();
        for (hour, is_peak) in [
            (6, false),
            (7, true),
            (9, true),
            (10, false),
            (16, false),
            (17, true),
            (19, true),
            (20, false),
        ] {
            let mut ride = neutral_ride();
            ride.hour = hour;
            let result = engine.price(&ride).unwrap();
            if is_peak {
                assert!(
                    (result.price_percent_change - 15.0).abs() < 1e-9,
                    "hour {} should be peak",
                    hour
                );
            } else {
                assert_eq!(result.price_percent_change, 0.0, "hour {} is off-peak", hour);
            }
        }
    }
}

#[cfg(test)]
mod loyalty_rules {
    use super::*;

    #[test]
    fn loyal_rider_gets_five_percent_off() {
        let mut ride = neutral_ride();
        ride.user_previous_rides = 100;
        ride.user_rating = 4.8;
        ride.base_price = 100_000.0;

        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change + 5.0).abs() < 1e-9);
        assert_eq!(result.optimal_price, 95_000);
        assert!(result.insights[0].contains("decreased"));
    }

    #[test]
    fn five_percent_tier_wins_over_two_percent() {
        let mut ride = neutral_ride();
        ride.user_previous_rides = 60;
        ride.user_rating = 4.6;

        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change + 5.0).abs() < 1e-9);
        assert!(result.insights[1].contains("5%"));
    }

    #[test]
    fn frequent_rider_gets_two_percent_off() {
        let mut ride = neutral_ride();
        ride.user_previous_rides = 30;
        ride.user_rating = 4.6;

        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change + 2.0).abs() < 1e-9);
        assert!(result.insights[1].contains("2%"));
    }

    #[test]
    fn high_rating_alone_never_triggers_loyalty_tier() {
        let mut ride = neutral_ride();
        ride.user_previous_rides = 10;
        ride.user_rating = 5.0;

        let result = pricer().price(&ride).unwrap();
        assert_eq!(result.price_percent_change, 0.0);
    }

    #[test]
    fn low_rating_falls_back_to_two_percent_tier() {
        let mut ride = neutral_ride();
        ride.user_previous_rides = 60;
        ride.user_rating = 4.0;

        let result = pricer().price(&ride).unwrap();
        assert!((result.price_percent_change + 2.0).abs() < 1e-9);
    }
}

#[cfg(test)]
mod price_bounds {
    use super::*;

    #[test]
    fn vehicle_floor_holds_when_below_ceiling() {
        let mut ride = neutral_ride();
        ride.base_price = 20_500.0;
        ride.user_previous_rides = 60;
        ride.user_rating = 4.6;

        // 20500 * 0.95 = 19475, lifted to the car4 floor of 20000
        let result = pricer().price(&ride).unwrap();
        assert_eq!(result.optimal_price, 20_000);
        assert!((result.price_percent_change - (-500.0 / 20_500.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn ceiling_caps_stacked_surcharges() {
        let mut ride = neutral_ride();
        ride.base_price = 30_000.0;
        ride.area_demand = 100;
        ride.available_drivers = 1;
        ride.weather_condition = WeatherCondition::HeavyRain;
        ride.traffic_level = 10;
        ride.hour = 8;

        // 1.5 * 1.2 * 1.09 * 1.15 = 2.256x, clamped to 2.0x
        let result = pricer().price(&ride).unwrap();
        assert_eq!(result.optimal_price, 60_000);
        assert!((result.price_percent_change - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ceiling_overrides_vehicle_floor_when_they_conflict() {
        // Luxury floor is 50000 but base*2.0 is only 40000: the ceiling is
        // applied last and wins, leaving the price below the nominal floor.
        let mut ride = neutral_ride();
        ride.vehicle_type = VehicleType::Luxury;
        ride.base_price = 20_000.0;

        let result = pricer().price(&ride).unwrap();
        assert_eq!(result.optimal_price, 40_000);
        assert!((result.price_percent_change - 100.0).abs() < 1e-9);
    }
}

#[cfg(test)]
mod engine_behavior {
    use super::*;

    #[test]
    fn pricing_is_idempotent() {
        let engine = pricer();
        let mut ride = neutral_ride();
        ride.area_demand = 50;
        ride.weather_condition = WeatherCondition::Rain;

        let first = engine.price(&ride).unwrap();
        let second = engine.price(&ride).unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn model_price_is_reported_but_never_drives_the_final_price() {
        let ride = neutral_ride();

        let low = pricer_with_model(10_000.0).price(&ride).unwrap();
        let high = pricer_with_model(900_000.0).price(&ride).unwrap();

        assert_eq!(low.model_price, 10_000.0);
        assert_eq!(high.model_price, 900_000.0);
        assert_eq!(low.optimal_price, high.optimal_price);
        assert_eq!(low.price_percent_change, high.price_percent_change);
    }

    #[test]
    fn insights_follow_rule_order() {
        let mut ride = neutral_ride();
        ride.base_price = 50_000.0;
        ride.area_demand = 50;
        ride.available_drivers = 10;
        ride.weather_condition = WeatherCondition::Rain;
        ride.traffic_level = 9;
        ride.hour = 8;
        ride.user_previous_rides = 30;
        ride.user_rating = 4.0;

        let result = pricer().price(&ride).unwrap();
        assert_eq!(result.insights.len(), 6);
        assert!(result.insights[0].starts_with("Price increased"));
        assert!(result.insights[1].contains("High demand"));
        assert!(result.insights[2].contains("Rainy weather"));
        assert!(result.insights[3].contains("traffic congestion"));
        assert!(result.insights[4].contains("peak hours"));
        assert!(result.insights[5].contains("frequent rider"));
    }

    #[test]
    fn base_price_is_echoed() {
        let ride = neutral_ride();
        let result = pricer().price(&ride).unwrap();
        assert_eq!(result.base_price, ride.base_price);
    }
}

#[cfg(test)]
mod validation {
    use super::*;

    #[test]
    fn out_of_range_fields_are_rejected_before_pricing() {
        let engine = pricer();

        let mut ride = neutral_ride();
        ride.distance_km = -1.0;
        assert!(matches!(
            engine.price(&ride),
            Err(AppError::Validation(_))
        ));

        let mut ride = neutral_ride();
        ride.duration_min = 0.0;
        assert!(matches!(engine.price(&ride), Err(AppError::Validation(_))));

        let mut ride = neutral_ride();
        ride.hour = 24;
        assert!(matches!(engine.price(&ride), Err(AppError::Validation(_))));

        let mut ride = neutral_ride();
        ride.day_of_week = 7;
        assert!(matches!(engine.price(&ride), Err(AppError::Validation(_))));

        let mut ride = neutral_ride();
        ride.month = 13;
        assert!(matches!(engine.price(&ride), Err(AppError::Validation(_))));

        let mut ride = neutral_ride();
        ride.traffic_level = 11;
        assert!(matches!(engine.price(&ride), Err(AppError::Validation(_))));

        let mut ride = neutral_ride();
        ride.user_rating = 0.5;
        assert!(matches!(engine.price(&ride), Err(AppError::Validation(_))));

        let mut ride = neutral_ride();
        ride.base_price = 0.0;
        assert!(matches!(engine.price(&ride), Err(AppError::Validation(_))));
    }

    #[test]
    fn category_outside_training_distribution_is_rejected() {
        // Fit the encoder without luxury rides, then price one.
        let training: Vec<_> = training_rides()
            .into_iter()
            .filter(|r| r.vehicle_type != VehicleType::Luxury)
            .collect();
        let mut encoder = ride_pricing_api::features::FeatureEncoder::new();
        encoder.fit(&training).unwrap();
        let engine = DynamicPricer::new(
            encoder,
            Arc::new(FixedEstimator::new(50_000.0)),
            PriceConstraints::default(),
        )
        .unwrap();

        let mut ride = neutral_ride();
        ride.vehicle_type = VehicleType::Luxury;

        match engine.price(&ride) {
            Err(AppError::UnknownCategory { feature, value }) => {
                assert_eq!(feature, "vehicle_type");
                assert_eq!(value, "luxury");
            }
            other => panic!("expected UnknownCategory, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod batch_pricing {
    use super::*;

    #[test]
    fn batch_preserves_order_and_isolates_failures() {
        let engine = pricer();

        let ok_a = neutral_ride();
        let mut bad = neutral_ride();
        bad.distance_km = -3.0;
        let mut ok_b = neutral_ride();
        ok_b.traffic_level = 9;
        ok_b.base_price = 50_000.0;

        let results = engine.batch_price(&[ok_a, bad, ok_b]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().optimal_price, 75_000);
        assert!(matches!(results[1], Err(AppError::Validation(_))));
        assert_eq!(results[2].as_ref().unwrap().optimal_price, 53_000);
    }

    #[test]
    fn empty_batch_yields_empty_results() {
        assert!(pricer().batch_price(&[]).is_empty());
    }
}
