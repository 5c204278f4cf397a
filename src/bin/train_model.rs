//! Trains the ride pricing system from historical ride data and saves the
//! serving artifact.
//!
//! Usage: `train_model <rides.json> [artifact_dir]`
//!
//! The input file is a JSON array of ride records in the same shape as
//! `RideRequest`; the observed base fare is the regression target.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use ride_pricing_api::artifact;
use ride_pricing_api::estimator::{BasePriceEstimator, PriceModel, TrainParams};
use ride_pricing_api::features::FeatureEncoder;
use ride_pricing_api::models::RideRequest;
use std::path::Path;

fn encode_all(encoder: &FeatureEncoder, rides: &[RideRequest]) -> anyhow::Result<Vec<Vec<f64>>> {
    let mut rows = Vec::with_capacity(rides.len());
    for ride in rides {
        rows.push(encoder.transform(ride)?);
    }
    Ok(rows)
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let data_path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: train_model <rides.json> [artifact_dir]"))?;
    let artifact_dir = args.next().unwrap_or_else(|| "pricing_system".to_string());

    println!("===== Training the dynamic ride pricing system =====");

    // 1. Load historical rides
    let raw = std::fs::read_to_string(&data_path)?;
    let mut rides: Vec<RideRequest> = serde_json::from_str(&raw)?;
    for (i, ride) in rides.iter().enumerate() {
        ride.validate()
            .map_err(|e| anyhow::anyhow!("ride {}: {}", i, e))?;
    }
    println!("Loaded {} historical rides from {}", rides.len(), data_path);

    // 2. Train/test split (80/20)
    let mut rng = StdRng::seed_from_u64(42);
    rides.shuffle(&mut rng);
    let split = (rides.len() * 4) / 5;
    if split == 0 || split == rides.len() {
        anyhow::bail!("need at least 5 rides to split into train/test sets");
    }
    let (train, test) = rides.split_at(split);
    println!(
        "Training set: {} rides, test set: {} rides",
        train.len(),
        test.len()
    );

    // 3. Fit the feature encoder and encode both splits
    let mut encoder = FeatureEncoder::new();
    encoder.fit(train)?;
    let x_train = encode_all(&encoder, train)?;
    let x_test = encode_all(&encoder, test)?;
    println!("Encoded features: {}", encoder.dim()?);

    // 4. Train the base-price model
    let y_train: Vec<f64> = train.iter().map(|r| r.base_price).collect();
    let y_test: Vec<f64> = test.iter().map(|r| r.base_price).collect();

    let mut model = PriceModel::new(encoder.dim()?)?;
    let loss = model.fit(&x_train, &y_train, TrainParams::default())?;
    println!("Final training loss (mse, thousands): {:.4}", loss);

    let train_metrics = model.evaluate(&x_train, &y_train)?;
    let test_metrics = model.evaluate(&x_test, &y_test)?;
    println!(
        "Training set:  MAE {:.0}  MAPE {:.2}%  R2 {:.4}",
        train_metrics.mae, train_metrics.mape, train_metrics.r2
    );
    println!(
        "Test set:      MAE {:.0}  MAPE {:.2}%  R2 {:.4}",
        test_metrics.mae, test_metrics.mape, test_metrics.r2
    );

    // 5. Permutation feature importance on the held-out split
    let names = encoder.feature_names()?.to_vec();
    model.compute_feature_importance(&x_test, &y_test, &names, 42)?;
    println!("Top features:");
    for (feature, score) in model.feature_importance().iter().take(5) {
        println!("  - {}: {:.2}", feature, score);
    }

    // 6. Save the serving artifact
    artifact::save_system(Path::new(&artifact_dir), &encoder, &model)?;
    println!("Pricing system saved to {}", artifact_dir);

    Ok(())
}
