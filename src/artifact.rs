/// Persistence of the trained pricing system.
///
/// The fitted encoder and trained estimator travel together as one artifact
/// directory: `system.json` holds the encoder state, feature importance and
/// dimensions; `model.safetensors` holds the model weights. The layout is an
/// implementation detail with no cross-version compatibility guarantee.
use crate::errors::AppError;
use crate::estimator::{BasePriceEstimator, PriceModel};
use crate::features::FeatureEncoder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const MANIFEST_FILE: &str = "system.json";
const WEIGHTS_FILE: &str = "model.safetensors";

#[derive(Serialize, Deserialize)]
struct SystemManifest {
    input_dim: usize,
    encoder: FeatureEncoder,
    importance: Vec<(String, f64)>,
}

/// Writes the fitted encoder and trained model to `dir`, creating it if
/// needed.
pub fn save_system(
    dir: &Path,
    encoder: &FeatureEncoder,
    model: &PriceModel,
) -> Result<(), AppError> {
    let input_dim = encoder.dim()?;
    fs::create_dir_all(dir)?;

    let manifest = SystemManifest {
        input_dim,
        encoder: encoder.clone(),
        importance: model.feature_importance().to_vec(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(dir.join(MANIFEST_FILE), json)?;

    model.save_weights(&dir.join(WEIGHTS_FILE))?;

    tracing::info!("Pricing system saved to {}", dir.display());
    Ok(())
}

/// Loads the pricing system saved by `save_system`.
///
/// A missing artifact is a `NotFitted` error: the process cannot serve
/// prices and the operator must run the `train_model` binary first.
pub fn load_system(dir: &Path) -> Result<(FeatureEncoder, PriceModel), AppError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(AppError::NotFitted(format!(
            "pricing system artifact not found at {}; run the train_model binary first",
            dir.display()
        )));
    }

    let json = fs::read_to_string(&manifest_path)?;
    let manifest: SystemManifest = serde_json::from_str(&json)?;

    if manifest.encoder.dim()? != manifest.input_dim {
        return Err(AppError::InternalError(format!(
            "artifact manifest is inconsistent: encoder has {} features, model expects {}",
            manifest.encoder.dim()?,
            manifest.input_dim
        )));
    }

    let mut model = PriceModel::new(manifest.input_dim)?;
    model.load_weights(&dir.join(WEIGHTS_FILE))?;
    model.set_importance(manifest.importance);

    tracing::info!(
        "Pricing system loaded from {} ({} encoded features)",
        dir.display(),
        manifest.input_dim
    );
    Ok((manifest.encoder, model))
}
