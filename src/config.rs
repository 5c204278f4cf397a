use crate::models::PriceConstraints;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Directory holding the trained pricing-system artifact
    /// (encoder state + model weights), produced by the `train_model` binary.
    pub artifact_dir: String,
    /// Price bounds applied by the pricing engine. Immutable after startup
    /// and passed explicitly into the engine at construction.
    pub constraints: PriceConstraints,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            artifact_dir: std::env::var("PRICING_ARTIFACT_DIR")
                .unwrap_or_else(|_| "pricing_system".to_string())
                .trim()
                .to_string(),
            constraints: constraints_from_env()?,
        };

        if config.artifact_dir.is_empty() {
            anyhow::bail!("PRICING_ARTIFACT_DIR cannot be empty");
        }

        // Log successful configuration load
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Artifact directory: {}", config.artifact_dir);
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!(
            "Price multipliers: {} - {}",
            config.constraints.min_multiplier,
            config.constraints.max_multiplier
        );

        Ok(config)
    }
}

/// Builds the price constraints, allowing the relative multipliers to be
/// overridden via environment variables. The per-vehicle floors are fixed
/// business values and always come from the defaults.
fn constraints_from_env() -> anyhow::Result<PriceConstraints> {
    let mut constraints = PriceConstraints::default();

    if let Ok(raw) = std::env::var("PRICE_MIN_MULTIPLIER") {
        constraints.min_multiplier = raw
            .parse::<f64>()
            .map_err(|_| anyhow::anyhow!("PRICE_MIN_MULTIPLIER must be a number"))
            .and_then(|m| {
                if m <= 0.0 || m > 1.0 {
                    anyhow::bail!("PRICE_MIN_MULTIPLIER must be in (0, 1]");
                }
                Ok(m)
            })?;
    }

    if let Ok(raw) = std::env::var("PRICE_MAX_MULTIPLIER") {
        constraints.max_multiplier = raw
            .parse::<f64>()
            .map_err(|_| anyhow::anyhow!("PRICE_MAX_MULTIPLIER must be a number"))
            .and_then(|m| {
                if m < 1.0 {
                    anyhow::bail!("PRICE_MAX_MULTIPLIER must be >= 1.0");
                }
                Ok(m)
            })?;
    }

    if constraints.min_multiplier > constraints.max_multiplier {
        anyhow::bail!("PRICE_MIN_MULTIPLIER cannot exceed PRICE_MAX_MULTIPLIER");
    }

    Ok(constraints)
}
