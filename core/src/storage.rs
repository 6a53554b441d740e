use std::path::Path;

use crate::config::AnalysisConfig;
use crate::error::ConfigError;

/// Leser analysekonfig fra disk (JSON).
/// Hvis filen ikke finnes, returneres default-konfig.
pub fn load_config(path: &str) -> Result<AnalysisConfig, ConfigError> {
    if !Path::new(path).exists() {
        log::warn!("fant ikke konfig på {path}, bruker default");
        return Ok(AnalysisConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    let cfg = AnalysisConfig::from_json_str(&contents)?;
    log::info!("konfig lastet fra {path}");
    Ok(cfg)
}

/// Lagrer konfig til disk som JSON (pretty-print).
pub fn save_config(cfg: &AnalysisConfig, path: &str) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(cfg).map_err(|e| ConfigError::Parse {
        location: ".".to_string(),
        message: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    log::info!("konfig lagret til {path}");
    Ok(())
}
