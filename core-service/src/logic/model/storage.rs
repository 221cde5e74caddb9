//! Model bundle on disk
//!
//! One JSON document: `{format_version, checksum, model}` where `checksum` is
//! the SHA-256 (hex) of the serialized `model` value. Writes go to a sibling
//! temp file first and are renamed over the destination.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::TrainedModel;
use crate::error::{CoreError, CoreResult};

pub const BUNDLE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Bundle {
    format_version: u32,
    checksum: String,
    model: serde_json::Value,
}

fn checksum(model: &serde_json::Value) -> CoreResult<String> {
    let bytes = serde_json::to_vec(model)
        .map_err(|e| CoreError::Persistence(format!("cannot serialize model: {}", e)))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `model` to `path`, replacing any previous bundle atomically
pub fn persist(model: &TrainedModel, path: &Path) -> CoreResult<()> {
    let io_err = |what: &str, e: std::io::Error| {
        CoreError::Persistence(format!("{} {}: {}", what, path.display(), e))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_err("cannot create directory for", e))?;
    }

    let value = serde_json::to_value(model)
        .map_err(|e| CoreError::Persistence(format!("cannot serialize model: {}", e)))?;
    let bundle = Bundle {
        format_version: BUNDLE_FORMAT_VERSION,
        checksum: checksum(&value)?,
        model: value,
    };
    let json = serde_json::to_vec(&bundle)
        .map_err(|e| CoreError::Persistence(format!("cannot serialize bundle: {}", e)))?;

    let tmp = temp_path(path);
    fs::write(&tmp, json).map_err(|e| io_err("cannot write", e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err("cannot replace", e));
    }

    log::info!("Model {} saved to {}", model.run_id, path.display());
    Ok(())
}

/// Read and verify a bundle written by [`persist`]
pub fn load(path: &Path) -> CoreResult<TrainedModel> {
    let data = fs::read(path).map_err(|e| {
        CoreError::Persistence(format!("cannot read model {}: {}", path.display(), e))
    })?;

    let bundle: Bundle = serde_json::from_slice(&data)
        .map_err(|e| CoreError::Persistence(format!("malformed model bundle: {}", e)))?;

    if bundle.format_version != BUNDLE_FORMAT_VERSION {
        return Err(CoreError::Persistence(format!(
            "unsupported bundle version {} (expected {})",
            bundle.format_version, BUNDLE_FORMAT_VERSION
        )));
    }

    let actual = checksum(&bundle.model)?;
    if actual != bundle.checksum {
        return Err(CoreError::Persistence(format!(
            "checksum mismatch: stored {}, computed {}",
            bundle.checksum, actual
        )));
    }

    let model: TrainedModel = serde_json::from_value(bundle.model)
        .map_err(|e| CoreError::Persistence(format!("malformed model payload: {}", e)))?;
    model.validate()?;

    log::info!(
        "Model {} loaded from {} ({} trees, {} columns)",
        model.run_id,
        path.display(),
        model.forest.tree_count(),
        model.schema.len()
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::synthetic::generate;
    use crate::logic::model::{train_labeled, Hyperparameters};
    use tempfile::tempdir;

    fn small_model() -> TrainedModel {
        let params = Hyperparameters {
            tree_count: 10,
            ..Default::default()
        };
        train_labeled(&generate(150, 3), &params).unwrap().0
    }

    #[test]
    fn test_round_trip_predicts_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models").join("model.json");
        let model = small_model();

        persist(&model, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, model);
        for row in generate(50, 77) {
            assert_eq!(
                loaded.predict(&row.record).unwrap(),
                model.predict(&row.record).unwrap()
            );
        }
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_persist_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");

        let first = small_model();
        persist(&first, &path).unwrap();
        let second = small_model();
        persist(&second, &path).unwrap();

        assert_eq!(load(&path).unwrap().run_id, second.run_id);
    }

    #[test]
    fn test_corrupted_bundle_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        persist(&small_model(), &path).unwrap();

        // Tamper with the payload but keep the stored checksum
        let mut bundle: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        bundle["model"]["training_rows"] = serde_json::json!(1);
        fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert!(err.to_string().contains("checksum"));

        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(load(&path), Err(CoreError::Persistence(_))));

        fs::write(&path, b"").unwrap();
        assert!(matches!(load(&path), Err(CoreError::Persistence(_))));
    }

    #[test]
    fn test_schema_tampering_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        persist(&small_model(), &path).unwrap();

        // Rewrite a column and recompute the bundle checksum: the layout hash still catches it
        let mut bundle: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        bundle["model"]["schema"]["columns"][0] = serde_json::json!("Sex_X");
        bundle["checksum"] = serde_json::json!(checksum(&bundle["model"]).unwrap());
        fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();

        assert!(matches!(load(&path), Err(CoreError::Persistence(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        persist(&small_model(), &path).unwrap();

        let mut bundle: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        bundle["format_version"] = serde_json::json!(99);
        fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("absent.json")),
            Err(CoreError::Persistence(_))
        ));
    }
}
