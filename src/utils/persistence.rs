use std::{fs, path::Path};

use crate::{core::snapshot::ProjectionSnapshot, errors::EngineError};

/// Writes the provided snapshot to disk atomically by staging to a temporary file.
pub fn save_snapshot_to_file(
    snapshot: &ProjectionSnapshot,
    path: &Path,
) -> Result<(), EngineError> {
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(&tmp, json)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Loads a snapshot from disk, returning structured errors on failure.
pub fn load_snapshot_from_file(path: &Path) -> Result<ProjectionSnapshot, EngineError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::ForecastItemRecord;
    use tempfile::tempdir;

    #[test]
    fn snapshot_survives_a_disk_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot = ProjectionSnapshot {
            items: vec![serde_json::to_value(ForecastItemRecord {
                direction: "expense".into(),
                category: "Rent".into(),
                frequency: "monthly".into(),
                amount: Some("900".into()),
                start_date: Some("2024-01-01".into()),
                ..ForecastItemRecord::default()
            })
            .unwrap()],
            ..ProjectionSnapshot::default()
        };
        save_snapshot_to_file(&snapshot, &path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let loaded = load_snapshot_from_file(&path).unwrap();
        assert_eq!(loaded.items, snapshot.items);
        assert_eq!(loaded.forecast_items().items.len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = load_snapshot_from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
