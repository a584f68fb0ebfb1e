use crate::records::{EnrichedRecord, ListingRecord};
use crate::storage::StorageResult;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Reads a listings CSV into memory
///
/// The file must carry the `ListingRecord` header row; empty cells
/// deserialize to `None`.
pub fn load_listings(path: &Path) -> StorageResult<Vec<ListingRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Writes the full record sequence to a listings CSV
///
/// Used for both checkpoints and the final output; the previous file is
/// replaced atomically.
pub fn save_listings(path: &Path, records: &[ListingRecord]) -> StorageResult<()> {
    write_atomically(path, records)
}

/// Writes the enriched record sequence to CSV
pub fn save_enriched(path: &Path, records: &[EnrichedRecord]) -> StorageResult<()> {
    write_atomically(path, records)
}

fn write_atomically<T: Serialize>(path: &Path, records: &[T]) -> StorageResult<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record(title: &str) -> ListingRecord {
        ListingRecord {
            title: Some(title.to_string()),
            listing_url: Some("https://www.magicbricks.com/x?id=abc1".to_string()),
            area_raw: Some("1450 sqft".to_string()),
            status: None,
            floor: Some("3 out of 12".to_string()),
            transaction: None,
            furnishing: None,
            facing: None,
            bhk: Some(3),
            locality: Some("Sector 62".to_string()),
            property_id: Some("abc1".to_string()),
            scraped_timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            price_raw: Some("\u{20b9}85 Lacs".to_string()),
        }
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        let records = vec![sample_record("3 BHK Flat in Sector 62"), sample_record("b")];

        save_listings(&path, &records).unwrap();
        let loaded = load_listings(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_resave_is_byte_identical() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        let records = vec![sample_record("3 BHK Flat in Sector 62")];

        save_listings(&first, &records).unwrap();
        let reloaded = load_listings(&first).unwrap();
        save_listings(&second, &reloaded).unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        save_listings(&path, &[sample_record("a")]).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = load_listings(&dir.path().join("absent.csv"));
        assert!(result.is_err());
    }
}
