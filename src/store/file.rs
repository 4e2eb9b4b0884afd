use super::memory::StoreData;
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::Path;

/// Load the marketplace dataset from a JSON file.
///
/// A missing file yields an empty dataset so a fresh deployment starts
/// clean. An unsupported version is an error.
pub fn load_store(path: &Path) -> Result<StoreData> {
    if !path.exists() {
        return Ok(StoreData::default());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open store file at {}", path.display()))?;

    let data: StoreData = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse store file at {}", path.display()))?;

    if data.version != 1 {
        anyhow::bail!("Unsupported store file version: {}", data.version);
    }

    Ok(data)
}

/// Save the dataset atomically so a crash mid-write never leaves a
/// half-written store behind.
pub fn save_store(path: &Path, data: &StoreData) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, data).context("Failed to serialize store data")?;

    file.commit().context("Failed to save store file")?;

    Ok(())
}
