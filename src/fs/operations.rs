use std::{io::ErrorKind, path::Path};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};

/// Reads a whole file while holding a shared lock on it. A missing file is not an error and reads
/// as [None].
pub async fn read_locked(path: &Path) -> Result<Option<Vec<u8>>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    file.lock_shared()?;
    let mut buffer = Vec::new();
    let result = file.read_to_end(&mut buffer).await;
    file.unlock_async().await?;
    result?;
    Ok(Some(buffer))
}

/// Replaces the contents of a file while holding an exclusive lock on it. The file is created if
/// it doesn't exist and synced to disk before the lock is released.
pub async fn overwrite_locked(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    file.lock_exclusive()?;
    let result = overwrite_with_file(&mut file, contents).await;
    file.unlock_async().await?;
    result
}

/// Read-modify-write of a whole file under a single exclusive lock. `update` receives the current
/// contents ([None] for a missing or empty file) and returns what to write back. Nothing is written
/// when `update` fails.
pub async fn update_locked<F>(path: &Path, update: F) -> anyhow::Result<()>
where
    F: FnOnce(Option<&[u8]>) -> anyhow::Result<Vec<u8>>,
{
    let mut file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    file.lock_exclusive()?;
    let result = update_with_file(&mut file, update).await;
    file.unlock_async().await?;
    result
}

async fn update_with_file<F>(file: &mut File, update: F) -> anyhow::Result<()>
where
    F: FnOnce(Option<&[u8]>) -> anyhow::Result<Vec<u8>>,
{
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer).await?;
    let current = (!buffer.is_empty()).then_some(buffer.as_slice());
    let contents = update(current)?;
    overwrite_with_file(file, &contents).await?;
    Ok(())
}

async fn overwrite_with_file(file: &mut File, contents: &[u8]) -> Result<(), io::Error> {
    // Truncating only after the lock is taken keeps concurrent readers from seeing an empty file.
    file.set_len(0).await?;
    file.rewind().await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_data().await?;
    Ok(())
}
