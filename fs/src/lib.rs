use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

type IoError = std::io::Error;

/// A filesystem call that failed, with the path it failed on.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("cannot create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: IoError },

    #[error("cannot open '{path}': {source}")]
    OpenFile { path: PathBuf, source: IoError },

    #[error("cannot open '{path}' for writing: {source}")]
    CreateFile { path: PathBuf, source: IoError },

    #[error("cannot check whether '{path}' exists: {source}")]
    PathExists { path: PathBuf, source: IoError },

    #[error("cannot write '{path}': {source}")]
    WriteFile { path: PathBuf, source: IoError },

    #[error("cannot read '{path}': {source}")]
    ReadFile { path: PathBuf, source: IoError },

    #[error("cannot move '{from}' to '{to}': {source}")]
    RenameFile {
        from: PathBuf,
        to: PathBuf,
        source: IoError,
    },

    #[error("cannot remove '{path}': {source}")]
    RemoveFile { path: PathBuf, source: IoError },
}

impl FsError {
    /// The path the failed call was given; for a rename, the source path.
    pub fn path(&self) -> &Path {
        match self {
            FsError::CreateDir { path, .. }
            | FsError::OpenFile { path, .. }
            | FsError::CreateFile { path, .. }
            | FsError::PathExists { path, .. }
            | FsError::WriteFile { path, .. }
            | FsError::ReadFile { path, .. }
            | FsError::RemoveFile { path, .. } => path,
            FsError::RenameFile { from, .. } => from,
        }
    }
}

/// Create `path` and any missing parents.
pub async fn create_dir(path: impl AsRef<Path>) -> Result<(), FsError> {
    let path = path.as_ref();
    fs::create_dir_all(path)
        .await
        .map_err(|source| FsError::CreateDir {
            path: path.to_owned(),
            source,
        })
}

/// Open `path` for reading.
pub async fn open_file(path: impl AsRef<Path>) -> Result<File, FsError> {
    let path = path.as_ref();
    File::open(path).await.map_err(|source| FsError::OpenFile {
        path: path.to_owned(),
        source,
    })
}

/// Open `path` for writing, truncating whatever was there.
pub async fn create_file(path: impl AsRef<Path>) -> Result<File, FsError> {
    let path = path.as_ref();
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|source| FsError::CreateFile {
            path: path.to_owned(),
            source,
        })
}

pub async fn path_exists(path: impl AsRef<Path>) -> Result<bool, FsError> {
    let path = path.as_ref();
    fs::try_exists(path)
        .await
        .map_err(|source| FsError::PathExists {
            path: path.to_owned(),
            source,
        })
}

pub async fn write_file(path: impl AsRef<Path>, data: &[u8]) -> Result<(), FsError> {
    let path = path.as_ref();
    let mut file = create_file(path).await?;
    let written = match file.write_all(data).await {
        Ok(()) => file.flush().await,
        Err(err) => Err(err),
    };
    written.map_err(|source| FsError::WriteFile {
        path: path.to_owned(),
        source,
    })
}

pub async fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>, FsError> {
    let path = path.as_ref();
    fs::read(path).await.map_err(|source| FsError::ReadFile {
        path: path.to_owned(),
        source,
    })
}

pub async fn read_file_to_string(path: impl AsRef<Path>) -> Result<String, FsError> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .await
        .map_err(|source| FsError::ReadFile {
            path: path.to_owned(),
            source,
        })
}

pub async fn rename_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<(), FsError> {
    let (from, to) = (from.as_ref(), to.as_ref());
    fs::rename(from, to)
        .await
        .map_err(|source| FsError::RenameFile {
            from: from.to_owned(),
            to: to.to_owned(),
            source,
        })
}

pub async fn remove_file(path: impl AsRef<Path>) -> Result<(), FsError> {
    let path = path.as_ref();
    fs::remove_file(path)
        .await
        .map_err(|source| FsError::RemoveFile {
            path: path.to_owned(),
            source,
        })
}

/// Like [`remove_file`], but a missing file is fine. Returns whether a file
/// was removed.
pub async fn remove_file_if_exists(path: impl AsRef<Path>) -> Result<bool, FsError> {
    match remove_file(path).await {
        Ok(()) => Ok(true),
        Err(FsError::RemoveFile { source, .. }) if source.kind() == ErrorKind::NotFound => {
            Ok(false)
        }
        Err(err) => Err(err),
    }
}
