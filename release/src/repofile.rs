use std::io;
use std::path::{Path, PathBuf};

use opv_fs::{self as fs, FsError};
use tokio::task;
use tracing::{debug, warn};

use crate::ReleaseError;

/// A merged repository configuration file on disk.
///
/// The file outlives the resolver; removing it is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepositoryFile {
    path: PathBuf,
}

impl ResolvedRepositoryFile {
    /// Write `content` to a new, uniquely named file in `dir`.
    pub(crate) async fn persist(dir: &Path, content: &str) -> Result<Self, ReleaseError> {
        fs::create_dir(dir).await?;

        let target = dir.to_owned();
        let path = task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("opv-")
                .suffix(".repo")
                .tempfile_in(&target)
                .and_then(|file| file.keep().map_err(|err| err.error))
                .map(|(_, path)| path)
        })
        .await
        .unwrap_or_else(|err| Err(io::Error::other(err)))
        .map_err(|source| ReleaseError::Persist {
            dir: dir.to_owned(),
            source,
        })?;

        if let Err(err) = fs::write_file(&path, content.as_bytes()).await {
            discard_partial(&path).await;
            return Err(err.into());
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// The repository ids (`[section]` headers) declared in the file.
    pub async fn sections(&self) -> Result<Vec<String>, FsError> {
        let content = fs::read_file_to_string(&self.path).await?;
        Ok(repo_sections(&content))
    }
}

/// Best-effort removal of a file whose write failed. The write error is the
/// one reported; a failed cleanup is only logged.
async fn discard_partial(path: &Path) {
    match fs::remove_file_if_exists(path).await {
        Ok(true) => debug!(path = %path.display(), "removed partial repository file"),
        Ok(false) => {}
        Err(err) => warn!(
            path = %path.display(),
            error = %err,
            "cannot remove partial repository file"
        ),
    }
}

pub fn repo_sections(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('[')?.strip_suffix(']'))
        .map(str::trim)
        .filter(|section| !section.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MERGED: &str = "\
[ovirt-master-epel]
name=Extra Packages for Enterprise Linux 7
mirrorlist=https://mirrors.fedoraproject.org/metalink?repo=epel-7&arch=$basearch
enabled=1

[ovirt-master-glusterfs]
baseurl=http://buildlogs.centos.org/centos/7/storage/$basearch/gluster-3.12/
# [commented]

[ovirt-master-snapshot]
mirrorlist=http://resources.ovirt.org/pub/yum-repo/mirrorlist-ovirt-master-snapshot-el$releasever
";

    #[test]
    fn sections_in_order() {
        assert_eq!(
            repo_sections(MERGED),
            vec![
                "ovirt-master-epel",
                "ovirt-master-glusterfs",
                "ovirt-master-snapshot"
            ]
        );
    }

    #[tokio::test]
    async fn persist_creates_distinct_files() {
        let dir = tempfile::tempdir().unwrap();

        let first = ResolvedRepositoryFile::persist(dir.path(), MERGED).await.unwrap();
        let second = ResolvedRepositoryFile::persist(dir.path(), "[other]\n").await.unwrap();

        assert_ne!(first.path(), second.path());
        assert_eq!(first.path().parent(), Some(dir.path()));
        assert_eq!(fs::read_file_to_string(first.path()).await.unwrap(), MERGED);
        assert_eq!(second.sections().await.unwrap(), vec!["other"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_persists_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut tasks = task::JoinSet::new();
        for n in 0..8 {
            let dir = dir.path().to_owned();
            tasks.spawn(async move {
                ResolvedRepositoryFile::persist(&dir, &format!("[repo-{n}]\n"))
                    .await
                    .unwrap()
                    .into_path()
            });
        }

        let mut paths = tasks.join_all().await;
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);
    }

    #[tokio::test]
    async fn discard_partial_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let partial = dir.path().join("opv-partial.repo");
        fs::write_file(&partial, b"[half").await.unwrap();

        discard_partial(&partial).await;
        assert!(!fs::path_exists(&partial).await.unwrap());

        // already gone
        discard_partial(&partial).await;
    }

    #[tokio::test]
    async fn discard_partial_survives_failed_removal() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_file = dir.path().join("opv-dir.repo");
        fs::create_dir(&not_a_file).await.unwrap();

        discard_partial(&not_a_file).await;
        assert!(fs::path_exists(&not_a_file).await.unwrap());
    }

    #[tokio::test]
    async fn persist_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("repos");

        let file = ResolvedRepositoryFile::persist(&nested, "[x]\n").await.unwrap();
        assert!(file.into_path().starts_with(&nested));
    }
}
