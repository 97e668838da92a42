use std::io;
use std::path::PathBuf;
use std::time::Duration;

use opv_http::{HttpClient, HttpTimeouts};
use tokio::task;
use tracing::{info, instrument};
use url::Url;

use crate::{
    ReleaseError,
    distribution::Distribution,
    extract::{Converter, DEFAULT_CONVERTER, RepositoryFragments},
    index::{ReleaseDescriptor, ReleaseEntry, available_releases},
    merge::merge_fragments,
    repofile::ResolvedRepositoryFile,
};

pub const DEFAULT_BASE_URL: &str = "http://plain.resources.ovirt.org/pub/yum-repo/";

#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    /// Directory listing that links the release packages.
    pub base_url: Url,
    pub timeouts: HttpTimeouts,
    pub converter: PathBuf,
    pub extract_timeout: Duration,
    /// Where resolved repository files are written.
    pub output_dir: PathBuf,
}

impl ReleaseOptions {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeouts: HttpTimeouts::default(),
            converter: PathBuf::from(DEFAULT_CONVERTER),
            extract_timeout: Duration::from_secs(60),
            output_dir: std::env::temp_dir(),
        }
    }
}

/// Finds a release in the index, pulls its package and produces a single
/// repository file for a target distribution.
///
/// Nothing is cached between calls; every resolution fetches the index and
/// the package again.
#[derive(Debug, Clone)]
pub struct ReleaseResolver {
    http: HttpClient,
    index_url: Url,
    converter: Converter,
    output_dir: PathBuf,
}

impl ReleaseResolver {
    pub fn new(options: ReleaseOptions) -> Result<Self, ReleaseError> {
        let ReleaseOptions {
            mut base_url,
            timeouts,
            converter,
            extract_timeout,
            output_dir,
        } = options;

        // packages are joined onto the index url, which only works for a directory
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: HttpClient::new(timeouts)?,
            index_url: base_url,
            converter: Converter::new(converter, extract_timeout),
            output_dir,
        })
    }

    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    /// Every release the index currently advertises.
    pub async fn available_releases(&self) -> Result<Vec<ReleaseEntry>, ReleaseError> {
        let index = self.http.download_content(&self.index_url).await?;
        Ok(available_releases(&index).collect())
    }

    #[instrument(skip(self))]
    pub async fn discover(&self, release_id: &str) -> Result<ReleaseDescriptor, ReleaseError> {
        let index = self.http.download_content(&self.index_url).await?;
        let descriptor = ReleaseDescriptor::find(&index, release_id).ok_or_else(|| {
            ReleaseError::UnknownRelease {
                requested: release_id.to_owned(),
                index: self.index_url.clone(),
            }
        })?;
        info!(package = descriptor.package_name(), "found release");
        Ok(descriptor)
    }

    /// Download the release package and pull the `.repo` files out of it.
    #[instrument(skip_all, fields(package = descriptor.package_name()))]
    pub async fn fetch_fragments(
        &self,
        descriptor: &ReleaseDescriptor,
    ) -> Result<RepositoryFragments, ReleaseError> {
        let package_name = descriptor.package_name();
        let url = self
            .index_url
            .join(package_name)
            .map_err(|source| ReleaseError::PackageUrl {
                base: self.index_url.clone(),
                package: package_name.to_owned(),
                source,
            })?;

        let scratch = task::spawn_blocking(tempfile::tempdir)
            .await
            .unwrap_or_else(|err| Err(io::Error::other(err)))
            .map_err(ReleaseError::Scratch)?;
        let package_path = scratch.path().join(local_file_name(package_name));

        self.http.download_file(&url, &package_path).await?;

        self.converter
            .extract(&package_path)
            .await
            .map_err(|source| ReleaseError::Extraction {
                package: package_name.to_owned(),
                source,
            })
    }

    /// Resolve `release_id` for `dist_version` (`el7`, `fc28`, ...) into a
    /// repository file owned by the caller.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        release_id: &str,
        dist_version: &str,
    ) -> Result<ResolvedRepositoryFile, ReleaseError> {
        let dist: Distribution = dist_version.parse()?;

        let descriptor = self.discover(release_id).await?;
        let fragments = self.fetch_fragments(&descriptor).await?;
        let content = merge_fragments(&fragments, &dist)?;

        let file = ResolvedRepositoryFile::persist(&self.output_dir, &content).await?;
        info!(path = %file.path().display(), "wrote repository file");
        Ok(file)
    }
}

fn local_file_name(package_name: &str) -> &str {
    package_name.rsplit('/').next().unwrap_or(package_name)
}
