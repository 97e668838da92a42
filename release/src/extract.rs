use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use opv_cmd::{Command, CommandError};
use opv_fs::{self as fs, FsError};
use tar::Archive;
use thiserror::Error;
use tracing::{debug, instrument};

/// Converts release packages into gzipped tarballs. Run as `rpm2archive -`
/// it reads the package on stdin and writes the archive to stdout, on both
/// older releases and those that default to stdout when it is not a tty.
pub const DEFAULT_CONVERTER: &str = "rpm2archive";

const STDIO_ARG: &str = "-";

const REPO_SUFFIX: &str = ".repo";

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("package converter is not available, is rpm2archive installed?")]
    ConverterMissing(#[source] CommandError),

    #[error("package converter failed")]
    Converter(#[source] CommandError),

    #[error("package converter timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("cannot open package: {0}")]
    Package(#[source] FsError),

    #[error("package converter wrote no archive to stdout")]
    EmptyArchive,

    #[error("cannot read converted archive")]
    Archive(#[source] std::io::Error),
}

impl From<CommandError> for ExtractionError {
    fn from(error: CommandError) -> Self {
        match error {
            CommandError::NotFound { .. } => ExtractionError::ConverterMissing(error),
            CommandError::Timeout { timeout, .. } => ExtractionError::Timeout { timeout },
            error => ExtractionError::Converter(error),
        }
    }
}

/// One repository configuration file found in a release package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFragment {
    pub filename: String,
    pub content: String,
}

/// Repository files of a release package, keyed by base name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryFragments(BTreeMap<String, String>);

impl RepositoryFragments {
    pub fn insert(&mut self, fragment: RepositoryFragment) {
        let RepositoryFragment { filename, content } = fragment;
        self.0.insert(filename, content);
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.0.get(filename).map(String::as_str)
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RepositoryFragment> for RepositoryFragments {
    fn from_iter<I: IntoIterator<Item = RepositoryFragment>>(iter: I) -> Self {
        let mut fragments = Self::default();
        for fragment in iter {
            fragments.insert(fragment);
        }
        fragments
    }
}

/// The external tool that turns a release package into a readable archive.
#[derive(Debug, Clone)]
pub struct Converter {
    program: PathBuf,
    timeout: Duration,
}

impl Converter {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Convert `package` and collect the `.repo` files inside it.
    #[instrument(skip(self), fields(converter = %self.program.display()))]
    pub async fn extract(&self, package: &Path) -> Result<RepositoryFragments, ExtractionError> {
        let mut command = Command::which(&self.program)?;
        let input = fs::open_file(package)
            .await
            .map_err(ExtractionError::Package)?
            .into_std()
            .await;

        let output = command
            .arg(STDIO_ARG)
            .stdin(input)
            .run_with_timeout(self.timeout)
            .await?;
        if output.stdout.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        let fragments = read_repo_fragments(output.stdout.as_slice())?;
        debug!(
            count = fragments.len(),
            files = ?fragments.filenames().collect::<Vec<_>>(),
            "extracted repository files"
        );
        Ok(fragments)
    }
}

/// Scan a gzipped tarball for regular files ending in `.repo`.
///
/// A later entry with the same base name replaces an earlier one.
pub fn read_repo_fragments<R: Read>(reader: R) -> Result<RepositoryFragments, ExtractionError> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut fragments = RepositoryFragments::default();

    for entry in archive.entries().map_err(ExtractionError::Archive)? {
        let mut entry = entry.map_err(ExtractionError::Archive)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path().map_err(ExtractionError::Archive)?.into_owned();
        let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !filename.ends_with(REPO_SUFFIX) {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(ExtractionError::Archive)?;

        fragments.insert(RepositoryFragment {
            filename: filename.to_owned(),
            content,
        });
    }

    Ok(fragments)
}
