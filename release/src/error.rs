use std::path::PathBuf;

use opv_fs::FsError;
use opv_http::HttpError;
use thiserror::Error;
use url::Url;

use crate::{distribution::UnsupportedDistribution, extract::ExtractionError};

#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error(transparent)]
    Network(#[from] HttpError),

    #[error("release '{requested}' is not listed in {index}")]
    UnknownRelease { requested: String, index: Url },

    #[error("cannot build package url for '{package}' from {base}")]
    PackageUrl {
        base: Url,
        package: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot extract repository files from '{package}': {source}")]
    Extraction {
        package: String,
        #[source]
        source: ExtractionError,
    },

    #[error(transparent)]
    UnsupportedDistribution(#[from] UnsupportedDistribution),

    #[error("release package has no '{filename}' for distribution {dist}")]
    MissingDependencyFragment { filename: String, dist: String },

    #[error("cannot create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("cannot create repository file in '{dir}': {source}")]
    Persist {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fs(#[from] FsError),
}
