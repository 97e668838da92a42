use crate::{ReleaseError, distribution::Distribution, extract::RepositoryFragments};

/// Optional pre-release repositories, shipped with placeholders.
pub const SNAPSHOT_FRAGMENT: &str = "ovirt-snapshot.repo";

const DIST_PLACEHOLDER: &str = "@DIST@";
const URLKEY_PLACEHOLDER: &str = "@URLKEY@";
const URLKEY: &str = "mirrorlist";

/// The dependency repo file for `dist`, followed by the snapshot repo file
/// (placeholders filled in) when the package has one.
pub fn merge_fragments(
    fragments: &RepositoryFragments,
    dist: &Distribution,
) -> Result<String, ReleaseError> {
    let dependencies = fragments.get(dist.dependency_fragment()).ok_or_else(|| {
        ReleaseError::MissingDependencyFragment {
            filename: dist.dependency_fragment().to_owned(),
            dist: dist.version().to_owned(),
        }
    })?;

    let mut merged = dependencies.to_owned();
    if let Some(snapshot) = fragments.get(SNAPSHOT_FRAGMENT) {
        merged.push('\n');
        merged.push_str(
            &snapshot
                .replace(DIST_PLACEHOLDER, dist.family().as_str())
                .replace(URLKEY_PLACEHOLDER, URLKEY),
        );
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RepositoryFragment;

    fn fragments(files: &[(&str, &str)]) -> RepositoryFragments {
        files
            .iter()
            .map(|(filename, content)| RepositoryFragment {
                filename: filename.to_string(),
                content: content.to_string(),
            })
            .collect()
    }

    #[test]
    fn dependencies_then_substituted_snapshot() {
        let fragments = fragments(&[
            ("ovirt-el7-deps.repo", "A"),
            ("ovirt-snapshot.repo", "B @DIST@ @URLKEY@"),
        ]);
        let merged = merge_fragments(&fragments, &"el7".parse().unwrap()).unwrap();
        assert_eq!(merged, "A\nB el mirrorlist");
    }

    #[test]
    fn fedora_family_substitution() {
        let fragments = fragments(&[
            ("ovirt-f28-deps.repo", "[deps]"),
            (
                "ovirt-snapshot.repo",
                "[ovirt-snapshot]\n@URLKEY@=http://resources.ovirt.org/@DIST@$releasever",
            ),
        ]);
        let merged = merge_fragments(&fragments, &"fc28".parse().unwrap()).unwrap();
        assert_eq!(
            merged,
            "[deps]\n[ovirt-snapshot]\nmirrorlist=http://resources.ovirt.org/fc$releasever"
        );
    }

    #[test]
    fn dependencies_only() {
        let fragments = fragments(&[("ovirt-el7-deps.repo", "A\n"), ("ovirt-el8-deps.repo", "C")]);
        let merged = merge_fragments(&fragments, &"el7".parse().unwrap()).unwrap();
        assert_eq!(merged, "A\n");
    }

    #[test]
    fn missing_dependencies() {
        let fragments = fragments(&[("ovirt-snapshot.repo", "B"), ("ovirt-el8-deps.repo", "C")]);
        let err = merge_fragments(&fragments, &"el7".parse().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::MissingDependencyFragment { ref filename, ref dist }
                if filename == "ovirt-el7-deps.repo" && dist == "el7"
        ));
    }
}
