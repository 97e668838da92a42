use std::sync::LazyLock;

use regex::Regex;

// Some release packages carry a separator before the version and some do not
// (`ovirt-release-4.3.0.rpm`, `ovirt-release44.rpm`); both are listed.
static RELEASE_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"](ovirt-release-?([^'"]+)\.rpm)['"]"#).expect("release package pattern")
});

/// A release package advertised by the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub package: String,
    pub version: String,
}

/// Every release package linked from `index`, in document order.
pub fn available_releases(index: &str) -> impl Iterator<Item = ReleaseEntry> + '_ {
    RELEASE_PACKAGE
        .captures_iter(index)
        .map(|captures| ReleaseEntry {
            package: captures[1].to_owned(),
            version: captures[2].to_owned(),
        })
}

/// A release known to exist in the index. Only obtainable through
/// [`ReleaseDescriptor::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    requested_version: String,
    resolved_version: String,
    package_name: String,
}

impl ReleaseDescriptor {
    /// The first entry of `index` whose version is exactly `requested`.
    pub fn find(index: &str, requested: &str) -> Option<Self> {
        available_releases(index)
            .find(|entry| entry.version == requested)
            .map(|ReleaseEntry { package, version }| Self {
                requested_version: requested.to_owned(),
                resolved_version: version,
                package_name: package,
            })
    }

    pub fn requested_version(&self) -> &str {
        &self.requested_version
    }

    pub fn resolved_version(&self) -> &str {
        &self.resolved_version
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"<html><body>
<a href="ovirt-release-4.3.0.rpm">ovirt-release-4.3.0.rpm</a> 2019-02-04
<a href="ovirt-release44.rpm">ovirt-release44.rpm</a> 2020-05-20
<a href='ovirt-release-master.rpm'>ovirt-release-master.rpm</a>
<a href="ovirt-release44-pre.rpm.sig">signature</a>
<a href="other-release-1.rpm">unrelated</a>
</body></html>"#;

    fn entry(package: &str, version: &str) -> ReleaseEntry {
        ReleaseEntry {
            package: package.into(),
            version: version.into(),
        }
    }

    #[test]
    fn both_filename_shapes_in_document_order() {
        let index = r#"href="ovirt-release-4.3.0.rpm" href="ovirt-release44.rpm""#;
        assert_eq!(
            available_releases(index).collect::<Vec<_>>(),
            vec![
                entry("ovirt-release-4.3.0.rpm", "4.3.0"),
                entry("ovirt-release44.rpm", "44"),
            ]
        );
    }

    #[test]
    fn ignores_unquoted_and_unrelated_links() {
        let versions: Vec<_> = available_releases(INDEX).map(|e| e.version).collect();
        assert_eq!(versions, vec!["4.3.0", "44", "master"]);
    }

    #[test]
    fn find_release() {
        let descriptor = ReleaseDescriptor::find(INDEX, "master").unwrap();
        assert_eq!(descriptor.requested_version(), "master");
        assert_eq!(descriptor.resolved_version(), "master");
        assert_eq!(descriptor.package_name(), "ovirt-release-master.rpm");
    }

    #[test]
    fn find_first_match_wins() {
        let index = r#""ovirt-release-44.rpm" "ovirt-release44.rpm""#;
        let descriptor = ReleaseDescriptor::find(index, "44").unwrap();
        assert_eq!(descriptor.package_name(), "ovirt-release-44.rpm");
    }

    #[test]
    fn find_unknown_release() {
        assert_eq!(ReleaseDescriptor::find(INDEX, "4.2"), None);
        assert_eq!(ReleaseDescriptor::find("", "master"), None);
    }
}
