use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use flate2::{Compression, write::GzEncoder};
use tar::{Builder, EntryType, Header};

/// Fake converter body that behaves like `rpm2archive -`: package on stdin,
/// archive on stdout. It refuses any other argument and a tty stdout, as
/// current rpm releases only write to stdout when it is not a terminal.
pub(crate) const STDOUT_CONVERTER: &str = "[ \"$1\" = - ] || exit 2\n[ -t 1 ] && exit 3\ncat";

/// A gzipped tarball holding `files` as `(path, content)` pairs.
pub(crate) fn tgz(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content) in files {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// An executable shell script named `fake-rpm2archive` in `dir`.
pub(crate) fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-rpm2archive");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "#!/bin/sh\n{body}").unwrap();
    drop(file);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
