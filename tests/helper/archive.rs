//! Archive test utilities

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Entry of a test archive
pub enum TarEntry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8], u32),
}

/// Build a gzip-compressed tar archive from the given entries
pub fn tar_gz(entries: &[TarEntry<'_>]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in entries {
        let mut header = tar::Header::new_gnu();
        match entry {
            TarEntry::Dir(path) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .unwrap();
            }
            TarEntry::File(path, content, mode) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(content.len() as u64);
                header.set_mode(*mode);
                header.set_cksum();
                builder.append_data(&mut header, path, *content).unwrap();
            }
        }
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// Gzip arbitrary bytes without a tar layer
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}
