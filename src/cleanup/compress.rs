//! Gzip compression of rotated backups. Keeps the content for forensics while
//! reclaiming most of the space.

use super::files::compressed_path;
use crate::Error;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Writes `<path>.gz`, removes the original, and returns the bytes saved.
///
/// An existing `.gz` is never replaced; the backup stays uncompressed instead. A half-written
/// `.gz` is removed on failure so the next pass starts clean.
pub(super) fn compress_file(path: &Path) -> Result<(PathBuf, u64), Error> {
    let gz_path = compressed_path(path);
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&gz_path)?;
    match write_gzip(path, output, &gz_path) {
        Ok(saved) => Ok((gz_path, saved)),
        Err(e) => {
            let _ = fs::remove_file(&gz_path);
            Err(e)
        }
    }
}

fn write_gzip(path: &Path, output: File, gz_path: &Path) -> Result<u64, Error> {
    let input = File::open(path)?;
    let original_size = input.metadata()?.len();
    let mut reader = BufReader::new(input);

    let writer = BufWriter::new(output);
    let mut encoder = GzEncoder::new(writer, Compression::default());

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        encoder.write_all(&buffer[..bytes_read])?;
    }
    encoder.finish()?.flush()?;

    let compressed_size = fs::metadata(gz_path)?.len();
    let saved = original_size.saturating_sub(compressed_size);

    fs::remove_file(path)?;

    Ok(saved)
}
