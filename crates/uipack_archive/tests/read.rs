use std::io::{Read, Write};

use flate2::{write::DeflateEncoder, Compression};
use pretty_assertions::assert_eq;
use tracing::info;
use tracing_test::traced_test;
use uipack_archive::{error::Error, CompressionMethod, PackageArchive};

fn frame(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, data) in entries {
        out.extend_from_slice(name.as_bytes());
        out.push(b'|');
        out.extend_from_slice(data.len().to_string().as_bytes());
        out.push(b'|');
        out.extend_from_slice(data);
    }
    out
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn validate_round_trip(entries: &[(&str, &[u8])]) -> Result<(), Error> {
    info!("testing {} entries", entries.len());

    let compressed = deflate(&frame(entries))?;
    let archive = PackageArchive::new(&compressed, CompressionMethod::Deflate)?;
    assert_eq!(archive.len(), entries.len());

    for (i, (name, expected)) in entries.iter().enumerate() {
        let mut file = archive.by_index(i)?;
        assert_eq!(file.name(), *name);

        let mut actual = Vec::new();
        file.read_to_end(&mut actual)?;

        assert_eq!(expected.len(), actual.len());
        assert_eq!(*expected, actual.as_slice());
        assert_eq!(archive.get(name), Some(*expected));
    }

    Ok(())
}

#[traced_test]
#[test]
fn round_trip_empty() -> Result<(), Error> {
    validate_round_trip(&[])
}

#[traced_test]
#[test]
fn round_trip_single() -> Result<(), Error> {
    validate_round_trip(&[("package.xml", b"<packageDescription id=\"abcd1234\"/>")])
}

#[traced_test]
#[test]
fn round_trip_many() -> Result<(), Error> {
    let binary: Vec<u8> = (0..=255u8).collect();
    validate_round_trip(&[
        ("sprites.bytes", b"//id bin x y w h rotated\nn1 0 0 0 32 32 0\n"),
        ("package.xml", b"<packageDescription/>"),
        ("n2.xml", b"a|b|c"),
        ("empty.bin", b""),
        ("n3.fnt", binary.as_slice()),
    ])
}

#[traced_test]
#[test]
fn zlib_and_stored_archives() -> Result<(), Error> {
    let framed = frame(&[("a.txt", b"Hello World")]);

    let stored = PackageArchive::new(&framed, CompressionMethod::None)?;
    assert_eq!(stored.by_name("a.txt")?, b"Hello World");

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&framed)?;
    let zlib = PackageArchive::from_reader(encoder.finish()?.as_slice(), CompressionMethod::Zlib)?;
    assert_eq!(zlib.text("a.txt").as_deref(), Some("Hello World"));

    Ok(())
}

#[traced_test]
#[test]
fn truncated_record_fails_whole_archive() -> Result<(), Error> {
    let mut framed = frame(&[("a.txt", b"Hello"), ("b.txt", b"World")]);
    framed.truncate(framed.len() - 2);

    let result = PackageArchive::new(&deflate(&framed)?, CompressionMethod::Deflate);
    assert!(matches!(result, Err(Error::InvalidFraming { .. })));

    Ok(())
}
