//! Types for reading package archives
//!

use indexmap::IndexMap;
use std::{
    borrow::Cow,
    fmt::{self, Debug},
    io::Read,
    ops::Range,
};
use tracing::{instrument, trace, warn};

use crate::{
    compression::CompressionMethod,
    error::{Error, FileNotFoundError, Result},
};

const DELIMITER: u8 = b'|';

/// A struct for reading an entry from a package archive
pub struct ArchiveFile<'a> {
    name: &'a str,
    offset: usize,
    data: &'a [u8],
    reader: &'a [u8],
}

impl Debug for ArchiveFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ArchiveFile({} @ {}, {} bytes)",
            self.name,
            self.offset,
            self.data.len()
        )
    }
}

/// Methods for retrieving information on archive entries
impl<'a> ArchiveFile<'a> {
    /// Get the name of the file
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this name directly when extracting an archive.
    /// It may contain an absolute path (`/etc/shadow`), or break out of the
    /// current directory (`../runtime`). Carelessly writing to these paths
    /// allows an attacker to craft an archive that will overwrite critical
    /// files.
    ///
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Get the content of the file
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Get the size of the file, in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Get the starting offset of the payload inside the decompressed stream
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Read for ArchiveFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Package archive reader
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_archive_contents(reader: impl Read) -> uipack_archive::error::Result<()> {
///     let archive = uipack_archive::PackageArchive::from_reader(
///         reader,
///         uipack_archive::CompressionMethod::Deflate,
///     )?;
///
///     for i in 0..archive.len() {
///         let mut file = archive.by_index(i)?;
///         println!("Filename: {}", file.name());
///         std::io::copy(&mut file, &mut std::io::stdout())?;
///     }
///
///     Ok(())
/// }
/// ```
pub struct PackageArchive {
    data: Vec<u8>,
    files: IndexMap<Box<str>, Range<usize>>,
}

impl Debug for PackageArchive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PackageArchive")
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

impl PackageArchive {
    /// Inflate a compressed archive and collect the files it contains.
    #[instrument(skip(compressed), fields(compressed = compressed.len()), err)]
    pub fn new(compressed: &[u8], compression: CompressionMethod) -> Result<PackageArchive> {
        Self::from_decompressed(compression.decompress(compressed)?)
    }

    /// Read a whole archive from `reader` and collect the files it contains.
    pub fn from_reader<R: Read>(
        mut reader: R,
        compression: CompressionMethod,
    ) -> Result<PackageArchive> {
        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed)?;
        Self::new(&compressed, compression)
    }

    /// Collect the files of an already inflated record stream.
    pub fn from_decompressed(data: Vec<u8>) -> Result<PackageArchive> {
        let files = split_records(&data)?;
        Ok(PackageArchive { data, files })
    }

    /// Number of entries contained in this archive.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether this archive contains no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the inflated record stream, framing included.
    pub fn decompressed_size(&self) -> usize {
        self.data.len()
    }

    /// Returns an iterator over all the file names in this archive, in archive order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_ref())
    }

    /// Get the index of a file entry by name, if it's present.
    #[inline(always)]
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        self.files.get_index_of(name)
    }

    /// Get the name of a file entry, if it's present.
    #[inline(always)]
    pub fn name_for_index(&self, index: usize) -> Option<&str> {
        self.files.get_index(index).map(|(name, _)| name.as_ref())
    }

    /// Get the content of a file, if it's present.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|range| &self.data[range.clone()])
    }

    /// Get the content of a file decoded as UTF-8, if it's present.
    ///
    /// Invalid sequences are replaced rather than rejected.
    pub fn text(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(String::from_utf8_lossy)
    }

    /// Search for a file entry by name
    pub fn by_name(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .ok_or_else(|| Error::FileNotFound(FileNotFoundError::Name(name.to_owned())))
    }

    /// Get a contained file by index
    pub fn by_index(&self, file_number: usize) -> Result<ArchiveFile<'_>> {
        let (name, range) = self
            .files
            .get_index(file_number)
            .ok_or(Error::FileNotFound(FileNotFoundError::Index(file_number)))?;

        let data = &self.data[range.clone()];
        Ok(ArchiveFile {
            name,
            offset: range.start,
            data,
            reader: data,
        })
    }
}

fn find_delimiter(data: &[u8], from: usize) -> Option<usize> {
    data[from..]
        .iter()
        .position(|b| *b == DELIMITER)
        .map(|pos| pos + from)
}

fn framing_error(offset: usize, reason: impl Into<String>) -> Error {
    Error::InvalidFraming {
        offset,
        reason: reason.into(),
    }
}

/// Split an inflated record stream into named payload ranges.
fn split_records(data: &[u8]) -> Result<IndexMap<Box<str>, Range<usize>>> {
    let mut files = IndexMap::new();
    let mut current = 0;

    while let Some(name_end) = find_delimiter(data, current) {
        let record_start = current;
        let name = &data[record_start..name_end];

        let length_start = name_end + 1;
        let Some(length_end) = find_delimiter(data, length_start) else {
            return Err(framing_error(record_start, "missing length delimiter"));
        };

        let length_raw = &data[length_start..length_end];
        let length: usize = std::str::from_utf8(length_raw)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                framing_error(
                    record_start,
                    format!(
                        "length {:?} is not a number",
                        String::from_utf8_lossy(length_raw)
                    ),
                )
            })?;

        let start = length_end + 1;
        let end = start
            .checked_add(length)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| {
                framing_error(
                    record_start,
                    format!(
                        "length {length} exceeds the {} remaining bytes",
                        data.len() - start
                    ),
                )
            })?;
        current = end;

        if name.is_empty() {
            trace!(length, "skipping unnamed record");
            continue;
        }

        let name: Box<str> = String::from_utf8_lossy(name).into();
        if files.insert(name.clone(), start..end).is_some() {
            warn!(%name, "duplicate archive entry, keeping the later one");
        }
    }

    Ok(files)
}

#[cfg(test)]
mod test {
    use std::io::prelude::*;

    use pretty_assertions::assert_eq;

    use crate::{
        error::{Error, FileNotFoundError, Result},
        read::PackageArchive,
    };

    #[test]
    fn read_empty_archive() -> Result<()> {
        let archive = PackageArchive::from_decompressed(Vec::new())?;
        assert!(archive.is_empty());
        Ok(())
    }

    #[test]
    fn read_single_entry() -> Result<()> {
        let archive = PackageArchive::from_decompressed(b"hello.txt|11|Hello World".to_vec())?;
        assert_eq!(archive.len(), 1);

        let mut file = archive.by_index(0)?;
        assert_eq!(file.name(), "hello.txt");
        assert_eq!(file.offset(), 13);
        assert_eq!(file.size(), 11);

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"Hello World".to_vec());

        Ok(())
    }

    #[test]
    fn payload_may_contain_delimiter() -> Result<()> {
        let archive =
            PackageArchive::from_decompressed(b"a.txt|3|x|yb.txt|2|zz".to_vec())?;
        assert_eq!(archive.by_name("a.txt")?, b"x|y");
        assert_eq!(archive.by_name("b.txt")?, b"zz");
        Ok(())
    }

    #[test]
    fn unnamed_record_is_skipped() -> Result<()> {
        let archive = PackageArchive::from_decompressed(b"|4|skipa.txt|1|a".to_vec())?;
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.name_for_index(0), Some("a.txt"));
        Ok(())
    }

    #[test]
    fn later_duplicate_wins() -> Result<()> {
        let archive = PackageArchive::from_decompressed(b"a|1|xa|1|y".to_vec())?;
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.get("a"), Some(&b"y"[..]));
        Ok(())
    }

    #[test]
    fn trailing_bytes_without_delimiter_are_ignored() -> Result<()> {
        let archive = PackageArchive::from_decompressed(b"a|1|xtrailing".to_vec())?;
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.get("a"), Some(&b"x"[..]));
        Ok(())
    }

    #[test]
    fn non_numeric_length_is_rejected() {
        let archive = PackageArchive::from_decompressed(b"a|one|x".to_vec());
        assert!(matches!(
            archive,
            Err(Error::InvalidFraming { offset: 0, .. })
        ));
    }

    #[test]
    fn overlong_length_is_rejected() {
        let archive = PackageArchive::from_decompressed(b"a|1|xb|10|short".to_vec());
        assert!(matches!(
            archive,
            Err(Error::InvalidFraming { offset: 5, .. })
        ));
    }

    #[test]
    fn missing_length_delimiter_is_rejected() {
        let archive = PackageArchive::from_decompressed(b"a|12".to_vec());
        assert!(matches!(archive, Err(Error::InvalidFraming { .. })));
    }

    #[test]
    fn lookups_report_missing_files() -> Result<()> {
        let archive = PackageArchive::from_decompressed(b"a|1|x".to_vec())?;
        assert!(archive.get("b").is_none());
        assert!(matches!(
            archive.by_name("b"),
            Err(Error::FileNotFound(FileNotFoundError::Name(_)))
        ));
        assert!(matches!(
            archive.by_index(1),
            Err(Error::FileNotFound(FileNotFoundError::Index(1)))
        ));
        Ok(())
    }
}
