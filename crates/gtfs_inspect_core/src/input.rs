//! Feed input abstraction: a directory of CSV files or a `.zip` archive,
//! exposed as named byte streams.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::csv_reader::{read_typed_table, CsvTable};
use crate::csv_schema::schema_for_file;
use crate::csv_validation::validate_csv_data;
use crate::{NoticeContainer, ValidationNotice};

#[derive(Debug, thiserror::Error)]
pub enum GtfsInputError {
    #[error("input path does not exist: {0}")]
    MissingPath(PathBuf),
    #[error("input path is neither a directory nor a zip archive: {0}")]
    InvalidPath(PathBuf),
    #[error("failed to read {file}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open zip archive {file}")]
    ZipArchive {
        file: String,
        #[source]
        source: zip::result::ZipError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GtfsInputSource {
    Directory,
    ZipArchive,
}

/// A feed on disk, located but not yet read.
#[derive(Debug, Clone)]
pub struct GtfsInput {
    path: PathBuf,
    source: GtfsInputSource,
}

impl GtfsInput {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GtfsInputError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GtfsInputError::MissingPath(path.to_path_buf()));
        }
        if path.is_dir() {
            return Ok(Self {
                path: path.to_path_buf(),
                source: GtfsInputSource::Directory,
            });
        }
        let is_zip = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if path.is_file() && is_zip {
            return Ok(Self {
                path: path.to_path_buf(),
                source: GtfsInputSource::ZipArchive,
            });
        }
        Err(GtfsInputError::InvalidPath(path.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> GtfsInputSource {
        self.source
    }

    pub fn reader(&self) -> GtfsInputReader {
        GtfsInputReader {
            input: self.clone(),
        }
    }
}

/// Reads named files out of a [`GtfsInput`]. Lookups are case-insensitive
/// and tolerate a single wrapping directory inside zip archives.
#[derive(Debug)]
pub struct GtfsInputReader {
    input: GtfsInput,
}

impl GtfsInputReader {
    /// All candidate GTFS file names present in the input (base names only,
    /// directories skipped).
    pub fn list_files(&self) -> Result<Vec<String>, GtfsInputError> {
        match self.input.source {
            GtfsInputSource::Directory => {
                let entries = fs::read_dir(&self.input.path).map_err(|source| {
                    GtfsInputError::Io {
                        file: self.input.path.display().to_string(),
                        source,
                    }
                })?;
                let mut names = Vec::new();
                for entry in entries.flatten() {
                    if entry.path().is_file() {
                        if let Some(name) = entry.file_name().to_str() {
                            names.push(name.to_string());
                        }
                    }
                }
                names.sort();
                Ok(names)
            }
            GtfsInputSource::ZipArchive => {
                let mut archive = self.open_archive()?;
                let mut names = Vec::new();
                for index in 0..archive.len() {
                    let Ok(entry) = archive.by_index(index) else {
                        continue;
                    };
                    if entry.is_dir() {
                        continue;
                    }
                    let name = entry.name();
                    let base = name.rsplit('/').next().unwrap_or(name);
                    if !base.is_empty() {
                        names.push(base.to_string());
                    }
                }
                names.sort();
                names.dedup();
                Ok(names)
            }
        }
    }

    /// Raw bytes of one file, or `None` when it is not in the input.
    pub fn read_file_bytes(&self, file_name: &str) -> Result<Option<Vec<u8>>, GtfsInputError> {
        match self.input.source {
            GtfsInputSource::Directory => {
                let path = self.input.path.join(file_name);
                if !path.is_file() {
                    return Ok(None);
                }
                fs::read(&path)
                    .map(Some)
                    .map_err(|source| GtfsInputError::Io {
                        file: file_name.to_string(),
                        source,
                    })
            }
            GtfsInputSource::ZipArchive => {
                let mut archive = self.open_archive()?;
                let entry_name = {
                    let mut found = None;
                    for index in 0..archive.len() {
                        let Ok(entry) = archive.by_index(index) else {
                            continue;
                        };
                        if entry.is_dir() {
                            continue;
                        }
                        let name = entry.name();
                        let base = name.rsplit('/').next().unwrap_or(name);
                        if base.eq_ignore_ascii_case(file_name) {
                            found = Some(name.to_string());
                            break;
                        }
                    }
                    found
                };
                let Some(entry_name) = entry_name else {
                    return Ok(None);
                };
                let mut entry =
                    archive
                        .by_name(&entry_name)
                        .map_err(|source| GtfsInputError::ZipArchive {
                            file: file_name.to_string(),
                            source,
                        })?;
                let mut bytes = Vec::new();
                entry
                    .read_to_end(&mut bytes)
                    .map_err(|source| GtfsInputError::Io {
                        file: file_name.to_string(),
                        source,
                    })?;
                Ok(Some(bytes))
            }
        }
    }

    /// Loads one table: cell validation pass plus typed deserialization.
    /// `None` means the file is not part of the input; an empty file loads
    /// as an empty table after an `empty_file` notice.
    pub fn read_optional_csv_with_notices<T: DeserializeOwned>(
        &self,
        file_name: &str,
        notices: &mut NoticeContainer,
    ) -> Result<Option<CsvTable<T>>, GtfsInputError> {
        let Some(bytes) = self.read_file_bytes(file_name)? else {
            return Ok(None);
        };
        if is_effectively_empty(&bytes) {
            notices.push_empty_file(file_name);
            return Ok(Some(CsvTable::default()));
        }
        validate_csv_data(file_name, &bytes, notices);
        Ok(Some(read_typed_table(file_name, &bytes)))
    }

    fn open_archive(&self) -> Result<zip::ZipArchive<fs::File>, GtfsInputError> {
        let file = fs::File::open(&self.input.path).map_err(|source| GtfsInputError::Io {
            file: self.input.path.display().to_string(),
            source,
        })?;
        zip::ZipArchive::new(file).map_err(|source| GtfsInputError::ZipArchive {
            file: self.input.path.display().to_string(),
            source,
        })
    }
}

fn is_effectively_empty(bytes: &[u8]) -> bool {
    let (bytes, _) = crate::csv_reader::strip_utf8_bom(bytes);
    bytes.iter().all(|b| b.is_ascii_whitespace())
}

/// Notices about the input listing itself: files that are not part of the
/// GTFS specification.
pub fn collect_input_notices(input: &GtfsInput) -> Result<Vec<ValidationNotice>, GtfsInputError> {
    let reader = input.reader();
    let mut notices = Vec::new();
    for name in reader.list_files()? {
        if schema_for_file(&name).is_none() {
            notices.push(ValidationNotice::unknown_file(name));
        }
    }
    Ok(notices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos))
    }

    #[test]
    fn rejects_missing_paths() {
        let result = GtfsInput::from_path("/definitely/not/here");
        assert!(matches!(result, Err(GtfsInputError::MissingPath(_))));
    }

    #[test]
    fn reads_files_from_a_directory() {
        let dir = temp_dir("gtfs_input");
        fs::create_dir_all(&dir).expect("create dir");
        fs::write(dir.join("stops.txt"), "stop_id\nS1\n").expect("write");
        fs::write(dir.join("notes.md"), "scratch").expect("write");

        let input = GtfsInput::from_path(&dir).expect("input");
        let reader = input.reader();
        assert!(reader.read_file_bytes("stops.txt").unwrap().is_some());
        assert!(reader.read_file_bytes("routes.txt").unwrap().is_none());

        let notices = collect_input_notices(&input).expect("notices");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].code, "unknown_file");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_file_loads_as_empty_table_with_notice() {
        let dir = temp_dir("gtfs_empty");
        fs::create_dir_all(&dir).expect("create dir");
        fs::write(dir.join("stops.txt"), "").expect("write");

        let input = GtfsInput::from_path(&dir).expect("input");
        let mut notices = NoticeContainer::new();
        let table: Option<CsvTable<gtfs_inspect_model::Stop>> = input
            .reader()
            .read_optional_csv_with_notices("stops.txt", &mut notices)
            .expect("read");

        assert!(table.expect("table").is_empty());
        assert_eq!(notices.count("empty_file"), 1);
        assert_eq!(notices.len(), 1);

        fs::remove_dir_all(&dir).ok();
    }
}
