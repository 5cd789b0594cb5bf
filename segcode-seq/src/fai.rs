use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use segcode_core::utils::is_gzipped;

use crate::errors::{Result, SequenceError};

/// One line of a samtools `.fai` index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaiEntry {
    pub name: String,
    /// bases in the sequence
    pub length: u64,
    /// byte offset of the first base
    pub offset: u64,
    pub line_bases: u64,
    /// bytes per line, line terminator included
    pub line_bytes: u64,
}

impl FaiEntry {
    /// Byte position of base `pos` (0-based) in the FASTA file.
    pub fn byte_offset(&self, pos: u64) -> u64 {
        self.offset + (pos / self.line_bases) * self.line_bytes + pos % self.line_bases
    }
}

/// The `.fai` index of a FASTA file.
#[derive(Debug, Clone, Default)]
pub struct FastaIndex {
    entries: Vec<FaiEntry>,
    by_name: HashMap<String, usize>,
}

/// `genome.fa` -> `genome.fa.fai`
pub fn fai_path(fasta: &Path) -> PathBuf {
    let mut name = fasta.as_os_str().to_owned();
    name.push(".fai");
    PathBuf::from(name)
}

impl FastaIndex {
    fn push(&mut self, entry: FaiEntry) {
        self.by_name.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    ///
    /// Parse a `.fai` file (tab-separated: name, length, offset, line bases,
    /// line bytes).
    ///
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut index = FastaIndex::default();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 5 {
                return Err(SequenceError::InvalidIndex {
                    line: i + 1,
                    reason: format!("expected 5 fields, got {}", fields.len()),
                });
            }
            let number = |field: usize| {
                fields[field]
                    .parse::<u64>()
                    .map_err(|e| SequenceError::InvalidIndex {
                        line: i + 1,
                        reason: format!("field {}: {}", field + 1, e),
                    })
            };
            let entry = FaiEntry {
                name: fields[0].to_string(),
                length: number(1)?,
                offset: number(2)?,
                line_bases: number(3)?,
                line_bytes: number(4)?,
            };
            if entry.line_bases == 0 && entry.length > 0 {
                return Err(SequenceError::InvalidIndex {
                    line: i + 1,
                    reason: "zero bases per line".to_string(),
                });
            }
            index.push(entry);
        }

        Ok(index)
    }

    ///
    /// Build the index by scanning a FASTA file. Sequence lines must all have
    /// the same width except the last one of each record.
    ///
    pub fn build(fasta: &Path) -> Result<Self> {
        if is_gzipped(fasta) {
            return Err(SequenceError::Compressed(fasta.display().to_string()));
        }

        let mut reader = BufReader::new(File::open(fasta)?);
        let mut index = FastaIndex::default();
        let mut current: Option<FaiEntry> = None;
        let mut byte_pos: u64 = 0;
        let mut line = String::new();
        let mut line_no = 0;
        let mut short_line_seen = false;

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line)? as u64;
            if bytes_read == 0 {
                break;
            }
            line_no += 1;

            if let Some(header) = line.strip_prefix('>') {
                if let Some(entry) = current.take() {
                    index.push(entry);
                }
                let name = header.split_whitespace().next().unwrap_or("").to_string();
                current = Some(FaiEntry {
                    name,
                    length: 0,
                    offset: byte_pos + bytes_read,
                    line_bases: 0,
                    line_bytes: 0,
                });
                short_line_seen = false;
            } else if let Some(entry) = current.as_mut() {
                let bases = line.trim_end_matches(['\n', '\r']).len() as u64;
                if bases > 0 {
                    if short_line_seen {
                        return Err(SequenceError::InvalidIndex {
                            line: line_no,
                            reason: format!("uneven line width in sequence '{}'", entry.name),
                        });
                    }
                    if entry.line_bases == 0 {
                        entry.line_bases = bases;
                        entry.line_bytes = bytes_read;
                    } else if bases != entry.line_bases {
                        short_line_seen = true;
                    }
                    if bases > entry.line_bases {
                        return Err(SequenceError::InvalidIndex {
                            line: line_no,
                            reason: format!("uneven line width in sequence '{}'", entry.name),
                        });
                    }
                    entry.length += bases;
                }
            }

            byte_pos += bytes_read;
        }

        if let Some(entry) = current.take() {
            index.push(entry);
        }

        log::debug!(
            "Indexed {}: {} sequences",
            fasta.display(),
            index.entries.len()
        );
        Ok(index)
    }

    ///
    /// Read `<fasta>.fai` if it exists, otherwise build the index in memory.
    ///
    pub fn load_or_build(fasta: &Path) -> Result<Self> {
        let fai = fai_path(fasta);
        if fai.is_file() {
            FastaIndex::from_file(&fai)
        } else {
            log::info!("No index at {}, scanning {}", fai.display(), fasta.display());
            FastaIndex::build(fasta)
        }
    }

    /// Write the index in samtools format.
    pub fn write<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        for e in &self.entries {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                e.name, e.length, e.offset, e.line_bases, e.line_bytes
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FaiEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[FaiEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data/genome")
            .join(file_name)
    }

    #[rstest]
    fn test_read_fai() {
        let index = FastaIndex::from_file(&get_test_path("toy.fa.fai")).unwrap();
        assert_eq!(index.len(), 2);
        let chr1 = index.get("chr1").unwrap();
        assert_eq!(chr1.length, 400);
        assert_eq!(chr1.offset, 21);
        assert_eq!(chr1.line_bases, 60);
        assert_eq!(chr1.line_bytes, 61);
        assert!(index.get("chrX").is_none());
    }

    #[rstest]
    fn test_build_matches_samtools_index() {
        let built = FastaIndex::build(&get_test_path("toy.fa")).unwrap();
        let read = FastaIndex::from_file(&get_test_path("toy.fa.fai")).unwrap();
        assert_eq!(built.entries(), read.entries());
    }

    #[rstest]
    fn test_write_round_trip() {
        let built = FastaIndex::build(&get_test_path("toy_noindex.fa")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("toy_noindex.fa.fai");
        built.write(&out).unwrap();
        let read = FastaIndex::from_file(&out).unwrap();
        assert_eq!(built.entries(), read.entries());
        assert_eq!(read.get("chr2").unwrap().length, 200);
    }

    #[rstest]
    fn test_byte_offset_skips_newlines() {
        let entry = FaiEntry {
            name: "chr1".to_string(),
            length: 400,
            offset: 21,
            line_bases: 60,
            line_bytes: 61,
        };
        assert_eq!(entry.byte_offset(0), 21);
        assert_eq!(entry.byte_offset(59), 80);
        assert_eq!(entry.byte_offset(60), 82);
    }

    #[rstest]
    fn test_fai_path() {
        assert_eq!(
            fai_path(Path::new("/g/genome.fa")),
            PathBuf::from("/g/genome.fa.fai")
        );
    }

    #[rstest]
    fn test_gzipped_genome_rejected() {
        let result = FastaIndex::build(Path::new("genome.fa.gz"));
        assert!(matches!(result, Err(SequenceError::Compressed(_))));
    }
}
