use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use segcode_core::models::Segment;
use segcode_core::utils::is_gzipped;

use crate::errors::{Result, SequenceError};
use crate::fai::{FaiEntry, FastaIndex};

///
/// Read access to a reference genome. Coordinates are 0-based half-open;
/// returned bases are upper-case.
///
pub trait SequenceAccessor: Send + Sync {
    fn fetch(&self, chr: &str, start: u64, end: u64) -> Result<Vec<u8>>;

    fn chrom_length(&self, chr: &str) -> Option<u64>;

    /// The bases under a segment.
    fn fetch_segment(&self, segment: &Segment) -> Result<Vec<u8>> {
        self.fetch(&segment.chr, segment.start as u64, segment.end as u64)
    }
}

fn check_bounds(chr: &str, start: u64, end: u64, length: u64) -> Result<()> {
    if start > end || end > length {
        return Err(SequenceError::OutOfBounds {
            chr: chr.to_string(),
            start,
            end,
            length,
        });
    }
    Ok(())
}

///
/// A FASTA file read through its `.fai` index. Reads go through one file
/// handle guarded by a mutex.
///
#[derive(Debug)]
pub struct IndexedFasta {
    path: PathBuf,
    index: FastaIndex,
    file: Mutex<File>,
}

impl TryFrom<&Path> for IndexedFasta {
    type Error = SequenceError;

    fn try_from(path: &Path) -> Result<Self> {
        if is_gzipped(path) {
            return Err(SequenceError::Compressed(path.display().to_string()));
        }
        let index = FastaIndex::load_or_build(path)?;
        let file = File::open(path)?;
        log::info!(
            "Opened reference genome {} ({} sequences)",
            path.display(),
            index.len()
        );
        Ok(IndexedFasta {
            path: path.to_path_buf(),
            index,
            file: Mutex::new(file),
        })
    }
}

impl IndexedFasta {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> &FastaIndex {
        &self.index
    }

    fn entry(&self, chr: &str) -> Result<&FaiEntry> {
        self.index
            .get(chr)
            .ok_or_else(|| SequenceError::UnknownChrom(chr.to_string()))
    }
}

impl SequenceAccessor for IndexedFasta {
    fn fetch(&self, chr: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let entry = self.entry(chr)?;
        check_bounds(chr, start, end, entry.length)?;
        if start == end {
            return Ok(Vec::new());
        }

        let first = entry.byte_offset(start);
        // last base is end - 1; read through it
        let last = entry.byte_offset(end - 1) + 1;
        let mut raw = vec![0u8; (last - first) as usize];

        {
            let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
            file.seek(SeekFrom::Start(first))?;
            file.read_exact(&mut raw)?;
        }

        let mut bases: Vec<u8> = raw
            .into_iter()
            .filter(|b| *b != b'\n' && *b != b'\r')
            .collect();
        bases.make_ascii_uppercase();

        if bases.len() as u64 != end - start {
            return Err(SequenceError::InvalidIndex {
                line: 0,
                reason: format!(
                    "index of {} does not match its content around {}:{}",
                    self.path.display(),
                    chr,
                    start
                ),
            });
        }
        Ok(bases)
    }

    fn chrom_length(&self, chr: &str) -> Option<u64> {
        self.index.get(chr).map(|e| e.length)
    }
}

///
/// A genome held in memory, for small references and tests.
///
#[derive(Debug, Clone, Default)]
pub struct InMemoryGenome {
    seq_map: HashMap<String, Vec<u8>>,
}

impl InMemoryGenome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chr: &str, bases: &[u8]) {
        self.seq_map
            .insert(chr.to_string(), bases.to_ascii_uppercase());
    }
}

impl<'a> FromIterator<(&'a str, &'a [u8])> for InMemoryGenome {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a [u8])>>(iter: T) -> Self {
        let mut genome = InMemoryGenome::new();
        for (chr, bases) in iter {
            genome.insert(chr, bases);
        }
        genome
    }
}

impl SequenceAccessor for InMemoryGenome {
    fn fetch(&self, chr: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let seq = self
            .seq_map
            .get(chr)
            .ok_or_else(|| SequenceError::UnknownChrom(chr.to_string()))?;
        check_bounds(chr, start, end, seq.len() as u64)?;
        Ok(seq[start as usize..end as usize].to_vec())
    }

    fn chrom_length(&self, chr: &str) -> Option<u64> {
        self.seq_map.get(chr).map(|s| s.len() as u64)
    }
}
