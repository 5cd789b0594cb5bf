use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use segcode_core::models::SegmentSet;

pub trait BedWrite {
    ///
    /// Write segments to disk as bed file: chr, start, end, code
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    fn write_bed<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()>;

    ///
    /// Write segments to disk as bed.gz file
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    fn write_bed_gz<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()>;
}

fn write_segments<W: Write>(writer: &mut W, set: &SegmentSet) -> std::io::Result<()> {
    for segment in &set.segments {
        writeln!(writer, "{}", segment)?;
    }
    Ok(())
}

fn create_with_parent(path: &Path) -> std::io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

impl BedWrite for SegmentSet {
    fn write_bed<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()> {
        let mut writer = create_with_parent(path.as_ref())?;
        write_segments(&mut writer, self)?;
        writer.flush()
    }

    fn write_bed_gz<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()> {
        let writer = create_with_parent(path.as_ref())?;
        let mut encoder = GzEncoder::new(writer, Compression::best());
        write_segments(&mut encoder, self)?;
        // finish() hands back the BufWriter with the gzip trailer still buffered
        encoder.finish()?.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::{BufRead, Read};

    use segcode_core::models::Segment;
    use segcode_core::utils::get_dynamic_reader;

    fn make_set() -> SegmentSet {
        SegmentSet {
            segments: vec![
                Segment::new("chr1", 0, 50, 1),
                Segment::new("chr1", 50, 100, 3),
                Segment::new("chr2", 10, 20, 2),
            ],
            min_segment_length: 1,
            dataset_count: 2,
            dropped_peaks: 0,
        }
    }

    #[rstest]
    fn test_write_bed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/segments.bed");
        make_set().write_bed(&path).unwrap();

        let mut content = String::new();
        File::open(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "chr1\t0\t50\t1\nchr1\t50\t100\t3\nchr2\t10\t20\t2\n");
    }

    #[rstest]
    fn test_write_bed_gz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.bed.gz");
        make_set().write_bed_gz(&path).unwrap();

        let lines: Vec<String> = get_dynamic_reader(&path)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(
            lines,
            vec!["chr1\t0\t50\t1", "chr1\t50\t100\t3", "chr2\t10\t20\t2"]
        );
    }

    #[rstest]
    fn test_write_bed_gz_is_complete_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/segments.bed.gz");
        make_set().write_bed_gz(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        // gzip trailer: uncompressed size, little endian
        let size = u32::from_le_bytes(bytes[bytes.len() - 4..].try_into().unwrap());
        assert_eq!(size as usize, "chr1\t0\t50\t1\nchr1\t50\t100\t3\nchr2\t10\t20\t2\n".len());
    }
}
