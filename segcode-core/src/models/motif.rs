use serde::{Deserialize, Serialize};

use crate::errors::{Result, SegcodeError};

/// What a motif column reports for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotifMode {
    /// raw number of (possibly overlapping) matches
    #[default]
    Count,
    /// matches per scanned offset
    Rate,
}

///
/// A consensus motif written with IUPAC nucleotide codes, e.g. `CANNTG`.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motif {
    pub id: String,
    pub name: String,
    pub pattern: String,
    pub mode: MotifMode,
    pub both_strands: bool,
    pub column_number: usize,
}

/// Bases accepted by an IUPAC code, as a 4-bit mask over A, C, G, T.
pub fn iupac_mask(symbol: u8) -> Option<u8> {
    let mask = match symbol.to_ascii_uppercase() {
        b'A' => 0b0001,
        b'C' => 0b0010,
        b'G' => 0b0100,
        b'T' | b'U' => 0b1000,
        b'R' => 0b0101,
        b'Y' => 0b1010,
        b'S' => 0b0110,
        b'W' => 0b1001,
        b'K' => 0b1100,
        b'M' => 0b0011,
        b'B' => 0b1110,
        b'D' => 0b1101,
        b'H' => 0b1011,
        b'V' => 0b0111,
        b'N' => 0b1111,
        _ => return None,
    };
    Some(mask)
}

impl Motif {
    pub fn width(&self) -> usize {
        self.pattern.len()
    }

    ///
    /// Check the pattern is non-empty and only uses IUPAC nucleotide codes.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.pattern.is_empty() {
            return Err(SegcodeError::Config(format!(
                "motif '{}' has an empty pattern",
                self.id
            )));
        }
        if let Some(bad) = self.pattern.bytes().find(|b| iupac_mask(*b).is_none()) {
            return Err(SegcodeError::Config(format!(
                "motif '{}' contains non-IUPAC symbol '{}'",
                self.id, bad as char
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn make_motif(pattern: &str) -> Motif {
        Motif {
            id: "m".to_string(),
            name: "m".to_string(),
            pattern: pattern.to_string(),
            mode: MotifMode::Count,
            both_strands: false,
            column_number: 0,
        }
    }

    #[rstest]
    #[case("CANNTG", true)]
    #[case("acgtRYSWKMBDHVN", true)]
    #[case("", false)]
    #[case("CAX", false)]
    fn test_validate(#[case] pattern: &str, #[case] ok: bool) {
        assert_eq!(make_motif(pattern).validate().is_ok(), ok);
    }

    #[rstest]
    fn test_iupac_masks_are_unions() {
        let r = iupac_mask(b'R').unwrap();
        assert_eq!(r, iupac_mask(b'A').unwrap() | iupac_mask(b'G').unwrap());
        assert_eq!(iupac_mask(b'n'), Some(0b1111));
        assert_eq!(iupac_mask(b'X'), None);
    }
}
