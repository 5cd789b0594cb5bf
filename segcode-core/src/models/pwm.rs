//! Position weight matrix definitions and the JASPAR text format.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SegcodeError};

/// How the per-offset scores of one sequence are folded into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PwmAggregate {
    #[default]
    Max,
    /// sum of the positive log-odds windows
    Sum,
    Mean,
}

///
/// A position weight matrix over A, C, G, T. `rows[pos] = [a, c, g, t]`.
///
/// When `normalized` is false the rows hold counts (or unnormalised weights)
/// and must go through [PositionWeightMatrix::normalize] before scoring.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionWeightMatrix {
    pub id: String,
    pub name: String,
    pub rows: Vec<[f64; 4]>,
    pub normalized: bool,
    pub aggregate: PwmAggregate,
    pub both_strands: bool,
    pub column_number: usize,
}

impl PositionWeightMatrix {
    pub fn new(id: &str, name: &str, rows: Vec<[f64; 4]>) -> Self {
        PositionWeightMatrix {
            id: id.to_string(),
            name: name.to_string(),
            rows,
            normalized: false,
            aggregate: PwmAggregate::default(),
            both_strands: false,
            column_number: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.rows.len()
    }

    ///
    /// Turn count rows into probabilities, adding `pseudocount` to every cell.
    /// Does nothing on an already normalized matrix.
    ///
    pub fn normalize(&mut self, pseudocount: f64) -> Result<()> {
        if self.normalized {
            return Ok(());
        }
        self.validate()?;

        for row in self.rows.iter_mut() {
            let total: f64 = row.iter().sum::<f64>() + 4.0 * pseudocount;
            for cell in row.iter_mut() {
                *cell = (*cell + pseudocount) / total;
            }
        }
        self.normalized = true;
        Ok(())
    }

    ///
    /// Check the matrix has at least one position, no negative cells and a
    /// positive weight in every row.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.rows.is_empty() {
            return Err(SegcodeError::MatrixParseError(format!(
                "matrix '{}' has no positions",
                self.id
            )));
        }
        for (pos, row) in self.rows.iter().enumerate() {
            if row.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(SegcodeError::MatrixParseError(format!(
                    "matrix '{}': negative or non-finite value at position {}",
                    self.id, pos
                )));
            }
            if row.iter().sum::<f64>() <= 0.0 {
                return Err(SegcodeError::MatrixParseError(format!(
                    "matrix '{}': position {} sums to zero",
                    self.id, pos
                )));
            }
        }
        Ok(())
    }
}

///
/// Parse matrices from JASPAR format: `>ID name` followed by four rows
/// labelled A, C, G, T holding bracketed counts.
///
/// Returned matrices are not normalized.
///
pub fn parse_jaspar(input: &str) -> Result<Vec<PositionWeightMatrix>> {
    let mut matrices = Vec::new();
    let mut lines = input.lines().map(str::trim).filter(|l| !l.is_empty());

    while let Some(line) = lines.next() {
        let Some(header) = line.strip_prefix('>') else {
            continue;
        };
        let mut parts = header.trim().splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("unnamed").to_string();
        let name = parts.next().map(str::trim).unwrap_or(id.as_str()).to_string();

        let mut base_rows: Vec<Vec<f64>> = Vec::with_capacity(4);
        for label in ['A', 'C', 'G', 'T'] {
            let row = lines.next().ok_or_else(|| {
                SegcodeError::MatrixParseError(format!(
                    "JASPAR matrix '{}': row '{}' missing",
                    id, label
                ))
            })?;
            if !row.starts_with(label) {
                return Err(SegcodeError::MatrixParseError(format!(
                    "JASPAR matrix '{}': expected row '{}', got '{}'",
                    id, label, row
                )));
            }
            let (open, close) = match (row.find('['), row.find(']')) {
                (Some(open), Some(close)) if open < close => (open, close),
                _ => {
                    return Err(SegcodeError::MatrixParseError(format!(
                        "JASPAR matrix '{}': row '{}' lacks brackets",
                        id, label
                    )));
                }
            };
            let values = row[open + 1..close]
                .split_whitespace()
                .map(|v| v.parse::<f64>())
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|e| {
                    SegcodeError::MatrixParseError(format!(
                        "JASPAR matrix '{}': row '{}': {}",
                        id, label, e
                    ))
                })?;
            base_rows.push(values);
        }

        let width = base_rows[0].len();
        if base_rows.iter().any(|r| r.len() != width) {
            return Err(SegcodeError::MatrixParseError(format!(
                "JASPAR matrix '{}': rows differ in length",
                id
            )));
        }

        let rows = (0..width)
            .map(|pos| {
                [
                    base_rows[0][pos],
                    base_rows[1][pos],
                    base_rows[2][pos],
                    base_rows[3][pos],
                ]
            })
            .collect();

        let pwm = PositionWeightMatrix::new(&id, &name, rows);
        pwm.validate()?;
        matrices.push(pwm);
    }

    Ok(matrices)
}
