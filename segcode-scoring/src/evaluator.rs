use segcode_core::models::FeatureKey;

///
/// A feature computed from a segment's bases alone.
///
/// Implementations are shared across the workers of the scoring pool, so
/// `evaluate` takes `&self` and must not keep per-call state.
///
pub trait SequenceFeature: Send + Sync {
    /// Key the value is stored under in the segment.
    fn key(&self) -> &FeatureKey;

    /// `None` when the sequence can't be scored, e.g. it is shorter than the
    /// feature.
    fn evaluate(&self, seq: &[u8]) -> Option<f64>;
}

/// Index of an upper-case base in `[A, C, G, T]`.
pub(crate) fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}
