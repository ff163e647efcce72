/// Entries picked by the user, as 1-based positions in the manifest listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Indices(Vec<usize>),
}

impl Selection {
    /// Resolves the selection against a listing of `len` entries.
    /// Returns the valid 0-based positions and the rejected 1-based indices.
    pub fn resolve(&self, len: usize) -> (Vec<usize>, Vec<usize>) {
        match self {
            Selection::All => ((0..len).collect(), Vec::new()),
            Selection::Indices(indices) => {
                let mut valid = Vec::new();
                let mut rejected = Vec::new();
                for &idx in indices {
                    if (1..=len).contains(&idx) {
                        if !valid.contains(&(idx - 1)) {
                            valid.push(idx - 1);
                        }
                    } else {
                        rejected.push(idx);
                    }
                }
                (valid, rejected)
            }
        }
    }
}
