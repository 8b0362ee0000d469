use serde::{Deserialize, Serialize};

/// Interbank exposure matrix. `exposure_matrix[i][j]` is what bank `i` is owed by bank `j`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExposureMatrix {
    pub bank_names: Vec<String>,
    pub exposure_matrix: Vec<Vec<f64>>,
}

impl ExposureMatrix {
    #[must_use]
    pub fn len(&self) -> usize {
        self.bank_names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bank_names.is_empty()
    }

    /// Exposure of `creditor` to `debtor`, if both indices are in range.
    #[must_use]
    pub fn exposure(&self, creditor: usize, debtor: usize) -> Option<f64> {
        self.exposure_matrix.get(creditor)?.get(debtor).copied()
    }

    /// Row sums: total interbank claims held by each bank.
    #[must_use]
    pub fn total_claims(&self) -> Vec<f64> {
        self.exposure_matrix
            .iter()
            .map(|row| row.iter().sum())
            .collect()
    }

    /// Column sums: total interbank obligations of each bank.
    #[must_use]
    pub fn total_obligations(&self) -> Vec<f64> {
        let width = self.exposure_matrix.iter().map(Vec::len).max().unwrap_or(0);
        (0..width)
            .map(|j| {
                self.exposure_matrix
                    .iter()
                    .filter_map(|row| row.get(j))
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_and_column_sums() {
        let matrix = ExposureMatrix {
            bank_names: vec!["A".into(), "B".into()],
            exposure_matrix: vec![vec![0.0, 3.0], vec![1.5, 0.0]],
        };
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.exposure(0, 1), Some(3.0));
        assert_eq!(matrix.exposure(2, 0), None);
        assert_eq!(matrix.total_claims(), vec![3.0, 1.5]);
        assert_eq!(matrix.total_obligations(), vec![1.5, 3.0]);
    }
}
