use log::debug;

use super::{
    score_matrix::{Direction, PredecessorMap, ScoreMatrix},
    strategy::{Flanks, Strategy},
    Alignment,
};

/// Reconstructs the high road alignment from a filled matrix.
pub fn traceback<Residue: Clone>(
    seq1: &[Residue],
    seq2: &[Residue],
    matrix: &ScoreMatrix,
    predecessor_map: &PredecessorMap,
    strategy: Strategy,
) -> Alignment<Residue> {
    debug_assert_eq!(matrix.rows(), seq1.len() + 1);
    debug_assert_eq!(matrix.columns(), seq2.len() + 1);

    let endpoint = strategy.endpoint(matrix);
    debug!(
        "Tracing back from ({}, {}) with score {}",
        endpoint.row,
        endpoint.column,
        matrix.get(endpoint.row, endpoint.column)
    );

    let mut aligned_seq1 = Vec::new();
    let mut aligned_seq2 = Vec::new();
    let (mut row, mut column) = (endpoint.row, endpoint.column);

    while let Some(direction) = predecessor_map.get(row, column).high_road() {
        match direction {
            Direction::Up => {
                aligned_seq1.push(Some(seq1[row - 1].clone()));
                aligned_seq2.push(None);
            }
            Direction::Diagonal => {
                aligned_seq1.push(Some(seq1[row - 1].clone()));
                aligned_seq2.push(Some(seq2[column - 1].clone()));
            }
            Direction::Left => {
                aligned_seq1.push(None);
                aligned_seq2.push(Some(seq2[column - 1].clone()));
            }
        }
        (row, column) = direction.step(row, column);
    }

    // Reverse the sequences since we built them backwards
    aligned_seq1.reverse();
    aligned_seq2.reverse();

    let mut alignment = Alignment {
        seq1: aligned_seq1,
        seq2: aligned_seq2,
        score: matrix.get(endpoint.row, endpoint.column),
        start: (row, column),
        end: (endpoint.row, endpoint.column),
    };

    if endpoint.flanks == Flanks::Padded {
        alignment.pad_flanks(seq1, seq2);
    }

    alignment
}

impl<Residue: Clone> Alignment<Residue> {
    /// Adds the residues before `start` and after `end` opposite gaps.
    fn pad_flanks(&mut self, seq1: &[Residue], seq2: &[Residue]) {
        let (start_row, start_column) = self.start;
        let (end_row, end_column) = self.end;

        let prefix = seq1[..start_row]
            .iter()
            .map(|residue| (Some(residue.clone()), None))
            .chain(
                seq2[..start_column]
                    .iter()
                    .map(|residue| (None, Some(residue.clone()))),
            );
        let (mut padded_seq1, mut padded_seq2): (Vec<_>, Vec<_>) = prefix.unzip();
        padded_seq1.append(&mut self.seq1);
        padded_seq2.append(&mut self.seq2);

        for residue in &seq1[end_row..] {
            padded_seq1.push(Some(residue.clone()));
            padded_seq2.push(None);
        }
        for residue in &seq2[end_column..] {
            padded_seq1.push(None);
            padded_seq2.push(Some(residue.clone()));
        }

        self.seq1 = padded_seq1;
        self.seq2 = padded_seq2;
    }
}
