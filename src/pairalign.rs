use std::{fmt::Display, time::Instant};

use anyhow::{ensure, Result};
use log::info;
use score_matrix::ScoreMatrix;
use strategy::Strategy;
use substitution::SubstitutionScore;

pub mod display;
pub mod output;
pub mod score_matrix;
pub mod strategy;
pub mod substitution;
mod traceback;

pub type Score = i32;

/// Two gapped sequences of equal length, with `None` marking a gap.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Alignment<Residue> {
    pub seq1: Vec<Option<Residue>>,
    pub seq2: Vec<Option<Residue>>,
    pub score: Score,
    /// The matrix cell where the traceback stopped.
    pub start: (usize, usize),
    /// The matrix cell where the traceback began.
    pub end: (usize, usize),
}

impl<Residue> Alignment<Residue> {
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.seq1.len(), self.seq2.len());
        self.seq1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> impl Iterator<Item = (Option<&Residue>, Option<&Residue>)> {
        self.seq1
            .iter()
            .zip(&self.seq2)
            .map(|(first, second)| (first.as_ref(), second.as_ref()))
    }

    pub fn gap_count(&self) -> usize {
        self.columns()
            .filter(|(first, second)| first.is_none() || second.is_none())
            .count()
    }
}

impl<Residue: PartialEq> Alignment<Residue> {
    pub fn match_count(&self) -> usize {
        self.columns()
            .filter(|(first, second)| first.is_some() && first == second)
            .count()
    }
}

/// Aligns `seq1` against `seq2` and returns the high road alignment together with the score matrix.
///
/// Fails if the gap penalty is not positive, a residue pair has no substitution score,
/// or a cell score does not fit into a [`Score`].
pub fn align<Residue: Clone + Display + PartialEq>(
    seq1: &[Residue],
    seq2: &[Residue],
    strategy: Strategy,
    substitution: &impl SubstitutionScore<Residue>,
    gap_penalty: Score,
) -> Result<(Alignment<Residue>, ScoreMatrix)> {
    ensure!(
        gap_penalty > 0,
        "Gap penalty must be a positive integer, but is {gap_penalty}"
    );
    info!(
        "Aligning sequences of length {} and {} with strategy {strategy:?}",
        seq1.len(),
        seq2.len()
    );

    let start_time = Instant::now();
    let (matrix, predecessor_map) =
        score_matrix::build(seq1, seq2, substitution, gap_penalty, strategy)?;
    let alignment = traceback::traceback(seq1, seq2, &matrix, &predecessor_map, strategy);
    let duration = Instant::now() - start_time;

    info!("Runtime: {:.2}s", duration.as_secs_f64());
    info!(
        "Alignment score {} over {} columns with {} matches and {} gaps",
        alignment.score,
        alignment.len(),
        alignment.match_count(),
        alignment.gap_count()
    );

    Ok((alignment, matrix))
}

#[cfg(test)]
mod tests {
    use super::{align, strategy::Strategy, Score};

    fn identity(first: &char, second: &char) -> Option<Score> {
        Some(if first == second { 1 } else { -1 })
    }

    fn chars(sequence: &str) -> Vec<char> {
        sequence.chars().collect()
    }

    #[test]
    fn rejects_non_positive_gap_penalty() {
        for gap_penalty in [0, -3] {
            assert!(align(
                &chars("A"),
                &chars("A"),
                Strategy::Global,
                &identity,
                gap_penalty
            )
            .is_err());
        }
    }

    #[test]
    fn global_score_is_bottom_right_cell() {
        let (seq1, seq2) = (chars("PAWHEAE"), chars("HEAGAWGHEE"));
        let (alignment, matrix) = align(&seq1, &seq2, Strategy::Global, &identity, 2).unwrap();
        assert_eq!(alignment.score, matrix.get(seq1.len(), seq2.len()));
        assert!(alignment.len() >= seq2.len());
        assert_eq!(matrix.rows(), seq1.len() + 1);
        assert_eq!(matrix.columns(), seq2.len() + 1);
    }

    #[test]
    fn aligned_residues_spell_the_inputs() {
        let (seq1, seq2) = (chars("PAWHEAE"), chars("HEAGAWGHEE"));
        for strategy in [Strategy::Global, Strategy::Semiglobal] {
            let (alignment, _) = align(&seq1, &seq2, strategy, &identity, 1).unwrap();
            assert_eq!(alignment.seq1.iter().flatten().copied().collect::<Vec<_>>(), seq1);
            assert_eq!(alignment.seq2.iter().flatten().copied().collect::<Vec<_>>(), seq2);
        }
    }

    #[test]
    fn local_score_is_never_negative() {
        let (alignment, _) =
            align(&chars("WWWW"), &chars("CCCC"), Strategy::Local, &identity, 1).unwrap();
        assert_eq!(alignment.score, 0);
        assert!(alignment.is_empty());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let (seq1, seq2) = (chars("GATTACAGATTACA"), chars("GCATGCUGCAT"));
        for strategy in [Strategy::Global, Strategy::Semiglobal, Strategy::Local] {
            let first = align(&seq1, &seq2, strategy, &identity, 1).unwrap();
            let second = align(&seq1, &seq2, strategy, &identity, 1).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn huge_gap_penalties_fail_instead_of_overflowing() {
        assert!(align(
            &chars("A"),
            &chars("A"),
            Strategy::Global,
            &identity,
            Score::MAX
        )
        .is_err());
        assert!(align(
            &chars("AAA"),
            &chars("A"),
            Strategy::Global,
            &identity,
            1_000_000_000
        )
        .is_err());
    }

    #[test]
    fn missing_substitution_score_aborts() {
        let vowels_only = |first: &char, second: &char| {
            ("AEIOU".contains(*first) && "AEIOU".contains(*second)).then_some(1)
        };
        let error = align(
            &chars("AEB"),
            &chars("AE"),
            Strategy::Local,
            &vowels_only,
            1,
        )
        .unwrap_err();
        assert!(error.to_string().contains("B against A"));
    }
}
