use std::fmt::Display;

use anyhow::{anyhow, Result};
use log::debug;

use super::{strategy::Strategy, substitution::SubstitutionScore, Score};

/// A dense `rows × columns` grid of scores.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ScoreMatrix {
    scores: Vec<Score>,
    rows: usize,
    columns: usize,
}

/// A step from a cell to one of its predecessors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Direction {
    /// To `(i - 1, j)`, consuming a residue of the first sequence against a gap.
    Up,
    /// To `(i - 1, j - 1)`, consuming a residue of each sequence.
    Diagonal,
    /// To `(i, j - 1)`, consuming a residue of the second sequence against a gap.
    Left,
}

/// The optimal predecessors of a cell in evaluation order.
///
/// The first entry is the high road.
/// An empty set marks an origin.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Predecessors {
    directions: [Direction; 3],
    len: u8,
}

/// The predecessors of each cell of a [`ScoreMatrix`], stored in parallel to it.
#[derive(Debug, Clone)]
pub struct PredecessorMap {
    predecessors: Vec<Predecessors>,
    columns: usize,
}

impl ScoreMatrix {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            scores: vec![0; rows * columns],
            rows,
            columns,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> Score {
        self.scores[row * self.columns + column]
    }

    pub fn set(&mut self, row: usize, column: usize, score: Score) {
        self.scores[row * self.columns + column] = score;
    }

    pub fn row(&self, row: usize) -> &[Score] {
        &self.scores[row * self.columns..(row + 1) * self.columns]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Score]> {
        (0..self.rows).map(move |row| self.row(row))
    }
}

impl Direction {
    /// The cell this direction leads to from `(row, column)`.
    pub fn step(self, row: usize, column: usize) -> (usize, usize) {
        match self {
            Self::Up => (row - 1, column),
            Self::Diagonal => (row - 1, column - 1),
            Self::Left => (row, column - 1),
        }
    }
}

impl Predecessors {
    pub const ORIGIN: Self = Self {
        directions: [Direction::Up; 3],
        len: 0,
    };

    pub fn single(direction: Direction) -> Self {
        let mut result = Self::ORIGIN;
        result.push(direction);
        result
    }

    pub fn push(&mut self, direction: Direction) {
        debug_assert!(!self.directions[..usize::from(self.len)].contains(&direction));
        self.directions[usize::from(self.len)] = direction;
        self.len += 1;
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn high_road(&self) -> Option<Direction> {
        self.as_slice().first().copied()
    }

    pub fn as_slice(&self) -> &[Direction] {
        &self.directions[..usize::from(self.len)]
    }
}

impl PredecessorMap {
    fn new(rows: usize, columns: usize) -> Self {
        Self {
            predecessors: vec![Predecessors::ORIGIN; rows * columns],
            columns,
        }
    }

    pub fn get(&self, row: usize, column: usize) -> &Predecessors {
        &self.predecessors[row * self.columns + column]
    }

    fn set(&mut self, row: usize, column: usize, predecessors: Predecessors) {
        self.predecessors[row * self.columns + column] = predecessors;
    }
}

/// Fills the score matrix and predecessor map for aligning `seq1` (rows) against `seq2` (columns).
pub fn build<Residue: Display>(
    seq1: &[Residue],
    seq2: &[Residue],
    substitution: &impl SubstitutionScore<Residue>,
    gap_penalty: Score,
    strategy: Strategy,
) -> Result<(ScoreMatrix, PredecessorMap)> {
    let rows = seq1.len() + 1;
    let columns = seq2.len() + 1;
    debug!("Filling {rows}x{columns} score matrix");

    let mut matrix = ScoreMatrix::new(rows, columns);
    let mut predecessor_map = PredecessorMap::new(rows, columns);

    for row in 1..rows {
        let cell = strategy.boundary_cell(row, gap_penalty)?;
        matrix.set(row, 0, cell.score);
        if cell.has_predecessor {
            predecessor_map.set(row, 0, Predecessors::single(Direction::Up));
        }
    }
    for column in 1..columns {
        let cell = strategy.boundary_cell(column, gap_penalty)?;
        matrix.set(0, column, cell.score);
        if cell.has_predecessor {
            predecessor_map.set(0, column, Predecessors::single(Direction::Left));
        }
    }

    for row in 1..rows {
        for column in 1..columns {
            let (residue1, residue2) = (&seq1[row - 1], &seq2[column - 1]);
            let substitution_score = substitution
                .substitution_score(residue1, residue2)
                .ok_or_else(|| {
                    anyhow!("Missing substitution score for {residue1} against {residue2}")
                })?;

            let overflow = || anyhow!("Score overflows at cell ({row}, {column})");
            let candidates = [
                (
                    Direction::Up,
                    matrix
                        .get(row - 1, column)
                        .checked_sub(gap_penalty)
                        .ok_or_else(overflow)?,
                ),
                (
                    Direction::Diagonal,
                    matrix
                        .get(row - 1, column - 1)
                        .checked_add(substitution_score)
                        .ok_or_else(overflow)?,
                ),
                (
                    Direction::Left,
                    matrix
                        .get(row, column - 1)
                        .checked_sub(gap_penalty)
                        .ok_or_else(overflow)?,
                ),
            ];

            let mut best = candidates[0].1;
            let mut predecessors = Predecessors::single(candidates[0].0);
            for (direction, score) in candidates.into_iter().skip(1) {
                if score > best {
                    best = score;
                    predecessors.clear();
                    predecessors.push(direction);
                } else if score == best {
                    predecessors.push(direction);
                }
            }

            if strategy.clamps_at_zero() && best <= 0 {
                best = 0;
                predecessors = Predecessors::ORIGIN;
            }

            matrix.set(row, column, best);
            predecessor_map.set(row, column, predecessors);
        }
    }

    Ok((matrix, predecessor_map))
}

#[cfg(test)]
mod tests {
    use super::{build, Direction, Predecessors};
    use crate::pairalign::{strategy::Strategy, Score};

    fn identity(first: &char, second: &char) -> Option<Score> {
        Some(if first == second { 1 } else { -1 })
    }

    fn chars(sequence: &str) -> Vec<char> {
        sequence.chars().collect()
    }

    #[test]
    fn global_boundaries() {
        let (matrix, predecessors) =
            build(&chars("AC"), &chars("GTA"), &identity, 2, Strategy::Global).unwrap();

        assert_eq!(matrix.row(0), &[0, -2, -4, -6]);
        assert_eq!(
            matrix.iter_rows().map(|row| row[0]).collect::<Vec<_>>(),
            vec![0, -2, -4]
        );
        assert!(predecessors.get(0, 0).as_slice().is_empty());
        assert_eq!(predecessors.get(2, 0).as_slice(), &[Direction::Up]);
        assert_eq!(predecessors.get(0, 3).as_slice(), &[Direction::Left]);
    }

    #[test]
    fn free_boundaries_are_origins() {
        for strategy in [Strategy::Semiglobal, Strategy::Local] {
            let (matrix, predecessors) =
                build(&chars("AC"), &chars("GTA"), &identity, 2, strategy).unwrap();
            assert_eq!(matrix.row(0), &[0, 0, 0, 0]);
            for row in 0..matrix.rows() {
                assert_eq!(matrix.get(row, 0), 0);
                assert!(predecessors.get(row, 0).as_slice().is_empty());
            }
            for column in 0..matrix.columns() {
                assert!(predecessors.get(0, column).as_slice().is_empty());
            }
        }
    }

    #[test]
    fn ties_keep_evaluation_order() {
        // Cell (1, 1) of "A" against "A" with gap penalty 1 under global:
        // up = -1 - 1, diagonal = 0 + 1, left = -1 - 1.
        let (matrix, predecessors) =
            build(&chars("A"), &chars("A"), &identity, 1, Strategy::Global).unwrap();
        assert_eq!(matrix.get(1, 1), 1);
        assert_eq!(predecessors.get(1, 1).as_slice(), &[Direction::Diagonal]);

        // "A" against "C" under semiglobal with a harsh mismatch:
        // up = 0 - 1, diagonal = 0 - 2, left = 0 - 1.
        let harsh = |_: &char, _: &char| Some(-2);
        let (matrix, predecessors) =
            build(&chars("A"), &chars("C"), &harsh, 1, Strategy::Semiglobal).unwrap();
        assert_eq!(matrix.get(1, 1), -1);
        assert_eq!(
            predecessors.get(1, 1).as_slice(),
            &[Direction::Up, Direction::Left]
        );
        assert_eq!(predecessors.get(1, 1).high_road(), Some(Direction::Up));
    }

    #[test]
    fn three_way_tie() {
        let score = |_: &char, _: &char| Some(-2);
        let (matrix, predecessors) =
            build(&chars("A"), &chars("A"), &score, 1, Strategy::Global).unwrap();
        assert_eq!(matrix.get(1, 1), -2);
        assert_eq!(
            predecessors.get(1, 1).as_slice(),
            &[Direction::Up, Direction::Diagonal, Direction::Left]
        );
    }

    #[test]
    fn local_clamps_non_positive_cells() {
        let (matrix, predecessors) =
            build(&chars("AC"), &chars("GC"), &identity, 2, Strategy::Local).unwrap();
        assert_eq!(matrix.row(1), &[0, 0, 0]);
        assert!(predecessors.get(1, 1).as_slice().is_empty());
        assert!(predecessors.get(1, 2).as_slice().is_empty());
        assert_eq!(matrix.get(2, 2), 1);
        assert_eq!(predecessors.get(2, 2).as_slice(), &[Direction::Diagonal]);
    }

    #[test]
    fn gattaca_global_score() {
        let (matrix, _) = build(
            &chars("GATTACA"),
            &chars("GCATGCU"),
            &identity,
            1,
            Strategy::Global,
        )
        .unwrap();
        assert_eq!(matrix.get(7, 7), 0);
    }

    #[test]
    fn missing_substitution_score_fails() {
        let partial = |first: &char, second: &char| (*first != 'X' && *second != 'X').then_some(1);
        let error = build(&chars("AX"), &chars("A"), &partial, 1, Strategy::Global).unwrap_err();
        assert!(error.to_string().contains("X against A"));
    }

    #[test]
    fn gap_overflow_is_an_error() {
        let error = build(&chars("A"), &chars("A"), &identity, Score::MAX, Strategy::Global)
            .unwrap_err();
        assert!(error.to_string().contains("cell (1, 1)"), "{error}");
    }

    #[test]
    fn substitution_overflow_is_an_error() {
        let huge = |_: &char, _: &char| Some(Score::MAX);
        let error = build(&chars("AA"), &chars("AA"), &huge, 1, Strategy::Local).unwrap_err();
        assert!(error.to_string().contains("cell (2, 2)"), "{error}");

        let tiny = |_: &char, _: &char| Some(Score::MIN);
        assert!(build(&chars("AA"), &chars("AA"), &tiny, 1, Strategy::Global).is_err());
    }

    #[test]
    fn origin_constant_is_empty() {
        assert!(Predecessors::ORIGIN.as_slice().is_empty());
        assert_eq!(Predecessors::ORIGIN.high_road(), None);
    }
}
