use anyhow::{anyhow, Result};
use clap::ValueEnum;

use super::{score_matrix::ScoreMatrix, Score};

/// The alignment strategy.
///
/// All strategy-specific behaviour of the builder and the traceback is routed through
/// [`Strategy::boundary_cell`], [`Strategy::clamps_at_zero`] and [`Strategy::endpoint`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Strategy {
    /// End-to-end alignment, terminal gaps are penalised.
    Global,
    /// Leading and trailing gaps are free.
    Semiglobal,
    /// Best scoring pair of substrings, scores floor at zero.
    Local,
}

/// Initial value of a boundary cell in row zero or column zero.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BoundaryCell {
    pub score: Score,
    /// If false, the cell is an origin.
    pub has_predecessor: bool,
}

/// Whether unaligned flanks of the inputs are padded with gaps.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Flanks {
    Padded,
    Trimmed,
}

/// The cell where the traceback starts.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Endpoint {
    pub row: usize,
    pub column: usize,
    pub flanks: Flanks,
}

impl Strategy {
    /// The boundary cell at the given `offset` along row zero or column zero.
    ///
    /// The offset is never zero, the corner is always an origin with score zero.
    /// Fails if the accumulated gap penalty does not fit into a [`Score`].
    pub fn boundary_cell(self, offset: usize, gap_penalty: Score) -> Result<BoundaryCell> {
        debug_assert!(offset > 0);

        Ok(match self {
            Self::Global => BoundaryCell {
                score: Score::try_from(offset)
                    .ok()
                    .and_then(|offset| offset.checked_mul(gap_penalty))
                    .map(|score| -score)
                    .ok_or_else(|| {
                        anyhow!(
                            "Boundary score overflows at offset {offset} with gap penalty {gap_penalty}"
                        )
                    })?,
                has_predecessor: true,
            },
            Self::Semiglobal | Self::Local => BoundaryCell {
                score: 0,
                has_predecessor: false,
            },
        })
    }

    pub fn clamps_at_zero(self) -> bool {
        matches!(self, Self::Local)
    }

    /// Selects the traceback endpoint in a filled matrix.
    ///
    /// Ties are resolved by scanning top to bottom, then left to right, and keeping the first maximum.
    /// For semiglobal, the last column is scanned before the last row.
    pub fn endpoint(self, matrix: &ScoreMatrix) -> Endpoint {
        let last_row = matrix.rows() - 1;
        let last_column = matrix.columns() - 1;

        let (row, column) = match self {
            Self::Global => (last_row, last_column),
            Self::Semiglobal => first_maximum(
                matrix,
                (0..=last_row)
                    .map(|row| (row, last_column))
                    .chain((0..=last_column).map(|column| (last_row, column))),
            ),
            Self::Local => first_maximum(
                matrix,
                (0..=last_row).flat_map(|row| (0..=last_column).map(move |column| (row, column))),
            ),
        };

        Endpoint {
            row,
            column,
            flanks: match self {
                Self::Global | Self::Semiglobal => Flanks::Padded,
                Self::Local => Flanks::Trimmed,
            },
        }
    }
}

fn first_maximum(
    matrix: &ScoreMatrix,
    cells: impl IntoIterator<Item = (usize, usize)>,
) -> (usize, usize) {
    let mut best: Option<((usize, usize), Score)> = None;

    for (row, column) in cells {
        let score = matrix.get(row, column);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some(((row, column), score));
        }
    }

    best.map(|(cell, _)| cell)
        .unwrap_or_else(|| unreachable!("Score matrix has at least one cell"))
}
