use std::fmt::{Display, Formatter, Result};

use super::{score_matrix::ScoreMatrix, Alignment};

pub const GAP_CHARACTER: char = '-';

/// Renders a score matrix with the residues of `seq2` above and those of `seq1` on the left.
pub struct ScoreMatrixDisplay<'a, Residue> {
    pub seq1: &'a [Residue],
    pub seq2: &'a [Residue],
    pub matrix: &'a ScoreMatrix,
}

/// Renders an alignment with a line marking identical columns.
pub struct AlignmentDisplay<'a, Residue>(pub &'a Alignment<Residue>);

/// Writes a gapped sequence as text.
pub fn gapped_string<Residue: Clone + Into<char>>(gapped: &[Option<Residue>]) -> String {
    gapped
        .iter()
        .map(|residue| {
            residue
                .clone()
                .map(Into::into)
                .unwrap_or(GAP_CHARACTER)
        })
        .collect()
}

impl<Residue: Clone + Into<char>> Display for ScoreMatrixDisplay<'_, Residue> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        debug_assert_eq!(self.matrix.rows(), self.seq1.len() + 1);
        debug_assert_eq!(self.matrix.columns(), self.seq2.len() + 1);

        write!(f, "{:>5}{:>5}", ' ', GAP_CHARACTER)?;
        for residue in self.seq2 {
            let residue: char = residue.clone().into();
            write!(f, "{residue:>5}")?;
        }
        writeln!(f)?;

        for (row, scores) in self.matrix.iter_rows().enumerate() {
            let label = if row == 0 {
                GAP_CHARACTER
            } else {
                self.seq1[row - 1].clone().into()
            };
            write!(f, "{label:>5}")?;

            for score in scores {
                write!(f, "{score:>5}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl<Residue: Clone + Into<char> + PartialEq> Display for AlignmentDisplay<'_, Residue> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let alignment = self.0;
        let matches: String = alignment
            .columns()
            .map(|(first, second)| {
                if first.is_some() && first == second {
                    '|'
                } else {
                    ' '
                }
            })
            .collect();

        writeln!(f, "{}", gapped_string(&alignment.seq1))?;
        writeln!(f, "{matches}")?;
        writeln!(f, "{}", gapped_string(&alignment.seq2))?;
        writeln!(f)?;
        write!(f, "Score = {}", alignment.score)
    }
}
