use std::{collections::BTreeMap, fs::File, io::Read, path::Path};

use anyhow::{anyhow, bail, ensure, Context, Result};
use clap::ValueEnum;
use csv::ReaderBuilder;
use log::{info, trace};

use super::Score;

/// Scores aligning one residue against another.
///
/// Returns `None` if the pair has no score.
pub trait SubstitutionScore<Residue> {
    fn substitution_score(&self, first: &Residue, second: &Residue) -> Option<Score>;
}

impl<Residue, Function: Fn(&Residue, &Residue) -> Option<Score>> SubstitutionScore<Residue>
    for Function
{
    fn substitution_score(&self, first: &Residue, second: &Residue) -> Option<Score> {
        self(first, second)
    }
}

/// The substitution matrices shipped with the binary.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum BuiltinMatrix {
    Pam250,
    Blosum62,
    /// Scores one for equal residues and minus one for everything else.
    Identity,
}

pub enum SubstitutionMatrix {
    Table(SubstitutionTable),
    Identity,
}

/// A pairwise scoring table over single-character residues.
pub struct SubstitutionTable {
    character_to_index: BTreeMap<char, usize>,
    table: Vec<Option<Score>>,
}

const PAM250: &str = include_str!("../../data/pam250.csv");
const BLOSUM62: &str = include_str!("../../data/blosum62.csv");

impl SubstitutionMatrix {
    pub fn builtin(matrix: BuiltinMatrix) -> Result<Self> {
        Ok(match matrix {
            BuiltinMatrix::Pam250 => Self::Table(
                SubstitutionTable::from_csv_reader(PAM250.as_bytes())
                    .context("Error parsing builtin PAM250 table")?,
            ),
            BuiltinMatrix::Blosum62 => Self::Table(
                SubstitutionTable::from_csv_reader(BLOSUM62.as_bytes())
                    .context("Error parsing builtin BLOSUM62 table")?,
            ),
            BuiltinMatrix::Identity => Self::Identity,
        })
    }
}

impl SubstitutionScore<char> for SubstitutionMatrix {
    fn substitution_score(&self, first: &char, second: &char) -> Option<Score> {
        match self {
            Self::Table(table) => table.substitution_score(first, second),
            Self::Identity => Some(if first == second { 1 } else { -1 }),
        }
    }
}

impl SubstitutionTable {
    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading CSV file {path:?}");

        let file = File::open(path).with_context(|| format!("Error opening CSV file {path:?}"))?;
        Self::from_csv_reader(file).with_context(|| format!("Error parsing CSV file {path:?}"))
    }

    /// Parses a square table whose first row and first column hold the residues.
    ///
    /// The top-left cell must be empty.
    pub fn from_csv_reader(reader: impl Read) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut lines = reader.records();

        // Parse first line
        let first_line = lines
            .next()
            .ok_or_else(|| anyhow!("CSV file contains no lines"))?
            .context("Error reading first CSV line")?;
        let mut character_to_index = BTreeMap::new();
        let mut column_to_character = Vec::new();

        for (column, character) in first_line.iter().enumerate() {
            if column == 0 {
                ensure!(
                    character.trim().is_empty(),
                    "First column of first row must be empty, but was: {:?}",
                    character.trim()
                );
                continue;
            }

            let character = parse_label(character)
                .context("First row must contain a single character in each column, except for the first column which must be empty")?;
            ensure!(
                character_to_index
                    .insert(character, column_to_character.len())
                    .is_none(),
                "First row contained a character twice: {character}"
            );
            column_to_character.push(character);
        }

        // Parse further lines
        let mut score_map = BTreeMap::new();
        let mut row_characters = Vec::new();
        for (row, line) in lines.enumerate().map(|(index, line)| (index + 1, line)) {
            let line = line.with_context(|| format!("Error reading CSV line {}", row + 1))?;
            let mut cells = line.iter();

            let character = parse_label(cells.next().unwrap_or_default()).with_context(|| {
                format!("First column of row {row} must contain a single character")
            })?;
            ensure!(
                character_to_index.contains_key(&character),
                "Row label {character} does not appear in the first row"
            );
            ensure!(
                !row_characters.contains(&character),
                "First column contained a character twice: {character}"
            );
            row_characters.push(character);

            let mut columns = 0;
            for (column, score) in cells.enumerate() {
                let to = *column_to_character.get(column).ok_or_else(|| {
                    anyhow!("Row {row} contains more columns than the first row")
                })?;
                let score = score.trim();
                let score: Score = score
                    .parse()
                    .with_context(|| format!("Error parsing '{score}' as i32"))?;
                trace!("from: {character}; to: {to}; score: {score}");

                let previous_score = score_map.insert((character, to), score);
                debug_assert!(previous_score.is_none());
                columns += 1;
            }
            ensure!(
                columns == column_to_character.len(),
                "Row {row} contains {columns} scores, but the first row has {} characters",
                column_to_character.len()
            );
        }

        if row_characters.is_empty() {
            bail!("CSV file contains no score rows");
        }

        // Transform map into table
        let size = column_to_character.len();
        let mut table = Vec::with_capacity(size * size);
        for from in &column_to_character {
            for to in &column_to_character {
                let score = score_map.get(&(*from, *to)).copied();
                if let (Some(score), Some(other_score)) = (score, score_map.get(&(*to, *from))) {
                    ensure!(
                        score == *other_score,
                        "Asymmetric entry found for row {from}, column {to}: {score} != {other_score}"
                    );
                }
                table.push(score);
            }
        }

        Ok(Self {
            character_to_index,
            table,
        })
    }

    pub fn size(&self) -> usize {
        self.character_to_index.len()
    }
}

impl SubstitutionScore<char> for SubstitutionTable {
    fn substitution_score(&self, first: &char, second: &char) -> Option<Score> {
        let first = self.character_to_index.get(first)?;
        let second = self.character_to_index.get(second)?;
        self.table[first * self.size() + second]
    }
}

fn parse_label(label: &str) -> Result<char> {
    let label = label.trim();
    let mut characters = label.chars();
    match (characters.next(), characters.next()) {
        (Some(character), None) => Ok(character),
        _ => bail!("Expected a single character, but found {label:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{BuiltinMatrix, SubstitutionMatrix, SubstitutionScore, SubstitutionTable};

    #[test]
    fn builtin_tables_parse() {
        for matrix in [BuiltinMatrix::Pam250, BuiltinMatrix::Blosum62] {
            let SubstitutionMatrix::Table(table) = SubstitutionMatrix::builtin(matrix).unwrap()
            else {
                panic!("{matrix:?} is not a table");
            };
            assert_eq!(table.size(), 24);
        }
    }

    #[test]
    fn builtin_scores() {
        let pam250 = SubstitutionMatrix::builtin(BuiltinMatrix::Pam250).unwrap();
        assert_eq!(pam250.substitution_score(&'W', &'W'), Some(17));
        assert_eq!(pam250.substitution_score(&'C', &'W'), Some(-8));
        assert_eq!(pam250.substitution_score(&'A', &'J'), None);

        let blosum62 = SubstitutionMatrix::builtin(BuiltinMatrix::Blosum62).unwrap();
        assert_eq!(blosum62.substitution_score(&'A', &'A'), Some(4));
        assert_eq!(blosum62.substitution_score(&'W', &'Y'), Some(2));
        assert_eq!(blosum62.substitution_score(&'Y', &'W'), Some(2));
    }

    #[test]
    fn identity_scores_any_character() {
        let identity = SubstitutionMatrix::builtin(BuiltinMatrix::Identity).unwrap();
        assert_eq!(identity.substitution_score(&'Q', &'Q'), Some(1));
        assert_eq!(identity.substitution_score(&'Q', &'#'), Some(-1));
    }

    #[test]
    fn partial_table_has_missing_entries() {
        let table = SubstitutionTable::from_csv_reader(" ,A,C\nA,1,-1\n".as_bytes()).unwrap();
        assert_eq!(table.substitution_score(&'A', &'C'), Some(-1));
        assert_eq!(table.substitution_score(&'C', &'C'), None);
    }

    #[test]
    fn rejects_asymmetric_table() {
        let error = SubstitutionTable::from_csv_reader(",A,C\nA,1,-1\nC,-2,1\n".as_bytes())
            .err()
            .unwrap();
        assert!(error.to_string().contains("Asymmetric"));
    }

    #[test]
    fn rejects_malformed_tables() {
        for csv in [
            "",
            "X,A\nA,1\n",
            ",AB\nA,1\n",
            ",A,A\nA,1,1\n",
            ",A\nA,one\n",
            ",A\nA,1,2\n",
            ",A,C\nA,1\n",
            ",A\nC,1\n",
            ",A\nA,1\nA,1\n",
            ",A\n",
        ] {
            assert!(
                SubstitutionTable::from_csv_reader(csv.as_bytes()).is_err(),
                "accepted {csv:?}"
            );
        }
    }
}
