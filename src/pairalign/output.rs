use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use log::info;

use super::{display::gapped_string, score_matrix::ScoreMatrix, Alignment};

/// Writes both gapped sequences on their own line, followed by the score.
pub fn write_alignment<Residue: Clone + Into<char>>(
    alignment: &Alignment<Residue>,
    mut output: impl Write,
) -> Result<()> {
    writeln!(output, "{}", gapped_string(&alignment.seq1))?;
    writeln!(output, "{}", gapped_string(&alignment.seq2))?;
    write!(output, "Score: {}", alignment.score)?;
    output.flush()?;
    Ok(())
}

/// Writes the matrix as tab-separated values, one row per line.
pub fn write_score_matrix(matrix: &ScoreMatrix, output: impl Write) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(output);

    for row in matrix.iter_rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;

    Ok(())
}

pub fn save_alignment<Residue: Clone + Into<char>>(
    alignment: &Alignment<Residue>,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    info!("Writing alignment to {path:?}");

    let file = File::create(path).with_context(|| format!("Error creating file {path:?}"))?;
    write_alignment(alignment, BufWriter::new(file))
        .with_context(|| format!("Error writing alignment to {path:?}"))
}

pub fn save_score_matrix(matrix: &ScoreMatrix, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    info!("Writing score matrix to {path:?}");

    let file = File::create(path).with_context(|| format!("Error creating file {path:?}"))?;
    write_score_matrix(matrix, BufWriter::new(file))
        .with_context(|| format!("Error writing score matrix to {path:?}"))
}
