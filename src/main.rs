use std::{fmt::Debug, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use compact_genome::{
    implementation::{
        alphabets::{
            dna_alphabet::DnaAlphabet, dna_alphabet_or_n::DnaAlphabetOrN,
            dna_iupac_nucleic_acid_alphabet::DnaIupacNucleicAcidAlphabet,
            famsa_amino_acid_alphabet::FamsaAminoAcidAlphabet,
            iupac_amino_acid_alphabet::IupacAminoAcidAlphabet, rna_alphabet::RnaAlphabet,
            rna_alphabet_or_n::RnaAlphabetOrN,
            rna_iupac_nucleic_acid_alphabet::RnaIupacNucleicAcidAlphabet,
        },
        DefaultSequenceStore,
    },
    interface::{alphabet::Alphabet, sequence::GenomeSequence, sequence_store::SequenceStore},
    io::fasta::read_fasta_file,
};
use log::{info, warn, LevelFilter};
use pairalign::{
    align,
    display::{AlignmentDisplay, ScoreMatrixDisplay},
    output::{save_alignment, save_score_matrix},
    strategy::Strategy,
    substitution::{BuiltinMatrix, SubstitutionMatrix, SubstitutionTable},
    Score,
};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

mod pairalign;

/// Aligns the first two sequences of a fasta file.
#[derive(Parser)]
struct Cli {
    /// The minimum importance of log messages to output.
    #[clap(long, short = 'l', default_value = "info")]
    log_level: LevelFilter,

    /// The input fasta file.
    ///
    /// Only its first two records are aligned.
    fasta: PathBuf,

    /// Where to save the alignment and, if given, the score matrix.
    #[clap(num_args = 0..=2)]
    output: Vec<PathBuf>,

    /// Print the score matrix and the alignment.
    #[clap(long, short = 'v')]
    verbose: bool,

    /// The alignment strategy.
    #[clap(long, short = 's', default_value = "global")]
    strategy: Strategy,

    /// The builtin substitution matrix.
    #[clap(long, short = 'm', default_value = "pam250")]
    matrix: BuiltinMatrix,

    /// A CSV file with a substitution table, replacing the builtin matrix.
    ///
    /// The first row lists the residues with an empty first cell,
    /// each further row starts with a residue followed by its scores.
    #[clap(long)]
    matrix_file: Option<PathBuf>,

    /// The cost of a single gap, must be positive.
    #[clap(long, short = 'g', default_value = "2", value_parser = parse_gap_penalty)]
    gap_penalty: Score,

    /// The alphabet present in the input file.
    #[clap(long, short = 'a', default_value = "famsa-amino-acid")]
    alphabet: InputAlphabet,

    /// A string of (ASCII) characters that should be skipped in the input fasta.
    ///
    /// For example, `-` characters of an existing alignment can be skipped this way.
    #[clap(long, default_value = "")]
    skip_characters: String,
}

#[derive(Debug, Clone, Eq, PartialEq, ValueEnum)]
enum InputAlphabet {
    Dna,
    DnaN,
    Rna,
    RnaN,
    DnaIupac,
    RnaIupac,
    /// The IUPAC amino acid alphabet.
    IupacAminoAcid,
    /// The FAMSA amino acid alphabet.
    FamsaAminoAcid,
}

fn parse_gap_penalty(value: &str) -> Result<Score> {
    let gap_penalty: Score = value
        .parse()
        .with_context(|| format!("Error parsing '{value}' as integer"))?;
    if gap_penalty <= 0 {
        bail!("Gap penalty must be a positive integer");
    }
    Ok(gap_penalty)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    TermLogger::init(
        cli.log_level,
        Default::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    info!("Logging initialised");

    match cli.alphabet {
        InputAlphabet::Dna => execute_with_alphabet::<DnaAlphabet>(cli),
        InputAlphabet::DnaN => execute_with_alphabet::<DnaAlphabetOrN>(cli),
        InputAlphabet::Rna => execute_with_alphabet::<RnaAlphabet>(cli),
        InputAlphabet::RnaN => execute_with_alphabet::<RnaAlphabetOrN>(cli),
        InputAlphabet::DnaIupac => execute_with_alphabet::<DnaIupacNucleicAcidAlphabet>(cli),
        InputAlphabet::RnaIupac => execute_with_alphabet::<RnaIupacNucleicAcidAlphabet>(cli),
        InputAlphabet::IupacAminoAcid => execute_with_alphabet::<IupacAminoAcidAlphabet>(cli),
        InputAlphabet::FamsaAminoAcid => execute_with_alphabet::<FamsaAminoAcidAlphabet>(cli),
    }?;

    info!("Terminating");

    Ok(())
}

fn execute_with_alphabet<AlphabetType: Alphabet + Debug + Clone + Eq + 'static>(
    cli: Cli,
) -> Result<()> {
    let substitution_matrix = if let Some(path) = &cli.matrix_file {
        SubstitutionMatrix::Table(SubstitutionTable::from_csv_file(path)?)
    } else {
        info!("Using builtin substitution matrix {:?}", cli.matrix);
        SubstitutionMatrix::builtin(cli.matrix)?
    };

    let (seq1, seq2) = load_sequences::<AlphabetType>(&cli)?;

    let (alignment, score_matrix) = align(
        &seq1,
        &seq2,
        cli.strategy,
        &substitution_matrix,
        cli.gap_penalty,
    )?;

    if alignment.is_empty() {
        warn!("The alignment is empty");
    }

    if cli.verbose {
        print!(
            "{}",
            ScoreMatrixDisplay {
                seq1: &seq1,
                seq2: &seq2,
                matrix: &score_matrix,
            }
        );
        println!();
        println!("{}", AlignmentDisplay(&alignment));
    }

    if let Some(path) = cli.output.first() {
        save_alignment(&alignment, path)?;
    }
    if let Some(path) = cli.output.get(1) {
        save_score_matrix(&score_matrix, path)?;
    }

    Ok(())
}

/// Reads the first two records of the fasta file as character sequences.
fn load_sequences<AlphabetType: Alphabet + Debug + Clone + Eq + 'static>(
    cli: &Cli,
) -> Result<(Vec<char>, Vec<char>)> {
    let mut skip_characters = Vec::new();
    for character in cli.skip_characters.bytes().map(usize::from) {
        if skip_characters.len() <= character {
            skip_characters.resize(character + 1, false);
        }
        skip_characters[character] = true;
    }
    let skip_characters = skip_characters;

    let path = &cli.fasta;
    info!("Loading fasta file {path:?}");
    let mut sequence_store = DefaultSequenceStore::<AlphabetType>::new();
    let records = read_fasta_file(path, &mut sequence_store, false, true, &skip_characters)
        .with_context(|| format!("Error loading file: {path:?}"))?;

    if records.is_empty() {
        bail!("Found no fasta records in input file");
    } else if records.len() == 1 {
        bail!("Found only one fasta record in input file");
    } else if records.len() > 2 {
        warn!(
            "Found {} fasta records, ignoring all but the first two",
            records.len()
        );
    }

    let mut sequences = records[..2].iter().map(|record| {
        let sequence = sequence_store
            .get(&record.sequence_handle)
            .as_genome_subsequence();
        let characters = sequence_characters::<AlphabetType, _>(sequence);

        if characters.is_empty() {
            warn!("Record {} has an empty sequence", record.id);
        }
        info!("Loaded {} with {} residues", record.id, characters.len());
        characters
    });

    let seq1 = sequences.next().unwrap_or_default();
    let seq2 = sequences.next().unwrap_or_default();
    Ok((seq1, seq2))
}

fn sequence_characters<
    AlphabetType: Alphabet + Debug + Clone + Eq + 'static,
    SequenceType: GenomeSequence<AlphabetType, SequenceType> + ?Sized,
>(
    sequence: &SequenceType,
) -> Vec<char> {
    (0..sequence.len())
        .map(|index| sequence[index].clone().into())
        .collect()
}
