use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use ring_templates::geometry::normalize;
use ring_templates::graph_ops::{largest_component, num_components};
use ring_templates::sdf::SdfReader;
use ring_templates::{
    library, signature, ExtractConfig, TemplateEntry, TemplateExtractor, TemplateKey,
};

#[derive(Parser, Debug)]
#[command(
    name = "ring-templates",
    version,
    about = "Mine common ring-system layouts from SD files",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract frequent ring templates from an SD file
    Extract {
        /// Input SD file (.sdf)
        input: String,

        /// Output library (default: <INPUT stem>-templates.smi next to the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,

        /// Minimum number of occurrences for a template to be written
        #[arg(long, value_name = "N")]
        min_frequency: Option<usize>,

        /// Rescale and center template coordinates before writing
        #[arg(long)]
        normalize: bool,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Turn every structure of an SD file into a normalized library record
    Build {
        /// Input SD file (.sdf)
        input: String,

        /// Output library
        output: String,

        #[command(flatten)]
        common: CommonOptions,
    },
}

#[derive(Args, Debug)]
struct CommonOptions {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Median bond length of normalized coordinates
    #[arg(long, value_name = "LENGTH")]
    bond_length: Option<f64>,
}

impl CommonOptions {
    fn load(&self) -> Result<ExtractConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = expand_tilde(path);
                ExtractConfig::from_path(&path)
                    .with_context(|| format!("load configuration from {}", path.display()))?
            }
            None => ExtractConfig::default(),
        };
        if let Some(bond_length) = self.bond_length {
            config.bond_length = bond_length;
        }
        Ok(config)
    }
}

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Replace a leading `~` with the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), env::var_os("HOME")) {
        (Some(rest), Some(home)) => {
            let mut expanded = home.into_string().unwrap_or_default();
            expanded.push_str(rest);
            PathBuf::from(expanded)
        }
        _ => PathBuf::from(path),
    }
}

/// `dir/name.sdf` becomes `dir/name-templates.smi`.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}-templates.smi"))
}

fn check_input(input: &str) -> Result<PathBuf> {
    if !input.ends_with(".sdf") {
        bail!("expected an input SD file ending in .sdf, got '{input}'");
    }
    let path = expand_tilde(input);
    if !path.is_file() {
        bail!("input SD file {} does not exist", path.display());
    }
    Ok(path)
}

fn open_sdf(path: &Path) -> Result<SdfReader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    Ok(SdfReader::new(BufReader::new(file)).skip_malformed())
}

fn extract(
    input: &str,
    output: Option<&str>,
    min_frequency: Option<usize>,
    normalize_coords: bool,
    common: &CommonOptions,
) -> Result<()> {
    let mut config = common.load()?;
    if let Some(n) = min_frequency {
        config.min_frequency = n;
    }
    config.normalize |= normalize_coords;
    config.validate()?;

    let input = check_input(input)?;
    let output = output.map_or_else(|| default_output_path(&input), expand_tilde);
    info!("Extracting ring templates to {}", output.display());
    info!(" - input SD file: {}", input.display());

    let mut reader = open_sdf(&input)?;
    let mut extractor = TemplateExtractor::new();
    for record in reader.by_ref() {
        let record = record.with_context(|| format!("read {}", input.display()))?;
        extractor.add(&record);
    }
    let stats = extractor.stats();
    info!(
        "{} records read ({} unusable, {} malformed), {} accepted, {} skipped",
        stats.records,
        reader.skipped(),
        reader.malformed(),
        stats.accepted,
        stats.skipped
    );

    let corpus = extractor.into_corpus();
    let selected = corpus.export_library(config.min_frequency);
    let written = if config.normalize {
        let owned: Vec<(TemplateKey, TemplateEntry)> = selected
            .into_iter()
            .map(|(key, entry)| {
                let mut mol = entry.structure().clone();
                normalize(&mut mol, config.bond_length);
                (key, TemplateEntry::new(mol))
            })
            .collect();
        let records: Vec<(TemplateKey, &TemplateEntry)> =
            owned.iter().map(|(k, e)| (k.clone(), e)).collect();
        library::store(&output, &records)?;
        records.len()
    } else {
        library::store(&output, &selected)?;
        selected.len()
    };
    info!(
        "Wrote {written} templates seen at least {} times",
        config.min_frequency
    );
    Ok(())
}

fn build(input: &str, output: &str, common: &CommonOptions) -> Result<()> {
    let config = common.load()?;
    config.validate()?;
    let input = check_input(input)?;
    let output = expand_tilde(output);
    info!("Creating template library at {}", output.display());
    info!(" - input SD file: {}", input.display());

    let mut reader = open_sdf(&input)?;
    let mut owned: Vec<(TemplateKey, TemplateEntry)> = Vec::new();
    let mut trimmed = 0;
    let mut unsigned = 0;
    for record in reader.by_ref() {
        let mut mol = record.with_context(|| format!("read {}", input.display()))?;
        let components = num_components(&mol);
        if components > 1 {
            if let Some(part) = largest_component(&mol) {
                info!(
                    "{:?}: keeping the largest of {components} components",
                    mol.title().unwrap_or_default()
                );
                mol = part;
                trimmed += 1;
            }
        }
        normalize(&mut mol, config.bond_length);
        for idx in mol.atoms().collect::<Vec<_>>() {
            mol.atom_mut(idx).hydrogen_count = 0;
        }
        match signature(&mol) {
            Ok(key) => owned.push((key, TemplateEntry::new(mol))),
            Err(err) => {
                unsigned += 1;
                warn!(
                    "dropping {:?}: {err}",
                    mol.title().unwrap_or_default()
                );
            }
        }
    }
    let records: Vec<(TemplateKey, &TemplateEntry)> =
        owned.iter().map(|(k, e)| (k.clone(), e)).collect();
    library::store(&output, &records)?;
    info!(
        "Wrote {} templates ({} records unusable, {} malformed, {} cut to their largest \
         component, {} not signable)",
        records.len(),
        reader.skipped(),
        reader.malformed(),
        trimmed,
        unsigned
    );
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match &cli.command {
        Command::Extract {
            input,
            output,
            min_frequency,
            normalize,
            common,
        } => extract(input, output.as_deref(), *min_frequency, *normalize, common),
        Command::Build {
            input,
            output,
            common,
        } => build(input, output, common),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output_path(Path::new("data/chembl.sdf")),
            PathBuf::from("data/chembl-templates.smi")
        );
        assert_eq!(
            default_output_path(Path::new("in.sdf")),
            PathBuf::from("in-templates.smi")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = env::var_os("HOME") else {
            return;
        };
        let expanded = expand_tilde("~/mols/in.sdf");
        assert_eq!(
            expanded,
            PathBuf::from(format!("{}/mols/in.sdf", home.to_string_lossy()))
        );
        assert_eq!(expand_tilde("/tmp/in.sdf"), PathBuf::from("/tmp/in.sdf"));
    }

    #[test]
    fn input_must_be_existing_sdf() {
        assert!(check_input("molecules.mol").is_err());
        assert!(check_input("/nonexistent/molecules.sdf").is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.sdf");
        std::fs::write(&path, "").unwrap();
        assert_eq!(check_input(path.to_str().unwrap()).unwrap(), path);
    }

    const CYCLOHEXANE: &str = "\
cyclohexane
     RDKit          2D

  6  6  0  0  0  0  0  0  0  0999 V2000
    1.5000    0.0000    0.0000 C   0  0
    0.7500    1.2990    0.0000 C   0  0
   -0.7500    1.2990    0.0000 C   0  0
   -1.5000    0.0000    0.0000 C   0  0
   -0.7500   -1.2990    0.0000 C   0  0
    0.7500   -1.2990    0.0000 C   0  0
  1  2  1  0
  2  3  1  0
  3  4  1  0
  4  5  1  0
  5  6  1  0
  6  1  1  0
M  END
$$$$
";

    /// A cyclohexane block whose last bond has an invalid order code.
    fn broken_block() -> String {
        CYCLOHEXANE.replacen("  6  1  1  0", "  6  1  9  0", 1)
    }

    /// Cyclohexane plus a detached chloride.
    fn salt_block() -> String {
        CYCLOHEXANE
            .replacen("  6  6  0", "  7  6  0", 1)
            .replacen(
                "  1  2  1  0",
                "    4.0000    0.0000    0.0000 Cl  0  5\n  1  2  1  0",
                1,
            )
    }

    fn no_overrides() -> CommonOptions {
        CommonOptions {
            config: None,
            bond_length: None,
        }
    }

    #[test]
    fn extract_steps_over_malformed_records() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.sdf");
        let output = dir.path().join("out.smi");
        let text = [CYCLOHEXANE, CYCLOHEXANE, broken_block().as_str(), CYCLOHEXANE].concat();
        std::fs::write(&input, text).unwrap();

        extract(
            input.to_str().unwrap(),
            Some(output.to_str().unwrap()),
            None,
            false,
            &no_overrides(),
        )
        .unwrap();
        let records = library::load(&output).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.as_str(), "C1CCCCC1");
    }

    #[test]
    fn build_keeps_largest_component_and_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.sdf");
        let output = dir.path().join("lib.smi");
        let text = [salt_block(), broken_block(), CYCLOHEXANE.to_owned()].concat();
        std::fs::write(&input, text).unwrap();

        build(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            &no_overrides(),
        )
        .unwrap();
        let records = library::load(&output).unwrap();
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.key.as_str(), "C1CCCCC1");
            assert_eq!(record.entry.structure().atom_count(), 6);
        }
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["ring-templates", "extract", "in.sdf", "-o", "out.smi"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Extract { ref output, .. } if output.as_deref() == Some("out.smi")
        ));
        assert!(Cli::try_parse_from(["ring-templates", "build", "in.sdf"]).is_err());
    }
}
