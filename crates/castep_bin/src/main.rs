use std::path::PathBuf;

use anyhow::Context;
use castep::{Config, Filter};
use clap::Parser;
use log::info;

/// read CASTEP structures, charges, and phonon modes
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// .cell, .castep, .phonon, .geom, or .ts file to read
    #[arg(value_parser)]
    infile: PathBuf,

    /// TOML configuration file. Options given on the command line take
    /// precedence over its contents
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Filter keywords like `q=all` or `q=(1/2 0 0), charge=hirshfeld`
    #[arg(short, long)]
    filter: Option<String>,

    /// Build an nx×ny×nz supercell and read the q-points commensurate with it
    #[arg(short, long, num_args = 3, value_names = ["NX", "NY", "NZ"])]
    supercell: Option<Vec<usize>>,

    /// Read only this 1-based vibration. 0 reads all of them
    #[arg(short, long)]
    vibration: Option<usize>,

    /// Read only this 1-based structure from .castep output
    #[arg(short, long)]
    model: Option<usize>,

    /// Store phonon modes as steps of one trajectory
    #[arg(short, long, default_value_t = false)]
    trajectory: bool,

    /// Writes the output in JSON format for use by other programs
    #[arg(short, long, default_value_t = false)]
    json: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::new(),
        };
        if let Some(f) = &self.filter {
            let filter: Filter =
                f.parse().with_context(|| format!("parsing filter `{f}`"))?;
            config = config.filter(filter);
        }
        if let Some(&[nx, ny, nz]) = self.supercell.as_deref() {
            config = config.supercell(nx, ny, nz);
        }
        if let Some(n) = self.vibration {
            config = config.vibration(n);
        }
        if let Some(n) = self.model {
            config = config.model(n);
        }
        if self.trajectory {
            config = config.trajectory(true);
        }
        config.validate().context("checking options")?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.config()?;
    info!("{config}");
    let asc = castep::read_file(&args.infile, config)
        .with_context(|| format!("reading {}", args.infile.display()))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&asc)?);
        return Ok(());
    }
    print!("{asc}");
    for note in &asc.notes {
        println!("note: {note}");
    }
    Ok(())
}
