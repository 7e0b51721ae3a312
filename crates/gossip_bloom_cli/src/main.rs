use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gossip_bloom::{Bloom, BloomConfig, Digest};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "gossip_bloom", about = "Bloom filter sizing and pull-request filtering")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

/// Sizing inputs. Flags override values from `--config`.
#[derive(Args, Clone)]
struct SizingArgs {
    /// JSON file with num_items / false_positive_rate / max_bits
    #[arg(long)]
    config: Option<PathBuf>,
    /// Expected number of items
    #[arg(long)]
    items: Option<u64>,
    #[arg(long)]
    fp_rate: Option<f64>,
    /// Upper bound on the filter length in bits (0 = single-bit filter)
    #[arg(long)]
    max_bits: Option<u64>,
}

impl SizingArgs {
    fn resolve(&self) -> Result<BloomConfig> {
        let mut cfg = match &self.config {
            Some(p) => BloomConfig::load(p)
                .with_context(|| format!("loading config {}", p.display()))?,
            None => BloomConfig::default(),
        };
        if let Some(n) = self.items {
            cfg.num_items = n;
        }
        if let Some(p) = self.fp_rate {
            cfg.false_positive_rate = p;
        }
        if let Some(m) = self.max_bits {
            cfg.max_bits = m;
        }
        Ok(cfg)
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the bit length and key count chosen for the given load
    Plan {
        #[command(flatten)]
        sizing: SizingArgs,
    },

    /// Fill a filter with random digests and measure its false-positive rate
    Simulate {
        #[command(flatten)]
        sizing: SizingArgs,
        #[arg(long, default_value_t = 10_000)]
        probes: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Print the candidate items a peer holding `known` would still need
    Filter {
        /// One item per line
        #[arg(long)]
        known: PathBuf,
        /// One item per line
        #[arg(long)]
        candidates: PathBuf,
        #[arg(long)]
        fp_rate: Option<f64>,
        #[arg(long)]
        max_bits: Option<u64>,
        /// Seed for the filter keys; random when omitted
        #[arg(long)]
        seed: Option<u64>,
        /// Prefix each line with its hex digest
        #[arg(long, default_value_t = false)]
        show_digest: bool,
    },
}

#[derive(Serialize)]
struct SimulationReport {
    inserted: u64,
    probes: usize,
    false_positives: usize,
    observed_rate: f64,
    target_rate: f64,
    estimated_rate: f64,
    num_bits: u64,
    num_keys: usize,
    num_bits_set: u64,
}

fn random_digest(rng: &mut StdRng) -> Digest {
    let mut d = [0u8; 32];
    rng.fill_bytes(&mut d);
    d
}

fn item_digest(item: &str) -> Digest {
    Sha256::digest(item.as_bytes()).into()
}

fn read_items(path: &Path) -> Result<Vec<String>> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect())
}

fn simulate(cfg: &BloomConfig, probes: usize, seed: u64) -> Result<SimulationReport> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bloom = cfg.build_with_rng(&mut rng)?;
    // replay the same digest stream for the check instead of holding it
    let mut replay = rng.clone();
    for _ in 0..cfg.num_items {
        bloom.add(&random_digest(&mut rng));
    }
    for i in 0..cfg.num_items {
        if !bloom.contains(&random_digest(&mut replay)) {
            bail!("false negative for inserted digest #{i}");
        }
    }
    let false_positives = (0..probes)
        .filter(|_| bloom.contains(&random_digest(&mut rng)))
        .count();
    let observed_rate = if probes > 0 {
        false_positives as f64 / probes as f64
    } else {
        0.0
    };
    Ok(SimulationReport {
        inserted: cfg.num_items,
        probes,
        false_positives,
        observed_rate,
        target_rate: cfg.false_positive_rate,
        estimated_rate: bloom.estimated_false_positive_rate(),
        num_bits: bloom.num_bits(),
        num_keys: bloom.num_keys(),
        num_bits_set: bloom.num_bits_set(),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Plan { sizing } => {
            // zero items is a valid plan: a keyless filter
            let cfg = sizing.resolve()?;
            cfg.validate_rate()?;
            println!("{}", serde_json::to_string_pretty(&cfg.sizing())?);
        }
        Cmd::Simulate { sizing, probes, seed } => {
            let cfg = sizing.resolve()?;
            cfg.validate()?;
            info!(num_items = cfg.num_items, probes, seed, "simulating");
            let report = simulate(&cfg, probes, seed)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Cmd::Filter {
            known,
            candidates,
            fp_rate,
            max_bits,
            seed,
            show_digest,
        } => {
            let known = read_items(&known)?;
            let candidates = read_items(&candidates)?;
            let defaults = BloomConfig::default();
            let cfg = BloomConfig {
                // an empty filter would report every candidate as held
                num_items: known.len().max(1) as u64,
                false_positive_rate: fp_rate.unwrap_or(defaults.false_positive_rate),
                max_bits: max_bits.unwrap_or(defaults.max_bits),
            };
            let mut bloom: Bloom = match seed {
                Some(s) => cfg.build_with_rng(&mut StdRng::seed_from_u64(s))?,
                None => cfg.build()?,
            };
            for item in &known {
                bloom.add(&item_digest(item));
            }
            let mut sent = 0usize;
            for item in &candidates {
                let d = item_digest(item);
                if bloom.contains(&d) {
                    continue;
                }
                sent += 1;
                if show_digest {
                    println!("{} {item}", hex::encode(d));
                } else {
                    println!("{item}");
                }
            }
            info!(
                known = known.len(),
                candidates = candidates.len(),
                sent,
                saturation = bloom.saturation(),
                "filtered candidates"
            );
        }
    }
    Ok(())
}
