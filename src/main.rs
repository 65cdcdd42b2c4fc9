use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use matcap_text::{DemoConfig, SpinMode};

#[derive(Parser, Debug, Clone)]
#[command(name = "matcap-text")]
#[command(about = "Extruded matcap text in a field of spinning tetrahedra", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Typeface JSON font
    #[arg(long)]
    font: Option<PathBuf>,

    /// Matcap image
    #[arg(long)]
    matcap: Option<PathBuf>,

    /// Label text
    #[arg(long)]
    text: Option<String>,

    /// Number of tetrahedra
    #[arg(long)]
    ornaments: Option<usize>,

    /// Spin strategy: integrate, guarded or legacy
    #[arg(long)]
    spin: Option<SpinMode>,

    /// Seed for ornament placement
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(DemoConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => DemoConfig::load(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => DemoConfig::default(),
        };

        if let Some(font) = self.font {
            config.assets.font = font;
        }
        if let Some(matcap) = self.matcap {
            config.assets.matcap = matcap;
        }
        if let Some(text) = self.text {
            config.label.text = text;
        }
        if let Some(count) = self.ornaments {
            config.ornaments.count = count;
        }
        if let Some(mode) = self.spin {
            config.spin.mode = mode;
        }
        if self.seed.is_some() {
            config.ornaments.seed = self.seed;
        }
        Ok((config, self.print_config))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config, print_config) = Cli::parse().into_config()?;
    if print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    log::debug!("starting with {config:?}");
    matcap_text::run(config).context("demo stopped with an error")
}
