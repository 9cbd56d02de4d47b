use clap::{Parser, Subcommand};
use lectern::config::{Config, default_config_paths};

use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct ConfigCommand {
    #[clap(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[clap(about = "Print the effective configuration")]
    Show,

    #[clap(about = "List the config file search paths")]
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        match self.action {
            ConfigAction::Show => match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
                OutputFormat::Table => print!("{}", toml::to_string_pretty(config)?),
            },
            ConfigAction::Path => {
                let paths: Vec<_> = default_config_paths()
                    .into_iter()
                    .map(|p| (p.exists(), p))
                    .collect();
                match format {
                    OutputFormat::Json => {
                        let output: Vec<_> = paths
                            .iter()
                            .map(|(exists, path)| {
                                serde_json::json!({
                                    "path": path.display().to_string(),
                                    "exists": exists,
                                })
                            })
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Table => {
                        for (exists, path) in &paths {
                            let marker = if *exists { "*" } else { " " };
                            println!("{marker} {}", path.display());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
