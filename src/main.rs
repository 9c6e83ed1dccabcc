use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use icsnet::api::{HttpApiClient, SimulationApi};
use icsnet::config::EditorConfig;
use icsnet::ip::Subnet;
use icsnet::orchestrator::{self, SaveOutcome};
use icsnet::run::{run_to_completion, RunState};
use icsnet::validation::{validate, Diagnostic};
use icsnet::{config_loader, topology::NetworkDocument};
use log::info;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

/// Editor tooling for simulated Modbus networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the editor configuration YAML file
    #[arg(short, long, default_value = "icsnet.yaml")]
    config: PathBuf,

    /// Log filter, overrides the configuration file
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a network document and print every diagnostic
    Validate {
        file: PathBuf,
    },
    /// Generate a starter network, locally or on the server
    Create {
        /// Address range, e.g. 10.0.0.0/24
        #[arg(long)]
        subnet: Subnet,
        #[arg(long, default_value_t = 1)]
        masters: u32,
        #[arg(long, default_value_t = 1)]
        slaves: u32,
        /// Write the document to this file
        #[arg(short, long, required_unless_present = "remote")]
        output: Option<PathBuf>,
        /// Create the scenario on the server under this name instead
        #[arg(long, conflicts_with = "output")]
        remote: Option<String>,
    },
    /// Write simulator configuration for a network document
    Export {
        file: PathBuf,
        output_dir: PathBuf,
    },
    /// List the scenarios stored on the server
    Scenarios,
    /// Validate a network document and store it on the server
    Save {
        file: PathBuf,
        #[arg(short, long)]
        name: String,
        /// Save despite warnings without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Run a stored scenario and follow its progress
    Run {
        name: String,
        /// Simulation time in whole seconds
        #[arg(short, long)]
        time: String,
    },
    /// Stop the running simulation
    Stop,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();
    let config = config_loader::load_or_default(Some(&args.config))?;

    // Initialize logging with default filter level of "info"
    let filter = args
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    info!("Using server {}", config.server.url);
    execute(args.command, &config)
}

fn execute(command: Command, config: &EditorConfig) -> Result<()> {
    match command {
        Command::Validate { file } => {
            let document = orchestrator::read_document(&file)?;
            let diagnostics = validate(&document.into_snapshot());
            print_diagnostics(&diagnostics);
            let errors = diagnostics.iter().filter(|d| d.is_error()).count();
            if errors > 0 {
                bail!("{} validation errors in {}", errors, file.display());
            }
            Ok(())
        }
        Command::Create { subnet, masters, slaves, output, remote } => match (output, remote) {
            (_, Some(name)) => {
                let message = orchestrator::create_scenario(&client(config)?, &name, subnet, masters, slaves, config)?;
                println!("{}", message);
                Ok(())
            }
            (Some(path), None) => {
                let document = orchestrator::create_document(subnet, masters, slaves, config)?;
                orchestrator::write_document(&path, &document)?;
                info!("Starter network written to {:?}", path);
                Ok(())
            }
            (None, None) => bail!("Either --output or --remote is required"),
        },
        Command::Export { file, output_dir } => {
            let document = orchestrator::read_document(&file)?;
            orchestrator::export_document(document, &output_dir)
        }
        Command::Scenarios => {
            let names = client(config)?.list_scenarios().wrap_err("Failed to list scenarios")?;
            for name in names {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Save { file, name, yes } => {
            let document: NetworkDocument = orchestrator::read_document(&file)?;
            let snapshot = document.into_snapshot();
            let outcome = orchestrator::save_scenario(&client(config)?, &name, &snapshot, |warnings| {
                print_diagnostics(warnings);
                yes || confirm("Save anyway?")
            })?;
            match outcome {
                SaveOutcome::Saved(message) => {
                    println!("{}", message);
                    Ok(())
                }
                SaveOutcome::Refused(errors) => {
                    print_diagnostics(&errors);
                    bail!("Scenario '{}' not saved: {} errors", name, errors.len())
                }
                SaveOutcome::Declined(_) => {
                    println!("Not saved");
                    Ok(())
                }
            }
        }
        Command::Run { name, time } => {
            let api = client(config)?;
            let cancel = AtomicBool::new(false);
            let state = run_to_completion(&api, &name, &time, config.run.poll_interval, &cancel, |progress| {
                println!("{}", progress);
            })?;
            match state {
                RunState::Completed { output } => {
                    println!("Simulation finished, capture written to {}", output);
                    Ok(())
                }
                RunState::Failed { error } => bail!("Simulation failed: {}", error),
                other => {
                    println!("Simulation {}", other);
                    Ok(())
                }
            }
        }
        Command::Stop => {
            client(config)?.stop_run().wrap_err("Failed to stop simulation")?;
            println!("Simulation stopped");
            Ok(())
        }
    }
}

fn client(config: &EditorConfig) -> Result<HttpApiClient> {
    HttpApiClient::from_config(&config.server).wrap_err("Failed to create API client")
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        println!("{}", diagnostic);
    }
}

fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["icsnet", "run", "plant", "--time", "60"]);
        assert_eq!(args.config, PathBuf::from("icsnet.yaml"));
        match args.command {
            Command::Run { name, time } => {
                assert_eq!(name, "plant");
                assert_eq!(time, "60");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_create_args() {
        let args = Args::parse_from([
            "icsnet", "create", "--subnet", "10.0.0.0/24", "--slaves", "3", "--output", "net.json",
        ]);
        match args.command {
            Command::Create { subnet, masters, slaves, output, remote } => {
                assert_eq!(subnet.to_string(), "10.0.0.0/24");
                assert_eq!((masters, slaves), (1, 3));
                assert_eq!(output, Some(PathBuf::from("net.json")));
                assert_eq!(remote, None);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Args::try_parse_from(["icsnet", "create", "--subnet", "10.0.0.0/24"]).is_err());
        assert!(Args::try_parse_from(["icsnet", "create", "--subnet", "10.0.0.0/99", "-o", "x"]).is_err());
    }

    #[test]
    fn test_create_then_validate() {
        let file = NamedTempFile::new().unwrap();
        let config = EditorConfig::default();
        execute(
            Command::Create {
                subnet: "10.0.0.0/24".parse().unwrap(),
                masters: 1,
                slaves: 1,
                output: Some(file.path().to_path_buf()),
                remote: None,
            },
            &config,
        )
        .unwrap();

        // Starter networks only carry warnings
        execute(Command::Validate { file: file.path().to_path_buf() }, &config).unwrap();
    }
}
