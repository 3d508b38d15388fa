// drinv CLI - inspect and maintain bracketed inventory files

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use drinv::config::Config;
use drinv::inventory::{
    from_json, host_json, list_json, parse_host_pattern, to_json, HostFilter, Inventory,
};
use drinv::output::{diff_line_counts, format_check_diff, DrinvError, OutputFormat};

#[derive(Parser)]
#[command(
    name = "drinv",
    about = "Inspect and maintain host-group inventory files",
    version,
    disable_colored_help = true,
    term_width = 0,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the inventory file (defaults to `inventory` from the config)
    #[arg(short, long, global = true)]
    inventory: Option<PathBuf>,

    /// Path to the config file (defaults to ./drinv.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (text or json)
    #[arg(long, global = true)]
    output_format: Option<String>,
}

#[derive(Subcommand)]
#[command(disable_colored_help = true)]
enum Commands {
    /// Parse the inventory and show its groups and hosts
    Parse,

    /// Print the inventory in canonical form
    Fmt {
        /// Rewrite the file in place
        #[arg(short, long, conflicts_with = "check")]
        write: bool,

        /// Show a diff and fail if the file is not in canonical form
        #[arg(long)]
        check: bool,
    },

    /// List hosts matching a pattern
    Hosts {
        /// Host pattern: all, ungrouped, a group or host name, globs, comma lists
        #[arg(default_value = "all")]
        pattern: String,

        /// Limit to specific hosts (comma-separated)
        #[arg(short, long)]
        limit: Option<String>,

        /// Exclude specific hosts (comma-separated)
        #[arg(long)]
        exclude: Option<String>,
    },

    /// List groups with their host counts
    Groups,

    /// Print Ansible dynamic inventory JSON (--list)
    List,

    /// Print Ansible host variables JSON (--host)
    Host {
        /// Host name
        name: String,
    },

    /// Add hosts to a group, creating the group if needed
    AddHost {
        /// Group name
        group: String,

        /// Host names
        #[arg(required = true)]
        hosts: Vec<String>,
    },

    /// Remove hosts from every group
    RemoveHost {
        /// Host names
        #[arg(required = true)]
        hosts: Vec<String>,
    },

    /// Add an empty group
    AddGroup {
        /// Group name
        group: String,
    },

    /// Remove a group and its hosts
    RemoveGroup {
        /// Group name
        group: String,
    },

    /// Write the inventory from a JSON document
    Import {
        /// JSON document to read
        json: PathBuf,
    },

    /// Print the inventory as a JSON document
    Export,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), DrinvError> {
    let config = Config::load(cli.config.as_deref())?;

    let output_format = match cli.output_format.as_deref() {
        Some(format) => OutputFormat::from_str(format)?,
        None => config.output_format,
    };

    let path = config.resolve_inventory(cli.inventory)?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Parse => {
            let inventory = load(&path, &config)?;
            match output_format {
                OutputFormat::Text => print_tree(&inventory),
                OutputFormat::Json => println!("{}", to_json(&inventory)?),
            }
            Ok(())
        }
        Commands::Fmt { write, check } => format_inventory(&path, &config, write, check, quiet),
        Commands::Hosts {
            pattern,
            limit,
            exclude,
        } => list_hosts(&path, &config, &pattern, limit, exclude, output_format),
        Commands::Groups => list_groups(&path, &config, output_format),
        Commands::List => {
            let inventory = load(&path, &config)?;
            println!("{}", pretty(&list_json(&inventory)?));
            Ok(())
        }
        Commands::Host { name } => {
            let inventory = load(&path, &config)?;
            println!("{}", pretty(&host_json(&inventory, &name)));
            Ok(())
        }
        Commands::AddHost { group, hosts } => {
            let mut inventory = load_or_empty(&path, &config)?;
            let mut added = 0;
            for host in &hosts {
                if inventory.add_host(&group, host.as_str())? {
                    added += 1;
                }
            }
            save(&inventory, &path, &config)?;
            report(quiet, format!("Added {} host(s) to [{}]", added, group));
            Ok(())
        }
        Commands::RemoveHost { hosts } => {
            let mut inventory = load(&path, &config)?;
            let removed: usize = hosts.iter().map(|h| inventory.remove_host(h)).sum();
            if removed == 0 {
                return Err(DrinvError::Inventory {
                    message: format!("None of {} found in inventory", hosts.join(", ")),
                    suggestion: Some("Run 'drinv hosts' to see known hosts".to_string()),
                });
            }
            save(&inventory, &path, &config)?;
            report(quiet, format!("Removed {} host entries", removed));
            Ok(())
        }
        Commands::AddGroup { group } => {
            let mut inventory = load_or_empty(&path, &config)?;
            inventory.add_group(&group)?;
            save(&inventory, &path, &config)?;
            report(quiet, format!("Group [{}] present", group));
            Ok(())
        }
        Commands::RemoveGroup { group } => {
            let mut inventory = load(&path, &config)?;
            let removed = inventory
                .remove_group(&group)
                .ok_or_else(|| unknown_group(&group))?;
            save(&inventory, &path, &config)?;
            report(
                quiet,
                format!("Removed [{}] ({} hosts)", group, removed.len()),
            );
            Ok(())
        }
        Commands::Import { json } => {
            let content = std::fs::read_to_string(&json).map_err(|e| DrinvError::Io {
                message: format!("Failed to read JSON document: {}", e),
                path: Some(json.clone()),
            })?;
            let inventory = from_json(&content)?;
            save(&inventory, &path, &config)?;
            report(
                quiet,
                format!(
                    "Wrote {} group(s) to {}",
                    inventory.groups().len(),
                    path.display()
                ),
            );
            Ok(())
        }
        Commands::Export => {
            let inventory = load(&path, &config)?;
            println!("{}", to_json(&inventory)?);
            Ok(())
        }
    }
}

fn load(path: &Path, config: &Config) -> Result<Inventory, DrinvError> {
    Inventory::from_file_with(path, &config.parse_options())
}

fn load_or_empty(path: &Path, config: &Config) -> Result<Inventory, DrinvError> {
    if path.exists() {
        load(path, config)
    } else {
        tracing::info!(path = %path.display(), "inventory file not found, starting empty");
        Ok(Inventory::new().with_source_path(path))
    }
}

fn save(inventory: &Inventory, path: &Path, config: &Config) -> Result<(), DrinvError> {
    if config.single_group && inventory.groups().len() > 1 {
        return Err(DrinvError::Inventory {
            message: format!(
                "Inventory has {} groups but single_group is enabled",
                inventory.groups().len()
            ),
            suggestion: Some("Remove extra groups or disable single_group".to_string()),
        });
    }
    inventory.save(path)
}

fn unknown_group(group: &str) -> DrinvError {
    DrinvError::Inventory {
        message: format!("Group '{}' not found", group),
        suggestion: Some("Run 'drinv groups' to see available groups".to_string()),
    }
}

fn report(quiet: bool, message: String) {
    if !quiet {
        println!("{} {}", "✓".green(), message);
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn split_list(list: Option<String>) -> Option<Vec<String>> {
    list.map(|l| {
        l.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn format_inventory(
    path: &Path,
    config: &Config,
    write: bool,
    check: bool,
    quiet: bool,
) -> Result<(), DrinvError> {
    let current = std::fs::read_to_string(path).map_err(|e| DrinvError::Io {
        message: format!("Failed to read inventory file: {}", e),
        path: Some(path.to_path_buf()),
    })?;

    let inventory = drinv::inventory::parse_with(&current, &config.parse_options()).map_err(|e| {
        DrinvError::from(e)
            .with_file(path)
            .with_source(current.as_str())
    })?;
    let canonical = inventory.to_ini_string();

    if check {
        if current == canonical {
            report(quiet, format!("{} is formatted", path.display()));
            return Ok(());
        }
        let label = path.display().to_string();
        print!("{}", format_check_diff(&label, &current, &canonical));
        let (added, removed) = diff_line_counts(&current, &canonical);
        return Err(DrinvError::Inventory {
            message: format!(
                "{} is not formatted (+{} -{} lines)",
                path.display(),
                added,
                removed
            ),
            suggestion: Some("Run 'drinv fmt --write' to fix it".to_string()),
        });
    }

    if write {
        if current != canonical {
            inventory.save(path)?;
            report(quiet, format!("Formatted {}", path.display()));
        }
        return Ok(());
    }

    print!("{}", canonical);
    Ok(())
}

fn list_hosts(
    path: &Path,
    config: &Config,
    pattern: &str,
    limit: Option<String>,
    exclude: Option<String>,
    output_format: OutputFormat,
) -> Result<(), DrinvError> {
    let inventory = load(path, config)?;

    let mut filter = HostFilter::new();
    if let Some(limit) = split_list(limit) {
        filter = filter.with_limit(limit);
    }
    if let Some(exclude) = split_list(exclude) {
        filter = filter.with_exclude(exclude);
    }

    let selector = parse_host_pattern(pattern);
    let hosts = filter.apply(inventory.select(&selector));

    match output_format {
        OutputFormat::Json => println!("{}", pretty(&serde_json::json!(hosts))),
        OutputFormat::Text => {
            println!("{}", match_summary(hosts.len(), pattern));
            println!();
            for host in hosts {
                let groups = inventory.groups_of_host(host);
                if groups.is_empty() {
                    println!("  {} {}", "•".cyan(), host.white().bold());
                } else {
                    println!(
                        "  {} {} {}",
                        "•".cyan(),
                        host.white().bold(),
                        format!("({})", groups.join(", ")).dimmed()
                    );
                }
            }
        }
    }

    Ok(())
}

fn match_summary(count: usize, pattern: &str) -> String {
    format!("{} {} host(s) matching '{}'", "Found".green(), count, pattern.trim())
}

fn list_groups(path: &Path, config: &Config, output_format: OutputFormat) -> Result<(), DrinvError> {
    let inventory = load(path, config)?;

    match output_format {
        OutputFormat::Json => {
            let groups: Vec<serde_json::Value> = inventory
                .groups()
                .iter()
                .map(|g| serde_json::json!({ "name": g.name(), "hosts": g.len() }))
                .collect();
            println!("{}", pretty(&serde_json::Value::Array(groups)));
        }
        OutputFormat::Text => {
            println!("{}:", "Groups".green());
            for group in inventory.groups() {
                println!("  {} {} ({} hosts)", "•".cyan(), group.name(), group.len());
            }
            if !inventory.ungrouped_hosts().is_empty() {
                println!(
                    "  {} {} ({} hosts)",
                    "•".cyan(),
                    "ungrouped".dimmed(),
                    inventory.ungrouped_hosts().len()
                );
            }
        }
    }

    Ok(())
}

fn print_tree(inventory: &Inventory) {
    if let Some(path) = inventory.source_path() {
        println!("{} {}", "Inventory".green(), path.display());
    }

    if inventory.is_empty() {
        println!("  {}", "(empty)".dimmed());
        return;
    }

    if !inventory.ungrouped_hosts().is_empty() {
        println!("  {}", "ungrouped".dimmed());
        for host in inventory.ungrouped_hosts() {
            println!("    {} {}", "•".cyan(), host.name);
        }
    }

    for group in inventory.groups() {
        println!("  {}", format!("[{}]", group.name()).white().bold());
        for host in group.hosts() {
            println!("    {} {}", "•".cyan(), host.name);
        }
    }
}
