use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use mdtree::logging::init_logging;
use mdtree::{NodeHandle, ProjectList, Settings, TreeError, TreeIndex};

#[derive(Parser)]
#[command(name = "mdtree")]
#[command(about = "Browse markdown documents across several project folders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to settings file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Path to projects file (overrides the settings file)
    #[arg(short, long)]
    projects: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the project tree (or the tree of a single folder)
    Tree {
        /// Folder to show instead of the saved projects
        path: Option<PathBuf>,
        /// How many levels below each root to print
        #[arg(short, long)]
        depth: Option<u32>,
    },
    /// List the visible entries of a folder
    Ls {
        /// Folder to list
        path: PathBuf,
    },
    /// Show where a path sits in the project tree
    Locate {
        /// File or folder inside one of the projects
        path: PathBuf,
    },
    /// Manage saved projects
    Projects {
        #[command(subcommand)]
        action: ProjectsCommand,
    },
}

#[derive(Subcommand)]
enum ProjectsCommand {
    /// List saved projects
    List,
    /// Save a folder as a project
    Add {
        /// Display name for the project
        name: String,
        /// Project folder (defaults to the current directory)
        path: Option<PathBuf>,
    },
    /// Remove every project with this name
    Remove {
        /// Project name
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let settings_path = if let Some(config) = &cli.config {
        PathBuf::from(shellexpand::tilde(config).to_string())
    } else {
        Settings::default_path()
    };
    let settings = Settings::load(&settings_path).context("Failed to load settings")?;

    let projects_path = if let Some(projects) = &cli.projects {
        PathBuf::from(shellexpand::tilde(projects).to_string())
    } else {
        settings.projects_path()
    };

    let command = cli.command.unwrap_or(Commands::Tree {
        path: None,
        depth: None,
    });

    match command {
        Commands::Tree { path, depth } => {
            let index = TreeIndex::new();
            match path {
                Some(path) => {
                    index
                        .set_single_root(&path)
                        .with_context(|| format!("Could not open {}", path.display()))?;
                }
                None => {
                    let projects = ProjectList::load(&projects_path)
                        .context("Failed to load projects")?;
                    index.load_roots(projects.root_entries());
                }
            }

            if index.root_count() == 0 {
                println!("No projects found. Run 'mdtree projects add <name> <path>' to add one.");
                return Ok(());
            }

            let printer = TreePrinter {
                index: &index,
                max_depth: depth.unwrap_or(settings.display.max_depth),
                show_icons: settings.display.show_icons,
            };
            for root in index.roots() {
                printer.print(&root, 0)?;
            }
        }
        Commands::Ls { path } => {
            let index = load_index(&projects_path)?;
            let node = match index.handle_for_path(&path) {
                Ok(node) => node,
                // Not inside any project: browse the folder on its own
                Err(TreeError::OutOfScope(_)) => index
                    .set_single_root(&path)
                    .with_context(|| format!("Could not open {}", path.display()))?,
                Err(err) => return Err(err.into()),
            };

            let printer = TreePrinter {
                index: &index,
                max_depth: 0,
                show_icons: settings.display.show_icons,
            };
            let children = index.children_of(&node)?;
            if children.is_empty() {
                println!(
                    "(no folders or {} files)",
                    index.filter().suffixes().join(", ")
                );
            }
            for child in children {
                printer.print(&child, 0)?;
            }
        }
        Commands::Locate { path } => {
            let index = load_index(&projects_path)?;
            let node = index
                .handle_for_path(&path)
                .with_context(|| format!("{} is not inside any project", path.display()))?;

            let mut chain = vec![node.clone()];
            while let Some(parent) = index.parent_of(chain.last().unwrap_or(&node))? {
                chain.push(parent);
            }
            chain.reverse();

            let mut crumbs = Vec::with_capacity(chain.len());
            for step in &chain {
                crumbs.push(format!(
                    "{} [row {}]",
                    index.display_name(step)?,
                    index.row_of(step)?
                ));
            }
            println!("{}", crumbs.join(" > "));
            println!("{}", index.resolve_path(&node)?.display());
        }
        Commands::Projects { action } => {
            let mut projects =
                ProjectList::load(&projects_path).context("Failed to load projects")?;

            match action {
                ProjectsCommand::List => {
                    if projects.is_empty() {
                        println!("No projects saved.");
                    } else {
                        println!("{:<24} {:<60} {:<8}", "Name", "Path", "Status");
                        println!("{}", "-".repeat(94));
                        for project in &projects.projects {
                            let expanded = shellexpand::tilde(&project.path).to_string();
                            let status = if Path::new(&expanded).exists() {
                                "ok"
                            } else {
                                "missing"
                            };
                            println!(
                                "{:<24} {:<60} {:<8}",
                                project.name,
                                truncate_path(&project.path, 60),
                                status
                            );
                        }
                    }
                }
                ProjectsCommand::Add { name, path } => {
                    let path = match path {
                        Some(path) => path,
                        None => std::env::current_dir()
                            .context("Failed to determine current directory")?,
                    };
                    if !path.is_dir() {
                        anyhow::bail!("{} is not a folder", path.display());
                    }
                    projects.add(&name, &path)?;
                    projects.save(&projects_path)?;
                    println!("Added project '{}' ({})", name, path.display());
                }
                ProjectsCommand::Remove { name } => {
                    let removed = projects.remove(&name);
                    if removed == 0 {
                        println!("No project named '{}'", name);
                    } else {
                        projects.save(&projects_path)?;
                        println!("Removed {} project(s) named '{}'", removed, name);
                    }
                }
            }
        }
    }

    Ok(())
}

fn load_index(projects_path: &Path) -> Result<TreeIndex> {
    let projects = ProjectList::load(projects_path).context("Failed to load projects")?;
    Ok(TreeIndex::with_roots(projects.root_entries()))
}

struct TreePrinter<'a> {
    index: &'a TreeIndex,
    max_depth: u32,
    show_icons: bool,
}

impl TreePrinter<'_> {
    fn print(&self, node: &NodeHandle, depth: u32) -> mdtree::Result<()> {
        let is_dir = self.index.is_directory(node)?;
        let icon = match (self.show_icons, is_dir) {
            (false, _) => "",
            (true, true) => "📁 ",
            (true, false) => "📄 ",
        };
        println!(
            "{}{}{}",
            "  ".repeat(depth as usize),
            icon,
            self.index.display_name(node)?
        );

        if is_dir && depth < self.max_depth {
            for child in self.index.children_of(node)? {
                self.print(&child, depth + 1)?;
            }
        }
        Ok(())
    }
}

/// Shorten a path to `max_len` characters, keeping its first and last
/// components and eliding the middle
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() > 4 {
        let shortened = format!(
            "{}/.../{}",
            parts[..2].join("/"),
            parts[parts.len() - 2..].join("/")
        );
        if shortened.chars().count() <= max_len {
            return shortened;
        }
    }

    let tail: String = path
        .chars()
        .rev()
        .take(max_len.saturating_sub(3))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{}", tail)
}
