use anyhow::{Context, Result, bail};
use clap::Subcommand;
use stratboard_core::{Catalog, Persistence, Project, Storage};

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    /// List projects, most recently edited first
    List,
    /// Create a project
    New {
        /// Project name (defaults to "<framework> Analysis" with --framework)
        name: Option<String>,
        /// Start the board with this framework
        #[arg(long)]
        framework: Option<String>,
    },
    /// Delete a project and its board
    Delete { id: String },
    /// Rename a project
    Rename { id: String, name: String },
}

fn print_project(project: &Project) {
    println!(
        "{:<40} {:<32} {}",
        project.id,
        project.name,
        project.updated_at.format("%Y-%m-%d %H:%M")
    );
}

pub async fn run<S: Storage>(persistence: &Persistence<S>, command: &ProjectsCommand) -> Result<()> {
    match command {
        ProjectsCommand::List => {
            let projects = persistence.list_projects().await?;
            if projects.is_empty() {
                println!("No projects yet. Create one with `stratboard projects new <name>`.");
            }
            for project in &projects {
                print_project(project);
            }
        }
        ProjectsCommand::New { name, framework } => {
            let project = match framework {
                Some(id) => {
                    let framework = Catalog::builtin()
                        .get(id)
                        .with_context(|| format!("unknown framework '{}'", id))?;
                    let (project, _) = persistence.create_project_from_framework(framework).await?;
                    match name {
                        Some(name) => persistence.rename_project(&project.id, name).await?,
                        None => project,
                    }
                }
                None => {
                    let name = name.as_deref().context("a project name is required")?;
                    persistence.create_project(name).await?
                }
            };
            print_project(&project);
        }
        ProjectsCommand::Delete { id } => {
            if !persistence.delete_project(id).await? {
                bail!("no project with id '{}'", id);
            }
            println!("Deleted {}", id);
        }
        ProjectsCommand::Rename { id, name } => {
            let project = persistence.rename_project(id, name).await?;
            print_project(&project);
        }
    }
    Ok(())
}
