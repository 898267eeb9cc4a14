//! Project command handler.

use anyhow::Result;

use mlforge_core::NewProject;

use crate::bootstrap::CliContext;
use crate::commands::ProjectCommand;
use crate::presentation::{format_optional, format_timestamp, print_separator, truncate_string};

pub async fn execute(ctx: &CliContext, command: ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::Create { name, description } => {
            let project = ctx
                .catalog
                .create_project(NewProject {
                    name,
                    description,
                    owner: ctx.owner.clone(),
                })
                .await?;
            println!("✓ Project '{}' created (ID: {})", project.name, project.id);
        }
        ProjectCommand::List => {
            let projects = ctx.catalog.list_projects(&ctx.owner).await?;
            if projects.is_empty() {
                println!("No projects found.");
                println!("Use 'mlforge project create <name>' to add one.");
                return Ok(());
            }
            println!("{:<5} {:<25} {:<20} Description", "ID", "Name", "Created");
            print_separator(80);
            for project in projects {
                println!(
                    "{:<5} {:<25} {:<20} {}",
                    project.id,
                    truncate_string(&project.name, 24),
                    format_timestamp(&project.created_at),
                    format_optional(project.description.as_deref(), "")
                );
            }
        }
        ProjectCommand::Delete { id } => {
            ctx.catalog.delete_project(&ctx.owner, id).await?;
            println!("✓ Project {id} deleted");
        }
    }
    Ok(())
}
