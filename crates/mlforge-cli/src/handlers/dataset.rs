//! Dataset and dataset version command handler.

use anyhow::Result;

use mlforge_core::NewDataset;

use crate::bootstrap::CliContext;
use crate::commands::{DatasetCommand, VersionCommand};
use crate::presentation::{format_timestamp, print_separator, truncate_string};

pub async fn execute(ctx: &CliContext, command: DatasetCommand) -> Result<()> {
    match command {
        DatasetCommand::Create {
            name,
            data_type,
            source_type,
            target_type,
            comments,
        } => {
            let dataset = ctx
                .catalog
                .create_dataset(NewDataset {
                    name,
                    owner: ctx.owner.clone(),
                    data_type,
                    source_type,
                    target_type,
                    comments,
                })
                .await?;
            println!(
                "✓ Dataset '{}' created (ID: {}, {})",
                dataset.name, dataset.id, dataset.data_type
            );
        }
        DatasetCommand::List => {
            let datasets = ctx.catalog.list_datasets(&ctx.owner).await?;
            if datasets.is_empty() {
                println!("No datasets found.");
                return Ok(());
            }
            println!(
                "{:<5} {:<25} {:<5} {:<8} {:<8} Created",
                "ID", "Name", "Type", "Source", "Target"
            );
            print_separator(80);
            for dataset in datasets {
                println!(
                    "{:<5} {:<25} {:<5} {:<8} {:<8} {}",
                    dataset.id,
                    truncate_string(&dataset.name, 24),
                    dataset.data_type,
                    truncate_string(&dataset.source_type, 8),
                    truncate_string(&dataset.target_type, 8),
                    format_timestamp(&dataset.created_at)
                );
            }
        }
        DatasetCommand::Comment { id, comments } => {
            ctx.catalog
                .update_dataset_comments(&ctx.owner, id, comments.as_deref())
                .await?;
            println!("✓ Dataset {id} comments updated");
        }
        DatasetCommand::Delete { id } => {
            ctx.catalog.delete_dataset(&ctx.owner, id).await?;
            println!("✓ Dataset {id} deleted");
        }
        DatasetCommand::Version { command } => execute_version(ctx, command).await?,
    }
    Ok(())
}

async fn execute_version(ctx: &CliContext, command: VersionCommand) -> Result<()> {
    match command {
        VersionCommand::Add {
            dataset_id,
            version,
            uri,
        } => {
            let created = ctx
                .catalog
                .add_version(&ctx.owner, dataset_id, &version, &uri)
                .await?;
            let sample = created.sample.unwrap_or_default();
            println!(
                "✓ Version '{}' added (ID: {}), {} columns, {} sample rows",
                created.version,
                created.id,
                sample.header_map.len(),
                sample.rows.len()
            );
        }
        VersionCommand::List { dataset_id } => {
            let versions = ctx.catalog.list_versions(&ctx.owner, dataset_id).await?;
            if versions.is_empty() {
                println!("Dataset {dataset_id} has no versions.");
                return Ok(());
            }
            println!("{:<5} {:<12} {:<20} URI", "ID", "Version", "Created");
            print_separator(80);
            for version in versions {
                println!(
                    "{:<5} {:<12} {:<20} {}",
                    version.id,
                    truncate_string(&version.version, 12),
                    format_timestamp(&version.created_at),
                    version.uri
                );
            }
        }
        VersionCommand::Delete { version_id } => {
            ctx.catalog.delete_version(&ctx.owner, version_id).await?;
            println!("✓ Version {version_id} deleted");
        }
    }
    Ok(())
}
