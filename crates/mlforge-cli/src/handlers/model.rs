//! Model command handler.

use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use mlforge_core::{Model, ModelStatus, NewModel, StorageDescriptor};

use crate::bootstrap::CliContext;
use crate::commands::ModelCommand;
use crate::error::CliError;
use crate::presentation::{display_model, display_summary, print_separator, truncate_string};

pub async fn execute(ctx: &CliContext, command: ModelCommand) -> Result<()> {
    match command {
        ModelCommand::Create {
            name,
            analysis,
            version,
            storage_type,
            storage_location,
        } => {
            let storage_target = storage_type
                .zip(storage_location)
                .map(|(storage_type, location)| StorageDescriptor::new(storage_type, location));
            let model = ctx
                .catalog
                .create_model(NewModel {
                    name,
                    analysis_id: analysis,
                    dataset_version_id: version,
                    owner: ctx.owner.clone(),
                    storage_target,
                })
                .await?;
            println!("✓ Model '{}' created (ID: {})", model.name, model.id);
        }
        ModelCommand::List => list(ctx).await?,
        ModelCommand::Show { model } => {
            let model = ctx.catalog.find_model(&ctx.owner, &model).await?;
            display_model(&model);
        }
        ModelCommand::Storage {
            model,
            storage_type,
            location,
        } => {
            let model = ctx.catalog.find_model(&ctx.owner, &model).await?;
            ctx.catalog
                .set_model_storage_target(
                    &ctx.owner,
                    model.id,
                    &StorageDescriptor::new(storage_type, location),
                )
                .await?;
            println!("✓ Storage target of model '{}' updated", model.name);
        }
        ModelCommand::Build { model, wait } => build(ctx, &model, wait).await?,
        ModelCommand::Predict { model, rows } => {
            let model = ctx.catalog.find_model(&ctx.owner, &model).await?;
            let rows = read_rows(&rows).await?;
            let predictions = ctx
                .orchestrator
                .predict(&ctx.owner, model.id, &rows)
                .await?;
            println!("{}", serde_json::to_string(&predictions)?);
        }
        ModelCommand::Delete { model } => {
            let model = ctx.catalog.find_model(&ctx.owner, &model).await?;
            ctx.catalog.delete_model(&ctx.owner, model.id).await?;
            println!("✓ Model '{}' deleted", model.name);
        }
    }
    Ok(())
}

async fn list(ctx: &CliContext) -> Result<()> {
    let models = ctx.catalog.list_models(&ctx.owner).await?;
    if models.is_empty() {
        println!("No models found.");
        println!("Use 'mlforge model create <name> --analysis <id> --version <id>' to add one.");
        return Ok(());
    }
    println!(
        "{:<5} {:<25} {:<10} {:<9} {:<8} Artifact",
        "ID", "Name", "Status", "Analysis", "Version"
    );
    print_separator(90);
    for model in models {
        println!(
            "{:<5} {:<25} {:<10} {:<9} {:<8} {}",
            model.id,
            truncate_string(&model.name, 24),
            model.status,
            model.analysis_id,
            model.dataset_version_id,
            artifact_location(&model)
        );
    }
    Ok(())
}

fn artifact_location(model: &Model) -> &str {
    model.storage.as_ref().map_or("--", |s| s.location.as_str())
}

/// Submit a build. The job runs inside this process, so the command always
/// waits for it before exiting; `--wait` also prints the outcome in full.
async fn build(ctx: &CliContext, identifier: &str, wait: bool) -> Result<()> {
    let model = ctx.catalog.find_model(&ctx.owner, identifier).await?;
    let handle = ctx.orchestrator.submit_build(&ctx.owner, model.id).await?;
    println!("✓ Build accepted for model '{}' (ID: {})", model.name, model.id);

    handle.wait().await;
    let status = ctx.orchestrator.model_status(&ctx.owner, model.id).await?;

    match status.status {
        ModelStatus::Completed => {
            let location = status.storage.as_ref().map_or("--", |s| s.location.as_str());
            println!("✓ Build completed, artifact at {location}");
            if wait {
                if let Some(summary) = &status.summary {
                    display_summary(summary);
                }
            }
            Ok(())
        }
        ModelStatus::Failed => Err(CliError::Core(format!(
            "build of model '{}' failed: {}",
            model.name,
            status.error.as_deref().unwrap_or("no detail recorded")
        ))
        .into()),
        ModelStatus::Building => {
            println!("Build of model '{}' is still running", model.name);
            Ok(())
        }
    }
}

/// Read prediction rows from a JSON file: an array of arrays whose cells
/// are strings, numbers or `null` (missing).
async fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, CliError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    parse_rows(&text)
}

fn parse_rows(text: &str) -> Result<Vec<Vec<String>>, CliError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CliError::Arguments(format!("rows file is not valid JSON: {e}")))?;
    let Value::Array(rows) = value else {
        return Err(CliError::Arguments(
            "rows file must hold an array of rows".to_string(),
        ));
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let Value::Array(cells) = row else {
                return Err(CliError::Arguments(format!("row {i} is not an array")));
            };
            cells
                .into_iter()
                .map(|cell| match cell {
                    Value::String(s) => Ok(s),
                    Value::Number(n) => Ok(n.to_string()),
                    Value::Null => Ok(String::new()),
                    other => Err(CliError::Arguments(format!(
                        "row {i} has an unsupported cell {other}"
                    ))),
                })
                .collect()
        })
        .collect()
}
