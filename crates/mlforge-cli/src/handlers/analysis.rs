//! Analysis command handler.

use anyhow::Result;

use mlforge_core::domain::HyperParameters;
use mlforge_core::services::AnalysisConfig;
use mlforge_core::{Feature, NewAnalysis};

use crate::bootstrap::CliContext;
use crate::commands::AnalysisCommand;
use crate::error::CliError;
use crate::presentation::{format_optional, format_timestamp, print_separator, truncate_string};

pub async fn execute(ctx: &CliContext, command: AnalysisCommand) -> Result<()> {
    match command {
        AnalysisCommand::Create {
            project_id,
            name,
            comments,
        } => {
            let analysis = ctx
                .catalog
                .create_analysis(NewAnalysis {
                    project_id,
                    name,
                    owner: ctx.owner.clone(),
                    comments,
                })
                .await?;
            println!(
                "✓ Analysis '{}' created (ID: {})",
                analysis.name, analysis.id
            );
        }
        AnalysisCommand::List { project_id } => {
            let analyses = ctx.catalog.list_analyses(&ctx.owner, project_id).await?;
            if analyses.is_empty() {
                println!("Project {project_id} has no analyses.");
                return Ok(());
            }
            println!("{:<5} {:<25} {:<20} Comments", "ID", "Name", "Created");
            print_separator(80);
            for analysis in analyses {
                println!(
                    "{:<5} {:<25} {:<20} {}",
                    analysis.id,
                    truncate_string(&analysis.name, 24),
                    format_timestamp(&analysis.created_at),
                    format_optional(analysis.comments.as_deref(), "")
                );
            }
        }
        AnalysisCommand::Delete { analysis_id } => {
            ctx.catalog.delete_analysis(&ctx.owner, analysis_id).await?;
            println!("✓ Analysis {analysis_id} deleted");
        }
        AnalysisCommand::Set {
            analysis_id,
            algorithm,
            algorithm_class,
            response,
            train_fraction,
        } => {
            let config = AnalysisConfig {
                algorithm_name: algorithm.map(|a| a.trim().to_ascii_uppercase()),
                algorithm_class,
                response_variable: response,
                train_data_fraction: train_fraction,
            };
            ctx.catalog
                .configure_analysis(&ctx.owner, analysis_id, &config)
                .await?;
            println!("✓ Analysis {analysis_id} configured");
        }
        AnalysisCommand::Hyper {
            analysis_id,
            params,
        } => {
            let params: HyperParameters = params.into_iter().collect();
            ctx.catalog
                .set_hyper_parameters(&ctx.owner, analysis_id, &params)
                .await?;
            println!(
                "✓ {} hyperparameter(s) stored for analysis {analysis_id}",
                params.len()
            );
        }
        AnalysisCommand::Feature {
            analysis_id,
            name,
            feature_type,
            impute,
            include,
        } => {
            let details = ctx.catalog.show_analysis(&ctx.owner, analysis_id).await?;
            let mut feature = details
                .features
                .into_iter()
                .find(|f| f.name == name)
                .ok_or_else(|| {
                    CliError::Arguments(format!(
                        "analysis {analysis_id} has no feature '{name}'; run 'analysis init-features' first"
                    ))
                })?;
            if let Some(feature_type) = feature_type {
                feature.feature_type = feature_type;
            }
            if let Some(impute) = impute {
                feature.impute_option = impute;
            }
            if let Some(include) = include {
                feature.include = include;
            }
            ctx.catalog
                .set_features(&ctx.owner, analysis_id, std::slice::from_ref(&feature))
                .await?;
            println!("✓ Feature '{}' updated", feature.name);
        }
        AnalysisCommand::InitFeatures {
            analysis_id,
            version_id,
        } => {
            let features = ctx
                .catalog
                .init_features(&ctx.owner, analysis_id, version_id)
                .await?;
            println!("✓ {} feature(s) stored", features.len());
            print_features(&features);
        }
        AnalysisCommand::Show { analysis_id } => {
            let details = ctx.catalog.show_analysis(&ctx.owner, analysis_id).await?;
            println!(
                "Analysis {} ({}), project {}",
                details.analysis.name, details.analysis.id, details.analysis.project_id
            );
            println!();
            println!("Configuration:");
            for (key, value) in &details.configuration {
                println!("  {key} = {value}");
            }
            println!();
            println!("Hyperparameters:");
            for (key, value) in &details.hyper_parameters {
                println!("  {key} = {value}");
            }
            println!();
            print_features(&details.features);
        }
        AnalysisCommand::Algorithms { class } => {
            let algorithms = ctx.orchestrator.context().algorithms.names(class);
            println!("{class} algorithms:");
            for name in algorithms {
                println!("  {name}");
            }
        }
    }
    Ok(())
}

fn print_features(features: &[Feature]) {
    if features.is_empty() {
        println!("No features stored.");
        return;
    }
    println!(
        "{:<5} {:<25} {:<12} {:<22} Included",
        "Index", "Name", "Type", "Impute"
    );
    print_separator(75);
    for feature in features {
        println!(
            "{:<5} {:<25} {:<12} {:<22} {}",
            feature.index,
            truncate_string(&feature.name, 24),
            feature.feature_type.as_str(),
            feature.impute_option.as_str(),
            if feature.include { "yes" } else { "no" }
        );
    }
}
