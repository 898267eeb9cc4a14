//! End-to-end catalog flow through the CLI handlers against a temp database.

use std::path::Path;

use mlforge_cli::{
    AnalysisCommand, CliConfig, CliContext, DatasetCommand, ModelCommand, ProjectCommand,
    VersionCommand, bootstrap, exit_code, handlers,
};
use mlforge_core::Owner;
use tempfile::TempDir;

async fn context(dir: &Path) -> CliContext {
    bootstrap(
        CliConfig::new(Owner::new(-1234, "admin")).with_database_path(dir.join("mlforge.db")),
    )
    .await
    .unwrap()
}

async fn seeded() -> (TempDir, CliContext) {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("iris.csv");
    std::fs::write(&csv, "sepal,petal,species\n5.1,1.4,0\n6.2,4.5,1\n").unwrap();
    let ctx = context(dir.path()).await;

    handlers::project::execute(
        &ctx,
        ProjectCommand::Create {
            name: "flowers".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();
    handlers::dataset::execute(
        &ctx,
        DatasetCommand::Create {
            name: "iris".to_string(),
            data_type: "CSV".parse().unwrap(),
            source_type: "file".to_string(),
            target_type: "file".to_string(),
            comments: None,
        },
    )
    .await
    .unwrap();
    handlers::dataset::execute(
        &ctx,
        DatasetCommand::Version {
            command: VersionCommand::Add {
                dataset_id: 1,
                version: "1.0".to_string(),
                uri: csv.to_string_lossy().to_string(),
            },
        },
    )
    .await
    .unwrap();
    handlers::analysis::execute(
        &ctx,
        AnalysisCommand::Create {
            project_id: 1,
            name: "species".to_string(),
            comments: None,
        },
    )
    .await
    .unwrap();

    (dir, ctx)
}

#[tokio::test]
async fn test_catalog_flow() {
    let (_dir, ctx) = seeded().await;

    handlers::analysis::execute(
        &ctx,
        AnalysisCommand::Set {
            analysis_id: 1,
            algorithm: Some("logistic_regression".to_string()),
            algorithm_class: Some("Classification".parse().unwrap()),
            response: Some("species".to_string()),
            train_fraction: Some(0.7),
        },
    )
    .await
    .unwrap();
    handlers::analysis::execute(
        &ctx,
        AnalysisCommand::InitFeatures {
            analysis_id: 1,
            version_id: 1,
        },
    )
    .await
    .unwrap();
    handlers::analysis::execute(
        &ctx,
        AnalysisCommand::Feature {
            analysis_id: 1,
            name: "petal".to_string(),
            feature_type: None,
            impute: None,
            include: Some(false),
        },
    )
    .await
    .unwrap();

    let details = ctx.catalog.show_analysis(&ctx.owner, 1).await.unwrap();
    assert_eq!(details.configuration["algorithmName"], "LOGISTIC_REGRESSION");
    assert!(!details.hyper_parameters.is_empty());
    let petal = details.features.iter().find(|f| f.name == "petal").unwrap();
    assert!(!petal.include);

    handlers::model::execute(
        &ctx,
        ModelCommand::Create {
            name: "iris-lr".to_string(),
            analysis: 1,
            version: 1,
            storage_type: None,
            storage_location: None,
        },
    )
    .await
    .unwrap();
    let model = ctx.catalog.find_model(&ctx.owner, "iris-lr").await.unwrap();
    assert_eq!(model.id, 1);
    assert!(!model.is_ready());
}

#[tokio::test]
async fn test_predict_before_build_is_not_ready() {
    let (dir, ctx) = seeded().await;
    handlers::model::execute(
        &ctx,
        ModelCommand::Create {
            name: "iris-lr".to_string(),
            analysis: 1,
            version: 1,
            storage_type: None,
            storage_location: None,
        },
    )
    .await
    .unwrap();
    let rows = dir.path().join("rows.json");
    std::fs::write(&rows, "[[5.1, 1.4]]").unwrap();

    let err = handlers::model::execute(
        &ctx,
        ModelCommand::Predict {
            model: "iris-lr".to_string(),
            rows,
        },
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("not ready"));
    assert_eq!(exit_code(&err), 1);
}

#[tokio::test]
async fn test_unknown_model_exits_not_found() {
    let (_dir, ctx) = seeded().await;

    let err = handlers::model::execute(
        &ctx,
        ModelCommand::Show {
            model: "missing".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(exit_code(&err), 66);
}

#[tokio::test]
async fn test_other_user_sees_nothing() {
    let (dir, _ctx) = seeded().await;
    let stranger = bootstrap(
        CliConfig::new(Owner::new(-1234, "mallory"))
            .with_database_path(dir.path().join("mlforge.db")),
    )
    .await
    .unwrap();

    assert!(stranger.catalog.list_projects(&stranger.owner).await.unwrap().is_empty());
    assert!(
        stranger
            .catalog
            .list_versions(&stranger.owner, 1)
            .await
            .unwrap()
            .is_empty()
    );

    let err = handlers::analysis::execute(&stranger, AnalysisCommand::Show { analysis_id: 1 })
        .await
        .unwrap_err();
    assert_eq!(exit_code(&err), 66);
}

#[tokio::test]
async fn test_deletes_through_handlers() {
    let (_dir, ctx) = seeded().await;

    handlers::dataset::execute(
        &ctx,
        DatasetCommand::Comment {
            id: 1,
            comments: Some("cleaned".to_string()),
        },
    )
    .await
    .unwrap();
    let datasets = ctx.catalog.list_datasets(&ctx.owner).await.unwrap();
    assert_eq!(datasets[0].comments.as_deref(), Some("cleaned"));

    handlers::dataset::execute(
        &ctx,
        DatasetCommand::Version {
            command: VersionCommand::Delete { version_id: 1 },
        },
    )
    .await
    .unwrap();
    assert!(ctx.catalog.list_versions(&ctx.owner, 1).await.unwrap().is_empty());

    handlers::analysis::execute(&ctx, AnalysisCommand::Delete { analysis_id: 1 })
        .await
        .unwrap();
    assert!(ctx.catalog.list_analyses(&ctx.owner, 1).await.unwrap().is_empty());

    handlers::dataset::execute(&ctx, DatasetCommand::Delete { id: 1 })
        .await
        .unwrap();
    assert!(ctx.catalog.list_datasets(&ctx.owner).await.unwrap().is_empty());

    let err = handlers::dataset::execute(&ctx, DatasetCommand::Delete { id: 1 })
        .await
        .unwrap_err();
    assert_eq!(exit_code(&err), 66);
}
