//! Detail views for models and their evaluation summaries.

use mlforge_core::domain::{Model, ModelSummary, PredictedVsActual};

use super::tables::{format_optional, format_timestamp};

/// Points shown from a predicted-vs-actual list.
const PREVIEW_POINTS: usize = 5;

pub fn display_model(model: &Model) {
    println!("Model {} ({})", model.name, model.id);
    println!("  Status:         {}", model.status);
    println!("  Analysis:       {}", model.analysis_id);
    println!("  Dataset ver.:   {}", model.dataset_version_id);
    println!(
        "  Storage target: {}",
        format_optional(
            model
                .storage_target
                .as_ref()
                .map(|t| format!("{} {}", t.storage_type, t.location)),
            "(settings default)"
        )
    );
    println!(
        "  Artifact:       {}",
        format_optional(
            model
                .storage
                .as_ref()
                .map(|s| format!("{} {}", s.storage_type, s.location)),
            "--"
        )
    );
    println!("  Created:        {}", format_timestamp(&model.created_at));
    if let Some(completed) = &model.completed_at {
        println!("  Finished:       {}", format_timestamp(completed));
    }
    if let Some(error) = &model.error {
        println!("  Error:          {error}");
    }
    if let Some(summary) = &model.summary {
        println!();
        display_summary(summary);
    }
}

pub fn display_summary(summary: &ModelSummary) {
    println!("Summary ({})", summary.kind());
    match summary {
        ModelSummary::ProbabilisticClassification(s) => {
            println!("  AUC:            {:.4}", s.auc);
            println!("  ROC points:     {}", s.roc_curve.len());
            preview_points(&s.predicted_vs_actual);
        }
        ModelSummary::ClassClassificationAndRegression(s) => {
            println!("  Error:          {:.4}", s.error);
            preview_points(&s.predicted_vs_actual);
        }
        ModelSummary::Cluster(s) => {
            println!("  Train cost:     {:.4}", s.train_data_compute_cost);
            println!("  Test cost:      {:.4}", s.test_data_compute_cost);
        }
    }
}

fn preview_points(points: &[PredictedVsActual]) {
    println!("  Test points:    {}", points.len());
    for point in points.iter().take(PREVIEW_POINTS) {
        println!(
            "    predicted {:>10.4}  actual {:>10.4}",
            point.predicted, point.actual
        );
    }
}
