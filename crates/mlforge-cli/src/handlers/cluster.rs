//! Cluster points command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Print one JSON object per sampled point with its cluster.
pub async fn execute(
    ctx: &CliContext,
    version_id: i64,
    features: &[String],
    clusters: u32,
) -> Result<()> {
    let points = ctx
        .orchestrator
        .cluster_points(&ctx.owner, version_id, features, clusters)
        .await?;
    for point in &points {
        println!("{}", serde_json::to_string(point)?);
    }
    tracing::info!(points = points.len(), clusters, "Clustered sample");
    Ok(())
}
