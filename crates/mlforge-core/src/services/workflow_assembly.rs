//! Freezing an analysis into a [`Workflow`].

use crate::domain::{Owner, Workflow, config_keys};
use crate::ports::{CoreError, MetadataStore, RepositoryError};

/// Load everything a build needs from an analysis.
///
/// Only included features are kept. A missing algorithm name or class is a
/// metadata error; a missing train fraction defaults to 1.0. Every failure,
/// including lookups that come back empty, is reported as
/// [`CoreError::Metadata`].
pub async fn assemble_workflow(
    store: &MetadataStore,
    owner: &Owner,
    analysis_id: i64,
) -> Result<Workflow, CoreError> {
    store
        .analyses
        .get(owner, analysis_id)
        .await
        .map_err(CoreError::metadata)?;

    let config = store
        .analyses
        .get_configuration(analysis_id)
        .await
        .map_err(CoreError::metadata)?;

    let required = |key: &str| {
        config
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                CoreError::metadata(RepositoryError::NotFound(format!(
                    "analysis {analysis_id} has no '{key}' configured"
                )))
            })
    };
    let algorithm_name = required(config_keys::ALGORITHM_NAME)?;
    let algorithm_class = required(config_keys::ALGORITHM_TYPE)?;

    let response_variable = config
        .get(config_keys::RESPONSE)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let train_data_fraction = match config.get(config_keys::TRAIN_DATA_FRACTION) {
        None => 1.0,
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| *f > 0.0 && *f <= 1.0)
            .ok_or_else(|| {
                CoreError::metadata(RepositoryError::Serialization(format!(
                    "analysis {analysis_id} has an invalid '{}' of '{raw}'",
                    config_keys::TRAIN_DATA_FRACTION
                )))
            })?,
    };

    let hyper_parameters = store
        .analyses
        .get_hyper_parameters(analysis_id)
        .await
        .map_err(CoreError::metadata)?;

    let features = store
        .analyses
        .get_features(analysis_id)
        .await
        .map_err(CoreError::metadata)?
        .into_iter()
        .filter(|f| f.include)
        .collect();

    Ok(Workflow {
        analysis_id,
        algorithm_name,
        algorithm_class,
        response_variable,
        train_data_fraction,
        features,
        hyper_parameters,
    })
}
