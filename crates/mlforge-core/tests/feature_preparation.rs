//! Feature preparation over whole datasets: missing values, imputation and
//! the train/test partition.

use mlforge_core::domain::SamplePoints;
use mlforge_core::features::{FeaturePlan, NumericEncoder, default_features, prepare};
use mlforge_core::ports::TrainingSet;
use mlforge_core::{CoreError, Feature, FeatureType, HyperParameters, ImputeOption, Workflow};

const HEADER: &str = "height,weight,zone,label";

fn dataset() -> Vec<String> {
    (0..200)
        .map(|i| {
            let weight = if i % 10 == 0 {
                "NA".to_string()
            } else {
                format!("{}", 50 + i % 30)
            };
            let height = if i % 25 == 0 {
                String::new()
            } else {
                format!("{}.5", 150 + i % 40)
            };
            format!("{height},{weight},{},{}", i % 4, i % 2)
        })
        .collect()
}

fn workflow(features: Vec<Feature>, response: Option<&str>, fraction: f64) -> Workflow {
    Workflow {
        analysis_id: 1,
        algorithm_name: "LOGISTIC_REGRESSION".to_string(),
        algorithm_class: "Classification".to_string(),
        response_variable: response.map(str::to_string),
        train_data_fraction: fraction,
        features,
        hyper_parameters: HyperParameters::new(),
    }
}

fn features() -> Vec<Feature> {
    vec![
        Feature::numerical("height", 0),
        Feature::numerical("weight", 1).with_impute(ImputeOption::ReplaceWithMean),
        Feature::numerical("zone", 2),
    ]
}

#[test]
fn test_partition_covers_valid_rows_for_any_fraction() {
    let lines = dataset();
    let wf = workflow(features(), Some("label"), 1.0);
    let plan = FeaturePlan::new(&wf, HEADER, ',', true).unwrap();

    for fraction in [0.05, 0.3, 0.5, 0.7, 0.99, 1.0] {
        let prepared =
            prepare(&plan, lines.iter().map(String::as_str), ',', &NumericEncoder).unwrap();
        let valid = prepared.rows.len();
        let mut all: Vec<Vec<f64>> = prepared.rows.iter().map(|r| r.features.clone()).collect();

        let TrainingSet::Labeled { train, test } = prepared.split(fraction) else {
            panic!("supervised data must be labeled");
        };
        assert_eq!(train.len() + test.len(), valid, "fraction {fraction}");

        // Every valid row lands in exactly one partition.
        for point in train.iter().chain(&test) {
            let pos = all
                .iter()
                .position(|row| *row == point.features)
                .expect("partitioned row was never prepared");
            all.swap_remove(pos);
        }
        assert!(all.is_empty());
    }
}

#[test]
fn test_missing_height_discards_and_missing_weight_imputes() {
    let lines = dataset();
    let wf = workflow(features(), Some("label"), 0.7);
    let plan = FeaturePlan::new(&wf, HEADER, ',', true).unwrap();

    let prepared = prepare(&plan, lines.iter().map(String::as_str), ',', &NumericEncoder).unwrap();

    // Rows 0, 25, 50, ... have no height.
    assert_eq!(prepared.discarded, 8);
    assert_eq!(prepared.rows.len(), 192);

    let mean = prepared.means["weight"];
    assert!(mean > 50.0 && mean < 80.0);
    // Row 10 has no weight and a height, so it is imputed.
    let imputed = prepared
        .rows
        .iter()
        .filter(|r| (r.features[1] - mean).abs() < f64::EPSILON)
        .count();
    assert!(imputed >= 1);
    assert!(prepared.rows.iter().all(|r| r.label.is_some()));
}

#[test]
fn test_unsupervised_rows_are_unlabeled() {
    let lines = dataset();
    let wf = workflow(features(), None, 0.5);
    let plan = FeaturePlan::new(&wf, HEADER, ',', false).unwrap();

    let prepared = prepare(&plan, lines.iter().map(String::as_str), ',', &NumericEncoder).unwrap();
    let valid = prepared.rows.len();

    match prepared.split(0.5) {
        TrainingSet::Unlabeled { train, test } => assert_eq!(train.len() + test.len(), valid),
        TrainingSet::Labeled { .. } => panic!("unsupervised data must not be labeled"),
    }
}

#[test]
fn test_excluded_and_response_columns_are_not_inputs() {
    let mut columns = features();
    columns[2] = columns[2].clone().excluded();
    columns.push(Feature::numerical("label", 3));
    let wf = workflow(columns, Some("label"), 1.0);

    let plan = FeaturePlan::new(&wf, HEADER, ',', true).unwrap();

    let names: Vec<&str> = plan.inputs.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["height", "weight"]);
    assert_eq!(plan.response_index, Some(3));
}

#[test]
fn test_tab_separated_rows() {
    let header = "a\tb\ty";
    let lines = ["1\t2\t0", "3\tNA\t1", "5\t6\t1"];
    let wf = workflow(
        vec![Feature::numerical("a", 0), Feature::numerical("b", 1)],
        Some("y"),
        1.0,
    );
    let plan = FeaturePlan::new(&wf, header, '\t', true).unwrap();

    let prepared = prepare(&plan, lines, '\t', &NumericEncoder).unwrap();

    assert_eq!(prepared.rows.len(), 2);
    assert_eq!(prepared.rows[1].features, vec![5.0, 6.0]);
}

#[test]
fn test_bad_value_reports_line_number() {
    let lines = ["1.0,2.0,1,0", "1.0,heavy,1,1"];
    let wf = workflow(features(), Some("label"), 1.0);
    let plan = FeaturePlan::new(&wf, HEADER, ',', true).unwrap();

    let err = prepare(&plan, lines, ',', &NumericEncoder).unwrap_err();

    match err {
        CoreError::DatasetPreparation(message) => assert!(message.contains("line 3"), "{message}"),
        other => panic!("expected a preparation error, got {other:?}"),
    }
}

#[test]
fn test_default_features_from_sample() {
    let sample = SamplePoints::from_lines(
        "age,city,score",
        ["31,Colombo,NA", "45,Kandy,7.5", ",Galle,8"],
        ',',
        100,
    );

    let features = default_features(&sample);

    let types: Vec<FeatureType> = features.iter().map(|f| f.feature_type).collect();
    assert_eq!(
        types,
        vec![
            FeatureType::Numerical,
            FeatureType::Categorical,
            FeatureType::Numerical
        ]
    );
    assert!(features.iter().all(|f| f.include));
    assert!(
        features
            .iter()
            .all(|f| f.impute_option == ImputeOption::Discard)
    );
    assert_eq!(features[2].index, 2);
}
