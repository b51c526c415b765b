mod support;

use std::path::PathBuf;

use mapathon::cli::commands::export::{self, ExportArgs, ExportFormat, ExportKind};
use mapathon::cli::commands::report::ReportArgs;
use mapathon::config::{DatabaseCredentials, resolve_runtime_paths};
use mapathon::models::{MapathonSummary, MappedFeature};
use mapathon::query::builder::HISTORY_LABEL;
use mapathon::query::{ChangesetQuery, history_query};
use mapathon::report::{Output, OutputSource, QueryRunner};
use serde_json::json;
use support::{ScriptedDriver, mapathon_params, rows};

#[test]
fn query_source_runs_through_the_session() {
    let driver = ScriptedDriver::new();
    driver.respond(
        HISTORY_LABEL,
        rows(
            &["feature", "action", "count"],
            vec![
                vec![json!("building"), json!("create"), json!(10)],
                vec![json!("amenity"), json!("create"), json!(1)],
            ],
        ),
    );
    let mut database = driver.open();
    let changesets = ChangesetQuery::new(&mapathon_params()).expect("changeset query");

    let output = Output::load(
        OutputSource::Query(history_query(&changesets, false)),
        Some(&mut database as &mut dyn QueryRunner),
    )
    .expect("query output should load");

    assert_eq!(
        output.to_list(),
        vec![
            vec![json!("building"), json!("create"), json!(10)],
            vec![json!("amenity"), json!("create"), json!(1)],
        ]
    );
    assert_eq!(driver.journal.borrow().labels(), vec![HISTORY_LABEL]);
}

#[test]
fn structured_report_value_renders_as_records() {
    let summary = MapathonSummary {
        total_contributors: 2,
        mapped_features: vec![MappedFeature {
            feature: "building".to_string(),
            action: "create".to_string(),
            count: 10,
        }],
    };
    let value = serde_json::to_value(&summary.mapped_features).expect("features serialize");

    let output = Output::load(OutputSource::Structured(value), None).expect("structured output");

    assert_eq!(output.table().columns(), ["feature", "action", "count"]);
    insta::assert_snapshot!(
        output.to_json().expect("json should render"),
        @r#"[{"feature":"building","action":"create","count":10}]"#
    );
    let dict = serde_json::to_string(&output.to_dict()).expect("records should encode");
    assert_eq!(dict, output.to_json().expect("json should render"));
}

#[test]
fn single_object_becomes_one_flattened_row() {
    let value = json!({
        "project": { "id": 1730, "name": "Pokhara" },
        "contributors": 12
    });

    let output = Output::load(OutputSource::Structured(value), None).expect("structured output");

    let records = output.to_dict();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("project.id"), Some(&json!(1730)));
    assert_eq!(records[0].get("contributors"), Some(&json!(12)));
}

#[test]
fn export_command_writes_csv_through_the_session() {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_nanos();
    let cwd = std::env::temp_dir().join(format!("mapathon-export-{nanos}"));
    std::fs::create_dir_all(&cwd).expect("temp dir should be creatable");
    let request = cwd.join("request.json");
    std::fs::write(
        &request,
        json!({
            "project_ids": [1234],
            "from_timestamp": "2021-06-01T00:00:00Z",
            "to_timestamp": "2021-06-02T00:00:00Z"
        })
        .to_string(),
    )
    .expect("request should be writable");

    let driver = ScriptedDriver::new();
    driver.respond(
        HISTORY_LABEL,
        rows(
            &["feature", "action", "count"],
            vec![vec![json!("building"), json!("create"), json!(10)]],
        ),
    );
    let args = ExportArgs {
        report: ReportArgs { request },
        kind: ExportKind::Summary,
        format: ExportFormat::Csv,
        out: Some(PathBuf::from("features.csv")),
    };
    let runtime_paths =
        resolve_runtime_paths(&cwd, &cwd).expect("runtime paths should resolve");

    export::run(
        &args,
        &runtime_paths,
        driver.clone(),
        &DatabaseCredentials::default(),
    )
    .expect("export should succeed");

    let written =
        std::fs::read_to_string(cwd.join("features.csv")).expect("csv should be written");
    assert_eq!(written, ",feature,action,count\n0,building,create,10\n");
    assert_eq!(driver.journal.borrow().closes, 1);
}
