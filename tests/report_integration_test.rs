mod common;

use common::{client, forecast_body};
use openmeteo_fetch::model::{Location, REPORT_CURRENT_VARIABLES, REPORT_HOURLY_VARIABLES};
use openmeteo_fetch::report::WeatherReport;
use openmeteo_fetch::retry::RetryPolicy;
use openmeteo_fetch::writer::TableWriter;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn report_with(hours: usize, overrides: &[(&str, Value)]) -> WeatherReport {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("past_days", "0"))
        .and(query_param("forecast_days", "3"))
        .and(query_param("current", REPORT_CURRENT_VARIABLES.join(",")))
        .and(query_param("hourly", REPORT_HOURLY_VARIABLES.join(",")))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(
            REPORT_HOURLY_VARIABLES,
            REPORT_CURRENT_VARIABLES,
            hours,
            overrides,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri(), RetryPolicy::none());
    WeatherReport::fetch(&client, Location::default(), 0, 3)
        .await
        .expect("report fetch failed")
}

/// Test the full report sequence: current CSV, hourly CSV, and rain flag
#[tokio::test]
async fn test_report_writes_all_outputs() {
    let report = report_with(
        3,
        &[
            ("temperature_2m", json!([10.0, 15.5, 12.3])),
            ("precipitation_probability", json!([0, 35, 0])),
        ],
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let current = dir.path().join("current_weather.csv");
    let hourly = dir.path().join("hourly_weather.csv");
    let flag = dir.path().join("output.txt");

    report.print_current_weather(&current).unwrap();
    report.print_hourly_weather(&hourly).unwrap();
    assert_eq!(report.highest_temperature(), Some(15.5));
    assert!(report.write_rain_flag(&flag).unwrap());

    let current_csv = std::fs::read_to_string(&current).unwrap();
    let mut lines = current_csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        format!("time,{}", REPORT_CURRENT_VARIABLES.join(","))
    );
    assert!(lines.next().unwrap().starts_with("2024-06-10 06:13:20+00:00,0.5,1.5"));
    assert!(lines.next().is_none());

    let table = TableWriter::read_table(&hourly).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.columns().len(), 1 + REPORT_HOURLY_VARIABLES.len());
    assert_eq!(table.variables(), report.hourly_weather().variables());

    assert_eq!(std::fs::read_to_string(&flag).unwrap(), "1");
}

/// Test that a dry forecast writes a zero flag
#[tokio::test]
async fn test_dry_forecast_flag() {
    let report = report_with(
        4,
        &[("precipitation_probability", json!([0, 0, null, 0]))],
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let flag = dir.path().join("output.txt");
    std::fs::write(&flag, "1").unwrap();

    assert!(!report.write_rain_flag(&flag).unwrap());
    assert_eq!(std::fs::read_to_string(&flag).unwrap(), "0");
}

/// Test that an empty hourly horizon yields an empty table and a zero flag
#[tokio::test]
async fn test_empty_horizon() {
    let report = report_with(0, &[]).await;

    let dir = tempfile::tempdir().unwrap();
    let hourly = dir.path().join("hourly_weather.csv");
    let flag = dir.path().join("output.txt");

    assert!(report.hourly_weather().is_empty());
    assert_eq!(report.highest_temperature(), None);

    report.print_hourly_weather(&hourly).unwrap();
    assert!(!report.write_rain_flag(&flag).unwrap());

    let table = TableWriter::read_table(&hourly).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.columns().len(), 1 + REPORT_HOURLY_VARIABLES.len());
    assert_eq!(std::fs::read_to_string(&flag).unwrap(), "0");
}
