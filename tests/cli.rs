use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn inputs(dir: &TempDir) -> (PathBuf, PathBuf) {
    let counts = dir.path().join("counts.csv");
    let map = dir.path().join("map.geojson");
    fs::write(
        &counts,
        "date,China,Italy\n2020-01-01,10,5\n2020-01-02,12,9\n2020-01-03,15,20\n",
    )
    .unwrap();
    let ring = |x: f64| json!([[[x, 0.0], [x + 2.0, 0.0], [x + 2.0, 2.0], [x, 2.0], [x, 0.0]]]);
    let fc = json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "name": "China" },
              "geometry": { "type": "Polygon", "coordinates": ring(100.0) } },
            { "type": "Feature", "properties": { "name": "Italy" },
              "geometry": { "type": "Polygon", "coordinates": ring(10.0) } },
            { "type": "Feature", "properties": { "name": "Peru" },
              "geometry": { "type": "Polygon", "coordinates": ring(-76.0) } },
        ]
    });
    fs::write(&map, fc.to_string()).unwrap();
    (counts, map)
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("dayrates").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("dayrates"));
}

#[test]
fn series_change_prints_missing_first_day() {
    let dir = tempfile::tempdir().unwrap();
    let (counts, _) = inputs(&dir);
    let mut cmd = Command::cargo_bin("dayrates").unwrap();
    cmd.arg("--counts").arg(&counts).args(["series", "--kind", "change"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2020-01-01,NA,NA"))
        .stdout(predicate::str::contains("2020-01-02,2,4"));
}

#[test]
fn scale_prints_factor() {
    let dir = tempfile::tempdir().unwrap();
    let (counts, _) = inputs(&dir);
    let mut cmd = Command::cargo_bin("dayrates").unwrap();
    cmd.arg("--counts").arg(&counts).arg("scale");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("scale factor 0.15"));
}

#[test]
fn frame_writes_geojson() {
    let dir = tempfile::tempdir().unwrap();
    let (counts, map) = inputs(&dir);
    let out = dir.path().join("day2.geojson");
    let mut cmd = Command::cargo_bin("dayrates").unwrap();
    cmd.arg("--counts")
        .arg(&counts)
        .arg("--map")
        .arg(&map)
        .args(["frame", "--day", "2", "--out"])
        .arg(&out);
    cmd.assert().success();

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let features = v["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    assert_eq!(features[1]["properties"]["rates"], json!(20.0));
    assert!(features[2]["properties"]["rates"].is_null());
}

#[test]
fn frame_out_of_range_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (counts, map) = inputs(&dir);
    let mut cmd = Command::cargo_bin("dayrates").unwrap();
    cmd.arg("--counts")
        .arg(&counts)
        .arg("--map")
        .arg(&map)
        .args(["frame", "--day", "9"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("outside the valid range"));
}

#[test]
fn replay_emits_one_event_per_valid_selection() {
    let dir = tempfile::tempdir().unwrap();
    let (counts, map) = inputs(&dir);
    let mut cmd = assert_cmd::Command::cargo_bin("dayrates").unwrap();
    cmd.arg("--counts")
        .arg(&counts)
        .arg("--map")
        .arg(&map)
        .arg("replay")
        .write_stdin("1\n7\n2020-01-03\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("frameReady day=1 date=02-01-2020 rows=3 with_data=2"))
        .stdout(predicate::str::contains("frameReady day=2 date=03-01-2020"))
        .stderr(predicate::str::contains("rejected '7'"));
}

#[test]
fn series_rescaled_divides_by_scale_factor() {
    let dir = tempfile::tempdir().unwrap();
    let (counts, _) = inputs(&dir);
    let mut cmd = Command::cargo_bin("dayrates").unwrap();
    cmd.arg("--counts").arg(&counts).args(["series", "--kind", "rescaled"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2020-01-01,66.6667,33.3333"))
        .stdout(predicate::str::contains("2020-01-03,100,133.3333"));
}

#[test]
fn config_file_and_alias_flag_join_renamed_country() {
    let dir = tempfile::tempdir().unwrap();
    let counts = dir.path().join("counts.csv");
    let map = dir.path().join("map.geojson");
    let cfg = dir.path().join("cfg.json");
    fs::write(
        &counts,
        "date,USA,Italy\n2020-01-01,10,5\n2020-01-02,12,9\n",
    )
    .unwrap();
    let ring = |x: f64| json!([[[x, 0.0], [x + 2.0, 0.0], [x + 2.0, 2.0], [x, 2.0], [x, 0.0]]]);
    let fc = json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "name": "United States of America" },
              "geometry": { "type": "Polygon", "coordinates": ring(-100.0) } },
            { "type": "Feature", "properties": { "name": "Italy" },
              "geometry": { "type": "Polygon", "coordinates": ring(10.0) } },
        ]
    });
    fs::write(&map, fc.to_string()).unwrap();
    let settings = json!({
        "counts": counts.display().to_string(),
        "map": map.display().to_string(),
        "exclude": [],
    });
    fs::write(&cfg, settings.to_string()).unwrap();

    let frame_for = |alias: Option<&str>, out: &PathBuf| {
        let mut cmd = Command::cargo_bin("dayrates").unwrap();
        cmd.arg("--config").arg(&cfg);
        if let Some(a) = alias {
            cmd.arg("--alias").arg(a);
        }
        cmd.args(["frame", "--day", "1", "--out"]).arg(out);
        cmd.assert().success();
        serde_json::from_str::<serde_json::Value>(&fs::read_to_string(out).unwrap()).unwrap()
    };

    let plain = frame_for(None, &dir.path().join("plain.json"));
    assert!(plain["rows"][0]["rate"].is_null());
    assert_eq!(plain["unmatched"], json!(["United States of America"]));

    let aliased = frame_for(
        Some("United States of America=USA"),
        &dir.path().join("aliased.json"),
    );
    assert_eq!(aliased["rows"][0]["name"], json!("United States of America"));
    assert_eq!(aliased["rows"][0]["rate"], json!(12.0));
    assert!(aliased["rows"][0]["scaled_size"].is_number());
    assert_eq!(aliased["unmatched"], json!([]));
}
