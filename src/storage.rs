use crate::models::DayFrame;
use crate::series::SeriesView;
use anyhow::Result;
use csv::WriterBuilder;
use serde_json::{Value, json};
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix text cells that a spreadsheet would evaluate as a formula.
fn sanitize_cell(s: &str) -> Cow<'_, str> {
    if s.starts_with(['=', '+', '-', '@']) {
        Cow::Owned(format!("'{}", s))
    } else {
        Cow::Borrowed(s)
    }
}

/// Save a series view as a wide CSV: `date` followed by one column per country.
/// Missing values are written as empty cells.
pub fn save_series_csv<P: AsRef<Path>>(view: &SeriesView, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    let mut header = vec![Cow::Borrowed("date")];
    header.extend(view.countries().iter().map(|c| sanitize_cell(c)));
    wtr.write_record(header.iter().map(|c| c.as_bytes()))?;
    for (day, date) in view.dates().iter().enumerate() {
        let mut record = vec![date.to_string()];
        if let Some(row) = view.row(day) {
            record.extend(row.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a day frame as CSV with header `name,x,y,rate,scaled_size`.
pub fn save_frame_csv<P: AsRef<Path>>(frame: &DayFrame, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("name", "x", "y", "rate", "scaled_size"))?;
    for r in &frame.rows {
        wtr.serialize((sanitize_cell(&r.name), r.x, r.y, r.rate, r.scaled_size))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a day frame as pretty JSON.
pub fn save_frame_json<P: AsRef<Path>>(frame: &DayFrame, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(frame)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Render a day frame as a GeoJSON `FeatureCollection` of centroid points.
///
/// Each feature carries `name`, `rates` and `scaledsize` properties; missing
/// values are `null`.
pub fn frame_to_geojson(frame: &DayFrame) -> Value {
    let features: Vec<Value> = frame
        .rows
        .iter()
        .map(|r| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [r.x, r.y] },
                "properties": {
                    "name": r.name,
                    "rates": r.rate,
                    "scaledsize": r.scaled_size,
                },
            })
        })
        .collect();
    json!({
        "type": "FeatureCollection",
        "day": frame.day,
        "date": frame.date.to_string(),
        "features": features,
    })
}

/// Save a day frame as GeoJSON (see [`frame_to_geojson`]).
pub fn save_frame_geojson<P: AsRef<Path>>(frame: &DayFrame, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&frame_to_geojson(frame))?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayFrameRow;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn frame() -> DayFrame {
        DayFrame {
            day: 0,
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            rows: vec![
                DayFrameRow {
                    name: "Italy".into(),
                    x: 12.0,
                    y: 42.0,
                    rate: Some(3.0),
                    scaled_size: Some(40.0),
                },
                DayFrameRow {
                    name: "=Nowhere".into(),
                    x: 0.0,
                    y: 0.0,
                    rate: None,
                    scaled_size: None,
                },
            ],
            unmatched: vec!["=Nowhere".into()],
        }
    }

    #[test]
    fn write_frame_formats() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("f.csv");
        let jsonp = dir.path().join("f.json");
        let geop = dir.path().join("f.geojson");
        save_frame_csv(&frame(), &csvp).unwrap();
        save_frame_json(&frame(), &jsonp).unwrap();
        save_frame_geojson(&frame(), &geop).unwrap();

        let csv_txt = std::fs::read_to_string(&csvp).unwrap();
        assert!(csv_txt.starts_with("name,x,y,rate,scaled_size"));
        assert!(csv_txt.contains("'=Nowhere"));
        assert!(jsonp.exists());

        let v: Value = serde_json::from_str(&std::fs::read_to_string(&geop).unwrap()).unwrap();
        assert_eq!(v["features"].as_array().unwrap().len(), 2);
        assert!(v["features"][1]["properties"]["rates"].is_null());
    }
}
