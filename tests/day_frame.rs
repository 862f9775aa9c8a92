use dayrates::{
    DayFrameBuilder, Error, ExclusionPolicy, GeometryCatalog, JoinPolicy, ScaleFactor,
    TimeSeriesStore,
};
use serde_json::{Value, json};

fn square(name: &str, x0: f64, y0: f64) -> Value {
    json!({
        "type": "Feature",
        "properties": { "name": name },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [x0, y0], [x0 + 2.0, y0], [x0 + 2.0, y0 + 2.0], [x0, y0 + 2.0], [x0, y0]
            ]]
        }
    })
}

fn inputs() -> (TimeSeriesStore, GeometryCatalog, ScaleFactor) {
    let csv = "date,China,Italy,USA\n\
               2020-01-01,10,5,\n\
               2020-01-02,12,9,1\n\
               2020-01-03,15,20,4\n";
    let store = TimeSeriesStore::from_reader(csv.as_bytes()).unwrap();
    let fc = json!({
        "type": "FeatureCollection",
        "features": [
            square("Italy", 10.0, 40.0),
            square("Antarctica", 0.0, -80.0),
            square("China", 100.0, 30.0),
            square("Peru", -76.0, -10.0),
            square("United States of America", -100.0, 35.0),
        ]
    });
    let catalog = GeometryCatalog::from_value(fc, &ExclusionPolicy::default(), "name").unwrap();
    let scale = ScaleFactor::compute(&store, 100.0).unwrap();
    (store, catalog, scale)
}

#[test]
fn one_row_per_retained_feature_for_every_day() {
    let (store, catalog, scale) = inputs();
    let join = JoinPolicy::default();
    let builder = DayFrameBuilder::new(&store, &catalog, scale, &join);
    for day in 0..store.len() {
        let frame = builder.build(day).unwrap();
        assert_eq!(frame.len(), catalog.len());
        assert_eq!(frame.day, day);
        assert_eq!(frame.date, store.dates()[day]);
        assert!(frame.row("Antarctica").is_none());
    }
}

#[test]
fn rows_follow_catalog_order_and_are_stable() {
    let (store, catalog, scale) = inputs();
    let join = JoinPolicy::default();
    let builder = DayFrameBuilder::new(&store, &catalog, scale, &join);
    let a = builder.build(1).unwrap();
    let b = builder.build(1).unwrap();
    assert_eq!(a, b);
    let names: Vec<&str> = a.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Italy", "China", "Peru", "United States of America"]
    );
}

#[test]
fn rates_centroids_and_scaled_sizes() {
    let (store, catalog, scale) = inputs();
    let join = JoinPolicy::default();
    let frame = DayFrameBuilder::new(&store, &catalog, scale, &join)
        .build(2)
        .unwrap();
    let italy = frame.row("Italy").unwrap();
    assert_eq!(italy.rate, Some(20.0));
    assert!((italy.x - 11.0).abs() < 1e-12);
    assert!((italy.y - 41.0).abs() < 1e-12);
    // (20 - 1) / 100 = 0.19; size = rate / (0.19 / 2)
    let expected = 20.0 / (0.19 / 2.0);
    assert!((italy.scaled_size.unwrap() - expected).abs() < 1e-9);
}

#[test]
fn feature_without_series_column_keeps_a_missing_rate() {
    let (store, catalog, scale) = inputs();
    let join = JoinPolicy::default();
    let frame = DayFrameBuilder::new(&store, &catalog, scale, &join)
        .build(0)
        .unwrap();
    let peru = frame.row("Peru").unwrap();
    assert_eq!(peru.rate, None);
    assert_eq!(peru.scaled_size, None);
    assert!(frame.unmatched.contains(&"Peru".to_string()));
    assert!(frame.unmatched.contains(&"United States of America".to_string()));
}

#[test]
fn alias_joins_geometry_name_to_column() {
    let (store, catalog, scale) = inputs();
    let join = JoinPolicy::with_aliases([("United States of America", "USA")]);
    let builder = DayFrameBuilder::new(&store, &catalog, scale, &join);

    // Empty cell on day 0: matched, but still missing.
    let day0 = builder.build(0).unwrap();
    assert_eq!(day0.row("United States of America").unwrap().rate, None);
    assert!(!day0.unmatched.contains(&"United States of America".to_string()));

    let day2 = builder.build(2).unwrap();
    assert_eq!(day2.row("United States of America").unwrap().rate, Some(4.0));
}

#[test]
fn out_of_range_day_is_rejected() {
    let (store, catalog, scale) = inputs();
    let join = JoinPolicy::default();
    let builder = DayFrameBuilder::new(&store, &catalog, scale, &join);
    assert!(matches!(builder.build(3), Err(Error::Range { .. })));
}
