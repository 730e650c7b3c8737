// Pipeline tests
// Author: Gabriel Demetrios Lafis

use std::io::Write;

use columnar_frame_engine::{
    data::{CsvSource, DataFrame, DataSource, PrintOptions, SchemaBuilder, Value},
    processing::{
        Aggregation, ApplyTransform, DataProcessor, JoinProcessor, JoinStrategy, JoinType,
        Pipeline, QueryFilter, SelectTransform, SortOrder, SortProcessor, SummarizeProcessor,
    },
    values,
};

fn persons() -> DataFrame {
    let schema = SchemaBuilder::new()
        .add_string("name")
        .add_integer("age")
        .add_float("size_in_m")
        .add_float("weight_in_kg")
        .add_string("city")
        .build()
        .unwrap();

    let mut frame = DataFrame::new(schema);
    frame.insert(values!["NameA", 30, 1.75, 75.2, "Berlin"]).unwrap();
    frame.insert(values!["NameB", 62, 1.60, 63.0, "Seoul"]).unwrap();
    frame.insert(values!["NameC", 20, 1.82, 80.1, "Toronto"]).unwrap();
    frame.insert(values!["NameD", 44, 1.70, 70.0, "Berlin"]).unwrap();
    frame.insert(values!["NameE", 35, 1.55, 52.3, "Seoul"]).unwrap();
    frame
}

fn cities() -> DataFrame {
    let schema = SchemaBuilder::new()
        .add_string("city")
        .add_string("country")
        .add_integer("population")
        .build()
        .unwrap();

    let mut frame = DataFrame::new(schema);
    frame.insert(values!["Berlin", "Germany", 3_600_000]).unwrap();
    frame.insert(values!["Hamburg", "Germany", 1_800_000]).unwrap();
    frame.insert(values!["Seoul", "South Korea", 9_700_000]).unwrap();
    frame.insert(values!["Toronto", "Canada", 2_700_000]).unwrap();
    frame
}

fn single_column(values: Vec<Value>) -> DataFrame {
    let data_type = values[0].data_type();
    let schema = SchemaBuilder::new().add_field("x", data_type).build().unwrap();
    let mut frame = DataFrame::new(schema);
    for value in values {
        frame.insert(vec![value]).unwrap();
    }
    frame
}

#[test]
fn test_columns_stay_aligned() {
    let mut frame = persons();
    frame.append(&persons()).unwrap();
    frame.insert(values!["NameF", 51, 1.9, 90.0, "Lima"]).unwrap();
    assert!(frame.insert(values!["NameG", "old", 1.9, 90.0, "Lima"]).is_err());

    assert_eq!(frame.size(), 11);
    for column in frame.columns() {
        assert_eq!(column.len(), frame.size());
    }
}

#[test]
fn test_full_select_is_identity() {
    let frame = persons();
    let names = frame.column_names();
    let selected = frame.select(&names).unwrap();
    assert_eq!(selected, frame);
}

#[test]
fn test_select_round_trip_keeps_values() {
    let frame = persons();
    let selected = frame.select(&["city", "age"]).unwrap();
    assert_eq!(selected.column("city").unwrap(), frame.column("city").unwrap());
    assert_eq!(selected.column("age").unwrap(), frame.column("age").unwrap());
}

#[test]
fn test_apply_preserves_cardinality() {
    let frame = persons();
    let result = frame
        .apply("bmi", |r| {
            let size = r.float("size_in_m")?;
            Ok(r.float("weight_in_kg")? / (size * size))
        })
        .unwrap();
    assert_eq!(result.size(), frame.size());
}

#[test]
fn test_query_is_ordered_subset() {
    let frame = persons();
    let result = frame.query(|r| Ok(r.integer("age")? < 40)).unwrap();

    let mut last_source_row = None;
    for row in result.rows() {
        let source_row = frame
            .rows()
            .position(|candidate| candidate == row)
            .expect("row must come from the source");
        assert!(last_source_row.map_or(true, |last| source_row > last));
        last_source_row = Some(source_row);

        match &row.values[1] {
            Value::Integer(age) => assert!(*age < 40),
            other => panic!("unexpected age {:?}", other),
        }
    }
    assert_eq!(result.size(), 3);
}

#[test]
fn test_join_correctness() {
    let left = persons();
    let right = cities();

    for strategy in [JoinStrategy::NestedLoop, JoinStrategy::Hash] {
        let result = left
            .join_with_strategy(&right, JoinType::Inner, &["city"], strategy)
            .unwrap();

        let mut expected = 0;
        for l in left.rows() {
            for r in right.rows() {
                if l.values[4] == r.values[0] {
                    expected += 1;
                }
            }
        }
        assert_eq!(result.size(), expected);

        for row in result.rows() {
            let city = &row.values[4];
            let source = right.rows().find(|r| &r.values[0] == city).unwrap();
            assert_eq!(row.values[5], source.values[1]);
        }
    }
}

#[test]
fn test_summarize_without_group_by() {
    let sum = single_column(values![10, 5, 8])
        .summarize(&[], &[Aggregation::sum("x")])
        .unwrap();
    assert_eq!(sum.value(0, "x_sum").unwrap(), Value::Integer(23));

    let floats = single_column(values![10.0, 5.0, 6.0]);
    let avg = floats.summarize(&[], &[Aggregation::avg("x")]).unwrap();
    assert_eq!(avg.value(0, "x_avg").unwrap(), Value::Float(7.0));

    let stddev = floats.summarize(&[], &[Aggregation::stddev("x")]).unwrap();
    match stddev.value(0, "x_stddev").unwrap() {
        Value::Float(x) => assert!((x - 2.160_246_90).abs() < 1e-8),
        other => panic!("unexpected value {:?}", other),
    }
}

#[test]
fn test_summarize_with_group_by() {
    let schema = SchemaBuilder::new().add_integer("a").add_float("c").build().unwrap();
    let mut frame = DataFrame::new(schema);
    frame.insert(values![10, 30.0]).unwrap();
    frame.insert(values![20, 45.0]).unwrap();
    frame.insert(values![20, 60.0]).unwrap();

    let result = frame.summarize(&["a"], &[Aggregation::min("c")]).unwrap();
    assert_eq!(result.size(), 2);

    let mut groups: Vec<(Value, Value)> = result
        .rows()
        .map(|r| (r.values[0].clone(), r.values[1].clone()))
        .collect();
    groups.sort_by_key(|(a, _)| a.to_string());
    assert_eq!(
        groups,
        vec![
            (Value::Integer(10), Value::Float(30.0)),
            (Value::Integer(20), Value::Float(45.0)),
        ]
    );
}

#[test]
fn test_sort_order() {
    let sorted = single_column(values![10, 5, 20, 10])
        .sort_by(SortOrder::Ascending, &["x"])
        .unwrap();
    assert_eq!(sorted.column("x").unwrap().as_integers(), Some(&[5, 10, 10, 20][..]));

    let by_city_then_age = persons().sort_by(SortOrder::Ascending, &["city", "age"]).unwrap();
    let names: Vec<String> = by_city_then_age.rows().map(|r| r.values[0].to_string()).collect();
    assert_eq!(names, vec!["NameA", "NameD", "NameE", "NameB", "NameC"]);
}

#[test]
fn test_print_reports_true_row_count() {
    let frame = persons();
    let options = PrintOptions {
        max_rows: 2,
        ..PrintOptions::default()
    };

    let mut out = Vec::new();
    frame.print_to(&mut out, &options).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(text.lines().count(), 3 + 2 + 2);
    assert_eq!(text.lines().last(), Some("Rows in DataFrame: 5"));
}

#[test]
fn test_pipeline_of_operator_objects() {
    let left = persons();
    let schema = left.schema();

    let apply = ApplyTransform::new(schema, "bmi", None, |r| {
        let size = r.float("size_in_m")?;
        Ok(r.float("weight_in_kg")? / (size * size))
    })
    .unwrap();
    let query = QueryFilter::new(apply.output_schema(), Some(&["age"][..]), |r| {
        Ok(r.integer("age")? < 60)
    })
    .unwrap();
    let join = JoinProcessor::new(JoinType::Inner, query.output_schema(), cities().schema(), &["city"])
        .unwrap()
        .with_right(cities())
        .unwrap();
    let summarize = SummarizeProcessor::new(
        join.output_schema(),
        &["country"],
        &[Aggregation::avg("bmi"), Aggregation::max("age")],
    )
    .unwrap();
    let sort = SortProcessor::new(summarize.output_schema(), SortOrder::Descending, &["country"]).unwrap();
    let select = SelectTransform::new(sort.output_schema(), &["country", "age_max"]).unwrap();

    let pipeline = Pipeline::new("persons", schema)
        .add(apply)
        .unwrap()
        .add(query)
        .unwrap()
        .add(join)
        .unwrap()
        .add(summarize)
        .unwrap()
        .add(sort)
        .unwrap()
        .add(select)
        .unwrap();

    let result = pipeline.execute(&left).unwrap();
    let rows: Vec<Vec<Value>> = result.rows().map(|r| r.values).collect();
    assert_eq!(
        rows,
        vec![
            values!["South Korea", 35],
            values!["Germany", 44],
            values!["Canada", 20],
        ]
    );
}

#[test]
fn test_csv_load_and_summarize() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "city;country;population").unwrap();
    writeln!(file, "Berlin;Germany;3600000").unwrap();
    writeln!(file, "Hamburg;Germany;1800000").unwrap();
    writeln!(file, "Seoul;South Korea;9700000").unwrap();
    file.flush().unwrap();

    let frame = CsvSource::new(file.path(), true, ';').load(cities().schema()).unwrap();
    let result = frame
        .summarize(&["country"], &[Aggregation::sum("population").alias("total")])
        .unwrap();

    assert_eq!(result.value(0, "total").unwrap(), Value::Integer(5_400_000));
    assert_eq!(result.value(1, "country").unwrap(), Value::from("South Korea"));
}
