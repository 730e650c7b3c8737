// Person and city walkthrough
// Author: Gabriel Demetrios Lafis

use columnar_frame_engine::{
    data::{DataFrame, PrintOptions, SchemaBuilder},
    processing::{Aggregation, JoinType, SortOrder},
    utils::init_logging,
    values,
};

fn person_data() -> Result<DataFrame, Box<dyn std::error::Error>> {
    let schema = SchemaBuilder::new()
        .add_string("name")
        .add_string("city")
        .add_integer("age")
        .add_float("size_in_m")
        .add_integer("weight_in_kg")
        .build()?;

    let mut frame = DataFrame::new(schema);
    frame.insert(values!["NameA", "Berlin", 30, 1.75, 80])?;
    frame.insert(values!["NameB", "London", 62, 1.60, 100])?;
    frame.insert(values!["NameC", "Seoul", 20, 1.90, 70])?;
    frame.insert(values!["NameD", "Tokio", 59, 1.72, 60])?;
    frame.insert(values!["NameE", "San Francisco", 40, 1.79, 95])?;
    frame.insert(values!["NameF", "Toronto", 51, 1.99, 156])?;
    Ok(frame)
}

fn city_data() -> Result<DataFrame, Box<dyn std::error::Error>> {
    let schema = SchemaBuilder::new()
        .add_string("city")
        .add_string("country")
        .add_string("continent")
        .build()?;

    let mut frame = DataFrame::new(schema);
    frame.insert(values!["Berlin", "Germany", "Europe"])?;
    frame.insert(values!["London", "England", "Europe"])?;
    frame.insert(values!["Seoul", "South Korea", "Asia"])?;
    frame.insert(values!["Tokio", "Japan", "Asia"])?;
    frame.insert(values!["San Francisco", "USA", "North America"])?;
    frame.insert(values!["Toronto", "Canada", "North America"])?;
    Ok(frame)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(log::LevelFilter::Debug).map_err(|e| e.to_string())?;

    let persons = person_data()?;
    let cities = city_data()?;

    let with_bmi = persons.apply("bmi", |r| {
        let size = r.float("size_in_m")?;
        Ok(r.integer("weight_in_kg")? as f64 / (size * size))
    })?;
    let below_60 = with_bmi.query(|r| Ok(r.integer("age")? < 60))?;
    let joined = below_60.join(&cities, JoinType::Inner, &["city"])?;

    let summary = joined
        .summarize(&["country"], &[Aggregation::avg("bmi").alias("bmi_avg")])?
        .sort_by(SortOrder::Ascending, &["country"])?;

    summary.print(&PrintOptions {
        string_width: 20,
        ..PrintOptions::default()
    })?;

    Ok(())
}
