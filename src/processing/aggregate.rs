// Aggregate operations for data processing
// Author: Gabriel Demetrios Lafis

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::data::{Column, ColumnType, DataFrame, DataType, Field, Schema, Value};
use super::{check_input, DataProcessor, ProcessingError, ProcessorType};

/// The aggregate functions available to summarize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Sum,
    Min,
    Max,
    Avg,
    StdDev,
    CountIf,
    CountIfNot,
}

impl AggregateKind {
    /// Get the function name
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "sum",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
            AggregateKind::Avg => "avg",
            AggregateKind::StdDev => "stddev",
            AggregateKind::CountIf => "countif",
            AggregateKind::CountIfNot => "countifnot",
        }
    }

    /// Get the suffix appended to the source column for a default output name
    pub fn suffix(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "_sum",
            AggregateKind::Min => "_min",
            AggregateKind::Max => "_max",
            AggregateKind::Avg => "_avg",
            AggregateKind::StdDev => "_stddev",
            AggregateKind::CountIf => "_cntif",
            AggregateKind::CountIfNot => "_cntifnot",
        }
    }

    /// Get the output type for a source column of type `source`, if supported
    pub fn output_type(&self, source: DataType) -> Option<DataType> {
        match self {
            AggregateKind::Sum | AggregateKind::Min | AggregateKind::Max if source.is_numeric() => {
                Some(source)
            }
            AggregateKind::Avg | AggregateKind::StdDev if source.is_numeric() => Some(DataType::Float),
            AggregateKind::CountIf | AggregateKind::CountIfNot if source == DataType::Boolean => {
                Some(DataType::Integer)
            }
            _ => None,
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateKind {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "sum" => Ok(AggregateKind::Sum),
            "min" => Ok(AggregateKind::Min),
            "max" => Ok(AggregateKind::Max),
            "avg" | "mean" => Ok(AggregateKind::Avg),
            "stddev" | "std" => Ok(AggregateKind::StdDev),
            "countif" => Ok(AggregateKind::CountIf),
            "countifnot" => Ok(AggregateKind::CountIfNot),
            _ => Err(ProcessingError::InvalidArgument(format!(
                "Unknown aggregate function '{}'",
                s
            ))),
        }
    }
}

/// One aggregate: a function applied to a source column, stored under `output`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub column: String,
    pub output: String,
    pub kind: AggregateKind,
}

impl Aggregation {
    /// Create a new aggregation with an explicit output name
    pub fn new(kind: AggregateKind, column: &str, output: &str) -> Self {
        Aggregation {
            column: column.to_string(),
            output: output.to_string(),
            kind,
        }
    }

    /// Create a new aggregation named after its column, e.g. `age_avg`
    pub fn of(kind: AggregateKind, column: &str) -> Self {
        Self::new(kind, column, &format!("{}{}", column, kind.suffix()))
    }

    /// Sum of a numeric column
    pub fn sum(column: &str) -> Self {
        Self::of(AggregateKind::Sum, column)
    }

    /// Minimum of a numeric column
    pub fn min(column: &str) -> Self {
        Self::of(AggregateKind::Min, column)
    }

    /// Maximum of a numeric column
    pub fn max(column: &str) -> Self {
        Self::of(AggregateKind::Max, column)
    }

    /// Mean of a numeric column
    pub fn avg(column: &str) -> Self {
        Self::of(AggregateKind::Avg, column)
    }

    /// Population standard deviation of a numeric column
    pub fn stddev(column: &str) -> Self {
        Self::of(AggregateKind::StdDev, column)
    }

    /// Number of `true` values of a boolean column
    pub fn count_if(column: &str) -> Self {
        Self::of(AggregateKind::CountIf, column)
    }

    /// Number of `false` values of a boolean column
    pub fn count_if_not(column: &str) -> Self {
        Self::of(AggregateKind::CountIfNot, column)
    }

    /// Store the result under another name
    pub fn alias(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }
}

impl FromStr for Aggregation {
    type Err = ProcessingError;

    /// Parse `kind:column` or `kind:column:output`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [kind, column] => Ok(Aggregation::of(kind.parse()?, column)),
            [kind, column, output] => Ok(Aggregation::new(kind.parse()?, column, output)),
            _ => Err(ProcessingError::InvalidArgument(format!(
                "Expected 'kind:column[:output]', got '{}'",
                s
            ))),
        }
    }
}

/// Numeric element types that sum, min and max operate on
trait Numeric: ColumnType + Copy + PartialOrd + 'static {
    const ZERO: Self;
    const LOWEST: Self;
    const HIGHEST: Self;

    fn add(self, other: Self) -> Self;

    fn values(column: &Column) -> Option<&[Self]>;
}

impl Numeric for i64 {
    const ZERO: Self = 0;
    const LOWEST: Self = i64::MIN;
    const HIGHEST: Self = i64::MAX;

    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    fn values(column: &Column) -> Option<&[Self]> {
        column.as_integers()
    }
}

impl Numeric for f64 {
    const ZERO: Self = 0.0;
    const LOWEST: Self = f64::MIN;
    const HIGHEST: Self = f64::MAX;

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn values(column: &Column) -> Option<&[Self]> {
        column.as_floats()
    }
}

fn float_at(column: &Column, row: usize) -> Option<f64> {
    match column {
        Column::Integer(v) => Some(v[row] as f64),
        Column::Float(v) => Some(v[row]),
        _ => None,
    }
}

/// Per-group state of one aggregate, updated one row at a time
trait Accumulator {
    fn update(&mut self, column: &Column, row: usize);

    fn state(&self) -> Value;
}

struct SumState<N> {
    sum: N,
}

impl<N: Numeric> Accumulator for SumState<N> {
    fn update(&mut self, column: &Column, row: usize) {
        if let Some(values) = N::values(column) {
            self.sum = self.sum.add(values[row]);
        }
    }

    fn state(&self) -> Value {
        self.sum.into_value()
    }
}

struct MinState<N> {
    min: N,
}

impl<N: Numeric> Accumulator for MinState<N> {
    fn update(&mut self, column: &Column, row: usize) {
        if let Some(values) = N::values(column) {
            if values[row] < self.min {
                self.min = values[row];
            }
        }
    }

    fn state(&self) -> Value {
        self.min.into_value()
    }
}

struct MaxState<N> {
    max: N,
}

impl<N: Numeric> Accumulator for MaxState<N> {
    fn update(&mut self, column: &Column, row: usize) {
        if let Some(values) = N::values(column) {
            if values[row] > self.max {
                self.max = values[row];
            }
        }
    }

    fn state(&self) -> Value {
        self.max.into_value()
    }
}

/// Incremental mean: `mean += (x - mean) / count`
#[derive(Default)]
struct MeanState {
    mean: f64,
    count: u64,
}

impl Accumulator for MeanState {
    fn update(&mut self, column: &Column, row: usize) {
        if let Some(x) = float_at(column, row) {
            self.count += 1;
            self.mean += (x - self.mean) / self.count as f64;
        }
    }

    fn state(&self) -> Value {
        Value::Float(self.mean)
    }
}

/// Welford's single-pass variance, reported as population standard deviation
#[derive(Default)]
struct StdDevState {
    mean: f64,
    m2: f64,
    count: u64,
}

impl Accumulator for StdDevState {
    fn update(&mut self, column: &Column, row: usize) {
        if let Some(x) = float_at(column, row) {
            self.count += 1;
            let delta = x - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (x - self.mean);
        }
    }

    fn state(&self) -> Value {
        if self.count == 0 {
            return Value::Float(f64::NAN);
        }
        Value::Float((self.m2 / self.count as f64).sqrt())
    }
}

struct CountIfState {
    target: bool,
    count: i64,
}

impl Accumulator for CountIfState {
    fn update(&mut self, column: &Column, row: usize) {
        if let Some(values) = column.as_booleans() {
            if values[row] == self.target {
                self.count += 1;
            }
        }
    }

    fn state(&self) -> Value {
        Value::Integer(self.count)
    }
}

fn new_accumulator(kind: AggregateKind, source: DataType) -> Box<dyn Accumulator> {
    match (kind, source) {
        (AggregateKind::Sum, DataType::Integer) => Box::new(SumState { sum: i64::ZERO }),
        (AggregateKind::Sum, _) => Box::new(SumState { sum: f64::ZERO }),
        (AggregateKind::Min, DataType::Integer) => Box::new(MinState { min: i64::HIGHEST }),
        (AggregateKind::Min, _) => Box::new(MinState { min: f64::HIGHEST }),
        (AggregateKind::Max, DataType::Integer) => Box::new(MaxState { max: i64::LOWEST }),
        (AggregateKind::Max, _) => Box::new(MaxState { max: f64::LOWEST }),
        (AggregateKind::Avg, _) => Box::new(MeanState::default()),
        (AggregateKind::StdDev, _) => Box::new(StdDevState::default()),
        (AggregateKind::CountIf, _) => Box::new(CountIfState { target: true, count: 0 }),
        (AggregateKind::CountIfNot, _) => Box::new(CountIfState { target: false, count: 0 }),
    }
}

/// A resolved aggregation: source column position and function
#[derive(Debug, Clone)]
struct AggregateSpec {
    source: usize,
    source_type: DataType,
    output_type: DataType,
    kind: AggregateKind,
}

/// A group: one representative row holding its key, plus its accumulators
struct Group {
    row: usize,
    accumulators: Vec<Box<dyn Accumulator>>,
}

/// Aggregate rows per distinct group-by key.
///
/// Groups are found by a linear scan over the groups seen so far and are
/// emitted in first-encounter order. Without group-by columns there is
/// exactly one group, so an empty input still yields one row of initial
/// states.
pub struct SummarizeProcessor {
    input_schema: Schema,
    output_schema: Schema,
    group_by: Vec<usize>,
    specs: Vec<AggregateSpec>,
}

impl SummarizeProcessor {
    /// Create a new summarize processor
    pub fn new(
        schema: &Schema,
        group_by: &[&str],
        aggregations: &[Aggregation],
    ) -> Result<Self, ProcessingError> {
        if aggregations.is_empty() {
            return Err(ProcessingError::InvalidArgument(
                "Summarize needs at least one aggregation".to_string(),
            ));
        }

        let group_by = schema.resolve(group_by, "group by")?;
        let mut fields: Vec<Field> = group_by.iter().map(|&i| schema.fields()[i].clone()).collect();

        let mut specs = Vec::with_capacity(aggregations.len());
        for aggregation in aggregations {
            let source = schema.require_index(&aggregation.column)?;
            let source_type = schema.fields()[source].data_type;
            let output_type = aggregation.kind.output_type(source_type).ok_or_else(|| {
                ProcessingError::InvalidArgument(format!(
                    "Cannot compute {} of {} column '{}'",
                    aggregation.kind, source_type, aggregation.column
                ))
            })?;

            fields.push(Field::new(&aggregation.output, output_type));
            specs.push(AggregateSpec {
                source,
                source_type,
                output_type,
                kind: aggregation.kind,
            });
        }

        let output_schema = Schema::new(fields)?;
        debug!("summarize: output columns {:?}", output_schema.names());

        Ok(SummarizeProcessor {
            input_schema: schema.clone(),
            output_schema,
            group_by,
            specs,
        })
    }

    fn new_group(&self, row: usize) -> Group {
        Group {
            row,
            accumulators: self
                .specs
                .iter()
                .map(|spec| new_accumulator(spec.kind, spec.source_type))
                .collect(),
        }
    }

    fn find_group(&self, groups: &[Group], columns: &[Column], row: usize) -> Option<usize> {
        groups.iter().position(|group| {
            self.group_by
                .iter()
                .all(|&k| columns[k].rows_equal(group.row, &columns[k], row))
        })
    }
}

impl DataProcessor for SummarizeProcessor {
    fn process(&self, input: &DataFrame) -> Result<DataFrame, ProcessingError> {
        check_input(&self.input_schema, input)?;
        let columns = input.columns();

        let mut groups: Vec<Group> = Vec::new();
        if self.group_by.is_empty() {
            groups.push(self.new_group(0));
        }

        for row in 0..input.size() {
            let index = match self.find_group(&groups, columns, row) {
                Some(index) => index,
                None => {
                    groups.push(self.new_group(row));
                    groups.len() - 1
                }
            };

            for (spec, accumulator) in self.specs.iter().zip(&mut groups[index].accumulators) {
                accumulator.update(&columns[spec.source], row);
            }
        }
        debug!("summarize: {} rows in {} groups", input.size(), groups.len());

        let key_rows: Vec<usize> = groups.iter().map(|g| g.row).collect();
        let mut output: Vec<Column> = self
            .group_by
            .iter()
            .map(|&k| columns[k].take(&key_rows))
            .collect();

        for (i, spec) in self.specs.iter().enumerate() {
            let mut column = Column::with_capacity(spec.output_type, groups.len());
            for group in &groups {
                column.push(group.accumulators[i].state())?;
            }
            output.push(column);
        }

        Ok(DataFrame::from_columns(self.output_schema.clone(), output)?)
    }

    fn name(&self) -> &str {
        "summarize"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Aggregate
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }
}
