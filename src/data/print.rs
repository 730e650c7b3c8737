// Fixed-width tabular rendering of dataframes
// Author: Gabriel Demetrios Lafis

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

use super::{Column, DataError, DataFrame, DataType};

const MIN_COLUMN_WIDTH: usize = 3;
const BOOLEAN_WIDTH: usize = 5;
// digits10 of i64, one more digit, and the sign
const INTEGER_WIDTH: usize = 18 + 1 + 1;

/// Formatting options for printing a dataframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintOptions {
    /// Column width for floating point values
    pub fixedpoint_width: usize,
    /// Significant digits for floating point values
    pub fixedpoint_precision: usize,
    /// Column width for strings
    pub string_width: usize,
    /// Maximum number of rows to display
    pub max_rows: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            fixedpoint_width: 8,
            fixedpoint_precision: 2,
            string_width: 10,
            max_rows: usize::MAX,
        }
    }
}

/// Get the display width of a column type, never below 3
pub fn column_width(data_type: DataType, options: &PrintOptions) -> usize {
    let width = match data_type {
        DataType::Boolean => BOOLEAN_WIDTH,
        DataType::Integer => INTEGER_WIDTH,
        DataType::Float => options.fixedpoint_width + 1,
        DataType::String => options.string_width,
    };
    width.max(MIN_COLUMN_WIDTH)
}

/// Pad `text` to `width`, or cut it and mark the cut with `..`
pub fn fit_to_width(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        let mut cell = String::with_capacity(text.len() + width - len);
        cell.push_str(text);
        cell.extend(std::iter::repeat(' ').take(width - len));
        cell
    } else if width > MIN_COLUMN_WIDTH {
        let mut cell: String = text.chars().take(width - 2).collect();
        cell.push_str("..");
        cell
    } else {
        text.chars().take(MIN_COLUMN_WIDTH).collect()
    }
}

/// Render a float with `precision` significant digits.
///
/// Follows the general (`%g`) notation of C streams: scientific form with a
/// signed two-digit exponent when the exponent is below -4 or not below the
/// precision, plain decimal otherwise. Trailing zeros are dropped in both.
pub fn format_significant(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Render the raw text of one cell
pub fn format_cell(column: &Column, row: usize, options: &PrintOptions) -> String {
    match column {
        Column::Boolean(v) => v[row].to_string(),
        Column::Integer(v) => v[row].to_string(),
        Column::Float(v) => format_significant(v[row], options.fixedpoint_precision),
        Column::String(v) => v[row].clone(),
    }
}

/// Renders a bordered table of (a selection of) the columns of a dataframe
pub struct TablePrinter<'a> {
    frame: &'a DataFrame,
    columns: Vec<usize>,
    widths: Vec<usize>,
    options: &'a PrintOptions,
}

impl<'a> TablePrinter<'a> {
    /// Print every column
    pub fn new(frame: &'a DataFrame, options: &'a PrintOptions) -> Self {
        let columns: Vec<usize> = (0..frame.schema().len()).collect();
        Self::with_indices(frame, columns, options)
    }

    /// Print only the named columns, in the given order
    pub fn with_columns(
        frame: &'a DataFrame,
        names: &[&str],
        options: &'a PrintOptions,
    ) -> Result<Self, DataError> {
        let columns = frame.schema().resolve(names, "print selection")?;
        Ok(Self::with_indices(frame, columns, options))
    }

    fn with_indices(frame: &'a DataFrame, columns: Vec<usize>, options: &'a PrintOptions) -> Self {
        let widths = columns
            .iter()
            .map(|&i| column_width(frame.schema().fields()[i].data_type, options))
            .collect();

        TablePrinter {
            frame,
            columns,
            widths,
            options,
        }
    }

    fn separator<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let rules: Vec<String> = self.widths.iter().map(|&w| "-".repeat(w)).collect();
        writeln!(out, "|-{}-|", rules.join("---"))
    }

    fn line<W: fmt::Write>(&self, out: &mut W, cells: Vec<String>) -> fmt::Result {
        let cells: Vec<String> = cells
            .iter()
            .zip(&self.widths)
            .map(|(cell, &width)| fit_to_width(cell, width))
            .collect();
        writeln!(out, "| {} |", cells.join(" | "))
    }

    /// Render the table into any formatter sink
    pub fn render<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let fields = self.frame.schema().fields();

        self.separator(out)?;
        let header = self.columns.iter().map(|&i| fields[i].name.clone()).collect();
        self.line(out, header)?;
        self.separator(out)?;

        let size = self.frame.size();
        for row in 0..size.min(self.options.max_rows) {
            let cells = self
                .columns
                .iter()
                .map(|&i| format_cell(&self.frame.columns()[i], row, self.options))
                .collect();
            self.line(out, cells)?;
        }

        self.separator(out)?;
        writeln!(out, "Rows in DataFrame: {}", size)
    }

    /// Render the table into a string
    pub fn render_to_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.render(&mut out);
        out
    }

    /// Write the table to a byte sink
    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.render_to_string().as_bytes())?;
        writer.flush()
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let options = PrintOptions::default();
        TablePrinter::new(self, &options).render(f)
    }
}

impl DataFrame {
    /// Print the dataframe to standard output
    pub fn print(&self, options: &PrintOptions) -> Result<(), DataError> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.print_to(&mut handle, options)
    }

    /// Print the dataframe to any byte sink
    pub fn print_to<W: io::Write>(&self, writer: &mut W, options: &PrintOptions) -> Result<(), DataError> {
        TablePrinter::new(self, options).write_to(writer)?;
        Ok(())
    }

    /// Print only the named columns to any byte sink
    pub fn print_columns_to<W: io::Write>(
        &self,
        writer: &mut W,
        names: &[&str],
        options: &PrintOptions,
    ) -> Result<(), DataError> {
        TablePrinter::with_columns(self, names, options)?.write_to(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SchemaBuilder;
    use crate::values;

    fn frame() -> DataFrame {
        let schema = SchemaBuilder::new()
            .add_integer("a")
            .add_float("b")
            .add_boolean("c")
            .add_string("d")
            .build()
            .unwrap();
        let mut frame = DataFrame::new(schema);
        frame.insert(values![1, 1.5, true, "short"]).unwrap();
        frame.insert(values![-20, 2.25, false, "a very long text"]).unwrap();
        frame
    }

    #[test]
    fn test_fit_to_width() {
        assert_eq!(fit_to_width("abcdef", 3), "abc");
        assert_eq!(fit_to_width("abcdef", 4), "ab..");
        assert_eq!(fit_to_width("abcdef", 6), "abcdef");
        assert_eq!(fit_to_width("ab", 4), "ab  ");
    }

    #[test]
    fn test_column_widths() {
        let options = PrintOptions::default();
        assert_eq!(column_width(DataType::Integer, &options), 20);
        assert_eq!(column_width(DataType::Float, &options), 9);
        assert_eq!(column_width(DataType::Boolean, &options), 5);
        assert_eq!(column_width(DataType::String, &options), 10);

        let narrow = PrintOptions {
            string_width: 1,
            ..PrintOptions::default()
        };
        assert_eq!(column_width(DataType::String, &narrow), 3);
    }

    #[test]
    fn test_format_cell() {
        let options = PrintOptions::default();
        let column = Column::Float(vec![27.6543, 1.5, 123456.789]);
        assert_eq!(format_cell(&column, 0, &options), "28");
        assert_eq!(format_cell(&column, 1, &options), "1.5");
        assert_eq!(format_cell(&column, 2, &options), "1.2e+05");
        assert_eq!(format_cell(&Column::Boolean(vec![false]), 0, &options), "false");
    }

    #[test]
    fn test_format_significant() {
        assert_eq!(format_significant(2.25, 6), "2.25");
        assert_eq!(format_significant(0.0, 2), "0");
        assert_eq!(format_significant(-3.14159, 3), "-3.14");
        assert_eq!(format_significant(0.000012345, 3), "1.23e-05");
        assert_eq!(format_significant(0.0001, 2), "0.0001");
        assert_eq!(format_significant(99.96, 3), "100");
        assert_eq!(format_significant(1234567.9, 2), "1.2e+06");
        assert_eq!(format_significant(7.0, 0), "7");
        assert_eq!(format_significant(f64::NAN, 2), "nan");
        assert_eq!(format_significant(f64::NEG_INFINITY, 2), "-inf");
    }

    #[test]
    fn test_table_layout() {
        let frame = frame();
        let options = PrintOptions::default();
        let printer = TablePrinter::with_columns(&frame, &["c", "d"], &options).unwrap();

        let rendered = printer.render_to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "| c     | d          |");
        assert_eq!(lines[3], "| true  | short      |");
        assert_eq!(lines[4], "| false | a very l.. |");
        assert_eq!(lines[0], format!("|{}|", "-".repeat(20)));
        assert_eq!(lines[2], lines[0]);
        assert_eq!(lines[5], lines[0]);
        assert_eq!(lines[6], "Rows in DataFrame: 2");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_row_cap_keeps_true_count() {
        let frame = frame();
        let options = PrintOptions {
            max_rows: 1,
            ..PrintOptions::default()
        };

        let mut out = Vec::new();
        frame.print_to(&mut out, &options).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 6);
        assert!(text.ends_with("Rows in DataFrame: 2\n"));
    }

    #[test]
    fn test_unknown_print_column() {
        let frame = frame();
        let options = PrintOptions::default();
        assert!(TablePrinter::with_columns(&frame, &["zzz"], &options).is_err());
    }
}
