// Columnar Frame Engine - Main executable
// Author: Gabriel Demetrios Lafis

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use log::{info, warn};

use columnar_frame_engine::{
    data::{CsvSink, CsvSource, DataFrame, DataSink, DataSource, PrintOptions, Schema},
    processing::{Aggregation, SortOrder},
    utils::{init_file_logging, init_logging, Config},
};

fn input_args() -> Vec<Arg<'static>> {
    vec![
        Arg::new("input")
            .value_name("CSV")
            .help("CSV file to load")
            .required(true)
            .index(1),
        Arg::new("schema")
            .short('s')
            .long("schema")
            .value_name("SCHEMA")
            .help("Column types as name:type,name:type,...")
            .takes_value(true)
            .required(true),
        Arg::new("delimiter")
            .short('d')
            .long("delimiter")
            .value_name("CHAR")
            .help("Field delimiter")
            .takes_value(true),
        Arg::new("no-header")
            .long("no-header")
            .help("The first line holds data, not column names"),
        Arg::new("max-rows")
            .short('n')
            .long("max-rows")
            .value_name("N")
            .help("Print at most N rows")
            .takes_value(true),
    ]
}

fn output_arg() -> Arg<'static> {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .help("Also write the result to a CSV file")
        .takes_value(true)
}

fn cli() -> Command<'static> {
    Command::new("columnar-frame")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gabriel Demetrios Lafis")
        .about("Load, transform and print typed CSV data")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file")
                .takes_value(true)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("print")
                .about("Load a CSV file and print it")
                .args(input_args()),
        )
        .subcommand(
            Command::new("summarize")
                .about("Aggregate a CSV file, optionally per group")
                .args(input_args())
                .arg(
                    Arg::new("group-by")
                        .short('g')
                        .long("group-by")
                        .value_name("COLUMNS")
                        .help("Comma separated group-by columns")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("agg")
                        .short('a')
                        .long("agg")
                        .value_name("KIND:COLUMN[:OUTPUT]")
                        .help("Aggregation, e.g. avg:age or sum:n:total")
                        .takes_value(true)
                        .multiple_occurrences(true)
                        .required(true),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("sort")
                .about("Sort a CSV file by one or more columns")
                .args(input_args())
                .arg(
                    Arg::new("by")
                        .short('b')
                        .long("by")
                        .value_name("COLUMNS")
                        .help("Comma separated sort keys, most significant first")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::new("descending")
                        .long("descending")
                        .help("Sort in descending order"),
                )
                .arg(output_arg()),
        )
}

fn load_config(matches: &ArgMatches) -> (Config, Option<anyhow::Error>) {
    match matches.value_of("config") {
        Some(path) => match Config::from_file(path) {
            Ok(config) => (config, None),
            Err(err) => (
                Config::default(),
                Some(anyhow::Error::new(err).context(format!("cannot load config file {}", path))),
            ),
        },
        None => (Config::default(), None),
    }
}

fn split_names(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// The `--delimiter` argument, or the configured delimiter
fn resolve_delimiter(matches: &ArgMatches, config: &Config) -> Result<char> {
    match matches.value_of("delimiter") {
        Some(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c),
                _ => anyhow::bail!("delimiter must be a single ASCII character, got '{}'", text),
            }
        }
        None => Ok(config.csv.delimiter),
    }
}

fn load_input(matches: &ArgMatches, config: &Config) -> Result<DataFrame> {
    let path = matches.value_of("input").context("missing input file")?;
    let schema = Schema::parse_spec(matches.value_of("schema").context("missing schema")?)?;

    let delimiter = resolve_delimiter(matches, config)?;
    let has_header = config.csv.has_header && !matches.is_present("no-header");

    let source = CsvSource::new(path, has_header, delimiter);
    let frame = source
        .load(&schema)
        .with_context(|| format!("cannot load {}", source.name()))?;
    Ok(frame)
}

fn print_options(matches: &ArgMatches, config: &Config) -> Result<PrintOptions> {
    let mut options = config.print.clone();
    if let Some(max_rows) = matches.value_of("max-rows") {
        options.max_rows = max_rows
            .parse()
            .with_context(|| format!("invalid row count '{}'", max_rows))?;
    }
    Ok(options)
}

fn finish(frame: &DataFrame, matches: &ArgMatches, config: &Config) -> Result<()> {
    if let Some(path) = matches.value_of("output") {
        let sink = CsvSink::new(path, resolve_delimiter(matches, config)?);
        sink.write(frame)
            .with_context(|| format!("cannot write {}", sink.name()))?;
    }

    frame.print(&print_options(matches, config)?)?;
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let (config, config_error) = load_config(&matches);
    let logging = match &config.logging.file {
        Some(file) => init_file_logging(config.log_level_filter(), file).map_err(anyhow::Error::new),
        None => init_logging(config.log_level_filter()).map_err(|e| anyhow::anyhow!("{}", e)),
    };
    if let Err(err) = logging {
        eprintln!("Error initializing logger: {}", err);
    }
    if let Some(err) = config_error {
        warn!("{:#}, using defaults", err);
    }

    match matches.subcommand() {
        Some(("print", sub)) => {
            let frame = load_input(sub, &config)?;
            frame.print(&print_options(sub, &config)?)?;
        }
        Some(("summarize", sub)) => {
            let frame = load_input(sub, &config)?;
            let group_by = sub.value_of("group-by").map(split_names).unwrap_or_default();
            let aggregations = sub
                .values_of("agg")
                .into_iter()
                .flatten()
                .map(|spec| spec.parse::<Aggregation>())
                .collect::<Result<Vec<_>, _>>()?;

            info!("summarizing {} rows by {:?}", frame.size(), group_by);
            let result = frame.summarize(&group_by, &aggregations)?;
            finish(&result, sub, &config)?;
        }
        Some(("sort", sub)) => {
            let frame = load_input(sub, &config)?;
            let keys = split_names(sub.value_of("by").context("missing sort keys")?);
            let order = if sub.is_present("descending") {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };

            info!("sorting {} rows by {:?}", frame.size(), keys);
            let result = frame.sort_by(order, &keys)?;
            finish(&result, sub, &config)?;
        }
        _ => unreachable!("a subcommand is required"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnar_frame_engine::{data::SchemaBuilder, values};

    fn sort_matches(extra: &[&str]) -> ArgMatches {
        let mut args = vec!["columnar-frame", "sort", "in.csv", "-s", "x:int,y:str", "-b", "x"];
        args.extend_from_slice(extra);
        let matches = cli().try_get_matches_from(args).unwrap();
        matches.subcommand_matches("sort").unwrap().clone()
    }

    #[test]
    fn test_delimiter_argument_wins_over_config() {
        let config = Config::default();
        assert_eq!(resolve_delimiter(&sort_matches(&["-d", ";"]), &config).unwrap(), ';');
        assert_eq!(resolve_delimiter(&sort_matches(&[]), &config).unwrap(), ',');
        assert!(resolve_delimiter(&sort_matches(&["-d", "§"]), &config).is_err());
    }

    #[test]
    fn test_output_uses_command_line_delimiter() {
        let schema = SchemaBuilder::new().add_integer("x").add_string("y").build().unwrap();
        let mut frame = DataFrame::new(schema);
        frame.insert(values![1, "a"]).unwrap();

        let out = tempfile::NamedTempFile::new().unwrap();
        let path = out.path().to_str().unwrap();
        let matches = sort_matches(&["-d", ";", "-o", path]);
        finish(&frame, &matches, &Config::default()).unwrap();

        let written = std::fs::read_to_string(out.path()).unwrap();
        assert_eq!(written, "x;y\n1;a\n");
    }
}
