use rust_decimal::Decimal;
use sales_comparison::domain::{format_amount, ChangeMode, FilterParams};
use sales_comparison::error::{AnalysisError, Result};
use sales_comparison::run;
use sales_comparison::writer::ExportFormat;
use std::{env::args, fs::File, io, process::exit, str::FromStr};

const USAGE: &str = "usage: sales-compare <prior> <current> [--min N] [--max N] \
[--change all|increase|decrease] [--search TERM] [--top N] [--out FILE.csv|FILE.xlsx]";

#[derive(Debug, PartialEq)]
struct Options {
    prior: String,
    current: String,
    params: FilterParams,
    top: Option<usize>,
    out: Option<String>,
}

fn main() {
    env_logger::init();

    let arguments = args().collect::<Vec<String>>();
    if let Err(err) = get_options(&arguments).and_then(|o| execute(&o)) {
        eprintln!("{}", err);
        exit(1)
    }
}

fn execute(options: &Options) -> Result<()> {
    let summary = match &options.out {
        Some(path) => run(
            &options.prior,
            &options.current,
            &options.params,
            options.top,
            ExportFormat::from_path(path),
            File::create(path)?,
        )?,
        None => run(
            &options.prior,
            &options.current,
            &options.params,
            options.top,
            ExportFormat::Csv,
            io::stdout().lock(),
        )?,
    };

    eprintln!("前年総売上: {}円", format_amount(summary.prior_total));
    eprintln!("今年総売上: {}円", format_amount(summary.current_total));
    eprintln!("総増減額: {}円", format_amount(summary.total_delta));
    match summary.total_delta_ratio.percentage() {
        Some(_) => eprintln!("総増減率: {}%", summary.total_delta_ratio),
        None => eprintln!("総増減率: 計算不能"),
    }
    Ok(())
}

fn parse_value<T: FromStr>(flag: &str, value: Option<&String>) -> Result<T> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AnalysisError::InvalidArgument(format!("{} expects a value", flag)))
}

fn get_options(arguments: &[String]) -> Result<Options> {
    let mut positional = vec![];
    let mut params = FilterParams::default();
    let mut top = None;
    let mut out = None;

    let mut iter = arguments.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--min" => params.min_amount = Some(parse_value::<Decimal>(arg, iter.next())?),
            "--max" => params.max_amount = Some(parse_value::<Decimal>(arg, iter.next())?),
            "--change" => params.change = parse_value::<ChangeMode>(arg, iter.next())?,
            "--search" => params.search = Some(parse_value::<String>(arg, iter.next())?),
            "--top" => top = Some(parse_value::<usize>(arg, iter.next())?),
            "--out" => out = Some(parse_value::<String>(arg, iter.next())?),
            flag if flag.starts_with("--") => {
                return Err(AnalysisError::InvalidArgument(format!(
                    "unknown option {}\n{}",
                    flag, USAGE
                )))
            }
            _ => positional.push(arg.to_owned()),
        }
    }

    if positional.len() != 2 {
        return Err(AnalysisError::InvalidArgument(format!(
            "wrong number of arguments\n{}",
            USAGE
        )));
    }
    let current = positional.pop().unwrap_or_default();
    let prior = positional.pop().unwrap_or_default();

    Ok(Options {
        prior,
        current,
        params,
        top,
        out,
    })
}
