mod args;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use set_date_taken_core::{
    FileOutcome, FileReport, FixedDate, InvocationError, WalkOptions, CORRECTED_FOLDER,
};

const ABOUT: &str = "\
Set the Date Taken of the image(s) under a base folder to a given date.

The time portion of the date comes from the Date Taken if available,
otherwise the modification time is used. A \"Corrected\" folder is created
next to each image with the same filenames, carrying the new Date Taken;
the original files remain unmodified.

GIF and BMP images are accepted but have no place for a Date Taken tag;
they are reported as unsupported and left without a corrected copy.";

const PATHNAME_HELP: &str = "\
Root of the tree to scan. May end in a wildcard pattern such as
\"Pictures/DisneyWorld *.JPG\" to process matching files only, or name a
single image. Wildcards prevent recursion into sub-folders, since their
names will rarely match the pattern.";

#[derive(Parser)]
#[command(name = "set-date-taken", version, about = ABOUT)]
struct Cli {
    #[arg(help = PATHNAME_HELP)]
    pathname: String,

    /// Four digit year
    year: i32,

    /// Month of the year (1..12) or its name
    #[arg(value_parser = args::parse_month)]
    month: i32,

    /// Day of the month (1..31); checked against the calendar
    day: i32,

    /// Name of the output folder created next to each image folder
    #[arg(long, default_value = CORRECTED_FOLDER)]
    corrected_name: String,

    /// Print a JSON summary when done
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("set_date_taken={level},set_date_taken_core={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_usage(args: &[String], err: &clap::Error) {
    println!(".");
    println!("The number of parameters are {}", args.len().saturating_sub(1));
    for (i, arg) in args.iter().enumerate().skip(1) {
        println!("Parameter {} is {}", i, arg);
    }
    println!(".");
    println!("{}", err.render());
    println!("{}", Cli::command().render_long_help());
}

fn print_report(report: &FileReport) {
    println!("{}", report.path.display());
    match &report.outcome {
        FileOutcome::Corrected { date, .. } => println!("New Date:\n\t{}\n.", date),
        FileOutcome::InvalidDate { .. } => println!(".\nInvalid date and time.\n."),
        FileOutcome::Unsupported { format } => {
            println!(".\nUnsupported format: {} images cannot carry a Date Taken\n.", format)
        }
        FileOutcome::Failed { reason } => println!(".\nFailed: {}\n.", reason),
    }
}

fn main() -> ExitCode {
    let args = args::corrected_args(std::env::args_os());
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            print_usage(&args, &e);
            return ExitCode::from(InvocationError::Usage(e.to_string()).exit_code());
        }
    };
    init_tracing(cli.verbose);

    let mut options = WalkOptions::new(cli.pathname, FixedDate::new(cli.year, cli.month, cli.day));
    options.corrected_folder = cli.corrected_name;

    if let Err(e) = options.validate() {
        println!(".\n{}\n.", e);
        return ExitCode::from(e.exit_code());
    }
    println!(".\nGiven pathname:\n\t{}", options.root);
    println!("The date parameters yielded: {}\n.", options.date.at_midnight());

    let t = std::time::Instant::now();
    let summary = match set_date_taken_core::process(&options, &print_report) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    eprintln!(
        "Done! {} images, {} corrected, {} invalid dates, {} unsupported, {} failed ({:.2}s)",
        summary.scanned,
        summary.corrected,
        summary.invalid_dates,
        summary.unsupported,
        summary.failed,
        t.elapsed().as_secs_f64()
    );
    ExitCode::SUCCESS
}
