use schemaviz::layout::GridConfig;
use schemaviz::sql::{Dialect, ImportOptions};
use schemaviz::Session;
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::filter::EnvFilter;

enum Format {
    Sql,
    Json,
}

impl Format {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sql" => Some(Self::Sql),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <input.sql> [options]", program);
    eprintln!("       {} --sample [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <file>      Output file (default: stdout)");
    eprintln!("  -f, --format <format>    Output format: sql, json (default: sql)");
    eprintln!("  -c, --columns <n>        Grid columns for table placement (default: 3)");
    eprintln!("  -d, --dialect <dialect>  Input dialect: auto, generic, postgres, mysql (default: auto)");
    eprintln!("      --infer-one-to-one   Mark foreign keys on unique columns as 1:1");
    eprintln!("      --sample             Start from the built-in sample schema");
    eprintln!("  -v, --verbose            Log debug output to stderr");
    eprintln!("  -q, --quiet              Only log errors");
    process::exit(1);
}

fn init_logging(level: Option<&str>) {
    let filter = match (level, env::var_os("RUST_LOG")) {
        (Some(level), _) => EnvFilter::new(level),
        (None, Some(_)) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        (None, None) => EnvFilter::new("warn"),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage(&args[0]);
    }

    let mut input_path: Option<String> = None;
    let mut output_path: Option<String> = None;
    let mut format = Format::Sql;
    let mut options = ImportOptions::default();
    let mut sample = false;
    let mut level: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_path = Some(args[i].clone());
                }
            }
            "-f" | "--format" => {
                i += 1;
                if i < args.len() {
                    format = Format::from_str(&args[i]).unwrap_or_else(|| {
                        eprintln!("Invalid format: {}", args[i]);
                        process::exit(1);
                    });
                }
            }
            "-c" | "--columns" => {
                i += 1;
                if i < args.len() {
                    let columns = args[i].parse::<usize>().unwrap_or_else(|_| {
                        eprintln!("Invalid column count: {}", args[i]);
                        process::exit(1);
                    });
                    options.grid = GridConfig {
                        columns,
                        ..options.grid
                    };
                }
            }
            "-d" | "--dialect" => {
                i += 1;
                if i < args.len() {
                    options.dialect = Dialect::from_str(&args[i]).unwrap_or_else(|| {
                        eprintln!("Invalid dialect: {}", args[i]);
                        process::exit(1);
                    });
                }
            }
            "--infer-one-to-one" => options.infer_one_to_one = true,
            "--sample" => sample = true,
            "-v" | "--verbose" => level = Some("debug"),
            "-q" | "--quiet" => level = Some("error"),
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                process::exit(1);
            }
            arg => {
                if input_path.is_some() {
                    eprintln!("Unexpected argument: {}", arg);
                    process::exit(1);
                }
                input_path = Some(arg.to_string());
            }
        }
        i += 1;
    }

    init_logging(level);

    let mut session = if sample {
        Session::with_sample(options)
    } else {
        Session::new(options)
    };

    if let Some(path) = &input_path {
        let input = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to read {}: {}", path, e);
                process::exit(1);
            }
        };
        if let Err(e) = session.import_ddl(&input) {
            eprintln!("{} error: {}", e.kind(), e);
            process::exit(1);
        }
    } else if !sample {
        usage(&args[0]);
    }

    let output = match format {
        Format::Sql => session.export_ddl(),
        Format::Json => serde_json::to_string_pretty(&serde_json::json!({
            "graph": session.graph(),
            "placements": session.placements(),
        }))
        .map_err(Into::into),
    };
    let output = match output {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{} error: {}", e.kind(), e);
            process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &output) {
                eprintln!("Failed to write {}: {}", path, e);
                process::exit(1);
            }
        }
        None => print!("{}", output),
    }
}
