//! Stats bucket demo
//!
//! Replays a batch of synthetic HTTP requests through a [`StatsClient`] and
//! shows how varying path segments collapse into `-id-` buckets.
//!
//! # Usage
//!
//! ```bash
//! # In-memory backend, prints the resulting counters
//! stats_demo --requests 200
//!
//! # Log every observation instead
//! STATS_DSN=log:// RUST_LOG=info stats_demo
//! ```

use stats_buckets::logging::{init_tracing, LoggingConfig};
use stats_buckets::{Backend, MemorySink, Operation, StatsClient, StatsConfig};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

fn print_usage(program: &str) {
    eprintln!(
        r#"Stats bucket demo

Track synthetic requests and print the resulting bucket names.

USAGE:
    {program} [OPTIONS]

OPTIONS:
    --requests <N>      Number of synthetic requests (default: 100)
    --threshold <N>     Override STATS_ID_THRESHOLD
    --help, -h          Show this help message

ENVIRONMENT:
    STATS_DSN                     memory://, log:// or noop:// (default: memory://)
    STATS_ID_THRESHOLD            Distinct values per prefix (default: 25)
    STATS_HTTP_REQUEST_SECTION    Section for request buckets (default: request)
    LOG_FORMAT, RUST_LOG          Logging output
"#,
        program = program
    );
}

struct Args {
    requests: usize,
    threshold: Option<usize>,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let program = &args[0];

    if args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        print_usage(program);
        std::process::exit(0);
    }

    let mut requests = 100;
    let mut threshold = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--requests" => {
                i += 1;
                if i >= args.len() {
                    return Err("--requests requires a value".to_string());
                }
                requests = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid request count: {}", args[i]))?;
            }
            "--threshold" => {
                i += 1;
                if i >= args.len() {
                    return Err("--threshold requires a value".to_string());
                }
                threshold = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("Invalid threshold: {}", args[i]))?,
                );
            }
            arg => {
                return Err(format!("Unknown argument: {}", arg));
            }
        }
        i += 1;
    }

    Ok(Args {
        requests,
        threshold,
    })
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run with --help for usage information.");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = init_tracing(&LoggingConfig::from_env()) {
        eprintln!("Error: {}", e);
        return ExitCode::from(1);
    }

    let mut config = match StatsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }

    // Keep a typed handle on the memory sink so the counters can be printed
    let memory = (config.backend == Backend::Memory).then(|| Arc::new(MemorySink::new()));
    let client = match &memory {
        Some(sink) => StatsClient::builder()
            .sink(sink.clone())
            .threshold(config.threshold)
            .http_request_section(config.http_request_section.clone())
            .build(),
        None => StatsClient::from_config(&config),
    };

    let articles = ["intro", "roadmap", "changelog"];
    for i in 0..args.requests {
        let timer = client.build_timer();
        let path = match i % 4 {
            0 => format!("/users/{}", i),
            1 => format!("/users/user-{}/settings", i),
            2 => format!("/articles/{}", articles[i % articles.len()]),
            _ => "/health".to_string(),
        };
        client.track_http("GET", &path, timer, i % 10 != 0);
    }

    let timer = client.build_timer();
    client.track_operation_n(
        "jobs",
        &Operation::new(["import", "csv"]),
        timer,
        args.requests as u64,
        true,
    );

    if let Some(sink) = memory {
        let mut counts: Vec<_> = sink.count_metrics().into_iter().collect();
        counts.sort();

        println!("{} buckets", counts.len());
        for (bucket, count) in counts {
            println!("{:>8}  {}", count, bucket);
        }
    }

    ExitCode::SUCCESS
}
