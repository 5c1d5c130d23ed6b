mod cli;

use log::error;
use sanbase_client::{catalog, is_rate_limit_exception, rate_limit_time_left, Client, SanError};

fn main() -> anyhow::Result<()> {
    let cmd = cli::build_cli();
    let matches = cmd.get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("sanbase-client {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match matches.subcommand() {
        Some(("metrics", _)) => print_metrics(),
        Some((name, sub)) => {
            let client = Client::from_env()?;
            if let Err(e) = run(&client, name, sub) {
                report(&e);
                return Err(e.into());
            }
            Ok(())
        }
        None => {
            cli::build_cli().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run(client: &Client, name: &str, sub: &clap::ArgMatches) -> Result<(), SanError> {
    match name {
        "get" => {
            let dataset = sub
                .get_one::<String>("dataset")
                .map(String::as_str)
                .unwrap_or_default();
            let params = cli::query_params(sub).map_err(|e| SanError::InvalidParams(e.to_string()))?;
            let frame = client.get(dataset, &params)?;
            match sub.get_one::<String>("format").map(String::as_str) {
                Some("csv") => print!("{}", frame.to_csv()),
                _ => println!("{}", to_json(&frame)?),
            }
        }
        "calls-remaining" => println!("{}", to_json(&client.api_calls_remaining()?)?),
        "calls-made" => println!("{}", to_json(&client.api_calls_made()?)?),
        other => return Err(SanError::InvalidParams(format!("unknown command {}", other))),
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, SanError> {
    serde_json::to_string_pretty(value).map_err(|e| SanError::transport(e.to_string()))
}

fn report(e: &SanError) {
    if is_rate_limit_exception(e) {
        match rate_limit_time_left(e) {
            Some(secs) => error!("rate limited; retry in {} seconds", secs),
            None => error!("rate limited"),
        }
    }
}

fn print_metrics() -> anyhow::Result<()> {
    let listing = serde_json::json!({
        "custom": catalog::custom_names().collect::<Vec<_>>(),
        "mapped": catalog::mapped_names().collect::<Vec<_>>(),
        "deprecated": catalog::deprecated()
            .map(|(name, repl)| serde_json::json!({"metric": name, "replacement": repl}))
            .collect::<Vec<_>>(),
        "no_slug": catalog::no_slug_names().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
