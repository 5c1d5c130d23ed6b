use clap::{Arg, ArgAction, ArgMatches, Command};
use sanbase_client::{QueryParams, Selector};

pub fn build_cli() -> Command {
    Command::new("sanbase-client")
        .about("Query Santiment metrics over GraphQL")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .global(true)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("get")
                .about("Fetch a metric as a table")
                .arg(
                    Arg::new("dataset")
                        .required(true)
                        .help("<metric> or <metric>/<slug>"),
                )
                .arg(Arg::new("slug").long("slug").num_args(1))
                .arg(
                    Arg::new("selector")
                        .long("selector")
                        .num_args(1)
                        .help("JSON object, e.g. {\"organization\":\"ethereum\"}"),
                )
                .arg(Arg::new("from").long("from").num_args(1))
                .arg(Arg::new("to").long("to").num_args(1))
                .arg(Arg::new("interval").long("interval").num_args(1))
                .arg(Arg::new("aggregation").long("aggregation").num_args(1))
                .arg(
                    Arg::new("extra")
                        .long("extra")
                        .num_args(1)
                        .action(ArgAction::Append)
                        .help("Additional argument as name=value (value parsed as JSON when possible)"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .num_args(1)
                        .value_parser(["json", "csv"])
                        .default_value("json"),
                ),
        )
        .subcommand(Command::new("calls-remaining").about("Show remaining API calls"))
        .subcommand(Command::new("calls-made").about("Show API call history"))
        .subcommand(Command::new("metrics").about("List metrics with special handling"))
}

pub fn init_logging(level: Option<&str>) {
    // Respect explicit level, else default to info, allow env override via RUST_LOG
    if let Some(lvl) = level {
        std::env::set_var("RUST_LOG", lvl);
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn parse_selector(raw: &str) -> Selector {
    serde_json::from_str(raw).unwrap_or_else(|_| Selector::Slug(raw.to_string()))
}

pub fn query_params(m: &ArgMatches) -> anyhow::Result<QueryParams> {
    let mut params = QueryParams::new();
    params.slug = m.get_one::<String>("slug").cloned();
    params.selector = m.get_one::<String>("selector").map(|s| parse_selector(s));
    params.from_date = m.get_one::<String>("from").cloned();
    params.to_date = m.get_one::<String>("to").cloned();
    params.interval = m.get_one::<String>("interval").cloned();
    params.aggregation = m.get_one::<String>("aggregation").cloned();
    if let Some(extras) = m.get_many::<String>("extra") {
        for raw in extras {
            let (name, value) = raw
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("--extra expects name=value, got {:?}", raw))?;
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            params.extra.push((name.to_string(), value));
        }
    }
    Ok(params)
}
