pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod services;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches};

pub use domain::endpoint::{
    Endpoint, EndpointParser, EndpointPart, EndpointResolveTree, ResolveEndpoint, ResolveLeaf,
    ResolveQueryParam, ResolveUrlPart,
};
pub use domain::request::UrlRequest;
pub use error::{EndpointError, RequestError};
pub use services::registry::{MethodRegistry, MethodRoute, RouteMatch};

pub fn build_cli() -> clap::Command {
    let raw = Arg::new("raw")
        .long("raw")
        .action(ArgAction::SetTrue)
        .help("Pass values through without percent-encoding");

    clap::Command::new("krosstalk-endpoint")
        .about("Fill, resolve and inspect endpoint templates")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG")
                .global(true)
                .help("Path to a YAML file declaring methods"),
        )
        .subcommand(
            clap::Command::new("fill")
                .about("Render the request target for a method")
                .arg(Arg::new("method").required(true).value_name("METHOD"))
                .arg(
                    Arg::new("args")
                        .num_args(0..)
                        .value_name("NAME=VALUE")
                        .help("Argument values; arguments not given are null"),
                )
                .arg(raw.clone()),
        )
        .subcommand(
            clap::Command::new("resolve")
                .about("Match a request target and print the recovered arguments as JSON")
                .arg(Arg::new("target").required(true).value_name("TARGET"))
                .arg(raw),
        )
        .subcommand(
            clap::Command::new("shapes")
                .about("List every concrete shape of a method's endpoint")
                .arg(Arg::new("method").required(true).value_name("METHOD")),
        )
}

/// Run parsed CLI arguments, returning what should be printed
pub fn execute(matches: &ArgMatches) -> Result<String> {
    let (name, sub) = matches.subcommand().context("No subcommand given")?;
    let config_path = sub
        .get_one::<String>("config")
        .or_else(|| matches.get_one::<String>("config"))
        .map(String::as_str);
    let registry = config::methods::load_registry(config_path)?;

    match name {
        "fill" => {
            let method = required(sub, "method")?;
            let args: Vec<String> = sub
                .get_many::<String>("args")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            handlers::fill::fill(&registry, method, &args, sub.get_flag("raw"))
        }
        "resolve" => {
            let target = required(sub, "target")?;
            match handlers::resolve::resolve(&registry, target, sub.get_flag("raw"))? {
                Some(output) => Ok(serde_json::to_string_pretty(&output)?),
                None => bail!("No method matches '{}'", target),
            }
        }
        "shapes" => {
            let method = required(sub, "method")?;
            Ok(handlers::shapes::shapes(&registry, method)?.join("\n"))
        }
        other => bail!("Unknown subcommand '{}'", other),
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("Missing <{}>", id))
}

pub fn run() -> Result<()> {
    let matches = build_cli().get_matches();
    let output = execute(&matches)?;
    println!("{}", output);
    Ok(())
}
