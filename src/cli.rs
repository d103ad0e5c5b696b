use crate::client::{CountryClient, Licitpy};
use crate::config::Settings;
use crate::errors::{AppError, AppResult};
use crate::models::{Country, Region, Status, Tier};
use crate::parser::parse_iso_date;
use crate::utils::format_duration;
use clap::{Arg, ArgAction, ArgMatches, Command};
use futures::{pin_mut, StreamExt};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

fn country_arg() -> Arg<'static> {
    Arg::new("country")
        .short('C')
        .long("country")
        .help("Country source: 'cl' (Mercado Publico) or 'eu' (TED)")
        .default_value("cl")
        .action(ArgAction::Set)
}

/// Builds the command tree. Kept separate from [`cli`] so tests can parse
/// arguments without touching the network.
pub fn command() -> Command<'static> {
    Command::new("licitpy")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to a TOML settings file")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("tender")
                .about("Show the main fields of a tender")
                .arg(Arg::new("code").help("Tender code, e.g. 3955-54-LE24").required(true))
                .arg(country_arg()),
        )
        .subcommand(
            Command::new("search")
                .about("List tenders published on a day")
                .after_help("Example:\n  licitpy search --date 2024-10-04 --status awarded --limit 10")
                .arg(
                    Arg::new("date")
                        .short('d')
                        .long("date")
                        .help("Publication day (YYYY-MM-DD), defaults to today (UTC)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .help("Stop after this many matching tenders")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("status")
                        .short('s')
                        .long("status")
                        .help("Keep tenders in this status (e.g. PUBLISHED, Adjudicada)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("tier")
                        .short('t')
                        .long("tier")
                        .help("Keep tenders of this budget tier (e.g. LE)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("region")
                        .short('r')
                        .long("region")
                        .help("Keep tenders of this region code (e.g. RM, VIII)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("allow_weekends")
                        .long("allow-weekends")
                        .help("Accept a Saturday or Sunday as publication day")
                        .action(ArgAction::SetTrue),
                )
                .arg(country_arg()),
        )
        .subcommand(
            Command::new("purchase-order")
                .about("Show a purchase order")
                .arg(Arg::new("code").help("Purchase order code").required(true)),
        )
        .subcommand(
            Command::new("eu-bulk")
                .about("Download TED monthly bulk packages")
                .arg(
                    Arg::new("year")
                        .short('y')
                        .long("year")
                        .required(true)
                        .value_parser(clap::value_parser!(i32))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("month")
                        .short('m')
                        .long("month")
                        .help("Single month (1-12); the whole year when omitted")
                        .value_parser(clap::value_parser!(u32))
                        .action(ArgAction::Set),
                ),
        )
}

/// Parses command-line arguments and runs the selected subcommand.
pub async fn cli() -> AppResult<()> {
    let mut cmd_for_help = command();
    let matches = command().get_matches();

    let settings = match matches.get_one::<PathBuf>("config") {
        Some(path) => Settings::from_toml_file(path)?,
        None => Settings::default(),
    };
    let client = Licitpy::with_settings(settings)?;
    let started = Instant::now();

    match matches.subcommand() {
        Some(("tender", sub)) => show_tender(&country_client(&client, sub)?, sub).await?,
        Some(("search", sub)) => search(&country_client(&client, sub)?, sub).await?,
        Some(("purchase-order", sub)) => show_purchase_order(&client, sub).await?,
        Some(("eu-bulk", sub)) => eu_bulk(&client, sub).await?,
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
            return Ok(());
        }
    }

    info!(elapsed = %format_duration(started.elapsed()), "Done");
    Ok(())
}

fn country_client(client: &Licitpy, sub: &ArgMatches) -> AppResult<CountryClient> {
    let country: Country = sub
        .get_one::<String>("country")
        .map(String::as_str)
        .unwrap_or("cl")
        .parse()?;
    client.country(country)
}

fn required<'a>(sub: &'a ArgMatches, name: &str) -> AppResult<&'a str> {
    sub.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| AppError::InvalidInput(format!("Missing argument: {name}")))
}

async fn show_tender(client: &CountryClient, sub: &ArgMatches) -> AppResult<()> {
    let tender = client.get(required(sub, "code")?)?;

    println!("code:    {}", tender.code());
    println!("url:     {}", tender.url().await?);
    if client.country() == Country::CL {
        println!("title:   {}", tender.title().await?);
        println!("status:  {}", tender.status().await?);
        println!("tier:    {}", tender.tier()?.as_str());
        println!("region:  {}", tender.region().await?.display_name());
        println!("opening: {}", tender.opening_date().await?.to_rfc3339());
        println!("closing: {}", tender.closing_date().await?.to_rfc3339());
    }
    Ok(())
}

async fn search(client: &CountryClient, sub: &ArgMatches) -> AppResult<()> {
    let allow_weekends = sub.get_flag("allow_weekends");
    let mut query = client.search();

    if let Some(date) = sub.get_one::<String>("date") {
        query = query.published_on(parse_iso_date(date)?, allow_weekends)?;
    }
    if let Some(status) = sub.get_one::<String>("status") {
        query = query.with_status(status.parse::<Status>()?);
    }
    if let Some(tier) = sub.get_one::<String>("tier") {
        query = query.by_budget_tier(tier.parse::<Tier>()?);
    }
    if let Some(region) = sub.get_one::<String>("region") {
        query = query.in_region(parse_region_code(region)?);
    }
    if let Some(&limit) = sub.get_one::<usize>("limit") {
        query = query.limit(limit);
    }

    let stream = query.stream();
    pin_mut!(stream);

    let mut count = 0usize;
    while let Some(tender) = stream.next().await {
        println!("{}", tender?.code());
        count += 1;
    }

    info!(tenders = count, "Search completed");
    Ok(())
}

async fn show_purchase_order(client: &Licitpy, sub: &ArgMatches) -> AppResult<()> {
    let order = client.cl()?.purchase_order(required(sub, "code")?)?;

    println!("code:   {}", order.code());
    println!("url:    {}", order.url());
    println!("status: {}", order.status().await?);
    println!("title:  {}", order.title().await?);
    println!("issued: {}", order.issue_date().await?);
    if let Some(tender_code) = order.tender_code().await? {
        println!("tender: {tender_code}");
    }
    Ok(())
}

async fn eu_bulk(client: &Licitpy, sub: &ArgMatches) -> AppResult<()> {
    let year = *sub
        .get_one::<i32>("year")
        .ok_or_else(|| AppError::InvalidInput("Missing argument: year".into()))?;
    let eu = client.eu()?;

    let paths = match sub.get_one::<u32>("month") {
        Some(&month) => vec![eu.download_monthly(year, month).await?],
        None => eu.download_yearly(year).await?,
    };

    for path in &paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn parse_region_code(code: &str) -> AppResult<Region> {
    Region::ALL
        .into_iter()
        .find(|region| region.code().eq_ignore_ascii_case(code.trim()))
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown region code: {code}")))
}
