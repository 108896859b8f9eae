use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, instrument};

use crate::calendar::{FestivalCalendar, SortKey};
use crate::cli::Invocation;
use crate::config::Config;
use crate::festival::{Region, ResolvedFestival, slug};
use crate::filter::Filter;
use crate::render::Renderer;
use crate::resolve;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "list",
        "upcoming",
        "all",
        "info",
        "export",
        "regions",
        "categories",
        "show-config",
        "_commands",
        "_show",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(cal, cfg, renderer, inv))]
pub fn dispatch(
    cal: &FestivalCalendar,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
    today: NaiveDate,
    region: &Region,
) -> anyhow::Result<()> {
    let command = inv.command.as_str();

    debug!(
        command,
        filter = ?inv.filter_terms,
        args = ?inv.command_args,
        %today,
        "dispatching command"
    );

    match command {
        "list" => cmd_list(cal, cfg, renderer, &inv.filter_terms, today, region),
        "upcoming" => cmd_upcoming(
            cal,
            cfg,
            renderer,
            &inv.filter_terms,
            &inv.command_args,
            today,
            region,
        ),
        "all" => cmd_all(
            cal,
            renderer,
            &inv.filter_terms,
            &inv.command_args,
            today,
            region,
        ),
        "info" => cmd_info(cal, renderer, &inv.filter_terms, &inv.command_args, today),
        "export" => cmd_export(cal, &inv.filter_terms, today, region),
        "regions" => cmd_regions(cal),
        "categories" => cmd_categories(cal),
        "show-config" | "_show" => cmd_show(cfg),
        "_commands" => cmd_commands(),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(cal, cfg, renderer, filter_terms))]
fn cmd_list(
    cal: &FestivalCalendar,
    cfg: &Config,
    renderer: &mut Renderer,
    filter_terms: &[String],
    today: NaiveDate,
    region: &Region,
) -> anyhow::Result<()> {
    info!("command list");

    let window = cfg
        .get_i64("festival.window")
        .unwrap_or(resolve::FESTIVAL_WINDOW_DAYS);
    let filter = Filter::parse(filter_terms)?;

    let resolved = cal.resolve_for_location(region, today);
    let rows: Vec<ResolvedFestival> = resolve::rank_festivals_within(&resolved, window)
        .into_iter()
        .filter(|row| filter.matches(row))
        .collect();

    if rows.is_empty() {
        println!("No festivals inside the {window}-day shopping window.");
        return Ok(());
    }

    renderer.print_festival_table(&rows)?;
    Ok(())
}

#[instrument(skip(cal, cfg, renderer, filter_terms, args))]
fn cmd_upcoming(
    cal: &FestivalCalendar,
    cfg: &Config,
    renderer: &mut Renderer,
    filter_terms: &[String],
    args: &[String],
    today: NaiveDate,
    region: &Region,
) -> anyhow::Result<()> {
    info!("command upcoming");

    let days_ahead = match args.first() {
        Some(raw) => raw
            .parse::<i64>()
            .with_context(|| format!("invalid days value: {raw}"))?,
        None => cfg.get_i64("upcoming.days").unwrap_or(90),
    };

    let filter = Filter::parse(filter_terms)?;
    let rows: Vec<ResolvedFestival> = cal
        .upcoming(region, today, days_ahead)
        .into_iter()
        .filter(|row| filter.matches(row))
        .collect();

    if rows.is_empty() {
        println!("No festivals in the next {days_ahead} days.");
        return Ok(());
    }

    renderer.print_festival_table(&rows)?;
    Ok(())
}

#[instrument(skip(cal, renderer, filter_terms, args))]
fn cmd_all(
    cal: &FestivalCalendar,
    renderer: &mut Renderer,
    filter_terms: &[String],
    args: &[String],
    today: NaiveDate,
    region: &Region,
) -> anyhow::Result<()> {
    info!("command all");

    let sort = match args.first() {
        Some(raw) => raw.parse::<SortKey>()?,
        None => SortKey::default(),
    };

    let filter = Filter::parse(filter_terms)?;
    let rows: Vec<ResolvedFestival> = cal
        .all_festivals(region, today, sort)
        .into_iter()
        .filter(|row| filter.matches(row))
        .collect();

    if rows.is_empty() {
        println!("No festivals match.");
        return Ok(());
    }

    renderer.print_festival_table(&rows)?;
    Ok(())
}

#[instrument(skip(cal, renderer, filter_terms, args))]
fn cmd_info(
    cal: &FestivalCalendar,
    renderer: &mut Renderer,
    filter_terms: &[String],
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command info");

    let raw = args
        .first()
        .or_else(|| filter_terms.first())
        .ok_or_else(|| anyhow!("info requires a festival key"))?;
    let key = slug(raw);

    let entry = cal
        .get(&key)
        .ok_or_else(|| anyhow!("unknown festival: {key}"))?;
    let festival = cal
        .festival_for_year(&key, today.year())
        .ok_or_else(|| anyhow!("unknown festival: {key}"))?;

    let row = resolve::resolve_festival(festival, today);
    renderer.print_festival_info(entry, &row)?;
    Ok(())
}

#[instrument(skip(cal, filter_terms))]
fn cmd_export(
    cal: &FestivalCalendar,
    filter_terms: &[String],
    today: NaiveDate,
    region: &Region,
) -> anyhow::Result<()> {
    info!("command export");

    let filter = Filter::parse(filter_terms)?;
    let rows: Vec<ResolvedFestival> = cal
        .all_festivals(region, today, SortKey::default())
        .into_iter()
        .filter(|row| filter.matches(row))
        .collect();

    let out = serde_json::to_string(&rows)?;
    println!("{out}");
    Ok(())
}

#[instrument(skip(cal))]
fn cmd_regions(cal: &FestivalCalendar) -> anyhow::Result<()> {
    for region in cal.regions() {
        println!("{region}");
    }
    Ok(())
}

#[instrument(skip(cal))]
fn cmd_categories(cal: &FestivalCalendar) -> anyhow::Result<()> {
    for category in cal.categories() {
        println!("{category}");
    }
    Ok(())
}

fn cmd_commands() -> anyhow::Result<()> {
    for command in known_command_names() {
        println!("{command}");
    }
    Ok(())
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    for (k, v) in cfg.iter() {
        println!("{k}={v}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "Implemented commands: list, upcoming, all, info, export, regions, categories, show-config, help, version"
    );
    Ok(())
}
