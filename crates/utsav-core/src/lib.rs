pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod festival;
pub mod filter;
pub mod region;
pub mod render;
pub mod resolve;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::festival::Region;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting utsav CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rcfile.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let now = chrono::Utc::now();
  let today = match cli.today {
    | Some(expr) => {
      datetime::parse_today_expr(
        &expr, now
      )
      .context(
        "failed to resolve --today"
      )?
    }
    | None => {
      datetime::to_project_date(now)
    }
  };

  let location =
    config::resolve_location(
      &cfg,
      cli.location.as_deref()
    );
  let region = match &location {
    | Some(place) => {
      region::map_location_to_region(
        place
      )
    }
    | None => Region::all_india()
  };

  info!(
    %today,
    location = location.as_deref().unwrap_or("-"),
    region = %region,
    "resolved reference date and region"
  );

  let extra =
    config::resolve_extra_calendar(
      &cfg,
      cli.calendar.as_deref()
    );
  let cal =
    calendar::FestivalCalendar::load(
      extra.as_deref()
    )
    .context(
      "failed to load festival \
       calendar"
    )?;

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cal, &cfg, cli.rest
  )?;

  commands::dispatch(
    &cal,
    &cfg,
    &mut renderer,
    inv,
    today,
    &region
  )?;

  info!("done");
  Ok(())
}
