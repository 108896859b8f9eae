use std::ffi::OsString;
use std::fs;

use chrono::NaiveDate;
use tempfile::tempdir;

use utsav_core::calendar::FestivalCalendar;
use utsav_core::cli::Invocation;
use utsav_core::config::Config;
use utsav_core::filter::Filter;
use utsav_core::region::map_location_to_region;
use utsav_core::resolve::{self, DaysUntil};

fn sept_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date")
}

#[test]
fn location_flow_ranks_regional_first() {
    let cal = FestivalCalendar::load(None).expect("builtin calendar");
    let region = map_location_to_region("Kolkata");
    assert_eq!(region.as_str(), "west_bengal");

    let resolved = cal.resolve_for_location(&region, sept_first());
    let ranked = resolve::rank_festivals(&resolved);

    assert!(!ranked.is_empty());
    assert_eq!(ranked[0].festival.key, "durga_puja");
    assert!(ranked[0].festival.is_regional);

    let daughters = ranked
        .iter()
        .position(|row| row.festival.key == "daughters_day")
        .expect("daughters_day ranked");
    assert!(daughters > 0);

    assert!(ranked.iter().skip(1).all(|row| !row.festival.is_regional));
    assert!(ranked
        .iter()
        .all(|row| matches!(row.days_until, DaysUntil::Known(d) if (0..=210).contains(&d))));

    let national_days: Vec<i64> = ranked
        .iter()
        .skip(1)
        .filter_map(|row| row.days_until.known())
        .collect();
    let mut sorted = national_days.clone();
    sorted.sort_unstable();
    assert_eq!(national_days, sorted);
}

#[test]
fn urgency_filter_narrows_ranked_rows() {
    let cal = FestivalCalendar::load(None).expect("builtin calendar");
    let region = map_location_to_region("kolkata");

    let resolved = cal.resolve_for_location(&region, sept_first());
    let ranked = resolve::rank_festivals(&resolved);

    let filter = Filter::parse(&["urgency:critical".to_string()]).expect("parse filter");
    let critical: Vec<_> = ranked.iter().filter(|row| filter.matches(row)).collect();

    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].festival.key, "teachers_day");
}

#[test]
fn user_calendar_extends_builtin_and_exports_json() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("shop.json");
    fs::write(
        &path,
        r#"{
            "shop_anniversary": {
                "name": "Shop Anniversary Sale",
                "dates": { "2025": "2025-09-10" },
                "regions": ["west_bengal"],
                "category": "promotion"
            }
        }"#,
    )
    .expect("write calendar");

    let cal = FestivalCalendar::load(Some(&path)).expect("load merged calendar");
    let region = map_location_to_region("Kolkata");

    let resolved = cal.resolve_for_location(&region, sept_first());
    let ranked = resolve::rank_festivals(&resolved);

    assert_eq!(ranked[0].festival.key, "shop_anniversary");
    assert_eq!(ranked[0].days_until, DaysUntil::Known(9));

    let payload = serde_json::to_string(&ranked[0]).expect("serialize row");
    assert!(payload.contains("\"days_until\":9"));
    assert!(payload.contains("\"name\":\"Shop Anniversary Sale\""));

    let missing_year = cal
        .festival_for_year("durga_puja", 2031)
        .expect("entry exists");
    let row = resolve::resolve_festival(missing_year, sept_first());
    let payload = serde_json::to_string(&row).expect("serialize row");
    assert!(payload.contains("\"days_until\":\"N/A\""));
}

#[test]
fn rc_file_drives_default_command_and_location() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("utsavrc");
    fs::write(
        &rc,
        "default.command=upcoming\nlocation.default=Jaipur\nupcoming.days=45\n",
    )
    .expect("write rc");

    let cal = FestivalCalendar::load(None).expect("builtin calendar");
    let mut cfg = Config::load(Some(&rc)).expect("load config");
    assert_eq!(cfg.get("default.command").as_deref(), Some("upcoming"));
    assert_eq!(cfg.get_i64("upcoming.days"), Some(45));

    let inv = Invocation::parse(&cal, &cfg, Vec::new()).expect("parse invocation");
    assert_eq!(inv.command, "upcoming");

    let location = utsav_core::config::resolve_location(&cfg, None).expect("configured location");
    assert_eq!(map_location_to_region(&location).as_str(), "rajasthan");

    cfg.apply_overrides([("rc.location.default".to_string(), "Chennai".to_string())]);
    let location = utsav_core::config::resolve_location(&cfg, None).expect("override location");
    assert_eq!(map_location_to_region(&location).as_str(), "tamil_nadu");

    let inv = Invocation::parse(
        &cal,
        &cfg,
        vec![OsString::from("+regional"), OsString::from("li")],
    )
    .expect("parse invocation");
    assert_eq!(inv.command, "list");
    assert_eq!(inv.filter_terms, vec!["+regional".to_string()]);
}

#[test]
fn bare_word_filters_the_default_command() {
    let cal = FestivalCalendar::load(None).expect("builtin calendar");
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("utsavrc");
    fs::write(&rc, "").expect("write rc");
    let cfg = Config::load(Some(&rc)).expect("load config");

    let inv =
        Invocation::parse(&cal, &cfg, vec![OsString::from("religious")]).expect("parse invocation");
    assert_eq!(inv.command, "list");
    assert_eq!(inv.filter_terms, vec!["religious".to_string()]);
    assert!(inv.command_args.is_empty());

    let inv =
        Invocation::parse(&cal, &cfg, vec![OsString::from("Diwali")]).expect("parse invocation");
    assert_eq!(inv.command, "info");
    assert_eq!(inv.filter_terms, vec!["Diwali".to_string()]);

    let inv = Invocation::parse(
        &cal,
        &cfg,
        vec![OsString::from("promotion"), OsString::from("sale")],
    )
    .expect("parse invocation");
    assert_eq!(inv.command, "list");
    assert_eq!(
        inv.filter_terms,
        vec!["promotion".to_string(), "sale".to_string()]
    );
}
