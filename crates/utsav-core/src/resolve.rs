use chrono::{
  Datelike,
  NaiveDate
};

use crate::festival::{
  Festival,
  ResolvedFestival,
  UrgencyLevel
};

pub const FESTIVAL_WINDOW_DAYS: i64 =
  210;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord
)]
pub enum DaysUntil {
  Known(i64),
  Undetermined
}

impl DaysUntil {
  pub fn known(self) -> Option<i64> {
    match self {
      | Self::Known(count) => {
        Some(count)
      }
      | Self::Undetermined => None
    }
  }

  pub fn is_known(self) -> bool {
    matches!(self, Self::Known(_))
  }
}

pub fn days_until(
  raw: &str,
  today: NaiveDate
) -> DaysUntil {
  let token = raw.trim();

  if token.is_empty()
    || token == "Invalid Date"
    || token == "NaN"
  {
    return DaysUntil::Undetermined;
  }

  let Some(target) =
    parse_festival_date(token)
  else {
    return DaysUntil::Undetermined;
  };

  let diff =
    (target - today).num_days();
  if diff >= 0 {
    return DaysUntil::Known(diff);
  }

  rollover_next_year(target, today)
}

fn rollover_next_year(
  target: NaiveDate,
  today: NaiveDate
) -> DaysUntil {
  let Some(next) =
    NaiveDate::from_ymd_opt(
      target.year() + 1,
      target.month(),
      target.day()
    )
  else {
    return DaysUntil::Undetermined;
  };

  let diff = (next - today).num_days();
  if diff >= 0 {
    DaysUntil::Known(diff)
  } else {
    DaysUntil::Undetermined
  }
}

pub fn parse_festival_date(
  token: &str
) -> Option<NaiveDate> {
  for fmt in
    ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"]
  {
    if let Ok(date) =
      NaiveDate::parse_from_str(
        token, fmt
      )
    {
      return Some(date);
    }
  }

  if let Ok(dt) =
    chrono::DateTime::parse_from_rfc3339(
      token
    )
  {
    return Some(dt.date_naive());
  }

  None
}

pub fn classify_urgency(
  days: DaysUntil
) -> UrgencyLevel {
  match days {
    | DaysUntil::Known(count)
      if count <= 7 =>
    {
      UrgencyLevel::Critical
    }
    | DaysUntil::Known(count)
      if count <= 30 =>
    {
      UrgencyLevel::Urgent
    }
    | DaysUntil::Known(_)
    | DaysUntil::Undetermined => {
      UrgencyLevel::None
    }
  }
}

pub fn resolve_festival(
  festival: Festival,
  today: NaiveDate
) -> ResolvedFestival {
  let days = days_until(
    &festival.date,
    today
  );
  ResolvedFestival {
    festival,
    days_until: days,
    urgency_level: classify_urgency(
      days
    )
  }
}

pub fn rank_festivals(
  festivals: &[ResolvedFestival]
) -> Vec<ResolvedFestival> {
  rank_festivals_within(
    festivals,
    FESTIVAL_WINDOW_DAYS
  )
}

pub fn rank_festivals_within(
  festivals: &[ResolvedFestival],
  window_days: i64
) -> Vec<ResolvedFestival> {
  let mut ranked: Vec<
    ResolvedFestival
  > = festivals
    .iter()
    .filter(|row| {
      matches!(
        row.days_until,
        DaysUntil::Known(count)
          if (0..=window_days)
            .contains(&count)
      )
    })
    .cloned()
    .collect();

  ranked.sort_by(|a, b| {
    b.festival
      .is_regional
      .cmp(&a.festival.is_regional)
      .then(
        a.days_until
          .cmp(&b.days_until)
      )
  });

  ranked
}

pub mod days_until_serde {
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  use super::DaysUntil;

  pub const UNDETERMINED: &str = "N/A";

  pub fn serialize<S>(
    days: &DaysUntil,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match days {
      | DaysUntil::Known(count) => {
        serializer
          .serialize_i64(*count)
      }
      | DaysUntil::Undetermined => {
        serializer
          .serialize_str(UNDETERMINED)
      }
    }
  }

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Wire {
    Count(i64),
    Text(String)
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<DaysUntil, D::Error>
  where
    D: Deserializer<'de>
  {
    match Wire::deserialize(
      deserializer
    )? {
      | Wire::Count(count) => {
        Ok(DaysUntil::Known(count))
      }
      | Wire::Text(raw)
        if raw == UNDETERMINED =>
      {
        Ok(DaysUntil::Undetermined)
      }
      | Wire::Text(raw) => {
        Err(serde::de::Error::custom(
          format!(
            "invalid days_until \
             value: {raw}"
          )
        ))
      }
    }
  }
}
