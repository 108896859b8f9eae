use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::calendar::CalendarEntry;
use crate::config::Config;
use crate::festival::{ResolvedFestival, UrgencyLevel};
use crate::resolve::DaysUntil;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, rows))]
    pub fn print_festival_table(&mut self, rows: &[ResolvedFestival]) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_festival_table(out, rows)
    }

    fn write_festival_table<W: Write>(
        &self,
        writer: W,
        rows: &[ResolvedFestival],
    ) -> anyhow::Result<()> {
        let headers = vec![
            "Days".to_string(),
            "Date".to_string(),
            "Festival".to_string(),
            "Where".to_string(),
            "Category".to_string(),
            "Shop window".to_string(),
        ];

        let mut table = Vec::with_capacity(rows.len());

        for row in rows {
            let days = match row.days_until {
                DaysUntil::Known(count) => count.to_string(),
                DaysUntil::Undetermined => "Date TBD".to_string(),
            };

            let days = match row.urgency_level {
                UrgencyLevel::Critical => self.paint(&days, "31"),
                UrgencyLevel::Urgent => self.paint(&days, "33"),
                UrgencyLevel::None => days,
            };

            let date = if row.festival.date.is_empty() {
                "Date TBD".to_string()
            } else {
                row.festival.date.clone()
            };

            let scope = if row.festival.is_national() {
                "National".to_string()
            } else {
                row.festival
                    .regions
                    .iter()
                    .map(|region| region.as_str().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            table.push(vec![
                days,
                date,
                row.festival.name.clone(),
                scope,
                row.festival.category.clone(),
                row.festival.shopping_period.to_string(),
            ]);
        }

        write_table(writer, headers, table)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, entry, row))]
    pub fn print_festival_info(
        &mut self,
        entry: &CalendarEntry,
        row: &ResolvedFestival,
    ) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_festival_info(out, entry, row)
    }

    fn write_festival_info<W: Write>(
        &self,
        mut out: W,
        entry: &CalendarEntry,
        row: &ResolvedFestival,
    ) -> anyhow::Result<()> {
        let days = match row.days_until {
            DaysUntil::Known(count) => count.to_string(),
            DaysUntil::Undetermined => "Date TBD".to_string(),
        };
        let date = if row.festival.date.is_empty() {
            "Date TBD".to_string()
        } else {
            row.festival.date.clone()
        };
        let scope = if row.festival.is_national() {
            "National"
        } else {
            "Regional"
        };
        let regions = row
            .festival
            .regions
            .iter()
            .map(|region| region.as_str().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        writeln!(out, "key       {}", row.festival.key)?;
        writeln!(out, "name      {}", row.festival.name)?;
        writeln!(out, "category  {}", row.festival.category)?;
        writeln!(out, "scope     {scope}")?;
        writeln!(out, "regions   {regions}")?;
        writeln!(out, "date      {date}")?;
        writeln!(out, "days      {days}")?;
        writeln!(out, "urgency   {}", row.urgency_level)?;
        writeln!(out, "duration  {}", row.festival.duration)?;
        writeln!(out, "shopping  {}", row.festival.shopping_period)?;
        writeln!(out, "desc      {}", row.festival.description)?;
        writeln!(
            out,
            "keywords  {}",
            row.festival.trending_keywords.join(", ")
        )?;

        for (year, date) in &entry.dates {
            writeln!(out, "date.{year} {date}")?;
        }

        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use super::Renderer;
    use crate::calendar::CalendarEntry;
    use crate::festival::{Festival, Region};
    use crate::resolve;

    #[test]
    fn undetermined_rows_render_date_tbd() {
        let renderer = Renderer { color: false };
        let festival = Festival {
            key: "durga_puja".to_string(),
            name: "Durga Puja".to_string(),
            date: String::new(),
            regions: vec![Region::new("west_bengal")],
            is_regional: true,
            duration: 5,
            category: "religious".to_string(),
            shopping_period: 20,
            description: String::new(),
            trending_keywords: vec![],
        };
        let today = NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date");
        let row = resolve::resolve_festival(festival, today);

        let mut table = Vec::new();
        renderer
            .write_festival_table(&mut table, &[row.clone()])
            .expect("render table");
        let table = String::from_utf8(table).expect("utf8 table");
        assert!(table.contains("Date TBD"));

        let entry = CalendarEntry {
            name: "Durga Puja".to_string(),
            dates: BTreeMap::new(),
            regions: vec![Region::new("west_bengal")],
            duration: 5,
            category: "religious".to_string(),
            shopping_period: 20,
            description: String::new(),
            trending_keywords: vec![],
        };
        let mut info = Vec::new();
        renderer
            .write_festival_info(&mut info, &entry, &row)
            .expect("render info");
        let info = String::from_utf8(info).expect("utf8 info");
        assert!(info.contains("date      Date TBD"));
        assert!(info.contains("days      Date TBD"));
    }
}
