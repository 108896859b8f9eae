use anyhow::Context;
use tracing::trace;

use crate::festival::{
  Region,
  ResolvedFestival,
  UrgencyLevel,
  slug
};
use crate::resolve::DaysUntil;

#[derive(Debug, Clone)]
pub enum Pred {
  CategoryEq(String),
  RegionHas(Region),
  FlagInclude(FestivalFlag),
  FlagExclude(FestivalFlag),
  UrgencyEq(UrgencyLevel),
  Within(i64),
  TextContains(String)
}

#[derive(Debug, Clone, Copy)]
pub enum FestivalFlag {
  Regional,
  National
}

#[derive(Debug, Clone)]
enum Expr {
  True,
  Pred(Pred),
  And(Vec<Expr>),
  Or(Vec<Expr>)
}

#[derive(Debug, Clone)]
pub struct Filter {
  expr: Expr
}

impl Default for Filter {
  fn default() -> Self {
    Self {
      expr: Expr::True
    }
  }
}

impl Filter {
  #[tracing::instrument(skip(terms))]
  pub fn parse(
    terms: &[String]
  ) -> anyhow::Result<Self> {
    if terms.is_empty() {
      return Ok(Self::default());
    }

    let tokens = lex_terms(terms);
    let mut parser =
      Parser::new(tokens);
    let expr = parser.parse_expr()?;
    parser.ensure_end()?;

    Ok(Self {
      expr
    })
  }

  #[tracing::instrument(skip(
    self, row
  ))]
  pub fn matches(
    &self,
    row: &ResolvedFestival
  ) -> bool {
    eval_expr(&self.expr, row)
  }
}

struct Parser {
  tokens: Vec<String>,
  pos:    usize
}

impl Parser {
  fn new(tokens: Vec<String>) -> Self {
    Self {
      tokens,
      pos: 0
    }
  }

  fn parse_expr(
    &mut self
  ) -> anyhow::Result<Expr> {
    self.parse_or()
  }

  fn parse_or(
    &mut self
  ) -> anyhow::Result<Expr> {
    let mut nodes =
      vec![self.parse_and()?];

    while self.match_any(&["or", "||"])
    {
      nodes.push(self.parse_and()?);
    }

    if nodes.len() == 1 {
      Ok(nodes.remove(0))
    } else {
      Ok(Expr::Or(nodes))
    }
  }

  fn parse_and(
    &mut self
  ) -> anyhow::Result<Expr> {
    let mut nodes =
      vec![self.parse_primary()?];

    loop {
      if self.match_any(&["and", "&&"])
      {
        nodes
          .push(self.parse_primary()?);
        continue;
      }

      if self
        .peek_is_implicit_and_boundary()
      {
        nodes
          .push(self.parse_primary()?);
        continue;
      }

      break;
    }

    if nodes.len() == 1 {
      Ok(nodes.remove(0))
    } else {
      Ok(Expr::And(nodes))
    }
  }

  fn parse_primary(
    &mut self
  ) -> anyhow::Result<Expr> {
    if self.match_token("(") {
      let inner = self.parse_expr()?;
      self.expect_token(")")?;
      return Ok(inner);
    }

    let token = self
      .next_token()
      .ok_or_else(|| {
        anyhow::anyhow!(
          "unexpected end of filter \
           expression"
        )
      })?;

    if token == ")" {
      return Err(anyhow::anyhow!(
        "unexpected ')' in filter \
         expression"
      ));
    }

    let pred = parse_atom(&token)?;
    Ok(Expr::Pred(pred))
  }

  fn ensure_end(
    &self
  ) -> anyhow::Result<()> {
    if self.pos < self.tokens.len() {
      Err(anyhow::anyhow!(
        "unexpected token in filter \
         expression: {}",
        self.tokens[self.pos]
      ))
    } else {
      Ok(())
    }
  }

  fn match_token(
    &mut self,
    expected: &str
  ) -> bool {
    let Some(tok) =
      self.tokens.get(self.pos)
    else {
      return false;
    };
    if tok
      .eq_ignore_ascii_case(expected)
    {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn match_any(
    &mut self,
    options: &[&str]
  ) -> bool {
    options
      .iter()
      .any(|opt| self.match_token(opt))
  }

  fn expect_token(
    &mut self,
    expected: &str
  ) -> anyhow::Result<()> {
    if self.match_token(expected) {
      Ok(())
    } else {
      Err(anyhow::anyhow!(
        "expected '{expected}' in \
         filter expression"
      ))
    }
  }

  fn next_token(
    &mut self
  ) -> Option<String> {
    let out = self
      .tokens
      .get(self.pos)
      .cloned();
    if out.is_some() {
      self.pos += 1;
    }
    out
  }

  fn peek_is_implicit_and_boundary(
    &self
  ) -> bool {
    let Some(tok) =
      self.tokens.get(self.pos)
    else {
      return false;
    };

    if tok.eq_ignore_ascii_case("and")
      || tok.eq_ignore_ascii_case("&&")
    {
      return false;
    }

    !tok.eq_ignore_ascii_case("or")
      && !tok.eq_ignore_ascii_case("||")
      && !tok.eq_ignore_ascii_case(")")
  }
}

fn lex_terms(
  terms: &[String]
) -> Vec<String> {
  let mut out = Vec::new();

  for term in terms {
    let mut current = String::new();
    for ch in term.chars() {
      if ch == '(' || ch == ')' {
        if !current.is_empty() {
          out.push(current.clone());
          current.clear();
        }
        out.push(ch.to_string());
      } else {
        current.push(ch);
      }
    }

    if !current.is_empty() {
      out.push(current);
    }
  }

  out
}

fn parse_atom(
  term: &str
) -> anyhow::Result<Pred> {
  if let Some(tag) =
    term.strip_prefix('+')
  {
    let flag = parse_flag(tag)
      .ok_or_else(|| {
        anyhow::anyhow!(
          "unknown filter flag: +{tag}"
        )
      })?;
    return Ok(Pred::FlagInclude(flag));
  }
  if let Some(tag) =
    term.strip_prefix('-')
  {
    let flag = parse_flag(tag)
      .ok_or_else(|| {
        anyhow::anyhow!(
          "unknown filter flag: -{tag}"
        )
      })?;
    return Ok(Pred::FlagExclude(flag));
  }

  if let Some(category) =
    term.strip_prefix("category:")
  {
    return Ok(Pred::CategoryEq(
      slug(category)
    ));
  }

  if let Some(region) =
    term.strip_prefix("region:")
  {
    return Ok(Pred::RegionHas(
      Region::new(region)
    ));
  }

  if let Some(level) =
    term.strip_prefix("urgency:")
  {
    return Ok(
      match level
        .to_ascii_lowercase()
        .as_str()
      {
        | "none" => Pred::UrgencyEq(
          UrgencyLevel::None
        ),
        | "urgent" => Pred::UrgencyEq(
          UrgencyLevel::Urgent
        ),
        | "critical" => {
          Pred::UrgencyEq(
            UrgencyLevel::Critical
          )
        }
        | _ => Pred::TextContains(
          term.to_string()
        )
      }
    );
  }

  if let Some(value) =
    term.strip_prefix("within:")
  {
    let days: i64 = value
      .parse()
      .with_context(|| {
        format!(
          "invalid within: value: \
           {value}"
        )
      })?;
    return Ok(Pred::Within(days));
  }

  Ok(Pred::TextContains(
    term.to_string()
  ))
}

fn parse_flag(
  tag: &str
) -> Option<FestivalFlag> {
  match tag
    .to_ascii_lowercase()
    .as_str()
  {
    | "regional" => {
      Some(FestivalFlag::Regional)
    }
    | "national" => {
      Some(FestivalFlag::National)
    }
    | _ => None
  }
}

fn eval_expr(
  expr: &Expr,
  row: &ResolvedFestival
) -> bool {
  match expr {
    | Expr::True => true,
    | Expr::Pred(pred) => {
      eval_pred(pred, row)
    }
    | Expr::And(nodes) => {
      nodes.iter().all(|node| {
        eval_expr(node, row)
      })
    }
    | Expr::Or(nodes) => {
      nodes.iter().any(|node| {
        eval_expr(node, row)
      })
    }
  }
}

fn eval_pred(
  pred: &Pred,
  row: &ResolvedFestival
) -> bool {
  let ok = match pred {
    | Pred::CategoryEq(category) => {
      slug(&row.festival.category)
        == *category
    }
    | Pred::RegionHas(region) => {
      row
        .festival
        .has_region(region)
    }
    | Pred::FlagInclude(flag) => {
      eval_flag(*flag, row)
    }
    | Pred::FlagExclude(flag) => {
      !eval_flag(*flag, row)
    }
    | Pred::UrgencyEq(level) => {
      row.urgency_level == *level
    }
    | Pred::Within(days) => {
      matches!(
        row.days_until,
        DaysUntil::Known(count)
          if count <= *days
      )
    }
    | Pred::TextContains(text) => {
      let needle =
        text.to_ascii_lowercase();
      row
        .festival
        .name
        .to_ascii_lowercase()
        .contains(&needle)
        || row
          .festival
          .description
          .to_ascii_lowercase()
          .contains(&needle)
    }
  };

  trace!(pred = ?pred, key = %row.festival.key, ok, "filter predicate evaluation");
  ok
}

fn eval_flag(
  flag: FestivalFlag,
  row: &ResolvedFestival
) -> bool {
  match flag {
    | FestivalFlag::Regional => {
      row.festival.is_regional
    }
    | FestivalFlag::National => {
      row.festival.is_national()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::Filter;
  use crate::festival::{
    Festival,
    Region,
    ResolvedFestival
  };
  use crate::resolve::{
    DaysUntil,
    classify_urgency
  };

  fn row(
    key: &str,
    category: &str,
    regions: &[&str],
    days: DaysUntil
  ) -> ResolvedFestival {
    let regions: Vec<Region> = regions
      .iter()
      .map(|r| Region::new(r))
      .collect();
    let is_regional = !regions
      .iter()
      .any(Region::is_all_india);
    ResolvedFestival {
      festival:      Festival {
        key:  key.to_string(),
        name: key.to_string(),
        date: String::new(),
        regions,
        is_regional,
        duration: 1,
        category: category
          .to_string(),
        shopping_period: 15,
        description: String::new(),
        trending_keywords: vec![]
      },
      days_until:    days,
      urgency_level: classify_urgency(
        days
      )
    }
  }

  fn terms(
    parts: &[&str]
  ) -> Vec<String> {
    parts
      .iter()
      .map(|p| p.to_string())
      .collect()
  }

  #[test]
  fn boolean_precedence_and_parentheses()
   {
    let religious = row(
      "durga_puja",
      "religious",
      &["west_bengal"],
      DaysUntil::Known(20)
    );
    let cultural = row(
      "navratri",
      "cultural",
      &["gujarat"],
      DaysUntil::Known(20)
    );
    let national = row(
      "diwali",
      "religious",
      &["all_india"],
      DaysUntil::Known(20)
    );

    let filter = Filter::parse(
      &terms(&[
        "(",
        "category:religious",
        "or",
        "category:cultural",
        ")",
        "and",
        "+regional"
      ])
    )
    .unwrap();

    assert!(
      filter.matches(&religious)
    );
    assert!(filter.matches(&cultural));
    assert!(
      !filter.matches(&national)
    );
  }

  #[test]
  fn regional_and_national_flags() {
    let regional = row(
      "onam",
      "harvest",
      &["kerala"],
      DaysUntil::Known(10)
    );
    let national = row(
      "holi",
      "religious",
      &["all_india"],
      DaysUntil::Known(10)
    );

    let only_regional =
      Filter::parse(&terms(&[
        "+regional"
      ]))
      .unwrap();
    let no_national =
      Filter::parse(&terms(&[
        "-national"
      ]))
      .unwrap();

    assert!(
      only_regional
        .matches(&regional)
    );
    assert!(
      !only_regional
        .matches(&national)
    );
    assert!(
      no_national.matches(&regional)
    );
    assert!(
      !no_national.matches(&national)
    );
  }

  #[test]
  fn unknown_flag_is_rejected() {
    assert!(
      Filter::parse(&terms(&[
        "+overdue"
      ]))
      .is_err()
    );
  }

  #[test]
  fn urgency_and_within() {
    let soon = row(
      "teachers_day",
      "national",
      &["all_india"],
      DaysUntil::Known(4)
    );
    let later = row(
      "diwali",
      "religious",
      &["all_india"],
      DaysUntil::Known(52)
    );
    let unknown = row(
      "mystery",
      "cultural",
      &["goa"],
      DaysUntil::Undetermined
    );

    let critical =
      Filter::parse(&terms(&[
        "urgency:critical"
      ]))
      .unwrap();
    assert!(critical.matches(&soon));
    assert!(!critical.matches(&later));

    let within =
      Filter::parse(&terms(&[
        "within:30"
      ]))
      .unwrap();
    assert!(within.matches(&soon));
    assert!(!within.matches(&later));
    assert!(!within.matches(&unknown));
  }

  #[test]
  fn bare_word_searches_text() {
    let mut durga = row(
      "durga_puja",
      "religious",
      &["west_bengal"],
      DaysUntil::Known(20)
    );
    durga.festival.name =
      "Durga Puja".to_string();
    durga.festival.description =
      "Worship of Goddess Durga"
        .to_string();

    let filter =
      Filter::parse(&terms(&[
        "goddess"
      ]))
      .unwrap();
    assert!(filter.matches(&durga));

    let miss =
      Filter::parse(&terms(&[
        "garba"
      ]))
      .unwrap();
    assert!(!miss.matches(&durga));
  }
}
