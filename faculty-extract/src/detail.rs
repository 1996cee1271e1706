use crate::{ExtractError, collapse_ws, compile, element_text};
use faculty_common::{Absence, DetailRecord, DetailSelectors, Field};
use scraper::{Html, Selector};

/// Fields readable from a detail page before any tab is activated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailSnapshot {
    pub email: Field<String>,
    pub location: Field<String>,
    pub homepage: Field<String>,
    pub overview: Field<String>,
    pub degrees: Field<Vec<String>>,
    pub graduate_year: Field<u32>,
    pub tab_count: usize,
}

impl DetailSnapshot {
    /// Combine with the research-interest panel into a full record.
    pub fn into_record(self, research_interests: Field<Vec<String>>) -> DetailRecord {
        DetailRecord {
            email: self.email,
            location: self.location,
            homepage: self.homepage,
            overview: self.overview,
            research_interests,
            degrees: self.degrees,
            graduate_year: self.graduate_year,
        }
    }
}

/// Compiled selectors for a detail page.
#[derive(Debug, Clone)]
pub struct DetailParser {
    raw: DetailSelectors,
    icon_text: Selector,
    degree_line: Selector,
    overview: Selector,
    tab: Selector,
    interest_item: Selector,
}

impl DetailParser {
    pub fn new(selectors: &DetailSelectors) -> Result<Self, ExtractError> {
        // Templates are validated with a concrete index up front.
        compile(&selectors.ready)?;
        compile(&selectors.tab_control_for(0))?;
        compile(&selectors.tab_panel_for(0))?;
        Ok(Self {
            icon_text: compile(&selectors.icon_text)?,
            degree_line: compile(&selectors.degree_line)?,
            overview: compile(&selectors.overview)?,
            tab: compile(&selectors.tab)?,
            interest_item: compile(&selectors.interest_item)?,
            raw: selectors.clone(),
        })
    }

    pub fn selectors(&self) -> &DetailSelectors {
        &self.raw
    }

    /// Read contact, degrees, overview and the tab count.
    pub fn parse(&self, html: &str) -> DetailSnapshot {
        let doc = Html::parse_document(html);
        let (email, location, homepage) = self.contact(&doc);
        let degrees = self.degrees(&doc);
        let graduate_year = match &degrees {
            Field::Present(lines) => graduate_year_from_degrees(lines),
            Field::Absent(absence) => Field::Absent(absence.clone()),
        };

        DetailSnapshot {
            email,
            location,
            homepage,
            overview: self.overview(&doc),
            degrees,
            graduate_year,
            tab_count: doc.select(&self.tab).count(),
        }
    }

    /// Email, location and homepage from the contact card.
    pub fn parse_contact(&self, html: &str) -> (Field<String>, Field<String>, Field<String>) {
        self.contact(&Html::parse_document(html))
    }

    pub fn parse_degrees(&self, html: &str) -> Field<Vec<String>> {
        self.degrees(&Html::parse_document(html))
    }

    pub fn parse_overview(&self, html: &str) -> Field<String> {
        self.overview(&Html::parse_document(html))
    }

    /// Number of tabs in the detail page's tab strip.
    pub fn count_tabs(&self, html: &str) -> usize {
        Html::parse_document(html).select(&self.tab).count()
    }

    /// Research-interest items of the panel belonging to tab `index`.
    ///
    /// When the page has no panel with that id, the last overview block that
    /// contains interest items is used instead.
    pub fn parse_research_interests(&self, html: &str, index: usize) -> Field<Vec<String>> {
        let panel_selector = self.raw.tab_panel_for(index);
        let panel = match compile(&panel_selector) {
            Ok(sel) => sel,
            Err(_) => {
                return Field::Absent(Absence::Malformed {
                    raw: panel_selector,
                });
            }
        };

        let doc = Html::parse_document(html);
        let items: Vec<String> = match doc.select(&panel).next() {
            Some(pane) => pane.select(&self.interest_item).map(element_text).collect(),
            None => doc
                .select(&self.overview)
                .filter(|block| block.select(&self.interest_item).next().is_some())
                .last()
                .map(|block| block.select(&self.interest_item).map(element_text).collect())
                .unwrap_or_default(),
        };

        let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
        if items.is_empty() {
            Field::missing(&self.raw.interest_items_for(index))
        } else {
            Field::Present(items)
        }
    }

    fn contact(&self, doc: &Html) -> (Field<String>, Field<String>, Field<String>) {
        let items: Vec<_> = doc.select(&self.icon_text).take(3).collect();
        let nth_text = |i: usize| {
            items
                .get(i)
                .map(|el| Field::text(element_text(*el)))
                .unwrap_or_else(|| Field::missing(&self.raw.icon_text))
        };

        let homepage = match items.get(2) {
            Some(el) => match el.value().attr("href") {
                Some(href) => Field::text(href.trim().to_string()),
                None => Field::missing(&format!("{}[href]", self.raw.icon_text)),
            },
            None => Field::missing(&self.raw.icon_text),
        };

        (nth_text(0), nth_text(1), homepage)
    }

    fn degrees(&self, doc: &Html) -> Field<Vec<String>> {
        let lines: Vec<String> = doc
            .select(&self.degree_line)
            .map(element_text)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            Field::missing(&self.raw.degree_line)
        } else {
            Field::Present(lines)
        }
    }

    fn overview(&self, doc: &Html) -> Field<String> {
        match doc.select(&self.overview).next() {
            Some(el) => Field::text(element_text(el)),
            None => Field::missing(&self.raw.overview),
        }
    }
}

/// Derive the graduate year from degree lines.
///
/// For each line containing a comma, the trailing comma-separated token is a
/// year only if it is made of ASCII digits and at most [`MAX_YEAR`]. The most
/// recent degree wins: the greatest parsed year is returned, whatever its
/// position, so `["PhD, X, 2010", "Postdoc, Y, 2008"]` yields 2010 in either
/// order.
pub fn graduate_year_from_degrees(lines: &[String]) -> Field<u32> {
    let mut latest: Option<u32> = None;
    let mut malformed: Option<String> = None;

    for line in lines {
        let Some((_, tail)) = line.rsplit_once(',') else {
            continue;
        };
        let token = collapse_ws(tail);
        match parse_year(&token) {
            Some(year) => latest = Some(latest.map_or(year, |best| best.max(year))),
            None => malformed = Some(token),
        }
    }

    match (latest, malformed) {
        (Some(year), _) => Field::Present(year),
        (None, Some(raw)) => Field::Absent(Absence::Malformed { raw }),
        (None, None) => Field::Absent(Absence::Blank),
    }
}

/// Largest token accepted as a calendar year.
pub const MAX_YEAR: u32 = 9999;

fn parse_year(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok().filter(|year| *year <= MAX_YEAR)
}
