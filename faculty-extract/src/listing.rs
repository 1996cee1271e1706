use crate::{ExtractError, compile, element_text};
use faculty_common::{DirectoryRow, ListedRow, ListingSelectors, RowField, RowKey, TriggerRef};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Compiled selectors for the directory table.
#[derive(Debug, Clone)]
pub struct ListingParser {
    raw: ListingSelectors,
    row: Selector,
    columns: [(RowField, Selector); 5],
    more_button: Selector,
}

impl ListingParser {
    pub fn new(selectors: &ListingSelectors) -> Result<Self, ExtractError> {
        if let Some(next) = &selectors.next_page {
            compile(next)?;
        }
        Ok(Self {
            row: compile(&selectors.row)?,
            columns: [
                (RowField::EnglishName, compile(&selectors.english_name)?),
                (RowField::ChineseName, compile(&selectors.chinese_name)?),
                (RowField::Title, compile(&selectors.title)?),
                (RowField::Department, compile(&selectors.department)?),
                (RowField::Email, compile(&selectors.email)?),
            ],
            more_button: compile(&selectors.more_button)?,
            raw: selectors.clone(),
        })
    }

    pub fn selectors(&self) -> &ListingSelectors {
        &self.raw
    }

    /// Parse every row of the listing, in document order.
    ///
    /// A missing column yields an empty string and is listed in
    /// [`ListedRow::absent`]; the rest of the row is still read.
    pub fn parse(&self, html: &str) -> Vec<ListedRow> {
        let doc = Html::parse_document(html);
        doc.select(&self.row)
            .enumerate()
            .map(|(ordinal, row)| self.parse_row(ordinal, row))
            .collect()
    }

    /// Key of the first row, used to notice when a new page has rendered.
    pub fn first_row_key(&self, html: &str) -> Option<RowKey> {
        let doc = Html::parse_document(html);
        let row = doc.select(&self.row).next()?;
        let (_, key_selector) = &self.columns[0];
        row.select(key_selector).next().map(|el| RowKey(element_text(el)))
    }

    fn parse_row(&self, ordinal: usize, row: ElementRef<'_>) -> ListedRow {
        let mut absent = Vec::new();
        let mut values: [String; 5] = Default::default();

        for (slot, (field, selector)) in values.iter_mut().zip(self.columns.iter()) {
            match row.select(selector).next() {
                Some(el) => *slot = element_text(el),
                None => absent.push(*field),
            }
        }

        let [english_name, chinese_name, title, department, email] = values;
        let row_data = DirectoryRow {
            english_name,
            chinese_name,
            title,
            department,
            email,
        };

        if !absent.is_empty() {
            debug!(
                target: "extract.listing",
                ordinal,
                row = %row_data.english_name,
                ?absent,
                "row is missing columns"
            );
        }

        let trigger = row.select(&self.more_button).next().map(|_| TriggerRef {
            row_key: row_data.key(),
            ordinal_hint: ordinal,
            row_selector: self.raw.row.clone(),
            key_selector: self.raw.english_name.clone(),
            control_selector: self.raw.more_button.clone(),
        });

        ListedRow {
            row: row_data,
            trigger,
            absent,
        }
    }
}

/// One-shot form of [`ListingParser::parse`].
pub fn extract_rows(
    html: &str,
    selectors: &ListingSelectors,
) -> Result<Vec<ListedRow>, ExtractError> {
    Ok(ListingParser::new(selectors)?.parse(html))
}
