use faculty_common::{DetailSelectors, Field, ListingSelectors, RowField};
use faculty_extract::{DetailParser, ListingParser};

const LISTING: &str = include_str!("fixtures/listing.html");
const DETAIL: &str = include_str!("fixtures/detail.html");

#[test]
fn listing_fixture_yields_every_row_once() {
    let parser = ListingParser::new(&ListingSelectors::default()).unwrap();
    let rows = parser.parse(LISTING);

    let names: Vec<_> = rows.iter().map(|r| r.row.english_name.as_str()).collect();
    assert_eq!(names, ["Alice CHEN", "Bob LI", "Carol WANG"]);

    assert!(rows[0].trigger.is_some());
    assert!(rows[1].trigger.is_none(), "Bob has no more button");
    assert_eq!(rows[2].absent, vec![RowField::ChineseName]);
    assert_eq!(rows[2].trigger.as_ref().unwrap().ordinal_hint, 2);
}

#[test]
fn listing_parse_is_deterministic() {
    let parser = ListingParser::new(&ListingSelectors::default()).unwrap();
    assert_eq!(parser.parse(LISTING), parser.parse(LISTING));
}

#[test]
fn detail_fixture_fields() {
    let parser = DetailParser::new(&DetailSelectors::default()).unwrap();
    let snap = parser.parse(DETAIL);

    assert_eq!(snap.email, Field::Present("alicechen@gz.example.edu".into()));
    assert_eq!(snap.location, Field::Present("Room 305, E1 Building".into()));
    assert_eq!(snap.homepage, Field::Present("https://alice.example.edu".into()));
    assert_eq!(
        snap.overview,
        Field::Present("Dr. Chen works on machine learning systems.".into())
    );
    assert_eq!(snap.degrees.as_option().map(Vec::len), Some(3));
    assert_eq!(snap.graduate_year, Field::Present(2014));
    assert_eq!(snap.tab_count, 2);
}

#[test]
fn detail_fixture_reads_last_tab_panel() {
    let parser = DetailParser::new(&DetailSelectors::default()).unwrap();
    let last = parser.count_tabs(DETAIL) - 1;
    assert_eq!(
        parser.parse_research_interests(DETAIL, last),
        Field::Present(vec![
            "Large-scale machine learning".to_string(),
            "Federated learning".to_string()
        ])
    );
}
