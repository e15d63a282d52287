//! Client-side filter evaluation over cached rows.

use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use crmsync::model::Customer;
use crmsync::{Filter, Predicate, apply_filter};

fn tags(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn customer(name: &str, company: Option<&str>, total_value: f64, tag_list: &[&str]) -> Customer {
    Customer {
        id: name.to_lowercase().replace(' ', "-"),
        user_id: "user-a".to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: None,
        company: company.map(str::to_string),
        language: "English".to_string(),
        currency: "USD".to_string(),
        total_value,
        tags: tags(tag_list),
        addresses: Vec::new(),
        notes: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        last_activity: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

fn sample() -> Vec<Customer> {
    vec![
        customer("Jane Doe", Some("Acme Corp"), 1500.0, &["vip", "eu"]),
        customer("John Roe", None, 200.0, &["eu"]),
        customer("Ana Silva", Some("Globex"), 900.0, &[]),
    ]
}

#[test]
fn empty_filter_matches_everything() {
    let rows = sample();
    let filtered = apply_filter(&rows, &Filter::new());
    assert_eq!(filtered.len(), rows.len());
}

#[test]
fn text_search_is_case_insensitive_across_name_email_company() {
    let rows = sample();

    let by_name = Filter::new().with("search", Predicate::Text("JANE".into()));
    assert_eq!(apply_filter(&rows, &by_name).len(), 1);

    let by_email = Filter::new().with("search", Predicate::Text("ana.silva@".into()));
    assert_eq!(apply_filter(&rows, &by_email).len(), 1);

    let by_company = Filter::new().with("search", Predicate::Text("acme".into()));
    let hits = apply_filter(&rows, &by_company);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Jane Doe");
}

#[test]
fn criteria_combine_conjunctively() {
    let rows = sample();
    let filter = Filter::new()
        .with("search", Predicate::Text("e".into()))
        .with("total_value_min", Predicate::Min(500.0));

    let hits = apply_filter(&rows, &filter);
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|c| c.total_value >= 500.0));
}

#[test]
fn numeric_bounds_are_inclusive() {
    let rows = sample();

    let at_min = Filter::new().with("total_value_min", Predicate::Min(200.0));
    assert_eq!(apply_filter(&rows, &at_min).len(), 3);

    let at_max = Filter::new().with("total_value_max", Predicate::Max(900.0));
    assert_eq!(apply_filter(&rows, &at_max).len(), 2);
}

#[test]
fn date_bounds_are_inclusive_instants() {
    let rows = sample();
    let exact = rows[0].created_at;

    let after = Filter::new().with("created_at_after", Predicate::After(exact));
    assert_eq!(apply_filter(&rows, &after).len(), 3);

    let before = Filter::new().with("created_at_before", Predicate::Before(exact - Duration::seconds(1)));
    assert!(apply_filter(&rows, &before).is_empty());
}

#[test]
fn tag_criteria_require_every_tag() {
    let rows = sample();

    let single = Filter::new().with("tags", Predicate::Tags(tags(&["eu"])));
    assert_eq!(apply_filter(&rows, &single).len(), 2);

    let both = Filter::new().with("tags", Predicate::Tags(tags(&["eu", "vip"])));
    let hits = apply_filter(&rows, &both);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Jane Doe");
}

#[test]
fn vacuous_predicates_match_everything() {
    let rows = sample();
    let filter = Filter::new()
        .with("search", Predicate::Text(String::new()))
        .with("language", Predicate::Exact(String::new()))
        .with("tags", Predicate::Tags(BTreeSet::new()));

    assert_eq!(apply_filter(&rows, &filter).len(), rows.len());
}

#[test]
fn unknown_field_fails_only_with_a_real_predicate() {
    let rows = sample();

    let vacuous = Filter::new().with("no_such_field", Predicate::Text(String::new()));
    assert_eq!(apply_filter(&rows, &vacuous).len(), rows.len());

    let set = Filter::new().with("no_such_field", Predicate::Text("x".into()));
    assert!(apply_filter(&rows, &set).is_empty());
}

#[test]
fn filtering_is_idempotent() {
    let rows = sample();
    let filter = Filter::new()
        .with("total_value_min", Predicate::Min(300.0))
        .with("tags", Predicate::Tags(tags(&["eu"])));

    let once = apply_filter(&rows, &filter);
    let twice = apply_filter(&once, &filter);
    assert_eq!(once.len(), twice.len());
    assert!(once.iter().zip(&twice).all(|(a, b)| a.id == b.id));
}
