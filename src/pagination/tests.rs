//! Tests for pagination module

use super::*;
use crate::error::Error;
use crate::types::{JsonObject, PaginationMode};
use pretty_assertions::assert_eq;
use serde_json::json;

const ENDPOINT: &str = "https://prices.azure.com/api/retail/prices";

fn items(n: usize) -> Vec<JsonObject> {
    (0..n)
        .map(|i| match json!({"meterId": format!("m{i}")}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        })
        .collect()
}

fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// ============================================================================
// Page / Locator Tests
// ============================================================================

#[test]
fn test_page_terminal_rules() {
    assert!(Page::new(0, items(0), Some("x".into())).is_terminal());
    assert!(Page::new(0, items(3), None).is_terminal());
    assert!(!Page::new(0, items(3), Some("x".into())).is_terminal());
}

#[test]
fn test_locator_full_url_encodes_query() {
    let locator = PageLocator::new(2, ENDPOINT).with_query(pairs(&[
        ("$filter", "serviceName eq 'Storage'"),
        ("$skip", "200"),
    ]));
    let url = url::Url::parse(&locator.full_url().unwrap()).unwrap();
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    assert_eq!(
        query,
        pairs(&[("$filter", "serviceName eq 'Storage'"), ("$skip", "200")])
    );
}

#[test]
fn test_locator_full_url_without_query_is_unchanged() {
    let next = "https://prices.azure.com/api/retail/prices?$skip=100";
    let locator = PageLocator::new(1, next);
    assert_eq!(locator.full_url().unwrap(), next);
}

#[test]
fn test_locator_full_url_rejects_garbage() {
    let err = PageLocator::new(0, "not a url").full_url().unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

// ============================================================================
// Offset Pagination Tests
// ============================================================================

#[test]
fn test_offset_locators_derive_skip_from_index() {
    let config = PaginationConfig::new(ENDPOINT, PaginationMode::Offset)
        .page_size(100)
        .param("api-version", "2021-10-01-preview")
        .filter("serviceName eq 'Storage'");
    let paginator = create_paginator(&config).unwrap();

    assert_eq!(paginator.mode(), PaginationMode::Offset);

    let first = paginator.first();
    assert_eq!(first.index, 0);
    assert_eq!(
        first.query,
        pairs(&[
            ("api-version", "2021-10-01-preview"),
            ("$filter", "serviceName eq 'Storage'"),
            ("$skip", "0"),
        ])
    );

    let third = paginator.locator_for(3).unwrap();
    assert_eq!(third.index, 3);
    assert_eq!(third.query.last(), Some(&("$skip".into(), "300".into())));
}

#[test]
fn test_offset_top_param() {
    let config = PaginationConfig::new(ENDPOINT, PaginationMode::Offset)
        .page_size(50)
        .top_param("$top");
    let paginator = OffsetPaginator::new(&config).unwrap();

    assert_eq!(paginator.offset_of(4), 200);
    let locator = paginator.locator_for(1).unwrap();
    assert_eq!(locator.query, pairs(&[("$skip", "50"), ("$top", "50")]));
}

#[test]
fn test_offset_next_stops_on_terminal_page() {
    let config = PaginationConfig::new(ENDPOINT, PaginationMode::Offset);
    let paginator = create_paginator(&config).unwrap();

    let full = Page::new(0, items(100), Some(format!("{ENDPOINT}?$skip=100")));
    let next = paginator.next(&full).unwrap().unwrap();
    assert_eq!(next.index, 1);

    let empty = Page::new(1, items(0), Some(format!("{ENDPOINT}?$skip=200")));
    assert!(paginator.next(&empty).unwrap().is_none());

    let last = Page::new(1, items(40), None);
    assert!(paginator.next(&last).unwrap().is_none());
}

#[test]
fn test_offset_rejects_zero_page_size() {
    let config = PaginationConfig::new(ENDPOINT, PaginationMode::Offset).page_size(0);
    let err = OffsetPaginator::new(&config).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "page_size"));
}

// ============================================================================
// Cursor Pagination Tests
// ============================================================================

#[test]
fn test_cursor_first_carries_base_query() {
    let config = PaginationConfig::new(ENDPOINT, PaginationMode::Cursor)
        .param("api-version", "2021-10-01-preview");
    let paginator = create_paginator(&config).unwrap();

    assert_eq!(paginator.mode(), PaginationMode::Cursor);
    assert_eq!(
        paginator.first().query,
        pairs(&[("api-version", "2021-10-01-preview")])
    );
    assert!(paginator.locator_for(0).is_some());
    assert!(paginator.locator_for(1).is_none());
}

#[test]
fn test_cursor_follows_next_link() {
    let config = PaginationConfig::new(ENDPOINT, PaginationMode::Cursor).filter("x eq 1");
    let paginator = CursorPaginator::new(&config).unwrap();

    let link = "https://prices.azure.com/api/retail/prices?$filter=x%20eq%201&$skip=100";
    let page = Page::new(0, items(100), Some(link.into()));
    let next = paginator.next(&page).unwrap().unwrap();

    assert_eq!(next.index, 1);
    assert_eq!(next.url, link);
    assert!(next.query.is_empty());
}

#[test]
fn test_cursor_resolves_relative_link() {
    let config = PaginationConfig::new(ENDPOINT, PaginationMode::Cursor);
    let paginator = CursorPaginator::new(&config).unwrap();

    let page = Page::new(4, items(1), Some("/api/retail/prices?$skip=500".into()));
    let next = paginator.next(&page).unwrap().unwrap();

    assert_eq!(next.index, 5);
    assert_eq!(
        next.url,
        "https://prices.azure.com/api/retail/prices?$skip=500"
    );
}

#[test]
fn test_cursor_ends_without_link_or_items() {
    let config = PaginationConfig::new(ENDPOINT, PaginationMode::Cursor);
    let paginator = CursorPaginator::new(&config).unwrap();

    assert!(paginator
        .next(&Page::new(0, items(5), None))
        .unwrap()
        .is_none());
    assert!(paginator
        .next(&Page::new(0, items(0), Some("/more".into())))
        .unwrap()
        .is_none());
}

#[test]
fn test_invalid_endpoint() {
    let config = PaginationConfig::new("::nope::", PaginationMode::Cursor);
    assert!(matches!(
        create_paginator(&config),
        Err(Error::InvalidUrl(_))
    ));
}
