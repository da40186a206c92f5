//! Pagination module
//!
//! Supports: Cursor (next link), Offset (skip parameter)
//!
//! # Overview
//!
//! A paginator turns a [`PaginationConfig`] into a chain of [`PageLocator`]s.
//! Cursor pagination learns each locator from the previous [`Page`]; offset
//! pagination derives any locator from its index, which lets the driver
//! prefetch pages concurrently.

mod strategies;
mod types;

pub use strategies::{create_paginator, CursorPaginator, OffsetPaginator};
pub use types::{
    Page, PageLocator, PaginationConfig, Paginator, DEFAULT_FILTER_PARAM, DEFAULT_SKIP_PARAM,
};

#[cfg(test)]
mod tests;
