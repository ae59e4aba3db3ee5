//! Response decoding module
//!
//! Locates the records of a page inside a JSON response body.
//!
//! # Overview
//!
//! A [`RecordLocator`] is built once per resource from its record path and
//! applied to every page. It returns the page's records as JSON objects in
//! body order.

mod locator;

pub use locator::RecordLocator;
