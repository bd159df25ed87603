//! Channel catalog consumed by the UI shell and the ambient baseline.

pub mod catalog;
