// ABOUTME: Hierarchical service path newtype with formatting and multi-path expression parsing
// ABOUTME: Guarantees a leading slash and no trailing slash on every path built from external input
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

//! Service paths name a group of configuration keys, e.g. `/billing/prod`.
//!
//! Every constructor formats its input: a leading `/` is added when absent
//! and trailing `/` characters are removed. Input that formats to nothing is
//! the root path `/`, the only path allowed to end with a slash.
//!
//! Multi-path expressions such as `service/dev+prod,service2` are expanded
//! by [`ServicePath::parse_multi`].

use serde::{Deserialize, Serialize};
use std::fmt;

const SEPARATOR: char = '/';
const EXPRESSION_SEPARATOR: char = ',';
const SIBLING_SEPARATOR: char = '+';

/// A formatted, slash-rooted configuration namespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ServicePath(String);

impl ServicePath {
    /// Format arbitrary input into a service path
    ///
    /// Adds a leading `/` when missing and strips all trailing `/`.
    /// Empty or all-slash input yields the root path `/`.
    #[must_use]
    pub fn format(input: &str) -> Self {
        let trimmed = input.trim_end_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Self(SEPARATOR.to_string());
        }
        if trimmed.starts_with(SEPARATOR) {
            Self(trimmed.to_owned())
        } else {
            Self(format!("{SEPARATOR}{trimmed}"))
        }
    }

    /// Expand a multi-path expression into service paths
    ///
    /// Expressions are separated by `,`. Within an expression, `+` introduces
    /// siblings of the first path's leaf: `/svc/dev+prod` expands to
    /// `/svc/dev` and `/svc/prod`. Each result is cleaned like a POSIX path
    /// join, so `..` and `.` segments resolve and repeated slashes collapse.
    ///
    /// Order is preserved and duplicates are kept. Parsing never fails;
    /// empty expressions produce the root path.
    #[must_use]
    pub fn parse_multi(input: &str) -> Vec<Self> {
        let mut paths = Vec::new();

        for expression in input.split(EXPRESSION_SEPARATOR) {
            let mut segments = expression.split(SIBLING_SEPARATOR);
            let first = Self::format(segments.next().unwrap_or_default());

            let (directory, leaf) = first
                .0
                .rsplit_once(SEPARATOR)
                .unwrap_or(("", first.0.as_str()));

            paths.push(Self::join(directory, leaf));
            for sibling in segments {
                paths.push(Self::join(directory, sibling));
            }
        }

        paths
    }

    /// Remote parameter name for `key` under this path
    ///
    /// `/svc/env` and `DB_HOST` give `/svc/env/DB_HOST`.
    #[must_use]
    pub fn parameter_name(&self, key: &str) -> String {
        clean_rooted(&format!("{}{SEPARATOR}{key}", self.0))
    }

    /// Final segment of a remote parameter name, i.e. the key it stores
    #[must_use]
    pub fn base_name(name: &str) -> &str {
        let trimmed = name.trim_end_matches(SEPARATOR);
        trimmed
            .rsplit_once(SEPARATOR)
            .map_or(trimmed, |(_, leaf)| leaf)
    }

    /// Borrow the formatted path
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn join(directory: &str, segment: &str) -> Self {
        Self::format(&clean_rooted(&format!("{directory}{SEPARATOR}{segment}")))
    }
}

/// Lexically clean a slash-rooted path
///
/// Collapses repeated separators, drops `.` segments and resolves `..`
/// against the preceding segment. `..` at the root stays at the root.
fn clean_rooted(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut cleaned = String::with_capacity(path.len());
    for segment in &segments {
        cleaned.push(SEPARATOR);
        cleaned.push_str(segment);
    }
    if cleaned.is_empty() {
        cleaned.push(SEPARATOR);
    }
    cleaned
}

impl fmt::Display for ServicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServicePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServicePath {
    fn from(value: &str) -> Self {
        Self::format(value)
    }
}

impl From<String> for ServicePath {
    fn from(value: String) -> Self {
        Self::format(&value)
    }
}

impl From<ServicePath> for String {
    fn from(value: ServicePath) -> Self {
        value.0
    }
}
