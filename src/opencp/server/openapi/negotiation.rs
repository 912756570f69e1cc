/*
 * Copyright (C) 2024 The OpenCP Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! HTTP `Accept` parsing and media type selection.

use std::cmp::Ordering;

/// One media range from an `Accept` header.
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptClause {
    pub media_type: String,
    pub media_subtype: String,
    pub q: f64,
    pub params: Vec<(String, String)>,
}

impl AcceptClause {
    fn matches(&self, media_type: &str, media_subtype: &str) -> bool {
        (self.media_type == "*" || self.media_type == media_type)
            && (self.media_subtype == "*" || self.media_subtype == media_subtype)
    }
}

/// RFC 7230 token, also admitting `@` for vendor types such as the protobuf
/// OpenAPI encoding.
fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>,;:\\\"/[]?={}".contains(&b))
}

fn parse_clause(part: &str) -> Option<AcceptClause> {
    let mut pieces = part.split(';');
    let range = pieces.next()?.trim().to_ascii_lowercase();
    let range = if range == "*" { "*/*".to_string() } else { range };
    let (media_type, media_subtype) = range.split_once('/')?;
    if !is_token(media_type) || !is_token(media_subtype) {
        return None;
    }

    let mut clause = AcceptClause {
        media_type: media_type.to_string(),
        media_subtype: media_subtype.to_string(),
        q: 1.0,
        params: Vec::new(),
    };
    for param in pieces.map(str::trim).filter(|param| !param.is_empty()) {
        let (key, value) = param.split_once('=')?;
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().trim_matches('"');
        if key == "q" {
            clause.q = value.parse::<f64>().unwrap_or(0.0).clamp(0.0, 1.0);
        } else {
            clause.params.push((key, value.to_string()));
        }
    }
    Some(clause)
}

/// Parses an `Accept` header into clauses ordered by preference: quality
/// first, then concrete types before wildcards. Malformed ranges and ranges
/// with `q=0` are dropped.
pub fn parse_accept(header: &str) -> Vec<AcceptClause> {
    let mut clauses: Vec<AcceptClause> = header
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(parse_clause)
        .filter(|clause| clause.q > 0.0)
        .collect();
    clauses.sort_by(|a, b| {
        b.q.partial_cmp(&a.q)
            .unwrap_or(Ordering::Equal)
            .then_with(|| (a.media_type == "*").cmp(&(b.media_type == "*")))
            .then_with(|| (a.media_subtype == "*").cmp(&(b.media_subtype == "*")))
    });
    clauses
}

/// Returns the index of the first offer matched while walking the clauses in
/// preference order. An absent or blank header accepts anything.
pub fn negotiate(accept: Option<&str>, offers: &[(&str, &str)]) -> Option<usize> {
    let header = accept
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("*/*");
    parse_accept(header).iter().find_map(|clause| {
        offers
            .iter()
            .position(|(media_type, media_subtype)| clause.matches(media_type, media_subtype))
    })
}
