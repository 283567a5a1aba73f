// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Table name normalization.
//!
//! Names handed to the hosted store must be valid unquoted Postgres
//! identifiers: lowercase ASCII letters, digits and underscores, not starting
//! with a digit, at most 63 bytes, and not a reserved word.

/// Longest identifier Postgres keeps without truncation.
pub const MAX_IDENTIFIER_LEN: usize = 63;

const FALLBACK_NAME: &str = "untitled_table";

const RESERVED_WORDS: &[&str] = &[
	"all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both", "case",
	"cast", "check", "collate", "column", "constraint", "create", "current_date", "current_role",
	"current_time", "current_timestamp", "current_user", "default", "deferrable", "desc", "distinct",
	"do", "else", "end", "except", "false", "fetch", "for", "foreign", "from", "grant", "group",
	"having", "in", "initially", "intersect", "into", "lateral", "leading", "limit", "localtime",
	"localtimestamp", "not", "null", "offset", "on", "only", "or", "order", "placing", "primary",
	"references", "returning", "select", "session_user", "some", "symmetric", "table", "then", "to",
	"trailing", "true", "union", "unique", "user", "using", "variadic", "when", "where", "window",
	"with",
];

fn fold_accent(c: char) -> Option<&'static str> {
	let folded = match c {
		'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
		'æ' => "ae",
		'ç' => "c",
		'è' | 'é' | 'ê' | 'ë' => "e",
		'ì' | 'í' | 'î' | 'ï' => "i",
		'ñ' => "n",
		'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
		'œ' => "oe",
		'ù' | 'ú' | 'û' | 'ü' => "u",
		'ý' | 'ÿ' => "y",
		'ß' => "ss",
		_ => return None,
	};
	Some(folded)
}

/// Normalizes an arbitrary label into a table name the store accepts.
///
/// ```
/// use mapsync_dataset_core::normalize_name;
///
/// assert_eq!(normalize_name("My Map_1"), "my_map_1");
/// assert_eq!(normalize_name("2019 sales"), "_2019_sales");
/// ```
pub fn normalize_name(name: &str) -> String {
	let mut out = String::with_capacity(name.len());

	for c in name.chars().flat_map(char::to_lowercase) {
		match fold_accent(c) {
			Some(folded) => out.push_str(folded),
			None if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' => out.push(c),
			None => out.push('_'),
		}
	}

	let mut collapsed = String::with_capacity(out.len());
	for c in out.chars() {
		if c == '_' && collapsed.ends_with('_') {
			continue;
		}
		collapsed.push(c);
	}

	if collapsed.is_empty() || collapsed == "_" {
		return FALLBACK_NAME.to_string();
	}

	if collapsed.starts_with(|c: char| c.is_ascii_digit()) {
		collapsed.insert(0, '_');
	}

	// Everything is ASCII at this point, so byte truncation is char-safe.
	collapsed.truncate(MAX_IDENTIFIER_LEN);

	if RESERVED_WORDS.contains(&collapsed.as_str()) {
		collapsed.push('_');
	}

	collapsed
}
