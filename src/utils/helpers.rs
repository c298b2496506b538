//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use rand::Rng;

/// Derive a URL-safe slug from an event title
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("event");
    }
    slug
}

/// Append a short random suffix to a slug to resolve collisions
pub fn slug_with_suffix(slug: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("{}-{}", slug, suffix)
}

/// Escape a value for inclusion in a CSV row
pub fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
