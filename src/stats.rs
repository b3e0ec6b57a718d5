//! Aggregates over a list of blogs: total likes, the favourite blog, and the
//! most prolific / most liked authors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::BlogResponse;

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct FavouriteBlog {
    pub title: String,
    pub author: String,
    pub likes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct AuthorBlogCount {
    pub author: String,
    pub blogs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct AuthorLikes {
    pub author: String,
    pub likes: i64,
}

/// BlogStats
///
/// Output of GET /blogs/stats. The optional fields are `null` for an empty collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlogStats {
    pub total_likes: i64,
    pub favourite_blog: Option<FavouriteBlog>,
    pub most_blogs: Option<AuthorBlogCount>,
    pub most_likes: Option<AuthorLikes>,
}

impl BlogStats {
    pub fn from_blogs(blogs: &[BlogResponse]) -> Self {
        Self {
            total_likes: total_likes(blogs),
            favourite_blog: favourite_blog(blogs),
            most_blogs: most_blogs(blogs),
            most_likes: most_likes(blogs),
        }
    }
}

/// Saturates at `i64::MAX` instead of overflowing.
pub fn total_likes(blogs: &[BlogResponse]) -> i64 {
    blogs.iter().fold(0i64, |acc, b| acc.saturating_add(b.likes))
}

/// The first blog holding the maximum like count.
pub fn favourite_blog(blogs: &[BlogResponse]) -> Option<FavouriteBlog> {
    let max = blogs.iter().map(|b| b.likes).max()?;
    blogs
        .iter()
        .find(|b| b.likes == max)
        .map(|b| FavouriteBlog {
            title: b.title.clone(),
            author: b.author.clone(),
            likes: b.likes,
        })
}

pub fn most_blogs(blogs: &[BlogResponse]) -> Option<AuthorBlogCount> {
    top_author(blogs, |_| 1).map(|(author, blogs)| AuthorBlogCount { author, blogs })
}

pub fn most_likes(blogs: &[BlogResponse]) -> Option<AuthorLikes> {
    top_author(blogs, |b| b.likes).map(|(author, likes)| AuthorLikes { author, likes })
}

/// Sums `weight` per author (saturating) and returns the largest total. Ties go
/// to the author who appears first in `blogs`.
fn top_author(blogs: &[BlogResponse], weight: impl Fn(&BlogResponse) -> i64) -> Option<(String, i64)> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for blog in blogs {
        let entry = totals.entry(blog.author.as_str()).or_insert_with(|| {
            order.push(blog.author.as_str());
            0
        });
        *entry = entry.saturating_add(weight(blog));
    }

    let mut best: Option<(&str, i64)> = None;
    for author in order {
        let total = totals[author];
        if best.is_none_or(|(_, current)| total > current) {
            best = Some((author, total));
        }
    }
    best.map(|(author, total)| (author.to_string(), total))
}
