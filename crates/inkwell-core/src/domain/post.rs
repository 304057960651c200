use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_SUMMARY_CHARS: usize = 500;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_CHARS: usize = 50;

static SLUG_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern"));
static SLUG_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("strip pattern"));
static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("separator pattern"));

/// Post entity - a blog post with its engagement counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub published: bool,
    /// Never negative.
    pub views: i64,
    /// Never negative.
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of a post as submitted by an admin, before validation.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
}

/// Draft that passed validation, with the slug resolved.
#[derive(Debug, Clone)]
struct ValidDraft {
    title: String,
    content: String,
    slug: String,
    summary: String,
    tags: Vec<String>,
    published: bool,
}

impl PostDraft {
    /// Validate the draft and build a brand new post with zeroed counters.
    pub fn into_post(self) -> Result<Post, DomainError> {
        let draft = self.validate()?;
        let now = Utc::now();
        Ok(Post {
            id: Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            slug: draft.slug,
            summary: draft.summary,
            tags: draft.tags,
            published: draft.published,
            views: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validate the draft and apply it on top of an existing post.
    ///
    /// Identity, counters and `created_at` are carried over untouched.
    pub fn apply_to(self, existing: &Post) -> Result<Post, DomainError> {
        let draft = self.validate()?;
        Ok(Post {
            title: draft.title,
            content: draft.content,
            slug: draft.slug,
            summary: draft.summary,
            tags: draft.tags,
            published: draft.published,
            updated_at: Utc::now(),
            ..existing.clone()
        })
    }

    fn validate(self) -> Result<ValidDraft, DomainError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(DomainError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }

        if self.content.trim().is_empty() {
            return Err(DomainError::Validation("content is required".to_string()));
        }

        let slug = match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => {
                if !SLUG_SHAPE.is_match(slug) {
                    return Err(DomainError::Validation(
                        "slug may only contain lowercase letters, digits and single dashes"
                            .to_string(),
                    ));
                }
                slug.to_string()
            }
            _ => {
                let generated = generate_slug(&title);
                if generated.is_empty() {
                    return Err(DomainError::Validation(
                        "a slug could not be derived from the title; please provide one"
                            .to_string(),
                    ));
                }
                generated
            }
        };

        let summary = self.summary.unwrap_or_default().trim().to_string();
        if summary.chars().count() > MAX_SUMMARY_CHARS {
            return Err(DomainError::Validation(format!(
                "summary must be at most {MAX_SUMMARY_CHARS} characters"
            )));
        }

        Ok(ValidDraft {
            title,
            content: self.content,
            slug,
            summary,
            tags: validate_tags(self.tags)?,
            published: self.published,
        })
    }
}

fn validate_tags(tags: Vec<String>) -> Result<Vec<String>, DomainError> {
    if tags.len() > MAX_TAGS {
        return Err(DomainError::Validation(format!(
            "at most {MAX_TAGS} tags are allowed"
        )));
    }

    let mut accepted: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || tag.len() > MAX_TAG_CHARS {
            return Err(DomainError::Validation(format!(
                "tags must be between 1 and {MAX_TAG_CHARS} characters"
            )));
        }
        if !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::Validation(format!(
                "tag '{tag}' must be alphanumeric"
            )));
        }
        if !accepted.iter().any(|t| t == tag) {
            accepted.push(tag.to_string());
        }
    }
    Ok(accepted)
}

/// Derive a URL-safe slug from a title.
///
/// Lowercases, drops anything outside `[a-z0-9]`, whitespace and dashes, then joins the
/// remaining words with single dashes.
pub fn generate_slug(title: &str) -> String {
    let lower = title.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lower, "");
    SLUG_SEPARATORS
        .replace_all(stripped.trim(), "-")
        .trim_matches('-')
        .to_string()
}

/// Listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub published: Option<bool>,
}

impl PostFilter {
    /// Only the exact strings `true` and `false` filter; anything else lists everything.
    pub fn from_query(published: Option<&str>) -> Self {
        let published = match published {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };
        Self { published }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.published.is_none_or(|p| post.published == p)
    }
}

/// A page request with clamped bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const MAX_LIMIT: u64 = 100;

    /// Lenient parsing: unparseable or `< 1` pages become 1, and limits outside
    /// `1..=100` fall back to the default of 10.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p as u64)
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| (1..=Self::MAX_LIMIT as i64).contains(l))
            .map(|l| l as u64)
            .unwrap_or(Self::DEFAULT_LIMIT);
        Self { page, limit }
    }

    /// Row offset, capped at `i64::MAX` so stores with signed offsets accept it.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of a listing plus the size of the whole filtered set.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            content: "hello".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_far_pages_keep_a_signed_offset() {
        let page = PageRequest::from_query(Some("9223372036854775807"), Some("100"));
        assert_eq!(page.page, i64::MAX as u64);
        assert_eq!(page.offset(), i64::MAX as u64);
        assert!(i64::try_from(page.offset()).is_ok());

        let page = PageRequest::from_query(Some("3"), Some("20"));
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Test Post"), "test-post");
        assert_eq!(generate_slug("Hello, World! It's  me."), "hello-world-its-me");
        assert_eq!(generate_slug("  -- Rust --  2024 "), "rust-2024");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_into_post_generates_slug_and_zero_counters() {
        let post = draft("Test Post").into_post().unwrap();
        assert_eq!(post.slug, "test-post");
        assert_eq!(post.views, 0);
        assert_eq!(post.likes, 0);
        assert_eq!(post.created_at, post.updated_at);
    }

    #[test]
    fn test_rejects_missing_title_and_content() {
        assert!(matches!(draft("   ").into_post(), Err(DomainError::Validation(_))));

        let mut d = draft("Title");
        d.content = "  ".to_string();
        assert!(matches!(d.into_post(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_rejects_bad_slug() {
        let mut d = draft("Title");
        d.slug = Some("Not A Slug".to_string());
        assert!(matches!(d.into_post(), Err(DomainError::Validation(_))));

        let mut d = draft("Title");
        d.slug = Some("custom-slug-2".to_string());
        assert_eq!(d.into_post().unwrap().slug, "custom-slug-2");
    }

    #[test]
    fn test_tag_rules() {
        let mut d = draft("Title");
        d.tags = (0..11).map(|i| format!("t{i}")).collect();
        assert!(d.into_post().is_err());

        let mut d = draft("Title");
        d.tags = vec!["rust".to_string(), "no spaces".to_string()];
        assert!(d.into_post().is_err());

        let mut d = draft("Title");
        d.tags = vec!["a".repeat(51)];
        assert!(d.into_post().is_err());

        let mut d = draft("Title");
        d.tags = vec!["rust".to_string(), "web".to_string(), "rust".to_string()];
        assert_eq!(d.into_post().unwrap().tags, vec!["rust", "web"]);
    }

    #[test]
    fn test_apply_keeps_counters_and_identity() {
        let mut original = draft("First").into_post().unwrap();
        original.likes = 4;
        original.views = 9;

        let updated = draft("Second Title").apply_to(&original).unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.likes, 4);
        assert_eq!(updated.views, 9);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.slug, "second-title");
    }

    #[test]
    fn test_page_request_clamping() {
        assert_eq!(PageRequest::from_query(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(
            PageRequest::from_query(Some("0"), Some("101")),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::from_query(Some("-3"), Some("0")),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::from_query(Some("abc"), Some("x")),
            PageRequest { page: 1, limit: 10 }
        );
        let req = PageRequest::from_query(Some("3"), Some("100"));
        assert_eq!(req, PageRequest { page: 3, limit: 100 });
        assert_eq!(req.offset(), 200);
    }

    #[test]
    fn test_filter_from_query() {
        assert_eq!(PostFilter::from_query(Some("true")).published, Some(true));
        assert_eq!(PostFilter::from_query(Some("false")).published, Some(false));
        assert_eq!(PostFilter::from_query(Some("yes")).published, None);
        assert_eq!(PostFilter::from_query(None).published, None);
    }
}
