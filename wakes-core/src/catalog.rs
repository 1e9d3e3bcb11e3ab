//! Artifact catalog index.
//!
//! The catalog is the read-only collection of museum objects the tour draws
//! from. It is loaded once (usually from a JSON export of the collection) and
//! indexed by object id and gallery number.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Identifier of an object in the collection.
pub type ObjectId = u64;

/// Minimum word-overlap score for a fuzzy identification match.
const MIN_MATCH_SCORE: u32 = 3;

/// Errors from catalog loading.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single object record from the collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Stable, unique object id.
    pub object_id: ObjectId,

    /// Display title.
    #[serde(default)]
    pub title: String,

    /// Object type name ("Scarab", "Coffin", ...).
    #[serde(default)]
    pub object_name: Option<String>,

    /// Gallery where the object is on view.
    #[serde(default)]
    pub gallery_number: Option<String>,

    #[serde(default)]
    pub medium: Option<String>,

    #[serde(default)]
    pub period: Option<String>,

    #[serde(default)]
    pub dynasty: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub provenance: Option<String>,

    /// Subject tags assigned by the collection.
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub image_file: Option<String>,
}

impl ArtifactRecord {
    /// Create a record with just an id and a title.
    pub fn new(object_id: ObjectId, title: impl Into<String>) -> Self {
        Self {
            object_id,
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = Some(name.into());
        self
    }

    pub fn with_gallery(mut self, gallery: impl Into<String>) -> Self {
        self.gallery_number = Some(gallery.into());
        self
    }

    pub fn with_medium(mut self, medium: impl Into<String>) -> Self {
        self.medium = Some(medium.into());
        self
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    pub fn with_dynasty(mut self, dynasty: impl Into<String>) -> Self {
        self.dynasty = Some(dynasty.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Whether the record carries a usable image reference.
    pub fn has_image(&self) -> bool {
        non_empty(&self.image_url) || non_empty(&self.image_file)
    }

    /// Lowercased title, object name, description and medium.
    ///
    /// This is the text the pool builder matches path keywords against.
    pub fn search_text(&self) -> String {
        join_lower([
            Some(self.title.as_str()),
            self.object_name.as_deref(),
            self.description.as_deref(),
            self.medium.as_deref(),
        ])
    }

    /// Lowercased title, description and object name.
    ///
    /// This is the text role classifiers score keywords against.
    pub fn role_text(&self) -> String {
        join_lower([
            Some(self.title.as_str()),
            self.description.as_deref(),
            self.object_name.as_deref(),
        ])
    }

    /// Case-insensitive check of the record's period against an era name.
    pub fn period_matches(&self, era: &str) -> bool {
        self.period
            .as_deref()
            .map(|p| p.to_lowercase().contains(&era.to_lowercase()))
            .unwrap_or(false)
    }

    /// Gallery label for display, `?` when unknown.
    pub fn gallery_label(&self) -> &str {
        self.gallery_number.as_deref().unwrap_or("?")
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
}

fn join_lower<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Filters for [`Catalog::search`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results.
    pub limit: usize,
    /// Restrict to a gallery.
    pub gallery: Option<String>,
    /// Only records with an image URL.
    pub with_images: bool,
    /// Case-insensitive period substring.
    pub period: Option<String>,
    /// Case-insensitive dynasty substring.
    pub dynasty: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            gallery: None,
            with_images: false,
            period: None,
            dynasty: None,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn in_gallery(mut self, gallery: impl Into<String>) -> Self {
        self.gallery = Some(gallery.into());
        self
    }

    pub fn with_images(mut self) -> Self {
        self.with_images = true;
        self
    }

    pub fn in_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    pub fn in_dynasty(mut self, dynasty: impl Into<String>) -> Self {
        self.dynasty = Some(dynasty.into());
        self
    }
}

/// Indexed, read-only artifact collection.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    objects: Vec<ArtifactRecord>,
    by_id: HashMap<ObjectId, usize>,
    by_gallery: HashMap<String, Vec<usize>>,
    loaded: bool,
}

impl Catalog {
    /// An unloaded catalog. Every pool built from it is empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a loaded catalog from records.
    ///
    /// The first record with a given id wins; later duplicates are dropped.
    pub fn from_records(records: Vec<ArtifactRecord>) -> Self {
        let mut objects = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_gallery: HashMap<String, Vec<usize>> = HashMap::new();

        for record in records {
            if by_id.contains_key(&record.object_id) {
                tracing::warn!(object_id = record.object_id, "dropping duplicate catalog record");
                continue;
            }
            let index = objects.len();
            by_id.insert(record.object_id, index);
            if let Some(gallery) = record.gallery_number.as_ref().filter(|g| !g.is_empty()) {
                by_gallery.entry(gallery.clone()).or_default().push(index);
            }
            objects.push(record);
        }

        tracing::debug!(
            objects = objects.len(),
            galleries = by_gallery.len(),
            "catalog indexed"
        );

        Self {
            objects,
            by_id,
            by_gallery,
            loaded: true,
        }
    }

    /// Load a catalog from a JSON array of records.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).await?;
        let records: Vec<ArtifactRecord> = serde_json::from_str(&content)?;
        Ok(Self::from_records(records))
    }

    /// Whether records have been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// All records in load order.
    pub fn objects(&self) -> &[ArtifactRecord] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get_by_id(&self, id: ObjectId) -> Option<&ArtifactRecord> {
        self.by_id.get(&id).map(|&i| &self.objects[i])
    }

    pub fn get_by_gallery(&self, gallery: &str) -> Vec<&ArtifactRecord> {
        self.by_gallery
            .get(gallery)
            .map(|indices| indices.iter().map(|&i| &self.objects[i]).collect())
            .unwrap_or_default()
    }

    /// Gallery numbers in numeric order; non-numeric labels sort after.
    pub fn galleries(&self) -> Vec<&str> {
        let mut galleries: Vec<&str> = self.by_gallery.keys().map(String::as_str).collect();
        galleries.sort_by(|a, b| match (a.parse::<u32>(), b.parse::<u32>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        });
        galleries
    }

    /// Galleries of the Egyptian wing (100 through 138).
    pub fn egyptian_galleries(&self) -> Vec<&str> {
        self.galleries()
            .into_iter()
            .filter(|g| matches!(g.parse::<u32>(), Ok(n) if (100..=138).contains(&n)))
            .collect()
    }

    /// Free-text search with optional filters.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<&ArtifactRecord> {
        let q = query.to_lowercase();
        self.filtered(options)
            .filter(|o| {
                q.is_empty()
                    || o.title.to_lowercase().contains(&q)
                    || contains_ci(o.object_name.as_deref(), &q)
                    || contains_ci(o.description.as_deref(), &q)
                    || contains_ci(o.medium.as_deref(), &q)
                    || o.tags.iter().any(|t| t.to_lowercase().contains(&q))
            })
            .take(options.limit)
            .collect()
    }

    /// Records with any tag containing one of `tags`.
    pub fn search_by_tags(&self, tags: &[&str], options: &SearchOptions) -> Vec<&ArtifactRecord> {
        let wanted: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        self.filtered(options)
            .filter(|o| {
                o.tags.iter().any(|t| {
                    let t = t.to_lowercase();
                    wanted.iter().any(|w| t.contains(w.as_str()))
                })
            })
            .take(options.limit)
            .collect()
    }

    /// Records passing the structural filters. The options are copied so
    /// results borrow only the catalog.
    fn filtered<'a>(
        &'a self,
        options: &SearchOptions,
    ) -> impl Iterator<Item = &'a ArtifactRecord> + 'a {
        let gallery = options.gallery.clone();
        let with_images = options.with_images;
        let period = options.period.as_ref().map(|p| p.to_lowercase());
        let dynasty = options.dynasty.as_ref().map(|d| d.to_lowercase());
        self.objects.iter().filter(move |o| {
            if let Some(g) = &gallery {
                if o.gallery_number.as_deref() != Some(g.as_str()) {
                    return false;
                }
            }
            if with_images && !non_empty(&o.image_url) {
                return false;
            }
            if let Some(p) = &period {
                if !contains_ci(o.period.as_deref(), p) {
                    return false;
                }
            }
            if let Some(d) = &dynasty {
                if !contains_ci(o.dynasty.as_deref(), d) {
                    return false;
                }
            }
            true
        })
    }

    /// Labelled description of a record for narration prompts.
    pub fn describe_artifact(artifact: &ArtifactRecord) -> String {
        let mut parts = Vec::new();
        if !artifact.title.is_empty() {
            parts.push(format!("Title: {}", artifact.title));
        }
        let fields = [
            ("Date", artifact.date.as_deref()),
            ("Period", artifact.period.as_deref()),
            ("Dynasty", artifact.dynasty.as_deref()),
            ("Medium", artifact.medium.as_deref()),
            ("Gallery", artifact.gallery_number.as_deref()),
        ];
        for (label, value) in fields {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                parts.push(format!("{label}: {v}"));
            }
        }
        if let Some(d) = artifact.description.as_deref().filter(|d| !d.is_empty()) {
            parts.push(format!("Description: {}", truncate_chars(d, 400)));
        }
        if let Some(p) = artifact.provenance.as_deref().filter(|p| !p.is_empty()) {
            parts.push(format!("Provenance: {}", truncate_chars(p, 200)));
        }
        parts.join("\n")
    }

    /// Map a free-text identification (e.g. from a vision model) to a record.
    pub fn find_match(&self, vision_text: &str) -> Option<&ArtifactRecord> {
        if vision_text.trim().is_empty() {
            return None;
        }
        let text = vision_text.to_lowercase();

        if let Some(obj) = explicit_object_id(&text).and_then(|id| self.get_by_id(id)) {
            return Some(obj);
        }

        let prefix: String = text.chars().take(50).collect();
        let text_words: Vec<&str> = text.split_whitespace().filter(|w| w.chars().count() > 3).collect();

        let mut best: Option<(&ArtifactRecord, u32)> = None;
        for obj in &self.objects {
            if obj.title.is_empty() {
                continue;
            }
            let title = obj.title.to_lowercase();
            if text.contains(&title) || title.contains(&prefix) {
                return Some(obj);
            }

            let mut score = title
                .split_whitespace()
                .filter(|w| w.chars().count() > 3)
                .filter(|tw| text_words.iter().any(|w| w.contains(tw) || tw.contains(w)))
                .count() as u32;

            if let Some(medium) = obj.medium.as_deref() {
                let head = medium.to_lowercase();
                let head = head.split(',').next().unwrap_or_default().trim();
                if !head.is_empty() && text.contains(head) {
                    score += 2;
                }
            }
            if contains_field(&text, obj.period.as_deref()) {
                score += 2;
            }
            if contains_field(&text, obj.dynasty.as_deref()) {
                score += 1;
            }
            if let Some(g) = obj.gallery_number.as_deref() {
                if text.contains(&format!("gallery {g}")) {
                    score += 3;
                }
            }

            if best.map(|(_, s)| score > s).unwrap_or(score > 0) {
                best = Some((obj, score));
            }
        }

        best.filter(|(_, s)| *s >= MIN_MATCH_SCORE).map(|(obj, _)| obj)
    }
}

fn contains_field(text: &str, field: Option<&str>) -> bool {
    field
        .filter(|f| !f.is_empty())
        .map(|f| text.contains(&f.to_lowercase()))
        .unwrap_or(false)
}

/// Parse an `object id: 12345` style reference (at least four digits).
fn explicit_object_id(text: &str) -> Option<ObjectId> {
    let mut search_from = 0;
    while let Some(pos) = text[search_from..].find("object") {
        let start = search_from + pos + "object".len();
        let mut rest = text[start..].trim_start();
        for marker in ["id", "#", "number"] {
            if let Some(stripped) = rest.strip_prefix(marker) {
                rest = stripped.trim_start();
                break;
            }
        }
        if let Some(stripped) = rest.strip_prefix(':') {
            rest = stripped.trim_start();
        }
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.len() >= 4 {
            if let Ok(id) = digits.parse() {
                return Some(id);
            }
        }
        search_from = start;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::from_records(vec![
            ArtifactRecord::new(544001, "Heart Scarab of Hatnefer")
                .with_gallery("117")
                .with_medium("Serpentinite, gold")
                .with_period("New Kingdom")
                .with_tags(["Scarabs", "Amulets"])
                .with_image("https://images.example/544001.jpg"),
            ArtifactRecord::new(544002, "Coffin of Khnumhotep")
                .with_gallery("111")
                .with_medium("Wood, paint")
                .with_period("Middle Kingdom")
                .with_tags(["Coffins"]),
            ArtifactRecord::new(544003, "Cosmetic Spoon")
                .with_gallery("9")
                .with_dynasty("Dynasty 18")
                .with_image("https://images.example/544003.jpg"),
            ArtifactRecord::new(544001, "Duplicate id"),
        ])
    }

    #[test]
    fn test_indexes_and_duplicates() {
        let catalog = sample();
        assert!(catalog.is_loaded());
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.get_by_id(544001).map(|a| a.title.as_str()),
            Some("Heart Scarab of Hatnefer")
        );
        assert_eq!(catalog.get_by_gallery("111").len(), 1);
        assert!(catalog.get_by_gallery("200").is_empty());
    }

    #[test]
    fn test_empty_catalog_is_unloaded() {
        let catalog = Catalog::empty();
        assert!(!catalog.is_loaded());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_gallery_ordering() {
        let catalog = sample();
        assert_eq!(catalog.galleries(), vec!["9", "111", "117"]);
        assert_eq!(catalog.egyptian_galleries(), vec!["111", "117"]);
    }

    #[test]
    fn test_search_filters() {
        let catalog = sample();
        assert_eq!(catalog.search("scarab", &SearchOptions::default()).len(), 1);
        assert_eq!(catalog.search("", &SearchOptions::default().with_images()).len(), 2);
        assert_eq!(
            catalog
                .search("", &SearchOptions::default().in_period("kingdom"))
                .len(),
            2
        );
        assert_eq!(
            catalog
                .search("", &SearchOptions::default().in_dynasty("18"))
                .len(),
            1
        );
        assert_eq!(catalog.search("", &SearchOptions::default().with_limit(1)).len(), 1);
    }

    #[test]
    fn test_search_by_tags() {
        let catalog = sample();
        let found = catalog.search_by_tags(&["coffin"], &SearchOptions::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].object_id, 544002);
    }

    #[test]
    fn test_results_outlive_options() {
        let catalog = sample();
        let in_gallery = {
            let options = SearchOptions::default().in_gallery("117");
            catalog.search("", &options)
        };
        let tagged = {
            let options = SearchOptions::default().with_images();
            catalog.search_by_tags(&["amulet"], &options)
        };
        assert_eq!(in_gallery.len(), 1);
        assert_eq!(in_gallery[0].object_id, 544001);
        assert_eq!(tagged, in_gallery);
    }

    #[test]
    fn test_has_image() {
        let mut record = ArtifactRecord::new(1, "Bowl");
        assert!(!record.has_image());
        record.image_file = Some(String::new());
        assert!(!record.has_image());
        record.image_file = Some("1.jpg".to_string());
        assert!(record.has_image());
    }

    #[test]
    fn test_describe_artifact() {
        let catalog = sample();
        let text = Catalog::describe_artifact(catalog.get_by_id(544001).unwrap());
        assert!(text.starts_with("Title: Heart Scarab of Hatnefer"));
        assert!(text.contains("Gallery: 117"));
        assert!(text.contains("Period: New Kingdom"));
    }

    #[test]
    fn test_find_match_by_explicit_id() {
        let catalog = sample();
        let found = catalog.find_match("This looks like Object ID: 544002 from the collection");
        assert_eq!(found.map(|a| a.object_id), Some(544002));
    }

    #[test]
    fn test_find_match_by_title() {
        let catalog = sample();
        let found = catalog.find_match("I believe this is the heart scarab of hatnefer.");
        assert_eq!(found.map(|a| a.object_id), Some(544001));
    }

    #[test]
    fn test_find_match_by_score() {
        let catalog = sample();
        let found = catalog.find_match("a painted wooden khnumhotep coffin from the middle kingdom");
        assert_eq!(found.map(|a| a.object_id), Some(544002));
        assert!(catalog.find_match("nothing relevant here at all").is_none());
        assert!(catalog.find_match("   ").is_none());
    }
}
