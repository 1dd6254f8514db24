//! Shared types between the book server and the reader UI
//!
//! These types are used by both:
//! - axum handlers and SQLite models (native Rust)
//! - the annotation widget and sync client (WASM)
//!
//! Serializable with serde for JSON and form bodies over HTTP

use serde::{Deserialize, Serialize};

// ============================================================================
// Page Identity
// ============================================================================

/// Section value marking a chapter-level page (no specific section).
pub const CHAPTER_LEVEL_SECTION: i64 = -1;

/// Address of a page of book content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    pub chapter: i64,
    pub section: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    Preface,
    Chapter { chapter: i64 },
    Section { chapter: i64, section: i64 },
    /// Generated pages (search, user profile) that have no book content.
    Special,
}

impl PageKey {
    pub const HOME: PageKey = PageKey {
        chapter: 0,
        section: 0,
    };
    pub const PREFACE: PageKey = PageKey {
        chapter: 0,
        section: 1,
    };

    pub fn new(chapter: i64, section: i64) -> Self {
        Self { chapter, section }
    }

    pub fn chapter_level(chapter: i64) -> Self {
        Self::new(chapter, CHAPTER_LEVEL_SECTION)
    }

    pub fn kind(&self) -> PageKind {
        match (self.chapter, self.section) {
            (0, 0) => PageKind::Home,
            (0, 1) => PageKind::Preface,
            (c, s) if c > 0 && s <= 0 => PageKind::Chapter { chapter: c },
            (c, s) if c > 0 => PageKind::Section {
                chapter: c,
                section: s,
            },
            _ => PageKind::Special,
        }
    }

    /// Identifier of the content fragment rendered into `#main-content`.
    pub fn content_id(&self) -> Option<String> {
        match self.kind() {
            PageKind::Home => Some("index".to_string()),
            PageKind::Preface => Some("preface".to_string()),
            PageKind::Chapter { chapter } => Some(format!("chapter{chapter}")),
            PageKind::Section { chapter, section } => {
                Some(format!("chapter{chapter}section{section}"))
            }
            PageKind::Special => None,
        }
    }

    /// Canonical route of the page.
    pub fn path(&self) -> Option<String> {
        match self.kind() {
            PageKind::Home => Some("/".to_string()),
            PageKind::Preface => Some("/preface".to_string()),
            PageKind::Chapter { chapter } => Some(format!("/chapter/{chapter}")),
            PageKind::Section { chapter, section } => {
                Some(format!("/chapter/{chapter}/section/{section}"))
            }
            PageKind::Special => None,
        }
    }

    /// Title shown at the top of a content page, e.g. `1.4. Cloud Computing`.
    pub fn heading_title(&self, title: &str) -> String {
        match self.kind() {
            PageKind::Chapter { chapter } => format!("{chapter}. {title}"),
            PageKind::Section { chapter, section } => format!("{chapter}.{section}. {title}"),
            _ => title.to_string(),
        }
    }

    /// Title used in listings such as the profile page, e.g. `1.0 Introduction`.
    pub fn listing_title(&self, title: &str) -> String {
        match self.kind() {
            PageKind::Chapter { chapter } => format!("{chapter}.0 {title}"),
            PageKind::Section { chapter, section } => format!("{chapter}.{section} {title}"),
            _ => title.to_string(),
        }
    }

    /// Section-number label rendered next to the heading (`1.`, `1.1.`).
    pub fn number_label(&self) -> Option<String> {
        match self.kind() {
            PageKind::Chapter { chapter } => Some(format!("{chapter}.")),
            PageKind::Section { chapter, section } => Some(format!("{chapter}.{section}.")),
            _ => None,
        }
    }
}

// ============================================================================
// Annotation Payload
// ============================================================================

/// Style tag for annotations made outside highlight mode.
pub const DEFAULT_ANNOTATION_STYLE: &str = "default-annotation";

/// One annotation object as produced by the browser annotation engine.
///
/// Only the fields the reader touches are typed; everything else the engine
/// emits is carried through `extra` so a save/load cycle does not drop it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Always written, even when empty: the engine expects an array.
    #[serde(default)]
    pub body: Vec<AnnotationBody>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub target: serde_json::Value,
    /// Highlight class or `default-annotation`; persisted with the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnnotationBody {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Annotation {
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.bodies_with_purpose("commenting")
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.bodies_with_purpose("tagging")
    }

    fn bodies_with_purpose<'a>(&'a self, purpose: &'a str) -> impl Iterator<Item = &'a str> {
        self.body
            .iter()
            .filter(move |b| b.purpose.as_deref() == Some(purpose))
            .filter_map(|b| b.value.as_deref())
    }
}

/// A user's whole annotation set for one page. The payload is its JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct AnnotationSet(pub Vec<Annotation>);

impl AnnotationSet {
    /// Parse a stored payload. Blank and `null` payloads are an empty set.
    pub fn decode(payload: &str) -> serde_json::Result<Self> {
        let trimmed = payload.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::default());
        }
        serde_json::from_str(trimmed)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Annotation> {
        self.0.iter_mut()
    }
}

/// True when a stored payload holds no annotations. Unparseable payloads
/// count as empty since the reader would load them as an empty set.
pub fn payload_is_empty(payload: &str) -> bool {
    AnnotationSet::decode(payload)
        .map(|set| set.is_empty())
        .unwrap_or(true)
}

// ============================================================================
// Highlight Palette
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightColor {
    pub name: &'static str,
    pub rgb: &'static str,
    pub class_name: &'static str,
}

pub const HIGHLIGHT_COLORS: [HighlightColor; 3] = [
    HighlightColor {
        name: "Yellow",
        rgb: "#ffff80",
        class_name: "yellow-highlight",
    },
    HighlightColor {
        name: "Green",
        rgb: "#8cff32",
        class_name: "green-highlight",
    },
    HighlightColor {
        name: "Blue",
        rgb: "#add8e6",
        class_name: "blue-highlight",
    },
];

/// Ordered highlight colors, selected by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    colors: &'static [HighlightColor],
}

impl Palette {
    pub const fn new(colors: &'static [HighlightColor]) -> Self {
        Self { colors }
    }

    pub fn get(&self, index: usize) -> Option<&'static HighlightColor> {
        self.colors.get(index)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static HighlightColor> {
        self.colors.iter()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(&HIGHLIGHT_COLORS)
    }
}

// ============================================================================
// API Types
// ============================================================================

pub const FETCH_ANNOTATIONS_PATH: &str = "/fetch_annotations";
pub const ANNOTATE_PATH: &str = "/annotate";

/// Request header carrying the anti-forgery token.
pub const CSRF_HEADER: &str = "x-csrf-token";
/// `<meta name=...>` the page renders the token into.
pub const CSRF_META_NAME: &str = "csrf-token";

/// Query string of `GET /fetch_annotations`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationQuery {
    pub chapter: i64,
    pub section: i64,
}

impl AnnotationQuery {
    pub fn page(&self) -> PageKey {
        PageKey::new(self.chapter, self.section)
    }
}

impl From<PageKey> for AnnotationQuery {
    fn from(page: PageKey) -> Self {
        Self {
            chapter: page.chapter,
            section: page.section,
        }
    }
}

/// Form body of `POST /annotate`. `annotation` is the whole serialized set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationUpload {
    pub chapter: i64,
    pub section: i64,
    pub annotation: String,
}

impl AnnotationUpload {
    pub fn page(&self) -> PageKey {
        PageKey::new(self.chapter, self.section)
    }
}

/// Response of `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeResponse {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub nickname: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_kinds() {
        assert_eq!(PageKey::HOME.kind(), PageKind::Home);
        assert_eq!(PageKey::PREFACE.kind(), PageKind::Preface);
        assert_eq!(
            PageKey::chapter_level(2).kind(),
            PageKind::Chapter { chapter: 2 }
        );
        assert_eq!(
            PageKey::new(2, 0).kind(),
            PageKind::Chapter { chapter: 2 }
        );
        assert_eq!(
            PageKey::new(1, 4).kind(),
            PageKind::Section {
                chapter: 1,
                section: 4
            }
        );
        assert_eq!(PageKey::new(-1, -1).kind(), PageKind::Special);
        assert_eq!(PageKey::new(0, -1).kind(), PageKind::Special);
    }

    #[test]
    fn test_content_ids_and_paths() {
        assert_eq!(PageKey::HOME.content_id().as_deref(), Some("index"));
        assert_eq!(PageKey::HOME.path().as_deref(), Some("/"));
        assert_eq!(PageKey::PREFACE.path().as_deref(), Some("/preface"));
        assert_eq!(
            PageKey::chapter_level(3).content_id().as_deref(),
            Some("chapter3")
        );
        assert_eq!(
            PageKey::new(1, 4).content_id().as_deref(),
            Some("chapter1section4")
        );
        assert_eq!(
            PageKey::new(1, 4).path().as_deref(),
            Some("/chapter/1/section/4")
        );
        assert_eq!(PageKey::new(-1, -1).path(), None);
    }

    #[test]
    fn test_titles() {
        let section = PageKey::new(1, 4);
        assert_eq!(section.heading_title("Cloud"), "1.4. Cloud");
        assert_eq!(section.listing_title("Cloud"), "1.4 Cloud");
        let chapter = PageKey::chapter_level(1);
        assert_eq!(chapter.heading_title("Intro"), "1. Intro");
        assert_eq!(chapter.listing_title("Intro"), "1.0 Intro");
        assert_eq!(PageKey::PREFACE.listing_title("Preface"), "Preface");
        assert_eq!(section.number_label().as_deref(), Some("1.4."));
        assert_eq!(chapter.number_label().as_deref(), Some("1."));
    }

    #[test]
    fn test_annotation_set_keeps_unknown_fields_and_style() {
        let payload = r##"[{"@context":"http://www.w3.org/ns/anno.jsonld","type":"Annotation","id":"#a1","body":[{"type":"TextualBody","value":"note","purpose":"commenting"},{"type":"TextualBody","value":"Place","purpose":"tagging"}],"target":{"selector":[{"type":"TextQuoteSelector","exact":"SaaS"}]},"style":"green-highlight"}]"##;
        let set = AnnotationSet::decode(payload).unwrap();
        assert_eq!(set.len(), 1);
        let a = &set.0[0];
        assert_eq!(a.style.as_deref(), Some("green-highlight"));
        assert_eq!(a.comments().collect::<Vec<_>>(), vec!["note"]);
        assert_eq!(a.tags().collect::<Vec<_>>(), vec!["Place"]);
        assert_eq!(a.extra["type"], "Annotation");

        let reencoded = set.encode().unwrap();
        let again = AnnotationSet::decode(&reencoded).unwrap();
        assert_eq!(set, again);
    }

    #[test]
    fn test_highlight_keeps_empty_body_array() {
        let payload = r##"[{"type":"Annotation","body":[],"id":"#h","target":{"selector":[]},"style":"yellow-highlight"}]"##;
        let reencoded = AnnotationSet::decode(payload).unwrap().encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&reencoded).unwrap();
        assert_eq!(value[0]["body"], serde_json::json!([]));
        assert_eq!(value, serde_json::from_str::<serde_json::Value>(payload).unwrap());
    }

    #[test]
    fn test_blank_and_null_payloads_are_empty() {
        assert!(AnnotationSet::decode("").unwrap().is_empty());
        assert!(AnnotationSet::decode("null").unwrap().is_empty());
        assert!(AnnotationSet::decode("[]").unwrap().is_empty());
        assert!(AnnotationSet::decode("{not json").is_err());
    }

    #[test]
    fn test_payload_is_empty() {
        assert!(payload_is_empty("[]"));
        assert!(payload_is_empty("garbage"));
        assert!(!payload_is_empty(r#"[{"id":"x"}]"#));
    }

    #[test]
    fn test_palette_order() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 3);
        assert_eq!(palette.get(0).map(|c| c.class_name), Some("yellow-highlight"));
        assert_eq!(palette.get(1).map(|c| c.name), Some("Green"));
        assert_eq!(palette.get(2).map(|c| c.rgb), Some("#add8e6"));
        assert!(palette.get(3).is_none());
    }

    #[test]
    fn test_upload_form_roundtrip_shape() {
        let upload = AnnotationUpload {
            chapter: 1,
            section: 4,
            annotation: "hello world".to_string(),
        };
        let json = serde_json::to_value(&upload).unwrap();
        assert_eq!(json["chapter"], 1);
        assert_eq!(upload.page(), PageKey::new(1, 4));
    }
}
