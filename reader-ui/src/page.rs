//! Reads what the server rendered into the page: which page this is and the
//! anti-forgery token.

use shared_types::{PageKey, CSRF_META_NAME};

/// Parse the `data-chapter` / `data-section` attributes of `.page_information`.
pub fn parse_page_key(chapter: Option<&str>, section: Option<&str>) -> Option<PageKey> {
    let chapter = chapter?.trim().parse().ok()?;
    let section = section?.trim().parse().ok()?;
    Some(PageKey::new(chapter, section))
}

pub fn current_page() -> Option<PageKey> {
    let element = web_sys::window()?
        .document()?
        .query_selector(".page_information")
        .ok()??;
    parse_page_key(
        element.get_attribute("data-chapter").as_deref(),
        element.get_attribute("data-section").as_deref(),
    )
}

pub fn csrf_token() -> Option<String> {
    web_sys::window()?
        .document()?
        .query_selector(&format!(r#"meta[name="{CSRF_META_NAME}"]"#))
        .ok()??
        .get_attribute("content")
        .filter(|token| !token.is_empty())
}
