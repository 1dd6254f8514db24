use gloo_net::http::Request;
use shared_types::{AnnotationQuery, PageKey, ANNOTATE_PATH, CSRF_HEADER, FETCH_ANNOTATIONS_PATH};
use web_sys::UrlSearchParams;

/// Query string for `GET /fetch_annotations`.
pub fn fetch_url(page: PageKey) -> String {
    let query = AnnotationQuery::from(page);
    format!(
        "{FETCH_ANNOTATIONS_PATH}?chapter={}&section={}",
        query.chapter, query.section
    )
}

/// Form fields for `POST /annotate`.
pub fn upload_fields(page: PageKey, payload: &str) -> [(&'static str, String); 3] {
    [
        ("chapter", page.chapter.to_string()),
        ("section", page.section.to_string()),
        ("annotation", payload.to_string()),
    ]
}

pub async fn fetch_annotations(page: PageKey, csrf_token: Option<&str>) -> Result<Option<String>, String> {
    let mut request = Request::get(&fetch_url(page)).header("Accept", "application/json");
    if let Some(token) = csrf_token {
        request = request.header(CSRF_HEADER, token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| format!("Request failed: {e}"))?;

    if !response.ok() {
        return Err(format!("HTTP error: {}", response.status()));
    }

    response
        .json::<Option<String>>()
        .await
        .map_err(|e| format!("Failed to parse JSON: {e}"))
}

pub async fn upload_annotations(
    page: PageKey,
    payload: &str,
    csrf_token: Option<&str>,
) -> Result<(), String> {
    let form = UrlSearchParams::new().map_err(|e| format!("Failed to build form: {e:?}"))?;
    for (name, value) in upload_fields(page, payload) {
        form.append(name, &value);
    }

    let mut request = Request::post(ANNOTATE_PATH);
    if let Some(token) = csrf_token {
        request = request.header(CSRF_HEADER, token);
    }

    let response = request
        .body(form)
        .map_err(|e| format!("Failed to build request: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Request failed: {e}"))?;

    if !response.ok() {
        return Err(format!("HTTP error: {}", response.status()));
    }
    Ok(())
}
