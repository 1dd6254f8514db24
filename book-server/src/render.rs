//! Server-rendered page shell.
//!
//! Every page shares one layout: navigation, flash messages, the
//! `page_information` element the reader widget reads its page key from,
//! the content fragment inside `#main-content`, and the CSRF meta tag.

use axum::response::Html;
use shared_types::{Palette, PageKey, CSRF_META_NAME, DEFAULT_ANNOTATION_STYLE};

use crate::auth::session::Flash;

/// Per-request chrome around the page body.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub csrf_token: String,
    pub nickname: Option<String>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Clone)]
pub struct PageView {
    pub title: String,
    pub page: PageKey,
    /// Heading without the section number; the number goes in its own span.
    pub heading: String,
    /// Trusted HTML (content fragment or markup built with `escape_html`).
    pub body: String,
    /// Mount the annotation toolbar for this page.
    pub annotatable: bool,
}

pub fn render_page(view: &PageView, chrome: &Chrome) -> Html<String> {
    let number = view
        .page
        .number_label()
        .map(|n| format!(r#"<span class="section-number">{n}</span> "#))
        .unwrap_or_default();

    let toolbar = if view.annotatable {
        r#"<div id="main" class="reader-toolbar"></div>"#
    } else {
        ""
    };

    let scripts = if view.annotatable {
        READER_SCRIPTS
    } else {
        ""
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="{csrf_name}" content="{csrf}">
  <title>{title}</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@recogito/recogito-js@1.8.2/dist/recogito.min.css">
  <style>
{base_css}
{highlight_css}
  </style>
</head>
<body>
{nav}
{flashes}
<div class="page_information" data-chapter="{chapter}" data-section="{section}"></div>
<main>
  <h1>{number}{heading}</h1>
  {toolbar}
  <div id="main-content">
{body}
  </div>
</main>
{scripts}
</body>
</html>
"#,
        csrf_name = CSRF_META_NAME,
        csrf = escape_html(&chrome.csrf_token),
        title = escape_html(&view.title),
        base_css = BASE_CSS,
        highlight_css = highlight_css(&Palette::default()),
        nav = render_nav(chrome),
        flashes = render_flashes(&chrome.flashes),
        chapter = view.page.chapter,
        section = view.page.section,
        number = number,
        heading = escape_html(&view.heading),
        toolbar = toolbar,
        body = view.body,
        scripts = scripts,
    ))
}

fn render_nav(chrome: &Chrome) -> String {
    let account = match &chrome.nickname {
        Some(nickname) => format!(
            r#"<a href="/user/profile">{name}</a>
    <form method="post" action="/auth/logout" class="inline">
      <input type="hidden" name="authenticity_token" value="{csrf}">
      <button type="submit">Sign out</button>
    </form>"#,
            name = escape_html(nickname),
            csrf = escape_html(&chrome.csrf_token),
        ),
        None => r#"<a href="/auth/github">Sign in with GitHub</a>"#.to_string(),
    };

    format!(
        r#"<nav>
  <a href="/">Home</a>
  <a href="/preface">Preface</a>
  <form method="get" action="/search" class="inline">
    <input type="search" name="q" placeholder="Search the book">
  </form>
  <span class="account">
    {account}
  </span>
</nav>"#
    )
}

fn render_flashes(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="flash {}">{}</div>"#,
                f.css_class(),
                escape_html(f.message())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// CSS classes the annotation engine stamps on highlighted spans.
pub fn highlight_css(palette: &Palette) -> String {
    let mut css: Vec<String> = palette
        .iter()
        .map(|c| {
            format!(
                ".r6o-annotation.{cls}, .highlight_button.{cls} {{ background-color: {rgb}; border-bottom: none; }}",
                cls = c.class_name,
                rgb = c.rgb
            )
        })
        .collect();
    css.push(format!(
        ".r6o-annotation.{DEFAULT_ANNOTATION_STYLE} {{ background-color: transparent; border-bottom: 2px solid #f0ad4e; }}"
    ));
    css.join("\n")
}

/// Render a list of links, used by the search and profile pages.
pub fn link_list(items: &[(String, String)], empty_message: &str) -> String {
    if items.is_empty() {
        return format!(r#"<p class="empty">{}</p>"#, escape_html(empty_message));
    }
    let entries = items
        .iter()
        .map(|(title, href)| {
            format!(
                r#"  <li><a href="{}">{}</a></li>"#,
                escape_html(href),
                escape_html(title)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("<ul class=\"page-list\">\n{entries}\n</ul>")
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

static READER_SCRIPTS: &str = r#"<script src="https://cdn.jsdelivr.net/npm/@recogito/recogito-js@1.8.2/dist/recogito.min.js"></script>
<script type="module">
  import init from '/wasm/reader-ui.js';
  init('/wasm/reader-ui_bg.wasm');
</script>"#;

static BASE_CSS: &str = r#"    *, *::before, *::after { box-sizing: border-box; }
    body { margin: 0; font-family: Georgia, serif; color: #1f2933; background: #fdfdfb; }
    nav { display: flex; gap: 1rem; align-items: center; padding: .75rem 1.5rem;
          background: #2c3e50; font-family: system-ui, sans-serif; font-size: .9rem; }
    nav a { color: #ecf0f1; text-decoration: none; }
    nav .account { margin-left: auto; display: flex; gap: .75rem; align-items: center; }
    nav button { background: none; border: 1px solid #ecf0f1; color: #ecf0f1;
                 border-radius: 4px; cursor: pointer; }
    form.inline { display: inline; margin: 0; }
    main { max-width: 48rem; margin: 2rem auto; padding: 0 1.5rem; line-height: 1.6; }
    .flash { max-width: 48rem; margin: 1rem auto 0; padding: .6rem 1rem; border-radius: 4px;
             font-family: system-ui, sans-serif; font-size: .9rem; }
    .flash-alert { background: #e3f9e5; color: #207227; }
    .flash-error { background: #ffe3e3; color: #8a1c1c; }
    .section-number { color: #7b8794; }
    .reader-toolbar { position: sticky; top: 0; z-index: 10; background: #fdfdfb;
                      padding: .5rem 0; font-family: system-ui, sans-serif; }
    .reader-controls { display: flex; gap: .5rem; align-items: center; }
    .reader-controls .btn { border: 1px solid #7b8794; background: #fff; border-radius: 4px;
                            padding: .25rem .75rem; cursor: pointer; }
    .reader-controls .btn.active { background: #2c3e50; color: #fff; }
    .dropdown { position: relative; }
    .dropdown-menu { position: absolute; top: 100%; left: 0; display: flex; flex-direction: column;
                     background: #fff; border: 1px solid #cbd2d9; border-radius: 4px; z-index: 20; }
    .dropdown-item { border: none; background: none; padding: .25rem .5rem; text-align: left; cursor: pointer; }
    .dropdown-item.selected { outline: 2px solid #2c3e50; }
    .sync-status { margin-left: auto; font-size: .8rem; color: #7b8794; }
    .sync-error { color: #8a1c1c; }
    .page-list { padding-left: 1.25rem; }"#;
