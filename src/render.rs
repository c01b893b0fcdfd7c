//! Server-side HTML for the Mission to Mars page.
//!
//! Every field of the record may be missing; each one degrades to a
//! placeholder instead of failing the page.

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

use crate::models::{FactsTable, HemisphereEntry, ScrapeRecord};

/// Table classes used on the index page.
pub const FACTS_TABLE_CLASSES: &str = "table table-striped";

/// Render the index page for the stored record, if any.
pub fn index_page(record: Option<&ScrapeRecord>) -> String {
    let mut body = String::new();

    body.push_str(
        r#"<div class="container">
  <div class="jumbotron text-center">
    <h1>Mission to Mars</h1>
    <p><a class="btn btn-primary btn-lg" href="/scrape" role="button">Scrape New Data</a></p>
"#,
    );
    if let Some(record) = record {
        let _ = writeln!(
            body,
            r#"    <p class="text-muted">Last updated {}</p>"#,
            record.last_modified.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    body.push_str("  </div>\n");

    news_section(&mut body, record);
    image_and_facts_section(&mut body, record);
    hemispheres_section(&mut body, record.map(|r| r.hemispheres.as_slice()).unwrap_or(&[]));

    body.push_str("</div>\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Mission to Mars</title>
  <link rel="stylesheet" href="https://maxcdn.bootstrapcdn.com/bootstrap/3.3.7/css/bootstrap.min.css">
</head>
<body>
{}</body>
</html>
"#,
        body
    )
}

fn news_section(out: &mut String, record: Option<&ScrapeRecord>) {
    let title = record.and_then(|r| r.news_title.as_deref());
    let paragraph = record.and_then(|r| r.news_paragraph.as_deref());

    out.push_str("  <div class=\"row\" id=\"mars-news\">\n    <div class=\"col-md-12\">\n      <div class=\"media\">\n        <div class=\"media-body\">\n          <h2>Latest Mars News</h2>\n");
    match title {
        Some(title) => {
            let _ = writeln!(out, "          <h4 class=\"media-heading\">{}</h4>", encode_text(title));
        }
        None => out.push_str("          <h4 class=\"media-heading\">No news available</h4>\n"),
    }
    if let Some(paragraph) = paragraph {
        let _ = writeln!(out, "          <p>{}</p>", encode_text(paragraph));
    }
    out.push_str("        </div>\n      </div>\n    </div>\n  </div>\n");
}

fn image_and_facts_section(out: &mut String, record: Option<&ScrapeRecord>) {
    out.push_str("  <div class=\"row\" id=\"mars-featured-image\">\n    <div class=\"col-md-8\">\n      <h2>Featured Mars Image</h2>\n");
    match record.and_then(|r| r.featured_image.as_deref()) {
        Some(url) => {
            let _ = writeln!(
                out,
                "      <img src=\"{}\" class=\"img-responsive\" alt=\"Featured Mars image\">",
                encode_double_quoted_attribute(url)
            );
        }
        None => out.push_str("      <p>No featured image available</p>\n"),
    }
    out.push_str("    </div>\n    <div class=\"col-md-4\" id=\"mars-facts\">\n      <h2>Mars Facts</h2>\n");
    match record.and_then(|r| r.facts.as_ref()) {
        Some(facts) => out.push_str(&facts_table_html(facts, FACTS_TABLE_CLASSES)),
        None => out.push_str("      <p>No facts available</p>\n"),
    }
    out.push_str("    </div>\n  </div>\n");
}

fn hemispheres_section(out: &mut String, hemispheres: &[HemisphereEntry]) {
    out.push_str("  <div class=\"row\" id=\"mars-hemispheres\">\n    <div class=\"col-md-12\">\n      <h2>Mars Hemispheres</h2>\n    </div>\n");
    if hemispheres.is_empty() {
        out.push_str("    <div class=\"col-md-12\"><p>No hemisphere images available</p></div>\n");
    }
    for hemisphere in hemispheres {
        let _ = writeln!(
            out,
            r#"    <div class="col-md-3">
      <div class="thumbnail">
        <img src="{}" alt="{}">
        <div class="caption"><h3>{}</h3></div>
      </div>
    </div>"#,
            encode_double_quoted_attribute(&hemisphere.img_url),
            encode_double_quoted_attribute(&hemisphere.title),
            encode_text(&hemisphere.title)
        );
    }
    out.push_str("  </div>\n");
}

/// Facts as an HTML table indexed by description, in the layout a
/// description-indexed dataframe's `to_html` produces.
pub fn facts_table_html(table: &FactsTable, classes: &str) -> String {
    let mut html = String::new();
    let class_attr = if classes.is_empty() {
        "dataframe".to_string()
    } else {
        format!("dataframe {}", classes)
    };

    let _ = writeln!(html, "<table border=\"1\" class=\"{}\">", encode_double_quoted_attribute(&class_attr));
    html.push_str("  <thead>\n");
    html.push_str("    <tr style=\"text-align: right;\">\n      <th></th>\n      <th>Mars</th>\n      <th>Earth</th>\n    </tr>\n");
    html.push_str("    <tr>\n      <th>description</th>\n      <th></th>\n      <th></th>\n    </tr>\n");
    html.push_str("  </thead>\n  <tbody>\n");
    for row in &table.rows {
        let _ = write!(
            html,
            "    <tr>\n      <th>{}</th>\n      <td>{}</td>\n      <td>{}</td>\n    </tr>\n",
            encode_text(&row.description),
            encode_text(&row.mars),
            encode_text(&row.earth)
        );
    }
    html.push_str("  </tbody>\n</table>\n");
    html
}
