use crate::domain::fields::FieldMap;
use url::form_urlencoded;

/// Parses an `application/x-www-form-urlencoded` body. A repeated key keeps its last value.
pub fn parse_form_body(body: &str) -> FieldMap {
    form_urlencoded::parse(body.trim().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// An HTML page that immediately POSTs `fields` to `endpoint`.
pub fn render_forward_page(endpoint: &str, fields: &[(String, String)]) -> String {
    let inputs = fields
        .iter()
        .map(|(name, value)| {
            format!(
                r#"<input type="hidden" name="{}" value="{}"/>"#,
                escape_attribute(name),
                escape_attribute(value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Redirecting to payment</title></head>\
         <body><form id=\"f\" method=\"POST\" action=\"{}\">\n{}\n</form>\
         <script>document.getElementById('f').submit();</script></body></html>",
        escape_attribute(endpoint),
        inputs
    )
}
