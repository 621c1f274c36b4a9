//! Server-rendered HTML pages: landing page and error page.

use axum::response::Html;

/// Title of the landing page.
pub const APP_TITLE: &str = "MQTT Tracker";

/// Escapes text for safe inclusion in HTML element content.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{}</title>\n\
         <link rel=\"stylesheet\" href=\"/style.css\">\n\
         </head>\n\
         <body>\n{body}\n</body>\n\
         </html>\n",
        escape_html(title)
    ))
}

/// Landing page: four region counters plus the broker debug log, kept up
/// to date by `/app.js` over the `/ws` channel.
#[must_use]
pub fn index() -> Html<String> {
    let regions: String = (1..=4)
        .map(|id| {
            format!(
                "<div class=\"region\" id=\"region-{id}\">\
                 <h2>Region {id}</h2><span class=\"count\">0</span></div>"
            )
        })
        .collect();

    layout(
        APP_TITLE,
        &format!(
            "<h1>{}</h1>\n\
             <section id=\"regions\">{regions}</section>\n\
             <section><h2>Broker log</h2><ul id=\"debug\"></ul></section>\n\
             <script src=\"/app.js\"></script>",
            escape_html(APP_TITLE)
        ),
    )
}

/// Error page showing `message`.
#[must_use]
pub fn error_page(message: &str) -> Html<String> {
    layout(
        "Error",
        &format!("<h1>Error</h1>\n<p class=\"error\">{}</p>", escape_html(message)),
    )
}
