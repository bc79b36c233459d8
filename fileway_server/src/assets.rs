//! Embedded UI assets, mirroring the source's `//go:embed` static files.
//!
//! Out of scope for correctness per spec.md §1 (the UI is a collaborator,
//! not part of the conduit subsystem); kept intentionally small.
use axum::response::Html;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const DOWNLOAD_HTML: &str = include_str!("../assets/download.html");

/// Serves the setup/landing page at `/`.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Renders the download landing page for a non-CLI `GET /dl/:id` request.
///
/// Note: this sets `Content-Type: text/plain` upstream for text conduits
/// but the page itself is always HTML — the text/plain quirk lives in the
/// `ddl` streaming response, not here. See spec.md §9's open question about
/// `Content-Disposition: attachment` being sent alongside `text/plain`;
/// left as-is per that note.
pub fn render_download_page(filename: &str, human_size: String) -> String {
    DOWNLOAD_HTML
        .replace("{{FILENAME}}", &html_escape(filename))
        .replace("{{SIZE}}", &human_size)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_placeholders() {
        let page = render_download_page("report.pdf", "1.2 MB".to_owned());
        assert!(page.contains("report.pdf"));
        assert!(page.contains("1.2 MB"));
    }

    #[test]
    fn render_escapes_filename() {
        let page = render_download_page("<script>.txt", "1 B".to_owned());
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
