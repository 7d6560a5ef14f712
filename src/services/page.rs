//! The cached control page.
//!
//! Loaded once at startup and served from memory to every page request.

use std::path::Path;
use std::sync::Arc;

/// Served when the page file can't be read.
pub const ERROR_PAGE: &str = "<html><body><h1>Error loading page</h1></body></html>";

/// HTML served for every request that isn't a command.
#[derive(Clone, Debug)]
pub struct ControlPage {
    html: Arc<str>,
}

impl ControlPage {
    /// The page compiled into the binary.
    pub fn embedded() -> Self {
        Self::from_html(include_str!("../../www/index.html"))
    }

    /// Use the given HTML.
    pub fn from_html(html: &str) -> Self {
        Self { html: html.into() }
    }

    /// Read the page from disk, falling back to [`ERROR_PAGE`] if that fails.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(html) => Self::from_html(&html),
            Err(e) => {
                log::error!("[HTTP] error reading {}: {}", path.display(), e);
                Self::from_html(ERROR_PAGE)
            }
        }
    }

    /// The page body.
    #[inline]
    pub fn html(&self) -> &str {
        &self.html
    }
}

impl Default for ControlPage {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_page_has_controls() {
        let page = ControlPage::embedded();
        assert!(page.html().contains("/set?"));
    }

    #[test]
    fn missing_file_falls_back() {
        let page = ControlPage::from_file("/definitely/not/here/index.html");
        assert_eq!(page.html(), ERROR_PAGE);
    }

    #[test]
    fn reads_file() {
        let path = std::env::temp_dir().join(format!("f01-page-{}.html", std::process::id()));
        std::fs::write(&path, "<p>hi</p>").unwrap();

        let page = ControlPage::from_file(&path);

        assert_eq!(page.html(), "<p>hi</p>");
        let _ = std::fs::remove_file(path);
    }
}
