//! Link-header pagination metadata
//!
//! Only the `rel="last"` relation matters here: its `page` query parameter is
//! the total page count. A missing or malformed header means there is nothing
//! beyond the page already fetched.

/// Total page count advertised by a `link` response header.
///
/// Returns 0 when the header is absent or carries no parseable `rel="last"`
/// page number.
#[must_use]
pub fn last_page(link_header: Option<&str>) -> u32 {
    let Some(link) = link_header else {
        return 0;
    };

    for part in link.split(',') {
        if !part.contains("rel=\"last\"") {
            continue;
        }
        let url = part
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>');
        if let Some(page) = page_param(url) {
            return page;
        }
    }

    0
}

/// The `page` query parameter of a URL, if present and numeric.
fn page_param(url: &str) -> Option<u32> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == "page")
        .and_then(|(_, value)| value.parse().ok())
}
