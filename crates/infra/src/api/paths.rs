//! REST URL construction for server-relative paths

/// Split a server-relative path at its last `/` into (folder, leaf).
///
/// A path without any `/` is a leaf in the root folder (`""`).
pub fn split_server_relative(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Escape a value for use inside a single-quoted OData string literal in a
/// URL path.
///
/// Single quotes are doubled. `%`, `#` and `?` are percent-encoded so they
/// stay part of the literal instead of ending the path; the URL parser
/// encodes everything else (spaces included).
pub fn odata_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("''"),
            '%' => quoted.push_str("%25"),
            '#' => quoted.push_str("%23"),
            '?' => quoted.push_str("%3F"),
            other => quoted.push(other),
        }
    }
    quoted
}

/// `<site>_api/web/getfolderbyserverrelativeurl('<folder>')`
pub fn folder_url(site_url: &str, folder: &str) -> String {
    format!("{site_url}_api/web/getfolderbyserverrelativeurl('{}')", odata_quote(folder))
}

/// `<folder url>/files('<leaf>')` for the file at `path`.
pub fn file_url(site_url: &str, path: &str) -> String {
    let (folder, leaf) = split_server_relative(path);
    format!("{}/files('{}')", folder_url(site_url, folder), odata_quote(leaf))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "https://contoso.sharepoint.com/sites/dev/";

    #[test]
    fn splits_at_last_slash() {
        assert_eq!(split_server_relative("/sites/dev/Shared Documents/a.txt"), ("/sites/dev/Shared Documents", "a.txt"));
        assert_eq!(split_server_relative("a.txt"), ("", "a.txt"));
        assert_eq!(split_server_relative("/a.txt"), ("", "a.txt"));
    }

    #[test]
    fn builds_file_url() {
        assert_eq!(
            file_url(SITE, "/sites/dev/Docs/report.pdf"),
            "https://contoso.sharepoint.com/sites/dev/_api/web/getfolderbyserverrelativeurl('/sites/dev/Docs')/files('report.pdf')"
        );
    }

    #[test]
    fn doubles_single_quotes() {
        assert_eq!(
            file_url(SITE, "/sites/dev/Bob's/it's.txt"),
            "https://contoso.sharepoint.com/sites/dev/_api/web/getfolderbyserverrelativeurl('/sites/dev/Bob''s')/files('it''s.txt')"
        );
    }

    #[test]
    fn encodes_url_delimiters_inside_literals() {
        assert_eq!(
            file_url(SITE, "/sites/dev/Docs #2/Q#1 100%?.txt"),
            "https://contoso.sharepoint.com/sites/dev/_api/web/getfolderbyserverrelativeurl('/sites/dev/Docs %232')/files('Q%231 100%25%3F.txt')"
        );
    }

    #[test]
    fn encoded_literal_survives_url_parsing() {
        let url = url::Url::parse(&file_url(SITE, "/sites/dev/Docs/Q#1 report.txt")).unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
        assert!(url.path().ends_with("/files('Q%231%20report.txt')"), "{}", url.path());
    }
}
