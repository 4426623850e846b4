use url::Url;

use crate::curl::Header;

/// The request pseudo-header fields that open every HTTP/2 header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoHeaders {
    pub method: String,
    pub scheme: String,
    pub authority: String,
    pub path: String,
}

impl PseudoHeaders {
    /// `authority` overrides the URL's own host, as a `Host` header would.
    pub fn new(method: &str, url: &Url, authority: Option<&str>) -> Self {
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        PseudoHeaders {
            method: method.to_string(),
            scheme: url.scheme().to_string(),
            authority: authority
                .map(str::to_string)
                .unwrap_or_else(|| host_with_port(url)),
            path,
        }
    }

    /// Fields in transmission order: `:method`, `:scheme`, `:authority`, `:path`.
    pub fn into_headers(self) -> Vec<Header> {
        vec![
            Header::new(":method", &self.method),
            Header::new(":scheme", &self.scheme),
            Header::new(":authority", &self.authority),
            Header::new(":path", &self.path),
        ]
    }
}

/// Host as it would appear in a `Host` header; the port is only included
/// when it differs from the scheme's default.
pub fn host_with_port(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pseudo_headers_order() {
        let url = Url::parse("https://example.com/search?q=rust").unwrap();
        let headers = PseudoHeaders::new("GET", &url, None).into_headers();

        let fields: Vec<(&str, &str)> = headers
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                (":method", "GET"),
                (":scheme", "https"),
                (":authority", "example.com"),
                (":path", "/search?q=rust"),
            ]
        );
    }

    #[test]
    fn test_pseudo_headers_default_path() {
        let url = Url::parse("http://example.com").unwrap();
        let pseudo = PseudoHeaders::new("POST", &url, None);
        assert_eq!(pseudo.path, "/");
        assert_eq!(pseudo.scheme, "http");
    }

    #[test]
    fn test_pseudo_headers_authority_override() {
        let url = Url::parse("https://10.0.0.1/").unwrap();
        let pseudo = PseudoHeaders::new("GET", &url, Some("api.example.com"));
        assert_eq!(pseudo.authority, "api.example.com");
    }

    #[test]
    fn test_host_with_port() {
        let url = Url::parse("http://localhost:3000/test.html").unwrap();
        assert_eq!(host_with_port(&url), "localhost:3000");

        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(host_with_port(&url), "example.com");
    }
}
