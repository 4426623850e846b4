use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Har {
    pub log: Log,
}

#[derive(Debug, Serialize)]
pub struct Log {
    pub version: String,
    pub creator: Creator,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Serialize)]
pub struct Creator {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub started_date_time: DateTime<Utc>,
    pub time: f64,
    pub request: Request,
    pub response: Response,
    pub cache: Cache,
    pub timings: Timings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub method: String,
    pub url: String,
    pub http_version: String,
    pub cookies: Vec<Cookie>,
    pub headers: Vec<Header>,
    pub query_string: Vec<QueryParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<PostData>,
    pub headers_size: i64,
    pub body_size: i64,
}

/// Placeholder response for requests that were described, never sent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub http_version: String,
    pub cookies: Vec<Cookie>,
    pub headers: Vec<Header>,
    pub content: Content,
    pub redirect_url: String,
    pub headers_size: i64,
    pub body_size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: &str, value: &str) -> Self {
        Header {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Param>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub size: i64,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
pub struct Cache {}

#[derive(Debug, Serialize)]
pub struct Timings {
    pub blocked: i64,
    pub dns: i64,
    pub connect: i64,
    pub send: i64,
    pub wait: i64,
    pub receive: i64,
    pub ssl: i64,
}

impl Default for Timings {
    // send, wait and receive may not be -1 in HAR 1.2.
    fn default() -> Self {
        Timings {
            blocked: -1,
            dns: -1,
            connect: -1,
            send: 0,
            wait: 0,
            receive: 0,
            ssl: -1,
        }
    }
}

impl Response {
    pub fn unsent(http_version: &str) -> Self {
        Response {
            status: 0,
            status_text: String::new(),
            http_version: http_version.to_string(),
            cookies: Vec::new(),
            headers: Vec::new(),
            content: Content {
                size: 0,
                mime_type: String::new(),
            },
            redirect_url: String::new(),
            headers_size: -1,
            body_size: -1,
        }
    }
}

impl Har {
    pub fn new() -> Self {
        Har {
            log: Log {
                version: "1.2".to_string(),
                creator: Creator {
                    name: "curl2har".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                entries: Vec::new(),
            },
        }
    }

    /// Wrap requests in a full archive, one entry each, all stamped `started`.
    pub fn from_requests(requests: Vec<Request>, started: DateTime<Utc>) -> Self {
        let mut har = Har::new();
        for request in requests {
            har.add_request(request, started);
        }
        har
    }

    pub fn add_request(&mut self, request: Request, started: DateTime<Utc>) {
        let response = Response::unsent(&request.http_version);
        self.log.entries.push(Entry {
            started_date_time: started,
            time: 0.0,
            request,
            response,
            cache: Cache {},
            timings: Timings::default(),
        });
    }
}

impl Default for Har {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    fn default_datetime() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()
    }

    fn get_request(url: &str) -> Request {
        Request {
            method: "GET".to_string(),
            url: url.to_string(),
            http_version: "HTTP/1.1".to_string(),
            cookies: vec![],
            headers: vec![Header::new("Host", "example.com")],
            query_string: vec![],
            post_data: None,
            headers_size: -1,
            body_size: -1,
        }
    }

    #[test]
    fn test_empty_har_output() {
        let har = Har::new();
        let json_str = serde_json::to_string(&har).unwrap();
        let parsed: Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["log"]["version"], "1.2");
        assert_eq!(parsed["log"]["creator"]["name"], "curl2har");
        assert!(parsed["log"]["entries"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_request_field_names() {
        let parsed = serde_json::to_value(get_request("http://example.com")).unwrap();

        assert_eq!(parsed["method"], "GET");
        assert_eq!(parsed["httpVersion"], "HTTP/1.1");
        assert_eq!(parsed["headersSize"], -1);
        assert_eq!(parsed["bodySize"], -1);
        assert!(parsed["queryString"].as_array().unwrap().is_empty());
        assert!(parsed["cookies"].as_array().unwrap().is_empty());
        assert!(parsed.get("postData").is_none());
    }

    #[test]
    fn test_post_data_serialization() {
        let mut request = get_request("http://example.com/upload");
        request.post_data = Some(PostData {
            mime_type: "multipart/form-data".to_string(),
            text: None,
            params: Some(vec![Param {
                name: "avatar".to_string(),
                value: None,
                file_name: Some("photo.png".to_string()),
                content_type: Some("image/png".to_string()),
            }]),
        });

        let parsed = serde_json::to_value(&request).unwrap();
        let post_data = &parsed["postData"];
        assert_eq!(post_data["mimeType"], "multipart/form-data");
        assert!(post_data.get("text").is_none());
        assert_eq!(post_data["params"][0]["fileName"], "photo.png");
        assert_eq!(post_data["params"][0]["contentType"], "image/png");
        assert!(post_data["params"][0].get("value").is_none());
    }

    #[test]
    fn test_from_requests() {
        let har = Har::from_requests(
            vec![
                get_request("http://example.com/page0"),
                get_request("http://example.com/page1"),
            ],
            default_datetime(),
        );

        assert_eq!(har.log.entries.len(), 2);

        let parsed = serde_json::to_value(&har).unwrap();
        let entry = &parsed["log"]["entries"][1];
        assert_eq!(entry["request"]["url"], "http://example.com/page1");
        assert_eq!(entry["startedDateTime"], "1970-01-01T00:00:00Z");
        assert_eq!(entry["response"]["status"], 0);
        assert_eq!(entry["response"]["httpVersion"], "HTTP/1.1");
        assert_eq!(entry["timings"]["wait"], 0);
        assert_eq!(entry["timings"]["ssl"], -1);
    }
}
