use thiserror::Error;
use url::form_urlencoded;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub const APPLICATION_JSON: &str = "application/json";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurlError {
    #[error("Option {flag} requires a value")]
    MissingValue { flag: String },
    #[error("No URL specified")]
    MissingUrl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpVersion {
    #[default]
    Http11,
    Http2,
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http11 => "HTTP/1.1",
            HttpVersion::Http2 => "HTTP/2",
        }
    }
}

/// `disabled` comes from `-H "Name:"`: it suppresses the default and is never sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
    pub disabled: bool,
}

impl Header {
    pub fn new(name: &str, value: &str) -> Self {
        Header {
            name: name.to_string(),
            value: value.to_string(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    pub mime_type: Option<String>,
    pub text: Option<String>,
    pub params: Option<Vec<FormField>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authentication {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<Header>,
    pub parameters: Vec<Parameter>,
    pub body: Option<Body>,
    pub cookies: Option<String>,
    pub authentication: Authentication,
    pub http_version: HttpVersion,
}

fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a Header> {
    headers.iter().find(|h| h.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataKind {
    Plain,
    UrlEncode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Request,
    Url,
    Header,
    Data(DataKind),
    UrlQuery,
    Json,
    Form,
    FormString,
    Get,
    User,
    Cookie,
    Http2,
    Http11,
    UserAgent,
    Referer,
    Compressed,
    Head,
    UploadFile,
    Ignored { takes_value: bool },
}

impl Flag {
    fn takes_value(&self) -> bool {
        match self {
            Flag::Get | Flag::Http2 | Flag::Http11 | Flag::Compressed | Flag::Head => false,
            Flag::Ignored { takes_value } => *takes_value,
            _ => true,
        }
    }
}

const IGNORED_VALUE: Flag = Flag::Ignored { takes_value: true };

const LONG_FLAGS: &[(&str, Flag)] = &[
    ("request", Flag::Request),
    ("url", Flag::Url),
    ("header", Flag::Header),
    ("data", Flag::Data(DataKind::Plain)),
    ("data-ascii", Flag::Data(DataKind::Plain)),
    ("data-raw", Flag::Data(DataKind::Plain)),
    ("data-binary", Flag::Data(DataKind::Plain)),
    ("data-urlencode", Flag::Data(DataKind::UrlEncode)),
    ("url-query", Flag::UrlQuery),
    ("json", Flag::Json),
    ("form", Flag::Form),
    ("form-string", Flag::FormString),
    ("get", Flag::Get),
    ("user", Flag::User),
    ("cookie", Flag::Cookie),
    ("http2", Flag::Http2),
    ("http2-prior-knowledge", Flag::Http2),
    ("http1.1", Flag::Http11),
    ("http1.0", Flag::Http11),
    ("user-agent", Flag::UserAgent),
    ("referer", Flag::Referer),
    ("compressed", Flag::Compressed),
    ("head", Flag::Head),
    ("upload-file", Flag::UploadFile),
    ("output", IGNORED_VALUE),
    ("output-dir", IGNORED_VALUE),
    ("max-time", IGNORED_VALUE),
    ("connect-timeout", IGNORED_VALUE),
    ("write-out", IGNORED_VALUE),
    ("proxy", IGNORED_VALUE),
    ("proxy-user", IGNORED_VALUE),
    ("preproxy", IGNORED_VALUE),
    ("retry", IGNORED_VALUE),
    ("retry-delay", IGNORED_VALUE),
    ("retry-max-time", IGNORED_VALUE),
    ("config", IGNORED_VALUE),
    ("cookie-jar", IGNORED_VALUE),
    ("cacert", IGNORED_VALUE),
    ("capath", IGNORED_VALUE),
    ("cert", IGNORED_VALUE),
    ("cert-type", IGNORED_VALUE),
    ("key", IGNORED_VALUE),
    ("key-type", IGNORED_VALUE),
    ("pass", IGNORED_VALUE),
    ("ciphers", IGNORED_VALUE),
    ("range", IGNORED_VALUE),
    ("resolve", IGNORED_VALUE),
    ("connect-to", IGNORED_VALUE),
    ("interface", IGNORED_VALUE),
    ("dns-servers", IGNORED_VALUE),
    ("limit-rate", IGNORED_VALUE),
    ("max-redirs", IGNORED_VALUE),
    ("max-filesize", IGNORED_VALUE),
    ("speed-limit", IGNORED_VALUE),
    ("speed-time", IGNORED_VALUE),
    ("time-cond", IGNORED_VALUE),
    ("dump-header", IGNORED_VALUE),
    ("trace", IGNORED_VALUE),
    ("trace-ascii", IGNORED_VALUE),
    ("stderr", IGNORED_VALUE),
    ("netrc-file", IGNORED_VALUE),
    ("unix-socket", IGNORED_VALUE),
    ("abstract-unix-socket", IGNORED_VALUE),
    ("oauth2-bearer", IGNORED_VALUE),
    ("aws-sigv4", IGNORED_VALUE),
    ("expect100-timeout", IGNORED_VALUE),
    ("keepalive-time", IGNORED_VALUE),
    ("proxy-header", IGNORED_VALUE),
    ("noproxy", IGNORED_VALUE),
    ("request-target", IGNORED_VALUE),
    ("proto", IGNORED_VALUE),
    ("proto-default", IGNORED_VALUE),
    ("proto-redir", IGNORED_VALUE),
    ("tls-max", IGNORED_VALUE),
    ("variable", IGNORED_VALUE),
    ("expand-url", IGNORED_VALUE),
    ("parallel-max", IGNORED_VALUE),
    ("local-port", IGNORED_VALUE),
    ("happy-eyeballs-timeout-ms", IGNORED_VALUE),
    ("pinnedpubkey", IGNORED_VALUE),
    ("crlfile", IGNORED_VALUE),
    ("engine", IGNORED_VALUE),
    ("hostpubmd5", IGNORED_VALUE),
    ("hostpubsha256", IGNORED_VALUE),
    ("login-options", IGNORED_VALUE),
    ("sasl-authzid", IGNORED_VALUE),
    ("socks4", IGNORED_VALUE),
    ("socks4a", IGNORED_VALUE),
    ("socks5", IGNORED_VALUE),
    ("socks5-hostname", IGNORED_VALUE),
    ("tls13-ciphers", IGNORED_VALUE),
    ("curves", IGNORED_VALUE),
    ("create-file-mode", IGNORED_VALUE),
    ("mail-from", IGNORED_VALUE),
    ("mail-rcpt", IGNORED_VALUE),
    ("ftp-port", IGNORED_VALUE),
    ("quote", IGNORED_VALUE),
    ("continue-at", IGNORED_VALUE),
    ("telnet-option", IGNORED_VALUE),
];

const SHORT_FLAGS: &[(char, Flag)] = &[
    ('X', Flag::Request),
    ('H', Flag::Header),
    ('d', Flag::Data(DataKind::Plain)),
    ('F', Flag::Form),
    ('G', Flag::Get),
    ('u', Flag::User),
    ('b', Flag::Cookie),
    ('A', Flag::UserAgent),
    ('e', Flag::Referer),
    ('I', Flag::Head),
    ('T', Flag::UploadFile),
    ('0', Flag::Http11),
    ('o', IGNORED_VALUE),
    ('m', IGNORED_VALUE),
    ('w', IGNORED_VALUE),
    ('x', IGNORED_VALUE),
    ('U', IGNORED_VALUE),
    ('K', IGNORED_VALUE),
    ('c', IGNORED_VALUE),
    ('E', IGNORED_VALUE),
    ('r', IGNORED_VALUE),
    ('y', IGNORED_VALUE),
    ('Y', IGNORED_VALUE),
    ('z', IGNORED_VALUE),
    ('D', IGNORED_VALUE),
    ('t', IGNORED_VALUE),
    ('Q', IGNORED_VALUE),
    ('C', IGNORED_VALUE),
    ('P', IGNORED_VALUE),
];

fn lookup_long(name: &str) -> Option<Flag> {
    LONG_FLAGS
        .iter()
        .find(|(long, _)| *long == name)
        .map(|(_, flag)| *flag)
}

fn lookup_short(c: char) -> Option<Flag> {
    SHORT_FLAGS
        .iter()
        .find(|(short, _)| *short == c)
        .map(|(_, flag)| *flag)
}

pub fn parse_args(args: &[String]) -> Result<CurlRequest, CurlError> {
    let mut builder = RequestBuilder::default();
    let mut iter = args.iter().skip(1);
    let mut options_done = false;

    while let Some(arg) = iter.next() {
        if options_done || arg == "-" || !arg.starts_with('-') {
            builder.positional(arg);
            continue;
        }

        if arg == "--" {
            options_done = true;
            continue;
        }

        if let Some(long) = arg.strip_prefix("--") {
            if let Some(flag) = lookup_long(long) {
                if flag.takes_value() {
                    let value = iter.next().ok_or_else(|| missing_value(arg))?;
                    builder.apply_value(flag, value);
                } else {
                    builder.apply_switch(flag);
                }
                continue;
            }

            tracing::debug!(flag = %arg, "ignoring unsupported option");
            continue;
        }

        let shorts = &arg[1..];
        for (i, c) in shorts.char_indices() {
            let Some(flag) = lookup_short(c) else {
                tracing::debug!(flag = %c, "ignoring unsupported option");
                continue;
            };

            if !flag.takes_value() {
                builder.apply_switch(flag);
                continue;
            }

            let attached = &shorts[i + c.len_utf8()..];
            if attached.is_empty() {
                let value = iter.next().ok_or_else(|| missing_value(&format!("-{c}")))?;
                builder.apply_value(flag, value);
            } else {
                builder.apply_value(flag, attached);
            }
            break;
        }
    }

    builder.finish()
}

fn missing_value(flag: &str) -> CurlError {
    CurlError::MissingValue {
        flag: flag.to_string(),
    }
}

#[derive(Debug, Default)]
struct RequestBuilder {
    method: Option<String>,
    url: Option<String>,
    headers: Vec<Header>,
    data: Vec<String>,
    url_query: Vec<String>,
    json: Option<String>,
    form: Vec<FormField>,
    get: bool,
    head: bool,
    upload: bool,
    compressed: bool,
    authentication: Authentication,
    cookies: Option<String>,
    http_version: HttpVersion,
}

impl RequestBuilder {
    fn positional(&mut self, arg: &str) {
        if self.url.is_none() {
            self.url = Some(arg.to_string());
        } else {
            tracing::debug!(url = %arg, "ignoring additional URL");
        }
    }

    fn apply_switch(&mut self, flag: Flag) {
        match flag {
            Flag::Get => self.get = true,
            Flag::Head => self.head = true,
            Flag::Compressed => self.compressed = true,
            Flag::Http2 => self.http_version = HttpVersion::Http2,
            Flag::Http11 => self.http_version = HttpVersion::Http11,
            _ => {}
        }
    }

    fn apply_value(&mut self, flag: Flag, value: &str) {
        match flag {
            Flag::Request => self.method = Some(value.to_string()),
            Flag::Url => self.positional(value),
            Flag::Header => self.header(value),
            Flag::Data(kind) => self.data.push(encode_data(kind, value)),
            Flag::UrlQuery => self.url_query.push(encode_url_query(value)),
            Flag::Json => self.json = Some(value.to_string()),
            Flag::Form => self.form.push(parse_form_field(value, true)),
            Flag::FormString => self.form.push(parse_form_field(value, false)),
            Flag::User => {
                self.authentication = match value.split_once(':') {
                    Some((user, pass)) => Authentication {
                        username: Some(user.to_string()),
                        password: Some(pass.to_string()),
                    },
                    None => Authentication {
                        username: Some(value.to_string()),
                        password: None,
                    },
                }
            }
            Flag::Cookie => {
                if value.contains('=') {
                    self.cookies = Some(value.to_string());
                } else {
                    tracing::debug!(file = %value, "ignoring cookie file");
                }
            }
            Flag::UserAgent => self.headers.push(Header::new("User-Agent", value)),
            Flag::Referer => {
                let referer = value.strip_suffix(";auto").unwrap_or(value);
                if !referer.is_empty() {
                    self.headers.push(Header::new("Referer", referer));
                }
            }
            Flag::UploadFile => self.upload = true,
            _ => {}
        }
    }

    fn header(&mut self, raw: &str) {
        if let Some((name, value)) = raw.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() {
                return;
            }
            self.headers.push(Header {
                name: name.to_string(),
                value: value.to_string(),
                disabled: value.is_empty(),
            });
        } else if let Some(name) = raw.trim().strip_suffix(';') {
            self.headers.push(Header::new(name.trim(), ""));
        } else {
            tracing::debug!(header = %raw, "ignoring malformed header");
        }
    }

    fn content_type(&self) -> Option<String> {
        find_header(&self.headers, "Content-Type").map(|h| h.value.clone())
    }

    fn finish(mut self) -> Result<CurlRequest, CurlError> {
        let url = self.url.take().ok_or(CurlError::MissingUrl)?;
        let url = if has_scheme(&url) {
            url
        } else {
            format!("http://{url}")
        };

        let has_body = !self.data.is_empty() || self.json.is_some() || !self.form.is_empty();
        let method = match self.method.take() {
            Some(method) => method,
            None if self.head => "HEAD".to_string(),
            None if self.get => "GET".to_string(),
            None if self.upload => "PUT".to_string(),
            None if has_body => "POST".to_string(),
            None => "GET".to_string(),
        };

        let mut parameters: Vec<Parameter> =
            self.url_query.iter().flat_map(|piece| split_pairs(piece)).collect();
        let mut body = None;

        if let Some(json) = self.json.take() {
            body = Some(Body {
                mime_type: Some(self.content_type().unwrap_or_else(|| APPLICATION_JSON.to_string())),
                text: Some(json),
                params: None,
            });
            if find_header(&self.headers, "Accept").is_none() {
                self.headers.push(Header::new("Accept", APPLICATION_JSON));
            }
        } else if !self.form.is_empty() {
            body = Some(Body {
                mime_type: Some(self.content_type().unwrap_or_else(|| MULTIPART_FORM_DATA.to_string())),
                text: None,
                params: Some(std::mem::take(&mut self.form)),
            });
        }

        if !self.data.is_empty() {
            if self.get {
                parameters.extend(self.data.iter().flat_map(|piece| split_pairs(piece)));
            } else if body.is_none() {
                body = Some(Body {
                    mime_type: Some(self.content_type().unwrap_or_else(|| FORM_URLENCODED.to_string())),
                    text: Some(self.data.join("&")),
                    params: None,
                });
            }
        }

        if self.compressed && find_header(&self.headers, "Accept-Encoding").is_none() {
            self.headers.push(Header::new("Accept-Encoding", "deflate, gzip"));
        }

        Ok(CurlRequest {
            method,
            url,
            headers: self.headers,
            parameters,
            body,
            cookies: self.cookies,
            authentication: self.authentication,
            http_version: self.http_version,
        })
    }
}

fn encode_data(kind: DataKind, value: &str) -> String {
    if kind != DataKind::UrlEncode {
        return value.to_string();
    }

    match value.split_once('=') {
        Some(("", content)) => form_encode(content),
        Some((name, content)) => format!("{}={}", name, form_encode(content)),
        None => form_encode(value),
    }
}

// `--url-query` encodes like `--data-urlencode`; a leading `+` means already encoded.
fn encode_url_query(value: &str) -> String {
    match value.strip_prefix('+') {
        Some(raw) => raw.to_string(),
        None => encode_data(DataKind::UrlEncode, value),
    }
}

// A scheme is `[A-Za-z][A-Za-z0-9+.-]*` directly followed by `://`.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn form_encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn form_decode(s: &str) -> String {
    let escaped = s.replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_default()
}

fn split_pairs(data: &str) -> Vec<Parameter> {
    data.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => Parameter {
                name: form_decode(name),
                value: Some(form_decode(value)),
            },
            None => Parameter {
                name: form_decode(pair),
                value: None,
            },
        })
        .collect()
}

/// `-F name=value`, `-F name=@path;type=mime` or `--form-string name=value`.
fn parse_form_field(raw: &str, allow_files: bool) -> FormField {
    let (name, value) = raw.split_once('=').unwrap_or((raw, ""));
    let mut field = FormField {
        name: name.to_string(),
        value: None,
        file_name: None,
        content_type: None,
    };

    if !allow_files {
        field.value = Some(value.to_string());
        return field;
    }

    let mut parts = value.split(';');
    let content = parts.next().unwrap_or("");
    for attr in parts {
        if let Some(mime) = attr.trim().strip_prefix("type=") {
            field.content_type = Some(mime.to_string());
        }
    }

    match content.strip_prefix('@').or_else(|| content.strip_prefix('<')) {
        Some(path) => field.file_name = Some(path.to_string()),
        None => field.value = Some(content.to_string()),
    }

    field
}
