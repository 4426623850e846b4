use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;
use url::Url;

use crate::curl::{self, Authentication, Body, CurlError, CurlRequest, HttpVersion, Parameter};
use crate::har::{Header, Param, PostData, Request};
use crate::http2::{host_with_port, PseudoHeaders};
use crate::shell::{self, ShellError};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse cURL command: {0}")]
    Shell(#[from] ShellError),
    #[error("Failed to parse cURL command #{index}: {source}")]
    Curl { index: usize, source: CurlError },
    #[error("Invalid URL {url:?}: {source}")]
    InvalidUrl { url: String, source: url::ParseError },
    #[error("Failed to parse cURL command: no curl command found")]
    NoCommands,
}

/// Either every statement converts or the whole call fails.
pub fn parse_curl_command(input: &str) -> Result<Vec<Request>, ParseError> {
    let commands = shell::split_commands(input)?;
    if commands.is_empty() {
        return Err(ParseError::NoCommands);
    }

    let mut converter = Converter::new();
    for (i, args) in commands.iter().enumerate() {
        let request = curl::parse_args(args).map_err(|source| ParseError::Curl {
            index: i + 1,
            source,
        })?;
        converter.push(request);
    }

    converter.into_requests()
}

pub struct Converter {
    requests: Vec<CurlRequest>,
}

type Pass = fn(Draft) -> Result<Draft, ParseError>;

// Order matters: each presence check sees headers added by earlier passes.
const PASSES: &[Pass] = &[
    merge_parameters,
    apply_post_data,
    apply_accept,
    apply_host,
    apply_authorization,
    apply_cookie,
];

impl Converter {
    pub fn new() -> Self {
        Converter {
            requests: Vec::new(),
        }
    }

    pub fn push(&mut self, request: CurlRequest) {
        self.requests.push(request);
    }

    pub fn into_requests(self) -> Result<Vec<Request>, ParseError> {
        self.requests.into_iter().map(convert_request).collect()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn convert_request(request: CurlRequest) -> Result<Request, ParseError> {
    let draft = PASSES
        .iter()
        .try_fold(Draft::new(request)?, |draft, pass| pass(draft))?;
    Ok(draft.finish())
}

#[derive(Debug)]
struct Draft {
    method: String,
    url: String,
    parsed_url: Url,
    http_version: HttpVersion,
    headers: Vec<curl::Header>,
    parameters: Vec<Parameter>,
    body: Option<Body>,
    post_data: Option<PostData>,
    authentication: Authentication,
    cookies: Option<String>,
}

impl Draft {
    fn new(request: CurlRequest) -> Result<Self, ParseError> {
        let parsed_url = Url::parse(&request.url).map_err(|source| ParseError::InvalidUrl {
            url: request.url.clone(),
            source,
        })?;
        if parsed_url.host_str().is_none() {
            return Err(ParseError::InvalidUrl {
                url: request.url,
                source: url::ParseError::EmptyHost,
            });
        }

        Ok(Draft {
            method: request.method,
            url: request.url,
            parsed_url,
            http_version: request.http_version,
            headers: request.headers,
            parameters: request.parameters,
            body: request.body,
            post_data: None,
            authentication: request.authentication,
            cookies: request.cookies,
        })
    }

    // Disabled headers count as present.
    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h.name.eq_ignore_ascii_case(name))
    }

    fn enabled_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| !h.disabled && h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    fn finish(self) -> Request {
        let headers = self
            .headers
            .into_iter()
            .filter(|h| !h.disabled)
            .map(|h| Header {
                name: h.name,
                value: h.value,
            })
            .collect();

        Request {
            method: self.method,
            url: self.url,
            http_version: self.http_version.as_str().to_string(),
            cookies: Vec::new(),
            headers,
            query_string: Vec::new(),
            post_data: self.post_data,
            headers_size: -1,
            body_size: -1,
        }
    }
}

fn merge_parameters(mut draft: Draft) -> Result<Draft, ParseError> {
    if draft.parameters.is_empty() {
        return Ok(draft);
    }

    if draft.parsed_url.path().is_empty() {
        draft.parsed_url.set_path("/");
    }

    {
        let mut query = draft.parsed_url.query_pairs_mut();
        for param in &draft.parameters {
            match &param.value {
                Some(value) => query.append_pair(&param.name, value),
                None => query.append_key_only(&param.name),
            };
        }
    }

    draft.url = draft.parsed_url.to_string();
    Ok(draft)
}

fn apply_post_data(mut draft: Draft) -> Result<Draft, ParseError> {
    draft.post_data = draft.body.take().and_then(post_data_from_body);

    let mime_type = draft
        .post_data
        .as_ref()
        .map(|p| p.mime_type.clone())
        .filter(|m| !m.is_empty());

    if let Some(mime_type) = mime_type {
        if !draft.has_header("Content-Type") {
            draft.headers.push(curl::Header::new("Content-Type", &mime_type));
        }
    }

    Ok(draft)
}

fn post_data_from_body(body: Body) -> Option<PostData> {
    if body.mime_type.is_none() && body.text.is_none() && body.params.is_none() {
        return None;
    }

    let params = body.params.map(|fields| {
        fields
            .into_iter()
            .map(|f| Param {
                name: f.name,
                value: f.value,
                file_name: f.file_name,
                content_type: f.content_type,
            })
            .collect()
    });

    Some(PostData {
        mime_type: body.mime_type.unwrap_or_default(),
        text: body.text,
        params,
    })
}

fn apply_accept(mut draft: Draft) -> Result<Draft, ParseError> {
    if !draft.has_header("Accept") {
        draft.headers.insert(0, curl::Header::new("Accept", "*/*"));
    }
    Ok(draft)
}

fn apply_host(mut draft: Draft) -> Result<Draft, ParseError> {
    match draft.http_version {
        HttpVersion::Http11 => {
            if !draft.has_header("Host") {
                let host = host_with_port(&draft.parsed_url);
                draft.headers.insert(0, curl::Header::new("Host", &host));
            }
        }
        HttpVersion::Http2 => {
            let pseudo = PseudoHeaders::new(
                &draft.method,
                &draft.parsed_url,
                draft.enabled_header("Host"),
            );
            let mut headers = pseudo.into_headers();
            headers.append(&mut draft.headers);
            draft.headers = headers;
        }
    }
    Ok(draft)
}

fn apply_authorization(mut draft: Draft) -> Result<Draft, ParseError> {
    let username = draft.authentication.username.as_deref().unwrap_or_default();
    let password = draft.authentication.password.as_deref().unwrap_or_default();

    if !username.is_empty() || !password.is_empty() {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        draft
            .headers
            .push(curl::Header::new("Authorization", &format!("Basic {encoded}")));
    }
    Ok(draft)
}

fn apply_cookie(mut draft: Draft) -> Result<Draft, ParseError> {
    if let Some(cookies) = draft.cookies.take() {
        draft.headers.push(curl::Header::new("Cookie", &cookies));
    }
    Ok(draft)
}
