//! Generative model client: "what did I draw?".

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GeminiConfig;
use crate::error::Error;

pub const ANALYSIS_PROMPT: &str = "Analyze the image and provide the following:\n\
* If a mathematical equation is present:\n   \
- The equation represented in the image.\n   \
- The solution to the equation.\n   \
- A short explanation of the steps taken to arrive at the solution.\n\
* If a drawing is present and no equation is detected:\n   \
- A brief description of the drawn image in simple terms.\n";

/// Anything that can turn a prompt plus one PNG into free text.
pub trait Analyzer {
    fn analyze(&self, prompt: &str, png: &[u8]) -> Result<String, Error>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 2],
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

fn request_body<'a>(prompt: &'a str, png: &[u8]) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: [Content {
            role: "user",
            parts: [
                RequestPart::Text { text: prompt },
                RequestPart::Inline {
                    inline_data: InlineData { mime_type: "image/png", data: STANDARD.encode(png) },
                },
            ],
        }],
    }
}

/// Text of the first candidate, parts joined in order.
fn response_text(resp: GenerateResponse) -> Result<String, Error> {
    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::Analysis("model returned no candidates".into()))?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    Ok(text)
}

/// Gemini `generateContent` over blocking HTTP.
pub struct GeminiClient {
    http: Client,
    url: String,
}

impl GeminiClient {
    /// The key is part of `cfg`, so a client can't exist without one.
    pub fn new(cfg: &GeminiConfig) -> Result<Self, Error> {
        let http = Client::builder().build()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            cfg.endpoint,
            cfg.model,
            cfg.api_key.expose()
        );
        info!(model = %cfg.model, "gemini client ready");
        Ok(Self { http, url })
    }
}

impl Analyzer for GeminiClient {
    fn analyze(&self, prompt: &str, png: &[u8]) -> Result<String, Error> {
        debug!(bytes = png.len(), "sending canvas to gemini");
        let resp = self
            .http
            .post(&self.url)
            .json(&request_body(prompt, png))
            .send()
            .map_err(|e| Error::Analysis(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Error::Analysis(format!("gemini returned {status}: {body}")));
        }
        let parsed: GenerateResponse = resp
            .json()
            .map_err(|e| Error::Analysis(format!("decode response: {}", e.without_url())))?;
        response_text(parsed)
    }
}
