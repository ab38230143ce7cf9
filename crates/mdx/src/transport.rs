//! # 📡 THE TRANSPORT GATEWAY
//!
//! *Previously, on Mordex...*
//!
//! 🎬 COLD OPEN — INT. SERVER ROOM — 3:47 AM
//!
//! The monitoring dashboard glows amber in the dark. One engineer, alone,
//! stares into a streaming connection that has been "temporarily degraded"
//! for six hours. The upstream offers a 503. Then a 200. Then, inexplicably,
//! half a JSON object and a TCP RST. Our hero's coffee has gone cold.
//!
//! "It's just HTTP," they whispered. "How unreliable can it be," they said.
//! "The network is reliable," someone lied, once, at a conference.
//!
//! 🚀 This module is the only place in the codebase that talks to the outside
//! world. It authenticates, it streams, it submits, it retries. It accepts
//! that the network is weather, not architecture.
//!
//! 🧠 Knowledge graph:
//! - [`ApiClient::authenticate`] returns an [`AuthSession`] *value*. The token
//!   is not squirreled away in a mutable field — it is handed back to you and
//!   threaded into every authenticated call. Calling an authenticated
//!   operation without a session isn't a runtime error; it doesn't compile.
//! - [`TranscriptStream`] is a pull-based subscription: `next()` returns
//!   `Item` or `Closed`, connection failures come back as `Err`, and dropping
//!   it cancels the underlying request. No background task to chase down.
//! - Retry policy: transient errors (network weather, 5xx, 429) back off
//!   exponentially — 1s, 2s, 4s... capped at 10s — up to `max_retries` total
//!   attempts. Anything else is permanent and fails on the spot.
//!
//! 🦆 (mandatory duck, no context provided, none shall be requested)

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::app_config::ApiConfig;
use crate::common::{ProcessedResult, Transcript};

// ⏱️ Connect timeout — if the upstream can't finish a TCP handshake in 10
// seconds, it's not having a good time and neither are we.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
// ⏱️ Health probes get a short leash. A health check that takes a minute
// has already answered the question.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
// 🔄 Backoff bounds: first wait 1s, double from there, never exceed 10s.
const BACKOFF_MIN: Duration = Duration::from_secs(1);
const BACKOFF_MAX: Duration = Duration::from_secs(10);

/// 🔑 Proof of a successful authenticate exchange — the bearer token, as a
/// value you hold and thread into calls, not a field somebody mutated.
///
/// Clone-able so every worker can carry its own copy. It's a String in a
/// trenchcoat, but it's a String the type system makes you possess.
#[derive(Clone)]
pub struct AuthSession {
    token: String,
}

impl AuthSession {
    /// 🔑 Wrap a pre-issued bearer token. The usual door is
    /// [`ApiClient::authenticate`]; this one exists for tokens minted out of
    /// band (and for tests that would rather not run an auth server).
    pub fn from_token(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// 🔑 The raw bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

// 🔒 Manual Debug so the token never wanders into a log file. Logs are
// forever. Credentials should not be.
impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession").field("token", &"<redacted>").finish()
    }
}

/// 📦 What the auth endpoint sends back. The token is optional on the wire
/// because the upstream reserves the right to say 200 and mean nothing.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: Option<String>,
}

/// 📤 One pull from the transcript stream: a transcript, or the end.
/// Connection-level trouble arrives as `Err` from [`TranscriptStream::next`],
/// not as a variant — "the stream broke" and "the stream ended" are
/// different facts and the caller gets to treat them differently.
#[derive(Debug)]
pub enum StreamEvent {
    Item(Box<Transcript>),
    Closed,
}

/// 📡 The client for the transcript service: one shared HTTP connection pool,
/// the base URL, and the retry knobs. No token inside — see [`AuthSession`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// 🚀 Build the client. The connect timeout lives on the pool; request
    /// timeouts are applied per call, because the streaming read is the one
    /// request that is *supposed* to take forever.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("💀 The HTTP client refused to be born. Probably a missing TLS cert or a cursed system OpenSSL. Either way: tragic.")?;
        Ok(Self { http, config })
    }

    /// ⏱️ Per-request timeout for unary calls, from config.
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 🔑 Exchange the API key for a bearer token.
    ///
    /// Retried on transient trouble like every other unary call. A 2xx
    /// response that omits the token is NOT retried — the upstream answered,
    /// the answer was nonsense, and retrying nonsense gets you more nonsense.
    ///
    /// 💀 Exhausted retries here are fatal to startup by contract: the caller
    /// (the supervisor) does not start a pipeline it cannot submit from.
    pub async fn authenticate(&self) -> Result<AuthSession> {
        let auth_url = self.endpoint("auth");
        let payload = serde_json::json!({ "api_key": self.config.api_key });

        let response = self
            .send_with_retry("authenticate", || {
                self.http
                    .post(&auth_url)
                    .json(&payload)
                    .timeout(self.request_timeout())
            })
            .await?;

        let auth: AuthResponse = response
            .json()
            .await
            .context("💀 The auth endpoint said 200 and then sent something that was not JSON. Bold.")?;

        match auth.token {
            Some(token) if !token.is_empty() => {
                info!("🔑 authentication succeeded");
                Ok(AuthSession { token })
            }
            _ => bail!(
                "authentication succeeded but token missing in response — the upstream \
                 opened the door, smiled, and handed us an empty envelope"
            ),
        }
    }

    /// 📡 Open the transcript stream: one long-lived GET, newline-delimited
    /// JSON, pulled through [`TranscriptStream::next`].
    ///
    /// Non-restartable. If the connection dies, `next()` errors and this
    /// subscription is spent; whether to open another one is the caller's
    /// policy, not ours.
    pub async fn stream_transcripts(&self, session: &AuthSession) -> Result<TranscriptStream> {
        let url = self.endpoint("v1/transcripts/stream");
        // ⚠️ No request timeout here. The stream is supposed to outlive any
        // deadline we could pick. The connect timeout still applies.
        let response = self
            .http
            .get(&url)
            .bearer_auth(session.token())
            .send()
            .await
            .context("💀 Could not open the transcript stream. The upstream did not pick up.")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "transcript stream refused with status {status}: '{body}'. \
                 We knocked. The door stayed shut."
            );
        }

        info!("📡 transcript stream open");
        Ok(TranscriptStream {
            response,
            buf: Vec::new(),
            done: false,
        })
    }

    /// 📤 Submit one processed result upstream. Same retry policy as
    /// authenticate. A permanent failure surfaces to the caller, who will
    /// dead-letter the *source transcript* — the result is disposable, the
    /// record of the failure is not.
    pub async fn submit_processed(
        &self,
        session: &AuthSession,
        result: &ProcessedResult,
    ) -> Result<serde_json::Value> {
        let url = self.endpoint("v1/transcripts/process");
        let response = self
            .send_with_retry("submit_processed", || {
                self.http
                    .post(&url)
                    .bearer_auth(session.token())
                    .json(result)
                    .timeout(self.request_timeout())
            })
            .await?;

        let ack: serde_json::Value = response
            .json()
            .await
            .context("💀 The submission ack was not JSON. We'll take it as a yes, but nervously.")?;
        debug!(transcript_id = %result.transcript_id, "📤 submitted processed result");
        Ok(ack)
    }

    /// 📊 Fetch processing statistics. Single attempt — stats are a luxury,
    /// and luxuries don't get retry budgets.
    pub async fn get_stats(&self, session: &AuthSession) -> Result<serde_json::Value> {
        let url = self.endpoint("v1/stats");
        let response = self
            .http
            .get(&url)
            .bearer_auth(session.token())
            .timeout(self.request_timeout())
            .send()
            .await
            .context("💀 Stats endpoint unreachable. The numbers remain a mystery.")?
            .error_for_status()
            .context("💀 Stats endpoint answered, but not with stats.")?;
        let stats = response.json().await.context("💀 Stats arrived, un-JSON-ed.")?;
        debug!("📊 fetched upstream stats");
        Ok(stats)
    }

    /// 🏥 Is the upstream alive? Boolean, never an error — a health check
    /// that throws is just a second outage.
    pub async fn health_check(&self) -> bool {
        let url = self.endpoint("v1/health");
        match self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(err) => {
                debug!(%err, "🏥 health check could not reach the upstream");
                false
            }
        }
    }

    /// 🔄 The retry engine for unary calls: build a fresh request each
    /// attempt, send it, and classify the outcome.
    ///
    /// - 2xx → done.
    /// - transient (network weather, 5xx, 429) → back off and go again,
    ///   until `max_retries` attempts are spent.
    /// - anything else → permanent, fail now with the body for the postmortem.
    async fn send_with_retry<F>(&self, op: &str, make_request: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 1;
        loop {
            match make_request().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if !is_transient_status(status) {
                        let body = response.text().await.unwrap_or_default();
                        bail!(
                            "{op} failed permanently with status {status}: '{body}'. \
                             No retry will fix what the upstream meant on purpose."
                        );
                    }
                    if attempt >= max_attempts {
                        bail!(
                            "{op} still failing with status {status} after {max_attempts} attempts — \
                             the backoff ran out of patience before the upstream ran out of errors"
                        );
                    }
                    warn!(op, %status, attempt, "🔄 transient upstream status, backing off");
                }
                Err(err) => {
                    // 📡 No response at all — the network ate the request.
                    // Transient by definition; the only question is attempts.
                    if attempt >= max_attempts {
                        return Err(err).context(format!(
                            "💀 {op} got no answer from the upstream after {max_attempts} attempts. \
                             We launched requests into the network and the network said 'not vibing with it.'"
                        ));
                    }
                    warn!(op, %err, attempt, "🔄 transport error, backing off");
                }
            }
            tokio::time::sleep(backoff_delay(attempt)).await;
            attempt += 1;
        }
    }
}

/// 🔄 Which statuses are weather and which are verdicts. 5xx and 429 are
/// weather. Everything else the upstream meant.
fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// 🔄 Exponential backoff: 1s, 2s, 4s, 8s, then a flat 10s ceiling.
fn backoff_delay(attempt: usize) -> Duration {
    let exp = attempt.saturating_sub(1).min(32) as u32;
    let delay = BACKOFF_MIN.saturating_mul(2u32.saturating_pow(exp));
    delay.min(BACKOFF_MAX)
}

/// 📡 The streaming subscription: one persistent response body, pulled line
/// by line, decoded transcript by transcript.
///
/// Framing is `\n`-delimited JSON, scanned with memchr because the stream is
/// long and the newlines are many. Malformed lines are logged and skipped —
/// one garbled record must never cost us the connection. A connection-level
/// failure, on the other hand, ends the subscription with an `Err`.
///
/// Dropping this struct drops the response, which cancels the request.
/// Deterministic teardown, no background task, no loose ends.
#[derive(Debug)]
pub struct TranscriptStream {
    response: reqwest::Response,
    buf: Vec<u8>,
    done: bool,
}

impl TranscriptStream {
    /// 📤 Pull the next event: `Item` for each decodable record, `Closed`
    /// once the upstream ends the body, `Err` when the connection fails.
    ///
    /// An unterminated final line is decoded at EOF — the last transcript of
    /// the day shouldn't be lost to a missing newline.
    pub async fn next(&mut self) -> Result<StreamEvent> {
        loop {
            // 🔍 Drain complete lines already buffered before touching the network.
            while let Some(newline_at) = memchr::memchr(b'\n', &self.buf) {
                let line: Vec<u8> = self.buf.drain(..=newline_at).collect();
                if let Some(transcript) = decode_stream_line(&line) {
                    return Ok(StreamEvent::Item(Box::new(transcript)));
                }
            }

            if self.done {
                // 📦 EOF already seen; anything left is an unterminated tail.
                if !self.buf.is_empty() {
                    let tail = std::mem::take(&mut self.buf);
                    if let Some(transcript) = decode_stream_line(&tail) {
                        return Ok(StreamEvent::Item(Box::new(transcript)));
                    }
                }
                return Ok(StreamEvent::Closed);
            }

            match self.response.chunk().await.context(
                "💀 The transcript stream went quiet mid-sentence. Connection-level failure; \
                 this subscription is spent. Whoever holds it decides about reconnecting.",
            )? {
                Some(chunk) => self.buf.extend_from_slice(&chunk),
                None => {
                    debug!("📡 transcript stream reached end of body");
                    self.done = true;
                }
            }
        }
    }

    /// 🗑️ Cancel the subscription. Consumes self; the in-flight request is
    /// torn down with it. Exists so shutdown reads as a verb, not a `drop()`.
    pub fn cancel(self) {
        debug!("📡 transcript stream subscription canceled");
    }
}

/// 🔍 Decode one stream line. Empty and whitespace-only lines are keepalive
/// noise and skip silently; anything else that fails to parse is logged and
/// skipped — the stream must outlive its worst record.
fn decode_stream_line(line: &[u8]) -> Option<Transcript> {
    // The terminator (and any \r riding with it) is whitespace; trim handles both.
    let trimmed = match std::str::from_utf8(line) {
        Ok(s) => s.trim(),
        Err(err) => {
            error!(%err, "failed to parse transcript: stream line is not UTF-8");
            return None;
        }
    };
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Transcript>(trimmed) {
        Ok(transcript) => Some(transcript),
        Err(err) => {
            // ⚠️ Logged and skipped, never fatal, never dead-lettered — there
            // is no transcript here to dead-letter, just bytes with ambition.
            error!(%err, "failed to parse transcript from stream line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Analysis;
    use crate::common::test_fixtures::sample_transcript;
    use crate::processing::extractor::extract_structured_data;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str, max_retries: usize) -> ApiConfig {
        ApiConfig {
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
            max_retries,
            request_timeout_secs: 5,
        }
    }

    fn processed_for(id: &str) -> ProcessedResult {
        let t = sample_transcript(id);
        let analysis = Analysis::new(0.5, "high".into(), "medium".into(), vec![]).unwrap();
        ProcessedResult::assemble(&t, "a summary".into(), extract_structured_data(&t), analysis)
            .unwrap()
    }

    /// 🧪 One wire-shaped transcript line, as the stream endpoint would send it.
    fn stream_line(id: &str) -> String {
        serde_json::to_string(&sample_transcript(id)).unwrap()
    }

    #[tokio::test]
    async fn the_one_where_abc123_opens_every_door() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .and(body_partial_json(json!({"api_key": "test-key"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
            .expect(1)
            .mount(&server)
            .await;
        // 🔒 The stats mock only matches if the bearer header actually shows up.
        Mock::given(method("GET"))
            .and(path("/v1/stats"))
            .and(header("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"processed": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 3)).unwrap();
        let session = client.authenticate().await.expect("💀 Auth failed against a friendly mock.");
        assert_eq!(session.token(), "abc123");

        let stats = client.get_stats(&session).await.unwrap();
        assert_eq!(stats["processed"], 7);
    }

    #[tokio::test]
    async fn the_one_where_a_200_with_no_token_is_not_a_yes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1) // ⚠️ exactly one call — a nonsense 200 must NOT be retried
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 3)).unwrap();
        let err = client
            .authenticate()
            .await
            .expect_err("💀 Authenticated with an empty envelope. Security would like a word.");
        assert!(err.to_string().contains("token missing"));
    }

    #[tokio::test]
    async fn the_one_where_the_upstream_needed_a_second_chance() {
        let server = MockServer::start().await;
        // 🔄 First attempt eats a 503; the earlier-mounted mock expires after
        // one use and the 200 behind it takes over.
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 3)).unwrap();
        let session = client
            .authenticate()
            .await
            .expect("💀 One 503 should be backoff fuel, not a funeral.");
        assert_eq!(session.token(), "abc123");
    }

    #[tokio::test]
    async fn the_one_where_a_401_is_taken_at_its_word() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(401).set_body_string("who are you"))
            .expect(1) // ⚠️ permanent means permanent: one call, no retries
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 3)).unwrap();
        let err = client.authenticate().await.expect_err("💀 Retried a 401. It will not get truer.");
        assert!(err.to_string().contains("permanently"));
    }

    #[tokio::test]
    async fn the_one_where_the_backoff_runs_out_of_patience() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2) // 🔄 max_retries = 2 → exactly two attempts, then surrender
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 2)).unwrap();
        let err = client
            .authenticate()
            .await
            .expect_err("💀 Infinite optimism detected in the retry loop.");
        assert!(err.to_string().contains("2 attempts"));
    }

    #[tokio::test]
    async fn the_one_where_one_bad_line_does_not_kill_the_feed() {
        let server = MockServer::start().await;
        let body = format!("this is not json\n{}\n", stream_line("t1"));
        Mock::given(method("GET"))
            .and(path("/v1/transcripts/stream"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 3)).unwrap();
        let session = AuthSession::from_token("tok");
        let mut stream = client.stream_transcripts(&session).await.unwrap();

        // 🧪 Exactly one transcript comes out; the garbage line was logged and skipped.
        match stream.next().await.unwrap() {
            StreamEvent::Item(t) => assert_eq!(t.transcript_id, "t1"),
            other => panic!("💀 Expected the valid transcript, got {other:?}"),
        }
        assert!(matches!(stream.next().await.unwrap(), StreamEvent::Closed));
    }

    #[tokio::test]
    async fn the_one_where_the_last_line_forgot_its_newline() {
        let server = MockServer::start().await;
        // ⚠️ Two records, and the second one ends at EOF with no terminator.
        let body = format!("{}\n{}", stream_line("t1"), stream_line("t2"));
        Mock::given(method("GET"))
            .and(path("/v1/transcripts/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 3)).unwrap();
        let session = AuthSession::from_token("tok");
        let mut stream = client.stream_transcripts(&session).await.unwrap();

        let mut ids = Vec::new();
        loop {
            match stream.next().await.unwrap() {
                StreamEvent::Item(t) => ids.push(t.transcript_id.clone()),
                StreamEvent::Closed => break,
            }
        }
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn the_one_where_a_refused_stream_is_an_error_not_a_shrug() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/transcripts/stream"))
            .respond_with(ResponseTemplate::new(403).set_body_string("no stream for you"))
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 3)).unwrap();
        let session = AuthSession::from_token("tok");
        let err = client
            .stream_transcripts(&session)
            .await
            .expect_err("💀 A 403 produced a working stream. Of what, exactly?");
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn the_one_where_the_result_gets_delivered_and_receipted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/transcripts/process"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(json!({"transcript_id": "t1", "summary": "a summary"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "accepted"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 3)).unwrap();
        let session = AuthSession::from_token("tok");
        let ack = client
            .submit_processed(&session, &processed_for("t1"))
            .await
            .expect("💀 Submission bounced off a mock that wanted to say yes.");
        assert_eq!(ack["status"], "accepted");
    }

    #[tokio::test]
    async fn the_one_where_submission_finally_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/transcripts/process"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1) // 🔄 max_retries = 1: a single doomed attempt
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 1)).unwrap();
        let session = AuthSession::from_token("tok");
        let err = client
            .submit_processed(&session, &processed_for("t1"))
            .await
            .expect_err("💀 A permanently sad endpoint accepted a submission?");
        assert!(err.to_string().contains("attempts"));
    }

    #[tokio::test]
    async fn the_one_where_the_health_check_never_panics_it_just_judges() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ApiClient::new(test_config(&server.uri(), 3)).unwrap();
        assert!(client.health_check().await, "a 200 should read as healthy");
        assert!(!client.health_check().await, "a 500 should read as unhealthy");

        // 📡 And when nobody is listening at all: still a boolean, never a panic.
        let nobody_home = ApiClient::new(test_config("http://127.0.0.1:9", 3)).unwrap();
        assert!(!nobody_home.health_check().await);
    }

    #[test]
    fn the_one_where_the_backoff_climbs_then_plateaus() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(4), Duration::from_secs(8));
        // 🔄 The ceiling holds, even for attempt one million.
        assert_eq!(backoff_delay(5), Duration::from_secs(10));
        assert_eq!(backoff_delay(1_000_000), Duration::from_secs(10));
    }
}
