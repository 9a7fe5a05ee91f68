//! 翻訳ポート。
//!
//! 感情分析で英語以外の文書を英語スコアラーに渡すときに使う。
use std::{thread, time::Duration};

use anyhow::{Context, Result};
use reqwest::{Url, blocking::Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::language::Language;
use crate::util::{
    error::{AnalysisError, AnalysisResult},
    retry::{RetryConfig, is_retryable_error},
};

/// テキストを別言語に翻訳するバックエンド。
pub trait Translator: Send + Sync {
    /// # Errors
    /// バックエンドに到達できない場合は [`AnalysisError::TranslationUnavailable`]、
    /// 要求が拒否された場合は [`AnalysisError::TranslationRejected`] を返す。
    fn translate(&self, text: &str, source: Language, target: Language) -> AnalysisResult<String>;
}

/// 入力をそのまま返す。オフライン時の既定。
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, text: &str, _source: Language, _target: Language) -> AnalysisResult<String> {
        Ok(text.to_string())
    }
}

/// 任意のバックエンドを上限付きの再試行で包む。
#[derive(Debug, Clone)]
pub struct RetryingTranslator<T> {
    inner: T,
    retry: RetryConfig,
}

impl<T: Translator> RetryingTranslator<T> {
    #[must_use]
    pub fn new(inner: T, retry: RetryConfig) -> Self {
        Self { inner, retry }
    }
}

impl<T: Translator> Translator for RetryingTranslator<T> {
    fn translate(&self, text: &str, source: Language, target: Language) -> AnalysisResult<String> {
        let mut attempt = 0;
        loop {
            thread::sleep(self.retry.delay_for_attempt(attempt));
            attempt += 1;
            match self.inner.translate(text, source, target) {
                Ok(translated) => return Ok(translated),
                Err(AnalysisError::TranslationUnavailable { message, .. }) => {
                    if !self.retry.can_retry(attempt) {
                        return Err(AnalysisError::TranslationUnavailable {
                            attempts: attempt,
                            message,
                        });
                    }
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %message,
                        "translation failed, retrying"
                    );
                }
                Err(other) => return Err(other),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

/// LibreTranslate 互換APIを呼ぶ翻訳クライアント。
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpTranslator {
    /// # Errors
    /// HTTPクライアントの構築やURLの解析に失敗した場合はエラーを返す。
    pub fn new(base_url: &str, timeout: Duration, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()
            .context("failed to build translator HTTP client")?;

        let mut base = Url::parse(base_url).context("invalid translator base URL")?;
        // 末尾の `/` がないと join で最後のパス要素が置き換わる
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("translate")
            .context("failed to build translate URL")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn request(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, reqwest::Error> {
        let body = TranslateRequest {
            q: text,
            source: source.iso_code(),
            target: target.iso_code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()?
            .error_for_status()?
            .json::<TranslateResponse>()?;

        Ok(response.translated_text)
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, text: &str, source: Language, target: Language) -> AnalysisResult<String> {
        if source == target || text.trim().is_empty() {
            return Ok(text.to_string());
        }
        debug!(source = %source, target = %target, chars = text.len(), "translating document");
        self.request(text, source, target).map_err(|error| {
            let message = format!("translate request to {} failed: {error}", self.endpoint);
            if is_retryable_error(&error) {
                AnalysisError::TranslationUnavailable {
                    attempts: 1,
                    message,
                }
            } else {
                AnalysisError::TranslationRejected { message }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use rstest::rstest;

    use super::*;

    struct FlakyTranslator {
        failures_before_success: usize,
        calls: AtomicUsize,
    }

    impl Translator for FlakyTranslator {
        fn translate(&self, text: &str, _: Language, _: Language) -> AnalysisResult<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(AnalysisError::TranslationUnavailable {
                    attempts: 1,
                    message: "503".to_string(),
                })
            } else {
                Ok(text.to_uppercase())
            }
        }
    }

    #[test]
    fn identity_returns_input() {
        let out = IdentityTranslator
            .translate("hola", Language::Spanish, Language::English)
            .expect("identity");
        assert_eq!(out, "hola");
    }

    #[test]
    fn retries_until_success() {
        let flaky = FlakyTranslator {
            failures_before_success: 2,
            calls: AtomicUsize::new(0),
        };
        let translator = RetryingTranslator::new(flaky, RetryConfig::fixed(5, 0));
        let out = translator
            .translate("hola", Language::Spanish, Language::English)
            .expect("eventually succeeds");
        assert_eq!(out, "HOLA");
        assert_eq!(translator.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let flaky = FlakyTranslator {
            failures_before_success: usize::MAX,
            calls: AtomicUsize::new(0),
        };
        let translator = RetryingTranslator::new(flaky, RetryConfig::fixed(3, 0));
        let error = translator
            .translate("hola", Language::Spanish, Language::English)
            .unwrap_err();

        match error {
            AnalysisError::TranslationUnavailable { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(translator.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn http_translator_rejects_bad_url() {
        assert!(HttpTranslator::new("not a url", Duration::from_secs(1), None).is_err());
    }

    #[rstest]
    #[case("http://translator.local/api", "http://translator.local/api/translate")]
    #[case("http://translator.local/api/", "http://translator.local/api/translate")]
    #[case("http://translator.local:5000", "http://translator.local:5000/translate")]
    fn endpoint_keeps_base_path(#[case] base: &str, #[case] expected: &str) {
        let translator = HttpTranslator::new(base, Duration::from_secs(1), None).expect("client");
        assert_eq!(translator.endpoint.as_str(), expected);
    }

    /// 固定のステータス行を返すだけのHTTPサーバーを立て、受けた接続数を数える。
    fn serve_status(status_line: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base = format!("http://{}/", listener.local_addr().expect("addr"));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut reader = BufReader::new(stream.try_clone().expect("clone"));
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':')
                        && name.eq_ignore_ascii_case("content-length")
                    {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
                let mut body = vec![0; content_length];
                let _ = reader.read_exact(&mut body);
                let _ = write!(
                    stream,
                    "HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                );
            }
        });
        (base, hits)
    }

    #[test]
    fn client_error_is_rejected_without_retry() {
        let (base, hits) = serve_status("400 Bad Request");
        let client = HttpTranslator::new(&base, Duration::from_secs(5), None).expect("client");
        let translator = RetryingTranslator::new(client, RetryConfig::fixed(3, 0));

        let error = translator
            .translate("hola", Language::Spanish, Language::English)
            .unwrap_err();

        assert!(matches!(error, AnalysisError::TranslationRejected { .. }), "{error}");
        assert!(!error.is_retryable());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn server_error_is_retried_until_exhausted() {
        let (base, hits) = serve_status("503 Service Unavailable");
        let client = HttpTranslator::new(&base, Duration::from_secs(5), None).expect("client");
        let translator = RetryingTranslator::new(client, RetryConfig::fixed(3, 0));

        let error = translator
            .translate("hola", Language::Spanish, Language::English)
            .unwrap_err();

        match error {
            AnalysisError::TranslationUnavailable { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unreachable_backend_is_translation_unavailable() {
        let translator =
            HttpTranslator::new("http://127.0.0.1:9/", Duration::from_millis(200), None)
                .expect("client");
        let error = translator
            .translate("hola", Language::Spanish, Language::English)
            .unwrap_err();
        assert!(error.is_retryable());
    }
}
