use std::{fmt, sync::Arc};

use serde_json::Value as JsonValue;

use crate::{
    AtmError, AttemptFailure, ClientOptions, HttpResponse, JsonRequest, ReqwestTransport, Result,
    Sleep, TokioSleep, Transport,
};

/// Sends JSON requests and retries with exponential backoff until the
/// response carries every expected field.
///
/// The client holds no per-call state; clones share the underlying transport.
#[derive(Clone)]
pub struct ResilientJsonClient {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleep>,
    options: ClientOptions,
}

impl fmt::Debug for ResilientJsonClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientJsonClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for ResilientJsonClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ResilientJsonClient {
    /// Creates a client on `reqwest` and `tokio` with default options.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::default(), TokioSleep)
    }

    /// Creates a client on custom transport and sleep implementations.
    pub fn with_transport(
        transport: impl Transport + 'static,
        sleeper: impl Sleep + 'static,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            sleeper: Arc::new(sleeper),
            options: ClientOptions::default(),
        }
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends `request` until a response contains all of `expected_fields`.
    ///
    /// With no expected fields any parseable JSON body is accepted.
    /// Returns [`AtmError::RetriesExhausted`] once `max_attempts` attempts
    /// have failed; only invalid options or request preparation errors are
    /// returned earlier.
    pub async fn request(
        &self,
        request: &JsonRequest,
        expected_fields: &[&str],
    ) -> Result<JsonValue> {
        self.options.validate()?;
        let prepared = request.prepare()?;
        let policy = &self.options.retry;
        let max_attempts = policy.max_attempts;
        let timeout = self.options.timeout();

        let mut attempt = 1u32;
        loop {
            let failure = match self.transport.send(&prepared, timeout).await {
                Ok(response) => match check_response(&response, expected_fields) {
                    Ok(body) => return Ok(body),
                    Err(failure) => failure,
                },
                Err(err) => AttemptFailure::Transport(err),
            };

            if attempt >= max_attempts {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    method = %prepared.method,
                    url = %prepared.url,
                    attempts = attempt,
                    "request failed: {failure}"
                );
                return Err(AtmError::RetriesExhausted { last: failure });
            }

            let delay = policy.delay_after(attempt);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %prepared.method,
                url = %prepared.url,
                attempt,
                "attempt failed ({failure}); retrying after {} ms",
                delay.as_millis()
            );

            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Accepts a response when its body is JSON holding every expected top-level key.
fn check_response(
    response: &HttpResponse,
    expected_fields: &[&str],
) -> std::result::Result<JsonValue, AttemptFailure> {
    let raw = response.body.as_deref().ok_or_else(|| {
        AttemptFailure::ResponseFormat(format!("empty body (status {})", response.status))
    })?;
    let body: JsonValue = serde_json::from_str(raw).map_err(|err| {
        AttemptFailure::ResponseFormat(format!("invalid JSON (status {}): {err}", response.status))
    })?;

    if expected_fields.is_empty() {
        return Ok(body);
    }

    let object = body.as_object().ok_or_else(|| {
        AttemptFailure::ResponseFormat(format!(
            "expected a JSON object (status {})",
            response.status
        ))
    })?;
    let missing: Vec<String> = expected_fields
        .iter()
        .filter(|field| !object.contains_key(**field))
        .map(|field| (*field).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(AttemptFailure::IncompleteResponse { missing });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;
    use serde_json::json;

    use super::{check_response, ResilientJsonClient};
    use crate::{
        test_support::{RecordingSleep, ScriptedTransport},
        AtmError, AttemptFailure, ClientOptions, HttpResponse, JsonRequest, RetryPolicy,
        TransportError,
    };

    fn client(
        transport: &ScriptedTransport,
        sleeper: &RecordingSleep,
        retry: RetryPolicy,
    ) -> ResilientJsonClient {
        ResilientJsonClient::with_transport(transport.clone(), sleeper.clone()).with_options(
            ClientOptions {
                timeout_ms: 1_000,
                retry,
            },
        )
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
    }

    #[tokio::test]
    async fn timeout_then_success_returns_body_after_one_delay() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Ok(HttpResponse::new(200, r#"{"BuildPath":"/x","Id":"42"}"#)),
        ]);
        let sleeper = RecordingSleep::default();
        let client = client(&transport, &sleeper, RetryPolicy::new(50, 2.0, 5).unwrap());

        let body = client
            .request(&JsonRequest::put("https://api.test/p"), &["BuildPath", "Id"])
            .await
            .expect("second attempt must succeed");

        assert_eq!(body, json!({"BuildPath": "/x", "Id": "42"}));
        assert_eq!(transport.calls(), 2);
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(50)]);
    }

    #[tokio::test]
    async fn non_json_body_exhausts_attempts() {
        let transport = ScriptedTransport::always(Ok(HttpResponse::new(200, "not json")));
        let sleeper = RecordingSleep::default();
        let client = client(&transport, &sleeper, RetryPolicy::new(10, 2.0, 3).unwrap());

        let err = client
            .request(&JsonRequest::get("https://api.test/p"), &[])
            .await
            .expect_err("must fail");

        assert!(matches!(
            err,
            AtmError::RetriesExhausted {
                last: AttemptFailure::ResponseFormat(_)
            }
        ));
        assert_eq!(transport.calls(), 3);
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn missing_fields_are_retried_and_reported() {
        let transport = ScriptedTransport::json(json!({"Id": "1"}));
        let sleeper = RecordingSleep::default();
        let client = client(&transport, &sleeper, RetryPolicy::new(1, 2.0, 2).unwrap());

        let err = client
            .request(&JsonRequest::patch("https://api.test/p"), &["BuildPath", "Id"])
            .await
            .expect_err("must fail");

        match err {
            AtmError::RetriesExhausted {
                last: AttemptFailure::IncompleteResponse { missing },
            } => assert_eq!(missing, vec!["BuildPath".to_owned()]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn null_expected_field_counts_as_present() {
        let transport = ScriptedTransport::json(json!({"Content": null}));
        let sleeper = RecordingSleep::default();
        let client = client(&transport, &sleeper, RetryPolicy::no_retry());

        let body = client
            .request(&JsonRequest::get("https://api.test/c"), &["Content"])
            .await
            .expect("present null field is accepted");
        assert_eq!(body, json!({"Content": null}));
    }

    #[tokio::test]
    async fn invalid_request_fails_without_transport_call() {
        let transport = ScriptedTransport::json(json!({}));
        let sleeper = RecordingSleep::default();
        let client = client(&transport, &sleeper, RetryPolicy::default());

        let err = client
            .request(&JsonRequest::get("://broken"), &[])
            .await
            .expect_err("must fail");
        assert!(matches!(err, AtmError::InvalidInput(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_options_fail_without_transport_call() {
        let transport = ScriptedTransport::json(json!({"Id": "1"}));
        let sleeper = RecordingSleep::default();
        let shrinking = RetryPolicy {
            initial_delay_ms: 100,
            backoff_factor: 0.5,
            max_attempts: 3,
        };
        let zero_attempts = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };

        for retry in [shrinking, zero_attempts] {
            let err = client(&transport, &sleeper, retry)
                .request(&JsonRequest::get("https://api.test/p"), &["Id"])
                .await
                .expect_err("invalid policy must be rejected");
            assert!(matches!(err, AtmError::Config(_)));
        }

        let zero_timeout = ResilientJsonClient::with_transport(transport.clone(), sleeper.clone())
            .with_options(ClientOptions {
                timeout_ms: 0,
                retry: RetryPolicy::default(),
            });
        let err = zero_timeout
            .request(&JsonRequest::get("https://api.test/p"), &["Id"])
            .await
            .expect_err("zero timeout must be rejected");
        assert!(matches!(err, AtmError::Config(_)));

        assert_eq!(transport.calls(), 0);
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn non_object_body_needs_empty_expected_fields() {
        let response = HttpResponse::new(200, "[1,2]");
        assert_eq!(check_response(&response, &[]), Ok(json!([1, 2])));
        assert!(matches!(
            check_response(&response, &["Id"]),
            Err(AttemptFailure::ResponseFormat(_))
        ));
    }

    #[test]
    fn absent_body_is_a_format_failure() {
        let response = HttpResponse {
            status: 204,
            body: None,
        };
        assert!(matches!(
            check_response(&response, &[]),
            Err(AttemptFailure::ResponseFormat(_))
        ));
    }

    proptest! {
        #[test]
        fn failing_transport_is_called_max_attempts_times_with_geometric_delays(
            max_attempts in 1u32..8,
            initial_delay_ms in 1u64..500,
            factor_tenths in 11u32..40,
        ) {
            let backoff_factor = f64::from(factor_tenths) / 10.0;
            let policy = RetryPolicy::new(initial_delay_ms, backoff_factor, max_attempts).unwrap();
            let transport = ScriptedTransport::always(Err(TransportError::Connect("refused".to_owned())));
            let sleeper = RecordingSleep::default();
            let client = client(&transport, &sleeper, policy);

            let result = runtime().block_on(client.request(&JsonRequest::get("https://api.test/p"), &["Id"]));

            let exhausted = matches!(result, Err(AtmError::RetriesExhausted { .. }));
            prop_assert!(exhausted);
            prop_assert_eq!(transport.calls(), max_attempts as usize);
            let delays = sleeper.delays();
            prop_assert_eq!(delays.len(), max_attempts as usize - 1);
            for (index, delay) in delays.iter().enumerate() {
                let k = index as i32;
                let expected_ns = initial_delay_ms as f64 * 1e6 * backoff_factor.powi(k);
                prop_assert!((delay.as_nanos() as f64 - expected_ns).abs() <= 1.0);
            }
        }

        #[test]
        fn success_on_attempt_j_stops_immediately(max_attempts in 1u32..8, j_seed in 0u32..8) {
            let j = j_seed % max_attempts + 1;
            let mut script = Vec::new();
            for _ in 1..j {
                script.push(Err(TransportError::Timeout));
            }
            script.push(Ok(HttpResponse::new(200, r#"{"Id":"7"}"#)));
            script.push(Err(TransportError::Other("must not be reached".to_owned())));
            let transport = ScriptedTransport::new(script);
            let sleeper = RecordingSleep::default();
            let client = client(&transport, &sleeper, RetryPolicy::new(1, 2.0, max_attempts).unwrap());

            let result = runtime().block_on(client.request(&JsonRequest::post("https://api.test/p"), &["Id"]));

            prop_assert_eq!(result.ok(), Some(json!({"Id": "7"})));
            prop_assert_eq!(transport.calls(), j as usize);
        }
    }
}
