//! Client for the forecasting web service.
//!
//! The service exposes two JSON endpoints: `POST /predict` with
//! `{ticker, days}` and `POST /sentiment` with `{ticker}`. Failures come
//! back as a 4xx/5xx status with an `{"error": "..."}` body.
use super::util::send_with_retry;
use crate::core::config::RetryPolicy;
use crate::core::forecast::{ForecastHorizon, ForecastPayload, ForecastProvider};
use crate::core::sentiment::SentimentReading;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    ticker: &'a str,
    days: u32,
}

#[derive(Debug, Serialize)]
struct SentimentRequest<'a> {
    ticker: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpForecastProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpForecastProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stockcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("Requesting {}", url);

        let delivered = send_with_retry(self.retry, || self.client.post(&url).json(body))
            .await
            .with_context(|| format!("Request to {url} failed"))?;
        let response = delivered.response;

        let status = response.status();
        debug!(attempts = delivered.attempts, %status, "Forecast service answered");
        let response_text = response
            .text()
            .await
            .context("Failed to get response text")?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&response_text)
                .map(|body| body.error)
                .unwrap_or(response_text);
            bail!("Forecast service returned {status}: {message}");
        }

        serde_json::from_str(&response_text).map_err(|e| {
            error!(
                error = ?e,
                response = %response_text,
                "Failed to parse {} response", endpoint
            );
            anyhow::Error::from(e).context(format!("Failed to parse {endpoint} response"))
        })
    }
}

#[async_trait]
impl ForecastProvider for HttpForecastProvider {
    #[instrument(name = "ForecastFetch", skip(self), fields(ticker = %ticker, days = horizon.days()))]
    async fn fetch_forecast(
        &self,
        ticker: &str,
        horizon: ForecastHorizon,
    ) -> Result<ForecastPayload> {
        let request = PredictRequest {
            ticker,
            days: horizon.days(),
        };
        let payload: ForecastPayload = self.post("predict", &request).await?;
        debug!(
            historical = payload.historical.len(),
            predictions = payload.predictions.len(),
            "Received forecast"
        );
        Ok(payload)
    }

    #[instrument(name = "SentimentFetch", skip(self), fields(ticker = %ticker))]
    async fn fetch_sentiment(&self, ticker: &str) -> Result<SentimentReading> {
        self.post("sentiment", &SentimentRequest { ticker }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sentiment::SentimentLabel;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(
        endpoint: &str,
        request: serde_json::Value,
        response: ResponseTemplate,
    ) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(body_json(request))
            .respond_with(response)
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_fetch_forecast() {
        let body = json!({
            "ticker": "MSFT",
            "current_price": 410.0,
            "predictions": [
                {"date": "2024-06-04", "price": 412.5, "change_percent": 0.61},
                {"date": "2024-06-05", "price": 415.0, "change_percent": 1.22}
            ],
            "historical": [
                {"date": "2024-05-31", "price": 405.0},
                {"date": "2024-06-03", "price": 410.0}
            ],
            "metadata": {"model": "LSTM", "days_predicted": 3}
        });
        let mock_server = create_mock_server(
            "/predict",
            json!({"ticker": "MSFT", "days": 3}),
            ResponseTemplate::new(200).set_body_json(body),
        )
        .await;

        let provider = HttpForecastProvider::new(&mock_server.uri()).unwrap();
        let payload = provider
            .fetch_forecast("MSFT", ForecastHorizon::ThreeDays)
            .await
            .unwrap();

        assert_eq!(payload.ticker, "MSFT");
        assert_eq!(payload.historical.len(), 2);
        assert_eq!(payload.predictions.len(), 2);
        assert_eq!(payload.predictions[1].price(), 415.0);
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_surfaced() {
        let mock_server = create_mock_server(
            "/predict",
            json!({"ticker": "NOPE", "days": 7}),
            ResponseTemplate::new(400).set_body_json(json!({"error": "No data found for NOPE"})),
        )
        .await;

        let provider = HttpForecastProvider::new(&mock_server.uri()).unwrap();
        let err = provider
            .fetch_forecast("NOPE", ForecastHorizon::SevenDays)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("400"), "{message}");
        assert!(message.contains("No data found for NOPE"), "{message}");
    }

    #[tokio::test]
    async fn test_fetch_sentiment() {
        let body = json!({
            "ticker": "TSLA",
            "score": -40,
            "label": "Fear",
            "color": "#f97316",
            "news": [
                {"title": "First", "source": "Wire", "time": "1h ago", "url": "https://news.test/1"},
                {"title": "Second", "source": "Desk", "time": "2h ago", "url": "https://news.test/2"}
            ]
        });
        let mock_server = create_mock_server(
            "/sentiment",
            json!({"ticker": "TSLA"}),
            ResponseTemplate::new(200).set_body_json(body),
        )
        .await;

        let provider = HttpForecastProvider::new(&format!("{}/", mock_server.uri())).unwrap();
        let reading = provider.fetch_sentiment("TSLA").await.unwrap();

        assert_eq!(reading.score, -40);
        assert_eq!(reading.label(), SentimentLabel::Fear);
        assert_eq!(reading.news[0].title, "First");
        assert_eq!(reading.news[1].title, "Second");
        assert_eq!(reading.gauge().unwrap().percentage, 30.0);
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(
            "/sentiment",
            json!({"ticker": "TSLA"}),
            ResponseTemplate::new(200).set_body_string("not json"),
        )
        .await;

        let provider = HttpForecastProvider::new(&mock_server.uri()).unwrap();
        let err = provider.fetch_sentiment("TSLA").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse sentiment response"));
    }

    #[tokio::test]
    async fn test_unreachable_service_respects_retry_policy() {
        let provider = HttpForecastProvider::new("http://127.0.0.1:9")
            .unwrap()
            .with_retry_policy(RetryPolicy {
                retries: 1,
                delay_ms: 1,
            });
        let err = provider.fetch_sentiment("TSLA").await.unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("Request to http://127.0.0.1:9/sentiment failed"), "{message}");
        assert!(message.contains("Gave up after 2 attempts"), "{message}");
    }
}
