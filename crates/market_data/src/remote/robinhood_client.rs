use async_trait::async_trait;
use common::config::BotConfig;
use common::models::{AccountSnapshot, OrderConfirmation, OrderRequest, PositionSnapshot, Quote};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::error::{GatewayError, SubmissionError};
use crate::remote::{AccountsResponse, InstrumentsResponse, PositionResponse, QuoteResponse};
use crate::traits::{BrokerageGateway, OrderSubmitter, RemoteResponse};

const USER_AGENT: &str = "equity_signal_bot/0.1.0";

#[derive(Clone)]
pub struct RobinhoodClient {
    client: Client,
    base_url: String,
    token: String,
}

impl RobinhoodClient {
    pub fn new(config: &BotConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.robinhood_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn account_url(&self, account_number: &str) -> String {
        format!("{}/accounts/{}/", self.base_url, account_number)
    }

    pub fn instrument_url(&self, instrument_id: &str) -> String {
        format!("{}/instruments/{}/", self.base_url, instrument_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, format!("Token {}", self.token))
    }

    async fn get(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        self.authorized(self.client.get(&url).query(query))
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(endpoint, e))
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        response: Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if status != StatusCode::OK {
            return Err(GatewayError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_reqwest(endpoint, e))?;

        serde_json::from_slice::<T>(&body).map_err(|e| GatewayError::malformed(endpoint, e))
    }
}

#[async_trait]
impl BrokerageGateway for RobinhoodClient {
    async fn fetch_account(&self) -> Result<AccountSnapshot, GatewayError> {
        let response = self.get("accounts", "/accounts/", &[]).await?;
        let accounts: AccountsResponse = Self::decode("accounts", response).await?;

        let record = accounts
            .results
            .first()
            .ok_or_else(|| GatewayError::NotFound {
                what: "account",
                key: "accounts list".to_string(),
            })?
            .to_model()?;

        Ok(AccountSnapshot {
            account_url: self.account_url(&record.account_number),
            account_number: record.account_number,
            buying_power: record.buying_power,
        })
    }

    async fn resolve_instrument_id(&self, symbol: &str) -> Result<String, GatewayError> {
        let response = self
            .get("instruments", "/instruments/", &[("symbol", symbol)])
            .await?;
        let instruments: InstrumentsResponse = Self::decode("instruments", response).await?;

        instruments
            .results
            .into_iter()
            .next()
            .map(|instrument| instrument.id)
            .ok_or_else(|| GatewayError::NotFound {
                what: "instrument",
                key: symbol.to_string(),
            })
    }

    async fn fetch_position(
        &self,
        account_number: &str,
        instrument_id: &str,
    ) -> Result<PositionSnapshot, GatewayError> {
        let path = format!("/positions/{}/{}/", account_number, instrument_id);
        let response = self.get("positions", &path, &[]).await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(
                "No position record for instrument {}, treating as flat",
                instrument_id
            );
            return Ok(PositionSnapshot {
                instrument_id: instrument_id.to_string(),
                instrument_url: self.instrument_url(instrument_id),
                owned_quantity: Decimal::ZERO,
            });
        }

        let position: PositionResponse = Self::decode("positions", response).await?;
        let record = position.to_model()?;

        Ok(PositionSnapshot {
            instrument_id: instrument_id.to_string(),
            instrument_url: record.instrument_url,
            owned_quantity: record.quantity,
        })
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, GatewayError> {
        let path = format!("/quotes/{}/", symbol);
        let response = self.get("quotes", &path, &[]).await?;
        let mut quote: QuoteResponse = Self::decode("quotes", response).await?;

        if quote.symbol.is_empty() {
            quote.symbol = symbol.to_string();
        }
        quote.to_model()
    }
}

#[async_trait]
impl OrderSubmitter for RobinhoodClient {
    async fn submit(&self, order: &OrderRequest) -> Result<OrderConfirmation, SubmissionError> {
        let url = format!("{}/orders/", self.base_url);

        info!("Placing Order: {}", order);

        let resp = self
            .authorized(self.client.post(&url).json(order))
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            error!("Robinhood Order Failed ({}): {}", status, body);
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Placed. The confirmation body is best-effort.
        let body = resp.bytes().await.unwrap_or_default();
        Ok(serde_json::from_slice::<OrderConfirmation>(&body).unwrap_or_default())
    }
}
