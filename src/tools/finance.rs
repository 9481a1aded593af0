//! Finance data tools
//!
//! Company profile, news and fundamentals come from Finnhub; daily price bars
//! come from the Yahoo Finance chart endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::config::FinanceConfig;
use crate::core::{Result, ToolDefinition, TradeHelperError};
use crate::tools::registry::{Tool, ToolRegistry};

const DEFAULT_MAX_NEWS: usize = 10;

/// Register every finance tool on `registry`
pub fn register_finance_tools(registry: &mut ToolRegistry, config: &FinanceConfig) -> Result<()> {
    let api = Arc::new(FinanceApi::from_config(config)?);

    registry.register(Arc::new(CompanyProfileTool(api.clone())))?;
    registry.register(Arc::new(CompanyNewsTool(api.clone())))?;
    registry.register(Arc::new(FinancialBasicsTool(api.clone())))?;
    registry.register(Arc::new(StockDataTool(api)))?;
    Ok(())
}

/// Shared HTTP client for the finance endpoints
pub struct FinanceApi {
    client: Client,
    finnhub_url: String,
    finnhub_key: Option<String>,
    yahoo_url: String,
}

impl FinanceApi {
    /// Create a client from configuration
    pub fn from_config(config: &FinanceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tradehelper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            finnhub_url: config.finnhub_url.trim_end_matches('/').to_string(),
            finnhub_key: config.finnhub_api_key.clone(),
            yahoo_url: config.yahoo_url.trim_end_matches('/').to_string(),
        })
    }

    async fn finnhub<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let key = self
            .finnhub_key
            .as_deref()
            .ok_or_else(|| TradeHelperError::config("FINNHUB_API_KEY is not set"))?;

        tracing::debug!(path, "finnhub request");

        let response = self
            .client
            .get(format!("{}{}", self.finnhub_url, path))
            .query(query)
            .query(&[("token", key)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TradeHelperError::Other(format!(
                "Finnhub API error ({}): {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

fn symbol_arg(args: &Value) -> Result<String> {
    args.get("symbol")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TradeHelperError::Other("symbol must not be empty".to_string()))
}

fn date_arg(args: &Value, key: &str) -> Result<NaiveDate> {
    let raw = args.get(key).and_then(|v| v.as_str()).unwrap_or_default();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| TradeHelperError::Other(format!("{} '{}' is not YYYY-MM-DD: {}", key, raw, e)))
}

fn date_range_args(args: &Value) -> Result<(NaiveDate, NaiveDate)> {
    let start = date_arg(args, "start_date")?;
    let end = date_arg(args, "end_date")?;
    if start > end {
        return Err(TradeHelperError::Other(format!(
            "start_date {} is after end_date {}",
            start, end
        )));
    }
    Ok((start, end))
}

fn symbol_schema() -> Value {
    json!({
        "type": "string",
        "description": "Ticker symbol of the company, e.g. AAPL"
    })
}

fn date_schema(what: &str) -> Value {
    json!({
        "type": "string",
        "description": format!("{} in YYYY-MM-DD format", what)
    })
}

/// get_company_profile
pub struct CompanyProfileTool(Arc<FinanceApi>);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyProfile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    finnhub_industry: String,
    #[serde(default)]
    ipo: String,
    #[serde(default)]
    market_capitalization: f64,
    #[serde(default)]
    share_outstanding: f64,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    exchange: String,
    #[serde(default)]
    country: String,
}

impl CompanyProfile {
    fn render(&self, symbol: &str) -> String {
        format!(
            "[Company Introduction]:\n\n{name} is a leading entity in the {industry} sector. \
             Incorporated and publicly traded since {ipo}, the company has established its \
             reputation as one of the key players in the market. As of today, {name} has a \
             market capitalization of {cap:.2} in {currency}, with {shares:.2} shares \
             outstanding.\n\n{name} operates primarily in {country}, trading under the ticker \
             {symbol} on the {exchange}.",
            name = self.name,
            industry = self.finnhub_industry,
            ipo = self.ipo,
            cap = self.market_capitalization,
            currency = self.currency,
            shares = self.share_outstanding,
            country = self.country,
            symbol = symbol,
            exchange = self.exchange,
        )
    }
}

#[async_trait]
impl Tool for CompanyProfileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "get_company_profile",
            "get a company's profile information",
            json!({
                "type": "object",
                "properties": { "symbol": symbol_schema() },
                "required": ["symbol"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let symbol = symbol_arg(args)?;
        let profile: CompanyProfile = self
            .0
            .finnhub("/stock/profile2", &[("symbol", symbol.clone())])
            .await?;

        if profile.name.is_empty() {
            return Err(TradeHelperError::Other(format!(
                "Failed to find company profile for symbol {} from finnhub!",
                symbol
            )));
        }
        Ok(profile.render(&symbol))
    }
}

/// get_company_news
pub struct CompanyNewsTool(Arc<FinanceApi>);

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    summary: String,
}

fn render_news(mut items: Vec<NewsItem>, limit: usize) -> String {
    items.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    items.truncate(limit);

    if items.is_empty() {
        return "No company news found for the requested period.".to_string();
    }

    items
        .iter()
        .map(|item| {
            let date = Utc
                .timestamp_opt(item.datetime, 0)
                .single()
                .map(|d| d.format("%Y%m%d%H%M%S").to_string())
                .unwrap_or_default();
            format!("[{}] {}\n{}", date, item.headline, item.summary)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for CompanyNewsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "get_company_news",
            "retrieve market news related to designated company",
            json!({
                "type": "object",
                "properties": {
                    "symbol": symbol_schema(),
                    "start_date": date_schema("Start date of the news window"),
                    "end_date": date_schema("End date of the news window"),
                    "max_news_num": {
                        "type": "integer",
                        "description": "Maximum number of news items to return, default 10"
                    }
                },
                "required": ["symbol", "start_date", "end_date"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let symbol = symbol_arg(args)?;
        let (start, end) = date_range_args(args)?;
        let limit = args
            .get("max_news_num")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_NEWS);

        let items: Vec<NewsItem> = self
            .0
            .finnhub(
                "/company-news",
                &[
                    ("symbol", symbol),
                    ("from", start.to_string()),
                    ("to", end.to_string()),
                ],
            )
            .await?;

        Ok(render_news(items, limit))
    }
}

/// get_financial_basics
pub struct FinancialBasicsTool(Arc<FinanceApi>);

fn select_metrics(metric: &Value, columns: Option<&[Value]>) -> Value {
    let Some(all) = metric.as_object() else {
        return json!({});
    };

    match columns {
        Some(columns) if !columns.is_empty() => {
            let picked = columns
                .iter()
                .filter_map(|c| c.as_str())
                .filter_map(|c| all.get(c).map(|v| (c.to_string(), v.clone())))
                .collect::<serde_json::Map<_, _>>();
            Value::Object(picked)
        }
        _ => Value::Object(all.clone()),
    }
}

#[async_trait]
impl Tool for FinancialBasicsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "get_financial_basics",
            "get latest financial basics for a designated company",
            json!({
                "type": "object",
                "properties": {
                    "symbol": symbol_schema(),
                    "selected_columns": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Metric names to keep, e.g. peTTM; all metrics when omitted"
                    }
                },
                "required": ["symbol"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let symbol = symbol_arg(args)?;
        let body: Value = self
            .0
            .finnhub(
                "/stock/metric",
                &[("symbol", symbol.clone()), ("metric", "all".to_string())],
            )
            .await?;

        let columns = args.get("selected_columns").and_then(|v| v.as_array());
        let selected = select_metrics(&body["metric"], columns.map(|c| c.as_slice()));
        if selected.as_object().map_or(true, |m| m.is_empty()) {
            return Err(TradeHelperError::Other(format!(
                "No basic financials available for {}",
                symbol
            )));
        }

        Ok(serde_json::to_string_pretty(&selected)?)
    }
}

/// get_stock_data
pub struct StockDataTool(Arc<FinanceApi>);

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn render_bars(result: &ChartResult) -> String {
    let empty = Quote::default();
    let quote = result.indicators.quote.first().unwrap_or(&empty);
    let cell = |v: Option<&Option<f64>>| match v.copied().flatten() {
        Some(x) => format!("{:.2}", x),
        None => "-".to_string(),
    };

    let mut out = String::from("| Date | Open | High | Low | Close | Volume |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for (i, ts) in result.timestamp.iter().enumerate() {
        let date = Utc
            .timestamp_opt(*ts, 0)
            .single()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            date,
            cell(quote.open.get(i)),
            cell(quote.high.get(i)),
            cell(quote.low.get(i)),
            cell(quote.close.get(i)),
            volume
        ));
    }
    out
}

#[async_trait]
impl Tool for StockDataTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "get_stock_data",
            "retrieve stock price data for designated ticker symbol",
            json!({
                "type": "object",
                "properties": {
                    "symbol": symbol_schema(),
                    "start_date": date_schema("Start date for retrieving stock price data"),
                    "end_date": date_schema("End date for retrieving stock price data")
                },
                "required": ["symbol", "start_date", "end_date"]
            }),
        )
    }

    async fn invoke(&self, args: &Value) -> Result<String> {
        let symbol = symbol_arg(args)?;
        let (start, end) = date_range_args(args)?;

        // Yahoo's period2 is exclusive
        let period1 = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let period2 = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let response = self
            .0
            .client
            .get(format!("{}/{}", self.0.yahoo_url, symbol))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let chart: ChartResponse = response.json().await?;
        if let Some(error) = chart.chart.error.filter(|e| !e.is_null()) {
            return Err(TradeHelperError::Other(format!(
                "Yahoo Finance error ({}): {}",
                status, error
            )));
        }

        let result = chart
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| TradeHelperError::Other(format!("No price data for {}", symbol)))?;

        Ok(render_bars(&result))
    }
}
