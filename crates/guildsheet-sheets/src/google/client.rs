//! Google Sheets API v4 client.
//!
//! Covers the three value endpoints the roster needs: `values.get`,
//! `values.append` and `values:batchUpdate`. Writes always use the `RAW`
//! input option so cell text is stored verbatim.

use std::time::Duration;

use guildsheet_core::{CellValue, RangeUpdate, SheetRange};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SheetError, SheetResult};
use crate::gateway::{AccessToken, Rows};

use super::response::{api_error, request_error};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// How a read request is authorized.
#[derive(Debug, Clone, Copy)]
pub enum ReadAuth<'a> {
    ApiKey(&'a str),
    Bearer(&'a AccessToken),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [&'a [CellValue]; 1],
}

impl<'a> ValueRangeBody<'a> {
    fn row(range: &'a SheetRange, values: &'a [CellValue]) -> Self {
        Self {
            range: range.as_str(),
            major_dimension: "ROWS",
            values: [values],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateBody<'a> {
    value_input_option: &'static str,
    data: Vec<ValueRangeBody<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<UpdateSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSummary {
    #[serde(default)]
    updated_range: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateResponse {
    #[serde(default)]
    total_updated_cells: Option<u64>,
}

/// Low-level client bound to one spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http_client: reqwest::Client,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> SheetResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                SheetError::internal(format!("failed to create HTTP client: {}", e)).with_source(e)
            })?;
        Ok(Self {
            http_client,
            spreadsheet_id: spreadsheet_id.into(),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &SheetRange, suffix: &str) -> String {
        format!(
            "{}/{}/values/{}{}",
            SHEETS_API_BASE,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range.as_str()),
            suffix
        )
    }

    /// `values.get`: every row in `range` as cell text.
    pub async fn get_values(&self, range: &SheetRange, auth: ReadAuth<'_>) -> SheetResult<Rows> {
        let context = "values.get";
        let request = self.http_client.get(self.values_url(range, ""));
        let request = match auth {
            ReadAuth::ApiKey(key) => request.query(&[("key", key)]),
            ReadAuth::Bearer(token) => request.bearer_auth(token.secret()),
        };

        let body = Self::send(request, context).await?;
        let parsed: ValueRangeResponse = serde_json::from_str(&body).map_err(|e| {
            SheetError::invalid_response(format!("{}: failed to parse response: {}", context, e))
        })?;

        let rows: Rows = parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        debug!(range = %range, rows = rows.len(), "read range");
        Ok(rows)
    }

    /// `values.append` with `INSERT_ROWS`: adds one row below the table at `range`.
    ///
    /// Returns the range the row landed in, when the API reports it.
    pub async fn append_row(
        &self,
        token: &AccessToken,
        range: &SheetRange,
        values: &[CellValue],
    ) -> SheetResult<Option<String>> {
        let context = "values.append";
        let request = self
            .http_client
            .post(self.values_url(range, ":append"))
            .bearer_auth(token.secret())
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&ValueRangeBody::row(range, values));

        let body = Self::send(request, context).await?;
        let parsed: AppendResponse = serde_json::from_str(&body).map_err(|e| {
            SheetError::invalid_response(format!("{}: failed to parse response: {}", context, e))
        })?;
        let updated = parsed.updates.and_then(|u| u.updated_range);
        debug!(range = %range, updated = ?updated, "appended row");
        Ok(updated)
    }

    /// `values:batchUpdate`: writes every update in one request.
    ///
    /// Returns the number of cells the API reports as updated.
    pub async fn batch_update(
        &self,
        token: &AccessToken,
        updates: &[RangeUpdate],
    ) -> SheetResult<u64> {
        let context = "values.batchUpdate";
        let url = format!(
            "{}/{}/values:batchUpdate",
            SHEETS_API_BASE,
            urlencoding::encode(&self.spreadsheet_id)
        );
        let request = self
            .http_client
            .post(url)
            .bearer_auth(token.secret())
            .json(&batch_update_body(updates));

        let body = Self::send(request, context).await?;
        let parsed: BatchUpdateResponse = serde_json::from_str(&body).map_err(|e| {
            SheetError::invalid_response(format!("{}: failed to parse response: {}", context, e))
        })?;
        let cells = parsed.total_updated_cells.unwrap_or(0);
        debug!(ranges = updates.len(), cells, "batch update applied");
        Ok(cells)
    }

    async fn send(request: reqwest::RequestBuilder, context: &str) -> SheetResult<String> {
        let response = request.send().await.map_err(|e| request_error(e, context))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_error(e, context))?;

        if !status.is_success() {
            return Err(api_error(status, &body, context));
        }
        Ok(body)
    }
}

fn batch_update_body(updates: &[RangeUpdate]) -> BatchUpdateBody<'_> {
    BatchUpdateBody {
        value_input_option: "RAW",
        data: updates
            .iter()
            .map(|u| ValueRangeBody::row(&u.range, &u.values))
            .collect(),
    }
}

/// Flattens a returned cell to text. Reads use formatted values, so this is
/// almost always a string already.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
