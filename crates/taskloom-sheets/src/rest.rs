// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Sheets v4 REST backend.
//!
//! Talks to the `spreadsheets` and `spreadsheets.values` endpoints with a
//! bearer token. Values are written RAW so ids and dates land as typed
//! text. On transient errors (429, 500, 503) each call retries once after
//! a 1-second delay.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use taskloom_core::{SheetStore, TaskloomError};
use tracing::{debug, warn};

const API_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Client for one spreadsheet.
#[derive(Debug, Clone)]
pub struct GoogleSheets {
    client: reqwest::Client,
    spreadsheet_id: String,
    max_retries: u32,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

impl GoogleSheets {
    pub fn new(api_token: String, spreadsheet_id: String) -> Result<Self, TaskloomError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_token}"))
            .map_err(|e| TaskloomError::Config(format!("invalid mirror api token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TaskloomError::Mirror {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            spreadsheet_id,
            max_retries: 1,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn spreadsheet_url(&self) -> String {
        format!("{}/{}", self.base_url, self.spreadsheet_id)
    }

    /// Sends one request, retrying transient statuses, and returns the body.
    async fn send(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<String, TaskloomError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying sheets request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = build().send().await.map_err(|e| TaskloomError::Mirror {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

            let status = response.status();
            debug!(status = %status, attempt, "sheets response received");

            if status.is_success() {
                return response.text().await.map_err(|e| TaskloomError::Mirror {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(TaskloomError::mirror(format!(
                    "sheets API returned {status}: {body}"
                )));
                continue;
            }

            return Err(TaskloomError::mirror(format!(
                "sheets API returned {status}: {body}"
            )));
        }

        Err(last_error
            .unwrap_or_else(|| TaskloomError::mirror("sheets request failed after retries")))
    }

    async fn metadata(&self) -> Result<Vec<SheetProperties>, TaskloomError> {
        let url = format!("{}?fields=sheets.properties", self.spreadsheet_url());
        let body = self.send(|| self.client.get(&url)).await?;
        let meta: SpreadsheetMeta =
            serde_json::from_str(&body).map_err(|e| TaskloomError::Mirror {
                message: format!("failed to parse spreadsheet metadata: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(meta.sheets.into_iter().map(|s| s.properties).collect())
    }

    async fn sheet_id(&self, title: &str) -> Result<i64, TaskloomError> {
        self.metadata()
            .await?
            .into_iter()
            .find(|p| p.title == title)
            .map(|p| p.sheet_id)
            .ok_or_else(|| TaskloomError::mirror(format!("sheet not found: {title}")))
    }

    async fn write_range(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), TaskloomError> {
        let url = format!(
            "{}/values/{}?valueInputOption=RAW",
            self.spreadsheet_url(),
            range
        );
        let payload = serde_json::json!({ "values": values });
        self.send(|| self.client.put(&url).json(&payload)).await?;
        Ok(())
    }
}

#[async_trait]
impl SheetStore for GoogleSheets {
    async fn ensure_sheet(&self, title: &str, headers: &[&str]) -> Result<(), TaskloomError> {
        let existing = self.metadata().await?;
        if !existing.iter().any(|p| p.title == title) {
            let url = format!("{}:batchUpdate", self.spreadsheet_url());
            let payload = serde_json::json!({
                "requests": [{ "addSheet": { "properties": { "title": title } } }]
            });
            self.send(|| self.client.post(&url).json(&payload)).await?;
        }

        let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let current = self.rows(title).await?;
        if current.first() != Some(&header) {
            self.write_range(&format!("{title}!1:1"), vec![header]).await?;
        }
        Ok(())
    }

    async fn rows(&self, title: &str) -> Result<Vec<Vec<String>>, TaskloomError> {
        let url = format!("{}/values/{}", self.spreadsheet_url(), title);
        let body = self.send(|| self.client.get(&url)).await?;
        let range: ValueRange = serde_json::from_str(&body).map_err(|e| TaskloomError::Mirror {
            message: format!("failed to parse value range: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(range.values)
    }

    async fn append_row(&self, title: &str, values: &[String]) -> Result<(), TaskloomError> {
        let url = format!(
            "{}/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.spreadsheet_url(),
            title
        );
        let payload = serde_json::json!({ "values": [values] });
        self.send(|| self.client.post(&url).json(&payload)).await?;
        Ok(())
    }

    async fn update_row(
        &self,
        title: &str,
        row: usize,
        values: &[String],
    ) -> Result<(), TaskloomError> {
        self.write_range(&format!("{title}!{row}:{row}"), vec![values.to_vec()])
            .await
    }

    async fn update_cell(
        &self,
        title: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), TaskloomError> {
        let cell = format!("{title}!{}{row}", column_letter(col));
        self.write_range(&cell, vec![vec![value.to_string()]]).await
    }

    async fn delete_row(&self, title: &str, row: usize) -> Result<(), TaskloomError> {
        let sheet_id = self.sheet_id(title).await?;
        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        // DeleteDimension is 0-based with an exclusive end.
        let payload = serde_json::json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            }]
        });
        self.send(|| self.client.post(&url).json(&payload)).await?;
        Ok(())
    }
}

/// 1-based column index to A1 letters (1 = A, 27 = AA).
fn column_letter(col: usize) -> String {
    let mut n = col;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GoogleSheets {
        GoogleSheets::new("test-token".into(), "sheet123".into())
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(5), "E");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
    }

    #[tokio::test]
    async fn rows_parses_value_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sheet123/values/Users"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "Users!A1:B2",
                "values": [["Name", "TelegramID"], ["Ana", "100"]]
            })))
            .mount(&server)
            .await;

        let rows = test_client(&server.uri()).rows("Users").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Ana".to_string(), "100".to_string()]);
    }

    #[tokio::test]
    async fn rows_of_empty_sheet_is_empty() {
        let server = MockServer::start().await;
        // The API omits "values" entirely for an empty range.
        Mock::given(method("GET"))
            .and(path("/sheet123/values/Users"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "range": "Users!A1:Z1000" })),
            )
            .mount(&server)
            .await;

        let rows = test_client(&server.uri()).rows("Users").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn append_posts_raw_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sheet123/values/Users:append"))
            .and(query_param("valueInputOption", "RAW"))
            .and(body_partial_json(serde_json::json!({
                "values": [["Ana", "100"]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        test_client(&server.uri())
            .append_row("Users", &["Ana".into(), "100".into()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ensure_sheet_adds_missing_sheet_and_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sheet123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sheets": [{ "properties": { "sheetId": 0, "title": "Other" } }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sheet123:batchUpdate"))
            .and(body_partial_json(serde_json::json!({
                "requests": [{ "addSheet": { "properties": { "title": "Users" } } }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sheet123/values/Users"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "range": "Users" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/sheet123/values/Users!1:1"))
            .and(body_partial_json(serde_json::json!({
                "values": [["Name", "TelegramID"]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server.uri())
            .ensure_sheet("Users", &["Name", "TelegramID"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn retries_once_on_transient_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sheet123/values/Users"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sheet123/values/Users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [["Name"]]
            })))
            .mount(&server)
            .await;

        let rows = test_client(&server.uri()).rows("Users").await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn fails_fast_on_permission_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sheet123/values/Users"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": { "code": 403, "message": "The caller does not have permission" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).rows("Users").await.unwrap_err();
        assert!(err.to_string().contains("403"), "got: {err}");
    }
}
