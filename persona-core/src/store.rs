//! Append-only row store for persona records
//!
//! Provides a `RowStore` trait with implementations for:
//! - **Sheets**: a Google Sheets spreadsheet addressed by URL or title
//!   (`SheetsRowStore`), resolved through the Sheets v4 and Drive v3 REST APIs
//! - **Memory**: a process-local store for dry runs (`MemoryRowStore`)
//!
//! Rows are written positionally in [`RowSchema`] order. There is no update
//! or delete.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::{StoreConfig, SHEETS_TOKEN_ENV};
use crate::models::{PersonaRecord, RowSchema};

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const DEFAULT_WORKSHEET: &str = "Sheet1";
const SPREADSHEET_ID_PATTERN: &str = r"/spreadsheets/d/([a-zA-Z0-9_-]+)";

// ============================================================================
// RowStore trait
// ============================================================================

#[async_trait]
pub trait RowStore: Send + Sync {
    /// Append one record as a new row.
    async fn append(&self, record: &PersonaRecord) -> Result<(), StoreError>;

    /// Read every data row. An empty store yields `Ok(vec![])`.
    async fn read_all(&self) -> Result<Vec<PersonaRecord>, StoreError>;

    fn describe(&self) -> StoreInfo;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreInfo {
    pub id: String,
    pub title: String,
    pub worksheet: String,
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing Sheets credentials (set GOOGLE_SHEETS_TOKEN)")]
    MissingCredentials,

    #[error("Invalid spreadsheet URL: {0}")]
    InvalidUrl(String),

    #[error("Spreadsheet not found: {0}")]
    NotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

// ============================================================================
// Sheets API structs (private)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetMeta {
    #[serde(default)]
    spreadsheet_id: Option<String>,
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SheetEntry {
    properties: SpreadsheetProperties,
}

#[derive(Debug, Serialize)]
struct CreateSpreadsheet {
    properties: SpreadsheetProperties,
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Serialize)]
struct ValueRange {
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: Option<GoogleErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    code: u16,
    message: String,
}

// ============================================================================
// SheetsRowStore
// ============================================================================

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub token: String,
    pub sheets_base_url: String,
    pub drive_base_url: String,
    pub schema: RowSchema,
}

impl SheetsConfig {
    /// Endpoints and columns from config; the bearer token from `GOOGLE_SHEETS_TOKEN`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            token: std::env::var(SHEETS_TOKEN_ENV).unwrap_or_default(),
            sheets_base_url: config.sheets_base_url.clone(),
            drive_base_url: config.drive_base_url.clone(),
            schema: RowSchema {
                prompt: config.include_prompt,
                created_at: config.include_created_at,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetsRowStore {
    client: Client,
    config: SheetsConfig,
    info: StoreInfo,
}

impl SheetsRowStore {
    /// Resolve the spreadsheet named in `store`.
    ///
    /// An explicit URL wins over the title. A title that matches no
    /// spreadsheet is created with the header row when `create_if_missing`
    /// is set, and is `NotFound` otherwise.
    pub async fn resolve(store: &StoreConfig, config: SheetsConfig) -> Result<Self, StoreError> {
        let client = build_client(&config)?;

        if let Some(url) = store.url.as_deref().filter(|u| !u.trim().is_empty()) {
            let id = spreadsheet_id_from_url(url)?;
            tracing::info!(spreadsheet = %id, "Opening spreadsheet by URL");
            return Self::open(client, config, &id).await;
        }

        if let Some(id) = find_by_title(&client, &config, &store.name).await? {
            tracing::info!(spreadsheet = %id, title = %store.name, "Opening spreadsheet by title");
            return Self::open(client, config, &id).await;
        }

        if !store.create_if_missing {
            return Err(StoreError::NotFound(store.name.clone()));
        }

        Self::create(client, config, &store.name).await
    }

    async fn open(client: Client, config: SheetsConfig, id: &str) -> Result<Self, StoreError> {
        let mut url = endpoint(&config.sheets_base_url, &["spreadsheets", id])?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title,sheets.properties.title");

        let response = client.get(url).bearer_auth(&config.token).send().await?;
        let meta: SpreadsheetMeta = parse_json(response).await?;

        let worksheet = meta
            .sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or_else(|| StoreError::MalformedResponse(format!("spreadsheet {id} has no worksheets")))?;

        let mut store = Self {
            client,
            config,
            info: StoreInfo {
                id: id.to_string(),
                title: meta.properties.title,
                worksheet,
            },
        };
        store.adopt_header().await?;
        Ok(store)
    }

    /// Take the column layout from the worksheet's existing header row, or
    /// write the configured header when the worksheet is empty.
    async fn adopt_header(&mut self) -> Result<(), StoreError> {
        let range = format!("{}!1:1", quoted_sheet(&self.info.worksheet));
        let url = endpoint(
            &self.config.sheets_base_url,
            &["spreadsheets", &self.info.id, "values", &range],
        )?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        let values: ValuesResponse = parse_json(response).await?;

        let header: Vec<String> = values
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .iter()
            .map(header_text)
            .collect();

        if header.iter().all(|h| h.trim().is_empty()) {
            self.append_values(header_values(&self.config.schema)).await?;
            tracing::info!(spreadsheet = %self.info.id, "Wrote header row to empty worksheet");
            return Ok(());
        }

        let schema = RowSchema::from_header(&header);
        if schema != self.config.schema {
            tracing::info!(
                spreadsheet = %self.info.id,
                prompt = schema.prompt,
                created_at = schema.created_at,
                "Using column layout of existing header"
            );
        }
        self.config.schema = schema;
        Ok(())
    }

    async fn create(client: Client, config: SheetsConfig, title: &str) -> Result<Self, StoreError> {
        let url = endpoint(&config.sheets_base_url, &["spreadsheets"])?;
        let body = CreateSpreadsheet {
            properties: SpreadsheetProperties {
                title: title.to_string(),
            },
            sheets: vec![SheetEntry {
                properties: SpreadsheetProperties {
                    title: DEFAULT_WORKSHEET.to_string(),
                },
            }],
        };

        let response = client
            .post(url)
            .bearer_auth(&config.token)
            .json(&body)
            .send()
            .await?;
        let meta: SpreadsheetMeta = parse_json(response).await?;

        let id = meta
            .spreadsheet_id
            .ok_or_else(|| StoreError::MalformedResponse("create returned no spreadsheetId".into()))?;
        let worksheet = meta
            .sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .unwrap_or_else(|| DEFAULT_WORKSHEET.to_string());

        let store = Self {
            client,
            config,
            info: StoreInfo {
                id,
                title: meta.properties.title,
                worksheet,
            },
        };

        store.append_values(header_values(&store.config.schema)).await?;

        tracing::info!(spreadsheet = %store.info.id, title = %store.info.title, "Created spreadsheet with header row");
        Ok(store)
    }

    /// Column layout rows are written in.
    pub fn schema(&self) -> RowSchema {
        self.config.schema
    }

    async fn append_values(&self, row: Vec<Value>) -> Result<(), StoreError> {
        let range = format!("{}:append", quoted_sheet(&self.info.worksheet));
        let mut url = endpoint(
            &self.config.sheets_base_url,
            &["spreadsheets", &self.info.id, "values", &range],
        )?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.token)
            .json(&ValueRange { values: vec![row] })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RowStore for SheetsRowStore {
    async fn append(&self, record: &PersonaRecord) -> Result<(), StoreError> {
        self.append_values(self.config.schema.row(record)).await?;
        tracing::debug!(spreadsheet = %self.info.id, id = record.id, "Row appended");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<PersonaRecord>, StoreError> {
        let url = endpoint(
            &self.config.sheets_base_url,
            &["spreadsheets", &self.info.id, "values", &quoted_sheet(&self.info.worksheet)],
        )?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        let values: ValuesResponse = parse_json(response).await?;

        Ok(records_from_values(values.values))
    }

    fn describe(&self) -> StoreInfo {
        self.info.clone()
    }
}

// ============================================================================
// MemoryRowStore
// ============================================================================

/// Process-local store; rows vanish on exit.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    rows: RwLock<Vec<PersonaRecord>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn append(&self, record: &PersonaRecord) -> Result<(), StoreError> {
        self.rows.write().await.push(record.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<PersonaRecord>, StoreError> {
        Ok(self.rows.read().await.clone())
    }

    fn describe(&self) -> StoreInfo {
        StoreInfo {
            id: "memory".to_string(),
            title: "in-memory".to_string(),
            worksheet: DEFAULT_WORKSHEET.to_string(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Extract the spreadsheet ID from a `.../spreadsheets/d/{id}/...` URL.
pub fn spreadsheet_id_from_url(url: &str) -> Result<String, StoreError> {
    let re = Regex::new(SPREADSHEET_ID_PATTERN).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
    re.captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| StoreError::InvalidUrl(url.to_string()))
}

/// A worksheet title as an A1 range, quoted so titles like `Q1` or `a!b`
/// address the whole sheet.
fn quoted_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn header_text(value: &Value) -> String {
    value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string())
}

fn header_values(schema: &RowSchema) -> Vec<Value> {
    schema.header().into_iter().map(Value::from).collect()
}

/// First row is the header; the rest map onto records by column name.
fn records_from_values(mut values: Vec<Vec<Value>>) -> Vec<PersonaRecord> {
    if values.is_empty() {
        return Vec::new();
    }
    let header: Vec<String> = values.remove(0).iter().map(header_text).collect();

    values
        .iter()
        .filter(|row| row.iter().any(|c| !c.is_null() && c.as_str() != Some("")))
        .map(|row| RowSchema::parse_row(&header, row))
        .collect()
}

async fn find_by_title(
    client: &Client,
    config: &SheetsConfig,
    title: &str,
) -> Result<Option<String>, StoreError> {
    let query = format!(
        "name='{}' and mimeType='{}' and trashed=false",
        title.replace('\\', "\\\\").replace('\'', "\\'"),
        SPREADSHEET_MIME
    );
    let mut url = endpoint(&config.drive_base_url, &["files"])?;
    url.query_pairs_mut()
        .append_pair("q", &query)
        .append_pair("fields", "files(id,name)")
        .append_pair("pageSize", "1");

    let response = client.get(url).bearer_auth(&config.token).send().await?;
    let list: DriveFileList = parse_json(response).await?;
    Ok(list.files.into_iter().next().map(|f| f.id))
}

fn build_client(config: &SheetsConfig) -> Result<Client, StoreError> {
    if config.token.is_empty() {
        return Err(StoreError::MissingCredentials);
    }
    Ok(Client::builder().timeout(Duration::from_secs(30)).build()?)
}

fn endpoint(base: &str, segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = Url::parse(base).map_err(|e| StoreError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    let (code, message) = serde_json::from_str::<GoogleErrorResponse>(&error_body)
        .ok()
        .and_then(|e| e.error)
        .map(|e| (e.code, e.message))
        .unwrap_or((status.as_u16(), error_body));

    tracing::error!(code = code, message = %message, "Sheets API error");
    Err(StoreError::Api { code, message })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
    let response = check_status(response).await?;
    Ok(response.json().await?)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sheets_config(server: &MockServer) -> SheetsConfig {
        SheetsConfig {
            token: "test-token".to_string(),
            sheets_base_url: server.uri(),
            drive_base_url: format!("{}/drive/v3", server.uri()),
            schema: RowSchema::base(),
        }
    }

    fn store_config(name: &str) -> StoreConfig {
        StoreConfig {
            name: name.to_string(),
            ..StoreConfig::default()
        }
    }

    async fn mount_sheet(server: &MockServer, id: &str, worksheet: &str, header_row: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/spreadsheets/{id}")))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": { "title": "prompts_generated" },
                "sheets": [{ "properties": { "title": worksheet } }]
            })))
            .mount(server)
            .await;
        let quoted = worksheet.replace('\'', "''").replace(' ', "%20");
        Mock::given(method("GET"))
            .and(path(format!("/spreadsheets/{id}/values/'{quoted}'!1:1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(header_row))
            .mount(server)
            .await;
    }

    async fn mount_meta(server: &MockServer, id: &str) {
        mount_sheet(
            server,
            id,
            "Sheet1",
            json!({ "values": [["ID", "Name", "DOB", "Profession", "Description"]] }),
        )
        .await;
    }

    fn record(name: &str, dob: &str) -> PersonaRecord {
        PersonaRecord {
            id: 1,
            name: name.into(),
            dob: dob.into(),
            profession: "Pilot".into(),
            description: String::new(),
            prompt: None,
            created_at: None,
        }
    }

    fn url_store(id: &str) -> StoreConfig {
        StoreConfig {
            url: Some(format!("https://docs.google.com/spreadsheets/d/{id}/edit")),
            ..StoreConfig::default()
        }
    }

    async fn open_existing(server: &MockServer) -> SheetsRowStore {
        mount_meta(server, "sheet-123").await;
        let store = StoreConfig {
            url: Some("https://docs.google.com/spreadsheets/d/sheet-123/edit#gid=0".to_string()),
            ..StoreConfig::default()
        };
        SheetsRowStore::resolve(&store, sheets_config(server)).await.unwrap()
    }

    #[test]
    fn test_spreadsheet_id_from_url() {
        assert_eq!(
            spreadsheet_id_from_url("https://docs.google.com/spreadsheets/d/1AbC_d-9/edit").unwrap(),
            "1AbC_d-9"
        );
        assert!(matches!(
            spreadsheet_id_from_url("https://example.com/not-a-sheet"),
            Err(StoreError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_by_url_reads_worksheet() {
        let server = MockServer::start().await;
        let store = open_existing(&server).await;
        assert_eq!(
            store.describe(),
            StoreInfo {
                id: "sheet-123".into(),
                title: "prompts_generated".into(),
                worksheet: "Sheet1".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_by_title_via_drive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(query_param(
                "q",
                "name='prompts_generated' and mimeType='application/vnd.google-apps.spreadsheet' and trashed=false",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": [{ "id": "found-1", "name": "prompts_generated" }]
            })))
            .mount(&server)
            .await;
        mount_meta(&server, "found-1").await;

        let store = SheetsRowStore::resolve(&store_config("prompts_generated"), sheets_config(&server))
            .await
            .unwrap();
        assert_eq!(store.describe().id, "found-1");
    }

    #[tokio::test]
    async fn test_resolve_missing_title_without_create_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": [] })))
            .mount(&server)
            .await;

        let result = SheetsRowStore::resolve(&store_config("nope"), sheets_config(&server)).await;
        assert!(matches!(result, Err(StoreError::NotFound(name)) if name == "nope"));
    }

    #[tokio::test]
    async fn test_resolve_creates_spreadsheet_with_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/spreadsheets"))
            .and(body_json(json!({
                "properties": { "title": "new_cast" },
                "sheets": [{ "properties": { "title": "Sheet1" } }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spreadsheetId": "created-9",
                "properties": { "title": "new_cast" },
                "sheets": [{ "properties": { "title": "Sheet1" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/spreadsheets/created-9/values/'Sheet1':append"))
            .and(body_json(json!({
                "values": [["ID", "Name", "DOB", "Profession", "Description"]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = store_config("new_cast");
        cfg.create_if_missing = true;
        let store = SheetsRowStore::resolve(&cfg, sheets_config(&server)).await.unwrap();
        assert_eq!(store.describe().id, "created-9");
    }

    #[tokio::test]
    async fn test_resolve_without_token_fails() {
        let server = MockServer::start().await;
        let mut config = sheets_config(&server);
        config.token = String::new();
        let result = SheetsRowStore::resolve(&store_config("x"), config).await;
        assert!(matches!(result, Err(StoreError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_append_posts_positional_row() {
        let server = MockServer::start().await;
        let store = open_existing(&server).await;

        Mock::given(method("POST"))
            .and(path("/spreadsheets/sheet-123/values/'Sheet1':append"))
            .and(query_param("valueInputOption", "RAW"))
            .and(query_param("insertDataOption", "INSERT_ROWS"))
            .and(body_json(json!({ "values": [[1, "Ana", "", "Pilot", "Flies."]] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updates": {} })))
            .expect(1)
            .mount(&server)
            .await;

        let record = PersonaRecord {
            id: 1,
            name: "Ana".into(),
            dob: String::new(),
            profession: "Pilot".into(),
            description: "Flies.".into(),
            prompt: None,
            created_at: None,
        };
        store.append(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_append_sends_user_text_unchanged() {
        let server = MockServer::start().await;
        let store = open_existing(&server).await;

        let formula = r#"=IMPORTXML("http://x","//a")"#;
        Mock::given(method("POST"))
            .and(path("/spreadsheets/sheet-123/values/'Sheet1':append"))
            .and(query_param("valueInputOption", "RAW"))
            .and(body_json(json!({ "values": [[1, formula, "007", "Pilot", ""]] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        store.append(&record(formula, "007")).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_follows_existing_header_layout() {
        let server = MockServer::start().await;
        mount_meta(&server, "legacy-5").await;

        // Configured for all seven columns; the sheet only has the base five
        let mut config = sheets_config(&server);
        config.schema = RowSchema::default();
        let store = SheetsRowStore::resolve(&url_store("legacy-5"), config).await.unwrap();
        assert_eq!(store.schema(), RowSchema::base());

        Mock::given(method("POST"))
            .and(path("/spreadsheets/legacy-5/values/'Sheet1':append"))
            .and(body_json(json!({ "values": [[1, "Ana", "", "Pilot", ""]] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut with_extras = record("Ana", "");
        with_extras.prompt = Some("Ana flies.".into());
        with_extras.created_at = Some(chrono::Utc::now());
        store.append(&with_extras).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_writes_header_into_empty_worksheet() {
        let server = MockServer::start().await;
        mount_sheet(&server, "blank-1", "Sheet1", json!({ "range": "Sheet1!A1:Z1" })).await;
        Mock::given(method("POST"))
            .and(path("/spreadsheets/blank-1/values/'Sheet1':append"))
            .and(body_json(json!({
                "values": [["ID", "Name", "DOB", "Profession", "Description", "Prompt", "Created At"]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = sheets_config(&server);
        config.schema = RowSchema::default();
        let store = SheetsRowStore::resolve(&url_store("blank-1"), config).await.unwrap();
        assert_eq!(store.schema(), RowSchema::default());
    }

    #[tokio::test]
    async fn test_worksheet_title_is_quoted_in_ranges() {
        let server = MockServer::start().await;
        mount_sheet(
            &server,
            "quoted-1",
            "Bo's Q1",
            json!({ "values": [["ID", "Name", "DOB", "Profession", "Description"]] }),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/spreadsheets/quoted-1/values/'Bo''s%20Q1':append"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let store = SheetsRowStore::resolve(&url_store("quoted-1"), sheets_config(&server))
            .await
            .unwrap();
        assert_eq!(store.describe().worksheet, "Bo's Q1");
        store.append(&record("Ana", "")).await.unwrap();
    }

    #[tokio::test]
    async fn test_append_api_error_surfaces() {
        let server = MockServer::start().await;
        let store = open_existing(&server).await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "The caller does not have permission" }
            })))
            .mount(&server)
            .await;

        let record = PersonaRecord {
            id: 1,
            name: "Ana".into(),
            dob: String::new(),
            profession: "Pilot".into(),
            description: String::new(),
            prompt: None,
            created_at: None,
        };
        match store.append(&record).await {
            Err(StoreError::Api { code, message }) => {
                assert_eq!(code, 403);
                assert!(message.contains("permission"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_all_empty_sheet_is_ok_empty() {
        let server = MockServer::start().await;
        let store = open_existing(&server).await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-123/values/'Sheet1'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Sheet1!A1:Z1000",
                "majorDimension": "ROWS"
            })))
            .mount(&server)
            .await;

        assert!(store.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_all_header_only_is_ok_empty() {
        let server = MockServer::start().await;
        let store = open_existing(&server).await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-123/values/'Sheet1'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [["ID", "Name", "DOB", "Profession", "Description"]]
            })))
            .mount(&server)
            .await;

        assert!(store.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_all_maps_rows_by_header() {
        let server = MockServer::start().await;
        let store = open_existing(&server).await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-123/values/'Sheet1'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [
                    ["ID", "Name", "DOB", "Profession", "Description"],
                    ["1", "Ana", "1990", "Pilot", "Flies."],
                    ["1", "Bo", "", "Clerk"]
                ]
            })))
            .mount(&server)
            .await;

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Ana");
        assert_eq!(rows[1].id, 1, "IDs repeat across batches");
        assert_eq!(rows[1].description, "");
    }

    #[tokio::test]
    async fn test_read_all_error_is_distinct_from_empty() {
        let server = MockServer::start().await;
        let store = open_existing(&server).await;

        Mock::given(method("GET"))
            .and(path("/spreadsheets/sheet-123/values/'Sheet1'"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        match store.read_all().await {
            Err(StoreError::Api { code, message }) => {
                assert_eq!(code, 500);
                assert_eq!(message, "backend down");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryRowStore::new();
        assert!(store.read_all().await.unwrap().is_empty());
        let record = PersonaRecord {
            id: 1,
            name: "Ana".into(),
            dob: String::new(),
            profession: "Pilot".into(),
            description: String::new(),
            prompt: None,
            created_at: None,
        };
        store.append(&record).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.describe().id, "memory");
    }
}
