// # REST Table Store
//
// TableStore implementation for hosted table services exposing the
// PostgREST dialect under `<project>/rest/v1/<table>`.
//
// ## Request Mapping
//
// | operation | request                                                        |
// |-----------|----------------------------------------------------------------|
// | select    | `GET    /rest/v1/books?select=*&order=created_at.desc`         |
// | insert    | `POST   /rest/v1/books` + `Prefer: return=representation`      |
// | update    | `PATCH  /rest/v1/books?id=eq.<id>`                             |
// | delete    | `DELETE /rest/v1/books?id=eq.<id>`                             |
//
// Every request carries the project API key both as `apikey` and as a
// bearer token.
//
// ## Scope
//
// - One HTTP request per store call
// - No retry, backoff or caching (the sync layer does not retry either)
// - No request timeout: a call waits as long as the transport does
// - The API key never appears in logs, errors or `Debug` output

use async_trait::async_trait;
use booklist_core::config::StoreConfig;
use booklist_core::record::{Book, BookChanges, NewBook};
use booklist_core::traits::{Match, OrderBy, TableStore, TableStoreFactory, require_table};
use booklist_core::{Error, Result, StoreRegistry};
use reqwest::{Method, RequestBuilder, Response, StatusCode};

/// Path prefix of the table REST API
const REST_PATH: &str = "rest/v1";

/// Media type asking for a single object instead of an array
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// REST table store
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct RestTableStore {
    /// Project base URL without trailing slash
    base_url: String,

    /// Project API key
    api_key: String,

    /// Optional schema profile (`Accept-Profile` / `Content-Profile`)
    schema: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for RestTableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTableStore")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .field("schema", &self.schema)
            .finish()
    }
}

impl RestTableStore {
    /// Create a new REST table store
    ///
    /// # Parameters
    ///
    /// - `base_url`: Project URL, e.g. `https://abc.example.co`
    /// - `api_key`: Project API key
    /// - `schema`: Optional schema profile
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)` if the key or URL is empty, or the HTTP
    ///   client cannot be built
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        schema: Option<String>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let api_key = api_key.into();

        if base_url.is_empty() {
            return Err(Error::config("REST store URL cannot be empty"));
        }
        if api_key.is_empty() {
            return Err(Error::config("REST store API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            api_key,
            schema,
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    /// Authenticated request for `table`
    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let reading = method == Method::GET;
        let mut builder = self
            .client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key);

        if let Some(ref schema) = self.schema {
            let header = if reading {
                "Accept-Profile"
            } else {
                "Content-Profile"
            };
            builder = builder.header(header, schema);
        }
        builder
    }

    fn select_request(&self, table: &str, columns: &str, order: &OrderBy) -> RequestBuilder {
        let order = order_param(order);
        self.request(Method::GET, table)
            .query(&[("select", columns), ("order", order.as_str())])
    }

    fn insert_request(&self, table: &str, book: &NewBook) -> RequestBuilder {
        self.request(Method::POST, table)
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(book)
    }

    fn update_request(&self, table: &str, changes: &BookChanges, filter: &Match) -> RequestBuilder {
        self.request(Method::PATCH, table)
            .query(&[(filter.column.as_str(), filter_param(filter))])
            .header("Prefer", "return=minimal")
            .json(changes)
    }

    fn delete_request(&self, table: &str, filter: &Match) -> RequestBuilder {
        self.request(Method::DELETE, table)
            .query(&[(filter.column.as_str(), filter_param(filter))])
            .header("Prefer", "return=minimal")
    }

    /// Send a request and turn non-2xx answers into errors
    async fn send(&self, builder: RequestBuilder, action: &str, table: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(status_error(status, action, table, &body))
    }
}

/// `order` query value, e.g. `created_at.desc`
fn order_param(order: &OrderBy) -> String {
    let direction = if order.ascending { "asc" } else { "desc" };
    format!("{}.{}", order.column, direction)
}

/// Equality filter value, e.g. `eq.42`
fn filter_param(filter: &Match) -> String {
    format!("eq.{}", filter.value)
}

/// Map an HTTP failure to the core error kinds
fn status_error(status: StatusCode, action: &str, table: &str, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API key or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("Table not found: {}", table)),
        409 => Error::conflict(format!("{} rejected: {}", action, body)),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::http(format!("Server error (transient): {} - {}", status, body)),
        _ => Error::backend("rest", format!("{} failed: {} - {}", action, status, body)),
    }
}

#[async_trait]
impl TableStore for RestTableStore {
    async fn select(&self, table: &str, columns: &str, order: &OrderBy) -> Result<Vec<Book>> {
        require_table(table)?;
        tracing::debug!(table, order = %order_param(order), "Selecting rows");

        let response = self
            .send(self.select_request(table, columns, order), "select", table)
            .await?;

        response
            .json::<Vec<Book>>()
            .await
            .map_err(|e| Error::backend("rest", format!("Failed to parse rows: {}", e)))
    }

    async fn insert(&self, table: &str, book: &NewBook) -> Result<Book> {
        require_table(table)?;
        tracing::debug!(table, "Inserting row");

        let response = self
            .send(self.insert_request(table, book), "insert", table)
            .await?;

        let row: Book = response
            .json()
            .await
            .map_err(|e| Error::backend("rest", format!("Failed to parse inserted row: {}", e)))?;

        if row.id.is_empty() {
            return Err(Error::backend("rest", "Inserted row has no id"));
        }
        Ok(row)
    }

    async fn update(&self, table: &str, changes: &BookChanges, filter: &Match) -> Result<()> {
        require_table(table)?;
        tracing::debug!(table, column = %filter.column, "Updating rows");
        self.send(self.update_request(table, changes, filter), "update", table)
            .await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Match) -> Result<()> {
        require_table(table)?;
        tracing::debug!(table, column = %filter.column, "Deleting rows");
        self.send(self.delete_request(table, filter), "delete", table)
            .await?;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "rest"
    }
}

/// Factory for creating REST table stores
pub struct RestTableStoreFactory;

impl TableStoreFactory for RestTableStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn TableStore>> {
        match config {
            StoreConfig::Rest {
                url,
                api_key,
                schema,
            } => Ok(Box::new(RestTableStore::new(
                url.clone(),
                api_key.clone(),
                schema.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for REST store")),
        }
    }
}

/// Register the REST store with a registry
///
/// # Example
///
/// ```rust
/// use booklist_core::StoreRegistry;
///
/// let registry = StoreRegistry::with_builtin();
/// booklist_store_rest::register(&registry);
/// assert!(registry.has_store("rest"));
/// ```
pub fn register(registry: &StoreRegistry) {
    registry.register_store("rest", Box::new(RestTableStoreFactory));
}
