//! Cursor-based pagination over connection fields.
//!
//! The Admin API pages every list with `first`/`after` and reports
//! `pageInfo { hasNextPage endCursor }`. [`paginate_cursor`] drives that loop
//! for any connection; [`fetch_all`] applies it to `metaobjects`.

use std::future::Future;

use metaobject_types::{connection_nodes, Metaobject};
use serde_json::{json, Value};
use shopify_client::{ApiError, GraphqlTransport};
use tracing::{debug, info, warn};

use crate::error::{LoaderError, Result};
use crate::queries::{MAX_PAGE_SIZE, METAOBJECTS_QUERY};

/// One page of a connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub has_next: bool,
    pub end_cursor: Option<String>,
}

impl Page {
    /// Read the connection at `data[field]`.
    pub fn from_connection(data: &Value, field: &str) -> Result<Self> {
        let connection = data
            .get(field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ApiError::protocol(format!("response is missing '{field}' connection")))?;

        let page_info = connection.get("pageInfo");
        let has_next = page_info
            .and_then(|info| info.get("hasNextPage"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let end_cursor = page_info
            .and_then(|info| info.get("endCursor"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            items: connection_nodes(connection).into_iter().cloned().collect(),
            has_next,
            end_cursor,
        })
    }
}

/// Items accumulated by one pagination walk, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedRecords {
    pub items: Vec<Value>,
    /// Number of pages requested.
    pub pages: usize,
    /// The server reported more results but gave no cursor to reach them.
    pub truncated: bool,
}

impl FetchedRecords {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hydrate every item into a [`Metaobject`].
    pub fn to_records(&self) -> Result<Vec<Metaobject>> {
        self.items
            .iter()
            .map(|item| Metaobject::from_wire(item).map_err(LoaderError::from))
            .collect()
    }
}

pub fn clamp_page_size(page_size: usize) -> usize {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

/// Walk a cursor-paginated connection to the end.
///
/// `fetch_page` receives the clamped page size and the cursor of the
/// previous page (`None` for the first request). A page that claims more
/// results without an end cursor stops the walk; its items are kept and the
/// result is marked truncated.
pub async fn paginate_cursor<F, Fut>(page_size: usize, mut fetch_page: F) -> Result<FetchedRecords>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = Result<Page>>,
{
    let first = clamp_page_size(page_size);
    let mut fetched = FetchedRecords::default();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch_page(first, cursor.take()).await?;
        fetched.pages += 1;
        debug!(
            "Fetched page {} with {} items (has_next: {})",
            fetched.pages,
            page.items.len(),
            page.has_next
        );
        fetched.items.extend(page.items);

        if !page.has_next {
            break;
        }
        match page.end_cursor {
            Some(next) => cursor = Some(next),
            None => {
                warn!(
                    "Page {} reports more results but no end cursor; stopping after {} items",
                    fetched.pages,
                    fetched.items.len()
                );
                fetched.truncated = true;
                break;
            }
        }
    }

    Ok(fetched)
}

/// Fetch every metaobject of `type_name`.
pub async fn fetch_all<T>(transport: &T, type_name: &str, page_size: usize) -> Result<FetchedRecords>
where
    T: GraphqlTransport + ?Sized,
{
    let fetched = paginate_cursor(page_size, move |first, after| async move {
        let variables = json!({ "type": type_name, "first": first, "after": after });
        let data = transport.execute(METAOBJECTS_QUERY, variables).await?;
        Page::from_connection(&data, "metaobjects")
    })
    .await?;

    info!(
        "Fetched {} {type_name} metaobjects in {} pages",
        fetched.len(),
        fetched.pages
    );
    Ok(fetched)
}

/// Value of `key_field` on a wire-shaped metaobject.
///
/// Top-level identity keys (`handle`, `id`, `type`) are checked first, then
/// the record's fields.
fn key_of(node: &Value, key_field: &str) -> Option<String> {
    if let Some(value) = node.get(key_field).and_then(Value::as_str) {
        return Some(value.to_string());
    }
    let fields = node.get("fields")?;
    connection_nodes(fields)
        .into_iter()
        .find(|field| field.get("key").and_then(Value::as_str) == Some(key_field))
        .and_then(|field| field.get("value"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Fetch every metaobject of `type_name` keyed by `key_field`.
///
/// Entries keep server order. A later record with an already-seen key
/// replaces the earlier one in place.
pub async fn fetch_as_mapping<T>(
    transport: &T,
    type_name: &str,
    key_field: &str,
    page_size: usize,
) -> Result<Vec<(String, Value)>>
where
    T: GraphqlTransport + ?Sized,
{
    let fetched = fetch_all(transport, type_name, page_size).await?;
    let mut mapping: Vec<(String, Value)> = Vec::with_capacity(fetched.len());

    for (position, item) in fetched.items.into_iter().enumerate() {
        let key = key_of(&item, key_field).ok_or_else(|| LoaderError::KeyFieldMissing {
            key_field: key_field.to_string(),
            position,
        })?;
        match mapping.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = item,
            None => mapping.push((key, item)),
        }
    }

    Ok(mapping)
}
