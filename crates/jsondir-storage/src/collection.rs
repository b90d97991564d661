use crate::traits::Storage;
use jsondir_core::{
    exec_query, item_id, numeric_id, CollectionItem, ItemId, JsonObject, LoadError, Query,
    WriteError,
};
use serde_json::Value;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ITEMS: usize = 1000;

#[derive(Clone)]
pub struct CollectionOptions {
    pub base_dir: PathBuf,
    pub max_items: Option<usize>,
    pub storage: Arc<dyn Storage>,
}

impl CollectionOptions {
    pub fn new(base_dir: impl Into<PathBuf>, storage: Arc<dyn Storage>) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_items: None,
            storage,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }
}

/// Maps a URL path such as `/api/products` to its backing file:
/// `<base>/api/products/items.json` when that directory exists, otherwise
/// `<base>/api/products.json`.
pub async fn resolve_file_path(
    base_dir: &Path,
    url_path: &str,
    storage: &dyn Storage,
) -> Result<PathBuf, LoadError> {
    let relative = Path::new(url_path.trim_matches('/'));
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if relative.as_os_str().is_empty() || !plain {
        return Err(LoadError::NotFound);
    }
    let fs_path = base_dir.join(relative);
    if storage.is_dir(&fs_path).await {
        return Ok(fs_path.join("items.json"));
    }
    let mut file = fs_path.into_os_string();
    file.push(".json");
    Ok(PathBuf::from(file))
}

fn into_items(value: Value) -> Option<Vec<CollectionItem>> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// One JSON array document, fully loaded. Every mutation rewrites the
/// whole backing file before returning.
pub struct Collection {
    file_path: PathBuf,
    url_path: String,
    last_id: Option<ItemId>,
    max_items: usize,
    items: Vec<CollectionItem>,
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("file_path", &self.file_path)
            .field("url_path", &self.url_path)
            .field("last_id", &self.last_id)
            .field("max_items", &self.max_items)
            .field("items", &self.items.len())
            .finish()
    }
}

impl Collection {
    pub async fn load(url_path: &str, options: &CollectionOptions) -> Result<Self, LoadError> {
        let storage = options.storage.clone();
        let file_path = resolve_file_path(&options.base_dir, url_path, storage.as_ref()).await?;
        let content = storage.read(&file_path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound,
            _ => {
                warn!(path = %file_path.display(), error = %e, "collection read failed");
                LoadError::Unknown(e)
            }
        })?;
        let value: Value = serde_json::from_str(&content).map_err(LoadError::InvalidJson)?;
        let items = into_items(value).ok_or(LoadError::InvalidType)?;
        // items without a usable id stay in the collection
        let last_id = items.iter().filter_map(numeric_id).max();
        debug!(
            url_path,
            path = %file_path.display(),
            items = items.len(),
            ?last_id,
            "collection loaded"
        );
        Ok(Self {
            file_path,
            url_path: url_path.to_string(),
            last_id,
            max_items: options.max_items.unwrap_or(DEFAULT_MAX_ITEMS),
            items,
            storage,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    /// Highest id seen at load time plus any ids assigned since.
    pub fn last_id(&self) -> Option<ItemId> {
        self.last_id
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // First match wins when a hand-edited file repeats an id.
    fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item_id(item) == Some(id))
    }

    pub fn find(&self, id: ItemId) -> Option<&CollectionItem> {
        self.position(id).map(|i| &self.items[i])
    }

    pub fn query(&self, query: &Query) -> Vec<JsonObject> {
        exec_query(&self.items, query)
    }

    /// Appends `item` under the next id. The id is the first key of the
    /// stored object.
    pub async fn insert(&mut self, item: JsonObject) -> Result<CollectionItem, WriteError> {
        if item.contains_key("id") {
            return Err(WriteError::ExtraId);
        }
        if self.items.len() >= self.max_items {
            return Err(WriteError::MaxItems(self.max_items));
        }
        let id = match self.last_id {
            None => 0,
            Some(n) => n.checked_add(1).ok_or(WriteError::IdExhausted)?,
        };
        self.last_id = Some(id);
        let mut new_item = JsonObject::with_capacity(item.len() + 1);
        new_item.insert("id".to_string(), Value::from(id));
        new_item.extend(item);
        self.items.push(new_item.clone());
        self.store().await?;
        Ok(new_item)
    }

    /// Replaces the item wholesale; any `id` in `item` is overwritten.
    pub async fn update(
        &mut self,
        id: ItemId,
        mut item: JsonObject,
    ) -> Result<CollectionItem, WriteError> {
        let index = self.position(id).ok_or(WriteError::NotFound(id))?;
        item.insert("id".to_string(), Value::from(id));
        self.items[index] = item.clone();
        self.store().await?;
        Ok(item)
    }

    /// Applies an RFC 6902 patch. A failing operation leaves the item as
    /// it was. Nothing stops a patch from rewriting `id`.
    pub async fn patch(
        &mut self,
        id: ItemId,
        ops: &json_patch::Patch,
    ) -> Result<CollectionItem, WriteError> {
        let index = self.position(id).ok_or(WriteError::NotFound(id))?;
        let mut doc = Value::Object(self.items[index].clone());
        json_patch::patch(&mut doc, &ops.0)?;
        let Value::Object(patched) = doc else {
            return Err(WriteError::PatchNotObject(id));
        };
        self.items[index] = patched.clone();
        self.store().await?;
        Ok(patched)
    }

    pub async fn delete(&mut self, id: ItemId) -> Result<CollectionItem, WriteError> {
        let index = self.position(id).ok_or(WriteError::NotFound(id))?;
        let removed = self.items.remove(index);
        self.store().await?;
        Ok(removed)
    }

    async fn store(&self) -> Result<(), WriteError> {
        let mut body = serde_json::to_string_pretty(&self.items)
            .map_err(|e| WriteError::Store(e.into()))?;
        body.push('\n');
        self.storage
            .write(&self.file_path, &body)
            .await
            .map_err(|e| {
                warn!(path = %self.file_path.display(), error = %e, "collection store failed");
                WriteError::Store(e)
            })?;
        debug!(path = %self.file_path.display(), items = self.items.len(), "collection stored");
        Ok(())
    }
}
