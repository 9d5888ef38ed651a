use gearbook_core::catalog::search_items;
use gearbook_core::dataset::{DatasetPayload, load_dataset_cached};
use gearbook_core::store::view::EntryFilter;
use gearbook_core::{
    AppConfig, AppState, Clock, CoreError, CoreErrorCode, DatasetProvider, Rarity, SetItemConfig,
    Storage,
};
use gearbook_render::{
    collections_list_json, item_list_json, preview_json, render_collection_json, sets_json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Any object with the `localStorage` methods.
    pub type JsStorage;

    #[wasm_bindgen(method, catch, js_name = getItem)]
    fn get_item(this: &JsStorage, key: &str) -> Result<Option<String>, JsValue>;

    #[wasm_bindgen(method, catch, js_name = setItem)]
    fn set_item(this: &JsStorage, key: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeItem)]
    fn remove_item(this: &JsStorage, key: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = Date, js_name = now)]
    fn date_now() -> f64;
}

struct JsStorageAdapter {
    inner: JsStorage,
}

fn storage_error(action: &str, key: &str, err: JsValue) -> CoreError {
    CoreError::storage(format!("{action} {key} failed: {err:?}"))
}

impl Storage for JsStorageAdapter {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        self.inner
            .get_item(key)
            .map_err(|e| storage_error("reading", key, e))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.inner
            .set_item(key, value)
            .map_err(|e| storage_error("writing", key, e))
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        self.inner
            .remove_item(key)
            .map_err(|e| storage_error("removing", key, e))
    }
}

struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> i64 {
        date_now() as i64
    }
}

/// Dataset bytes already fetched by the page.
struct BytesProvider {
    payload: DatasetPayload,
}

impl DatasetProvider for BytesProvider {
    fn fetch(&self) -> Result<DatasetPayload, CoreError> {
        Ok(self.payload.clone())
    }
}

#[derive(Debug, Clone)]
struct WebError {
    code: &'static str,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct WebErrorPayload {
    code: String,
    message: String,
}

impl WebError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_js_value(&self) -> JsValue {
        let payload = WebErrorPayload {
            code: self.code.to_string(),
            message: self.message.clone(),
        };
        serde_wasm_bindgen::to_value(&payload).unwrap_or_else(|_| {
            JsValue::from_str(&format!("{}: {}", payload.code, payload.message))
        })
    }
}

impl From<CoreError> for WebError {
    fn from(err: CoreError) -> Self {
        let code = match err.code {
            CoreErrorCode::Io => "load_failed",
            CoreErrorCode::Decode => "decode_failed",
            CoreErrorCode::Parse => "parse_failed",
            CoreErrorCode::Validation => "invalid_input",
            CoreErrorCode::NotFound => "not_found",
            CoreErrorCode::InvariantGuard => "not_allowed",
            CoreErrorCode::Storage => "storage_failed",
        };
        Self::new(code, err.message)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct WebExcellentPick {
    pub name: String,
    pub rarity: Option<String>,
}

/// Full configurator state applied by `configure`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct WebConfigureOptions {
    pub id: String,
    pub level: u8,
    pub options: u8,
    pub luck: bool,
    pub skill: bool,
    pub excellent: Vec<WebExcellentPick>,
}

fn parse_options<T: for<'de> Deserialize<'de> + Default>(options: JsValue) -> Result<T, WebError> {
    if options.is_null() || options.is_undefined() {
        return Ok(T::default());
    }

    serde_wasm_bindgen::from_value(options).map_err(|err| {
        WebError::new("invalid_options", format!("Failed to parse options: {err}"))
    })
}

fn parse_rarity(raw: &str) -> Result<Rarity, WebError> {
    Rarity::parse(raw).ok_or_else(|| {
        WebError::new(
            "invalid_options",
            format!("Invalid rarity '{raw}'. Expected one of: normal, uncommon, rare, legendary, epic"),
        )
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<JsonValue, WebError> {
    serde_json::to_value(value).map_err(|err| {
        WebError::new("render_failed", format!("failed to serialize output: {err}"))
    })
}

fn object(pairs: Vec<(&str, JsonValue)>) -> JsonValue {
    let mut obj = JsonMap::new();
    for (key, value) in pairs {
        obj.insert(key.to_string(), value);
    }
    JsonValue::Object(obj)
}

/// Platform-independent half of [`GearbookApp`].
struct Session<S: Storage> {
    app: AppState<S>,
}

impl<S: Storage> Session<S> {
    fn open(
        storage: S,
        scope: &str,
        payload: DatasetPayload,
        refresh: bool,
        clock: Box<dyn Clock>,
    ) -> Result<Self, WebError> {
        let provider = BytesProvider { payload };
        let (app, _) = AppState::load(
            AppConfig::default(),
            storage,
            scope,
            &provider,
            refresh,
            clock,
        )?;
        Ok(Self { app })
    }

    fn preview(&self) -> Result<JsonValue, WebError> {
        let item = self
            .app
            .selected_item()
            .ok_or_else(|| WebError::new("invalid_input", "Select an item first."))?;
        Ok(preview_json(
            self.app.dataset(),
            item,
            self.app.configurator(),
            &self.app.config().image_base_url,
        ))
    }

    fn search_items(&self, query: &str, armor_only: bool) -> JsonValue {
        item_list_json(&search_items(self.app.dataset(), query, armor_only))
    }

    fn configure(&mut self, options: &WebConfigureOptions) -> Result<JsonValue, WebError> {
        if !self.app.select_item(&options.id) {
            return Err(WebError::new(
                "not_found",
                format!("Unknown item id {}", options.id),
            ));
        }
        let cfg = self.app.configurator_mut();
        cfg.set_level(options.level);
        cfg.set_options(options.options);
        cfg.set_luck(options.luck);
        cfg.set_skill(options.skill);
        for pick in &options.excellent {
            cfg.toggle_excellent(&pick.name)?;
            if let Some(raw) = pick.rarity.as_deref() {
                cfg.set_rarity(&pick.name, parse_rarity(raw)?);
            }
        }
        self.preview()
    }

    fn toggle_excellent(&mut self, name: &str) -> Result<JsonValue, WebError> {
        self.app.configurator_mut().toggle_excellent(name)?;
        self.preview()
    }

    fn set_rarity(&mut self, name: &str, rarity: &str) -> Result<JsonValue, WebError> {
        let rarity = parse_rarity(rarity)?;
        self.app.configurator_mut().set_rarity(name, rarity);
        self.preview()
    }

    fn entries(&self, query: &str, hide_completed: bool) -> JsonValue {
        render_collection_json(&self.app, &EntryFilter::new(query, hide_completed))
    }

    fn add_to_collection(&mut self) -> Result<JsonValue, WebError> {
        let entry = self.app.add_to_collection()?;
        to_json(&entry)
    }

    fn add_item_to_collection(&mut self, collection_id: &str) -> Result<bool, WebError> {
        Ok(self.app.add_item_to_collection(collection_id)?)
    }

    fn add_set_to_collection(&mut self, name: &str, config: SetItemConfig) -> Result<usize, WebError> {
        self.app
            .add_set_to_collection(name, config)?
            .ok_or_else(|| WebError::new("not_found", format!("Unknown set {name}")))
    }

    fn edit_entry(&mut self, index: usize) -> Result<JsonValue, WebError> {
        if !self.app.edit_into_configurator(index) {
            return Err(WebError::new("not_found", format!("No entry at position {index}")));
        }
        self.preview()
    }

    fn switch_dataset(
        &mut self,
        scope: &str,
        payload: DatasetPayload,
        refresh: bool,
    ) -> Result<(), WebError> {
        let keys = self.app.config().keys(scope);
        let provider = BytesProvider { payload };
        let (dataset, _) = load_dataset_cached(
            self.app.store_mut().storage_mut(),
            &keys,
            &provider,
            refresh,
        )?;
        self.app.switch_dataset(scope, dataset)?;
        Ok(())
    }
}

fn js_result(value: Result<JsonValue, WebError>) -> Result<JsValue, JsValue> {
    let value = value.map_err(|err| err.to_js_value())?;
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| WebError::new("render_failed", err.to_string()).to_js_value())
}

fn payload(bytes: &[u8], content_type: Option<String>) -> DatasetPayload {
    DatasetPayload::new(bytes.to_vec(), content_type)
}

/// One open dataset scope with its collections, backed by browser storage.
#[wasm_bindgen]
pub struct GearbookApp {
    session: Session<Box<dyn Storage>>,
}

#[wasm_bindgen]
impl GearbookApp {
    #[wasm_bindgen(constructor)]
    pub fn new(
        storage: JsStorage,
        scope: &str,
        dataset: &[u8],
        content_type: Option<String>,
        refresh: bool,
    ) -> Result<GearbookApp, JsValue> {
        let storage: Box<dyn Storage> = Box::new(JsStorageAdapter { inner: storage });
        Session::open(
            storage,
            scope,
            payload(dataset, content_type),
            refresh,
            Box::new(JsClock),
        )
        .map(|session| Self { session })
        .map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = searchItems)]
    pub fn search_items(&self, query: &str, armor_only: bool) -> Result<JsValue, JsValue> {
        js_result(Ok(self.session.search_items(query, armor_only)))
    }

    pub fn sets(&self) -> Result<JsValue, JsValue> {
        js_result(Ok(sets_json(self.session.app.sets())))
    }

    pub fn configure(&mut self, options: JsValue) -> Result<JsValue, JsValue> {
        let options: WebConfigureOptions = parse_options(options).map_err(|err| err.to_js_value())?;
        js_result(self.session.configure(&options))
    }

    pub fn preview(&self) -> Result<JsValue, JsValue> {
        js_result(self.session.preview())
    }

    #[wasm_bindgen(js_name = toggleExcellent)]
    pub fn toggle_excellent(&mut self, name: &str) -> Result<JsValue, JsValue> {
        js_result(self.session.toggle_excellent(name))
    }

    #[wasm_bindgen(js_name = setRarity)]
    pub fn set_rarity(&mut self, name: &str, rarity: &str) -> Result<JsValue, JsValue> {
        js_result(self.session.set_rarity(name, rarity))
    }

    #[wasm_bindgen(js_name = resetConfig)]
    pub fn reset_config(&mut self) {
        self.session.app.configurator_mut().reset();
    }

    pub fn entries(&self, query: &str, hide_completed: bool) -> Result<JsValue, JsValue> {
        js_result(Ok(self.session.entries(query, hide_completed)))
    }

    #[wasm_bindgen(js_name = addToCollection)]
    pub fn add_to_collection(&mut self) -> Result<JsValue, JsValue> {
        js_result(self.session.add_to_collection())
    }

    #[wasm_bindgen(js_name = addItemToCollection)]
    pub fn add_item_to_collection(&mut self, collection_id: &str) -> Result<bool, JsValue> {
        self.session
            .add_item_to_collection(collection_id)
            .map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = addSetToCollection)]
    pub fn add_set_to_collection(&mut self, name: &str, config: JsValue) -> Result<usize, JsValue> {
        let config: SetItemConfig = parse_options(config).map_err(|err| err.to_js_value())?;
        self.session
            .add_set_to_collection(name, config)
            .map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = editEntry)]
    pub fn edit_entry(&mut self, index: usize) -> Result<JsValue, JsValue> {
        js_result(self.session.edit_entry(index))
    }

    #[wasm_bindgen(js_name = toggleDone)]
    pub fn toggle_done(&mut self, index: usize) -> Result<Option<bool>, JsValue> {
        self.session
            .app
            .toggle_done(index)
            .map_err(|err| WebError::from(err).to_js_value())
    }

    #[wasm_bindgen(js_name = removeEntry)]
    pub fn remove_entry(&mut self, index: usize) -> Result<bool, JsValue> {
        self.session
            .app
            .remove_entry(index)
            .map(|removed| removed.is_some())
            .map_err(|err| WebError::from(err).to_js_value())
    }

    pub fn wipe(&mut self) -> Result<usize, JsValue> {
        self.session
            .app
            .wipe()
            .map_err(|err| WebError::from(err).to_js_value())
    }

    #[wasm_bindgen(js_name = crossCheck)]
    pub fn cross_check(&self) -> Result<JsValue, JsValue> {
        js_result(to_json(&self.session.app.cross_check()))
    }

    pub fn collections(&self) -> Result<JsValue, JsValue> {
        let store = self.session.app.store();
        js_result(Ok(collections_list_json(store.collections(), store.active_id())))
    }

    #[wasm_bindgen(js_name = createCollection)]
    pub fn create_collection(&mut self, name: &str, description: &str) -> Result<String, JsValue> {
        self.session
            .app
            .store_mut()
            .create(name, description)
            .map_err(|err| WebError::from(err).to_js_value())
    }

    #[wasm_bindgen(js_name = switchCollection)]
    pub fn switch_collection(&mut self, id: &str) -> Result<bool, JsValue> {
        self.session
            .app
            .store_mut()
            .switch(id)
            .map_err(|err| WebError::from(err).to_js_value())
    }

    #[wasm_bindgen(js_name = renameCollection)]
    pub fn rename_collection(&mut self, id: &str, name: &str, description: &str) -> Result<bool, JsValue> {
        self.session
            .app
            .rename_collection(id, name, description)
            .map_err(|err| WebError::from(err).to_js_value())
    }

    #[wasm_bindgen(js_name = deleteCollection)]
    pub fn delete_collection(&mut self, id: &str) -> Result<bool, JsValue> {
        self.session
            .app
            .store_mut()
            .delete(id)
            .map_err(|err| WebError::from(err).to_js_value())
    }

    #[wasm_bindgen(js_name = exportCollection)]
    pub fn export_collection(&mut self, id: &str) -> Result<Option<String>, JsValue> {
        self.session
            .app
            .store_mut()
            .export_json(id)
            .map_err(|err| WebError::from(err).to_js_value())
    }

    #[wasm_bindgen(js_name = importCollection)]
    pub fn import_collection(&mut self, json: &str) -> Result<JsValue, JsValue> {
        let outcome = self.session.app.store_mut().import(json).map_err(WebError::from);
        js_result(outcome.and_then(|outcome| to_json(&outcome)))
    }

    #[wasm_bindgen(js_name = switchDataset)]
    pub fn switch_dataset(
        &mut self,
        scope: &str,
        dataset: &[u8],
        content_type: Option<String>,
        refresh: bool,
    ) -> Result<(), JsValue> {
        self.session
            .switch_dataset(scope, payload(dataset, content_type), refresh)
            .map_err(|err| err.to_js_value())
    }

    pub fn status(&self) -> Result<JsValue, JsValue> {
        let app = &self.session.app;
        js_result(Ok(object(vec![
            ("scope", JsonValue::String(app.scope().to_string())),
            ("items", JsonValue::from(app.dataset().len())),
            ("sets", JsonValue::from(app.sets().len())),
            ("activeCollection", JsonValue::String(app.store().active_id().to_string())),
        ])))
    }

    pub fn flush(&mut self) -> Result<(), JsValue> {
        self.session
            .app
            .store_mut()
            .flush()
            .map_err(|err| WebError::from(err).to_js_value())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use gearbook_core::dataset::{CONTENT_TYPE_JSON, DatasetPayload};
    use gearbook_core::{FixedClock, MemoryStorage, SetItemConfig};

    use super::{Session, WebConfigureOptions, WebExcellentPick, parse_rarity};

    fn fixture_payload() -> DatasetPayload {
        let full_path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .join("tests/fixtures/items.json");
        let bytes = fs::read(full_path).expect("fixture bytes should be readable");
        DatasetPayload::new(bytes, Some(CONTENT_TYPE_JSON.to_string()))
    }

    fn session() -> Session<MemoryStorage> {
        Session::open(
            MemoryStorage::new(),
            "items",
            fixture_payload(),
            false,
            Box::new(FixedClock(1_000)),
        )
        .expect("session should open")
    }

    #[test]
    fn configure_returns_preview_json() {
        let mut session = session();
        let options = WebConfigureOptions {
            id: "7-2".to_string(),
            level: 11,
            options: 3,
            luck: true,
            skill: true,
            excellent: vec![WebExcellentPick {
                name: "Reflect Damage %".to_string(),
                rarity: Some("legendary".to_string()),
            }],
        };
        let preview = session.configure(&options).expect("configure should succeed");
        assert_eq!(preview["name"], "Storm Crow Helm");
        assert_eq!(preview["effect"]["magnitude"], 45);
        assert_eq!(preview["skill"], true);
        let lines = preview["lines"].as_array().expect("lines");
        assert!(lines.iter().any(|l| l == "[LEGENDARY] Reflect Damage % (4%)"));
        assert!(!lines.iter().any(|l| l.as_str().is_some_and(|s| s.starts_with("Skill:"))));
    }

    #[test]
    fn configure_rejects_unknown_items_and_rarities() {
        let mut session = session();
        let err = session
            .configure(&WebConfigureOptions {
                id: "42-42".to_string(),
                ..WebConfigureOptions::default()
            })
            .expect_err("unknown id should fail");
        assert_eq!(err.code, "not_found");

        let err = parse_rarity("mythic").expect_err("unknown rarity should fail");
        assert_eq!(err.code, "invalid_options");
    }

    #[test]
    fn saving_without_selection_is_invalid_input() {
        let mut session = session();
        let err = session.add_to_collection().expect_err("nothing selected");
        assert_eq!(err.code, "invalid_input");
        assert_eq!(err.message, "Select an item first.");
    }

    #[test]
    fn excellent_limit_surfaces_as_not_allowed() {
        let mut session = session();
        session
            .configure(&WebConfigureOptions {
                id: "0-0".to_string(),
                ..WebConfigureOptions::default()
            })
            .expect("select Kris");
        for name in [
            "Excellent Damage Rate %",
            "Physical Damage Increase %",
            "Increases Attack Speed +",
            "Obtains (Life) when monster is killed",
        ] {
            session.toggle_excellent(name).expect("room left");
        }
        let err = session
            .toggle_excellent("Obtains (Mana) when monster is killed")
            .expect_err("fifth pick should fail");
        assert_eq!(err.code, "not_allowed");
    }

    #[test]
    fn entries_and_sets_flow_through_json() {
        let mut session = session();
        let added = session
            .add_set_to_collection("Bronze Set", SetItemConfig {
                level: 2,
                ..SetItemConfig::default()
            })
            .expect("set should be added");
        assert_eq!(added, 5);

        let entries = session.entries("", false);
        assert_eq!(entries["count"], 5);
        assert_eq!(entries["sets"][0]["done"], 0);

        let preview = session.edit_entry(4).expect("entry 4 exists");
        assert_eq!(preview["name"], "Bronze Boots");
        assert_eq!(preview["level"], 2);
        assert_eq!(
            session.edit_entry(9).expect_err("no entry 9").code,
            "not_found"
        );
    }

    #[test]
    fn datasets_switch_to_their_own_scope() {
        let mut session = session();
        session
            .configure(&WebConfigureOptions {
                id: "0-0".to_string(),
                ..WebConfigureOptions::default()
            })
            .expect("select Kris");
        session.add_to_collection().expect("save");

        session
            .switch_dataset("other", fixture_payload(), false)
            .expect("switch should succeed");
        assert_eq!(session.app.scope(), "other");
        assert_eq!(session.entries("", false)["count"], 0);
        assert!(session.preview().is_err());

        session
            .switch_dataset("items", fixture_payload(), false)
            .expect("switch back");
        assert_eq!(session.entries("", false)["count"], 1);
    }
}
