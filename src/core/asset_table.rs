use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, RwLock},
};

use anyhow::Context;
use serde_json::Value;

use crate::core::{config_args::ConfigArgs, config_service::ConfigService, error::ConfigError};

/// Upcast helper so that assets can be recovered as their concrete type.
pub trait AsAnyArc {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Anything that can be built from a sub-table of the scene document.
pub trait Configurable: AsAnyArc + Any + Send + Sync {}

impl dyn Configurable {
    pub fn is<T: Configurable>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_arc<T: Configurable>(self: Arc<Self>) -> Option<Arc<T>> {
        self.as_any_arc().downcast::<T>().ok()
    }
}

pub type AssetParser =
    Box<dyn Fn(&ConfigArgs<'_>) -> anyhow::Result<Arc<dyn Configurable>> + Send + Sync>;

#[derive(Default)]
struct AssetStore {
    indices: HashMap<String, usize>,
    entries: Vec<(String, Arc<dyn Configurable>)>,
}

impl AssetStore {
    fn insert(&mut self, path: String, asset: Arc<dyn Configurable>) {
        if let Some(&index) = self.indices.get(&path) {
            log::warn!("asset '{}' is defined more than once, the last one is kept", path);
            self.entries[index].1 = asset;
        } else {
            self.indices.insert(path.clone(), self.entries.len());
            self.entries.push((path, asset));
        }
    }
}

/// Assets keyed by `category.name`, built by one parser per category.
///
/// Categories load in registration order and entries in document order, in a single
/// pass: a parser can only see assets that were built before it.
#[derive(Default)]
pub struct AssetTable {
    parsers: Vec<(String, AssetParser)>,
    assets: RwLock<AssetStore>,
}

impl AssetTable {
    pub fn register_parser(&mut self, prefix: &str, parser: AssetParser) {
        if let Some(slot) = self.parsers.iter_mut().find(|(p, _)| p == prefix) {
            log::warn!("parser of '{}' is registered again, replacing the old one", prefix);
            slot.1 = parser;
        } else {
            self.parsers.push((prefix.to_owned(), parser));
        }
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.parsers.iter().map(|(prefix, _)| prefix.as_str())
    }

    pub(crate) fn load(&self, service: &ConfigService, document: &Value) -> anyhow::Result<()> {
        for (prefix, parser) in &self.parsers {
            let entries = match document.get(prefix) {
                Some(entries) => entries,
                None => continue,
            };
            let entries = entries
                .as_object()
                .ok_or_else(|| ConfigError::schema(prefix.as_str(), "should be a table of assets"))?;

            for (name, node) in entries {
                if name.starts_with('#') {
                    continue;
                }
                let path = format!("{}.{}", prefix, name);
                if !node.is_object() {
                    return Err(ConfigError::schema(path, "asset should be a table").into());
                }

                let args = ConfigArgs::new(service, node, path.clone());
                let asset =
                    parser(&args).with_context(|| format!("failed to load asset '{}'", path))?;
                args.check_unused_keys();
                log::debug!("loaded asset '{}'", path);

                self.assets.write().unwrap().insert(path, asset);
            }
        }
        Ok(())
    }

    /// `None` when nothing is stored under `path`.
    pub fn get(&self, path: &str) -> Option<Arc<dyn Configurable>> {
        let assets = self.assets.read().unwrap();
        assets
            .indices
            .get(path)
            .map(|&index| assets.entries[index].1.clone())
    }

    /// `None` when nothing is stored under `path` or the asset is not a `T`.
    pub fn get_as<T: Configurable>(&self, path: &str) -> Option<Arc<T>> {
        self.get(path).and_then(|asset| asset.downcast_arc::<T>())
    }

    pub fn require<T: Configurable>(&self, path: &str) -> Result<Arc<T>, ConfigError> {
        let asset = self
            .get(path)
            .ok_or_else(|| ConfigError::AssetNotFound(path.to_owned()))?;
        asset.downcast_arc::<T>().ok_or_else(|| ConfigError::AssetType {
            path: path.to_owned(),
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.assets.read().unwrap().indices.contains_key(path)
    }

    /// Paths under `prefix.` in load order.
    pub fn paths_with_prefix(&self, prefix: &str) -> Vec<String> {
        let head = format!("{}.", prefix);
        self.assets
            .read()
            .unwrap()
            .entries
            .iter()
            .filter(|(path, _)| path.starts_with(&head))
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.assets.read().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Number(i32);
    impl Configurable for Number {}

    struct Label(String);
    impl Configurable for Label {}

    fn service_with_parsers(text: &str) -> ConfigService {
        let mut service = ConfigService::new();
        service.register_asset("number", |args| Ok(Number(args.load_integer("value")?)));
        service.register_asset("label", |args| {
            let number = args.load_asset::<Number, _>("number")?;
            Ok(Label(format!("{}-{}", args.load_string("text")?, number.0)))
        });
        service.try_parse(text).unwrap();
        service
    }

    #[test]
    fn assets_are_stored_under_category_paths() {
        let service = service_with_parsers(
            r#"{
                "number": { "one": { "value": 1 }, "two": { "value": 2 } },
                "label": { "first": { "text": "a", "number": "number.one" } }
            }"#,
        );
        service.load_assets().unwrap();

        let table = service.asset_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get_as::<Number>("number.two").unwrap().0, 2);
        assert_eq!(table.get_as::<Label>("label.first").unwrap().0, "a-1");
        assert!(table.get("number.three").is_none());
        assert!(table.get_as::<Label>("number.one").is_none());
        assert!(table.get("number.one").unwrap().is::<Number>());
        assert_eq!(table.paths_with_prefix("number"), vec!["number.one", "number.two"]);

        assert!(matches!(
            table.require::<Number>("number.zero"),
            Err(ConfigError::AssetNotFound(_))
        ));
        assert!(matches!(
            table.require::<Number>("label.first"),
            Err(ConfigError::AssetType { .. })
        ));
    }

    #[test]
    fn references_to_unloaded_assets_fail() {
        let service = service_with_parsers(
            r#"{ "label": { "first": { "text": "a", "number": "number.one" } } }"#,
        );
        let err = service.load_assets().unwrap_err();
        let cause = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(cause, ConfigError::AssetNotFound(path) if path == "number.one"));
        assert!(format!("{:#}", err).contains("label.first"));
    }

    #[test]
    fn categories_must_be_tables() {
        let service = service_with_parsers(r#"{ "number": [1, 2] }"#);
        assert!(service.load_assets().is_err());

        let service = service_with_parsers(r#"{ "number": { "one": 1 } }"#);
        assert!(service.load_assets().is_err());
    }

    #[test]
    fn parser_errors_name_the_asset() {
        let service = service_with_parsers(r#"{ "number": { "bad": { "value": "x" } } }"#);
        let err = service.load_assets().unwrap_err();
        assert!(format!("{:#}", err).contains("number.bad"));
        assert!(service.asset_table().is_empty());
    }

    #[test]
    fn re_registering_a_prefix_replaces_its_parser() {
        let mut service = ConfigService::new();
        service.register_asset("number", |_| Ok(Number(1)));
        service.register_asset("number", |_| Ok(Number(2)));
        service
            .try_parse(r#"{ "number": { "n": {} } }"#)
            .unwrap();
        service.load_assets().unwrap();
        assert_eq!(service.asset_table().prefixes().count(), 1);
        assert_eq!(
            service.asset_table().get_as::<Number>("number.n").unwrap().0,
            2
        );
    }
}
