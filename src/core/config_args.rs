use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    convert::TryFrom,
    path::PathBuf,
    sync::Arc,
};

use serde_json::Value;

use crate::core::{
    asset_table::{AssetTable, Configurable},
    config_service::ConfigService,
    error::ConfigError,
    keyframe::KeyframeValue,
    transform::Transform,
};

/// Addresses one child of a document node, by table key or by array index.
pub trait ArgKey: Copy {
    fn lookup<'v>(self, node: &'v Value, path: &str) -> Result<&'v Value, ConfigError>;

    fn exists(self, node: &Value) -> bool;

    fn child_path(self, path: &str) -> String;

    fn record(self, _visited: &mut HashSet<String>) {}
}

impl<'k> ArgKey for &'k str {
    fn lookup<'v>(self, node: &'v Value, path: &str) -> Result<&'v Value, ConfigError> {
        let table = node
            .as_object()
            .ok_or_else(|| ConfigError::type_error(path, "table"))?;
        table.get(self).ok_or_else(|| ConfigError::KeyNotFound {
            path: path.to_owned(),
            key: self.to_owned(),
        })
    }

    fn exists(self, node: &Value) -> bool {
        node.as_object()
            .map_or(false, |table| table.contains_key(self))
    }

    fn child_path(self, path: &str) -> String {
        if path.is_empty() {
            self.to_owned()
        } else {
            format!("{}.{}", path, self)
        }
    }

    fn record(self, visited: &mut HashSet<String>) {
        visited.insert(self.to_owned());
    }
}

impl<'k> ArgKey for &'k String {
    fn lookup<'v>(self, node: &'v Value, path: &str) -> Result<&'v Value, ConfigError> {
        self.as_str().lookup(node, path)
    }

    fn exists(self, node: &Value) -> bool {
        self.as_str().exists(node)
    }

    fn child_path(self, path: &str) -> String {
        self.as_str().child_path(path)
    }

    fn record(self, visited: &mut HashSet<String>) {
        self.as_str().record(visited)
    }
}

impl ArgKey for usize {
    fn lookup<'v>(self, node: &'v Value, path: &str) -> Result<&'v Value, ConfigError> {
        let arr = node
            .as_array()
            .ok_or_else(|| ConfigError::type_error(path, "array"))?;
        arr.get(self).ok_or_else(|| ConfigError::IndexOutOfRange {
            path: path.to_owned(),
            index: self,
            size: arr.len(),
        })
    }

    fn exists(self, node: &Value) -> bool {
        node.as_array().map_or(false, |arr| self < arr.len())
    }

    fn child_path(self, path: &str) -> String {
        format!("{}[{}]", path, self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Table,
    Array,
    Integer,
    Float,
    Bool,
    String,
    Null,
}

impl NodeKind {
    fn of(node: &Value) -> Self {
        match node {
            Value::Object(_) => Self::Table,
            Value::Array(_) => Self::Array,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Float,
            Value::Bool(_) => Self::Bool,
            Value::String(_) => Self::String,
            Value::Null => Self::Null,
        }
    }
}

/// Read-only, time-aware view over one node of the scene document.
///
/// Children created through [`ConfigArgs::child`] inherit the current time. Animated
/// fields (`{ "times": [...], "values": [...] }`) are evaluated at that time through the
/// owning service's keyframe cache.
pub struct ConfigArgs<'a> {
    service: &'a ConfigService,
    node: &'a Value,
    path: String,
    time: Cell<f32>,
    visited: RefCell<HashSet<String>>,
}

macro_rules! args_load_vec {
    ( $( ( $name:ident, $type:ty ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                pub fn [<load_ $name>]<K: ArgKey>(&self, key: K) -> Result<$type, ConfigError> {
                    self.load_animated(key, false)
                }

                pub fn [<load_normalized_ $name>]<K: ArgKey>(
                    &self,
                    key: K,
                ) -> Result<$type, ConfigError> {
                    self.load_animated(key, true)
                }
            }
        )+
    };
}

macro_rules! args_load_or {
    ( $( ( $name:ident, $type:ty ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[allow(dead_code)]
                pub fn [<load_ $name _or>]<K: ArgKey>(
                    &self,
                    key: K,
                    fallback: $type,
                ) -> Result<$type, ConfigError> {
                    if key.exists(self.node) {
                        self.[<load_ $name>](key)
                    } else {
                        Ok(fallback)
                    }
                }
            }
        )+
    };
}

impl<'a> ConfigArgs<'a> {
    pub(crate) fn new(service: &'a ConfigService, node: &'a Value, path: String) -> Self {
        Self {
            service,
            node,
            path,
            time: Cell::new(0.0),
            visited: RefCell::new(HashSet::new()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn time(&self) -> f32 {
        self.time.get()
    }

    /// Later loads through this view, and children created afterwards, sample at `time`.
    pub fn update_time(&self, time: f32) {
        self.time.set(time);
    }

    pub fn asset_table(&self) -> &'a AssetTable {
        self.service.asset_table()
    }

    pub fn contains(&self, key: &str) -> bool {
        key.exists(self.node)
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::of(self.node)
    }

    pub fn kind_of<K: ArgKey>(&self, key: K) -> Result<NodeKind, ConfigError> {
        key.lookup(self.node, &self.path).map(NodeKind::of)
    }

    pub fn array_size(&self) -> Result<usize, ConfigError> {
        self.node
            .as_array()
            .map(|arr| arr.len())
            .ok_or_else(|| ConfigError::type_error(&self.path, "array"))
    }

    /// Keys of the current table in document order.
    pub fn keys(&self) -> Result<Vec<String>, ConfigError> {
        self.node
            .as_object()
            .map(|table| table.keys().cloned().collect())
            .ok_or_else(|| ConfigError::type_error(&self.path, "table"))
    }

    pub fn child<K: ArgKey>(&self, key: K) -> Result<ConfigArgs<'a>, ConfigError> {
        let node = self.lookup(key)?;
        let child = ConfigArgs::new(self.service, node, key.child_path(&self.path));
        child.time.set(self.time.get());
        Ok(child)
    }

    fn lookup<K: ArgKey>(&self, key: K) -> Result<&'a Value, ConfigError> {
        let node = key.lookup(self.node, &self.path)?;
        key.record(&mut self.visited.borrow_mut());
        Ok(node)
    }

    pub fn load_integer<K: ArgKey>(&self, key: K) -> Result<i32, ConfigError> {
        let node = self.lookup(key)?;
        node.as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .ok_or_else(|| ConfigError::type_error(key.child_path(&self.path), "integer"))
    }

    pub fn load_bool<K: ArgKey>(&self, key: K) -> Result<bool, ConfigError> {
        let node = self.lookup(key)?;
        node.as_bool()
            .ok_or_else(|| ConfigError::type_error(key.child_path(&self.path), "boolean"))
    }

    pub fn load_string<K: ArgKey>(&self, key: K) -> Result<String, ConfigError> {
        let node = self.lookup(key)?;
        node.as_str()
            .map(str::to_owned)
            .ok_or_else(|| ConfigError::type_error(key.child_path(&self.path), "string"))
    }

    pub fn load_string_or<K: ArgKey>(&self, key: K, fallback: &str) -> Result<String, ConfigError> {
        if key.exists(self.node) {
            self.load_string(key)
        } else {
            Ok(fallback.to_owned())
        }
    }

    /// Relative paths are resolved against the directory of the scene file, if any.
    pub fn load_path<K: ArgKey>(&self, key: K) -> Result<PathBuf, ConfigError> {
        let path = PathBuf::from(self.load_string(key)?);
        match self.service.base_dir() {
            Some(base) if path.is_relative() => Ok(base.join(path)),
            _ => Ok(path),
        }
    }

    pub fn load_float<K: ArgKey>(&self, key: K) -> Result<f32, ConfigError> {
        self.load_animated(key, false)
    }

    args_load_vec! {
        (vec2, glam::Vec2),
        (vec3, glam::Vec3),
        (vec4, glam::Vec4),
    }

    args_load_or! {
        (integer, i32),
        (bool, bool),
        (float, f32),
        (vec2, glam::Vec2),
        (vec3, glam::Vec3),
        (vec4, glam::Vec4),
    }

    fn load_animated<T: KeyframeValue, K: ArgKey>(
        &self,
        key: K,
        normalize: bool,
    ) -> Result<T, ConfigError> {
        let node = self.lookup(key)?;
        let path = key.child_path(&self.path);
        if node.is_object() {
            return self
                .service
                .keyframe_cache()
                .evaluate(node, normalize, self.time(), &path);
        }
        let value = T::from_node(node).ok_or_else(|| {
            ConfigError::type_error(&path, format!("{} or keyframe table", T::EXPECTED))
        })?;
        Ok(if normalize { value.normalized() } else { value })
    }

    /// Reads `{ scale, rotation, translation }`; rotation is roll, pitch, yaw in degrees.
    pub fn load_transform<K: ArgKey>(&self, key: K) -> Result<Transform, ConfigError> {
        let node = self.lookup(key)?;
        let path = key.child_path(&self.path);
        let table = node
            .as_object()
            .ok_or_else(|| ConfigError::type_error(&path, "transform table"))?;
        let read = |name: &str, fallback: glam::Vec3| match table.get(name) {
            Some(value) => glam::Vec3::from_node(value).ok_or_else(|| {
                ConfigError::type_error(format!("{}.{}", path, name), glam::Vec3::EXPECTED)
            }),
            None => Ok(fallback),
        };
        for name in table.keys() {
            if !matches!(name.as_str(), "scale" | "rotation" | "translation")
                && !name.starts_with('#')
            {
                log::warn!("{} - unused key '{}'", path, name);
            }
        }

        let scale = read("scale", glam::Vec3::ONE)?;
        if scale.cmpeq(glam::Vec3::ZERO).any() || !scale.is_finite() {
            return Err(ConfigError::schema(
                format!("{}.scale", path),
                format!("should be finite and non-zero, got {}", scale),
            ));
        }
        let rotation = read("rotation", glam::Vec3::ZERO)?;
        let translation = read("translation", glam::Vec3::ZERO)?;
        Ok(Transform::from_scale_euler_translation(
            scale,
            rotation.x.to_radians(),
            rotation.y.to_radians(),
            rotation.z.to_radians(),
            translation,
        ))
    }

    pub fn load_transform_or_identity(&self, key: &str) -> Result<Transform, ConfigError> {
        if key.exists(self.node) {
            self.load_transform(key)
        } else {
            Ok(Transform::IDENTITY)
        }
    }

    /// Reads a string path such as `"texture.checker"` and fetches that asset.
    pub fn load_asset<T: Configurable, K: ArgKey>(&self, key: K) -> Result<Arc<T>, ConfigError> {
        let asset_path = self.load_string(key)?;
        self.asset_table().require::<T>(&asset_path)
    }

    /// Marks keys that are consumed outside of the typed loaders.
    pub fn mark_used(&self, key: &str) {
        self.visited.borrow_mut().insert(key.to_owned());
    }

    pub fn unused_keys(&self) -> Vec<String> {
        let visited = self.visited.borrow();
        self.node
            .as_object()
            .map(|table| {
                table
                    .keys()
                    .filter(|k| !k.starts_with('#') && !visited.contains(*k))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn check_unused_keys(&self) {
        for k in self.unused_keys() {
            log::warn!("{} - unused key '{}'", self.path, k);
        }
    }
}

impl Clone for ConfigArgs<'_> {
    fn clone(&self) -> Self {
        Self {
            service: self.service,
            node: self.node,
            path: self.path.clone(),
            time: Cell::new(self.time.get()),
            visited: RefCell::new(HashSet::new()),
        }
    }
}

impl std::fmt::Debug for ConfigArgs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigArgs")
            .field("path", &self.path)
            .field("time", &self.time.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(text: &str) -> ConfigService {
        let mut service = ConfigService::new();
        service.try_parse(text).unwrap();
        service
    }

    #[test]
    fn scalar_loaders_require_matching_kinds() {
        let service = service(
            r#"{ "obj": { "n": 3, "f": 0.5, "b": true, "s": "hi", "arr": [1, 2.5, "x"] } }"#,
        );
        let args = service.root_args().child("obj").unwrap();

        assert_eq!(args.load_integer("n").unwrap(), 3);
        assert_eq!(args.load_float("n").unwrap(), 3.0);
        assert_eq!(args.load_float("f").unwrap(), 0.5);
        assert!(args.load_bool("b").unwrap());
        assert_eq!(args.load_string("s").unwrap(), "hi");

        assert!(matches!(args.load_integer("f"), Err(ConfigError::Type { .. })));
        assert!(matches!(args.load_bool("s"), Err(ConfigError::Type { .. })));
        assert!(matches!(args.load_string("n"), Err(ConfigError::Type { .. })));
        assert!(matches!(args.load_float("s"), Err(ConfigError::Type { .. })));

        let arr = args.child("arr").unwrap();
        assert_eq!(arr.array_size().unwrap(), 3);
        assert_eq!(arr.load_integer(0).unwrap(), 1);
        assert_eq!(arr.load_float(1).unwrap(), 2.5);
        assert_eq!(arr.load_string(2).unwrap(), "x");
    }

    #[test]
    fn missing_children_are_reported_not_created() {
        let service = service(r#"{ "obj": { "arr": [1, 2] } }"#);
        let args = service.root_args().child("obj").unwrap();

        match args.load_float("missing") {
            Err(ConfigError::KeyNotFound { path, key }) => {
                assert_eq!(path, "obj");
                assert_eq!(key, "missing");
            }
            other => panic!("unexpected {:?}", other),
        }
        match args.child("arr").unwrap().child(5) {
            Err(ConfigError::IndexOutOfRange { path, index, size }) => {
                assert_eq!(path, "obj.arr");
                assert_eq!((index, size), (5, 2));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(args.array_size(), Err(ConfigError::Type { .. })));
        assert!(matches!(args.child(0), Err(ConfigError::Type { .. })));
        assert!(!args.contains("missing"));
        assert!(args.contains("arr"));
        assert!(!args.child("arr").unwrap().contains("arr"));
    }

    #[test]
    fn fallbacks_only_cover_missing_keys() {
        let service = service(r#"{ "obj": { "spp": "many" } }"#);
        let args = service.root_args().child("obj").unwrap();
        assert_eq!(args.load_integer_or("depth", 4).unwrap(), 4);
        assert_eq!(
            args.load_vec3_or("color", glam::Vec3::ONE).unwrap(),
            glam::Vec3::ONE
        );
        assert_eq!(args.load_string_or("name", "none").unwrap(), "none");
        assert!(args.load_integer_or("spp", 4).is_err());
    }

    #[test]
    fn vectors_have_fixed_arity() {
        let service = service(r#"{ "v": { "a": [3, 0, 4], "b": [1, 2], "c": [1, 2, 3, 4] } }"#);
        let args = service.root_args().child("v").unwrap();
        assert_eq!(args.load_vec3("a").unwrap(), glam::Vec3::new(3.0, 0.0, 4.0));
        assert!(args
            .load_normalized_vec3("a")
            .unwrap()
            .abs_diff_eq(glam::Vec3::new(0.6, 0.0, 0.8), 1e-6));
        assert_eq!(args.load_vec2("b").unwrap(), glam::Vec2::new(1.0, 2.0));
        assert_eq!(args.load_vec4("c").unwrap(), glam::Vec4::new(1.0, 2.0, 3.0, 4.0));
        assert!(matches!(args.load_vec3("b"), Err(ConfigError::Type { .. })));
        assert!(matches!(args.load_vec3("c"), Err(ConfigError::Type { .. })));
    }

    #[test]
    fn animated_fields_follow_the_view_time() {
        let service = service(
            r#"{ "cam": {
                "fov": { "times": [0, 10], "values": [30, 50] },
                "eye": { "times": [0, 1], "values": [[0, 0, 0], [2, 2, 2]] }
            } }"#,
        );
        let args = service.root_args().child("cam").unwrap();
        assert_eq!(args.load_float("fov").unwrap(), 30.0);
        assert_eq!(service.keyframe_cache().len(), 1);

        args.update_time(5.0);
        assert_eq!(args.load_float("fov").unwrap(), 40.0);
        assert_eq!(args.load_float("fov").unwrap(), 40.0);
        assert_eq!(service.keyframe_cache().len(), 1);

        args.update_time(0.5);
        assert_eq!(args.load_vec3("eye").unwrap(), glam::Vec3::ONE);
        assert_eq!(service.keyframe_cache().len(), 2);

        args.update_time(20.0);
        assert_eq!(args.load_float("fov").unwrap(), 50.0);
    }

    #[test]
    fn time_is_inherited_only_by_later_children() {
        let service = service(r#"{ "a": { "b": { "x": { "times": [0, 1], "values": [0, 1] } } } }"#);
        let root = service.root_args();
        let a = root.child("a").unwrap();
        let before = a.child("b").unwrap();

        a.update_time(0.25);
        let after = a.child("b").unwrap();
        assert_eq!(before.load_float("x").unwrap(), 0.0);
        assert_eq!(after.load_float("x").unwrap(), 0.25);
        assert_eq!(root.time(), 0.0);

        let copy = after.clone();
        copy.update_time(1.0);
        assert_eq!(after.time(), 0.25);
        assert_eq!(copy.load_float("x").unwrap(), 1.0);
    }

    #[test]
    fn malformed_animation_is_a_schema_error() {
        let service = service(r#"{ "o": { "x": { "times": [0, 1], "values": [1] } } }"#);
        let args = service.root_args().child("o").unwrap();
        assert!(matches!(args.load_float("x"), Err(ConfigError::Schema { .. })));
        assert!(service.keyframe_cache().is_empty());
    }

    #[test]
    fn transform_defaults_and_composition() {
        let service = service(
            r#"{ "o": {
                "empty": {},
                "full": { "scale": [2, 2, 2], "rotation": [0, 0, 90], "translation": [1, 0, 0] },
                "bad": { "scale": [1, 2] },
                "flat": { "scale": [1, 0, 1] }
            } }"#,
        );
        let args = service.root_args().child("o").unwrap();

        let identity = args.load_transform("empty").unwrap();
        let p = glam::Vec3::new(1.0, 2.0, 3.0);
        assert!(identity.transform_point3(p).abs_diff_eq(p, 1e-6));

        let full = args.load_transform("full").unwrap();
        let q = full.transform_point3(glam::Vec3::X);
        assert!(q.abs_diff_eq(glam::Vec3::new(1.0, 2.0, 0.0), 1e-5));

        assert!(matches!(args.load_transform("bad"), Err(ConfigError::Type { .. })));
        assert!(matches!(args.load_transform("flat"), Err(ConfigError::Schema { .. })));
        assert!(args.load_transform_or_identity("none").is_ok());
    }

    #[test]
    fn unused_keys_are_tracked() {
        let service = service(r##"{ "o": { "a": 1, "b": 2, "#note": "x", "c": { "d": 1 } } }"##);
        let args = service.root_args().child("o").unwrap();
        args.load_integer("a").unwrap();
        args.child("c").unwrap();
        assert_eq!(args.unused_keys(), vec!["b".to_owned()]);
        args.mark_used("b");
        assert!(args.unused_keys().is_empty());
    }

    #[test]
    fn kinds_are_reported() {
        let service = service(r#"{ "o": { "t": {}, "s": "x", "i": 1, "f": 1.5, "n": null } }"#);
        let args = service.root_args().child("o").unwrap();
        assert_eq!(args.kind(), NodeKind::Table);
        assert_eq!(args.kind_of("s").unwrap(), NodeKind::String);
        assert_eq!(args.kind_of("i").unwrap(), NodeKind::Integer);
        assert_eq!(args.kind_of("f").unwrap(), NodeKind::Float);
        assert_eq!(args.kind_of("n").unwrap(), NodeKind::Null);
        assert_eq!(args.keys().unwrap(), vec!["t", "s", "i", "f", "n"]);
    }
}
