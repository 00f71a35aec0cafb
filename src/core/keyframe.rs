use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Mutex,
};

use serde_json::Value;

use crate::core::error::ConfigError;

/// A value that can be sampled from an animated field.
pub trait KeyframeValue: Copy + Send + 'static {
    const EXPECTED: &'static str;

    fn from_node(node: &Value) -> Option<Self>;

    fn lerp(self, other: Self, t: f32) -> Self;

    fn normalized(self) -> Self {
        self
    }

    fn fields(cache: &KeyframeCache) -> &Mutex<HashMap<NodeKey, Keyframes<Self>>>;
}

fn components<const N: usize>(node: &Value) -> Option<[f32; N]> {
    let arr = node.as_array()?;
    if arr.len() != N {
        return None;
    }
    let mut result = [0.0; N];
    for (dst, ele) in result.iter_mut().zip(arr) {
        *dst = ele.as_f64()? as f32;
    }
    Some(result)
}

impl KeyframeValue for f32 {
    const EXPECTED: &'static str = "float";

    fn from_node(node: &Value) -> Option<Self> {
        node.as_f64().map(|v| v as f32)
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn fields(cache: &KeyframeCache) -> &Mutex<HashMap<NodeKey, Keyframes<Self>>> {
        &cache.floats
    }
}

macro_rules! keyframe_value_vec {
    ( $( ( $type:ty, $len:expr, $field:ident, $hint:expr ) ),+ $(,)? ) => {
        $(
            impl KeyframeValue for $type {
                const EXPECTED: &'static str = $hint;

                fn from_node(node: &Value) -> Option<Self> {
                    components::<$len>(node).map(<$type>::from)
                }

                fn lerp(self, other: Self, t: f32) -> Self {
                    <$type>::lerp(self, other, t)
                }

                fn normalized(self) -> Self {
                    self.normalize_or_zero()
                }

                fn fields(cache: &KeyframeCache) -> &Mutex<HashMap<NodeKey, Keyframes<Self>>> {
                    &cache.$field
                }
            }
        )+
    };
}

keyframe_value_vec! {
    (glam::Vec2, 2, vec2s, "array with 2 floats"),
    (glam::Vec3, 3, vec3s, "array with 3 floats"),
    (glam::Vec4, 4, vec4s, "array with 4 floats"),
}

/// Sparse samples of an animated quantity, strictly increasing in time.
#[derive(Debug, Clone)]
pub struct Keyframes<T> {
    times: Vec<f32>,
    values: Vec<T>,
}

impl<T: KeyframeValue> Keyframes<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>) -> Result<Self, ConfigError> {
        Self::validate(&times, values.len(), "keyframes")?;
        Ok(Self { times, values })
    }

    fn validate(times: &[f32], num_values: usize, path: &str) -> Result<(), ConfigError> {
        if times.len() != num_values {
            return Err(ConfigError::schema(
                path,
                format!(
                    "'times' has {} elements but 'values' has {}",
                    times.len(),
                    num_values
                ),
            ));
        }
        if times.is_empty() {
            return Err(ConfigError::schema(path, "at least one keyframe is needed"));
        }
        if let Some(i) = times.windows(2).position(|w| !(w[0] < w[1])) {
            return Err(ConfigError::schema(
                path,
                format!(
                    "keyframe times should be strictly increasing ({} at {} is followed by {})",
                    times[i],
                    i,
                    times[i + 1]
                ),
            ));
        }
        Ok(())
    }

    /// Reads a `{ times, values }` table. With `normalize`, each keyframe value is
    /// normalized on its own before any interpolation happens.
    pub fn parse(node: &Value, normalize: bool, path: &str) -> Result<Self, ConfigError> {
        let table = node.as_object().ok_or_else(|| {
            ConfigError::schema(path, format!("should be {} or keyframe table", T::EXPECTED))
        })?;
        let times = table
            .get("times")
            .ok_or_else(|| ConfigError::schema(path, "keyframe table has no 'times' array"))?
            .as_array()
            .ok_or_else(|| ConfigError::schema(path, "'times' should be an array"))?;
        let values = table
            .get("values")
            .ok_or_else(|| ConfigError::schema(path, "keyframe table has no 'values' array"))?
            .as_array()
            .ok_or_else(|| ConfigError::schema(path, "'values' should be an array"))?;

        let times = times
            .iter()
            .enumerate()
            .map(|(i, t)| {
                t.as_f64().map(|t| t as f32).ok_or_else(|| {
                    ConfigError::schema(path, format!("'times[{}]' should be float", i))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let values = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let value = T::from_node(v).ok_or_else(|| {
                    ConfigError::schema(path, format!("'values[{}]' should be {}", i, T::EXPECTED))
                })?;
                Ok(if normalize { value.normalized() } else { value })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Self::validate(&times, values.len(), path)?;
        Ok(Self { times, values })
    }

    pub fn evaluate(&self, time: f32) -> T {
        let last = self.times.len() - 1;
        if !(time > self.times[0]) {
            return self.values[0];
        }
        if time >= self.times[last] {
            return self.values[last];
        }
        let i = self.times.partition_point(|&t| t <= time) - 1;
        let (t0, t1) = (self.times[i], self.times[i + 1]);
        self.values[i].lerp(self.values[i + 1], (time - t0) / (t1 - t0))
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

/// Identity of a document node, valid while the owning document is alive and unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    addr: usize,
    normalize: bool,
}

impl NodeKey {
    pub fn of(node: &Value, normalize: bool) -> Self {
        Self {
            addr: node as *const Value as usize,
            normalize,
        }
    }
}

/// Parsed animated fields of one configuration service, keyed by node identity.
#[derive(Default)]
pub struct KeyframeCache {
    floats: Mutex<HashMap<NodeKey, Keyframes<f32>>>,
    vec2s: Mutex<HashMap<NodeKey, Keyframes<glam::Vec2>>>,
    vec3s: Mutex<HashMap<NodeKey, Keyframes<glam::Vec3>>>,
    vec4s: Mutex<HashMap<NodeKey, Keyframes<glam::Vec4>>>,
}

impl KeyframeCache {
    pub fn evaluate<T: KeyframeValue>(
        &self,
        node: &Value,
        normalize: bool,
        time: f32,
        path: &str,
    ) -> Result<T, ConfigError> {
        let mut fields = T::fields(self).lock().unwrap();
        let field = match fields.entry(NodeKey::of(node, normalize)) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let field = Keyframes::parse(node, normalize, path)?;
                log::debug!("{} - parsed {} keyframes", path, field.len());
                entry.insert(field)
            }
        };
        Ok(field.evaluate(time))
    }

    pub fn len(&self) -> usize {
        self.floats.lock().unwrap().len()
            + self.vec2s.lock().unwrap().len()
            + self.vec3s.lock().unwrap().len()
            + self.vec4s.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.floats.lock().unwrap().clear();
        self.vec2s.lock().unwrap().clear();
        self.vec3s.lock().unwrap().clear();
        self.vec4s.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamps_outside_of_keyframes() {
        let field = Keyframes::new(vec![1.0, 2.0, 4.0], vec![10.0_f32, 20.0, 0.0]).unwrap();
        assert_eq!(field.evaluate(-3.0), 10.0);
        assert_eq!(field.evaluate(1.0), 10.0);
        assert_eq!(field.evaluate(4.0), 0.0);
        assert_eq!(field.evaluate(100.0), 0.0);
    }

    #[test]
    fn interpolates_between_bracketing_keyframes() {
        let field = Keyframes::new(vec![1.0, 2.0, 4.0], vec![10.0_f32, 20.0, 0.0]).unwrap();
        assert_eq!(field.evaluate(1.5), 15.0);
        assert_eq!(field.evaluate(2.0), 20.0);
        assert_eq!(field.evaluate(3.0), 10.0);
        assert_eq!(field.evaluate(3.5), 20.0 + (3.5 - 2.0) / (4.0 - 2.0) * (0.0 - 20.0));
    }

    #[test]
    fn single_keyframe_is_constant() {
        let field = Keyframes::new(vec![0.5], vec![glam::Vec3::new(1.0, 2.0, 3.0)]).unwrap();
        assert_eq!(field.evaluate(0.0), glam::Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(field.evaluate(9.0), glam::Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn vectors_interpolate_component_wise() {
        let node = json!({ "times": [0.0, 2.0], "values": [[0, 0, 0], [2, 4, -8]] });
        let field = Keyframes::<glam::Vec3>::parse(&node, false, "pos").unwrap();
        assert_eq!(field.evaluate(0.5), glam::Vec3::new(0.5, 1.0, -2.0));
    }

    #[test]
    fn normalization_applies_to_each_keyframe() {
        let node = json!({ "times": [0, 1], "values": [[2, 0, 0], [0, 0, 5]] });
        let field = Keyframes::<glam::Vec3>::parse(&node, true, "dir").unwrap();
        assert_eq!(field.values()[0], glam::Vec3::X);
        assert_eq!(field.values()[1], glam::Vec3::Z);
        // midpoint of two unit vectors is not renormalized
        assert_eq!(field.evaluate(0.5), glam::Vec3::new(0.5, 0.0, 0.5));
    }

    #[test]
    fn rejects_malformed_tables() {
        let cases = vec![
            json!({ "values": [1.0] }),
            json!({ "times": [0.0] }),
            json!({ "times": 0.0, "values": [1.0] }),
            json!({ "times": [0.0, 1.0], "values": [1.0] }),
            json!({ "times": [], "values": [] }),
            json!({ "times": [1.0, 0.0], "values": [1.0, 2.0] }),
            json!({ "times": [0.0, 0.0], "values": [1.0, 2.0] }),
            json!({ "times": ["a"], "values": [1.0] }),
            json!({ "times": [0.0], "values": [[1.0]] }),
            json!([0.0, 1.0]),
        ];
        for node in cases {
            let result = Keyframes::<f32>::parse(&node, false, "field");
            assert!(
                matches!(result, Err(ConfigError::Schema { .. })),
                "{} should be rejected",
                node
            );
        }

        let node = json!({ "times": [0.0, 1.0], "values": [[1, 2], [3, 4]] });
        assert!(Keyframes::<glam::Vec3>::parse(&node, false, "field").is_err());
        assert!(Keyframes::<glam::Vec2>::parse(&node, false, "field").is_ok());
    }

    #[test]
    fn cache_parses_each_node_once() {
        let node = json!({ "times": [0.0, 1.0], "values": [0.0, 1.0] });
        let cache = KeyframeCache::default();
        let a: f32 = cache.evaluate(&node, false, 0.25, "x").unwrap();
        assert_eq!(cache.len(), 1);
        let b: f32 = cache.evaluate(&node, false, 0.25, "x").unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        let c: f32 = cache.evaluate(&node, false, 0.75, "x").unwrap();
        assert_eq!(c, 0.75);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_does_not_store_failures() {
        let node = json!({ "times": [0.0, 1.0], "values": [0.0] });
        let cache = KeyframeCache::default();
        assert!(cache.evaluate::<f32>(&node, false, 0.0, "x").is_err());
        assert!(cache.is_empty());
    }
}
