//! Deep merge of YAML configuration layers.
//!
//! # Merge Rules
//!
//! - Mappings are merged recursively
//! - Sequences are replaced entirely (not merged)
//! - Null values in overlay delete the corresponding key from base
//! - Scalars in overlay replace scalars in base

use serde_yaml::Value;

/// Deep merge two YAML values; `overlay` wins at the point of conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    result.remove(key);
                } else if let Some(base_value) = base_map.get(key) {
                    result.insert(key.clone(), deep_merge(base_value, overlay_value));
                } else {
                    result.insert(key.clone(), overlay_value.clone());
                }
            }

            Value::Mapping(result)
        }

        (_, overlay) => overlay.clone(),
    }
}

/// Merge layers in order (later overrides earlier).
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, config| {
            deep_merge(&acc, config)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn nested_keys_survive_partial_overlay() {
        let base = yaml("git:\n  useForcePushWithLease: true\n  useForcePushIfIncludes: true\n");
        let overlay = yaml("git:\n  useForcePushIfIncludes: false\n");

        let result = deep_merge(&base, &overlay);

        assert_eq!(result["git"]["useForcePushWithLease"], true);
        assert_eq!(result["git"]["useForcePushIfIncludes"], false);
    }

    #[test]
    fn sequences_are_replaced_not_merged() {
        let base = yaml("skipConfirmations:\n  - push:menu\n  - pull:menu\n");
        let overlay = yaml("skipConfirmations:\n  - switch:command\n");

        let result = deep_merge(&base, &overlay);

        let list = result["skipConfirmations"].as_sequence().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0], "switch:command");
    }

    #[test]
    fn null_removes_key() {
        let base = yaml("worktrees:\n  defaultLocation: /trees\n");
        let overlay = yaml("worktrees:\n  defaultLocation: null\n");

        let result = deep_merge(&base, &overlay);

        assert!(result["worktrees"].get("defaultLocation").is_none());
    }

    #[test]
    fn merge_configs_applies_in_order() {
        let merged = merge_configs(&[
            yaml("commits:\n  pageSize: 10\n"),
            yaml("commits:\n  pageSize: 20\n"),
            yaml("git:\n  useForcePushWithLease: false\n"),
        ]);
        assert_eq!(merged["commits"]["pageSize"], 20);
        assert_eq!(merged["git"]["useForcePushWithLease"], false);
    }
}
