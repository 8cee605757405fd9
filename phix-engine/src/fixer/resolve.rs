//! Turns a rule configuration into a runnable fixer set.
//!
//! Resolution is the fail-fast part of a run: every rule name must exist,
//! every option must be accepted by its fixer, risky fixers must be
//! explicitly allowed. Only then is the execution order fixed and the set
//! stamped with the signature the cache keys on.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::fixer::{
    order, ArraySyntaxFixer, ConfigurationError, ConstantCaseFixer, DeclareStrictTypesFixer,
    ElseifFixer, EncodingFixer, Fixer, FixerOptions, ListSyntaxFixer, LowercaseKeywordsFixer,
    NoClosingTagFixer, SingleBlankLineAtEofFixer,
};
use crate::whitespace::WhitespaceConfig;

/// One rule's setting: a plain toggle, or an options table which implies
/// the rule is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    Enabled(bool),
    Options(FixerOptions),
}

impl RuleSetting {
    fn is_enabled(&self) -> bool {
        match self {
            RuleSetting::Enabled(enabled) => *enabled,
            RuleSetting::Options(_) => true,
        }
    }
}

/// Rule name to setting. Rules absent from the map do not run.
pub type RuleSet = BTreeMap<String, RuleSetting>;

/// Every fixer this build ships, in registration order.
pub fn builtin_fixers() -> Vec<Box<dyn Fixer>> {
    vec![
        Box::new(EncodingFixer),
        Box::new(DeclareStrictTypesFixer::new()),
        Box::new(ElseifFixer),
        Box::new(ArraySyntaxFixer::new()),
        Box::new(ListSyntaxFixer::new()),
        Box::new(ConstantCaseFixer::new()),
        Box::new(LowercaseKeywordsFixer),
        Box::new(NoClosingTagFixer),
        Box::new(SingleBlankLineAtEofFixer::new()),
    ]
}

/// The configured fixers in execution order, plus the signature that
/// identifies this exact configuration in the cache.
#[derive(Debug)]
pub struct ResolvedFixerSet {
    pub fixers: Vec<Box<dyn Fixer>>,
    pub signature: String,
}

/// Selects, configures and orders the fixers named by `rules`.
pub fn resolve_fixers(
    rules: &RuleSet,
    allow_risky: bool,
    whitespace: &WhitespaceConfig,
) -> Result<ResolvedFixerSet, ConfigurationError> {
    let catalog = builtin_fixers();
    let known: BTreeSet<&'static str> = catalog.iter().map(|fixer| fixer.name()).collect();
    for name in rules.keys() {
        if !known.contains(name.as_str()) {
            return Err(ConfigurationError::UnknownRule { name: name.clone() });
        }
    }

    let mut selected: Vec<Box<dyn Fixer>> = Vec::new();
    for mut fixer in catalog {
        let setting = match rules.get(fixer.name()) {
            Some(setting) if setting.is_enabled() => setting,
            _ => continue,
        };
        if fixer.is_risky() && !allow_risky {
            return Err(ConfigurationError::RiskyNotAllowed {
                fixer: fixer.name(),
            });
        }
        if let RuleSetting::Options(options) = setting {
            let name = fixer.name();
            match fixer.as_configurable() {
                Some(configurable) => configurable.configure(options)?,
                None => return Err(ConfigurationError::NotConfigurable { fixer: name }),
            }
        }
        if let Some(aware) = fixer.as_whitespace_aware() {
            aware.set_whitespace_config(whitespace.clone());
        }
        selected.push(fixer);
    }

    let fixers = order::sort_fixers(selected)?;
    let signature = signature(&fixers, rules, whitespace);
    Ok(ResolvedFixerSet { fixers, signature })
}

/// Hash of everything that changes what a run would do to a file. The rule
/// set is a `BTreeMap`, so its serialization is deterministic.
fn signature(fixers: &[Box<dyn Fixer>], rules: &RuleSet, whitespace: &WhitespaceConfig) -> String {
    let rules_json = serde_json::to_string(rules).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(env!("CARGO_PKG_VERSION").as_bytes());
    for fixer in fixers {
        hasher.update(b"\0");
        hasher.update(fixer.name().as_bytes());
    }
    hasher.update(b"\0");
    hasher.update(rules_json.as_bytes());
    hasher.update(b"\0");
    hasher.update(whitespace.indent().as_bytes());
    hasher.update(b"\0");
    hasher.update(whitespace.line_ending().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::apply_fixer;
    use serde_json::json;

    fn all_rules() -> RuleSet {
        builtin_fixers()
            .into_iter()
            .map(|fixer| (fixer.name().to_string(), RuleSetting::Enabled(true)))
            .collect()
    }

    fn resolve(rules: &RuleSet) -> ResolvedFixerSet {
        resolve_fixers(rules, true, &WhitespaceConfig::default()).unwrap()
    }

    fn names(set: &ResolvedFixerSet) -> Vec<&'static str> {
        set.fixers.iter().map(|fixer| fixer.name()).collect()
    }

    #[test]
    fn full_catalog_resolves_in_priority_order() {
        let set = resolve(&all_rules());
        assert_eq!(
            names(&set),
            vec![
                "encoding",
                "declare_strict_types",
                "elseif",
                "array_syntax",
                "list_syntax",
                "constant_case",
                "lowercase_keywords",
                "no_closing_tag",
                "single_blank_line_at_eof",
            ]
        );
    }

    #[test]
    fn absent_rules_do_not_run() {
        let rules = RuleSet::from([("elseif".to_string(), RuleSetting::Enabled(true))]);
        assert_eq!(names(&resolve(&rules)), vec!["elseif"]);
    }

    #[test]
    fn disabled_rules_do_not_run() {
        let mut rules = all_rules();
        rules.insert("elseif".to_string(), RuleSetting::Enabled(false));
        assert!(!names(&resolve(&rules)).contains(&"elseif"));
    }

    #[test]
    fn unknown_rules_are_rejected() {
        let rules = RuleSet::from([("not_a_rule".to_string(), RuleSetting::Enabled(true))]);
        let err = resolve_fixers(&rules, true, &WhitespaceConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownRule {
                name: "not_a_rule".to_string(),
            }
        );
    }

    #[test]
    fn risky_rules_require_permission() {
        let rules = RuleSet::from([(
            "declare_strict_types".to_string(),
            RuleSetting::Enabled(true),
        )]);
        let err = resolve_fixers(&rules, false, &WhitespaceConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::RiskyNotAllowed {
                fixer: "declare_strict_types",
            }
        );
        // Present but off is fine without the permission.
        let rules = RuleSet::from([(
            "declare_strict_types".to_string(),
            RuleSetting::Enabled(false),
        )]);
        let set = resolve_fixers(&rules, false, &WhitespaceConfig::default()).unwrap();
        assert!(set.fixers.is_empty());
    }

    #[test]
    fn options_reach_the_fixer() {
        let rules = RuleSet::from([(
            "array_syntax".to_string(),
            RuleSetting::Options(FixerOptions::from([(
                "syntax".to_string(),
                json!("long"),
            )])),
        )]);
        let set = resolve(&rules);
        assert_eq!(
            apply_fixer(set.fixers[0].as_ref(), "<?php $a = [1];"),
            "<?php $a = array(1);"
        );
    }

    #[test]
    fn options_for_plain_fixers_are_rejected() {
        let rules = RuleSet::from([(
            "elseif".to_string(),
            RuleSetting::Options(FixerOptions::from([("x".to_string(), json!(1))])),
        )]);
        let err = resolve_fixers(&rules, true, &WhitespaceConfig::default()).unwrap_err();
        assert_eq!(err, ConfigurationError::NotConfigurable { fixer: "elseif" });
    }

    #[test]
    fn bad_option_values_are_rejected() {
        let rules = RuleSet::from([(
            "constant_case".to_string(),
            RuleSetting::Options(FixerOptions::from([(
                "case".to_string(),
                json!("sideways"),
            )])),
        )]);
        let err = resolve_fixers(&rules, true, &WhitespaceConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    }

    #[test]
    fn whitespace_settings_reach_aware_fixers() {
        let rules = RuleSet::from([(
            "single_blank_line_at_eof".to_string(),
            RuleSetting::Enabled(true),
        )]);
        let crlf = WhitespaceConfig::new("    ", "\r\n").unwrap();
        let set = resolve_fixers(&rules, true, &crlf).unwrap();
        assert_eq!(
            apply_fixer(set.fixers[0].as_ref(), "<?php $a;"),
            "<?php $a;\r\n"
        );
    }

    #[test]
    fn signature_tracks_configuration() {
        let base = resolve(&all_rules());
        let again = resolve(&all_rules());
        assert_eq!(base.signature, again.signature);

        let mut fewer = all_rules();
        fewer.remove("elseif");
        assert_ne!(base.signature, resolve(&fewer).signature);

        let crlf = WhitespaceConfig::new("    ", "\r\n").unwrap();
        let other_ws = resolve_fixers(&all_rules(), true, &crlf).unwrap();
        assert_ne!(base.signature, other_ws.signature);
    }

    #[test]
    fn rule_settings_deserialize_from_both_shapes() {
        let toggled: RuleSetting = serde_json::from_str("true").unwrap();
        assert_eq!(toggled, RuleSetting::Enabled(true));
        let with_options: RuleSetting = serde_json::from_str(r#"{"syntax":"short"}"#).unwrap();
        assert!(matches!(with_options, RuleSetting::Options(_)));
    }
}
