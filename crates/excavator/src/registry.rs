//! Static rule registration table and cached configuration.
//!
//! Every rule family is enumerated here once, paired with its stable rule
//! identifier and the JSON configuration file it reads. [`RuleSet::load`]
//! resolves the table against a configuration directory at startup: missing
//! or malformed files drop that one rule from the active set with a single
//! warning and never abort anything else. The loaded payloads are cached
//! for the process lifetime and shared read-only across all files; matcher
//! instances are built fresh per file from them.

use std::fmt;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::matchers::annotation::{MethodAnnotationMatcher, PropertyAnnotationMatcher};
use crate::matchers::arrays::{ArrayDimensionMatcher, ArrayGlobalMatcher};
use crate::matchers::class_constant::ClassConstantMatcher;
use crate::matchers::class_name::ClassNameMatcher;
use crate::matchers::constant::ConstantMatcher;
use crate::matchers::constructor_argument::ConstructorArgumentMatcher;
use crate::matchers::function_call::FunctionCallMatcher;
use crate::matchers::interface_method::InterfaceMethodChangedMatcher;
use crate::matchers::method_argument::{
    MethodArgumentDroppedMatcher, MethodArgumentRequiredMatcher, MethodArgumentUnusedMatcher,
};
use crate::matchers::method_argument_static::{
    MethodArgumentDroppedStaticMatcher, MethodArgumentRequiredStaticMatcher,
};
use crate::matchers::method_call::MethodCallMatcher;
use crate::matchers::method_call_static::MethodCallStaticMatcher;
use crate::matchers::property::{
    PropertyExistsStaticMatcher, PropertyProtectedMatcher, PropertyPublicMatcher,
};
use crate::matchers::Matcher;

/// The enumerated rule families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    ArrayDimension,
    ArrayGlobal,
    ClassConstant,
    ClassName,
    Constant,
    ConstructorArgument,
    FunctionCall,
    InterfaceMethodChanged,
    MethodAnnotation,
    MethodArgumentDropped,
    MethodArgumentDroppedStatic,
    MethodArgumentRequired,
    MethodArgumentRequiredStatic,
    MethodArgumentUnused,
    MethodCall,
    MethodCallStatic,
    PropertyAnnotation,
    PropertyExistsStatic,
    PropertyProtected,
    PropertyPublic,
}

impl RuleKind {
    /// Stable rule identifier, also used to stamp records.
    pub fn rule_id(self) -> &'static str {
        match self {
            RuleKind::ArrayDimension => "ArrayDimensionMatcher",
            RuleKind::ArrayGlobal => "ArrayGlobalMatcher",
            RuleKind::ClassConstant => "ClassConstantMatcher",
            RuleKind::ClassName => "ClassNameMatcher",
            RuleKind::Constant => "ConstantMatcher",
            RuleKind::ConstructorArgument => "ConstructorArgumentMatcher",
            RuleKind::FunctionCall => "FunctionCallMatcher",
            RuleKind::InterfaceMethodChanged => "InterfaceMethodChangedMatcher",
            RuleKind::MethodAnnotation => "MethodAnnotationMatcher",
            RuleKind::MethodArgumentDropped => "MethodArgumentDroppedMatcher",
            RuleKind::MethodArgumentDroppedStatic => "MethodArgumentDroppedStaticMatcher",
            RuleKind::MethodArgumentRequired => "MethodArgumentRequiredMatcher",
            RuleKind::MethodArgumentRequiredStatic => "MethodArgumentRequiredStaticMatcher",
            RuleKind::MethodArgumentUnused => "MethodArgumentUnusedMatcher",
            RuleKind::MethodCall => "MethodCallMatcher",
            RuleKind::MethodCallStatic => "MethodCallStaticMatcher",
            RuleKind::PropertyAnnotation => "PropertyAnnotationMatcher",
            RuleKind::PropertyExistsStatic => "PropertyExistsStaticMatcher",
            RuleKind::PropertyProtected => "PropertyProtectedMatcher",
            RuleKind::PropertyPublic => "PropertyPublicMatcher",
        }
    }

    /// Configuration file name under the rules directory.
    pub fn config_file(self) -> String {
        format!("{}.json", self.rule_id())
    }

    /// Builds a fresh matcher instance from a payload.
    fn build(self, payload: &Value) -> Box<dyn Matcher> {
        match self {
            RuleKind::ArrayDimension => Box::new(ArrayDimensionMatcher::new(payload)),
            RuleKind::ArrayGlobal => Box::new(ArrayGlobalMatcher::new(payload)),
            RuleKind::ClassConstant => Box::new(ClassConstantMatcher::new(payload)),
            RuleKind::ClassName => Box::new(ClassNameMatcher::new(payload)),
            RuleKind::Constant => Box::new(ConstantMatcher::new(payload)),
            RuleKind::ConstructorArgument => Box::new(ConstructorArgumentMatcher::new(payload)),
            RuleKind::FunctionCall => Box::new(FunctionCallMatcher::new(payload)),
            RuleKind::InterfaceMethodChanged => {
                Box::new(InterfaceMethodChangedMatcher::new(payload))
            }
            RuleKind::MethodAnnotation => Box::new(MethodAnnotationMatcher::new(payload)),
            RuleKind::MethodArgumentDropped => Box::new(MethodArgumentDroppedMatcher::new(payload)),
            RuleKind::MethodArgumentDroppedStatic => {
                Box::new(MethodArgumentDroppedStaticMatcher::new(payload))
            }
            RuleKind::MethodArgumentRequired => {
                Box::new(MethodArgumentRequiredMatcher::new(payload))
            }
            RuleKind::MethodArgumentRequiredStatic => {
                Box::new(MethodArgumentRequiredStaticMatcher::new(payload))
            }
            RuleKind::MethodArgumentUnused => Box::new(MethodArgumentUnusedMatcher::new(payload)),
            RuleKind::MethodCall => Box::new(MethodCallMatcher::new(payload)),
            RuleKind::MethodCallStatic => Box::new(MethodCallStaticMatcher::new(payload)),
            RuleKind::PropertyAnnotation => Box::new(PropertyAnnotationMatcher::new(payload)),
            RuleKind::PropertyExistsStatic => Box::new(PropertyExistsStaticMatcher::new(payload)),
            RuleKind::PropertyProtected => Box::new(PropertyProtectedMatcher::new(payload)),
            RuleKind::PropertyPublic => Box::new(PropertyPublicMatcher::new(payload)),
        }
    }

    /// Every rule family, in registration order. Record collection follows
    /// this order within a file.
    pub const ALL: &'static [RuleKind] = &[
        RuleKind::ArrayDimension,
        RuleKind::ArrayGlobal,
        RuleKind::ClassConstant,
        RuleKind::ClassName,
        RuleKind::Constant,
        RuleKind::ConstructorArgument,
        RuleKind::FunctionCall,
        RuleKind::InterfaceMethodChanged,
        RuleKind::MethodAnnotation,
        RuleKind::MethodArgumentDropped,
        RuleKind::MethodArgumentDroppedStatic,
        RuleKind::MethodArgumentRequired,
        RuleKind::MethodArgumentRequiredStatic,
        RuleKind::MethodArgumentUnused,
        RuleKind::MethodCall,
        RuleKind::MethodCallStatic,
        RuleKind::PropertyAnnotation,
        RuleKind::PropertyExistsStatic,
        RuleKind::PropertyProtected,
        RuleKind::PropertyPublic,
    ];
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule_id())
    }
}

/// The active rule set: payloads loaded once, shared read-only across all
/// scanned files.
pub struct RuleSet {
    active: Vec<(RuleKind, Value)>,
}

impl RuleSet {
    /// Loads every registered rule's configuration from a directory.
    ///
    /// A rule whose file is missing or fails to parse is dropped from the
    /// active set — reported here, exactly once, never fatal.
    pub fn load(dir: &Path) -> Self {
        let mut active = Vec::new();
        for &kind in RuleKind::ALL {
            let path = dir.join(kind.config_file());
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(rule = %kind, path = %path.display(), "rule configuration not readable: {e}");
                    continue;
                }
            };
            match serde_json::from_str::<Value>(&text) {
                Ok(payload) if payload.is_object() => {
                    debug!(rule = %kind, "rule configuration loaded");
                    active.push((kind, payload));
                }
                Ok(_) => {
                    warn!(rule = %kind, path = %path.display(), "rule configuration is not a JSON object; rule dropped");
                }
                Err(e) => {
                    warn!(rule = %kind, path = %path.display(), "rule configuration is invalid JSON; rule dropped: {e}");
                }
            }
        }
        Self { active }
    }

    /// Builds a rule set directly from in-memory payloads (tests, embedded
    /// rule data). Non-object payloads are dropped, mirroring `load`.
    pub fn from_payloads(payloads: Vec<(RuleKind, Value)>) -> Self {
        Self {
            active: payloads
                .into_iter()
                .filter(|(_, payload)| payload.is_object())
                .collect(),
        }
    }

    /// Fresh matcher instances for one file, in registration order.
    pub fn build_matchers(&self) -> Vec<Box<dyn Matcher>> {
        self.active
            .iter()
            .map(|(kind, payload)| kind.build(payload))
            .collect()
    }

    /// Identifiers of the active rules, independent of any scan having run.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.active.iter().map(|(kind, _)| kind.rule_id()).collect()
    }

    /// Number of active rules.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// `true` when no rule configuration could be loaded.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
