/// `Settings` - Resolved spacing options
///
/// A table of option values plus the set of options the user chose
/// explicitly. Detection only writes options that are not explicit.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Options the detector can infer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionId {
    SpArith,
    SpBeforeAssign,
    SpAfterAssign,
    SpEnumAssign,
    SpBool,
    SpCompare,
    SpBeforeComma,
    SpAfterComma,
    SpBeforeSemi,
    SpInsideParen,
    SpParenBrace,
    SpBeforeSparen,
    SpInsideSparen,
    SpFuncCallParen,
}

impl OptionId {
    pub const ALL: [OptionId; 14] = [
        OptionId::SpArith,
        OptionId::SpBeforeAssign,
        OptionId::SpAfterAssign,
        OptionId::SpEnumAssign,
        OptionId::SpBool,
        OptionId::SpCompare,
        OptionId::SpBeforeComma,
        OptionId::SpAfterComma,
        OptionId::SpBeforeSemi,
        OptionId::SpInsideParen,
        OptionId::SpParenBrace,
        OptionId::SpBeforeSparen,
        OptionId::SpInsideSparen,
        OptionId::SpFuncCallParen,
    ];

    /// Name used in config files, directives and output
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            OptionId::SpArith => "sp_arith",
            OptionId::SpBeforeAssign => "sp_before_assign",
            OptionId::SpAfterAssign => "sp_after_assign",
            OptionId::SpEnumAssign => "sp_enum_assign",
            OptionId::SpBool => "sp_bool",
            OptionId::SpCompare => "sp_compare",
            OptionId::SpBeforeComma => "sp_before_comma",
            OptionId::SpAfterComma => "sp_after_comma",
            OptionId::SpBeforeSemi => "sp_before_semi",
            OptionId::SpInsideParen => "sp_inside_paren",
            OptionId::SpParenBrace => "sp_paren_brace",
            OptionId::SpBeforeSparen => "sp_before_sparen",
            OptionId::SpInsideSparen => "sp_inside_sparen",
            OptionId::SpFuncCallParen => "sp_func_call_paren",
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for OptionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| format!("unknown option '{s}'"))
    }
}

/// Value of a spacing option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceOption {
    /// Leave the spacing as it is
    #[default]
    Ignore,
    /// At least one space
    Add,
    /// No space
    Remove,
    /// Exactly one space
    Force,
}

impl fmt::Display for SpaceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpaceOption::Ignore => "ignore",
            SpaceOption::Add => "add",
            SpaceOption::Remove => "remove",
            SpaceOption::Force => "force",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SpaceOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(SpaceOption::Ignore),
            "add" => Ok(SpaceOption::Add),
            "remove" => Ok(SpaceOption::Remove),
            "force" => Ok(SpaceOption::Force),
            _ => Err(format!("invalid value '{s}' (expected ignore, add, remove or force)")),
        }
    }
}

/// Option table shared between the user and the detector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<OptionId, SpaceOption>,
    explicit: BTreeSet<OptionId>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, `Ignore` when never set
    #[must_use]
    pub fn get(&self, id: OptionId) -> SpaceOption {
        self.values.get(&id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_explicit(&self, id: OptionId) -> bool {
        self.explicit.contains(&id)
    }

    /// User choice; detection will not touch it
    pub fn set_explicit(&mut self, id: OptionId, value: SpaceOption) {
        self.values.insert(id, value);
        self.explicit.insert(id);
    }

    /// Detected value; ignored for explicit options
    ///
    /// Returns whether the value was stored.
    pub fn set_detected(&mut self, id: OptionId, value: SpaceOption) -> bool {
        if self.is_explicit(id) {
            return false;
        }
        self.values.insert(id, value);
        true
    }

    /// Set (option, value) pairs in option order
    pub fn iter(&self) -> impl Iterator<Item = (OptionId, SpaceOption)> + '_ {
        self.values.iter().map(|(&id, &value)| (id, value))
    }

    /// Values keyed by option name, ready to serialize
    #[must_use]
    pub fn to_table(&self) -> BTreeMap<&'static str, SpaceOption> {
        self.iter().map(|(id, value)| (id.name(), value)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_names_round_trip() {
        for id in OptionId::ALL {
            assert_eq!(id.name().parse::<OptionId>(), Ok(id));
        }
        assert!("sp_nothing".parse::<OptionId>().is_err());
    }

    #[test]
    fn test_space_option_parse() {
        assert_eq!("Force".parse::<SpaceOption>(), Ok(SpaceOption::Force));
        assert!("maybe".parse::<SpaceOption>().is_err());
        assert_eq!(SpaceOption::Remove.to_string(), "remove");
    }

    #[test]
    fn test_explicit_wins_over_detected() {
        let mut settings = Settings::new();
        settings.set_explicit(OptionId::SpArith, SpaceOption::Add);
        assert!(!settings.set_detected(OptionId::SpArith, SpaceOption::Remove));
        assert!(settings.set_detected(OptionId::SpBool, SpaceOption::Force));
        assert_eq!(settings.get(OptionId::SpArith), SpaceOption::Add);
        assert_eq!(settings.get(OptionId::SpBool), SpaceOption::Force);
        assert_eq!(settings.get(OptionId::SpCompare), SpaceOption::Ignore);
    }

    #[test]
    fn test_table_serializes_as_toml() {
        let mut settings = Settings::new();
        settings.set_detected(OptionId::SpArith, SpaceOption::Force);
        settings.set_detected(OptionId::SpAfterComma, SpaceOption::Add);
        let text = toml::to_string(&settings.to_table()).unwrap();
        assert!(text.contains("sp_arith = \"force\""));
        assert!(text.contains("sp_after_comma = \"add\""));
    }
}
