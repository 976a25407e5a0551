use std::fmt;
use std::str::FromStr;

use crate::error::FetchError;

/// Kaggle dataset identifier in `owner/dataset` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetSlug {
    owner: String,
    name: String,
}

impl DatasetSlug {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DatasetSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for DatasetSlug {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| FetchError::InvalidDatasetSlug(value.to_string()))?;
        let is_part = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        };
        if !is_part(owner) || !is_part(name) {
            return Err(FetchError::InvalidDatasetSlug(value.to_string()));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

/// Directory name searched for in the extracted tree.
///
/// Matching ignores case; the original casing is kept and used as the
/// output folder name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetName(String);

impl TargetName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key used for case-insensitive comparison.
    pub fn match_key(&self) -> String {
        fold_case(&self.0)
    }

    pub fn matches(&self, dir_name: &str) -> bool {
        self.match_key() == fold_case(dir_name)
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TargetName {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let is_valid = !value.trim().is_empty()
            && !value.contains(['/', '\\'])
            && value != "."
            && value != "..";
        if !is_valid {
            return Err(FetchError::InvalidTargetName(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}
