use std::fmt;

use serde::Serialize;

/// Filter parameters sent to the corpus service.
///
/// Field names follow the service's camelCase wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    pub corpus_name: String,
    /// Each entry is a list of path segments to search under
    pub corpora: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lang: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activity_type: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_type: Vec<String>,
    /// Target-child ages in months
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub age: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
}

impl QuerySpec {
    pub fn new(corpus_name: impl Into<String>) -> Self {
        let corpus_name = corpus_name.into();
        Self {
            corpora: vec![vec![corpus_name.clone()]],
            corpus_name,
            lang: vec![],
            activity_type: vec![],
            group_type: vec![],
            age: vec![],
            max_count: None,
        }
    }

    /// Cross-sectional base query: North American English toy play, typically developing
    pub fn childes_default() -> Self {
        Self {
            corpora: vec![vec!["childes".to_string(), "Eng-NA".to_string()]],
            lang: vec!["eng".to_string()],
            activity_type: vec!["toyplay".to_string()],
            group_type: vec!["TD".to_string()],
            age: vec![40],
            ..Self::new("childes")
        }
    }

    /// Longitudinal base query over the Flusberg corpus
    pub fn flusberg_default() -> Self {
        Self {
            corpora: vec![vec![
                "asd".to_string(),
                "English".to_string(),
                "Flusberg".to_string(),
            ]],
            lang: vec!["eng".to_string()],
            activity_type: vec!["toyplay".to_string()],
            group_type: vec!["TD".to_string()],
            ..Self::new("asd")
        }
    }

    /// Same query restricted to one sub-directory (an individual) of every corpus path
    pub fn for_individual(&self, name: &str) -> Self {
        let mut query = self.clone();
        for corpus in &mut query.corpora {
            corpus.push(name.to_string());
        }
        query
    }
}

/// One value of the parameter a cross-sectional run groups by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CrossSectionParameter {
    /// Age in months
    Age(u32),
    GroupType(String),
    ActivityType(String),
    Language(String),
}

impl CrossSectionParameter {
    /// Overwrite the matching filter of `query` with this value
    pub fn apply(&self, query: &mut QuerySpec) {
        match self {
            Self::Age(months) => query.age = vec![*months],
            Self::GroupType(group) => query.group_type = vec![group.clone()],
            Self::ActivityType(activity) => query.activity_type = vec![activity.clone()],
            Self::Language(lang) => query.lang = vec![lang.clone()],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Age(_) => "age",
            Self::GroupType(_) => "groupType",
            Self::ActivityType(_) => "activityType",
            Self::Language(_) => "lang",
        }
    }

    /// Row key in cross-sectional tables
    pub fn label(&self) -> String {
        match self {
            Self::Age(months) => months.to_string(),
            Self::GroupType(v) | Self::ActivityType(v) | Self::Language(v) => v.clone(),
        }
    }
}

impl fmt::Display for CrossSectionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name(), self.label())
    }
}
