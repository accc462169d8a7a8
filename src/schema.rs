use std::collections::BTreeMap;

use derive_more::{Display, From, FromStr};
use oj_api_utils::credentials::UserName;
use serde::{Deserialize, Serialize};

/// Contest rule, used both as the `rule_type` filter of the contest list
/// and to choose how rank entries are scored.
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, clap::ValueEnum, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RuleType {
    #[value(name = "ACM")]
    Acm,
    #[value(name = "OI")]
    Oi,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Profile {
    pub user: User,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub username: UserName,
}

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    From,
    Display,
    FromStr,
    Serialize,
    Deserialize,
)]
pub struct ContestId(u64);

#[derive(Clone, Debug, Deserialize)]
pub struct Contest {
    pub id: ContestId,
    pub title: String,
}

/// One page of a paginated listing.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total: Option<usize>,
}

/// Key of `submission_info`.  The server sends it as a string,
/// but it is compared and ordered as an integer.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, From, Display, Deserialize,
)]
pub struct QuestionId(u64);

#[derive(Clone, Debug, Deserialize)]
pub struct RankEntry<S> {
    pub user: User,
    /// Only reported for OI contests.
    #[serde(default)]
    pub total_score: Option<f64>,
    #[serde(default = "BTreeMap::new")]
    pub submission_info: BTreeMap<QuestionId, S>,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize)]
pub struct AcmSubmission {
    #[serde(default)]
    pub is_ac: bool,
    /// Number of rejected submissions before the accepted one (or so far).
    #[serde(default)]
    pub error_number: u32,
}

pub type AcmRankEntry = RankEntry<AcmSubmission>;
/// In OI contests, `submission_info` maps each question to its score.
pub type OiRankEntry = RankEntry<f64>;
