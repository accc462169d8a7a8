use std::io::Write;

use log::{debug, info};
use serde::de::DeserializeOwned;

use crate::api::OjClient;
use crate::schema::{ContestId, RankEntry, RuleType};

/// Number of rank entries requested per page.
pub const PAGE_LIMIT: usize = 250;
pub const CONTEST_LIST_LIMIT: usize = 100;

/// Downloads every rank entry of a contest, in the order the server returns them.
///
/// The number of pages is taken from `total` of the first page.  If it is absent,
/// only the first page is fetched.
pub async fn fetch_all_ranks<S: DeserializeOwned>(
    client: &OjClient,
    contest_id: ContestId,
) -> anyhow::Result<Vec<RankEntry<S>>> {
    let first = client
        .get_contest_rank::<S>(contest_id, 0, PAGE_LIMIT)
        .await?;
    let total = first.total.unwrap_or(first.results.len());
    let mut results = first.results;
    for offset in (PAGE_LIMIT..total).step_by(PAGE_LIMIT) {
        debug!("Fetching ranks {offset}..{}", (offset + PAGE_LIMIT).min(total));
        let page = client
            .get_contest_rank::<S>(contest_id, offset, PAGE_LIMIT)
            .await?;
        results.extend(page.results);
    }
    info!("Fetched {} rank entries of contest {contest_id}.", results.len());
    Ok(results)
}

/// Writes the first page of contests of the given rule to `listing` and returns their ids.
pub async fn list_contests(
    client: &OjClient,
    rule_type: RuleType,
    listing: &mut impl Write,
) -> anyhow::Result<Vec<ContestId>> {
    let page = client
        .get_contests(rule_type, 0, CONTEST_LIST_LIMIT)
        .await?;
    writeln!(listing, "Available contests:")?;
    for contest in &page.results {
        writeln!(listing, "  - {}: {}", contest.id, contest.title)?;
    }
    Ok(page.results.into_iter().map(|contest| contest.id).collect())
}
