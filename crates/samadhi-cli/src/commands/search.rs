//! Search command implementation
//!
//! Builds one filtered query over the selected record type, ordered by id,
//! and prints either one summary line per record or the full reports.

use samadhi_store::{Analysis, Dataset, PhysicsResult, Sample, Session, WildcardPattern};
use std::io::Write;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::paths::expand_path;
use crate::report::{Report, SEPARATOR};
use crate::{EntityKind, SearchArgs};

/// The single condition a search applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    Id(i64),
    Name(WildcardPattern),
    Path(WildcardPattern),
}

impl SearchArgs {
    /// Check the filter against the record type and build it
    ///
    /// Runs before any database access; unsupported combinations are usage
    /// errors.
    pub fn filter(&self) -> Result<SearchFilter> {
        if self.path.is_some() && !self.kind.supports_path() {
            return Err(CliError::usage(format!("Cannot search {} by path", self.kind)));
        }
        if self.name.is_some() && !self.kind.supports_name() {
            return Err(CliError::usage("Cannot search results by name"));
        }

        match (&self.id, &self.name, &self.path) {
            (Some(id), _, _) => Ok(SearchFilter::Id(*id)),
            (None, Some(name), _) => Ok(SearchFilter::Name(WildcardPattern::new(name))),
            (None, None, Some(path)) => {
                let expanded = expand_path(path)?;
                Ok(SearchFilter::Path(WildcardPattern::new(&expanded.to_string_lossy())))
            }
            (None, None, None) => Err(CliError::usage(
                "One of --name, --path or --id is required",
            )),
        }
    }
}

/// Run the search command, writing results to `out`
pub async fn run(args: &SearchArgs, config: &Config, out: &mut impl Write) -> Result<()> {
    let filter = args.filter()?;
    debug!(kind = %args.kind, filter = ?filter, long = args.long, "Starting search");

    let session = Session::open(config.credentials_path()).await?;
    let outcome = match args.kind {
        EntityKind::Dataset => search::<Dataset>(&session, &filter, args.long, out).await,
        EntityKind::Sample => search::<Sample>(&session, &filter, args.long, out).await,
        EntityKind::Result => search::<PhysicsResult>(&session, &filter, args.long, out).await,
        EntityKind::Analysis => search::<Analysis>(&session, &filter, args.long, out).await,
    };
    session.close().await;
    outcome
}

async fn search<E: Report>(
    session: &Session,
    filter: &SearchFilter,
    long: bool,
    out: &mut impl Write,
) -> Result<()> {
    let select = E::select(session);
    let select = match filter {
        SearchFilter::Id(id) => select.with_id(*id),
        SearchFilter::Name(pattern) => select.where_like(name_column::<E>()?, pattern),
        SearchFilter::Path(pattern) => select.where_like(path_column::<E>()?, pattern),
    };
    let records = select.order_by_id().fetch_all().await?;
    info!(entity = E::NAME, count = records.len(), "Search finished");

    for record in &records {
        if long {
            writeln!(out, "{}", record.render(session).await?)?;
            writeln!(out, "{SEPARATOR}")?;
        } else {
            writeln!(out, "{}", record.summary())?;
        }
    }
    out.flush()?;
    Ok(())
}

fn name_column<E: Report>() -> Result<&'static str> {
    E::NAME_COLUMN.ok_or_else(|| CliError::usage(format!("Cannot search {} by name", E::NAME)))
}

fn path_column<E: Report>() -> Result<&'static str> {
    E::PATH_COLUMN.ok_or_else(|| CliError::usage(format!("Cannot search {} by path", E::NAME)))
}
