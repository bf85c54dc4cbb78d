use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};

use super::{insert_row, now_timestamp, Dataset, Entity, File, PhysicsResult, SampleResult};
use crate::error::Result;
use crate::query::SqlValue;
use crate::schema::{self, TableDef};
use crate::session::Session;
use crate::validation::{check_choice, require, require_text, ValidationError};

/// Kind of processed sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SampleType {
    Pat,
    Skim,
    Rds,
    Lhco,
    Ntuples,
    Histos,
    Other,
}

impl SampleType {
    pub const ALL: [SampleType; 7] = [
        SampleType::Pat,
        SampleType::Skim,
        SampleType::Rds,
        SampleType::Lhco,
        SampleType::Ntuples,
        SampleType::Histos,
        SampleType::Other,
    ];

    pub const ALLOWED: [&'static str; 7] = ["PAT", "SKIM", "RDS", "LHCO", "NTUPLES", "HISTOS", "OTHER"];

    pub fn as_str(self) -> &'static str {
        match self {
            SampleType::Pat => "PAT",
            SampleType::Skim => "SKIM",
            SampleType::Rds => "RDS",
            SampleType::Lhco => "LHCO",
            SampleType::Ntuples => "NTUPLES",
            SampleType::Histos => "HISTOS",
            SampleType::Other => "OTHER",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidChoice {
                entity: "Sample",
                field: "sampletype",
                value: s.to_string(),
                allowed: Self::ALLOWED.join(", "),
            })
    }
}

/// A processed sample (PAT tuple, skim, ntuples...)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Sample {
    #[sqlx(rename = "sample_id")]
    pub id: i64,
    pub name: String,
    pub path: String,
    pub sampletype: String,
    pub nevents_processed: i64,
    pub nevents: Option<i64>,
    pub event_weight_sum: Option<f64>,
    /// Serialized extra weight sums
    pub extras_event_weight_sum: Option<String>,
    pub luminosity: Option<f64>,
    pub normalization: f64,
    pub author: Option<String>,
    pub code_version: Option<String>,
    /// Serialized processed luminosity sections
    pub processed_lumi: Option<String>,
    pub user_comment: Option<String>,
    pub creation_time: String,
    pub source_dataset_id: Option<i64>,
    pub source_sample_id: Option<i64>,
}

impl Entity for Sample {
    const NAME: &'static str = "Sample";
    const TABLE: &'static TableDef = &schema::SAMPLE;
    const ID_COLUMN: &'static str = "sample_id";

    fn id(&self) -> i64 {
        self.id
    }

    fn row_values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", SqlValue::from(self.name.as_str())),
            ("path", SqlValue::from(self.path.as_str())),
            ("sampletype", SqlValue::from(self.sampletype.as_str())),
            ("nevents_processed", SqlValue::from(self.nevents_processed)),
            ("nevents", SqlValue::from(self.nevents)),
            ("event_weight_sum", SqlValue::from(self.event_weight_sum)),
            ("extras_event_weight_sum", SqlValue::from(&self.extras_event_weight_sum)),
            ("luminosity", SqlValue::from(self.luminosity)),
            ("normalization", SqlValue::from(self.normalization)),
            ("author", SqlValue::from(&self.author)),
            ("code_version", SqlValue::from(&self.code_version)),
            ("processed_lumi", SqlValue::from(&self.processed_lumi)),
            ("user_comment", SqlValue::from(&self.user_comment)),
            ("creation_time", SqlValue::from(self.creation_time.as_str())),
            ("source_dataset_id", SqlValue::from(self.source_dataset_id)),
            ("source_sample_id", SqlValue::from(self.source_sample_id)),
        ]
    }

    fn check(&self) -> std::result::Result<(), ValidationError> {
        check_choice("Sample", "sampletype", &self.sampletype, &SampleType::ALLOWED)
    }
}

/// Where one step of the effective-luminosity derivation comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LuminositySource {
    /// Stored on the sample itself
    Explicit(f64),
    /// Processed events over the source dataset's cross-section
    CrossSection(f64),
    /// Taken from the source sample with this id
    Inherited(i64),
    Undefined,
}

/// Decide how `sample`'s luminosity is obtained, given its source dataset
pub fn luminosity_step(sample: &Sample, dataset: Option<&Dataset>) -> LuminositySource {
    if let Some(luminosity) = sample.luminosity {
        return LuminositySource::Explicit(luminosity);
    }
    let xsection = dataset
        .filter(|d| d.is_monte_carlo())
        .and_then(|d| d.xsection)
        .filter(|x| *x != 0.0);
    if let Some(xsection) = xsection {
        return LuminositySource::CrossSection(sample.nevents_processed as f64 / xsection);
    }
    match sample.source_sample_id {
        Some(parent) => LuminositySource::Inherited(parent),
        None => LuminositySource::Undefined,
    }
}

impl Sample {
    pub fn sample_type(&self) -> std::result::Result<SampleType, ValidationError> {
        self.sampletype.parse()
    }

    /// Files of this sample, by id
    pub async fn files(&self, session: &Session) -> Result<Vec<File>> {
        File::select(session)
            .where_eq("sample_id", self.id)
            .order_by_id()
            .fetch_all()
            .await
    }

    pub async fn file_count(&self, session: &Session) -> Result<i64> {
        File::select(session).where_eq("sample_id", self.id).count().await
    }

    /// Delete every file of this sample; returns how many were removed
    #[instrument(skip(self, session), fields(sample_id = self.id))]
    pub async fn remove_files(&self, session: &Session) -> Result<u64> {
        let removed = File::select(session)
            .where_eq("sample_id", self.id)
            .delete()
            .await?;
        info!(removed, "Sample files removed");
        Ok(removed)
    }

    /// Results built on this sample, by id
    pub async fn results(&self, session: &Session) -> Result<Vec<PhysicsResult>> {
        PhysicsResult::select(session)
            .linked_through(SampleResult::TABLE, "sample_id", self.id)
            .order_by_id()
            .fetch_all()
            .await
    }

    /// Samples whose source sample is this one, by id
    pub async fn derived_samples(&self, session: &Session) -> Result<Vec<Sample>> {
        Sample::select(session)
            .where_eq("source_sample_id", self.id)
            .order_by_id()
            .fetch_all()
            .await
    }

    pub async fn source_dataset(&self, session: &Session) -> Result<Option<Dataset>> {
        match self.source_dataset_id {
            Some(id) => Dataset::by_id(session, id).fetch_optional().await,
            None => Ok(None),
        }
    }

    pub async fn source_sample(&self, session: &Session) -> Result<Option<Sample>> {
        match self.source_sample_id {
            Some(id) => Sample::by_id(session, id).fetch_optional().await,
            None => Ok(None),
        }
    }

    /// Luminosity of this sample, derived when not stored explicitly
    ///
    /// Follows the source-sample chain until a value is found. A chain that
    /// loops back on itself, or ends without a value, yields `None`.
    #[instrument(skip(self, session), fields(sample_id = self.id))]
    pub async fn effective_luminosity(&self, session: &Session) -> Result<Option<f64>> {
        let mut visited = HashSet::new();
        let mut current = self.clone();
        loop {
            if !visited.insert(current.id) {
                debug!(sample_id = current.id, "Source sample chain loops");
                return Ok(None);
            }
            let dataset = current.source_dataset(session).await?;
            match luminosity_step(&current, dataset.as_ref()) {
                LuminositySource::Explicit(value) | LuminositySource::CrossSection(value) => {
                    return Ok(Some(value))
                }
                LuminositySource::Inherited(parent) => {
                    match Sample::by_id(session, parent).fetch_optional().await? {
                        Some(sample) => current = sample,
                        None => return Ok(None),
                    }
                }
                LuminositySource::Undefined => return Ok(None),
            }
        }
    }

    /// Record that `result` was built from this sample
    pub async fn attach_result(&self, session: &Session, result: &PhysicsResult) -> Result<SampleResult> {
        SampleResult::create(session, self.id, result.id).await
    }
}

/// Fields for a new [`Sample`]
///
/// `name`, `path`, `sampletype` and `nevents_processed` are mandatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSample {
    pub name: Option<String>,
    pub path: Option<String>,
    pub sampletype: Option<String>,
    pub nevents_processed: Option<i64>,
    pub nevents: Option<i64>,
    pub event_weight_sum: Option<f64>,
    pub extras_event_weight_sum: Option<String>,
    pub luminosity: Option<f64>,
    /// Defaults to 1.0
    pub normalization: Option<f64>,
    pub author: Option<String>,
    pub code_version: Option<String>,
    pub processed_lumi: Option<String>,
    pub user_comment: Option<String>,
    /// Defaults to the creation instant
    pub creation_time: Option<String>,
    pub source_dataset_id: Option<i64>,
    pub source_sample_id: Option<i64>,
}

impl NewSample {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        sampletype: impl Into<String>,
        nevents_processed: i64,
    ) -> Self {
        Self {
            name: Some(name.into()),
            path: Some(path.into()),
            sampletype: Some(sampletype.into()),
            nevents_processed: Some(nevents_processed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        require_text("Sample", "name", &self.name)?;
        require_text("Sample", "path", &self.path)?;
        let sampletype = require_text("Sample", "sampletype", &self.sampletype)?;
        require("Sample", "nevents_processed", &self.nevents_processed)?;
        check_choice("Sample", "sampletype", sampletype, &SampleType::ALLOWED)
    }

    #[instrument(skip(self, session), fields(name = ?self.name))]
    pub async fn create(self, session: &Session) -> Result<Sample> {
        self.validate()?;
        let creation_time = self.creation_time.unwrap_or_else(now_timestamp);
        let id = insert_row(
            session,
            &schema::SAMPLE,
            vec![
                ("name", SqlValue::from(self.name)),
                ("path", SqlValue::from(self.path)),
                ("sampletype", SqlValue::from(self.sampletype)),
                ("nevents_processed", SqlValue::from(self.nevents_processed)),
                ("nevents", SqlValue::from(self.nevents)),
                ("event_weight_sum", SqlValue::from(self.event_weight_sum)),
                ("extras_event_weight_sum", SqlValue::from(self.extras_event_weight_sum)),
                ("luminosity", SqlValue::from(self.luminosity)),
                ("normalization", SqlValue::from(self.normalization.unwrap_or(1.0))),
                ("author", SqlValue::from(self.author)),
                ("code_version", SqlValue::from(self.code_version)),
                ("processed_lumi", SqlValue::from(self.processed_lumi)),
                ("user_comment", SqlValue::from(self.user_comment)),
                ("creation_time", SqlValue::from(creation_time)),
                ("source_dataset_id", SqlValue::from(self.source_dataset_id)),
                ("source_sample_id", SqlValue::from(self.source_sample_id)),
            ],
        )
        .await?;
        info!(id, "Sample created");
        Sample::get(session, id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::entity::{NewDataset, NewFile, NewPhysicsResult};
    use crate::error::StoreError;
    use samadhi_common::{Categorized, ErrorCategory};

    fn sample_row(luminosity: Option<f64>, source_sample_id: Option<i64>) -> Sample {
        Sample {
            id: 1,
            name: "s".to_string(),
            path: "/p".to_string(),
            sampletype: "NTUPLES".to_string(),
            nevents_processed: 1000,
            nevents: None,
            event_weight_sum: None,
            extras_event_weight_sum: None,
            luminosity,
            normalization: 1.0,
            author: None,
            code_version: None,
            processed_lumi: None,
            user_comment: None,
            creation_time: "2019-04-01 10:00:00".to_string(),
            source_dataset_id: None,
            source_sample_id,
        }
    }

    fn dataset_row(datatype: &str, xsection: Option<f64>) -> Dataset {
        Dataset {
            id: 1,
            name: "d".to_string(),
            datatype: datatype.to_string(),
            process: None,
            nevents: None,
            xsection,
            energy: None,
            dsize: None,
            cmssw_release: None,
            globaltag: None,
            user_comment: None,
            creation_time: None,
        }
    }

    #[test]
    fn test_luminosity_step() {
        let mc = dataset_row("mc", Some(0.5));
        assert_eq!(
            luminosity_step(&sample_row(Some(12.5), None), Some(&mc)),
            LuminositySource::Explicit(12.5)
        );
        assert_eq!(
            luminosity_step(&sample_row(None, None), Some(&mc)),
            LuminositySource::CrossSection(2000.0)
        );
        assert_eq!(
            luminosity_step(&sample_row(None, None), Some(&dataset_row("MC", Some(0.5)))),
            LuminositySource::CrossSection(2000.0)
        );
        assert_eq!(
            luminosity_step(&sample_row(None, Some(9)), Some(&dataset_row("data", Some(0.5)))),
            LuminositySource::Inherited(9)
        );
        assert_eq!(
            luminosity_step(&sample_row(None, Some(9)), Some(&dataset_row("mc", Some(0.0)))),
            LuminositySource::Inherited(9)
        );
        assert_eq!(
            luminosity_step(&sample_row(None, None), None),
            LuminositySource::Undefined
        );
    }

    #[test]
    fn test_sample_type_parsing() {
        for name in SampleType::ALLOWED {
            assert_eq!(name.parse::<SampleType>().unwrap().as_str(), name);
        }
        assert!("ntuples".parse::<SampleType>().is_err());
    }

    #[tokio::test]
    async fn test_sampletype_validation() {
        let session = Session::in_memory().await.unwrap();
        let err = NewSample::new("s", "/p", "NANOAOD", 10)
            .create(&session)
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(Sample::select(&session).count().await.unwrap(), 0);

        let sample = NewSample::new("s", "/p", "HISTOS", 10).create(&session).await.unwrap();
        assert_eq!(sample.sample_type().unwrap(), SampleType::Histos);
        assert_eq!(sample.normalization, 1.0);
        assert_eq!(sample.creation_time.len(), 19);
    }

    #[tokio::test]
    async fn test_mandatory_fields() {
        let session = Session::in_memory().await.unwrap();
        let complete = NewSample::new("s", "/p", "PAT", 10);

        let cases = [
            ("name", NewSample { name: None, ..complete.clone() }),
            ("path", NewSample { path: None, ..complete.clone() }),
            ("sampletype", NewSample { sampletype: None, ..complete.clone() }),
            (
                "nevents_processed",
                NewSample {
                    nevents_processed: None,
                    ..complete.clone()
                },
            ),
        ];
        for (field, new_sample) in cases {
            let err = new_sample.create(&session).await.unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Usage, "{field}");
            assert!(err.to_string().contains(field), "{err}");
        }
        assert_eq!(Sample::select(&session).count().await.unwrap(), 0);

        complete.create(&session).await.unwrap();
        assert_eq!(Sample::select(&session).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_effective_luminosity() {
        let session = Session::in_memory().await.unwrap();

        let explicit = NewSample {
            luminosity: Some(12.5),
            ..NewSample::new("explicit", "/p", "PAT", 10)
        }
        .create(&session)
        .await
        .unwrap();
        assert_eq!(explicit.effective_luminosity(&session).await.unwrap(), Some(12.5));

        let mc = NewDataset {
            xsection: Some(0.5),
            ..NewDataset::new("ttbar", "mc")
        }
        .create(&session)
        .await
        .unwrap();
        let from_xsection = NewSample {
            source_dataset_id: Some(mc.id),
            ..NewSample::new("from_mc", "/p", "PAT", 1000)
        }
        .create(&session)
        .await
        .unwrap();
        assert_eq!(
            from_xsection.effective_luminosity(&session).await.unwrap(),
            Some(2000.0)
        );

        let orphan = NewSample::new("orphan", "/p", "PAT", 1000)
            .create(&session)
            .await
            .unwrap();
        assert_eq!(orphan.effective_luminosity(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_luminosity_follows_source_chain() {
        let session = Session::in_memory().await.unwrap();
        let data = NewDataset::new("SingleMuon", "data").create(&session).await.unwrap();

        let parent = NewSample {
            luminosity: Some(35.9),
            source_dataset_id: Some(data.id),
            ..NewSample::new("parent", "/p", "PAT", 100)
        }
        .create(&session)
        .await
        .unwrap();
        let middle = NewSample {
            source_dataset_id: Some(data.id),
            source_sample_id: Some(parent.id),
            ..NewSample::new("middle", "/p", "SKIM", 50)
        }
        .create(&session)
        .await
        .unwrap();
        let leaf = NewSample {
            source_sample_id: Some(middle.id),
            ..NewSample::new("leaf", "/p", "NTUPLES", 20)
        }
        .create(&session)
        .await
        .unwrap();

        assert_eq!(leaf.effective_luminosity(&session).await.unwrap(), Some(35.9));
        let derived = parent.derived_samples(&session).await.unwrap();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].id, middle.id);
        assert_eq!(leaf.source_sample(&session).await.unwrap().unwrap().id, middle.id);
        assert_eq!(middle.source_dataset(&session).await.unwrap().unwrap().id, data.id);
    }

    #[tokio::test]
    async fn test_luminosity_cycle_is_absent() {
        let session = Session::in_memory().await.unwrap();
        let mut first = NewSample::new("a", "/p", "PAT", 1).create(&session).await.unwrap();
        let second = NewSample {
            source_sample_id: Some(first.id),
            ..NewSample::new("b", "/p", "PAT", 1)
        }
        .create(&session)
        .await
        .unwrap();
        first.source_sample_id = Some(second.id);
        first.save(&session).await.unwrap();

        assert_eq!(second.effective_luminosity(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_files_and_remove_files() {
        let session = Session::in_memory().await.unwrap();
        let sample = NewSample::new("s", "/p", "NTUPLES", 30).create(&session).await.unwrap();
        let other = NewSample::new("t", "/p", "NTUPLES", 30).create(&session).await.unwrap();

        for i in 0..3 {
            NewFile::new(format!("/store/s_{i}.root"), format!("root://s_{i}.root"), 10, 10.0, sample.id)
                .create(&session)
                .await
                .unwrap();
        }
        NewFile::new("/store/t.root", "root://t.root", 5, 5.0, other.id)
            .create(&session)
            .await
            .unwrap();

        assert_eq!(sample.file_count(&session).await.unwrap(), 3);
        assert_eq!(sample.files(&session).await.unwrap()[0].lfn, "/store/s_0.root");
        assert_eq!(sample.remove_files(&session).await.unwrap(), 3);
        assert_eq!(sample.file_count(&session).await.unwrap(), 0);
        assert_eq!(other.file_count(&session).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_attach_result_once() {
        let session = Session::in_memory().await.unwrap();
        let sample = NewSample::new("s", "/p", "HISTOS", 1).create(&session).await.unwrap();
        let result = NewPhysicsResult::at("/results/plots").create(&session).await.unwrap();

        sample.attach_result(&session, &result).await.unwrap();
        let err = sample.attach_result(&session, &result).await.unwrap_err();
        assert!(err.is_unique_violation(), "{err}");
        assert!(matches!(err, StoreError::Database(_)));

        let results = sample.results(&session).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, "/results/plots");
    }
}
