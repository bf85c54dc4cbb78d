use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

use super::{insert_row, Entity, Sample};
use crate::error::Result;
use crate::query::SqlValue;
use crate::schema::{self, TableDef};
use crate::session::Session;
use crate::validation::{check_choice, require_text, ValidationError};

/// Whether a dataset is simulated or recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Mc,
    Data,
}

impl DataType {
    pub const ALLOWED: [&'static str; 2] = ["mc", "data"];

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Mc => "mc",
            DataType::Data => "data",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ValidationError;

    /// Exact match against `mc` / `data`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        check_choice("Dataset", "datatype", s, &Self::ALLOWED)?;
        Ok(if s == "mc" { DataType::Mc } else { DataType::Data })
    }
}

/// A dataset as registered in the grid data catalog
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Dataset {
    #[sqlx(rename = "dataset_id")]
    pub id: i64,
    pub name: String,
    /// `mc` or `data`
    pub datatype: String,
    pub process: Option<String>,
    pub nevents: Option<i64>,
    /// Cross-section in pb
    pub xsection: Option<f64>,
    /// Centre-of-mass energy in TeV
    pub energy: Option<f64>,
    /// Size on disk in bytes
    pub dsize: Option<i64>,
    pub cmssw_release: Option<String>,
    pub globaltag: Option<String>,
    pub user_comment: Option<String>,
    pub creation_time: Option<String>,
}

impl Entity for Dataset {
    const NAME: &'static str = "Dataset";
    const TABLE: &'static TableDef = &schema::DATASET;
    const ID_COLUMN: &'static str = "dataset_id";

    fn id(&self) -> i64 {
        self.id
    }

    fn row_values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", SqlValue::from(self.name.as_str())),
            ("datatype", SqlValue::from(self.datatype.as_str())),
            ("process", SqlValue::from(&self.process)),
            ("nevents", SqlValue::from(self.nevents)),
            ("xsection", SqlValue::from(self.xsection)),
            ("energy", SqlValue::from(self.energy)),
            ("dsize", SqlValue::from(self.dsize)),
            ("cmssw_release", SqlValue::from(&self.cmssw_release)),
            ("globaltag", SqlValue::from(&self.globaltag)),
            ("user_comment", SqlValue::from(&self.user_comment)),
            ("creation_time", SqlValue::from(&self.creation_time)),
        ]
    }

    fn check(&self) -> std::result::Result<(), ValidationError> {
        check_choice("Dataset", "datatype", &self.datatype, &DataType::ALLOWED)
    }
}

impl Dataset {
    /// True for simulated datasets; stored values are compared ignoring case
    pub fn is_monte_carlo(&self) -> bool {
        self.datatype.eq_ignore_ascii_case("mc")
    }

    /// Samples produced from this dataset, by id
    pub async fn samples(&self, session: &Session) -> Result<Vec<Sample>> {
        Sample::select(session)
            .where_eq("source_dataset_id", self.id)
            .order_by_id()
            .fetch_all()
            .await
    }
}

/// Fields for a new [`Dataset`]; `name` and `datatype` are mandatory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDataset {
    pub name: Option<String>,
    pub datatype: Option<String>,
    pub process: Option<String>,
    pub nevents: Option<i64>,
    pub xsection: Option<f64>,
    pub energy: Option<f64>,
    pub dsize: Option<i64>,
    pub cmssw_release: Option<String>,
    pub globaltag: Option<String>,
    pub user_comment: Option<String>,
    /// Creation time in the grid catalog, if known
    pub creation_time: Option<String>,
}

impl NewDataset {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            datatype: Some(datatype.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        require_text("Dataset", "name", &self.name)?;
        let datatype = require_text("Dataset", "datatype", &self.datatype)?;
        check_choice("Dataset", "datatype", datatype, &DataType::ALLOWED)
    }

    #[instrument(skip(self, session), fields(name = ?self.name))]
    pub async fn create(self, session: &Session) -> Result<Dataset> {
        self.validate()?;
        let id = insert_row(
            session,
            &schema::DATASET,
            vec![
                ("name", SqlValue::from(self.name)),
                ("datatype", SqlValue::from(self.datatype)),
                ("process", SqlValue::from(self.process)),
                ("nevents", SqlValue::from(self.nevents)),
                ("xsection", SqlValue::from(self.xsection)),
                ("energy", SqlValue::from(self.energy)),
                ("dsize", SqlValue::from(self.dsize)),
                ("cmssw_release", SqlValue::from(self.cmssw_release)),
                ("globaltag", SqlValue::from(self.globaltag)),
                ("user_comment", SqlValue::from(self.user_comment)),
                ("creation_time", SqlValue::from(self.creation_time)),
            ],
        )
        .await?;
        info!(id, "Dataset created");
        Dataset::get(session, id).await
    }
}
