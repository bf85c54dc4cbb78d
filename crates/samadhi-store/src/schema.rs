//! Catalog schema
//!
//! Tables are declared once as [`TableDef`] values and rendered into DDL for
//! whichever [`Backend`] the session is connected to. Timestamps are stored
//! as `YYYY-MM-DD HH:MM:SS` text so both dialects decode them the same way.

use crate::session::Backend;

/// Column storage class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incremented integer primary key
    AutoId,
    Integer,
    Real,
    /// Short indexed string
    Varchar,
    Text,
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub default: Option<&'static str>,
}

impl ColumnDef {
    /// NOT NULL column
    pub const fn required(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: false,
            default: None,
        }
    }

    pub const fn nullable(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: true,
            default: None,
        }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub column: &'static str,
    pub table: &'static str,
    pub references: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Composite key; tables with an `AutoId` column leave this empty
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
    pub indexes: &'static [IndexDef],
}

use ColumnType::*;

pub const ANALYSIS: TableDef = TableDef {
    name: "analysis",
    columns: &[
        ColumnDef::required("analysis_id", AutoId),
        ColumnDef::nullable("cadiline", Text),
        ColumnDef::nullable("contact", Text),
        ColumnDef::nullable("description", Text),
    ],
    primary_key: &[],
    foreign_keys: &[],
    indexes: &[],
};

pub const DATASET: TableDef = TableDef {
    name: "dataset",
    columns: &[
        ColumnDef::required("dataset_id", AutoId),
        ColumnDef::required("name", Varchar),
        ColumnDef::required("datatype", Varchar),
        ColumnDef::nullable("process", Varchar),
        ColumnDef::nullable("nevents", Integer),
        ColumnDef::nullable("xsection", Real),
        ColumnDef::nullable("energy", Real),
        ColumnDef::nullable("dsize", Integer),
        ColumnDef::nullable("cmssw_release", Varchar),
        ColumnDef::nullable("globaltag", Varchar),
        ColumnDef::nullable("user_comment", Text),
        ColumnDef::nullable("creation_time", Timestamp),
    ],
    primary_key: &[],
    foreign_keys: &[],
    indexes: &[IndexDef {
        name: "dataset_name",
        columns: &["name"],
        unique: false,
    }],
};

pub const SAMPLE: TableDef = TableDef {
    name: "sample",
    columns: &[
        ColumnDef::required("sample_id", AutoId),
        ColumnDef::required("name", Varchar),
        ColumnDef::required("path", Varchar),
        ColumnDef::required("sampletype", Varchar),
        ColumnDef::required("nevents_processed", Integer),
        ColumnDef::nullable("nevents", Integer),
        ColumnDef::nullable("event_weight_sum", Real),
        ColumnDef::nullable("extras_event_weight_sum", Text),
        ColumnDef::nullable("luminosity", Real),
        ColumnDef::required("normalization", Real).with_default("1.0"),
        ColumnDef::nullable("author", Text),
        ColumnDef::nullable("code_version", Varchar),
        ColumnDef::nullable("processed_lumi", Text),
        ColumnDef::nullable("user_comment", Text),
        ColumnDef::required("creation_time", Timestamp),
        ColumnDef::nullable("source_dataset_id", Integer),
        ColumnDef::nullable("source_sample_id", Integer),
    ],
    primary_key: &[],
    foreign_keys: &[
        ForeignKey {
            column: "source_dataset_id",
            table: "dataset",
            references: "dataset_id",
        },
        ForeignKey {
            column: "source_sample_id",
            table: "sample",
            references: "sample_id",
        },
    ],
    indexes: &[
        IndexDef {
            name: "sample_name",
            columns: &["name"],
            unique: false,
        },
        IndexDef {
            name: "sample_source_dataset_id",
            columns: &["source_dataset_id"],
            unique: false,
        },
        IndexDef {
            name: "sample_source_sample_id",
            columns: &["source_sample_id"],
            unique: false,
        },
    ],
};

pub const FILE: TableDef = TableDef {
    name: "file",
    columns: &[
        ColumnDef::required("id", AutoId),
        ColumnDef::required("lfn", Varchar),
        ColumnDef::required("pfn", Varchar),
        ColumnDef::required("nevents", Integer),
        ColumnDef::required("event_weight_sum", Real),
        ColumnDef::nullable("extras_event_weight_sum", Text),
        ColumnDef::required("sample_id", Integer),
    ],
    primary_key: &[],
    foreign_keys: &[ForeignKey {
        column: "sample_id",
        table: "sample",
        references: "sample_id",
    }],
    indexes: &[IndexDef {
        name: "file_sample_id",
        columns: &["sample_id"],
        unique: false,
    }],
};

pub const RESULT: TableDef = TableDef {
    name: "result",
    columns: &[
        ColumnDef::required("result_id", AutoId),
        ColumnDef::required("path", Varchar),
        ColumnDef::nullable("author", Text),
        ColumnDef::nullable("description", Text),
        ColumnDef::nullable("elog", Varchar),
        ColumnDef::required("creation_time", Timestamp),
        ColumnDef::nullable("analysis_id", Integer),
    ],
    primary_key: &[],
    foreign_keys: &[ForeignKey {
        column: "analysis_id",
        table: "analysis",
        references: "analysis_id",
    }],
    indexes: &[
        IndexDef {
            name: "result_path",
            columns: &["path"],
            unique: false,
        },
        IndexDef {
            name: "result_analysis_id",
            columns: &["analysis_id"],
            unique: false,
        },
    ],
};

pub const SAMPLE_RESULT: TableDef = TableDef {
    name: "sampleresult",
    columns: &[
        ColumnDef::required("result_id", Integer),
        ColumnDef::required("sample_id", Integer),
    ],
    primary_key: &["result_id", "sample_id"],
    foreign_keys: &[
        ForeignKey {
            column: "result_id",
            table: "result",
            references: "result_id",
        },
        ForeignKey {
            column: "sample_id",
            table: "sample",
            references: "sample_id",
        },
    ],
    indexes: &[IndexDef {
        name: "sampleresult_sample_id_result_id",
        columns: &["sample_id", "result_id"],
        unique: true,
    }],
};

/// All tables, referenced tables first
pub const TABLES: [TableDef; 6] = [ANALYSIS, DATASET, SAMPLE, FILE, RESULT, SAMPLE_RESULT];

fn column_type(ty: ColumnType, backend: Backend) -> &'static str {
    match (ty, backend) {
        (AutoId, Backend::Sqlite) => "INTEGER PRIMARY KEY AUTOINCREMENT",
        (AutoId, Backend::MySql) => "BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY",
        (Integer, Backend::Sqlite) => "INTEGER",
        (Integer, Backend::MySql) => "BIGINT",
        (Real, Backend::Sqlite) => "REAL",
        (Real, Backend::MySql) => "DOUBLE",
        (Varchar, _) => "VARCHAR(255)",
        (Text, _) => "TEXT",
        (Timestamp, _) => "VARCHAR(32)",
    }
}

fn render_column(column: &ColumnDef, backend: Backend) -> String {
    let mut sql = format!("{} {}", column.name, column_type(column.ty, backend));
    if column.ty != AutoId {
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
    }
    sql
}

fn index_keyword(index: &IndexDef) -> &'static str {
    if index.unique {
        "UNIQUE INDEX"
    } else {
        "INDEX"
    }
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The auto-assigned id column, if the table has one
    pub fn auto_id(&self) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|c| c.ty == AutoId)
            .map(|c| c.name)
    }

    /// `CREATE TABLE` plus, for SQLite, one `CREATE INDEX` per index
    pub fn create_statements(&self, backend: Backend) -> Vec<String> {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| render_column(c, backend))
            .collect();

        if !self.primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        for fk in self.foreign_keys {
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                fk.column, fk.table, fk.references
            ));
        }
        // MySQL has no CREATE INDEX IF NOT EXISTS, so indexes go inline there.
        if backend == Backend::MySql {
            for index in self.indexes {
                parts.push(format!(
                    "{} {} ({})",
                    index_keyword(index),
                    index.name,
                    index.columns.join(", ")
                ));
            }
        }

        let suffix = match backend {
            Backend::Sqlite => "",
            Backend::MySql => " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        };
        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n){}",
            self.name,
            parts.join(",\n    "),
            suffix
        )];

        if backend == Backend::Sqlite {
            for index in self.indexes {
                statements.push(format!(
                    "CREATE {} IF NOT EXISTS {} ON {} ({})",
                    index_keyword(index),
                    index.name,
                    self.name,
                    index.columns.join(", ")
                ));
            }
        }
        statements
    }
}

/// DDL for the whole catalog, in dependency order
pub fn create_statements(backend: Backend) -> Vec<String> {
    TABLES
        .iter()
        .flat_map(|table| table.create_statements(backend))
        .collect()
}
