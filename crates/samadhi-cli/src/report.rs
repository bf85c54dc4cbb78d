//! Human-readable renderings of catalog records
//!
//! Every searchable type has a one-line summary (`id<TAB>label`) and a
//! multi-line report used by `search --long`. Reports may need related
//! records (files, analysis, result counts), so rendering takes the session.

use samadhi_store::{Analysis, Dataset, Entity, PhysicsResult, Sample, Session};
use std::fmt::Display;

use crate::error::Result;

/// Separator printed after each long report
pub const SEPARATOR: &str =
    "--------------------------------------------------------------------------------------";

/// File listings longer than this are shortened
const MAX_LISTED_FILES: usize = 5;

pub(crate) trait Report: Entity {
    /// Column matched by `--name`, if the type supports it
    const NAME_COLUMN: Option<&'static str>;
    /// Column matched by `--path`, if the type supports it
    const PATH_COLUMN: Option<&'static str>;

    /// `id<TAB>label`
    fn summary(&self) -> String;

    async fn render(&self, session: &Session) -> Result<String>;
}

fn or_none<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

fn fixed_or_none(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}"),
        None => "None".to_string(),
    }
}

fn float_or_none(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:?}"),
        None => "None".to_string(),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Report for Dataset {
    const NAME_COLUMN: Option<&'static str> = Some("name");
    const PATH_COLUMN: Option<&'static str> = None;

    fn summary(&self) -> String {
        format!("{}\t{}", self.id, self.name)
    }

    async fn render(&self, _session: &Session) -> Result<String> {
        Ok(format!(
            "Dataset #{}:\n  \
             name: {}\n  \
             process: {}\n  \
             cross-section: {}\n  \
             number of events: {}\n  \
             size on disk: {}\n  \
             CMSSW release: {}\n  \
             global tag: {}\n  \
             type (data or mc): {}\n  \
             center-of-mass energy: {} TeV\n  \
             creation time (on DAS): {}\n  \
             comment: {}",
            self.id,
            self.name,
            or_none(&self.process),
            fixed_or_none(self.xsection),
            or_none(&self.nevents),
            or_none(&self.dsize),
            or_none(&self.cmssw_release),
            or_none(&self.globaltag),
            self.datatype,
            fixed_or_none(self.energy),
            or_none(&self.creation_time),
            or_none(&self.user_comment),
        ))
    }
}

impl Report for Sample {
    const NAME_COLUMN: Option<&'static str> = Some("name");
    const PATH_COLUMN: Option<&'static str> = Some("path");

    fn summary(&self) -> String {
        format!("{}\t{}", self.id, self.name)
    }

    async fn render(&self, session: &Session) -> Result<String> {
        let luminosity = self.effective_luminosity(session).await?;
        let files = self.files(session).await?;

        let extras = if present(&self.extras_event_weight_sum).is_some() {
            "  has extras sum of event weight\n"
        } else {
            ""
        };
        let has_lumi = if present(&self.processed_lumi).is_some() {
            "has"
        } else {
            "does not have"
        };
        let source_dataset = self
            .source_dataset_id
            .map_or_else(String::new, |id| format!("  source dataset: {id}\n"));
        let source_sample = self
            .source_sample_id
            .map_or_else(String::new, |id| format!("  source sample: {id}\n"));

        Ok(format!(
            "Sample #{} (created on {} by {})\n  \
             name: {}\n  \
             path: {}\n  \
             type: {}\n  \
             number of processed events: {}\n  \
             number of events: {}\n  \
             normalization: {:?}\n  \
             sum of event weights: {}\n\
             {extras}  \
             (effective) luminosity: {}\n  \
             {has_lumi} processed luminosity sections information\n  \
             code version: {}\n  \
             comment: {}\n\
             {source_dataset}\
             {source_sample}  \
             {}",
            self.id,
            self.creation_time,
            or_none(&self.author),
            self.name,
            self.path,
            self.sampletype,
            self.nevents_processed,
            self.nevents.map_or_else(|| "none".to_string(), |n| n.to_string()),
            self.normalization,
            float_or_none(self.event_weight_sum),
            float_or_none(luminosity),
            or_none(&self.code_version),
            or_none(&self.user_comment),
            file_listing(&files),
        ))
    }
}

fn file_line(file: &samadhi_store::File) -> String {
    format!("{} ({} entries)", file.lfn, file.nevents)
}

/// `N files:` followed by one line per file, or the first three, `...` and
/// the last one when there are more than five
pub fn file_listing(files: &[samadhi_store::File]) -> String {
    if files.is_empty() {
        return "no files".to_string();
    }
    let lines: Vec<String> = if files.len() > MAX_LISTED_FILES {
        let mut lines: Vec<String> = files[..3].iter().map(file_line).collect();
        lines.push("...".to_string());
        lines.extend(files.last().map(file_line));
        lines
    } else {
        files.iter().map(file_line).collect()
    };
    format!("{} files: \n    - {}", files.len(), lines.join("\n    - "))
}

impl Report for PhysicsResult {
    const NAME_COLUMN: Option<&'static str> = None;
    const PATH_COLUMN: Option<&'static str> = Some("path");

    fn summary(&self) -> String {
        format!("{}\t{}", self.id, or_none(&self.description))
    }

    async fn render(&self, session: &Session) -> Result<String> {
        let analysis = match self.analysis(session).await? {
            Some(analysis) => format!("\n  part of analysis {}", or_none(&analysis.description)),
            None => String::new(),
        };
        let elog = present(&self.elog)
            .map_or_else(String::new, |elog| format!("\n  more details in {elog}"));
        Ok(format!(
            "Result in {}\n  created on {} by {}{analysis}{elog}",
            self.path,
            self.creation_time,
            or_none(&self.author)
        ))
    }
}

impl Report for Analysis {
    // Analyses have no name; `--name` matches their description.
    const NAME_COLUMN: Option<&'static str> = Some("description");
    const PATH_COLUMN: Option<&'static str> = None;

    fn summary(&self) -> String {
        format!("{}\t{}", self.id, or_none(&self.description))
    }

    async fn render(&self, session: &Session) -> Result<String> {
        let cadi = present(&self.cadiline)
            .map_or_else(String::new, |cadi| format!("  CADI line: {cadi}\n"));
        let contact = present(&self.contact)
            .map_or_else(String::new, |contact| format!("  Contact/Promotor: {contact}\n"));
        Ok(format!(
            "{}\n{cadi}{contact}  Number of associated results: {}",
            or_none(&self.description),
            self.result_count(session).await?
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use samadhi_store::{NewAnalysis, NewDataset, NewFile, NewPhysicsResult, NewSample};

    #[test]
    fn test_separator_width() {
        assert_eq!(SEPARATOR.len(), 86);
        assert!(SEPARATOR.chars().all(|c| c == '-'));
    }

    #[tokio::test]
    async fn test_dataset_report() {
        let session = Session::in_memory().await.unwrap();
        let dataset = NewDataset {
            xsection: Some(831.76),
            energy: Some(13.0),
            nevents: Some(1000),
            ..NewDataset::new("/TT_TuneCUETP8M2T4_13TeV-powheg-pythia8", "mc")
        }
        .create(&session)
        .await
        .unwrap();

        assert_eq!(
            dataset.summary(),
            format!("{}\t/TT_TuneCUETP8M2T4_13TeV-powheg-pythia8", dataset.id)
        );
        let report = dataset.render(&session).await.unwrap();
        assert!(report.starts_with(&format!("Dataset #{}:\n  name: /TT_", dataset.id)));
        assert!(report.contains("\n  cross-section: 831.760000\n"));
        assert!(report.contains("\n  center-of-mass energy: 13.000000 TeV\n"));
        assert!(report.contains("\n  size on disk: None\n"));
        assert!(report.contains("\n  type (data or mc): mc\n"));
        assert!(report.ends_with("  comment: None"));
    }

    #[tokio::test]
    async fn test_sample_report_lists_files() {
        let session = Session::in_memory().await.unwrap();
        let sample = NewSample {
            author: Some("llbb".to_string()),
            luminosity: Some(12.5),
            processed_lumi: Some("{\"1\": [[1, 10]]}".to_string()),
            creation_time: Some("2019-04-01 10:00:00".to_string()),
            ..NewSample::new("ttbar_semilep", "/store/ttbar", "NTUPLES", 1000)
        }
        .create(&session)
        .await
        .unwrap();

        let report = sample.render(&session).await.unwrap();
        assert!(report.starts_with(&format!(
            "Sample #{} (created on 2019-04-01 10:00:00 by llbb)\n",
            sample.id
        )));
        assert!(report.contains("\n  number of events: none\n"));
        assert!(report.contains("\n  normalization: 1.0\n"));
        assert!(report.contains("\n  (effective) luminosity: 12.5\n"));
        assert!(report.contains("\n  has processed luminosity sections information\n"));
        assert!(!report.contains("source dataset"));
        assert!(report.ends_with("  no files"));

        for i in 0..7 {
            NewFile::new(format!("/store/f{i}.root"), format!("root://f{i}"), 10 + i, 1.0, sample.id)
                .create(&session)
                .await
                .unwrap();
        }
        let report = sample.render(&session).await.unwrap();
        assert!(report.ends_with(
            "  7 files: \n    - /store/f0.root (10 entries)\n    - /store/f1.root (11 entries)\n    - /store/f2.root (12 entries)\n    - ...\n    - /store/f6.root (16 entries)"
        ));
    }

    #[tokio::test]
    async fn test_derived_sample_report_lines() {
        let session = Session::in_memory().await.unwrap();
        let parent = NewSample {
            luminosity: Some(40.0),
            ..NewSample::new("parent", "/store/parent", "NTUPLES", 100)
        }
        .create(&session)
        .await
        .unwrap();
        let child = NewSample {
            extras_event_weight_sum: Some("{\"pdf\": 1.0}".to_string()),
            code_version: Some("v1.2".to_string()),
            source_sample_id: Some(parent.id),
            ..NewSample::new("child", "/store/child", "SKIM", 50)
        }
        .create(&session)
        .await
        .unwrap();

        let report = child.render(&session).await.unwrap();
        assert!(report.contains(
            "\n  sum of event weights: None\n  has extras sum of event weight\n  (effective) luminosity: 40.0\n"
        ));
        assert!(report.contains(
            "\n  code version: v1.2\n  comment: None\n  source sample: 1\n  no files"
        ));
        assert!(report.contains("\n  does not have processed luminosity sections information\n"));
    }

    #[tokio::test]
    async fn test_result_and_analysis_reports() {
        let session = Session::in_memory().await.unwrap();
        let analysis = NewAnalysis {
            cadiline: Some("HIG-17-006".to_string()),
            ..NewAnalysis::described("HH to bbVV")
        }
        .create(&session)
        .await
        .unwrap();
        let result = NewPhysicsResult {
            author: Some("llbb".to_string()),
            elog: Some("https://elog.example.org/123".to_string()),
            creation_time: Some("2020-01-02 03:04:05".to_string()),
            analysis_id: Some(analysis.id),
            ..NewPhysicsResult::at("/results/limits")
        }
        .create(&session)
        .await
        .unwrap();

        assert_eq!(result.summary(), format!("{}\tNone", result.id));
        assert_eq!(
            result.render(&session).await.unwrap(),
            "Result in /results/limits\n  created on 2020-01-02 03:04:05 by llbb\n  part of analysis HH to bbVV\n  more details in https://elog.example.org/123"
        );

        assert_eq!(analysis.summary(), format!("{}\tHH to bbVV", analysis.id));
        assert_eq!(
            analysis.render(&session).await.unwrap(),
            "HH to bbVV\n  CADI line: HIG-17-006\n  Number of associated results: 1"
        );
    }
}
