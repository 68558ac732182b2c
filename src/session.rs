//! Conversion session: the state behind the converter UI.
//!
//! A [`Session`] holds everything the page shows (status log, selected file,
//! download slots, whether the run action is enabled) without touching a
//! rendering environment. Hosts drive it through a fixed sequence:
//!
//! ```text
//! bootstrap -> select_file -> start_run -> begin_conversion -> complete
//! ```
//!
//! `start_run` and `complete` are split so a host can read the file and
//! yield to its event loop in between. While a run is in flight the run
//! action is disabled; a file selected mid-run makes that run's result stale
//! and it is discarded.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::converter::{ConversionRequest, ConversionResult, Converter};
use crate::delimiter::Delimiter;
use crate::error::ConvertError;

/// Media type of both exports.
pub const CSV_MEDIA_TYPE: &str = "text/csv;charset=utf-8";

pub const READY_MESSAGE: &str = "Convertisseur prêt ✅";
pub const NO_FILE_MESSAGE: &str = "⚠️ Choisis un fichier XML.";
pub const CONVERTING_MESSAGE: &str = "Conversion en cours…";
pub const DONE_MESSAGE: &str = "✅ Terminé";

/// Which export an artifact carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactRole {
    Raw,
    Scdl,
}

impl ArtifactRole {
    pub const ALL: [ArtifactRole; 2] = [ArtifactRole::Raw, ArtifactRole::Scdl];

    /// Fixed download name for this export.
    pub fn filename(self) -> &'static str {
        match self {
            ArtifactRole::Raw => "budget_raw.csv",
            ArtifactRole::Scdl => "budget_scdl.csv",
        }
    }

    fn index(self) -> usize {
        match self {
            ArtifactRole::Raw => 0,
            ArtifactRole::Scdl => 1,
        }
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filename())
    }
}

/// Name and size of the file picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub name: String,
    pub size: u64,
}

impl SourceInfo {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Size in MiB rounded to one decimal, without a trailing `.0`.
    pub fn size_label(&self) -> String {
        let mib = (self.size as f64 / 1024.0 / 1024.0 * 10.0).round() / 10.0;
        format!("{mib} MB")
    }
}

/// A source document read fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub info: SourceInfo,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let info = SourceInfo::new(name, bytes.len() as u64);
        Self { info, bytes }
    }

    /// Read a file from disk, naming it after its final path component.
    pub fn read(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

/// A downloadable export.
///
/// `revision` changes every time the slot is refilled, so hosts know when a
/// previously created object URL has been superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub role: ArtifactRole,
    pub content: String,
    pub revision: u64,
}

impl DownloadArtifact {
    pub fn filename(&self) -> &'static str {
        self.role.filename()
    }

    pub fn media_type(&self) -> &'static str {
        CSV_MEDIA_TYPE
    }

    pub fn bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

#[derive(Debug, Clone, Default)]
struct ArtifactSlot {
    artifact: Option<DownloadArtifact>,
    visible: bool,
}

/// Why the run action did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunRejected {
    #[error("converter not initialized")]
    NotReady,
    #[error("a conversion is already running")]
    Busy,
    #[error("no file selected")]
    NoFile,
}

/// Proof that a run was accepted; handed back to [`Session::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    generation: u64,
    pub delimiter: Delimiter,
    pub source: SourceInfo,
}

/// What became of an accepted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Both exports are available for download.
    Exposed,
    /// Reading or converting failed; the error is in the log.
    Failed,
    /// A different file was selected while the run was in flight.
    Discarded,
}

/// UI state of the converter page.
pub struct Session<C> {
    converter: Option<C>,
    log: Vec<String>,
    source: Option<SourceInfo>,
    generation: u64,
    in_flight: bool,
    slots: [ArtifactSlot; 2],
    revision: u64,
}

impl<C> Default for Session<C> {
    fn default() -> Self {
        Self {
            converter: None,
            log: Vec::new(),
            source: None,
            generation: 0,
            in_flight: false,
            slots: Default::default(),
            revision: 0,
        }
    }
}

impl<C: Converter> Session<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the converter capability, or record why it is unavailable.
    ///
    /// A failed bootstrap leaves the run action disabled for the session.
    pub fn bootstrap(&mut self, loaded: Result<C, ConvertError>) {
        self.log.clear();
        match loaded {
            Ok(converter) => {
                self.converter = Some(converter);
                self.push_log(READY_MESSAGE.to_string());
            }
            Err(e) => {
                log::error!("converter setup failed: {e}");
                self.push_log(format!("❌ Erreur: {e}"));
            }
        }
    }

    /// Record a new file choice and hide any exports of the previous one.
    pub fn select_file(&mut self, source: Option<SourceInfo>) {
        self.source = source;
        self.generation += 1;
        for slot in &mut self.slots {
            slot.visible = false;
        }
    }

    /// Accept a run for the selected file, or explain why not.
    pub fn start_run(&mut self, delimiter: Delimiter) -> Result<RunTicket, RunRejected> {
        if self.converter.is_none() {
            return Err(RunRejected::NotReady);
        }
        if self.in_flight {
            return Err(RunRejected::Busy);
        }
        let Some(source) = self.source.clone() else {
            self.push_log(NO_FILE_MESSAGE.to_string());
            return Err(RunRejected::NoFile);
        };

        self.log.clear();
        self.push_log(format!("Lecture: {} ({})", source.name, source.size_label()));
        self.in_flight = true;

        Ok(RunTicket {
            generation: self.generation,
            delimiter,
            source,
        })
    }

    /// Note that the file was read and conversion is about to start.
    pub fn begin_conversion(&mut self, ticket: &RunTicket) {
        if ticket.generation == self.generation {
            self.push_log(CONVERTING_MESSAGE.to_string());
        }
    }

    /// Finish a run with the bytes read for it (or the read error).
    pub fn complete(&mut self, ticket: RunTicket, read: Result<Vec<u8>, String>) -> RunOutcome {
        self.in_flight = false;

        if ticket.generation != self.generation {
            log::warn!("discarding result for {}: selection changed", ticket.source.name);
            self.push_log(format!(
                "Fichier changé pendant la conversion, résultat ignoré ({}).",
                ticket.source.name
            ));
            return RunOutcome::Discarded;
        }

        let bytes = match read {
            Ok(bytes) => bytes,
            Err(e) => {
                self.push_log(format!("❌ Erreur: {e}"));
                return RunOutcome::Failed;
            }
        };

        let Some(converter) = self.converter.as_ref() else {
            return RunOutcome::Failed;
        };
        let request = ConversionRequest::new(bytes, ticket.delimiter);
        let converted = if request.bytes.is_empty() {
            Err(ConvertError::EmptyInput)
        } else {
            converter.convert(&request)
        };

        match converted {
            Ok(result) => {
                self.expose(result);
                RunOutcome::Exposed
            }
            Err(e) => {
                log::warn!("conversion of {} failed: {e}", ticket.source.name);
                self.push_log(format!("❌ Erreur: {e}"));
                RunOutcome::Failed
            }
        }
    }

    /// Publish both exports, superseding any previous ones.
    pub fn expose(&mut self, result: ConversionResult) {
        let ConversionResult {
            raw_csv,
            scdl_csv,
            stats,
        } = result;

        for (role, content) in [(ArtifactRole::Raw, raw_csv), (ArtifactRole::Scdl, scdl_csv)] {
            self.revision += 1;
            self.slots[role.index()] = ArtifactSlot {
                artifact: Some(DownloadArtifact {
                    role,
                    content,
                    revision: self.revision,
                }),
                visible: true,
            };
        }

        self.push_log(DONE_MESSAGE.to_string());
        self.push_log(format!("Stats: {}", stats.to_pretty_json()));
    }

    /// Run a conversion end to end on bytes already in memory.
    pub fn run(&mut self, delimiter: Delimiter, bytes: Vec<u8>) -> Result<RunOutcome, RunRejected> {
        let ticket = self.start_run(delimiter)?;
        self.begin_conversion(&ticket);
        Ok(self.complete(ticket, Ok(bytes)))
    }
}

impl<C> Session<C> {
    fn push_log(&mut self, line: String) {
        log::info!("{line}");
        self.log.push(line);
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    /// Log as shown in the status area, one entry per line.
    pub fn log_text(&self) -> String {
        self.log.join("\n")
    }

    pub fn is_ready(&self) -> bool {
        self.converter.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Whether the run action should be enabled.
    pub fn can_run(&self) -> bool {
        self.is_ready() && !self.in_flight
    }

    pub fn source(&self) -> Option<&SourceInfo> {
        self.source.as_ref()
    }

    /// The export for `role`, if it is currently offered for download.
    pub fn artifact(&self, role: ArtifactRole) -> Option<&DownloadArtifact> {
        let slot = &self.slots[role.index()];
        slot.artifact.as_ref().filter(|_| slot.visible)
    }

    pub fn visible_artifacts(&self) -> Vec<&DownloadArtifact> {
        ArtifactRole::ALL
            .into_iter()
            .filter_map(|role| self.artifact(role))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{CfuConverter, Statistics};
    use std::cell::Cell;

    /// Converter double: echoes the delimiter, fails on demand.
    struct FakeConverter {
        fail: bool,
        calls: Cell<usize>,
    }

    impl FakeConverter {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: Cell::new(0),
            }
        }
    }

    impl Converter for FakeConverter {
        fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult, ConvertError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ConvertError::Xml("élément <a> non fermé".to_string()));
            }
            let sep = request.delimiter.as_char();
            let mut stats = Statistics::new();
            stats.insert("lignes", 1);
            Ok(ConversionResult {
                raw_csv: format!("a{sep}b\r\n1{sep}2\r\n"),
                scdl_csv: format!("BGT_ID{sep}BGT_NOM\r\n1{sep}x\r\n"),
                stats,
            })
        }
    }

    fn ready(converter: FakeConverter) -> Session<FakeConverter> {
        let mut session = Session::new();
        session.bootstrap(Ok(converter));
        session
    }

    #[test]
    fn test_bootstrap_enables_run() {
        let session = ready(FakeConverter::ok());
        assert!(session.can_run());
        assert_eq!(session.log_text(), READY_MESSAGE);
    }

    #[test]
    fn test_bootstrap_failure_keeps_run_disabled() {
        let mut session: Session<FakeConverter> = Session::new();
        session.bootstrap(Err(ConvertError::Setup("boom".to_string())));
        assert!(!session.can_run());
        assert!(session.log_text().starts_with("❌ Erreur:"));

        session.select_file(Some(SourceInfo::new("budget.xml", 10)));
        assert_eq!(session.run(Delimiter::Comma, b"<a/>".to_vec()), Err(RunRejected::NotReady));
        assert!(session.visible_artifacts().is_empty());
    }

    #[test]
    fn test_run_without_file_warns_for_every_delimiter() {
        for delimiter in Delimiter::ALL {
            let converter = FakeConverter::ok();
            let mut session = ready(converter);
            assert_eq!(session.start_run(delimiter), Err(RunRejected::NoFile));
            assert_eq!(session.log_lines().last().unwrap(), NO_FILE_MESSAGE);
            assert!(session.visible_artifacts().is_empty());
            assert!(!session.is_busy());
            assert_eq!(session.converter.as_ref().unwrap().calls.get(), 0);
        }
    }

    #[test]
    fn test_successful_run_exposes_two_artifacts() {
        let mut session = ready(FakeConverter::ok());
        session.select_file(Some(SourceInfo::new("budget.xml", 10 * 1024)));

        let outcome = session.run(Delimiter::Semicolon, b"<x/>".to_vec()).unwrap();
        assert_eq!(outcome, RunOutcome::Exposed);

        let artifacts = session.visible_artifacts();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].filename(), "budget_raw.csv");
        assert_eq!(artifacts[1].filename(), "budget_scdl.csv");
        for artifact in artifacts {
            assert!(!artifact.content.is_empty());
            assert!(artifact.content.contains(';'));
            assert_eq!(artifact.media_type(), CSV_MEDIA_TYPE);
        }

        let lines = session.log_lines();
        assert_eq!(lines[0], "Lecture: budget.xml (0 MB)");
        assert_eq!(lines[1], CONVERTING_MESSAGE);
        assert_eq!(lines[2], DONE_MESSAGE);
        assert_eq!(lines[3], "Stats: {\n  \"lignes\": 1\n}");
        assert!(!session.is_busy());
    }

    #[test]
    fn test_new_selection_hides_artifacts() {
        let mut session = ready(FakeConverter::ok());
        session.select_file(Some(SourceInfo::new("a.xml", 1)));
        session.run(Delimiter::Comma, b"<x/>".to_vec()).unwrap();
        assert_eq!(session.visible_artifacts().len(), 2);

        session.select_file(Some(SourceInfo::new("b.xml", 1)));
        assert!(session.visible_artifacts().is_empty());
        assert!(session.artifact(ArtifactRole::Raw).is_none());
    }

    #[test]
    fn test_converter_error_is_logged_without_artifacts() {
        let mut session = ready(FakeConverter::failing());
        session.select_file(Some(SourceInfo::new("bad.xml", 3)));

        let outcome = session.run(Delimiter::Comma, b"<a>".to_vec()).unwrap();
        assert_eq!(outcome, RunOutcome::Failed);
        assert!(session.visible_artifacts().is_empty());
        let last = session.log_lines().last().unwrap();
        assert!(last.starts_with("❌ Erreur: "));
        assert!(last.len() > "❌ Erreur: ".len());
        assert!(session.can_run());
    }

    #[test]
    fn test_failed_rerun_keeps_previous_artifacts_untouched() {
        let mut session: Session<Box<dyn Converter>> = Session::new();
        session.bootstrap(Ok(Box::new(FakeConverter::ok())));
        session.select_file(Some(SourceInfo::new("a.xml", 1)));
        session.run(Delimiter::Comma, b"<x/>".to_vec()).unwrap();
        let before = session.artifact(ArtifactRole::Raw).cloned();

        // Empty bytes never reach the converter.
        let outcome = session.run(Delimiter::Comma, Vec::new()).unwrap();
        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(session.artifact(ArtifactRole::Raw).cloned(), before);
    }

    #[test]
    fn test_read_error_is_logged() {
        let mut session = ready(FakeConverter::ok());
        session.select_file(Some(SourceInfo::new("a.xml", 1)));
        let ticket = session.start_run(Delimiter::Comma).unwrap();
        let outcome = session.complete(ticket, Err("NotReadableError".to_string()));
        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(session.log_lines().last().unwrap(), "❌ Erreur: NotReadableError");
        assert_eq!(session.converter.as_ref().unwrap().calls.get(), 0);
    }

    #[test]
    fn test_run_disabled_while_in_flight() {
        let mut session = ready(FakeConverter::ok());
        session.select_file(Some(SourceInfo::new("a.xml", 1)));
        let ticket = session.start_run(Delimiter::Comma).unwrap();
        assert!(!session.can_run());
        assert_eq!(session.start_run(Delimiter::Comma), Err(RunRejected::Busy));

        session.begin_conversion(&ticket);
        assert_eq!(session.complete(ticket, Ok(b"<x/>".to_vec())), RunOutcome::Exposed);
        assert!(session.can_run());
    }

    #[test]
    fn test_selection_during_run_discards_result() {
        let mut session = ready(FakeConverter::ok());
        session.select_file(Some(SourceInfo::new("a.xml", 1)));
        let ticket = session.start_run(Delimiter::Comma).unwrap();

        session.select_file(Some(SourceInfo::new("b.xml", 1)));
        let outcome = session.complete(ticket, Ok(b"<x/>".to_vec()));
        assert_eq!(outcome, RunOutcome::Discarded);
        assert!(session.visible_artifacts().is_empty());
        assert!(session.can_run());
    }

    #[test]
    fn test_rerun_supersedes_artifacts_with_same_content() {
        let mut session = ready(FakeConverter::ok());
        session.select_file(Some(SourceInfo::new("a.xml", 1)));
        session.run(Delimiter::Comma, b"<x/>".to_vec()).unwrap();
        let first = session.artifact(ArtifactRole::Scdl).cloned().unwrap();

        session.run(Delimiter::Comma, b"<x/>".to_vec()).unwrap();
        let second = session.artifact(ArtifactRole::Scdl).cloned().unwrap();

        assert_eq!(first.content, second.content);
        assert_ne!(first.revision, second.revision);
    }

    #[test]
    fn test_real_converter_end_to_end() {
        let mut session = Session::new();
        session.bootstrap(CfuConverter::load());
        session.select_file(Some(SourceInfo::new("budget.xml", 200)));
        let xml = br#"<Doc><Exercice V="2024"/><LigneBudget id="1"><Nature V="60"/></LigneBudget></Doc>"#;

        assert_eq!(session.run(Delimiter::Semicolon, xml.to_vec()), Ok(RunOutcome::Exposed));
        let raw = session.artifact(ArtifactRole::Raw).unwrap();
        assert_eq!(raw.content, "LigneBudget_id;Nature\r\n1;60\r\n");
    }

    #[test]
    fn test_size_label() {
        assert_eq!(SourceInfo::new("a", 10 * 1024).size_label(), "0 MB");
        assert_eq!(SourceInfo::new("a", 1024 * 1024).size_label(), "1 MB");
        assert_eq!(SourceInfo::new("a", 1536 * 1024).size_label(), "1.5 MB");
    }
}
