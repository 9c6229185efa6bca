//! Reporting boundary: engine classification, error maps and summary rows.
//!
//! Each supported calculation engine contributes one [`EngineReporter`]
//! registered in a [`ReporterRegistry`]; directories are routed by filename
//! convention, never by dynamically loaded module names. The registry walks
//! a tree once, threads an explicit [`ReportAccumulator`] through the walk
//! and finally persists one timestamped error report per engine plus a
//! merged CSV summary as sibling files of the scanned root.
//!
//! Deep numeric parsing of CRYSTAL/FLEUR output files (band gaps, CPU
//! times, ...) is an external collaborator; the built-in reporters only
//! classify directories and normalize their error diagnostics.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{OrganizerError, Result};

/// Normalized error signature -> directories/structures exhibiting it.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// One flat record per processed calculation directory.
pub type SummaryRow = BTreeMap<String, String>;

/// Which calculation-output convention a directory follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EngineTag {
    Crystal,
    Fleur,
    Unknown,
}

impl EngineTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineTag::Crystal => "crystal",
            EngineTag::Fleur => "fleur",
            EngineTag::Unknown => "unknown",
        }
    }
}

/// Capability interface implemented once per supported engine.
pub trait EngineReporter: Sync {
    fn tag(&self) -> EngineTag;

    /// Filename-convention check deciding whether a directory belongs to
    /// this engine.
    fn matches(&self, filenames: &[String]) -> bool;

    /// Merge this directory's diagnostics into the running error map.
    fn record_error(&self, dir: &Path, filenames: &[String], errors: &mut ErrorMap) -> Result<()>;

    /// Produce a summary row if a recognized output file is present.
    fn summary(&self, dir: &Path, filenames: &[String]) -> Result<Option<SummaryRow>>;

    /// Render the accumulated error map in this engine's report layout.
    fn format_error_report(&self, errors: &ErrorMap) -> String;
}

/// CRYSTAL convention: `OUTPUT` holds the calculation result, `fort.87`
/// the error text and the first line of `INPUT` names the structure.
pub struct CrystalReporter;

impl EngineReporter for CrystalReporter {
    fn tag(&self) -> EngineTag {
        EngineTag::Crystal
    }

    fn matches(&self, filenames: &[String]) -> bool {
        filenames.iter().any(|f| f == "OUTPUT" || f == "fort.87")
    }

    fn record_error(&self, dir: &Path, filenames: &[String], errors: &mut ErrorMap) -> Result<()> {
        if !filenames.iter().any(|f| f == "fort.87") || !filenames.iter().any(|f| f == "INPUT") {
            return Ok(());
        }
        let fort = dir.join("fort.87");
        let signature = fs::read_to_string(&fort)
            .map_err(|e| OrganizerError::io(e, &fort))?
            .trim()
            .to_string();

        let input = dir.join("INPUT");
        let content = fs::read_to_string(&input).map_err(|e| OrganizerError::io(e, &input))?;
        let structure = content.lines().next().unwrap_or("").trim().to_string();

        errors.entry(signature).or_default().push(structure);
        Ok(())
    }

    fn summary(&self, dir: &Path, filenames: &[String]) -> Result<Option<SummaryRow>> {
        if !filenames.iter().any(|f| f == "OUTPUT") {
            return Ok(None);
        }
        let mut row = SummaryRow::new();
        row.insert("engine".into(), self.tag().as_str().into());
        row.insert(
            "output_path".into(),
            dir.join("OUTPUT").display().to_string(),
        );
        Ok(Some(row))
    }

    fn format_error_report(&self, errors: &ErrorMap) -> String {
        let mut out = String::from("---------REPORT CRYSTAL ERROR---------\n");
        for (error, structures) in errors {
            out.push_str(&format!("Error: {error}\n"));
            out.push_str("Structure (chemical formula):\n");
            for structure in structures {
                out.push_str(&format!("  - {structure}\n"));
            }
            out.push('\n');
        }
        out
    }
}

/// FLEUR convention: results live in `out` / `out.xml`, diagnostics in
/// `fleur.error` as banner-delimited juDFT-Error blocks.
pub struct FleurReporter;

impl FleurReporter {
    /// Split a `fleur.error` file into individual error signatures.
    fn collect_errors(content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let mut inside_block = false;
        let mut current: Vec<String> = Vec::new();

        for line in content.lines() {
            let stripped = line.trim();

            if stripped.starts_with("**************juDFT-Error") {
                inside_block = true;
                current = vec![stripped.to_string()];
                continue;
            }

            if inside_block && stripped.starts_with("*****************************************") {
                current.push(stripped.to_string());
                errors.push(current.join("\n"));
                inside_block = false;
                current.clear();
                continue;
            }

            if inside_block {
                current.push(line.trim_end().to_string());
                continue;
            }

            if stripped.contains("Schemas validity error") {
                errors.push(stripped.to_string());
            }
        }

        // A crashed run can leave the final banner unwritten.
        if inside_block && !current.is_empty() {
            errors.push(current.join("\n"));
        }

        errors
    }
}

impl EngineReporter for FleurReporter {
    fn tag(&self) -> EngineTag {
        EngineTag::Fleur
    }

    fn matches(&self, filenames: &[String]) -> bool {
        filenames
            .iter()
            .any(|f| f == "out" || f == "out.xml" || f == "fleur.error")
    }

    fn record_error(&self, dir: &Path, filenames: &[String], errors: &mut ErrorMap) -> Result<()> {
        if !filenames.iter().any(|f| f == "fleur.error") {
            return Ok(());
        }
        let path = dir.join("fleur.error");
        let content = fs::read_to_string(&path).map_err(|e| OrganizerError::io(e, &path))?;

        let found = Self::collect_errors(&content);
        let dir_name = dir.display().to_string();
        if found.is_empty() {
            errors
                .entry("No errors found".to_string())
                .or_default()
                .push(dir_name);
        } else {
            for err in found {
                errors.entry(err).or_default().push(dir_name.clone());
            }
        }
        Ok(())
    }

    fn summary(&self, dir: &Path, filenames: &[String]) -> Result<Option<SummaryRow>> {
        let output = if filenames.iter().any(|f| f == "out.xml") {
            "out.xml"
        } else if filenames.iter().any(|f| f == "out") {
            "out"
        } else {
            return Ok(None);
        };
        let mut row = SummaryRow::new();
        row.insert("engine".into(), self.tag().as_str().into());
        row.insert("output_path".into(), dir.join(output).display().to_string());
        Ok(Some(row))
    }

    fn format_error_report(&self, errors: &ErrorMap) -> String {
        let mut out = String::from("---------REPORT FLEUR ERROR---------\n");
        for (error, structures) in errors {
            out.push_str("Error:\n");
            out.push_str(error);
            out.push('\n');
            out.push_str("Structure (system folder name):\n");
            for structure in structures {
                out.push_str(&format!(" - {structure}\n"));
            }
            out.push('\n');
        }
        out
    }
}

/// Error maps and summary rows accumulated over one tree walk.
///
/// An explicit value threaded through the walk, never process-wide state.
#[derive(Debug, Default)]
pub struct ReportAccumulator {
    pub errors: BTreeMap<EngineTag, ErrorMap>,
    pub summaries: Vec<SummaryRow>,
}

impl ReportAccumulator {
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty() && self.errors.values().all(|m| m.is_empty())
    }
}

/// Ordered set of engine reporters; the first whose convention matches a
/// directory's filenames claims it.
pub struct ReporterRegistry {
    reporters: Vec<Box<dyn EngineReporter>>,
}

impl Default for ReporterRegistry {
    fn default() -> Self {
        ReporterRegistry {
            reporters: vec![Box::new(CrystalReporter), Box::new(FleurReporter)],
        }
    }
}

impl ReporterRegistry {
    pub fn new(reporters: Vec<Box<dyn EngineReporter>>) -> Self {
        ReporterRegistry { reporters }
    }

    pub fn classify(&self, filenames: &[String]) -> EngineTag {
        self.reporters
            .iter()
            .find(|r| r.matches(filenames))
            .map(|r| r.tag())
            .unwrap_or(EngineTag::Unknown)
    }

    fn reporter_for(&self, tag: EngineTag) -> Option<&dyn EngineReporter> {
        self.reporters
            .iter()
            .find(|r| r.tag() == tag)
            .map(Box::as_ref)
    }

    /// Walk `root` once, classifying every directory and accumulating
    /// per-engine errors and summary rows. With `aiida` set, a provenance
    /// UUID is derived from the first three path components below `root`
    /// and attached to each row.
    pub fn scan_tree(&self, root: &Path, aiida: bool) -> Result<ReportAccumulator> {
        let mut acc = ReportAccumulator::default();

        for entry in WalkDir::new(root) {
            let entry = entry.map_err(walk_err)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir = entry.path();
            let filenames = file_names(dir)?;

            let reporter = match self.reporters.iter().find(|r| r.matches(&filenames)) {
                Some(r) => r,
                None => continue,
            };

            reporter.record_error(dir, &filenames, acc.errors.entry(reporter.tag()).or_default())?;

            if let Some(mut row) = reporter.summary(dir, &filenames)? {
                if aiida {
                    if let Some(uuid) = uuid_from_path(dir, root) {
                        row.insert("uuid".into(), uuid);
                    }
                }
                acc.summaries.push(row);
            }
        }

        Ok(acc)
    }

    /// Persist the accumulated reports as sibling files of `root`, each
    /// name carrying a timestamp to avoid collisions across runs. Returns
    /// the paths written.
    pub fn flush(&self, root: &Path, acc: &ReportAccumulator) -> Result<Vec<PathBuf>> {
        if acc.is_empty() {
            info!("nothing to report");
            return Ok(Vec::new());
        }

        let dest = root.parent().unwrap_or_else(|| Path::new("."));
        let stamp = Local::now().format("%Y_%m_%d_%H_%M_%S");
        let mut written = Vec::new();

        if !acc.summaries.is_empty() {
            let path = dest.join(format!("summary_{stamp}.csv"));
            write_summary_csv(&path, &acc.summaries)?;
            info!(file = %path.display(), rows = acc.summaries.len(), "summary written");
            written.push(path);
        }

        for (tag, errors) in &acc.errors {
            if errors.is_empty() {
                continue;
            }
            let reporter = match self.reporter_for(*tag) {
                Some(r) => r,
                None => continue,
            };
            let path = dest.join(format!("report_{}_{stamp}.txt", tag.as_str()));
            fs::write(&path, reporter.format_error_report(errors))
                .map_err(|e| OrganizerError::io(e, &path))?;
            info!(file = %path.display(), engine = tag.as_str(), "error report written");
            written.push(path);
        }

        Ok(written)
    }
}

/// Generate summary and error reports for an already-restored tree without
/// touching any archives.
pub fn generate_reports_only(root: &Path, aiida: bool) -> Result<Vec<PathBuf>> {
    let root = root
        .canonicalize()
        .map_err(|e| OrganizerError::io(e, root))?;
    if !root.is_dir() {
        return Err(OrganizerError::NotADirectory { path: root });
    }
    let registry = ReporterRegistry::default();
    let acc = registry.scan_tree(&root, aiida)?;
    if acc.is_empty() {
        warn!(root = %root.display(), "no recognized calculation outputs found");
    }
    registry.flush(&root, &acc)
}

/// Generate the summary and error report for a single calculation located
/// by its AiiDA UUID (dashes already stripped), written as
/// `*_uuid_<uuid>_<stamp>` siblings of the root.
pub fn generate_report_for_uuid(root: &Path, uuid: &str) -> Result<Vec<PathBuf>> {
    let root = root
        .canonicalize()
        .map_err(|e| OrganizerError::io(e, root))?;
    let calc = find_calculation_by_uuid(&root, uuid)?;
    let filenames = file_names(&calc)?;

    let registry = ReporterRegistry::default();
    let reporter = match registry.reporters.iter().find(|r| r.matches(&filenames)) {
        Some(r) => r,
        None => {
            warn!(dir = %calc.display(), "unknown engine, nothing to report");
            return Ok(Vec::new());
        }
    };

    let dest = root.parent().unwrap_or_else(|| Path::new("."));
    let stamp = Local::now().format("%Y_%m_%d_%H_%M_%S");
    let mut written = Vec::new();

    if let Some(mut row) = reporter.summary(&calc, &filenames)? {
        row.insert("uuid".into(), uuid.to_string());
        let path = dest.join(format!("summary_uuid_{uuid}_{stamp}.csv"));
        write_summary_csv(&path, &[row])?;
        written.push(path);
    }

    let mut errors = ErrorMap::new();
    reporter.record_error(&calc, &filenames, &mut errors)?;
    if !errors.is_empty() {
        let path = dest.join(format!("report_uuid_{uuid}_{stamp}.txt"));
        fs::write(&path, reporter.format_error_report(&errors))
            .map_err(|e| OrganizerError::io(e, &path))?;
        written.push(path);
    }

    for file in &written {
        info!(file = %file.display(), uuid, "report written");
    }
    Ok(written)
}

/// Locate a calculation directory by its AiiDA UUID. The repository shards
/// a UUID as `<aa>/<bb>/<rest>`; when that direct path is absent, the tree
/// is walked comparing UUIDs derived from each directory's position.
pub fn find_calculation_by_uuid(root: &Path, uuid: &str) -> Result<PathBuf> {
    if uuid.len() < 4 {
        return Err(OrganizerError::UuidTooShort {
            uuid: uuid.to_string(),
        });
    }

    let expected = root.join(&uuid[..2]).join(&uuid[2..4]).join(&uuid[4..]);
    if expected.is_dir() {
        return Ok(expected);
    }

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(walk_err)?;
        if entry.file_type().is_dir()
            && uuid_from_path(entry.path(), root).as_deref() == Some(uuid)
        {
            return Ok(entry.into_path());
        }
    }

    Err(OrganizerError::CalculationNotFound {
        uuid: uuid.to_string(),
        root: root.to_path_buf(),
    })
}

/// AiiDA repository layout stores a calculation under
/// `<aa>/<bb>/<rest-of-uuid>`; the full UUID is the concatenation of the
/// first three components below the scan root.
pub fn uuid_from_path(dir: &Path, root: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .take(3)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    Some(parts.concat())
}

fn walk_err(err: walkdir::Error) -> OrganizerError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    OrganizerError::Io {
        source: err.into(),
        path,
    }
}

fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| OrganizerError::io(e, dir))? {
        let entry = entry.map_err(|e| OrganizerError::io(e, dir))?;
        if entry.file_type().map_err(|e| OrganizerError::io(e, dir))?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let headers: BTreeSet<&str> = rows.iter().flat_map(|r| r.keys().map(String::as_str)).collect();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&headers)?;
    for row in rows {
        let record: Vec<&str> = headers
            .iter()
            .map(|h| row.get(*h).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush().map_err(|e| OrganizerError::io(e, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classification_follows_filename_conventions() {
        let registry = ReporterRegistry::default();
        assert_eq!(
            registry.classify(&names(&["OUTPUT", "INPUT"])),
            EngineTag::Crystal
        );
        assert_eq!(registry.classify(&names(&["fort.87"])), EngineTag::Crystal);
        assert_eq!(registry.classify(&names(&["out.xml"])), EngineTag::Fleur);
        assert_eq!(
            registry.classify(&names(&["fleur.error"])),
            EngineTag::Fleur
        );
        assert_eq!(registry.classify(&names(&["random.txt"])), EngineTag::Unknown);
    }

    #[test]
    fn crystal_errors_are_keyed_by_fort87_content() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join("fort.87"), "SCF FAILED TO CONVERGE\n").unwrap();
        std::fs::write(dir.join("INPUT"), "MgO bulk\nrest of input\n").unwrap();

        let reporter = CrystalReporter;
        let mut errors = ErrorMap::new();
        let filenames = names(&["fort.87", "INPUT"]);
        reporter.record_error(dir, &filenames, &mut errors).unwrap();

        assert_eq!(
            errors.get("SCF FAILED TO CONVERGE").map(Vec::as_slice),
            Some(&["MgO bulk".to_string()][..])
        );
    }

    #[test]
    fn fleur_error_blocks_are_split_on_banners() {
        let content = "\
noise before\n\
**************juDFT-Error*****************\n\
Error message: charge density mismatch\n\
Hint: check the input\n\
*****************************************\n\
between blocks: Schemas validity error at line 4\n\
**************juDFT-Error*****************\n\
Error message: no convergence\n";

        let errors = FleurReporter::collect_errors(content);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("charge density mismatch"));
        assert!(errors[1].contains("Schemas validity error"));
        // Unclosed trailing block is still reported.
        assert!(errors[2].contains("no convergence"));
    }

    #[test]
    fn fleur_clean_run_lands_in_no_errors_bucket() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join("fleur.error"), "just some warnings\n").unwrap();

        let mut errors = ErrorMap::new();
        FleurReporter
            .record_error(dir, &names(&["fleur.error"]), &mut errors)
            .unwrap();
        assert!(errors.contains_key("No errors found"));
    }

    #[test]
    fn scan_tree_collects_rows_and_uuid() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("repo");
        let calc = root.join("0e").join("a8").join("rest-of-uuid");
        std::fs::create_dir_all(&calc).unwrap();
        std::fs::write(calc.join("OUTPUT"), "result").unwrap();

        let registry = ReporterRegistry::default();
        let acc = registry.scan_tree(&root, true).unwrap();
        assert_eq!(acc.summaries.len(), 1);
        let row = &acc.summaries[0];
        assert_eq!(row.get("engine").unwrap(), "crystal");
        assert_eq!(row.get("uuid").unwrap(), "0ea8rest-of-uuid");
    }

    #[test]
    fn fleur_report_layout_differs_from_crystal() {
        let mut errors = ErrorMap::new();
        errors.insert(
            "**************juDFT-Error*****************\nError message: no convergence".into(),
            vec!["repo/0e/a8/calc".into()],
        );

        let report = FleurReporter.format_error_report(&errors);
        assert!(report.starts_with("---------REPORT FLEUR ERROR---------\n"));
        assert!(report.contains("Error:\n**************juDFT-Error"));
        assert!(report.contains("Structure (system folder name):\n - repo/0e/a8/calc\n"));

        let crystal = CrystalReporter.format_error_report(&errors);
        assert!(crystal.starts_with("---------REPORT CRYSTAL ERROR---------\n"));
        assert!(crystal.contains("Structure (chemical formula):"));
    }

    #[test]
    fn flush_routes_each_engine_through_its_own_layout() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("repo");
        let crystal = root.join("crystal_calc");
        std::fs::create_dir_all(&crystal).unwrap();
        std::fs::write(crystal.join("fort.87"), "SCF FAILED\n").unwrap();
        std::fs::write(crystal.join("INPUT"), "MgO bulk\n").unwrap();
        let fleur = root.join("fleur_calc");
        std::fs::create_dir_all(&fleur).unwrap();
        std::fs::write(
            fleur.join("fleur.error"),
            "**************juDFT-Error*****************\n\
             Error message: no convergence\n\
             *****************************************\n",
        )
        .unwrap();

        let registry = ReporterRegistry::default();
        let acc = registry.scan_tree(&root, false).unwrap();
        let written = registry.flush(&root, &acc).unwrap();

        let read = |needle: &str| {
            let path = written
                .iter()
                .find(|p| p.file_name().unwrap().to_string_lossy().contains(needle))
                .unwrap();
            std::fs::read_to_string(path).unwrap()
        };

        let crystal_report = read("report_crystal_");
        assert!(crystal_report.starts_with("---------REPORT CRYSTAL ERROR---------"));
        assert!(crystal_report.contains("Error: SCF FAILED"));
        assert!(crystal_report.contains("  - MgO bulk"));

        let fleur_report = read("report_fleur_");
        assert!(fleur_report.starts_with("---------REPORT FLEUR ERROR---------"));
        assert!(fleur_report.contains("Error:\n**************juDFT-Error"));
        assert!(fleur_report.contains("Structure (system folder name):"));
    }

    #[test]
    fn uuid_lookup_hits_the_sharded_path_directly() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("repo");
        let calc = root.join("0e").join("a8").join("restofuuid");
        std::fs::create_dir_all(&calc).unwrap();

        let found = find_calculation_by_uuid(&root, "0ea8restofuuid").unwrap();
        assert_eq!(found, calc);
    }

    #[test]
    fn uuid_lookup_rejects_truncated_uuids() {
        let tmp = tempdir().unwrap();
        let err = find_calculation_by_uuid(tmp.path(), "0e").unwrap_err();
        assert!(matches!(err, OrganizerError::UuidTooShort { .. }));
    }

    #[test]
    fn uuid_lookup_fails_cleanly_for_unknown_uuids() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("repo");
        std::fs::create_dir_all(root.join("0e").join("a8").join("other")).unwrap();

        let err = find_calculation_by_uuid(&root, "ffffnosuchcalc").unwrap_err();
        match err {
            OrganizerError::CalculationNotFound { uuid, .. } => {
                assert_eq!(uuid, "ffffnosuchcalc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn single_uuid_report_names_files_after_the_uuid() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("repo");
        let calc = root.join("0e").join("a8").join("restofuuid");
        std::fs::create_dir_all(&calc).unwrap();
        std::fs::write(calc.join("OUTPUT"), "result").unwrap();
        std::fs::write(calc.join("fort.87"), "DISK QUOTA EXCEEDED").unwrap();
        std::fs::write(calc.join("INPUT"), "NaCl slab\n").unwrap();

        let written = generate_report_for_uuid(&root, "0ea8restofuuid").unwrap();
        assert_eq!(written.len(), 2);
        for path in &written {
            assert!(path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .contains("uuid_0ea8restofuuid"));
            assert_eq!(path.parent().unwrap(), tmp.path());
        }

        let csv_path = written
            .iter()
            .find(|p| p.extension().map_or(false, |e| e == "csv"))
            .unwrap();
        let content = std::fs::read_to_string(csv_path).unwrap();
        assert!(content.contains("uuid"));
        assert!(content.contains("0ea8restofuuid"));
    }

    #[test]
    fn flush_writes_timestamped_siblings_of_root() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("repo");
        let calc = root.join("calc1");
        std::fs::create_dir_all(&calc).unwrap();
        std::fs::write(calc.join("OUTPUT"), "result").unwrap();
        std::fs::write(calc.join("fort.87"), "DISK QUOTA EXCEEDED").unwrap();
        std::fs::write(calc.join("INPUT"), "NaCl slab\n").unwrap();

        let registry = ReporterRegistry::default();
        let acc = registry.scan_tree(&root, false).unwrap();
        let written = registry.flush(&root, &acc).unwrap();
        assert_eq!(written.len(), 2);
        for path in &written {
            assert!(path.exists());
            assert_eq!(path.parent().unwrap(), tmp.path());
        }

        let csv_path = written
            .iter()
            .find(|p| p.extension().map_or(false, |e| e == "csv"))
            .unwrap();
        let content = std::fs::read_to_string(csv_path).unwrap();
        assert!(content.contains("engine"));
        assert!(content.contains("crystal"));

        let txt_path = written
            .iter()
            .find(|p| p.extension().map_or(false, |e| e == "txt"))
            .unwrap();
        let report = std::fs::read_to_string(txt_path).unwrap();
        assert!(report.contains("REPORT CRYSTAL ERROR"));
        assert!(report.contains("DISK QUOTA EXCEEDED"));
        assert!(report.contains("  - NaCl slab"));
    }
}
