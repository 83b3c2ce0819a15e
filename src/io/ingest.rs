//! CSV ingest for experimental trials and fixations.
//!
//! Two tabular inputs describe one experiment: a trial table (one row per
//! trial with subject, reaction time, choice, and the two item values) and a
//! fixation table (one row per gaze segment, in presentation order). The two
//! are joined by (subject, trial number).
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no profile estimation here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Choice, ExperimentTrial, FixItem, Fixation};
use crate::error::AppError;

const TRIAL_COLUMNS: [&str; 6] = ["parcode", "trial", "rt", "choice", "item_left", "item_right"];
const FIXATION_COLUMNS: [&str; 4] = ["parcode", "trial", "fix_item", "fix_time"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub subject: Option<String>,
    pub message: String,
}

/// Summary stats about the trials actually loaded.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_trials: usize,
    pub n_subjects: usize,
    pub n_fixation_rows: usize,
    pub rt_min: f64,
    pub rt_max: f64,
}

/// Ingest output: joined trials + stats + row errors.
#[derive(Debug, Clone)]
pub struct ExperimentData {
    pub trials: Vec<ExperimentTrial>,
    /// Unique subject ids in first-appearance order.
    pub subjects: Vec<String>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load both CSVs and join fixations onto their trials.
pub fn load_experiment_csv(
    expdata_path: &Path,
    fixations_path: &Path,
) -> Result<ExperimentData, AppError> {
    let expdata = File::open(expdata_path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open trial CSV '{}': {e}", expdata_path.display()),
        )
    })?;
    let fixations = File::open(fixations_path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open fixation CSV '{}': {e}", fixations_path.display()),
        )
    })?;
    load_experiment_readers(expdata, fixations)
}

/// Reader-based entry point; `load_experiment_csv` is a thin file wrapper.
pub fn load_experiment_readers<R1: Read, R2: Read>(
    expdata: R1,
    fixations: R2,
) -> Result<ExperimentData, AppError> {
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    let mut trials = read_trials(expdata, &mut row_errors, &mut rows_read)?;

    // Index trials by (subject, trial number) so fixation rows can be
    // attached in file order.
    let mut index: HashMap<(String, u64), usize> = HashMap::new();
    for (i, trial) in trials.iter().enumerate() {
        index.insert((trial.subject.clone(), trial.trial), i);
    }

    let mut n_fixation_rows = 0usize;
    for (line, subject, trial_number, fixation) in
        read_fixations(fixations, &mut row_errors, &mut rows_read)?
    {
        match index.get(&(subject.clone(), trial_number)) {
            Some(&i) => {
                trials[i].fixations.push(fixation);
                n_fixation_rows += 1;
            }
            None => row_errors.push(RowError {
                line,
                subject: Some(subject),
                message: format!("Fixation row references unknown trial {trial_number}."),
            }),
        }
    }

    if trials.is_empty() {
        return Err(AppError::new(3, "No usable trials after ingest."));
    }

    let mut subjects: Vec<String> = Vec::new();
    let mut rt_min = f64::INFINITY;
    let mut rt_max = f64::NEG_INFINITY;
    for trial in &trials {
        if !subjects.contains(&trial.subject) {
            subjects.push(trial.subject.clone());
        }
        rt_min = rt_min.min(trial.rt);
        rt_max = rt_max.max(trial.rt);
    }

    let stats = DatasetStats {
        n_trials: trials.len(),
        n_subjects: subjects.len(),
        n_fixation_rows,
        rt_min,
        rt_max,
    };

    Ok(ExperimentData {
        trials,
        subjects,
        stats,
        row_errors,
        rows_read,
    })
}

fn read_trials<R: Read>(
    reader: R,
    row_errors: &mut Vec<RowError>,
    rows_read: &mut usize,
) -> Result<Vec<ExperimentTrial>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read trial CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    ensure_columns_exist(&header_map, &TRIAL_COLUMNS, "trial")?;

    let mut trials = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        *rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    subject: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_trial_row(&record, &header_map) {
            Ok(trial) => trials.push(trial),
            Err((subject, message)) => row_errors.push(RowError {
                line,
                subject,
                message,
            }),
        }
    }

    Ok(trials)
}

type FixationRow = (usize, String, u64, Fixation);

fn read_fixations<R: Read>(
    reader: R,
    row_errors: &mut Vec<RowError>,
    rows_read: &mut usize,
) -> Result<Vec<FixationRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read fixation CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    ensure_columns_exist(&header_map, &FIXATION_COLUMNS, "fixation")?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        *rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    subject: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_fixation_row(&record, &header_map) {
            Ok((subject, trial_number, fixation)) => {
                rows.push((line, subject, trial_number, fixation));
            }
            Err((subject, message)) => row_errors.push(RowError {
                line,
                subject,
                message,
            }),
        }
    }

    Ok(rows)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM;
    // without stripping it the schema check would report `parcode` missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_columns_exist(
    header_map: &HashMap<String, usize>,
    required: &[&str],
    which: &str,
) -> Result<(), AppError> {
    for name in required {
        if !header_map.contains_key(*name) {
            return Err(AppError::new(
                2,
                format!("Missing required column in {which} CSV: `{name}`"),
            ));
        }
    }
    Ok(())
}

type RowResult<T> = Result<T, (Option<String>, String)>;

fn parse_trial_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> RowResult<ExperimentTrial> {
    let subject = get_required(record, header_map, "parcode")
        .map_err(|m| (None, m))?
        .to_string();
    let tag = Some(subject.clone());

    let trial = parse_u64(get_required(record, header_map, "trial").map_err(|m| (tag.clone(), m))?)
        .map_err(|m| (tag.clone(), m))?;
    let rt = parse_f64(get_required(record, header_map, "rt").map_err(|m| (tag.clone(), m))?)
        .map_err(|m| (tag.clone(), m))?;
    if rt < 0.0 {
        return Err((tag, "Invalid `rt` (must be >= 0).".to_string()));
    }

    let choice_code =
        parse_i64(get_required(record, header_map, "choice").map_err(|m| (tag.clone(), m))?)
            .map_err(|m| (tag.clone(), m))?;
    let choice = Choice::from_code(choice_code)
        .ok_or_else(|| (tag.clone(), format!("Invalid `choice` code: {choice_code}.")))?;

    let value_left =
        parse_f64(get_required(record, header_map, "item_left").map_err(|m| (tag.clone(), m))?)
            .map_err(|m| (tag.clone(), m))?;
    let value_right =
        parse_f64(get_required(record, header_map, "item_right").map_err(|m| (tag.clone(), m))?)
            .map_err(|m| (tag.clone(), m))?;

    Ok(ExperimentTrial {
        subject,
        trial,
        rt,
        choice,
        value_left,
        value_right,
        fixations: Vec::new(),
    })
}

fn parse_fixation_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> RowResult<(String, u64, Fixation)> {
    let subject = get_required(record, header_map, "parcode")
        .map_err(|m| (None, m))?
        .to_string();
    let tag = Some(subject.clone());

    let trial = parse_u64(get_required(record, header_map, "trial").map_err(|m| (tag.clone(), m))?)
        .map_err(|m| (tag.clone(), m))?;

    let item_code =
        parse_i64(get_required(record, header_map, "fix_item").map_err(|m| (tag.clone(), m))?)
            .map_err(|m| (tag.clone(), m))?;
    let item = FixItem::from_code(item_code)
        .ok_or_else(|| (tag.clone(), format!("Invalid `fix_item` code: {item_code}.")))?;

    let duration =
        parse_f64(get_required(record, header_map, "fix_time").map_err(|m| (tag.clone(), m))?)
            .map_err(|m| (tag.clone(), m))?;
    if duration < 0.0 {
        return Err((tag, "Invalid `fix_time` (must be >= 0).".to_string()));
    }

    Ok((subject, trial, Fixation { item, duration }))
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_f64(s: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{s}'."))?;
    if !v.is_finite() {
        return Err(format!("Non-finite number '{s}'."));
    }
    Ok(v)
}

fn parse_i64(s: &str) -> Result<i64, String> {
    s.parse::<i64>()
        .map_err(|_| format!("Invalid integer '{s}'."))
}

fn parse_u64(s: &str) -> Result<u64, String> {
    s.parse::<u64>()
        .map_err(|_| format!("Invalid trial number '{s}'."))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPDATA: &str = "parcode,trial,rt,choice,item_left,item_right\n\
                           s1,1,1520,-1,3,0\n\
                           s2,1,880,1,1,2\n";
    const FIXATIONS: &str = "parcode,trial,fix_item,fix_time\n\
                             s1,1,0,200\n\
                             s1,1,1,300\n\
                             s1,1,2,400\n\
                             s2,1,2,600\n";

    #[test]
    fn loads_and_joins_a_small_dataset() {
        let data = load_experiment_readers(EXPDATA.as_bytes(), FIXATIONS.as_bytes()).unwrap();

        assert_eq!(data.trials.len(), 2);
        assert_eq!(data.subjects, vec!["s1".to_string(), "s2".to_string()]);
        assert_eq!(data.stats.n_fixation_rows, 4);
        assert!(data.row_errors.is_empty());

        let t1 = &data.trials[0];
        assert_eq!(t1.choice, Choice::Left);
        assert_eq!(t1.fixations.len(), 3);
        assert_eq!(t1.fixations[0].item, FixItem::None);
        assert_eq!(t1.fixations[1].item, FixItem::Left);
        assert!((t1.fixations[1].duration - 300.0).abs() < 1e-12);

        assert!((data.stats.rt_min - 880.0).abs() < 1e-12);
        assert!((data.stats.rt_max - 1520.0).abs() < 1e-12);
    }

    #[test]
    fn headers_tolerate_bom_and_case() {
        let expdata = "\u{feff}Parcode,Trial,RT,Choice,Item_Left,Item_Right\ns1,1,1520,-1,3,0\n";
        let fixations = "\u{feff}Parcode,Trial,Fix_Item,Fix_Time\ns1,1,1,300\n";
        let data = load_experiment_readers(expdata.as_bytes(), fixations.as_bytes()).unwrap();
        assert_eq!(data.trials.len(), 1);
        assert_eq!(data.trials[0].fixations.len(), 1);
    }

    #[test]
    fn missing_column_is_a_config_error() {
        let expdata = "parcode,trial,rt,item_left,item_right\ns1,1,1520,3,0\n";
        let err = load_experiment_readers(expdata.as_bytes(), FIXATIONS.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("choice"));
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let expdata = "parcode,trial,rt,choice,item_left,item_right\n\
                       s1,1,1520,-1,3,0\n\
                       s1,2,900,7,3,0\n";
        let fixations = "parcode,trial,fix_item,fix_time\n\
                         s1,1,1,300\n\
                         s9,5,1,300\n";
        let data = load_experiment_readers(expdata.as_bytes(), fixations.as_bytes()).unwrap();

        assert_eq!(data.trials.len(), 1);
        assert_eq!(data.row_errors.len(), 2);
        assert!(data.row_errors[0].message.contains("choice"));
        assert!(data.row_errors[1].message.contains("unknown trial"));
    }

    #[test]
    fn zero_usable_trials_is_insufficient_data() {
        let expdata = "parcode,trial,rt,choice,item_left,item_right\n";
        let fixations = "parcode,trial,fix_item,fix_time\n";
        let err = load_experiment_readers(expdata.as_bytes(), fixations.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn trial_without_fixation_rows_is_kept() {
        let fixations = "parcode,trial,fix_item,fix_time\ns1,1,1,300\n";
        let data = load_experiment_readers(EXPDATA.as_bytes(), fixations.as_bytes()).unwrap();
        assert_eq!(data.trials.len(), 2);
        assert!(data.trials[1].fixations.is_empty());
    }
}
