use crate::batch::{BatchSummary, CapacityBatch, CapacityTable, ProgressInfo, ResultRow};
use crate::config::PackingConfig;
use crate::error::{Error, Result};
use crate::structs::{BoxSpec, ItemSpec};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Row limit per collection.
pub const MAX_ROWS: usize = 1000;

const FORMULA_PREFIXES: &[char] = &['=', '@', '+', '-'];

/// One raw spreadsheet cell: a number, some text, or nothing.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

/// Strips a leading formula character (marking the value with `'`), drops
/// CR/LF/TAB and trims.
pub fn sanitize_text(value: &str) -> String {
    let formula = value.starts_with(FORMULA_PREFIXES);
    let body = if formula { &value[1..] } else { value };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .collect();
    let cleaned = cleaned.trim();
    if formula {
        format!("'{cleaned}")
    } else {
        cleaned.to_string()
    }
}

/// Reads the longest decimal literal at the start of `text`, so `"12in"`
/// gives 12 and `"7.5 kg"` gives 7.5. NaN when nothing numeric leads.
fn leading_number(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let digits = |from: usize| {
        bytes
            .get(from..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].parse().unwrap_or(f64::NAN);
    }

    let whole = digits(end);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits(end + 1);
        if whole + fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole + fraction == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let count = digits(exponent);
        if count > 0 {
            end = exponent + count;
        }
    }
    s[..end].parse().unwrap_or(f64::NAN)
}

impl Cell {
    fn text(&self, field: &str, row: usize) -> Result<String> {
        let text = match self {
            Cell::Text(s) => sanitize_text(s),
            Cell::Empty => String::new(),
            Cell::Number(_) => {
                return Err(Error::Validation(format!(
                    "{field} (row {row}) must be text, got: number"
                )))
            }
        };
        if text.is_empty() {
            return Err(Error::Validation(format!("{field} is required (row {row})")));
        }
        Ok(text)
    }

    fn number(&self, field: &str, row: usize, min: f64, max: f64) -> Result<f64> {
        let (value, shown) = match self {
            Cell::Number(n) => (*n, n.to_string()),
            Cell::Text(s) => {
                let s = sanitize_text(s);
                (leading_number(&s), s)
            }
            Cell::Empty => (f64::NAN, String::new()),
        };
        if value.is_nan() || value < 0.0 {
            return Err(Error::Validation(format!(
                "{field} (row {row}) must be a positive number, got: {shown}"
            )));
        }
        if value < min {
            return Err(Error::Validation(format!(
                "{field} must be at least {min} (row {row})"
            )));
        }
        if value > max {
            return Err(Error::Validation(format!(
                "{field} must be at most {max} (row {row})"
            )));
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ItemRecord {
    #[serde(rename = "SKU", default)]
    pub sku: Cell,
    #[serde(rename = "Height", default)]
    pub height: Cell,
    #[serde(rename = "Width", default)]
    pub width: Cell,
    #[serde(rename = "Length", default)]
    pub length: Cell,
    #[serde(rename = "Weight", default)]
    pub weight: Cell,
}

impl ItemRecord {
    /// Validates the row (`row` is 1-based) and maps Length onto depth.
    pub fn to_spec(&self, row: usize) -> Result<ItemSpec> {
        Ok(ItemSpec {
            name: self.sku.text("SKU", row)?,
            height: self.height.number("Height", row, 0.1, 1000.0)?,
            width: self.width.number("Width", row, 0.1, 1000.0)?,
            depth: self.length.number("Length", row, 0.1, 1000.0)?,
            weight: self.weight.number("Weight", row, 0.01, 10000.0)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct BoxRecord {
    #[serde(rename = "BoxType", default)]
    pub box_type: Cell,
    #[serde(rename = "Height", default)]
    pub height: Cell,
    #[serde(rename = "Width", default)]
    pub width: Cell,
    #[serde(rename = "Length", default)]
    pub length: Cell,
    #[serde(rename = "MaxWeight", default)]
    pub max_weight: Cell,
}

impl BoxRecord {
    pub fn to_spec(&self, row: usize) -> Result<BoxSpec> {
        Ok(BoxSpec {
            label: self.box_type.text("BoxType", row)?,
            height: self.height.number("Height", row, 0.1, 1000.0)?,
            width: self.width.number("Width", row, 0.1, 1000.0)?,
            depth: self.length.number("Length", row, 0.1, 1000.0)?,
            max_weight: self.max_weight.number("MaxWeight", row, 0.1, 10000.0)?,
        })
    }
}

/// A capacity request as read from JSON: the two sheets plus tolerances.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProblemInput {
    #[serde(default, alias = "Items")]
    pub items: Option<Vec<ItemRecord>>,
    #[serde(default, alias = "Boxes")]
    pub boxes: Option<Vec<BoxRecord>>,
    #[serde(flatten)]
    pub config: PackingConfig,
}

impl ProblemInput {
    /// Parses a request and checks its settings. Sheet contents are checked
    /// later, by [`item_specs`](Self::item_specs) and
    /// [`box_specs`](Self::box_specs).
    pub fn from_json_str(data: &str) -> Result<Self> {
        let input: Self = serde_json::from_str(data)?;
        input.config.validate()?;
        Ok(input)
    }

    //data communication
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// The sample sheets handed out as a starting template.
    pub fn template() -> Self {
        let item = |sku: &str, h: f64, w: f64, l: f64, weight: f64| ItemRecord {
            sku: sku.into(),
            height: h.into(),
            width: w.into(),
            length: l.into(),
            weight: weight.into(),
        };
        let bx = |label: &str, h: f64, w: f64, l: f64, max_weight: f64| BoxRecord {
            box_type: label.into(),
            height: h.into(),
            width: w.into(),
            length: l.into(),
            max_weight: max_weight.into(),
        };
        Self {
            items: Some(vec![
                item("ITEM001", 10.0, 8.0, 12.0, 2.5),
                item("ITEM002", 5.0, 5.0, 5.0, 0.5),
            ]),
            boxes: Some(vec![
                bx("Small", 9.0, 12.0, 9.0, 50.0),
                bx("Medium", 12.0, 18.0, 12.0, 50.0),
                bx("Large", 18.0, 24.0, 18.0, 50.0),
            ]),
            config: PackingConfig::default(),
        }
    }

    /// Validated item specs; `None` when the sheet is absent.
    pub fn item_specs(&self) -> Result<Option<Vec<ItemSpec>>> {
        let Some(records) = &self.items else {
            return Ok(None);
        };
        check_row_limit("items", records.len())?;
        let specs = records
            .iter()
            .enumerate()
            .map(|(i, r)| r.to_spec(i + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(specs))
    }

    /// Validated box specs; `None` when the sheet is absent. Box labels
    /// become column names, so duplicates are rejected.
    pub fn box_specs(&self) -> Result<Option<Vec<BoxSpec>>> {
        let Some(records) = &self.boxes else {
            return Ok(None);
        };
        check_row_limit("boxes", records.len())?;
        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let spec = record.to_spec(i + 1)?;
            if !seen.insert(spec.label.clone()) {
                return Err(Error::Validation(format!(
                    "BoxType {} is duplicated (row {})",
                    spec.label,
                    i + 1
                )));
            }
            specs.push(spec);
        }
        Ok(Some(specs))
    }

    /// Validates the sheets and runs the capacity batch over them.
    pub fn solve(
        &self,
        progress: Option<&mut dyn FnMut(ProgressInfo)>,
    ) -> Result<CapacityTable> {
        let items = self.item_specs()?;
        let boxes = self.box_specs()?;
        CapacityBatch::new(self.config.clone()).run(items.as_deref(), boxes.as_deref(), progress)
    }
}

fn check_row_limit(what: &str, rows: usize) -> Result<()> {
    if rows > MAX_ROWS {
        return Err(Error::Validation(format!(
            "Too many {what}: {rows} rows. Maximum allowed is {MAX_ROWS} rows."
        )));
    }
    Ok(())
}

/// Exported result table with the settings it was computed under.
#[derive(Serialize)]
pub struct CapacityReport<'a> {
    pub generated_at: String,
    pub dimension_tolerance: f64,
    pub weight_tolerance: f64,
    pub summary: &'a BatchSummary,
    pub rows: &'a [ResultRow],
}

impl<'a> CapacityReport<'a> {
    pub fn new(table: &'a CapacityTable, config: &PackingConfig) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            dimension_tolerance: config.dimension_tolerance,
            weight_tolerance: config.weight_tolerance,
            summary: &table.summary,
            rows: &table.rows,
        }
    }
}

pub fn write_report(
    path: impl AsRef<Path>,
    table: &CapacityTable,
    config: &PackingConfig,
) -> Result<()> {
    let json = serde_json::to_string_pretty(&CapacityReport::new(table, config))?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a request file and return the result rows as pretty JSON.
pub fn solve_from_json(input_path: impl AsRef<Path>) -> Result<String> {
    let input = ProblemInput::from_json_file(input_path)?;
    let table = input.solve(None)?;
    Ok(serde_json::to_string_pretty(&table.rows)?)
}

/// Read a request file and write the full report next to a CSV run log.
pub fn solve_and_write(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    run_log: Option<&Path>,
) -> Result<()> {
    let input = ProblemInput::from_json_file(input_path)?;
    let table = input.solve(None)?;
    write_report(output_path, &table, &input.config)?;
    if let Some(path) = run_log {
        log_run_to_csv(path, &table.summary)?;
    }
    Ok(())
}

/// Appends one line per batch; the header goes in when the file is new.
pub fn log_run_to_csv(path: impl AsRef<Path>, summary: &BatchSummary) -> Result<()> {
    let timestamp = Utc::now().to_rfc3339();

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let header = "timestamp,items,boxes,pairs,substituted_pairs,total_units,elapsed_ms\n";
    if file.metadata()?.len() == 0 {
        file.write_all(header.as_bytes())?;
    }

    let record = format!(
        "{},{},{},{},{},{},{}\n",
        timestamp,
        summary.items,
        summary.boxes,
        summary.pairs,
        summary.substituted_pairs,
        summary.total_units,
        summary.elapsed_ms
    );
    file.write_all(record.as_bytes())?;
    Ok(())
}
