use crate::core::{Month, SalesReport};
use crate::utils::error::{EtlError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// One file of the rendered report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl ReportFile {
    fn new(name: &str, contents: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            contents,
        }
    }
}

/// Renders `report` into files for each requested format ("json", "csv").
pub fn render_files(report: &SalesReport, formats: &[String]) -> Result<Vec<ReportFile>> {
    let mut files = Vec::new();

    for format in formats {
        match format.as_str() {
            "json" => files.push(ReportFile::new(
                "summary.json",
                serde_json::to_vec_pretty(report)?,
            )),
            "csv" => {
                files.push(ReportFile::new("sales_team.csv", sales_team_csv(report)?));
                files.push(ReportFile::new("monthly_target.csv", monthly_target_csv(report)?));
                files.push(ReportFile::new("top_performers.csv", top_performers_csv(report)?));
                files.push(ReportFile::new(
                    "monthly_sales_by_salesperson.csv",
                    person_monthly_csv(report)?,
                ));
                files.push(ReportFile::new(
                    "yearly_sales_by_salesperson.csv",
                    yearly_csv(report)?,
                ));
            }
            other => {
                return Err(EtlError::ProcessingError {
                    message: format!("Unsupported report format: {}", other),
                })
            }
        }
    }

    tracing::debug!("Rendered {} report files", files.len());
    Ok(files)
}

/// Packs the files into a single ZIP archive held in memory.
pub fn bundle_zip(files: &[ReportFile]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for file in files {
        zip.start_file::<_, ()>(file.name.as_str(), FileOptions::default())?;
        zip.write_all(&file.contents)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("Failed to flush CSV table: {}", e),
        })
}

fn sales_team_csv(report: &SalesReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["salesperson", "total", "average", "transactions"])?;
    for person in &report.aggregates.person_stats {
        writer.write_record([
            person.name.clone(),
            person.total.to_string(),
            person.average.to_string(),
            person.count.to_string(),
        ])?;
    }
    finish(writer)
}

fn monthly_target_csv(report: &SalesReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["month", "sales", "target", "percent_achieved"])?;
    for row in &report.aggregates.target_attainment {
        writer.write_record([
            row.month.name().to_string(),
            row.total.to_string(),
            row.target.to_string(),
            row.percent.to_string(),
        ])?;
    }
    finish(writer)
}

fn top_performers_csv(report: &SalesReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["month", "salesperson", "amount", "share_percent"])?;
    for row in &report.aggregates.monthly_top_performers {
        writer.write_record([
            row.month.name().to_string(),
            row.name.clone(),
            row.amount.to_string(),
            format!("{:.1}", row.share_percent),
        ])?;
    }
    finish(writer)
}

fn person_monthly_csv(report: &SalesReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let header: Vec<&str> = std::iter::once("salesperson")
        .chain(Month::all().map(|m| &m.name()[..3]))
        .collect();
    writer.write_record(&header)?;

    for row in &report.aggregates.person_monthly {
        let mut record = vec![row.name.clone()];
        record.extend(row.monthly.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    finish(writer)
}

fn yearly_csv(report: &SalesReport) -> Result<Vec<u8>> {
    let yearly = &report.aggregates.yearly_by_person;
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["salesperson".to_string()];
    header.extend(yearly.years.iter().cloned());
    writer.write_record(&header)?;

    for row in &yearly.rows {
        let mut record = vec![row.name.clone()];
        record.extend(row.totals.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    finish(writer)
}
