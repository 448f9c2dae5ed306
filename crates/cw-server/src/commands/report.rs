//! Report command for today's usage totals.

use std::io::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use cw_core::{DayWindow, TEMPERATURE_THRESHOLD};
use serde::Serialize;

use crate::query::{QueryService, TotalResponse};

/// Usage totals for one classroom filter on one local day.
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub classroom: String,
    pub date: NaiveDate,
    pub timezone: String,
    pub light: TotalResponse,
    pub temperature: TotalResponse,
}

/// Gathers both metrics' totals for `date` in the local time zone.
pub async fn generate_report_data(
    queries: &QueryService,
    classroom: &str,
    date: NaiveDate,
) -> Result<ReportData> {
    let summary = queries
        .summary(classroom, DayWindow::for_date(date, &Local))
        .await?;
    let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());

    Ok(ReportData {
        classroom: classroom.to_string(),
        date,
        timezone,
        light: summary.light,
        temperature: summary.temperature,
    })
}

/// Formats seconds as "Xh Ym" from one hour up, "Xm" below.
/// Negative durations are shown as 0m.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return "0m".to_string();
    }
    let total_minutes = seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats report data as human-readable text.
pub fn format_report(data: &ReportData) -> String {
    let temperature_label = format!("At or below {TEMPERATURE_THRESHOLD}C:");
    format!(
        "CLASSROOM USAGE: {classroom} ({date}, {timezone})\n\n\
         {light_label:<20}{light}\n\
         {temperature_label:<20}{temperature}\n",
        classroom = data.classroom,
        date = data.date.format("%Y-%m-%d"),
        timezone = data.timezone,
        light_label = "Lights on:",
        light = format_duration(data.light.total_seconds),
        temperature = format_duration(data.temperature.total_seconds),
    )
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Runs the report command for today.
pub async fn run<W: Write>(
    writer: &mut W,
    queries: &QueryService,
    classroom: &str,
    json: bool,
) -> Result<()> {
    let data = generate_report_data(queries, classroom, Local::now().date_naive()).await?;

    if json {
        writeln!(writer, "{}", format_report_json(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use cw_db::{PoolConfig, StorePool};
    use insta::assert_snapshot;

    use crate::ingest::Ingestor;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).expect("valid test date")
    }

    fn local(hour: u32, minute: u32) -> DateTime<Utc> {
        let naive = test_date()
            .and_hms_opt(hour, minute, 0)
            .expect("valid test time");
        Local
            .from_local_datetime(&naive)
            .earliest()
            .expect("local time exists")
            .with_timezone(&Utc)
    }

    fn sample_data() -> ReportData {
        ReportData {
            classroom: "101".to_string(),
            date: test_date(),
            timezone: "Asia/Seoul".to_string(),
            light: TotalResponse {
                total_seconds: 5_430,
                total_minutes: 90,
            },
            temperature: TotalResponse {
                total_seconds: 600,
                total_minutes: 10,
            },
        }
    }

    #[test]
    fn test_format_duration_hours_and_minutes() {
        assert_eq!(format_duration(5_430), "1h 30m");
    }

    #[test]
    fn test_format_duration_minutes_only() {
        assert_eq!(format_duration(600), "10m");
    }

    #[test]
    fn test_format_duration_floors_seconds() {
        assert_eq!(format_duration(59), "0m");
    }

    #[test]
    fn test_format_duration_negative_is_zero() {
        assert_eq!(format_duration(-5), "0m");
    }

    #[test]
    fn test_report_text() {
        assert_snapshot!(format_report(&sample_data()), @r"
        CLASSROOM USAGE: 101 (2025-03-04, Asia/Seoul)

        Lights on:          1h 30m
        At or below 25C:    10m
        ");
    }

    #[test]
    fn test_report_json() {
        assert_snapshot!(format_report_json(&sample_data()).unwrap(), @r#"
        {
          "classroom": "101",
          "date": "2025-03-04",
          "timezone": "Asia/Seoul",
          "light": {
            "total_seconds": 5430,
            "total_minutes": 90
          },
          "temperature": {
            "total_seconds": 600,
            "total_minutes": 10
          }
        }
        "#);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_generate_report_data_from_stored_readings() {
        let temp = tempfile::tempdir().unwrap();
        let pool = StorePool::open(&temp.path().join("cw.db"), &PoolConfig::default()).unwrap();
        let ingestor = Ingestor::new(pool.clone());

        ingestor
            .handle_payload(
                br#"{"isLightOn":"1","temperature":"24","classroom":"A101"}"#,
                local(12, 0),
            )
            .await
            .unwrap();
        ingestor
            .handle_payload(
                br#"{"isLightOn":"0","temperature":"30","classroom":"A101"}"#,
                local(12, 10),
            )
            .await
            .unwrap();

        let data = generate_report_data(&QueryService::new(pool), "101", test_date())
            .await
            .unwrap();
        assert_eq!(data.classroom, "101");
        assert_eq!(data.light.total_minutes, 10);
        assert_eq!(data.temperature.total_minutes, 10);
    }
}
