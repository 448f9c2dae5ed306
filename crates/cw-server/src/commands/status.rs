//! Status command for showing the latest reading per classroom.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use cw_core::Metric;
use cw_db::StorePool;

pub async fn run<W: Write>(writer: &mut W, pool: &StorePool, database_path: &Path) -> Result<()> {
    writeln!(writer, "Classroom monitor status")?;
    writeln!(writer, "Database: {}", database_path.display())?;

    for metric in Metric::ALL {
        let classrooms = pool.run(move |db| db.latest_by_classroom(metric)).await?;

        writeln!(writer, "{}:", capitalized(metric))?;
        if classrooms.is_empty() {
            writeln!(writer, "  No readings recorded.")?;
            continue;
        }
        for classroom in classrooms {
            writeln!(writer, "- {}: {}", classroom.classroom, classroom.last_reading)?;
        }
    }

    Ok(())
}

const fn capitalized(metric: Metric) -> &'static str {
    match metric {
        Metric::Light => "Light",
        Metric::Temperature => "Temperature",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use cw_core::{Classroom, LightReading};
    use cw_db::PoolConfig;
    use insta::assert_snapshot;

    #[tokio::test(flavor = "multi_thread")]
    async fn status_command_outputs_last_reading_per_classroom() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cw.db");
        let pool = StorePool::open(&db_path, &PoolConfig::default()).unwrap();

        let at = |minute| {
            Utc.with_ymd_and_hms(2025, 1, 1, 9, minute, 0)
                .single()
                .expect("valid test timestamp")
        };
        let readings = vec![
            LightReading {
                classroom: Classroom::new("A101").unwrap(),
                is_on: true,
                timestamp: at(0),
            },
            LightReading {
                classroom: Classroom::new("A101").unwrap(),
                is_on: false,
                timestamp: at(5),
            },
            LightReading {
                classroom: Classroom::new("B2").unwrap(),
                is_on: true,
                timestamp: at(2),
            },
        ];
        pool.run(move |db| {
            for reading in &readings {
                db.append_light(reading)?;
            }
            Ok(())
        })
        .await
        .unwrap();

        let mut output = Vec::new();
        run(&mut output, &pool, &db_path).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/cw.db");
        assert_snapshot!(output, @r"
        Classroom monitor status
        Database: [TEMP]/cw.db
        Light:
        - A101: 2025-01-01T09:05:00.000000000Z
        - B2: 2025-01-01T09:02:00.000000000Z
        Temperature:
          No readings recorded.
        ");
    }
}
