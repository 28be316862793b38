//! Bulk download of MCD19A2 granules from the LAADS DAAC archive.
//!
//! The query is handed to `wget` in mirror mode; the pipeline only looks at
//! whatever files end up in the granule directory.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use futures::stream::{self, StreamExt};
use reqwest::Url;
use tokio::process::Command;
use tracing::{info, instrument, warn};

const LAADS_ARCHIVE_URL: &str = "https://ladsweb.modaps.eosdis.nasa.gov/api/v2/content/archives";
const DEFAULT_PRODUCT: &str = "MCD19A2";

/// Search box in degrees, given as north, east, south, west.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub west: f64,
}

impl Default for BBox {
    /// California.
    fn default() -> Self {
        Self {
            north: 32.0,
            east: -114.0,
            south: 42.0,
            west: -125.0,
        }
    }
}

impl FromStr for BBox {
    type Err = anyhow::Error;

    /// Parse `"N,E,S,W"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid bbox '{}', expected N,E,S,W", s))?;
        match parts.as_slice() {
            &[north, east, south, west] => Ok(Self {
                north,
                east,
                south,
                west,
            }),
            _ => bail!("Invalid bbox '{}', expected 4 values N,E,S,W", s),
        }
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[BBOX]W{} N{} E{} S{}",
            self.west, self.north, self.east, self.south
        )
    }
}

/// A single day or a `start..end` span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}..{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

/// From the first of `month` to the first of the following month.
pub fn month_range(year: i32, month: u32) -> Result<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow!("Invalid month {}-{}", year, month))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| anyhow!("Invalid month {}-{}", next_year, next_month))?;
    Ok(DateRange {
        start,
        end: Some(end),
    })
}

/// One range per month of `year`.
pub fn year_ranges(year: i32) -> Result<Vec<DateRange>> {
    (1..=12).map(|m| month_range(year, m)).collect()
}

/// An archive search for one product, box and date range.
#[derive(Debug, Clone, PartialEq)]
pub struct LaadsQuery {
    pub product: String,
    pub bbox: BBox,
    pub range: DateRange,
}

impl LaadsQuery {
    pub fn new(bbox: BBox, range: DateRange) -> Self {
        Self {
            product: DEFAULT_PRODUCT.to_string(),
            bbox,
            range,
        }
    }

    pub fn url(&self) -> Result<Url> {
        Url::parse_with_params(
            LAADS_ARCHIVE_URL,
            &[
                ("products", self.product.clone()),
                ("temporalRanges", self.range.to_string()),
                ("regions", self.bbox.to_string()),
            ],
        )
        .context("Failed to build LAADS query URL")
    }
}

/// Runs `wget` mirror downloads into the granule directory.
#[derive(Clone)]
pub struct Downloader {
    output_dir: PathBuf,
    token: String,
    parallel: usize,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("output_dir", &self.output_dir)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    pub fn new(output_dir: impl Into<PathBuf>, token: impl Into<String>, parallel: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            token: token.into(),
            parallel: parallel.max(1),
        }
    }

    /// Arguments passed to `wget` for `url`.
    pub fn wget_args(&self, url: &Url) -> Vec<String> {
        vec![
            "-e".to_string(),
            "robots=off".to_string(),
            "-m".to_string(),
            "-np".to_string(),
            "-R".to_string(),
            ".html,.tmp".to_string(),
            "-nH".to_string(),
            "--header".to_string(),
            "X-Requested-With: XMLHttpRequest".to_string(),
            "--header".to_string(),
            format!("Authorization: Bearer {}", self.token),
            "--cut-dirs=3".to_string(),
            url.to_string(),
            "-P".to_string(),
            self.output_dir.display().to_string(),
        ]
    }

    /// Mirror the files matching `query`.
    #[instrument(skip(self), fields(range = %query.range))]
    pub async fn run_bulk_download(&self, query: &LaadsQuery) -> Result<()> {
        let url = query.url()?;
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        info!(url = %url, dir = %self.output_dir.display(), "Starting bulk download");
        let status = Command::new("wget")
            .args(self.wget_args(&url))
            .status()
            .await
            .context("Failed to spawn wget")?;

        if !status.success() {
            bail!("wget exited with {}", status);
        }
        Ok(())
    }

    /// Download every range, a few at a time. Failed ranges are logged and
    /// counted; the rest still run.
    pub async fn download_all(&self, bbox: BBox, ranges: Vec<DateRange>) -> Result<()> {
        let total = ranges.len();
        let failures: Vec<_> = stream::iter(ranges)
            .map(|range| async move {
                let query = LaadsQuery::new(bbox, range);
                self.run_bulk_download(&query).await.err().map(|e| (range, e))
            })
            .buffer_unordered(self.parallel)
            .filter_map(|r| async move { r })
            .collect()
            .await;

        for (range, e) in &failures {
            warn!(range = %range, error = %e, "Download failed");
        }
        if !failures.is_empty() {
            bail!("{} of {} downloads failed", failures.len(), total);
        }
        Ok(())
    }

    /// Ranges for a whole year, or a single month.
    pub fn ranges_for(year: i32, month: Option<u32>) -> Result<Vec<DateRange>> {
        match month {
            Some(m) => Ok(vec![month_range(year, m)?]),
            None => year_ranges(year),
        }
    }
}

/// Check that a requested year is plausible for the MODIS record.
pub fn check_year(year: i32) -> Result<()> {
    let this_year = chrono::Utc::now().year();
    if !(2000..=this_year).contains(&year) {
        bail!("Year {} outside the MODIS record (2000..={})", year, this_year);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_parse_and_display() {
        let bbox: BBox = "32,-114,42,-125".parse().unwrap();
        assert_eq!(bbox, BBox::default());
        assert_eq!(bbox.to_string(), "[BBOX]W-125 N32 E-114 S42");
        assert!("1,2,3".parse::<BBox>().is_err());
        assert!("a,b,c,d".parse::<BBox>().is_err());
    }

    #[test]
    fn test_month_range_wraps_year() {
        let range = month_range(2019, 12).unwrap();
        assert_eq!(range.to_string(), "2019-12-01..2020-01-01");
        assert!(month_range(2019, 13).is_err());
        assert_eq!(year_ranges(2019).unwrap().len(), 12);
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2019, 10, 23).unwrap(),
            end: None,
        };
        assert_eq!(range.to_string(), "2019-10-23");
    }

    #[test]
    fn test_query_url() {
        let query = LaadsQuery::new(BBox::default(), month_range(2019, 1).unwrap());
        let url = query.url().unwrap();
        assert_eq!(url.host_str(), Some("ladsweb.modaps.eosdis.nasa.gov"));
        assert_eq!(url.path(), "/api/v2/content/archives");
        let params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("products".to_string(), "MCD19A2".to_string()),
                ("temporalRanges".to_string(), "2019-01-01..2019-02-01".to_string()),
                ("regions".to_string(), "[BBOX]W-125 N32 E-114 S42".to_string()),
            ]
        );
    }

    #[test]
    fn test_wget_args_carry_token_header() {
        let downloader = Downloader::new("/data/raw/archives", "tok", 2);
        let url = LaadsQuery::new(BBox::default(), month_range(2019, 1).unwrap())
            .url()
            .unwrap();
        let args = downloader.wget_args(&url);
        assert!(args.contains(&"Authorization: Bearer tok".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/data/raw/archives"));
        assert!(!format!("{:?}", downloader).contains("tok"));
    }

    #[test]
    fn test_ranges_for() {
        assert_eq!(Downloader::ranges_for(2020, Some(2)).unwrap().len(), 1);
        assert_eq!(Downloader::ranges_for(2020, None).unwrap().len(), 12);
        assert!(check_year(1999).is_err());
        assert!(check_year(2019).is_ok());
    }
}
