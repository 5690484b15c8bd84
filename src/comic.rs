use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ComicId = u32;

/// One comic as stored in the dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: ComicId,
    /// Unix timestamp of noon, local time, on the publication day.
    pub date: i64,
    pub title: String,
    #[serde(rename = "image")]
    pub image_url: String,
    #[serde(rename = "alt")]
    pub alt_text: String,
    #[serde(default)]
    pub transcript: String,
}

impl Entry {
    pub fn display_date(&self) -> Option<String> {
        Local
            .timestamp_opt(self.date, 0)
            .single()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

/// The body of `info.0.json`.
#[derive(Deserialize, Debug)]
pub struct ComicInfo {
    pub num: ComicId,
    pub year: DatePart,
    pub month: DatePart,
    pub day: DatePart,
    pub safe_title: String,
    pub img: String,
    pub alt: String,
    #[serde(default)]
    pub transcript: String,
}

/// The API sends date fields as strings, but numbers are accepted too.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum DatePart {
    Number(u32),
    Text(String),
}

impl DatePart {
    fn value(&self, field: &'static str) -> Result<u32, DateError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s.trim().parse().map_err(|_| DateError::NotANumber {
                field,
                value: s.clone(),
            }),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("{field} {value:?} is not a number")]
    NotANumber { field: &'static str, value: String },
    #[error("{year:04}-{month:02}-{day:02} is not a valid local date")]
    Invalid { year: u32, month: u32, day: u32 },
}

/// Noon is used so the timestamp never lands on a neighbouring day after a
/// timezone shift.
pub fn noon_timestamp(year: u32, month: u32, day: u32) -> Result<i64, DateError> {
    let invalid = DateError::Invalid { year, month, day };
    let year = i32::try_from(year).map_err(|_| invalid.clone())?;
    Local
        .with_ymd_and_hms(year, month, day, 12, 0, 0)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or(invalid)
}

impl TryFrom<ComicInfo> for Entry {
    type Error = DateError;

    fn try_from(info: ComicInfo) -> Result<Self, Self::Error> {
        let date = noon_timestamp(
            info.year.value("year")?,
            info.month.value("month")?,
            info.day.value("day")?,
        )?;
        Ok(Self {
            id: info.num,
            date,
            title: info.safe_title,
            image_url: info.img,
            alt_text: info.alt,
            transcript: info.transcript,
        })
    }
}
