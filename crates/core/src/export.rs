//! Downloadable exports of generation output.
//!
//! JSON export is the stored output as-is. CSV is offered for the two ad
//! types that map onto one row per item; list fields are joined with
//! [`LIST_SEPARATOR`].

use crate::creative::{CreativeOutput, GoogleCampaign, MetaAd};

/// Joins multi-value fields (headlines, keywords) inside one CSV cell.
pub const LIST_SEPARATOR: &str = " | ";

const META_ADS_HEADER: [&str; 6] = [
    "angle",
    "audienceSegment",
    "primaryText",
    "headline",
    "description",
    "cta",
];

const GOOGLE_ADS_HEADER: [&str; 4] = ["angle", "headlines", "descriptions", "keywords"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    /// Lenient parse of a `format` query value: anything but `csv` is JSON.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json; charset=utf-8",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

/// `attachment` disposition naming the file after the generation run.
pub fn attachment_disposition(generation_run_id: i64, format: ExportFormat) -> String {
    format!(
        "attachment; filename=\"generation-{generation_run_id}.{}\"",
        format.extension()
    )
}

/// CSV for output types with a tabular shape, `None` for the rest.
pub fn creative_csv(output: &CreativeOutput) -> Option<String> {
    match output {
        CreativeOutput::MetaAds { ads } => Some(meta_ads_csv(ads)),
        CreativeOutput::GoogleAds { campaigns } => Some(google_ads_csv(campaigns)),
        _ => None,
    }
}

fn meta_ads_csv(ads: &[MetaAd]) -> String {
    let mut csv = header_line(&META_ADS_HEADER);
    for ad in ads {
        push_row(
            &mut csv,
            &[
                ad.angle.as_str(),
                ad.audience_segment.as_str(),
                ad.primary_text.as_str(),
                ad.headline.as_str(),
                ad.description.as_str(),
                ad.cta.as_str(),
            ],
        );
    }
    csv
}

fn google_ads_csv(campaigns: &[GoogleCampaign]) -> String {
    let mut csv = header_line(&GOOGLE_ADS_HEADER);
    for campaign in campaigns {
        push_row(
            &mut csv,
            &[
                campaign.angle.as_str(),
                campaign.headlines.join(LIST_SEPARATOR).as_str(),
                campaign.descriptions.join(LIST_SEPARATOR).as_str(),
                campaign.keywords.join(LIST_SEPARATOR).as_str(),
            ],
        );
    }
    csv
}

fn header_line(columns: &[&str]) -> String {
    let mut line = columns.join(",");
    line.push('\n');
    line
}

fn push_row(csv: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
    csv.push_str(&row.join(","));
    csv.push('\n');
}

/// Quote a cell unconditionally, doubling embedded quotes.
pub fn csv_escape(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
