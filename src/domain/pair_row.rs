//! Input rows: one pair of videos plus the original columns they came from

use serde::Serialize;

use crate::domain::video_ref::VideoRef;

/// Column names the input table is read by
pub mod columns {
    pub const CHANNEL_NAME_A: &str = "Channel_Name_A";
    pub const VIDEO_URL_A: &str = "Video_URL_A";
    pub const CHANNEL_NAME_B: &str = "Channel_Name_B";
    pub const VIDEO_URL_B: &str = "Video_URL_B";

    /// Leading column of the retry-queue store
    pub const ROW_INDEX: &str = "Row_Index";

    pub const REQUIRED: [&str; 3] = [CHANNEL_NAME_A, VIDEO_URL_A, VIDEO_URL_B];
}

/// Original columns of a row, in input order. Passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// One unit of work for the pair processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairRow {
    /// 0-based position in the input table
    pub index: usize,
    pub channel_name: String,
    pub video_a: VideoRef,
    pub video_b: VideoRef,
    pub raw_row: RawRow,
}

impl PairRow {
    /// Build a row from its original columns. Missing columns read as empty,
    /// which leaves the corresponding video without an id.
    pub fn from_raw(index: usize, raw_row: RawRow) -> Self {
        let channel_name = raw_row
            .get(columns::CHANNEL_NAME_A)
            .unwrap_or_default()
            .trim()
            .to_string();
        let video_a = VideoRef::from_url(raw_row.get(columns::VIDEO_URL_A).unwrap_or_default());
        let video_b = VideoRef::from_url(raw_row.get(columns::VIDEO_URL_B).unwrap_or_default());
        Self {
            index,
            channel_name,
            video_a,
            video_b,
            raw_row,
        }
    }

    /// Channel of video B, if the optional column was filled in
    pub fn channel_name_b(&self) -> Option<&str> {
        self.raw_row
            .get(columns::CHANNEL_NAME_B)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRow {
        RawRow::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_pair_row_from_raw() {
        let row = PairRow::from_raw(
            4,
            raw(&[
                ("Channel_Name_A", " News One "),
                ("Video_URL_A", "https://youtu.be/aaaaaaaaaaa"),
                ("Video_URL_B", "https://www.youtube.com/watch?v=bbbbbbbbbbb"),
                ("Notes", "keep me"),
            ]),
        );
        assert_eq!(row.index, 4);
        assert_eq!(row.channel_name, "News One");
        assert_eq!(row.video_a.id(), Some("aaaaaaaaaaa"));
        assert_eq!(row.video_b.id(), Some("bbbbbbbbbbb"));
        assert_eq!(row.channel_name_b(), None);
        assert_eq!(row.raw_row.get("Notes"), Some("keep me"));
    }

    #[test]
    fn test_missing_url_column_leaves_id_absent() {
        let row = PairRow::from_raw(0, raw(&[("Channel_Name_A", "x")]));
        assert!(row.video_a.id().is_none());
        assert!(row.video_b.id().is_none());
    }
}
