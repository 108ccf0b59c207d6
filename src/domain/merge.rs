//! Positional alignment of two comment streams into one table
//!
//! Row `i` pairs the i-th comment of video A with the i-th comment of video B.
//! The two sides are never re-sorted or joined on time; each keeps its own
//! retrieval order. A side that runs out of comments contributes empty cells.

use serde::Serialize;

use crate::domain::comment::{Comment, VideoResult, split_datetime};

/// Number of columns each side contributes to a row
pub const SIDE_WIDTH: usize = 7;

/// Total columns per row
pub const ROW_WIDTH: usize = SIDE_WIDTH * 2;

/// Fixed export header: side A's seven fields, then side B's
pub const HEADER: [&str; ROW_WIDTH] = [
    "Video_Title_A",
    "Video_Upload_DateTime_A",
    "Video_Comment_A",
    "Comment_Date_A",
    "Comment_Time_A",
    "Comment_Author_A",
    "Comment_Likes_A",
    "Video_Title_B",
    "Video_Upload_DateTime_B",
    "Video_Comment_B",
    "Comment_Date_B",
    "Comment_Time_B",
    "Comment_Author_B",
    "Comment_Likes_B",
];

/// Merged export for one pair row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignedTable {
    pub rows: Vec<Vec<String>>,
}

impl AlignedTable {
    pub fn header(&self) -> &'static [&'static str; ROW_WIDTH] {
        &HEADER
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Merge two fetched videos into `max(n_a, n_b)` rows
pub fn merge_results(a: &VideoResult, b: &VideoResult) -> AlignedTable {
    let row_count = a.comments.len().max(b.comments.len());
    let upload_a = a.upload_datetime();
    let upload_b = b.upload_datetime();

    let rows = (0..row_count)
        .map(|i| {
            let mut row = Vec::with_capacity(ROW_WIDTH);
            push_side(&mut row, a, &upload_a, a.comments.get(i));
            push_side(&mut row, b, &upload_b, b.comments.get(i));
            row
        })
        .collect();

    AlignedTable { rows }
}

fn push_side(row: &mut Vec<String>, video: &VideoResult, upload: &str, comment: Option<&Comment>) {
    match comment {
        Some(comment) => {
            let (date, time) = split_datetime(&comment.published_at);
            row.extend([
                video.title.clone(),
                upload.to_string(),
                comment.text.clone(),
                date,
                time,
                comment.author_name.clone(),
                comment.like_count.to_string(),
            ]);
        }
        None => row.extend(std::iter::repeat_n(String::new(), SIDE_WIDTH)),
    }
}
