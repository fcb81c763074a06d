use crate::catalog::{Advice, MoodLabel};
use crate::journal::{HistoryEntry, SeriesPoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub mood: Option<usize>,
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogMoodForm {
    pub mood: String,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub mood: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MoodsResponse {
    pub moods: Vec<Advice>,
}

#[derive(Debug, Serialize)]
pub struct LoggedMoodResponse {
    pub date: String,
    pub mood: MoodLabel,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub labels: Vec<MoodLabel>,
    pub points: Vec<SeriesPoint>,
}
