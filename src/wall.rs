use crate::catalog::MoodLabel;
use crate::errors::StorageError;
use crate::storage::JsonFile;
use chrono::{Local, NaiveDateTime, SubsecRound};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{ops::RangeInclusive, path::PathBuf};

pub const MAX_MESSAGE_CHARS: usize = 200;

/// Ids are drawn from this range with no collision check.
pub const POST_ID_RANGE: RangeInclusive<u32> = 100_000..=999_999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: u32,
    #[serde(with = "iso_micros")]
    pub timestamp: NaiveDateTime,
    pub mood: MoodLabel,
    pub message: String,
    pub support_count: u64,
}

impl CommunityPost {
    pub fn display_time(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Local ISO-8601 with microseconds (`2024-02-10T07:30:00.250000`); the
/// fraction is left out when it is zero.
mod iso_micros {
    use chrono::{NaiveDateTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let format = if value.nanosecond() == 0 {
            "%Y-%m-%dT%H:%M:%S"
        } else {
            "%Y-%m-%dT%H:%M:%S%.6f"
        };
        serializer.collect_str(&value.format(format))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("message is longer than 200 characters")]
pub struct MessageTooLong;

/// Trims `message` and enforces the length bound.
pub fn clean_message(message: &str) -> Result<String, MessageTooLong> {
    let trimmed = message.trim();
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(MessageTooLong);
    }
    Ok(trimmed.to_string())
}

/// Posts in insertion order, exactly as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wall {
    posts: Vec<CommunityPost>,
}

impl Wall {
    pub fn posts(&self) -> &[CommunityPost] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn find(&self, id: u32) -> Option<&CommunityPost> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn last(&self) -> Option<&CommunityPost> {
        self.posts.last()
    }

    pub fn submit(self, mood: MoodLabel, message: &str) -> Self {
        let id = rand::thread_rng().gen_range(POST_ID_RANGE);
        let now = Local::now().naive_local().trunc_subsecs(6);
        self.submit_with(id, now, mood, message)
    }

    pub fn submit_with(
        mut self,
        id: u32,
        timestamp: NaiveDateTime,
        mood: MoodLabel,
        message: &str,
    ) -> Self {
        self.posts.push(CommunityPost {
            id,
            timestamp,
            mood,
            message: message.trim().to_string(),
            support_count: 0,
        });
        self
    }

    /// Adds one to the first post with `id`; an unknown id leaves the wall untouched.
    pub fn support(mut self, id: u32) -> Self {
        if let Some(post) = self.posts.iter_mut().find(|post| post.id == id) {
            post.support_count = post.support_count.saturating_add(1);
        }
        self
    }

    /// Newest first. Equal timestamps keep insertion order.
    pub fn display_order(&self) -> Vec<&CommunityPost> {
        let mut ordered: Vec<&CommunityPost> = self.posts.iter().collect();
        ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        ordered
    }
}

#[derive(Debug, Clone)]
pub struct WallStore {
    file: JsonFile<Wall>,
}

impl WallStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub async fn load(&self) -> Result<Wall, StorageError> {
        self.file.load().await
    }

    pub async fn persist(&self, wall: &Wall) -> Result<(), StorageError> {
        self.file.persist(wall).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::unique_temp_path;
    use chrono::{NaiveDate, Timelike};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn submitted_post_starts_unsupported() {
        let wall = Wall::default().submit(MoodLabel::Sad, "  rough day ");
        assert_eq!(wall.len(), 1);
        let post = wall.last().unwrap();
        assert_eq!(post.message, "rough day");
        assert_eq!(post.mood, MoodLabel::Sad);
        assert_eq!(post.support_count, 0);
        assert!(POST_ID_RANGE.contains(&post.id));

        let id = post.id;
        let wall = wall.support(id);
        assert_eq!(wall.find(id).unwrap().support_count, 1);
    }

    #[test]
    fn support_for_unknown_id_is_a_no_op() {
        let wall = Wall::default()
            .submit_with(111_111, at(9, 0), MoodLabel::Happy, "hi")
            .submit_with(222_222, at(10, 0), MoodLabel::Okay, "");
        let before = wall.clone();
        assert_eq!(wall.support(333_333), before);
    }

    #[test]
    fn repeated_support_touches_only_the_target() {
        let mut wall = Wall::default()
            .submit_with(111_111, at(9, 0), MoodLabel::Happy, "a")
            .submit_with(222_222, at(10, 0), MoodLabel::Tired, "b");
        for _ in 0..5 {
            wall = wall.support(222_222);
        }
        assert_eq!(wall.find(222_222).unwrap().support_count, 5);
        assert_eq!(wall.find(111_111).unwrap().support_count, 0);
    }

    #[test]
    fn colliding_ids_support_the_first_post() {
        let wall = Wall::default()
            .submit_with(500_000, at(9, 0), MoodLabel::Happy, "first")
            .submit_with(500_000, at(10, 0), MoodLabel::Sad, "second")
            .support(500_000);
        assert_eq!(wall.posts()[0].support_count, 1);
        assert_eq!(wall.posts()[1].support_count, 0);
    }

    #[test]
    fn display_order_is_newest_first_with_stable_ties() {
        let wall = Wall::default()
            .submit_with(1, at(8, 0), MoodLabel::Happy, "old")
            .submit_with(2, at(12, 0), MoodLabel::Okay, "tie-a")
            .submit_with(3, at(12, 0), MoodLabel::Sad, "tie-b")
            .submit_with(4, at(10, 0), MoodLabel::Angry, "mid");
        let ids: Vec<u32> = wall.display_order().iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);
    }

    #[test]
    fn message_bound_counts_characters() {
        let exact = "😊".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(clean_message(&format!("  {exact}  ")), Ok(exact.clone()));
        assert_eq!(clean_message(&format!("{exact}!")), Err(MessageTooLong));
    }

    #[test]
    fn file_format_matches_post_fields() {
        let wall = Wall::default().submit_with(123_456, at(7, 30), MoodLabel::Anxious, "x");
        let json = serde_json::to_value(&wall).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "id": 123456,
                "timestamp": "2024-02-10T07:30:00",
                "mood": "😰 Anxious",
                "message": "x",
                "support_count": 0
            }])
        );
        assert_eq!(wall.posts()[0].display_time(), "2024-02-10 07:30");
    }

    #[test]
    fn timestamps_carry_microseconds() {
        let at = NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_micro_opt(7, 30, 0, 250_000)
            .unwrap();
        let wall = Wall::default().submit_with(1, at, MoodLabel::Okay, "");
        let json = serde_json::to_value(&wall).unwrap();
        assert_eq!(json[0]["timestamp"], "2024-02-10T07:30:00.250000");
        let back: Wall = serde_json::from_value(json).unwrap();
        assert_eq!(back, wall);
    }

    #[test]
    fn submitted_timestamp_has_six_fraction_digits() {
        let wall = Wall::default().submit(MoodLabel::Happy, "x");
        let json = serde_json::to_value(&wall).unwrap();
        let stamp = json[0]["timestamp"].as_str().unwrap().to_string();
        let (_, fraction) = stamp.split_once('.').unwrap_or((stamp.as_str(), "000000"));
        assert_eq!(fraction.len(), 6, "{stamp}");
        assert!(fraction.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(wall.posts()[0].timestamp.nanosecond() % 1_000, 0);
    }

    #[test]
    fn older_files_with_nanoseconds_still_load() {
        let raw = r#"[{"id":1,"timestamp":"2024-02-10T07:30:00.123456789","mood":"😊 Happy","message":"","support_count":2}]"#;
        let wall: Wall = serde_json::from_str(raw).unwrap();
        assert_eq!(wall.posts()[0].support_count, 2);
    }

    #[tokio::test]
    async fn store_round_trips() {
        let path = unique_temp_path("wall");
        let store = WallStore::new(&path);
        assert!(store.load().await.unwrap().is_empty());

        let wall = Wall::default()
            .submit(MoodLabel::Okay, "hello")
            .submit(MoodLabel::Tired, "");
        let id = wall.posts()[0].id;
        let wall = wall.support(id);
        store.persist(&wall).await.unwrap();
        assert_eq!(store.load().await.unwrap(), wall);
        let _ = tokio::fs::remove_file(&path).await;
    }
}
