use serde::{Deserialize, Serialize};

/// The closed set of moods shared by the journal, the community wall and the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoodLabel {
    #[serde(rename = "😊 Happy")]
    Happy,
    #[serde(rename = "😐 Okay")]
    Okay,
    #[serde(rename = "😢 Sad")]
    Sad,
    #[serde(rename = "😠 Angry")]
    Angry,
    #[serde(rename = "😰 Anxious")]
    Anxious,
    #[serde(rename = "😴 Tired")]
    Tired,
}

impl MoodLabel {
    pub const ALL: [MoodLabel; 6] = [
        MoodLabel::Happy,
        MoodLabel::Okay,
        MoodLabel::Sad,
        MoodLabel::Angry,
        MoodLabel::Anxious,
        MoodLabel::Tired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MoodLabel::Happy => "😊 Happy",
            MoodLabel::Okay => "😐 Okay",
            MoodLabel::Sad => "😢 Sad",
            MoodLabel::Angry => "😠 Angry",
            MoodLabel::Anxious => "😰 Anxious",
            MoodLabel::Tired => "😴 Tired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|label| label.as_str() == value)
    }
}

impl std::fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Advice {
    pub label: MoodLabel,
    pub rank: usize,
    pub advice: &'static str,
    pub song: &'static str,
    pub action_heading: &'static str,
    pub actions: &'static [&'static str],
}

/// Read-only advisory table, one entry per mood in enumeration order.
#[derive(Debug, Clone)]
pub struct MoodCatalog {
    entries: [Advice; 6],
}

impl MoodCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: MoodLabel::ALL.map(|label| builtin_entry(label as usize, label)),
        }
    }

    pub fn entries(&self) -> &[Advice] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = MoodLabel> + '_ {
        self.entries.iter().map(|entry| entry.label)
    }

    pub fn get(&self, label: MoodLabel) -> Option<&Advice> {
        self.entries.iter().find(|entry| entry.label == label)
    }

    /// The entry at `index`, or the first mood when the index is absent or out of range.
    pub fn selected(&self, index: Option<usize>) -> &Advice {
        index
            .and_then(|index| self.entries.get(index))
            .unwrap_or(&self.entries[0])
    }

    /// Position of `label` in the catalog order; drives the chart's y axis.
    pub fn rank(&self, label: MoodLabel) -> Option<usize> {
        self.get(label).map(|entry| entry.rank)
    }
}

impl Default for MoodCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_entry(rank: usize, label: MoodLabel) -> Advice {
    let (advice, song, action_heading, actions): (&str, &str, &str, &[&str]) = match label {
        MoodLabel::Happy => (
            "You're in a good place today, enjoy it. Hold onto what made you smile, even the little stuff. \
             Maybe take a walk or call someone just to share the vibe.",
            "\"Walking on Sunshine\" by Katrina and the Waves",
            "Move",
            &[
                "Stretch up tall.",
                "Sway side to side or do a little dance.",
                "Let yourself feel light, even if just for a minute.",
            ],
        ),
        MoodLabel::Okay => (
            "It's one of those \"fine\" days, not bad, not great. That's okay. \
             Let it be simple. Maybe take 5 minutes just to be still and notice your surroundings.",
            "\"Weightless\" by Marconi Union",
            "Reset",
            &[
                "Roll your shoulders.",
                "Breathe in slowly, then out.",
                "Just sit. Nothing to fix. Let it be.",
            ],
        ),
        MoodLabel::Sad => (
            "Some days just feel heavy. You don't need to push it away. \
             Maybe write down what's weighing on you or just rest quietly.",
            "\"Fix You\" by Coldplay",
            "Rest",
            &[
                "Lie on your back.",
                "Open your chest and breathe.",
                "Stay as long as you want.",
            ],
        ),
        MoodLabel::Angry => (
            "You're fired up and something clearly hit a nerve. That's real. \
             Better to move that energy than keep it bottled.",
            "\"Stronger\" by Kanye West",
            "Move it out",
            &[
                "20 jumping jacks.",
                "Punch the air. Hard.",
                "Then sit. Breathe it out.",
            ],
        ),
        MoodLabel::Anxious => (
            "Everything might feel too loud or too fast right now. \
             Try grounding yourself in your breath and surroundings.",
            "\"Sunrise\" by Norah Jones",
            "Slow down",
            &[
                "Inhale for 4 seconds",
                "Hold 4",
                "Exhale 4",
                "Hold 4",
                "Repeat.",
                "Look around. Name 3 things you see.",
            ],
        ),
        MoodLabel::Tired => (
            "You're worn out, and that's okay. Maybe don't ask more of yourself than necessary today. \
             Close your eyes for a bit if you can.",
            "\"Night Owl\" by Galimatias",
            "Rest",
            &[
                "Lie down.",
                "Hug your knees to your chest.",
                "Rock side to side.",
                "Let your jaw unclench. Let go a little.",
            ],
        ),
    };

    Advice {
        label,
        rank,
        advice,
        song,
        action_heading,
        actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_follows_label_order() {
        let catalog = MoodCatalog::builtin();
        let labels: Vec<_> = catalog.labels().collect();
        assert_eq!(labels, MoodLabel::ALL.to_vec());
        assert_eq!(catalog.rank(MoodLabel::Happy), Some(0));
        assert_eq!(catalog.rank(MoodLabel::Tired), Some(5));
    }

    #[test]
    fn labels_serialize_as_emoji_strings() {
        let json = serde_json::to_string(&MoodLabel::Sad).unwrap();
        assert_eq!(json, "\"😢 Sad\"");
        let parsed: MoodLabel = serde_json::from_str("\"😰 Anxious\"").unwrap();
        assert_eq!(parsed, MoodLabel::Anxious);
        assert!(serde_json::from_str::<MoodLabel>("\"Happy\"").is_err());
    }

    #[test]
    fn selection_falls_back_to_first_mood() {
        let catalog = MoodCatalog::builtin();
        assert_eq!(catalog.selected(Some(2)).label, MoodLabel::Sad);
        assert_eq!(catalog.selected(Some(42)).label, MoodLabel::Happy);
        assert_eq!(catalog.selected(None).label, MoodLabel::Happy);
    }

    #[test]
    fn parse_rejects_unknown_labels() {
        assert_eq!(MoodLabel::parse(" 😴 Tired "), Some(MoodLabel::Tired));
        assert_eq!(MoodLabel::parse("meh"), None);
    }
}
