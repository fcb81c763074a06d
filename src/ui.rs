use crate::catalog::{Advice, MoodCatalog};
use crate::chat::{ChatTurn, Role};
use crate::journal::HistoryEntry;
use crate::wall::{CommunityPost, MAX_MESSAGE_CHARS};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Logged,
    Posted,
}

impl Notice {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "logged" => Some(Notice::Logged),
            "posted" => Some(Notice::Posted),
            _ => None,
        }
    }

    fn text(self) -> &'static str {
        match self {
            Notice::Logged => "Mood logged for today ✅",
            Notice::Posted => "Thank you for sharing! Your post has been added.",
        }
    }
}

pub struct Page<'a> {
    pub catalog: &'a MoodCatalog,
    pub selected: &'a Advice,
    pub notice: Option<Notice>,
    pub history: Vec<HistoryEntry>,
    pub posts: Vec<&'a CommunityPost>,
    pub transcript: &'a [ChatTurn],
}

const RESOURCES: [(&str, &str, &str); 4] = [
    ("Mental Health America", "https://mhanational.org/", "Education and support"),
    ("Crisis Text Line", "https://www.crisistextline.org/", "Text HOME to 741741"),
    ("National Suicide Prevention Lifeline", "https://988lifeline.org/", "Call or text 988"),
    ("Therapy Matcher", "https://www.psychologytoday.com/", "Find a therapist near you"),
];

pub fn render_index(page: &Page<'_>) -> String {
    let notice = page
        .notice
        .map(|notice| format!(r#"<div class="status" data-type="ok">{}</div>"#, notice.text()))
        .unwrap_or_default();

    INDEX_HTML
        .replace("{{NOTICE}}", &notice)
        .replace("{{MOOD_CHIPS}}", &mood_chips(page))
        .replace("{{SELECTED_LABEL}}", &escape_html(page.selected.label.as_str()))
        .replace("{{SUGGESTION}}", &suggestion(page.selected))
        .replace("{{MOOD_OPTIONS}}", &mood_options(page))
        .replace("{{MAX_CHARS}}", &MAX_MESSAGE_CHARS.to_string())
        .replace("{{POSTS}}", &posts(&page.posts))
        .replace("{{HISTORY}}", &history(&page.history))
        .replace("{{RESOURCES}}", &resources())
        .replace("{{TRANSCRIPT}}", &transcript(page.transcript))
}

fn mood_chips(page: &Page<'_>) -> String {
    let mut out = String::new();
    for entry in page.catalog.entries() {
        let class = if entry.label == page.selected.label {
            "chip active"
        } else {
            "chip"
        };
        let _ = write!(
            out,
            r#"<a class="{class}" href="/?mood={}">{}</a>"#,
            entry.rank,
            escape_html(entry.label.as_str())
        );
    }
    out
}

fn suggestion(advice: &Advice) -> String {
    let mut out = format!(
        r#"<p>{}</p><p class="song">🎵 Song: {}</p><p class="label">{}:</p><ul>"#,
        escape_html(advice.advice),
        escape_html(advice.song),
        escape_html(advice.action_heading)
    );
    for action in advice.actions {
        let _ = write!(out, "<li>{}</li>", escape_html(action));
    }
    out.push_str("</ul>");
    out
}

fn mood_options(page: &Page<'_>) -> String {
    page.catalog
        .labels()
        .map(|label| {
            let label = escape_html(label.as_str());
            format!(r#"<option value="{label}">{label}</option>"#)
        })
        .collect()
}

fn posts(posts: &[&CommunityPost]) -> String {
    if posts.is_empty() {
        return r#"<p class="hint">No community posts yet. Be the first to share your mood!</p>"#
            .to_string();
    }

    let mut out = format!("<h3>Recent Posts ({})</h3>", posts.len());
    for post in posts {
        let _ = write!(
            out,
            r#"<article class="post"><div><strong>{}</strong> {}</div>"#,
            post.display_time(),
            escape_html(post.mood.as_str())
        );
        if !post.message.is_empty() {
            let _ = write!(out, "<p>{}</p>", escape_html(&post.message));
        }
        let _ = write!(
            out,
            r#"<form method="post" action="/community/support/{}"><button class="btn-support" type="submit">❤️ Support ({})</button></form></article>"#,
            post.id, post.support_count
        );
    }
    out
}

fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return r#"<p class="hint">No mood data yet. Check in above!</p>"#.to_string();
    }

    let mut out = String::from(r#"<ul class="history">"#);
    for entry in entries {
        let _ = write!(
            out,
            "<li><strong>{}</strong> {}</li>",
            entry.date,
            escape_html(entry.mood.as_str())
        );
    }
    out.push_str("</ul>");
    out
}

fn resources() -> String {
    RESOURCES
        .iter()
        .map(|(name, url, note)| {
            format!(r#"<li><a href="{url}" target="_blank" rel="noopener">{name}</a> {note}</li>"#)
        })
        .collect()
}

fn transcript(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            format!(
                r#"<div class="bubble {role}">{}</div>"#,
                escape_html(&turn.content)
            )
        })
        .collect()
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>MindHaven</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef3f0;
      --bg-2: #c9e2d6;
      --ink: #2b2a28;
      --accent: #5b8def;
      --accent-2: #2f4858;
      --warm: #ff6b4a;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e3f0ff 60%, #f4f8f6 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
      animation: rise 600ms ease;
    }

    h1, h2 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      margin: 0;
    }

    h1 {
      font-size: clamp(2rem, 4vw, 2.6rem);
    }

    h2 {
      font-size: 1.4rem;
    }

    section {
      display: grid;
      gap: 14px;
      padding-top: 20px;
      border-top: 1px solid rgba(47, 72, 88, 0.1);
    }

    .subtitle, .hint {
      margin: 0;
      color: #5f5c57;
    }

    .chips {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    .chip {
      padding: 10px 16px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.08);
      color: var(--accent-2);
      text-decoration: none;
      font-weight: 600;
    }

    .chip.active {
      background: white;
      box-shadow: 0 8px 16px rgba(47, 72, 88, 0.12);
    }

    .card {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .card .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
      margin-bottom: 0;
    }

    .song {
      font-weight: 600;
      color: var(--accent-2);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 14px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
      box-shadow: 0 10px 24px rgba(91, 141, 239, 0.3);
      transition: transform 150ms ease;
    }

    button:active {
      transform: scale(0.98);
    }

    .btn-support {
      padding: 8px 14px;
      font-size: 0.9rem;
      background: var(--warm);
      box-shadow: none;
    }

    select, textarea, input[type="text"] {
      width: 100%;
      font: inherit;
      border-radius: 14px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      padding: 12px;
      background: white;
    }

    form.stack {
      display: grid;
      gap: 10px;
    }

    .post {
      display: grid;
      gap: 6px;
      padding: 14px 0;
      border-bottom: 1px dashed rgba(47, 72, 88, 0.15);
    }

    .post p {
      margin: 0;
    }

    .history {
      margin: 0;
      padding-left: 18px;
    }

    #chart {
      width: 100%;
      height: 280px;
      display: block;
    }

    #chart text {
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
    }

    .chart-line {
      fill: none;
      stroke: var(--accent);
      stroke-width: 3;
    }

    .chart-point {
      fill: white;
      stroke: var(--accent);
      stroke-width: 2;
    }

    .chart-grid {
      stroke: rgba(47, 72, 88, 0.12);
    }

    .chart-label {
      fill: #7a746d;
      font-size: 11px;
    }

    .transcript {
      display: grid;
      gap: 10px;
    }

    .bubble {
      padding: 12px 16px;
      border-radius: 18px;
      white-space: pre-wrap;
      max-width: 85%;
    }

    .bubble.user {
      justify-self: end;
      background: var(--accent-2);
      color: white;
    }

    .bubble.assistant {
      justify-self: start;
      background: white;
      border: 1px solid rgba(47, 72, 88, 0.1);
    }

    .bubble.failed {
      border-color: #c63b2b;
      color: #c63b2b;
    }

    .chat-form {
      display: flex;
      gap: 10px;
    }

    .status {
      font-size: 0.95rem;
      color: #6b645d;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }

    @keyframes rise {
      from {
        opacity: 0;
        transform: translateY(18px);
      }
      to {
        opacity: 1;
        transform: translateY(0);
      }
    }

    @media (max-width: 600px) {
      .app {
        padding: 28px 22px;
      }
      .chat-form {
        flex-direction: column;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>🧠 MindHaven</h1>
      <p class="subtitle">Daily Mental Health Check-In. How are you feeling today? Choose the emoji that best represents your mood.</p>
    </header>

    {{NOTICE}}

    <section id="checkin">
      <div class="chips">{{MOOD_CHIPS}}</div>
      <form method="post" action="/mood/log">
        <input type="hidden" name="mood" value="{{SELECTED_LABEL}}" />
        <button type="submit">✔️ Log Mood</button>
      </form>
      <h2>💬 Suggestion</h2>
      <div class="card">{{SUGGESTION}}</div>
    </section>

    <section id="community">
      <h2>🌍 Community Mood Wall</h2>
      <form class="stack" method="post" action="/community/post">
        <label for="community-mood">Share your mood anonymously:</label>
        <select id="community-mood" name="mood">{{MOOD_OPTIONS}}</select>
        <textarea name="message" maxlength="{{MAX_CHARS}}" rows="3" placeholder="Say something supportive or share how you're feeling (optional)"></textarea>
        <button type="submit">Post to Community</button>
      </form>
      <div>{{POSTS}}</div>
    </section>

    <section id="history">
      <h2>📈 Mood History</h2>
      {{HISTORY}}
      <div class="card">
        <svg id="chart" viewBox="0 0 640 280" aria-label="Mood over time" role="img"></svg>
      </div>
    </section>

    <section id="resources">
      <h2>🆘 Support Resources</h2>
      <ul>{{RESOURCES}}</ul>
    </section>

    <section id="chat">
      <h2>MindHaven ChatBot 🧠💡</h2>
      <div class="transcript" id="transcript">{{TRANSCRIPT}}</div>
      <form class="chat-form" id="chat-form">
        <input type="text" id="chat-input" placeholder="What is up?" autocomplete="off" />
        <button type="submit" id="chat-send">Send</button>
      </form>
      <div class="status" id="status"></div>
    </section>
  </main>

  <script>
    const chartEl = document.getElementById('chart');
    const transcriptEl = document.getElementById('transcript');
    const chatForm = document.getElementById('chat-form');
    const chatInput = document.getElementById('chat-input');
    const chatSend = document.getElementById('chat-send');
    const statusEl = document.getElementById('status');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const escapeText = (value) =>
      value.replace(/[&<>"']/g, (ch) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[ch]));

    const renderMoodChart = (labels, points) => {
      if (!points.length) {
        chartEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }

      const width = 640;
      const height = 280;
      const paddingLeft = 110;
      const paddingRight = 24;
      const paddingY = 40;
      const top = 20;

      const maxRank = Math.max(labels.length - 1, 1);
      const xStep = points.length > 1 ? (width - paddingLeft - paddingRight) / (points.length - 1) : 0;
      const scaleY = (height - top - paddingY) / maxRank;
      const x = (index) => (points.length > 1 ? paddingLeft + index * xStep : (paddingLeft + width - paddingRight) / 2);
      const y = (rank) => top + rank * scaleY;

      let grid = '';
      labels.forEach((label, rank) => {
        grid += `<line class="chart-grid" x1="${paddingLeft}" y1="${y(rank)}" x2="${width - paddingRight}" y2="${y(rank)}" />`;
        grid += `<text class="chart-label" x="${paddingLeft - 10}" y="${y(rank) + 4}" text-anchor="end">${escapeText(label)}</text>`;
      });

      const path = points
        .map((point, index) => `${index === 0 ? 'M' : 'L'} ${x(index).toFixed(2)} ${y(point.rank).toFixed(2)}`)
        .join(' ');

      const labelEvery = points.length > 8 ? Math.ceil(points.length / 8) : 1;
      const xLabels = points
        .map((point, index) => {
          if (index % labelEvery !== 0) {
            return '';
          }
          return `<text class="chart-label" x="${x(index)}" y="${height - paddingY + 22}" text-anchor="middle">${point.date.slice(5)}</text>`;
        })
        .join('');

      const circles = points
        .map((point, index) => `<circle class="chart-point" cx="${x(index)}" cy="${y(point.rank)}" r="4" />`)
        .join('');

      chartEl.setAttribute('viewBox', `0 0 ${width} ${height}`);
      chartEl.innerHTML = `
        ${grid}
        <path class="chart-line" d="${path}" />
        ${circles}
        ${xLabels}
      `;
    };

    const loadSeries = async () => {
      const res = await fetch('/api/series');
      if (!res.ok) {
        throw new Error('Unable to load mood history');
      }
      const data = await res.json();
      renderMoodChart(data.labels, data.points);
    };

    const addBubble = (role, text) => {
      const bubble = document.createElement('div');
      bubble.className = `bubble ${role}`;
      bubble.textContent = text;
      transcriptEl.appendChild(bubble);
      return bubble;
    };

    const sendChat = async (message) => {
      addBubble('user', message);
      const bubble = addBubble('assistant', '');
      const res = await fetch('/api/chat', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ message })
      });

      if (!res.ok) {
        bubble.classList.add('failed');
        bubble.textContent = await res.text();
        return;
      }

      const reader = res.body.getReader();
      const decoder = new TextDecoder();
      while (true) {
        const { done, value } = await reader.read();
        if (done) {
          break;
        }
        bubble.textContent += decoder.decode(value, { stream: true });
      }
      if (bubble.textContent.includes('[chat failed:')) {
        bubble.classList.add('failed');
      }
    };

    chatForm.addEventListener('submit', async (event) => {
      event.preventDefault();
      const message = chatInput.value.trim();
      if (!message) {
        return;
      }
      chatInput.value = '';
      chatSend.disabled = true;
      setStatus('', '');
      try {
        await sendChat(message);
      } catch (err) {
        setStatus(err.message, 'error');
      } finally {
        chatSend.disabled = false;
      }
    });

    loadSeries().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;
