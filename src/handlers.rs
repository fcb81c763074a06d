use crate::catalog::MoodLabel;
use crate::chat::{ReplyStream, Transcript};
use crate::errors::AppError;
use crate::models::{
    ChatRequest, HistoryResponse, LogMoodForm, LoggedMoodResponse, MoodsResponse, PageQuery,
    PostForm, SeriesResponse,
};
use crate::session::{Session, SharedTranscript};
use crate::state::AppState;
use crate::ui::{Notice, Page, render_index};
use crate::wall::{CommunityPost, clean_message};
use axum::{
    Form, Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use futures::{StreamExt, stream};
use std::{convert::Infallible, sync::Arc};
use tokio::sync::{OwnedMutexGuard, mpsc};
use tracing::{debug, info, warn};

const REPLY_BUFFER: usize = 32;

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    let moods = state.moods.load().await?;
    let wall = state.wall.load().await?;
    let transcript = current_transcript(&state, &headers).await;

    let page = Page {
        catalog: &state.catalog,
        selected: state.catalog.selected(query.mood),
        notice: query.notice.as_deref().and_then(Notice::parse),
        history: moods.history_view(),
        posts: wall.display_order(),
        transcript: transcript.turns(),
    };

    Ok(Html(render_index(&page)))
}

pub async fn log_mood_form(
    State(state): State<AppState>,
    Form(form): Form<LogMoodForm>,
) -> Result<Redirect, AppError> {
    let mood = parse_mood(&form.mood)?;
    apply_log(&state, mood).await?;
    let rank = state.catalog.rank(mood).unwrap_or_default();
    Ok(Redirect::to(&format!("/?mood={rank}&notice=logged")))
}

pub async fn post_form(
    State(state): State<AppState>,
    Form(form): Form<PostForm>,
) -> Result<Redirect, AppError> {
    apply_post(&state, &form).await?;
    Ok(Redirect::to("/?notice=posted#community"))
}

pub async fn support_form(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Redirect, AppError> {
    apply_support(&state, id).await?;
    Ok(Redirect::to("/#community"))
}

pub async fn get_moods(State(state): State<AppState>) -> Json<MoodsResponse> {
    Json(MoodsResponse {
        moods: state.catalog.entries().to_vec(),
    })
}

pub async fn get_history(State(state): State<AppState>) -> Result<Json<HistoryResponse>, AppError> {
    let moods = state.moods.load().await?;
    Ok(Json(HistoryResponse {
        entries: moods.history_view(),
    }))
}

pub async fn get_series(State(state): State<AppState>) -> Result<Json<SeriesResponse>, AppError> {
    let moods = state.moods.load().await?;
    Ok(Json(SeriesResponse {
        labels: state.catalog.labels().collect(),
        points: moods.series_view(&state.catalog),
    }))
}

pub async fn log_mood(
    State(state): State<AppState>,
    Json(payload): Json<LogMoodForm>,
) -> Result<Json<LoggedMoodResponse>, AppError> {
    let mood = parse_mood(&payload.mood)?;
    let date = apply_log(&state, mood).await?;
    Ok(Json(LoggedMoodResponse {
        date: date.to_string(),
        mood,
    }))
}

pub async fn get_posts(State(state): State<AppState>) -> Result<Json<Vec<CommunityPost>>, AppError> {
    let wall = state.wall.load().await?;
    Ok(Json(wall.display_order().into_iter().cloned().collect()))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<PostForm>,
) -> Result<Json<CommunityPost>, AppError> {
    Ok(Json(apply_post(&state, &payload).await?))
}

pub async fn support_post(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Option<CommunityPost>>, AppError> {
    Ok(Json(apply_support(&state, id).await?))
}

pub async fn get_chat(State(state): State<AppState>, headers: HeaderMap) -> Json<Transcript> {
    Json(current_transcript(&state, &headers).await)
}

/// Relays one user turn and streams the reply back as plain text. The
/// assistant turn is recorded only when the upstream stream completes,
/// even if the client hangs up first.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let text = payload.message.trim();
    if text.is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }

    let session = state.sessions.resolve(&headers).await;
    let turn = session.begin_turn().await;
    let sent = {
        let mut transcript = session.transcript.lock().await;
        state.relay.send(&mut transcript, text).await
    };
    let reply = match sent {
        Ok(reply) => reply,
        Err(err) => return Ok(with_session(AppError::from(err).into_response(), &session)),
    };

    let fragments = spawn_reply(reply, Arc::clone(&session.transcript), turn);
    let body = stream::unfold(fragments, |mut fragments| async move {
        let fragment = fragments.recv().await?;
        Some((Ok::<_, Infallible>(fragment), fragments))
    });

    let mut response = Body::from_stream(body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    Ok(with_session(response, &session))
}

/// Drains `reply` on its own task so a dropped response body cannot cancel
/// the relay. The session's turn lock is released once the reply is recorded.
fn spawn_reply(
    mut reply: ReplyStream,
    transcript: SharedTranscript,
    turn: OwnedMutexGuard<()>,
) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(REPLY_BUFFER);
    tokio::spawn(async move {
        let mut delivered = true;
        while let Some(item) = reply.next().await {
            let fragment = match item {
                Ok(fragment) => fragment,
                Err(err) => {
                    warn!("chat stream failed: {err}");
                    format!("\n[chat failed: {err}]")
                }
            };
            if delivered && tx.send(fragment).await.is_err() {
                debug!("chat client went away; finishing reply in the background");
                delivered = false;
            }
        }

        if let Some(assistant) = reply.into_turn() {
            transcript.lock().await.push(assistant);
        }
        drop(turn);
        drop(tx);
    });
    rx
}

async fn current_transcript(state: &AppState, headers: &HeaderMap) -> Transcript {
    match state.sessions.find(headers).await {
        Some(transcript) => transcript.lock().await.clone(),
        None => Transcript::default(),
    }
}

async fn apply_log(state: &AppState, mood: MoodLabel) -> Result<NaiveDate, AppError> {
    let date = today();
    let _guard = state.write_lock.lock().await;
    let log = state.moods.load().await?.record(date, mood);
    state.moods.persist(&log).await?;
    info!(%date, %mood, "mood logged");
    Ok(date)
}

async fn apply_post(state: &AppState, form: &PostForm) -> Result<CommunityPost, AppError> {
    let mood = parse_mood(&form.mood)?;
    let message = clean_message(&form.message).map_err(|err| AppError::bad_request(err.to_string()))?;

    let _guard = state.write_lock.lock().await;
    let wall = state.wall.load().await?.submit(mood, &message);
    state.wall.persist(&wall).await?;

    let post = wall.last().cloned().ok_or_else(|| AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "post was not stored".to_string(),
    })?;
    info!(id = post.id, %mood, total = wall.len(), "community post added");
    Ok(post)
}

async fn apply_support(state: &AppState, id: u32) -> Result<Option<CommunityPost>, AppError> {
    let _guard = state.write_lock.lock().await;
    let wall = state.wall.load().await?.support(id);
    state.wall.persist(&wall).await?;

    let post = wall.find(id).cloned();
    match &post {
        Some(post) => info!(id, support_count = post.support_count, "post supported"),
        None => debug!(id, "support for unknown post ignored"),
    }
    Ok(post)
}

fn parse_mood(value: &str) -> Result<MoodLabel, AppError> {
    MoodLabel::parse(value).ok_or_else(|| AppError::bad_request(format!("unknown mood: {value}")))
}

fn with_session(mut response: Response, session: &Session) -> Response {
    if let Some(cookie) = session.set_cookie() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
