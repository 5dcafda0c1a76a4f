//!
//! gradebook HTTP server
//! ---------------------
//! This module defines the Axum-based HTTP API for the gradebook.
//!
//! Responsibilities:
//! - Resolve the caller from the `token` header (teacher-only or student-only routes).
//! - Apply the ownership/enrollment gate where a route names a course.
//! - Delegate to the directory and the grade ledger.
//! - Shape `{data: ...}` success bodies and `{error: "Error: ..."}` failures.
//! - Simulated latency applied to every request, adjustable at runtime.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::Args;
use crate::directory::{CourseId, Directory, PersonId};
use crate::error::{ApiError, SchoolError, StatusPolicy};
use crate::identity::{self, AuthProvider, DigestKind, DirectoryAuthProvider, LoginRequest, SessionResolver};
use crate::ledger::{GradeRecord, SharedLedger};

const TOKEN_HEADER: &str = "token";

/// Shared server state injected into all handlers.
///
/// The directory and resolver are immutable after startup. The ledger and the latency
/// value are the only mutable parts and carry their own locks.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<Directory>,
    pub resolver: Arc<SessionResolver>,
    pub auth: Arc<dyn AuthProvider>,
    pub ledger: SharedLedger,
    /// Simulated latency in seconds
    pub latency: Arc<RwLock<f64>>,
    pub status_policy: StatusPolicy,
}

/// Upper bound for the simulated latency, in seconds.
pub const MAX_LATENCY_SECS: f64 = 60.0;

fn latency_duration(secs: f64) -> Option<Duration> {
    if !(0.0..=MAX_LATENCY_SECS).contains(&secs) { return None; }
    Duration::try_from_secs_f64(secs).ok()
}

impl AppState {
    pub fn new(directory: Directory, digest: DigestKind, status_policy: StatusPolicy) -> Self {
        let directory = Arc::new(directory);
        let resolver = Arc::new(SessionResolver::new(&directory, digest.build()));
        let auth: Arc<dyn AuthProvider> = Arc::new(DirectoryAuthProvider::new(directory.clone(), resolver.clone()));
        Self {
            directory,
            resolver,
            auth,
            ledger: SharedLedger::new(),
            latency: Arc::new(RwLock::new(0.0)),
            status_policy,
        }
    }

    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let directory = match &args.directory {
            Some(path) => Directory::load(path)?,
            None => Directory::seed(),
        };
        let state = Self::new(directory, args.token_digest, args.status_policy);
        if latency_duration(args.latency).is_none() {
            anyhow::bail!("invalid latency {}: expected 0 to {} seconds", args.latency, MAX_LATENCY_SECS);
        }
        *state.latency.write() = args.latency;
        Ok(state)
    }

    fn reject(&self, error: SchoolError) -> ApiError {
        error.with_policy(self.status_policy)
    }

    pub fn latency(&self) -> Duration {
        latency_duration(*self.latency.read()).unwrap_or_default()
    }

    fn teacher(&self, headers: &HeaderMap) -> Result<PersonId, ApiError> {
        self.resolver.resolve_teacher(token(headers)).map_err(|e| self.reject(e))
    }

    fn student(&self, headers: &HeaderMap) -> Result<PersonId, ApiError> {
        self.resolver.resolve_student(token(headers)).map_err(|e| self.reject(e))
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

/// A missing header is the empty token, which never resolves.
fn token(headers: &HeaderMap) -> &str {
    headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("")
}

fn query_param<T>(state: &AppState, q: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    q.map(|Query(v)| v).map_err(|e| state.reject(SchoolError::BadRequest(e.body_text())))
}

/// Grades must be real numbers; `NaN` and `inf` parse as f64 but have no JSON form.
fn finite_note(state: &AppState, note: f64) -> Result<f64, ApiError> {
    if note.is_finite() {
        Ok(note)
    } else {
        Err(state.reject(SchoolError::BadRequest(format!("note must be a finite number, got {}", note))))
    }
}

fn path_param<T>(state: &AppState, p: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    p.map(|Path(v)| v).map_err(|e| state.reject(SchoolError::BadRequest(e.body_text())))
}

/// Build the router with all routes and middleware mounted.
///
/// The latency route sits outside the delay layer so a slow setting can always be undone.
pub fn router(state: AppState) -> Router {
    let admin = Router::new().route("/api/v1/latency", get(set_latency));
    Router::new()
        .route("/", get(|| async { "gradebook ok" }))
        .route("/api/v1/login", get(login))
        .route("/api/v2/login", get(login))
        .route("/api/v1/courses", get(teacher_courses))
        .route("/api/v1/course/{id}/students", get(course_students))
        .route("/api/v1/course/{id}/notes", get(course_notes))
        .route("/api/v1/student/notes", get(student_notes))
        .route("/api/v1/student/notes/", get(student_notes))
        .route("/api/v1/student/note", get(student_note))
        .route("/api/v1/student/courses", get(student_courses))
        .route("/api/v1/notes/clear", get(clear_notes))
        .route("/api/v1/note", post(teacher_note))
        .layer(middleware::from_fn_with_state(state.clone(), simulate_latency))
        .merge(admin)
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

async fn trace_request(req: Request, next: Next) -> Response {
    let span = info_span!(
        target: "gradebook::http",
        "request",
        id = %Uuid::new_v4(),
        method = %req.method(),
        path = %req.uri().path()
    );
    async move {
        let resp = next.run(req).await;
        info!(target: "gradebook::http", status = resp.status().as_u16(), "handled");
        resp
    }
    .instrument(span)
    .await
}

async fn simulate_latency(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let delay = state.latency();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    next.run(req).await
}

#[derive(Debug, Deserialize)]
struct LoginParams {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn login(State(state): State<AppState>, params: Result<Query<LoginParams>, QueryRejection>) -> ApiResult {
    let p = query_param(&state, params)?;
    let resp = state
        .auth
        .login(&LoginRequest { email: p.email, password: p.password })
        .map_err(|e| state.reject(e))?;
    Ok(Json(json!({ "token": resp.token })))
}

async fn teacher_courses(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let teacher = state.teacher(&headers)?;
    Ok(Json(json!({ "data": state.directory.courses_taught_by(teacher) })))
}

async fn course_students(
    State(state): State<AppState>,
    headers: HeaderMap,
    course: Result<Path<CourseId>, PathRejection>,
) -> ApiResult {
    let teacher = state.teacher(&headers)?;
    let course = path_param(&state, course)?;
    identity::require_teacher_owns_course(&state.directory, teacher, course).map_err(|e| state.reject(e))?;
    let students = state.directory.students_of(course).map_err(|e| state.reject(e))?;
    Ok(Json(json!({ "data": students })))
}

async fn course_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
    course: Result<Path<CourseId>, PathRejection>,
) -> ApiResult {
    // Any teacher may read a course's grades; only the token is checked.
    let teacher = state.teacher(&headers)?;
    let course = path_param(&state, course)?;
    debug!(target: "gradebook::http", teacher, course, "course notes");
    Ok(Json(json!({ "data": state.ledger.by_course(course) })))
}

async fn student_notes(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let student = state.student(&headers)?;
    Ok(Json(json!({ "data": state.ledger.by_student(student) })))
}

async fn student_courses(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let student = state.student(&headers)?;
    Ok(Json(json!({ "data": state.directory.courses_followed_by(student) })))
}

#[derive(Debug, Deserialize)]
struct StudentNoteParams {
    course: CourseId,
    #[serde(rename = "type")]
    kind: String,
    type_id: i64,
    note: f64,
}

/// Self-reported grade: the student comes from the token, no enrollment check.
async fn student_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<StudentNoteParams>, QueryRejection>,
) -> ApiResult {
    let student = state.student(&headers)?;
    let p = query_param(&state, params)?;
    let note = finite_note(&state, p.note)?;
    state.ledger.insert(GradeRecord { student, course: p.course, kind: p.kind, type_id: p.type_id, note });
    Ok(Json(json!({})))
}

#[derive(Debug, Deserialize)]
struct TeacherNoteParams {
    student_id: PersonId,
    course_id: CourseId,
    #[serde(rename = "type")]
    kind: String,
    type_id: i64,
    note: f64,
}

async fn teacher_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<TeacherNoteParams>, QueryRejection>,
) -> ApiResult {
    let teacher = state.teacher(&headers)?;
    let p = query_param(&state, params)?;
    let note = finite_note(&state, p.note)?;
    identity::require_teacher_can_grade(&state.directory, teacher, p.student_id, p.course_id)
        .map_err(|e| state.reject(e))?;
    state.ledger.insert(GradeRecord {
        student: p.student_id,
        course: p.course_id,
        kind: p.kind,
        type_id: p.type_id,
        note,
    });
    Ok(Json(json!({})))
}

async fn clear_notes(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let teacher = state.teacher(&headers)?;
    let removed = state.ledger.clear_all();
    info!(target: "gradebook::ledger", teacher, removed, "notes cleared");
    Ok(Json(json!({})))
}

#[derive(Debug, Deserialize)]
struct LatencyParams {
    value: f64,
}

async fn set_latency(State(state): State<AppState>, params: Result<Query<LatencyParams>, QueryRejection>) -> ApiResult {
    let p = query_param(&state, params)?;
    if latency_duration(p.value).is_none() {
        return Err(state.reject(SchoolError::BadRequest(format!("latency must be between 0 and {} seconds, got {}", MAX_LATENCY_SECS, p.value))));
    }
    *state.latency.write() = p.value;
    info!(target: "gradebook::http", seconds = p.value, "latency changed");
    Ok(Json(json!({ "data": p.value })))
}

/// Log the effective configuration once at startup.
fn log_startup(args: &Args, state: &AppState) {
    let directory_source = args
        .directory
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<built-in>".to_string());
    info!(
        target: "startup",
        "gradebook starting: listen={}, directory={}, teachers={}, students={}, courses={}, token_digest={}, status_policy={:?}, latency={}s",
        args.listen,
        directory_source,
        state.directory.teachers().count(),
        state.directory.students().count(),
        state.directory.courses().count(),
        state.resolver.digest_name(),
        state.status_policy,
        args.latency
    );
}

/// Serve the API on an already bound listener until the future is dropped.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!(target: "startup", "shutdown requested");
}

/// Start the gradebook server with the given configuration.
pub async fn run(args: Args) -> anyhow::Result<()> {
    let state = AppState::from_args(&args)?;
    log_startup(&args, &state);
    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!("Starting server on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
