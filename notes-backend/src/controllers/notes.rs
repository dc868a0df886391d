//! Notes REST API — create and read endpoints backed by the relational store.
//!
//! The chat dispatcher submits completed notes through POST /notes, the
//! same path external clients use.

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::models::Note;
use crate::AppState;

/// Timestamp format used on the wire
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct CreateNoteRequest {
    title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct NoteResponse {
    id: i64,
    title: String,
    content: String,
    created_at: String,
    updated_at: String,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            created_at: note.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: note.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListNotesQuery {
    skip: Option<i64>,
    limit: Option<i64>,
}

/// Create a note. Replies 201 on success — the one status chat clients
/// check for.
async fn create_note(
    data: web::Data<AppState>,
    body: web::Json<CreateNoteRequest>,
) -> impl Responder {
    match data.db.create_note(&body.title, &body.content, &body.tags) {
        Ok(note) => HttpResponse::Created().json(NoteResponse::from(note)),
        Err(e) => {
            log::error!("Failed to create note: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to create note"
            }))
        }
    }
}

/// List a window of notes, default skip=0 limit=10
async fn list_notes(
    data: web::Data<AppState>,
    query: web::Query<ListNotesQuery>,
) -> impl Responder {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(10).max(0);

    match data.db.get_notes(skip, limit) {
        Ok(notes) => {
            let out: Vec<NoteResponse> = notes.into_iter().map(NoteResponse::from).collect();
            HttpResponse::Ok().json(out)
        }
        Err(e) => {
            log::error!("Failed to list notes: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to list notes"
            }))
        }
    }
}

async fn get_note(data: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let note_id = path.into_inner();

    match data.db.get_note_by_id(note_id) {
        Ok(Some(note)) => HttpResponse::Ok().json(NoteResponse::from(note)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Note not found"
        })),
        Err(e) => {
            log::error!("Failed to fetch note {}: {}", note_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to fetch note"
            }))
        }
    }
}

/// All notes carrying a tag, exact name match; empty array for an
/// unknown tag
async fn search_by_tag(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let tag_name = path.into_inner();

    match data.db.search_notes_by_tag(&tag_name) {
        Ok(notes) => {
            let out: Vec<NoteResponse> = notes.into_iter().map(NoteResponse::from).collect();
            HttpResponse::Ok().json(out)
        }
        Err(e) => {
            log::error!("Failed to search notes by tag '{}': {}", tag_name, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to search notes"
            }))
        }
    }
}

async fn list_tags(data: web::Data<AppState>) -> impl Responder {
    match data.db.list_tags() {
        Ok(tags) => HttpResponse::Ok().json(serde_json::json!({
            "tags": tags.into_iter().map(|t| t.name).collect::<Vec<_>>()
        })),
        Err(e) => {
            log::error!("Failed to list tags: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to list tags"
            }))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notes")
            .route("", web::post().to(create_note))
            .route("", web::get().to(list_notes))
            // Literal segments must register before the {id} catch-all
            .route("/tags", web::get().to(list_tags))
            .route("/tag/{tag_name}", web::get().to(search_by_tag))
            .route("/{id}", web::get().to(get_note)),
    );
}
