/// Debounced per-round autosave worker.
pub mod autosave;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game setup, dashboard and deletion.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Remote-first persistence with local fallback and reconciliation.
pub mod persistence;
/// Live round commands, standings and save-and-exit.
pub mod round_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Remote store connectivity supervisor.
pub mod storage_supervisor;
