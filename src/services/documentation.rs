use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Mini Golf Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::event_stream,
        crate::routes::game::me,
        crate::routes::game::list_games,
        crate::routes::game::create_game,
        crate::routes::game::open_game,
        crate::routes::game::duplicate_game,
        crate::routes::game::delete_game,
        crate::routes::round::get_round,
        crate::routes::round::advance,
        crate::routes::round::retreat,
        crate::routes::round::jump,
        crate::routes::round::set_score,
        crate::routes::round::standings,
        crate::routes::round::save_and_exit,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::PlayerInput,
            crate::dto::game::GameListItem,
            crate::dto::game::OwnerProfile,
            crate::dto::round::RoundSnapshot,
            crate::dto::round::JumpRequest,
            crate::dto::round::ScoreRequest,
            crate::dto::sse::Handshake,
            crate::dto::sse::ConnectivityEvent,
            crate::dto::sse::StorageNoticeEvent,
            crate::dto::sse::SyncReport,
            crate::dto::sse::RoundClosedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "game", description = "Game setup and dashboard"),
        (name = "round", description = "Live round navigation and scoring"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_round_and_game_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/games", "/games/{id}/open", "/rounds/{id}/scores", "/sse/events"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
