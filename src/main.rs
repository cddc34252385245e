use chatrooms::{setting::Settings, AppResult, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    let app_state = AppState::connect(settings).await?;

    let rooms = app_state.rooms.all_live(None).await?;
    info!(live_rooms = rooms.len(), "database ready");
    for room in rooms {
        info!(param = %room.to_param(), title = %room.title, members = room.members.len(), "live room");
    }

    Ok(())
}
