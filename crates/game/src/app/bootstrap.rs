use overworld_engine::{LoopConfig, OverworldConfig, Viewport};
use tracing::info;
use tracing_subscriber::EnvFilter;

const START_MAP_ENV_VAR: &str = "OVERWORLD_START_MAP";
const DEFAULT_START_MAP: &str = "map1.tmx";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) overworld: OverworldConfig,
    pub(crate) start_map: String,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Overworld Startup ===");

    let config = LoopConfig::default();
    let overworld = OverworldConfig {
        viewport: Viewport::new(config.window_width, config.window_height),
        ..OverworldConfig::default()
    };
    AppWiring {
        config,
        overworld,
        start_map: start_map_from_env(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn start_map_from_env() -> String {
    start_map_or_default(std::env::var(START_MAP_ENV_VAR).ok())
}

fn start_map_or_default(raw: Option<String>) -> String {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_START_MAP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_start_map_falls_back_to_default() {
        assert_eq!(start_map_or_default(None), "map1.tmx");
        assert_eq!(start_map_or_default(Some("  ".to_string())), "map1.tmx");
        assert_eq!(
            start_map_or_default(Some(" town/inn.tmx ".to_string())),
            "town/inn.tmx"
        );
    }
}
