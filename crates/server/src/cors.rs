use config::{AllowedOrigins, CorsConfig};
use http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Characters that make an origin a glob pattern instead of a literal.
const GLOB_CHARACTERS: &str = "?*[]{}!\\";

pub(super) fn generate(
    CorsConfig {
        allow_credentials,
        allow_origins,
        max_age,
    }: &CorsConfig,
) -> CorsLayer {
    let mut cors_layer = CorsLayer::new()
        .allow_credentials(*allow_credentials)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    cors_layer = cors_layer.allow_origin(match allow_origins {
        // A wildcard origin can't be combined with credentials, echo the origin instead.
        AllowedOrigins::Any if *allow_credentials => AllowOrigin::mirror_request(),
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::Explicit(origins) => explicit_origins(origins),
    });

    if let Some(max_age) = max_age {
        cors_layer = cors_layer.max_age(*max_age);
    }

    cors_layer
}

fn explicit_origins(origins: &[url::Url]) -> AllowOrigin {
    let mut constants = Vec::new();
    let mut globs = Vec::new();

    for origin in origins {
        let origin = &origin[..url::Position::BeforePath];

        if origin.chars().any(|c| GLOB_CHARACTERS.contains(c)) {
            globs.push(origin.to_owned());
            continue;
        }

        match HeaderValue::from_str(origin) {
            Ok(value) => constants.push(value),
            Err(e) => log::warn!("Ignoring CORS origin '{origin}': {e}"),
        }
    }

    if globs.is_empty() {
        return AllowOrigin::list(constants);
    }

    AllowOrigin::predicate(move |origin, _| {
        constants.iter().any(|constant| origin == constant)
            || origin
                .to_str()
                .is_ok_and(|origin| globs.iter().any(|glob| fast_glob::glob_match(glob, origin)))
    })
}
