//! TEDS endpoints: raw reads, normalized views, and apply operations
//!
//! `/inputteds` and `/inputtedschannel` return what the controller reports;
//! `/teds` and `/tedsfromurn` run the payloads through the normalizer.

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use vv_common::index::TranslatedIndex;
use vv_common::teds::{classify_raw_teds, format_single_channel_teds, format_teds_data, ChannelTeds, RawTedsStatus};

use crate::error::{ApiError, ApiResult};
use crate::params::{json_object, QueryParams};
use crate::response::success;
use crate::AppState;

/// 1-based channel from the first query key; range is checked inside the session
fn channel_param(params: &QueryParams) -> ApiResult<TranslatedIndex> {
    let raw = params
        .first_key()
        .ok_or_else(|| ApiError::MissingParameter("Missing required query parameter: channel".to_string()))?;
    Ok(TranslatedIndex::parse("Channel", raw)?)
}

/// GET /api/inputteds
///
/// Reads every hardware channel. A failing channel is reported in place
/// rather than failing the request.
pub async fn input_teds_all(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let (total, channels) = state
        .with_session(|vv| {
            let total = vv.hardware_input_channels()?;
            let channels: Vec<Result<Value, String>> = (0..total)
                .map(|ch| vv.teds(ch).map_err(|e| e.message))
                .collect();
            Ok((total, channels))
        })
        .await?;

    let mut with_teds = 0;
    let mut with_errors = 0;
    let result: Vec<Value> = channels
        .into_iter()
        .enumerate()
        .map(|(index, outcome)| match outcome {
            Ok(teds) => {
                match classify_raw_teds(&teds) {
                    RawTedsStatus::Data => with_teds += 1,
                    RawTedsStatus::Error => with_errors += 1,
                    RawTedsStatus::Empty => {}
                }
                json!({ "channel": index + 1, "success": true, "teds": teds })
            }
            Err(error) => {
                with_errors += 1;
                json!({ "channel": index + 1, "success": false, "error": error, "teds": [] })
            }
        })
        .collect();

    Ok(success(
        json!({
            "result": result,
            "total_channels": total,
            "channels_with_teds": with_teds,
            "channels_with_errors": with_errors,
            "channels_with_teds_enabled": with_teds + with_errors,
        }),
        format!("TEDS information retrieved for {} channels", total),
    ))
}

/// GET /api/inputtedschannel?<channel>
pub async fn input_teds_channel(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let channel = channel_param(&params)?;

    let teds = state
        .with_session(move |vv| {
            channel.check_range("Channel", vv.hardware_input_channels()?)?;
            vv.teds(channel.com)
                .map_err(|e| ApiError::vendor(format!("Failed to retrieve TEDS for channel {}", channel.user), e))
        })
        .await?;

    Ok(success(
        json!({
            "result": teds,
            "channel": channel.user,
            "internal_channel": channel.com,
            "success": true,
        }),
        format!("TEDS information retrieved for channel {} (1-based)", channel.user),
    ))
}

/// GET /api/teds[?<channel>]
///
/// With a channel, the normalized transducer or its error; without one,
/// the `{transducers, errors}` document for every channel.
pub async fn teds(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    if params.is_empty() {
        let all = state
            .with_session(|vv| {
                vv.teds_all()
                    .map_err(|e| ApiError::vendor("Failed to retrieve TEDS for all channels", e))
            })
            .await?;
        let document = format_teds_data(&all);
        let message = format!(
            "Formatted TEDS information retrieved: {} transducers, {} errors",
            document.transducers.len(),
            document.errors.len()
        );
        return Ok(success(
            json!({ "result": document, "channel": "all", "success": true }),
            message,
        ));
    }

    let channel = channel_param(&params)?;
    let raw = state
        .with_session(move |vv| {
            channel.check_range("Channel", vv.hardware_input_channels()?)?;
            vv.teds(channel.com)
                .map_err(|e| ApiError::vendor(format!("Failed to retrieve TEDS for channel {}", channel.user), e))
        })
        .await?;

    match format_single_channel_teds(&raw, Some(channel.com)) {
        ChannelTeds::Transducer(transducer) => Ok(success(
            json!({ "transducer": transducer, "channel": channel.user, "success": true }),
            format!("Formatted TEDS information retrieved for channel {} (1-based)", channel.user),
        )),
        ChannelTeds::Error(error) => {
            let message = format!("TEDS error for channel {} (1-based): {}", channel.user, error.error);
            Ok(success(
                json!({ "error": error, "channel": channel.user, "success": false }),
                message,
            ))
        }
    }
}

/// GET|POST /api/tedsread
pub async fn teds_read(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.teds_read()?)).await?;
    Ok(success(
        json!({ "result": result, "success": true }),
        "TEDS read operation completed successfully",
    ))
}

/// GET|POST /api/tedsreadandapply
pub async fn teds_read_and_apply(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.teds_read_and_apply()?)).await?;
    Ok(success(
        json!({ "result": result, "success": true }),
        "TEDS read and apply operation completed successfully for all channels",
    ))
}

/// Pull a non-empty list of URN strings out of `{"urns": [...]}`
fn parse_urns(body: &[u8]) -> ApiResult<Vec<String>> {
    let body = json_object(body)
        .ok_or_else(|| ApiError::MissingParameter("Missing request body - JSON required".to_string()))?;
    let urns = match body.get("urns") {
        None | Some(Value::Null) => {
            return Err(ApiError::MissingParameter("Missing required parameter: urns".to_string()))
        }
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ApiError::InvalidParameter("Parameter \"urns\" must be an array".to_string())),
    };
    if urns.is_empty() {
        return Err(ApiError::InvalidParameter("Parameter \"urns\" cannot be empty".to_string()));
    }

    urns.iter()
        .enumerate()
        .map(|(i, urn)| {
            urn.as_str().map(str::to_string).ok_or_else(|| {
                ApiError::InvalidParameter(format!("URN at index {} must be a string", i))
            })
        })
        .collect()
}

/// POST /api/tedsverifyandapply with `{"urns": [...]}`
pub async fn teds_verify_and_apply(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let urns = parse_urns(&body)?;
    let count = urns.len();

    let to_apply = urns.clone();
    let result = state
        .with_session(move |vv| Ok(vv.teds_verify_and_apply(&to_apply)?))
        .await?;

    Ok(success(
        json!({
            "result": result,
            "urns": urns,
            "urn_count": count,
            "success": true,
        }),
        format!("TEDS verify and apply operation completed successfully for {} URNs", count),
    ))
}

/// GET /api/tedsfromurn?<urn>
pub async fn teds_from_urn(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let urn = params
        .named_or_first_key("urn")
        .ok_or_else(|| ApiError::MissingParameter("Missing required query parameter: urn".to_string()))?;

    let lookup = urn.clone();
    let raw = state.with_session(move |vv| Ok(vv.teds_from_urn(&lookup)?)).await?;

    match format_single_channel_teds(&raw, None) {
        ChannelTeds::Transducer(transducer) => Ok(success(
            json!({ "transducer": transducer, "urn": urn, "success": true }),
            format!("Formatted TEDS information retrieved for URN: {}", urn),
        )),
        ChannelTeds::Error(error) => {
            let message = format!("TEDS error for URN {}: {}", urn, error.error);
            Ok(success(json!({ "error": error, "urn": urn, "success": false }), message))
        }
    }
}

pub fn teds_routes() -> Router<AppState> {
    Router::new()
        .route("/inputteds", get(input_teds_all))
        .route("/inputtedschannel", get(input_teds_channel))
        .route("/teds", get(teds))
        .route("/tedsread", get(teds_read).post(teds_read))
        .route("/tedsreadandapply", get(teds_read_and_apply).post(teds_read_and_apply))
        .route("/tedsverifyandapply", post(teds_verify_and_apply))
        .route("/tedsfromurn", get(teds_from_urn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urn_body_validation() {
        assert_eq!(parse_urns(b"").unwrap_err().code(), "MISSING_PARAMETER");
        assert_eq!(parse_urns(br#"{}"#).unwrap_err().code(), "MISSING_PARAMETER");
        assert_eq!(parse_urns(br#"{"urns": "URN-1"}"#).unwrap_err().code(), "INVALID_PARAMETER");
        assert_eq!(parse_urns(br#"{"urns": []}"#).unwrap_err().code(), "INVALID_PARAMETER");

        let err = parse_urns(br#"{"urns": ["URN-1", 7]}"#).unwrap_err();
        assert_eq!(err.to_string(), "URN at index 1 must be a string");

        assert_eq!(parse_urns(br#"{"urns": ["URN-1", "URN-2"]}"#).unwrap(), vec!["URN-1", "URN-2"]);
    }
}
