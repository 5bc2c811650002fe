//! Input channel configuration: calibration details, input switches,
//! input mode and the input configuration file
//!
//! Channels are 1-based here and translated before every automation call.

use axum::{
    body::Bytes,
    extract::State,
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;
use vv_common::index::convert_channel_to_com_index;

use crate::error::{ApiError, ApiResult};
use crate::params::{json_object, QueryParams};
use crate::response::success;
use crate::upload::{save_upload, RawUpload};
use crate::vendor::{Controller, InputCalibration, InputMode, InputSetting, VendorResult};
use crate::AppState;

/// 1-based channel from `?<n>` (or `?channel=<n>`) and its 0-based index
fn channel_from(params: &QueryParams) -> ApiResult<(usize, usize)> {
    let raw = params
        .named_or_first_key("channel")
        .ok_or_else(|| ApiError::MissingParameter("Missing required query parameter: channel".to_string()))?;
    let com = convert_channel_to_com_index(&raw)?;
    Ok((com + 1, com))
}

/// 1-based channel from a JSON value (number or numeric string)
fn channel_from_json(value: &Value) -> ApiResult<(usize, usize)> {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let com = convert_channel_to_com_index(&raw)?;
    Ok((com + 1, com))
}

fn parse_bool(name: &str, raw: &str) -> ApiResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ApiError::InvalidParameter(format!(
            "Invalid {} parameter - must be true or false",
            name
        ))),
    }
}

fn json_bool(name: &str, value: &Value) -> ApiResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => parse_bool(name, &n.to_string()),
        },
        Value::String(s) => parse_bool(name, s),
        _ => parse_bool(name, ""),
    }
}

async fn read_channel<T>(
    state: &AppState,
    params: &QueryParams,
    what: &str,
    read: fn(&dyn Controller, usize) -> VendorResult<T>,
) -> ApiResult<Json<Value>>
where
    T: Serialize + std::fmt::Display + Send + 'static,
{
    let (channel, com) = channel_from(params)?;
    let result = state.with_session(move |vv| Ok(read(vv, com)?)).await?;

    Ok(success(
        json!({ "result": result, "channel": channel }),
        format!("Channel {} {}: {}", channel, what, result),
    ))
}

/// GET /api/inputcaldate?<channel>
pub async fn input_cal_date(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    read_channel(&state, &params, "calibration date", |vv, ch| vv.input_cal_date(ch)).await
}

/// GET /api/inputserialnumber?<channel>
pub async fn input_serial_number(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    read_channel(&state, &params, "serial number", |vv, ch| vv.input_serial_number(ch)).await
}

/// GET /api/inputsensitivity?<channel>
pub async fn input_sensitivity(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    read_channel(&state, &params, "sensitivity", |vv, ch| vv.input_sensitivity(ch)).await
}

/// GET /api/inputengineeringscale?<channel>
pub async fn input_engineering_scale(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    read_channel(&state, &params, "engineering scale", |vv, ch| vv.input_engineering_scale(ch)).await
}

/// Value to write on POST: `value=` by name, else the second bare key (`?1&true`)
fn setting_value(method: &Method, params: &QueryParams) -> ApiResult<Option<bool>> {
    if *method != Method::POST {
        return Ok(None);
    }
    let raw = match params.get("value").filter(|v| !v.is_empty()) {
        Some(value) => Some(value),
        None if params.get("channel").is_none() => params.second_key(),
        None => None,
    };
    raw.map(|raw| parse_bool("value", raw)).transpose()
}

/// Read (GET) or write (POST with a value) one input switch
async fn input_setting(
    state: &AppState,
    method: &Method,
    params: &QueryParams,
    setting: InputSetting,
) -> ApiResult<Json<Value>> {
    let (channel, com) = channel_from(params)?;
    let value = setting_value(method, params)?;

    let result = state
        .with_session(move |vv| Ok(vv.input_setting(setting, com, value)?))
        .await?;

    Ok(match value {
        None => success(
            json!({ "result": result, "channel": channel }),
            format!("Channel {} {}: {}", channel, setting.describe(), result),
        ),
        Some(value) => {
            info!(channel, setting = setting.com_name(), value, "Input setting changed");
            success(
                json!({ "result": result, "channel": channel, "value_set": value }),
                format!(
                    "Channel {} {} set to {}, returned: {}",
                    channel,
                    setting.describe(),
                    value,
                    result
                ),
            )
        }
    })
}

/// GET|POST /api/inputcapacitorcoupled?<channel>[&<true|false>]
pub async fn input_capacitor_coupled(
    State(state): State<AppState>,
    method: Method,
    params: QueryParams,
) -> ApiResult<Json<Value>> {
    input_setting(&state, &method, &params, InputSetting::CapacitorCoupled).await
}

/// GET|POST /api/inputaccelpowersource?<channel>[&<true|false>]
pub async fn input_accel_power_source(
    State(state): State<AppState>,
    method: Method,
    params: QueryParams,
) -> ApiResult<Json<Value>> {
    input_setting(&state, &method, &params, InputSetting::AccelPowerSource).await
}

/// GET|POST /api/inputdifferential?<channel>[&<true|false>]
pub async fn input_differential(
    State(state): State<AppState>,
    method: Method,
    params: QueryParams,
) -> ApiResult<Json<Value>> {
    input_setting(&state, &method, &params, InputSetting::Differential).await
}

fn missing_fields(data: &Map<String, Value>, required: &[&str]) -> ApiResult<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| match data.get(*name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::MissingParameter(format!(
            "Missing required parameters: {}",
            missing.join(", ")
        )))
    }
}

/// POST /api/inputmode with `{channel, powersource, capcoupled, differential}`
pub async fn input_mode(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let data = json_object(&body).ok_or_else(|| ApiError::MissingParameter("Missing JSON body".to_string()))?;
    missing_fields(&data, &["channel", "powersource", "capcoupled", "differential"])?;

    let (channel, com) = channel_from_json(&data["channel"])?;
    let mode = InputMode {
        power_source: json_bool("powersource", &data["powersource"])?,
        cap_coupled: json_bool("capcoupled", &data["capcoupled"])?,
        differential: json_bool("differential", &data["differential"])?,
    };

    state.with_session(move |vv| Ok(vv.input_mode(com, mode)?)).await?;

    let mut result = json!({ "result": true, "channel": channel });
    if let (Some(obj), Ok(Value::Object(fields))) = (result.as_object_mut(), serde_json::to_value(mode)) {
        obj.extend(fields);
    }
    Ok(success(result, format!("Channel {} input mode configured successfully", channel)))
}

/// GET|POST /api/inputcalibration
///
/// Parameters come from the query string when there is one, else from a
/// JSON body: `channel`, `sensitivity`, `serialnumber`, `caldate`.
pub async fn input_calibration(
    State(state): State<AppState>,
    params: QueryParams,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let data = if params.is_empty() {
        json_object(&body).ok_or_else(|| {
            ApiError::MissingParameter("Missing parameters (provide query params or JSON body)".to_string())
        })?
    } else {
        ["channel", "sensitivity", "serialnumber", "caldate"]
            .iter()
            .filter_map(|name| params.get(name).map(|v| (name.to_string(), Value::String(v.to_string()))))
            .collect()
    };
    missing_fields(&data, &["channel", "sensitivity", "serialnumber", "caldate"])?;

    let (channel, com) = channel_from_json(&data["channel"])?;
    let sensitivity = match &data["sensitivity"] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|s: &f64| s.is_finite())
    .ok_or_else(|| ApiError::InvalidParameter(format!("Invalid sensitivity value: {}", data["sensitivity"])))?;

    let text = |name: &str| match &data[name] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let calibration = InputCalibration {
        sensitivity,
        serial_number: text("serialnumber"),
        cal_date: text("caldate"),
    };

    let record = calibration.clone();
    state
        .with_session(move |vv| Ok(vv.input_calibration(com, &record)?))
        .await?;

    let mut result = json!({ "result": true, "channel": channel });
    if let (Some(obj), Ok(Value::Object(fields))) = (result.as_object_mut(), serde_json::to_value(&calibration)) {
        obj.extend(fields);
    }
    Ok(success(result, format!("Channel {} calibration set successfully", channel)))
}

/// GET /api/inputconfigurationfile: current file name
pub async fn get_input_configuration_file(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.input_configuration_file()?)).await?;

    Ok(success(
        json!({ "result": result }),
        format!("Current input configuration file: {}", result),
    ))
}

/// POST /api/inputconfigurationfile?configName=<name> or ?<name>
pub async fn set_input_configuration_file(
    State(state): State<AppState>,
    params: QueryParams,
) -> ApiResult<Json<Value>> {
    let config_name = params.named_or_whole("configName").ok_or_else(|| {
        ApiError::MissingParameter("Missing required URL parameter: configName (or unnamed parameter)".to_string())
    })?;

    let name = config_name.clone();
    state
        .with_session(move |vv| Ok(vv.set_input_configuration_file(&name)?))
        .await?;

    Ok(success(
        json!({ "configName": config_name }),
        format!("Input configuration file '{}' loaded successfully", config_name),
    ))
}

/// PUT /api/inputconfigurationfile?filename=<name>: upload and load
pub async fn upload_input_configuration_file(
    State(state): State<AppState>,
    RawUpload(upload): RawUpload,
) -> ApiResult<Json<Value>> {
    let filename = upload.filename;
    let saved = save_upload(&state.config, &filename, &upload.bytes, None, false).await?;

    let path = saved.file_path.display().to_string();
    let name = filename.clone();
    state
        .with_session(move |vv| {
            vv.set_input_configuration_file(&path).map_err(|e| {
                ApiError::vendor(
                    format!("File uploaded but failed to load input configuration \"{}\"", name),
                    e,
                )
            })
        })
        .await?;

    Ok(success(
        json!({ "result": true, "filepath": filename, "uploaded": true }),
        format!("Input configuration file '{}' uploaded and loaded successfully", filename),
    ))
}

pub fn input_config_routes() -> Router<AppState> {
    Router::new()
        .route("/inputcaldate", get(input_cal_date))
        .route("/inputserialnumber", get(input_serial_number))
        .route("/inputsensitivity", get(input_sensitivity))
        .route("/inputengineeringscale", get(input_engineering_scale))
        .route("/inputcapacitorcoupled", get(input_capacitor_coupled).post(input_capacitor_coupled))
        .route("/inputaccelpowersource", get(input_accel_power_source).post(input_accel_power_source))
        .route("/inputdifferential", get(input_differential).post(input_differential))
        .route("/inputmode", post(input_mode))
        .route("/inputcalibration", get(input_calibration).post(input_calibration))
        .route(
            "/inputconfigurationfile",
            get(get_input_configuration_file)
                .post(set_input_configuration_file)
                .put(upload_input_configuration_file),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn get_never_writes() {
        let q = params(&[("1", ""), ("true", "")]);
        assert_eq!(setting_value(&Method::GET, &q).unwrap(), None);
    }

    #[test]
    fn post_value_by_position_or_name() {
        let q = params(&[("2", ""), ("TRUE", "")]);
        assert_eq!(setting_value(&Method::POST, &q).unwrap(), Some(true));

        let q = params(&[("channel", "2"), ("value", "false")]);
        assert_eq!(setting_value(&Method::POST, &q).unwrap(), Some(false));

        // `?channel=2` alone reads
        let q = params(&[("channel", "2")]);
        assert_eq!(setting_value(&Method::POST, &q).unwrap(), None);

        let q = params(&[("2", ""), ("maybe", "")]);
        assert_eq!(setting_value(&Method::POST, &q).unwrap_err().code(), "INVALID_PARAMETER");
    }

    #[test]
    fn json_flags() {
        assert!(json_bool("x", &json!(true)).unwrap());
        assert!(!json_bool("x", &json!(0)).unwrap());
        assert!(json_bool("x", &json!("True")).unwrap());
        assert!(json_bool("x", &json!(7)).is_err());
        assert!(json_bool("x", &json!(null)).is_err());
    }

    #[test]
    fn missing_fields_are_listed_in_order() {
        let data = json_object(br#"{"channel": 1, "serialnumber": ""}"#).unwrap();
        let err = missing_fields(&data, &["channel", "sensitivity", "serialnumber", "caldate"]).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameters: sensitivity, serialnumber, caldate");
    }

    #[test]
    fn json_channel_is_translated() {
        assert_eq!(channel_from_json(&json!(3)).unwrap(), (3, 2));
        assert_eq!(channel_from_json(&json!("1")).unwrap(), (1, 0));
        assert!(channel_from_json(&json!(0)).is_err());
    }
}