//! Report fields, single and expanded over channels and loops
//!
//! `POST /reportfields` builds the controller's field syntax from 1-based
//! selectors: `Field{ch}:` for a channel, `Field:{lp}` for a loop,
//! `Field{ch}:{lp}` for both. `"all"` expands to every hardware input
//! channel or output loop.

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::params::{json_object, QueryParams};
use crate::response::success;
use crate::AppState;

/// GET /api/reportfield?field=<name> or /api/reportfield?<name>
pub async fn report_field(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let field = params.named_or_first_key("field").ok_or_else(|| {
        ApiError::MissingParameter(
            "Missing query parameter: either \"field\" or provide any query parameter".to_string(),
        )
    })?;

    let name = field.clone();
    let result = state.with_session(move |vv| Ok(vv.report_field(&name)?)).await?;

    Ok(success(
        json!({ "result": result, "field": field, "executed": true }),
        format!("ReportField executed successfully for field: {}", field),
    ))
}

/// Channel or loop selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    All,
    One(i64),
}

impl Selector {
    fn parse(name: &str, value: &Value) -> ApiResult<Self> {
        let invalid = || ApiError::InvalidParameter(format!("Parameter \"{}\" must be an integer or \"all\"", name));
        match value {
            Value::String(s) if s == "all" => Ok(Selector::All),
            Value::String(s) => s.trim().parse().map(Selector::One).map_err(|_| invalid()),
            Value::Number(n) => n.as_i64().map(Selector::One).ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }

    fn resolve(self, available: impl FnOnce() -> ApiResult<usize>) -> ApiResult<Vec<i64>> {
        match self {
            Selector::One(n) => Ok(vec![n]),
            Selector::All => Ok((1..=available()? as i64).collect()),
        }
    }
}

/// A selector and where it came from
#[derive(Debug, Clone)]
struct SelectorParam {
    raw: Value,
    selector: Selector,
    source: &'static str,
}

/// URL parameter first, then the JSON body
fn selector_param(name: &str, params: &QueryParams, body: &Map<String, Value>) -> ApiResult<Option<SelectorParam>> {
    let (raw, source) = match params.get(name).filter(|v| !v.is_empty()) {
        Some(value) => (Value::String(value.to_string()), "url"),
        None => match body.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => (value.clone(), "json"),
        },
    };
    let selector = Selector::parse(name, &raw)?;
    Ok(Some(SelectorParam { raw, selector, source }))
}

/// One controller query for a requested field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
    pub com_name: String,
    pub channel: Option<i64>,
    pub loop_num: Option<i64>,
}

fn non_empty(indices: &[i64]) -> Value {
    if indices.is_empty() {
        Value::Null
    } else {
        json!(indices)
    }
}

/// Every controller query needed for `field`
pub fn field_combinations(field: &str, channels: &[i64], loops: &[i64]) -> Vec<FieldQuery> {
    let query = |com_name: String, channel, loop_num| FieldQuery {
        com_name,
        channel,
        loop_num,
    };

    match (channels.is_empty(), loops.is_empty()) {
        (true, true) => vec![query(field.to_string(), None, None)],
        (false, true) => channels
            .iter()
            .map(|ch| query(format!("{}{}:", field, ch), Some(*ch), None))
            .collect(),
        (true, false) => loops
            .iter()
            .map(|lp| query(format!("{}:{}", field, lp), None, Some(*lp)))
            .collect(),
        (false, false) => channels
            .iter()
            .flat_map(|ch| {
                loops
                    .iter()
                    .map(move |lp| query(format!("{}{}:{}", field, ch, lp), Some(*ch), Some(*lp)))
            })
            .collect(),
    }
}

/// Raw value when unqualified, else `{value, channel?, loop?}`
fn format_value(raw: String, query: &FieldQuery) -> Value {
    if query.channel.is_none() && query.loop_num.is_none() {
        return Value::String(raw);
    }
    let mut obj = Map::new();
    obj.insert("value".to_string(), Value::String(raw));
    if let Some(ch) = query.channel {
        obj.insert("channel".to_string(), json!(ch));
    }
    if let Some(lp) = query.loop_num {
        obj.insert("loop".to_string(), json!(lp));
    }
    Value::Object(obj)
}

fn parse_fields(body: &Map<String, Value>) -> ApiResult<Vec<String>> {
    let fields = match body.get("fields") {
        None => return Err(ApiError::MissingParameter("Missing required JSON parameter: fields".to_string())),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ApiError::InvalidParameter("Parameter \"fields\" must be an array".to_string())),
    };
    if fields.is_empty() {
        return Err(ApiError::InvalidParameter("Parameter \"fields\" cannot be empty".to_string()));
    }
    Ok(fields
        .iter()
        .map(|f| match f {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}

/// POST /api/reportfields with `{"fields": [...], "channel"?, "loop"?}`
pub async fn report_fields(
    State(state): State<AppState>,
    params: QueryParams,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body = json_object(&body)
        .filter(|b| b.contains_key("fields"))
        .ok_or_else(|| ApiError::MissingParameter("Missing required JSON parameter: fields".to_string()))?;
    let fields = parse_fields(&body)?;
    let channel_param = selector_param("channel", &params, &body)?;
    let loop_param = selector_param("loop", &params, &body)?;

    let channel_selector = channel_param.as_ref().map(|p| p.selector);
    let loop_selector = loop_param.as_ref().map(|p| p.selector);
    let requested = fields.clone();

    let (channels, loops, outcomes) = state
        .with_session(move |vv| {
            let channels = match channel_selector {
                Some(selector) => selector.resolve(|| {
                    vv.hardware_input_channels()
                        .map_err(|e| ApiError::vendor("Failed to get hardware input channels", e))
                })?,
                None => Vec::new(),
            };
            let loops = match loop_selector {
                Some(selector) => selector.resolve(|| {
                    vv.hardware_output_channels()
                        .map_err(|e| ApiError::vendor("Failed to get hardware output channels", e))
                })?,
                None => Vec::new(),
            };

            let outcomes: Vec<(String, Vec<(FieldQuery, Result<String, String>)>)> = requested
                .iter()
                .map(|field| {
                    let answers = field_combinations(field, &channels, &loops)
                        .into_iter()
                        .map(|query| {
                            let answer = vv.report_field(&query.com_name).map_err(|e| e.message);
                            (query, answer)
                        })
                        .collect();
                    (field.clone(), answers)
                })
                .collect();

            Ok((channels, loops, outcomes))
        })
        .await?;

    let mut results = Map::new();
    let mut errors = Map::new();
    let mut total_combinations = 0;

    for (field, answers) in outcomes {
        total_combinations += answers.len();
        if answers.len() == 1 {
            if let Some((query, answer)) = answers.into_iter().next() {
                match answer {
                    Ok(raw) => {
                        results.insert(field, format_value(raw, &query));
                    }
                    Err(e) => {
                        errors.insert(field, Value::String(e));
                    }
                }
            }
            continue;
        }

        let mut values = Vec::new();
        let mut failures = Vec::new();
        for (query, answer) in answers {
            match answer {
                Ok(raw) => values.push(format_value(raw, &query)),
                Err(e) => failures.push(Value::String(format!("Error for {}: {}", query.com_name, e))),
            }
        }
        if !values.is_empty() {
            results.insert(field.clone(), Value::Array(values));
        }
        if !failures.is_empty() {
            errors.insert(field, Value::Array(failures));
        }
    }

    let successful = results.len();
    let failed = errors.len();
    let mut message = if failed > 0 {
        format!("ReportFields executed with {} successes and {} errors", successful, failed)
    } else {
        format!("ReportFields executed successfully for {} field combinations", total_combinations)
    };

    let mut qualifiers = Vec::new();
    if let Some(p) = &channel_param {
        qualifiers.push(match p.selector {
            Selector::All => format!("all {} channels", channels.len()),
            Selector::One(n) => format!("channel={}", n),
        });
    }
    if let Some(p) = &loop_param {
        qualifiers.push(match p.selector {
            Selector::All => format!("all {} loops", loops.len()),
            Selector::One(n) => format!("loop={}", n),
        });
    }
    if !qualifiers.is_empty() {
        message.push_str(&format!(" (with {})", qualifiers.join(", ")));
    }

    Ok(success(
        json!({
            "results": results,
            "errors": errors,
            "parameters": {
                "channel": channel_param.as_ref().map(|p| p.raw.clone()),
                "loop": loop_param.as_ref().map(|p| p.raw.clone()),
                "resolved_channels": non_empty(&channels),
                "resolved_loops": non_empty(&loops),
                "channel_source": channel_param.as_ref().map(|p| p.source),
                "loop_source": loop_param.as_ref().map(|p| p.source),
            },
            "summary": {
                "requested_fields": fields.len(),
                "total_combinations": total_combinations,
                "successful_count": successful,
                "error_count": failed,
            },
            "executed": true,
        }),
        message,
    ))
}

pub fn reporting_routes() -> Router<AppState> {
    Router::new()
        .route("/reportfield", get(report_field))
        .route("/reportfields", post(report_fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_use_controller_field_syntax() {
        let names = |qs: Vec<FieldQuery>| qs.into_iter().map(|q| q.com_name).collect::<Vec<_>>();

        assert_eq!(names(field_combinations("MaxLevel", &[], &[])), vec!["MaxLevel"]);
        assert_eq!(names(field_combinations("MaxLevel", &[1, 2], &[])), vec!["MaxLevel1:", "MaxLevel2:"]);
        assert_eq!(names(field_combinations("MaxLevel", &[], &[2])), vec!["MaxLevel:2"]);
        assert_eq!(
            names(field_combinations("MaxLevel", &[1, 2], &[1, 2])),
            vec!["MaxLevel1:1", "MaxLevel1:2", "MaxLevel2:1", "MaxLevel2:2"]
        );
    }

    #[test]
    fn selectors_accept_integers_and_all() {
        assert_eq!(Selector::parse("channel", &json!("all")).unwrap(), Selector::All);
        assert_eq!(Selector::parse("channel", &json!(3)).unwrap(), Selector::One(3));
        assert_eq!(Selector::parse("channel", &json!("2")).unwrap(), Selector::One(2));

        let err = Selector::parse("loop", &json!("first")).unwrap_err();
        assert_eq!(err.to_string(), "Parameter \"loop\" must be an integer or \"all\"");
    }

    #[test]
    fn qualified_values_carry_their_indices() {
        let plain = FieldQuery {
            com_name: "TestName".into(),
            channel: None,
            loop_num: None,
        };
        assert_eq!(format_value("Sine".into(), &plain), json!("Sine"));

        let qualified = FieldQuery {
            com_name: "MaxLevel2:1".into(),
            channel: Some(2),
            loop_num: Some(1),
        };
        assert_eq!(
            format_value("1.5".into(), &qualified),
            json!({"value": "1.5", "channel": 2, "loop": 1})
        );
    }

    #[test]
    fn url_selector_wins_over_body() {
        let params = QueryParams(vec![("channel".into(), "all".into())]);
        let body = json_object(br#"{"fields": ["X"], "channel": 2, "loop": 1}"#).unwrap();

        let channel = selector_param("channel", &params, &body).unwrap().unwrap();
        assert_eq!(channel.selector, Selector::All);
        assert_eq!(channel.source, "url");

        let lp = selector_param("loop", &params, &body).unwrap().unwrap();
        assert_eq!(lp.selector, Selector::One(1));
        assert_eq!(lp.source, "json");
    }
}
