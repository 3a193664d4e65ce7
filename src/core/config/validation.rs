use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_non_empty_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, u16::MAX as u64)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(corpus) = expect_optional_object(root, "corpus")? {
        validate_non_empty_string_field(corpus, "corpus.documents_path", "documents_path")?;
        validate_non_empty_string_field(corpus, "corpus.index_path", "index_path")?;
    }

    if let Some(encoder) = expect_optional_object(root, "encoder")? {
        validate_enum_field(encoder, "encoder.kind", "kind", &["remote", "hashing"])?;
        validate_non_empty_string_field(encoder, "encoder.base_url", "base_url")?;
        validate_non_empty_string_field(encoder, "encoder.model", "model")?;
        validate_u64_field(encoder, "encoder.dimension", "dimension", 1, 65_536)?;
        validate_u64_field(
            encoder,
            "encoder.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_enum_field(llm, "llm.provider", "provider", &["gemini", "openai_compat"])?;
        validate_non_empty_string_field(llm, "llm.base_url", "base_url")?;
        validate_non_empty_string_field(llm, "llm.model", "model")?;
        validate_non_empty_string_field(llm, "llm.api_key_env", "api_key_env")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(llm, "llm.max_output_tokens", "max_output_tokens", 1, 1_000_000)?;
        validate_u64_field(
            llm,
            "llm.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(retry) = expect_optional_object(root, "retry")? {
        validate_u64_field(retry, "retry.max_attempts", "max_attempts", 1, 20)?;
        validate_u64_field(
            retry,
            "retry.initial_backoff_ms",
            "initial_backoff_ms",
            0,
            600_000,
        )?;
        validate_u64_field(retry, "retry.max_backoff_ms", "max_backoff_ms", 0, 600_000)?;
        validate_f64_field(
            retry,
            "retry.backoff_multiplier",
            "backoff_multiplier",
            1.0,
            10.0,
        )?;
        validate_bool_field(retry, "retry.jitter", "jitter")?;
    }

    if let Some(pipeline) = expect_optional_object(root, "pipeline")? {
        validate_u64_field(pipeline, "pipeline.max_hops", "max_hops", 1, 32)?;
        validate_u64_field(pipeline, "pipeline.max_top_k", "max_top_k", 1, 1_000)?;
        validate_u64_field(pipeline, "pipeline.num_hops", "num_hops", 1, 32)?;
        validate_u64_field(pipeline, "pipeline.default_top_k", "default_top_k", 1, 1_000)?;

        let max_hops = pipeline.get("max_hops").and_then(Value::as_u64).unwrap_or(5);
        let num_hops = pipeline.get("num_hops").and_then(Value::as_u64).unwrap_or(2);
        if num_hops > max_hops {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at 'pipeline.num_hops': must not exceed pipeline.max_hops ({})",
                max_hops
            )));
        }

        let max_top_k = pipeline.get("max_top_k").and_then(Value::as_u64).unwrap_or(50);
        let default_top_k = pipeline
            .get("default_top_k")
            .and_then(Value::as_u64)
            .unwrap_or(5);
        if default_top_k > max_top_k {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at 'pipeline.default_top_k': must not exceed pipeline.max_top_k ({})",
                max_top_k
            )));
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(min..=max).contains(&number) {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if !allowed.contains(&text) {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': expected one of {}",
            path,
            allowed.join(", ")
        )));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
